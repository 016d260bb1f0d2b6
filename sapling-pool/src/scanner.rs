/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The synchronizer: drives trial-decryption over a run of blocks, feeding
//! the Merkle tree and the note cache.
//!
//! Block data arrives through the [`BlockSource`] trait rather than over
//! the wire directly — this crate is chain-agnostic and leaves fetching
//! (and any wire-level compaction of the ciphertext) to the embedder.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::cache::{CacheEntry, NoteCache};
use crate::encryption::{trial_decrypt, DecryptFailureCounters};
use crate::error::IronfishError;
use crate::group::Point;
use crate::keys::public_address::PublicAddress;
use crate::keys::view_keys::IncomingViewKey;
use crate::merkle_tree::MerkleTree;
use crate::primitives::nullifier::Nullifier;

pub struct BlockOutput {
    pub cmu: [u8; 32],
    pub epk: [u8; 32],
    pub enc_ciphertext: Vec<u8>,
}

pub struct BlockTransaction {
    pub outputs: Vec<BlockOutput>,
    pub nullifiers: Vec<Nullifier>,
}

pub struct Block {
    pub height: u64,
    pub hash: [u8; 32],
    pub transactions: Vec<BlockTransaction>,
}

/// External source of chain data, pulled in batches. Implementations may
/// wrap a local node, a light-client protocol, or a test fixture.
pub trait BlockSource {
    fn fetch_range(&mut self, from: u64, to: u64) -> Result<Vec<Block>, IronfishError>;
    /// The block hash this source has at `height`, used to detect a reorg
    /// against the synchronizer's previously recorded hash.
    fn block_hash(&mut self, height: u64) -> Result<[u8; 32], IronfishError>;
}

/// Outcome of trial-decrypting a single output, carried out of
/// [`decrypt_output`] so it can run on a rayon worker thread without
/// touching `Synchronizer`'s shared state.
struct OutputDecryptResult {
    counters: DecryptFailureCounters,
    /// `(entry, position, cmu)` for an output that belongs to this
    /// synchronizer's viewing key.
    owned: Option<(CacheEntry, u64, [u8; 32])>,
}

/// Trial-decrypts one already-positioned output. Pure given its arguments —
/// the only thing to fold back into `Synchronizer` state is the returned
/// counters and (if owned) cache entry, which is what makes this safe to
/// call from a rayon worker.
#[allow(clippy::too_many_arguments)]
fn decrypt_output(
    ivk: &IncomingViewKey,
    nk: &Point,
    address: &PublicAddress,
    block_height: u64,
    tx_index: u32,
    output_index: u32,
    position: u64,
    output: &BlockOutput,
) -> Result<OutputDecryptResult, IronfishError> {
    let mut counters = DecryptFailureCounters::default();

    let epk = match Point::decompress_checked(&output.epk) {
        Ok(p) => p,
        Err(_) => {
            counters.invalid_point += 1;
            return Ok(OutputDecryptResult { counters, owned: None });
        }
    };

    let decrypted = trial_decrypt(ivk, &epk, &output.enc_ciphertext, &output.cmu, &mut counters)?;

    let owned = match decrypted {
        Some((note, _memo)) => {
            let nf = note.nullifier(nk, position)?;
            Some((
                CacheEntry {
                    note,
                    cmu: output.cmu,
                    address: *address,
                    block_height,
                    tx_index,
                    output_index,
                    is_outgoing: false,
                    spent: false,
                    nullifier: Some(nf),
                    witness: None,
                },
                position,
                output.cmu,
            ))
        }
        None => None,
    };

    Ok(OutputDecryptResult { counters, owned })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanProgress {
    pub start_height: u64,
    pub end_height: u64,
    pub current_height: u64,
    pub notes_found: u64,
}

impl ScanProgress {
    pub fn percent(&self) -> f64 {
        if self.end_height <= self.start_height {
            return 100.0;
        }
        let span = (self.end_height - self.start_height) as f64;
        let done = (self.current_height.saturating_sub(self.start_height)) as f64;
        (done / span * 100.0).min(100.0)
    }
}

pub struct Synchronizer {
    address: PublicAddress,
    ivk: IncomingViewKey,
    nk: Point,
    tree: MerkleTree,
    cache: NoteCache,
    synced_height: u64,
    last_block_hash: [u8; 32],
    checkpoint_interval: u64,
    cancel: Arc<AtomicBool>,
    pub counters: DecryptFailureCounters,
}

impl Synchronizer {
    pub fn new(
        address: PublicAddress,
        ivk: IncomingViewKey,
        nk: Point,
        tree_depth: usize,
        checkpoint_interval: u64,
    ) -> Self {
        Synchronizer {
            address,
            ivk,
            nk,
            tree: MerkleTree::new(tree_depth),
            cache: NoteCache::new(),
            synced_height: 0,
            last_block_hash: [0u8; 32],
            checkpoint_interval,
            cancel: Arc::new(AtomicBool::new(false)),
            counters: DecryptFailureCounters::default(),
        }
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    pub fn cache(&self) -> &NoteCache {
        &self.cache
    }

    pub fn tree_size(&self) -> u64 {
        self.tree.size()
    }

    /// Finds the highest height at or below `self.synced_height` whose
    /// hash still matches `source`, by walking backward one block at a
    /// time. Returns `None` if nothing has been synced yet or there is no
    /// divergence.
    fn find_fork_height<S: BlockSource>(&mut self, source: &mut S) -> Result<Option<u64>, IronfishError> {
        if self.synced_height == 0 {
            return Ok(None);
        }
        if source.block_hash(self.synced_height)? == self.last_block_hash {
            return Ok(None);
        }
        let mut height = self.synced_height;
        while height > 0 {
            height -= 1;
            if source.block_hash(height)? == self.last_block_hash || height == 0 {
                return Ok(Some(height));
            }
        }
        Ok(Some(0))
    }

    /// Scans `[from, to]`, calling `on_progress` after each block. Returns
    /// the number of notes newly discovered as belonging to this
    /// synchronizer's viewing key in this batch.
    pub fn scan<S: BlockSource>(
        &mut self,
        source: &mut S,
        from: u64,
        to: u64,
        mut on_progress: impl FnMut(ScanProgress),
    ) -> Result<u64, IronfishError> {
        let span = tracing::info_span!("scan", from, to);
        let _guard = span.enter();

        if let Some(fork_height) = self.find_fork_height(source)? {
            tracing::warn!(fork_height, "reorg detected, reverting");
            self.cache.revert_to_height(fork_height);
            self.tree.truncate_to(self.tree.size().min(fork_height));
            self.synced_height = fork_height;
        }

        let blocks = source.fetch_range(from, to)?;
        let mut notes_found = 0u64;
        let mut newly_owned: Vec<(u64, [u8; 32])> = Vec::new();

        for block in blocks {
            if self.cancel.load(Ordering::Relaxed) {
                tracing::info!(at_height = block.height, "scan aborted");
                break;
            }

            for (tx_index, tx) in block.transactions.iter().enumerate() {
                // Positions must be assigned by appending to the tree in
                // order; the (pure) decryption of each output is what may
                // run out of order/in parallel below.
                let mut positioned: Vec<(u64, &BlockOutput)> = Vec::with_capacity(tx.outputs.len());
                for output in &tx.outputs {
                    let position = self.tree.append(output.cmu)?;
                    positioned.push((position, output));
                }

                #[cfg(feature = "parallel-scan")]
                let results: Vec<Result<OutputDecryptResult, IronfishError>> = {
                    use rayon::prelude::*;
                    positioned
                        .par_iter()
                        .enumerate()
                        .map(|(output_index, (position, output))| {
                            decrypt_output(
                                &self.ivk,
                                &self.nk,
                                &self.address,
                                block.height,
                                tx_index as u32,
                                output_index as u32,
                                *position,
                                output,
                            )
                        })
                        .collect()
                };
                #[cfg(not(feature = "parallel-scan"))]
                let results: Vec<Result<OutputDecryptResult, IronfishError>> = positioned
                    .iter()
                    .enumerate()
                    .map(|(output_index, (position, output))| {
                        decrypt_output(
                            &self.ivk,
                            &self.nk,
                            &self.address,
                            block.height,
                            tx_index as u32,
                            output_index as u32,
                            *position,
                            output,
                        )
                    })
                    .collect();

                for result in results {
                    let result = result?;
                    self.counters.auth_tag_invalid += result.counters.auth_tag_invalid;
                    self.counters.commitment_mismatch += result.counters.commitment_mismatch;
                    self.counters.malformed_plaintext += result.counters.malformed_plaintext;
                    self.counters.invalid_point += result.counters.invalid_point;
                    if let Some((entry, position, cmu)) = result.owned {
                        self.cache.add_note(entry);
                        newly_owned.push((position, cmu));
                        notes_found += 1;
                    }
                }

                for nf in &tx.nullifiers {
                    self.cache.mark_spent(*nf);
                }
            }

            self.synced_height = block.height;
            self.last_block_hash = block.hash;
            self.cache.update_tree_state(self.synced_height);

            on_progress(ScanProgress {
                start_height: from,
                end_height: to,
                current_height: block.height,
                notes_found,
            });

            if block.height % self.checkpoint_interval == 0 {
                self.checkpoint();
            }
        }

        for (position, cmu) in newly_owned {
            let witness = self.tree.witness(position)?;
            self.cache.update_witness(&cmu, witness);
        }
        self.cache.update_synced_height(&self.address, self.synced_height);
        self.checkpoint();

        Ok(notes_found)
    }

    /// Marks the tree clean, as though its current state has just been
    /// durably persisted. The actual write is the caller's responsibility
    /// (see `store.rs`); this only updates the in-memory state machine.
    fn checkpoint(&mut self) {
        self.tree.mark_clean();
    }
}
