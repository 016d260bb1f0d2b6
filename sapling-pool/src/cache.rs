/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `NoteCache`: the synchronizer's in-memory view of notes owned by a set
//! of addresses, indexed by commitment, nullifier, and address, plus the
//! spent-nullifier set and per-address sync progress.

use std::collections::{HashMap, HashSet};

use crate::keys::public_address::{PublicAddress, PUBLIC_ADDRESS_LENGTH};
use crate::merkle_tree::MerkleWitness;
use crate::note::Note;
use crate::primitives::nullifier::Nullifier;

/// A note discovered by the scanner, with its on-chain location and
/// spend status.
#[derive(Clone)]
pub struct CacheEntry {
    pub note: Note,
    pub cmu: [u8; 32],
    pub address: PublicAddress,
    pub block_height: u64,
    pub tx_index: u32,
    pub output_index: u32,
    pub is_outgoing: bool,
    pub spent: bool,
    pub nullifier: Option<Nullifier>,
    pub witness: Option<MerkleWitness>,
}

/// Canonical snapshot of a [`NoteCache`], suitable for serialization by a
/// persistence backend.
#[derive(Clone)]
pub struct CacheSnapshot {
    pub entries: Vec<CacheEntry>,
    pub spent_nullifiers: Vec<Nullifier>,
    pub synced_heights: Vec<([u8; PUBLIC_ADDRESS_LENGTH], u64)>,
    pub tree_size: u64,
}

#[derive(Default)]
pub struct NoteCache {
    by_commitment: HashMap<[u8; 32], CacheEntry>,
    by_nullifier: HashMap<Nullifier, [u8; 32]>,
    by_address: HashMap<[u8; PUBLIC_ADDRESS_LENGTH], HashSet<[u8; 32]>>,
    spent_nullifiers: HashSet<Nullifier>,
    synced_heights: HashMap<[u8; PUBLIC_ADDRESS_LENGTH], u64>,
    current_tree_height: u64,
}

impl NoteCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `entry`, keyed by its commitment. Idempotent: re-adding the
    /// same commitment overwrites the prior entry. If the note's nullifier
    /// is already known-spent, the entry is marked spent immediately.
    pub fn add_note(&mut self, mut entry: CacheEntry) {
        if let Some(nf) = entry.nullifier {
            if self.spent_nullifiers.contains(&nf) {
                entry.spent = true;
            }
            self.by_nullifier.insert(nf, entry.cmu);
        }
        self.by_address
            .entry(entry.address.to_bytes())
            .or_default()
            .insert(entry.cmu);
        self.by_commitment.insert(entry.cmu, entry);
    }

    pub fn get(&self, cmu: &[u8; 32]) -> Option<&CacheEntry> {
        self.by_commitment.get(cmu)
    }

    pub fn get_notes_for(&self, address: &PublicAddress) -> Vec<&CacheEntry> {
        match self.by_address.get(&address.to_bytes()) {
            None => Vec::new(),
            Some(cmus) => cmus
                .iter()
                .filter_map(|cmu| self.by_commitment.get(cmu))
                .collect(),
        }
    }

    /// Unspent notes with a witness, confirmed to at least `min_conf`
    /// blocks: `current_tree_height - note_height + 1 >= min_conf`.
    pub fn get_spendable(&self, address: &PublicAddress, min_conf: u64) -> Vec<&CacheEntry> {
        self.get_notes_for(address)
            .into_iter()
            .filter(|entry| {
                !entry.spent
                    && entry.nullifier.map_or(true, |nf| !self.spent_nullifiers.contains(&nf))
                    && entry.witness.is_some()
                    && self.current_tree_height.saturating_sub(entry.block_height) + 1 >= min_conf
            })
            .collect()
    }

    /// Adds `nf` to the spent set and flips `spent` on any entry that
    /// already references it.
    pub fn mark_spent(&mut self, nf: Nullifier) {
        self.spent_nullifiers.insert(nf);
        if let Some(cmu) = self.by_nullifier.get(&nf) {
            if let Some(entry) = self.by_commitment.get_mut(cmu) {
                entry.spent = true;
            }
        }
    }

    pub fn update_witness(&mut self, cmu: &[u8; 32], witness: MerkleWitness) {
        if let Some(entry) = self.by_commitment.get_mut(cmu) {
            entry.witness = Some(witness);
        }
    }

    pub fn update_tree_state(&mut self, current_tree_height: u64) {
        self.current_tree_height = current_tree_height;
    }

    pub fn update_synced_height(&mut self, address: &PublicAddress, height: u64) {
        self.synced_heights.insert(address.to_bytes(), height);
    }

    pub fn synced_height(&self, address: &PublicAddress) -> Option<u64> {
        self.synced_heights.get(&address.to_bytes()).copied()
    }

    /// Drops every entry above `height`, for reorg recovery. Synced
    /// heights beyond `height` are clamped down; the tree-height watermark
    /// is invalidated (the caller must re-derive it from the truncated
    /// tree).
    pub fn revert_to_height(&mut self, height: u64) {
        let stale: Vec<[u8; 32]> = self
            .by_commitment
            .iter()
            .filter(|(_, entry)| entry.block_height > height)
            .map(|(cmu, _)| *cmu)
            .collect();

        for cmu in stale {
            if let Some(entry) = self.by_commitment.remove(&cmu) {
                if let Some(nf) = entry.nullifier {
                    self.by_nullifier.remove(&nf);
                }
                if let Some(set) = self.by_address.get_mut(&entry.address.to_bytes()) {
                    set.remove(&cmu);
                }
            }
        }

        for synced in self.synced_heights.values_mut() {
            if *synced > height {
                *synced = height;
            }
        }
        self.current_tree_height = self.current_tree_height.min(height);
    }

    pub fn total(&self, address: &PublicAddress) -> u64 {
        self.get_notes_for(address)
            .into_iter()
            .filter(|entry| !entry.spent && entry.nullifier.map_or(true, |nf| !self.spent_nullifiers.contains(&nf)))
            .map(|entry| entry.note.value())
            .sum()
    }

    pub fn spendable_total(&self, address: &PublicAddress, min_conf: u64) -> u64 {
        self.get_spendable(address, min_conf)
            .into_iter()
            .map(|entry| entry.note.value())
            .sum()
    }

    pub fn export(&self) -> CacheSnapshot {
        CacheSnapshot {
            entries: self.by_commitment.values().cloned().collect(),
            spent_nullifiers: self.spent_nullifiers.iter().copied().collect(),
            synced_heights: self
                .synced_heights
                .iter()
                .map(|(addr, height)| (*addr, *height))
                .collect(),
            tree_size: self.current_tree_height,
        }
    }

    pub fn import(snapshot: CacheSnapshot) -> Self {
        let mut cache = NoteCache::new();
        cache.current_tree_height = snapshot.tree_size;
        for nf in snapshot.spent_nullifiers {
            cache.spent_nullifiers.insert(nf);
        }
        for (addr, height) in snapshot.synced_heights {
            cache.synced_heights.insert(addr, height);
        }
        for entry in snapshot.entries {
            cache.add_note(entry);
        }
        cache
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::public_address::DIVERSIFIER_LENGTH;
    use crate::keys::sapling_key::SaplingKey;
    use crate::note::MEMO_LENGTH;

    fn entry(key: &SaplingKey, value: u64, height: u64) -> CacheEntry {
        let address = key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        let (note, _memo) = Note::new(&address, value, [0u8; MEMO_LENGTH]).unwrap();
        let cmu = note.commitment().unwrap();
        let nf = note.nullifier(key.view_key().nullifier_deriving_key(), 0).unwrap();
        CacheEntry {
            note,
            cmu,
            address,
            block_height: height,
            tx_index: 0,
            output_index: 0,
            is_outgoing: false,
            spent: false,
            nullifier: Some(nf),
            witness: None,
        }
    }

    #[test]
    fn add_note_is_idempotent_on_commitment() {
        let key = SaplingKey::generate_key();
        let mut cache = NoteCache::new();
        let e = entry(&key, 100, 1);
        cache.add_note(e.clone());
        cache.add_note(e.clone());
        assert_eq!(cache.get_notes_for(&e.address).len(), 1);
    }

    #[test]
    fn mark_spent_before_add_note_flips_immediately() {
        let key = SaplingKey::generate_key();
        let mut cache = NoteCache::new();
        let e = entry(&key, 50, 1);
        cache.mark_spent(e.nullifier.unwrap());
        cache.add_note(e.clone());
        assert!(cache.get(&e.cmu).unwrap().spent);
    }

    #[test]
    fn spendable_requires_confirmations_and_witness() {
        let key = SaplingKey::generate_key();
        let mut cache = NoteCache::new();
        let mut e = entry(&key, 10, 5);
        cache.update_tree_state(10);
        cache.add_note(e.clone());
        assert!(cache.get_spendable(&e.address, 3).is_empty(), "no witness yet");

        e.witness = Some(MerkleWitness {
            auth_path: vec![[0u8; 32]; 4],
            position: 0,
            anchor: [0u8; 32],
        });
        cache.update_witness(&e.cmu, e.witness.clone().unwrap());
        // current_tree_height=10, note height=5 -> 10-5+1=6 confirmations
        assert_eq!(cache.get_spendable(&e.address, 6).len(), 1);
        assert!(cache.get_spendable(&e.address, 7).is_empty());
    }

    #[test]
    fn revert_to_height_drops_future_entries_and_clamps_sync() {
        let key = SaplingKey::generate_key();
        let mut cache = NoteCache::new();
        let address = key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        cache.add_note(entry(&key, 1, 1));
        cache.add_note(entry(&key, 2, 10));
        cache.update_synced_height(&address, 10);
        cache.update_tree_state(10);

        cache.revert_to_height(5);

        assert_eq!(cache.get_notes_for(&address).len(), 1);
        assert_eq!(cache.synced_height(&address), Some(5));
        assert_eq!(cache.current_tree_height, 5);
    }

    #[test]
    fn balance_law_total_dominates_spendable() {
        let key = SaplingKey::generate_key();
        let mut cache = NoteCache::new();
        let e1 = entry(&key, 100, 1);
        cache.update_tree_state(100);
        cache.add_note(e1.clone());
        assert!(cache.total(&e1.address) >= cache.spendable_total(&e1.address, 1));
    }
}
