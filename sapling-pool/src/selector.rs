/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Note selection: choosing a subset of spendable notes covering a target
//! value, favoring fewer inputs since each spend adds a Groth16 proof.

use crate::cache::{CacheEntry, NoteCache};
use crate::error::{IronfishError, IronfishErrorKind};
use crate::keys::public_address::PublicAddress;

/// Bounded subset-sum search tries combinations of at most this many
/// candidates before falling back to greedy descending accumulation.
const EXACT_MATCH_CANDIDATE_LIMIT: usize = 4;

pub struct Selection<'a> {
    pub notes: Vec<&'a CacheEntry>,
    pub total: u64,
}

/// Selects spendable notes for `address` covering at least `target`,
/// excluding any commitment in `exclude`. Tries, in order: a single note of
/// exactly `target`; a subset of at most [`EXACT_MATCH_CANDIDATE_LIMIT`] of
/// the largest candidates summing exactly to `target`; and finally greedy
/// descending accumulation until the total meets or exceeds `target`.
pub fn select<'a>(
    cache: &'a NoteCache,
    address: &PublicAddress,
    target: u64,
    min_conf: u64,
    exclude: &[[u8; 32]],
) -> Result<Selection<'a>, IronfishError> {
    let mut candidates: Vec<&CacheEntry> = cache
        .get_spendable(address, min_conf)
        .into_iter()
        .filter(|entry| !exclude.contains(&entry.cmu))
        .collect();
    candidates.sort_by(|a, b| b.note.value().cmp(&a.note.value()));

    if target == 0 {
        return Ok(Selection { notes: Vec::new(), total: 0 });
    }

    if let Some(exact) = candidates.iter().find(|entry| entry.note.value() == target) {
        return Ok(Selection { notes: vec![*exact], total: target });
    }

    if let Some(subset) = find_exact_subset(&candidates, target) {
        let total = subset.iter().map(|entry| entry.note.value()).sum();
        return Ok(Selection { notes: subset, total });
    }

    let mut notes = Vec::new();
    let mut total = 0u64;
    for entry in &candidates {
        if total >= target {
            break;
        }
        notes.push(*entry);
        total += entry.note.value();
    }

    if total < target {
        return Err(IronfishError::new(IronfishErrorKind::InsufficientFunds));
    }

    Ok(Selection { notes, total })
}

/// Exhaustive search over the top [`EXACT_MATCH_CANDIDATE_LIMIT`]
/// highest-value candidates for a subset summing exactly to `target`.
fn find_exact_subset<'a>(candidates: &[&'a CacheEntry], target: u64) -> Option<Vec<&'a CacheEntry>> {
    let pool = &candidates[..candidates.len().min(EXACT_MATCH_CANDIDATE_LIMIT)];
    let n = pool.len();
    for mask in 1u32..(1 << n) {
        let mut sum = 0u64;
        for (i, entry) in pool.iter().enumerate() {
            if mask & (1 << i) != 0 {
                sum += entry.note.value();
            }
        }
        if sum == target {
            return Some(
                pool.iter()
                    .enumerate()
                    .filter(|(i, _)| mask & (1 << i) != 0)
                    .map(|(_, entry)| *entry)
                    .collect(),
            );
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cache::CacheEntry;
    use crate::keys::public_address::DIVERSIFIER_LENGTH;
    use crate::keys::sapling_key::SaplingKey;
    use crate::merkle_tree::MerkleWitness;
    use crate::note::{Note, MEMO_LENGTH};

    fn spendable_entry(key: &SaplingKey, value: u64) -> CacheEntry {
        let address = key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        let (note, _memo) = Note::new(&address, value, [0u8; MEMO_LENGTH]).unwrap();
        let cmu = note.commitment().unwrap();
        CacheEntry {
            note,
            cmu,
            address,
            block_height: 1,
            tx_index: 0,
            output_index: 0,
            is_outgoing: false,
            spent: false,
            nullifier: None,
            witness: Some(MerkleWitness {
                auth_path: vec![[0u8; 32]; 4],
                position: 0,
                anchor: [0u8; 32],
            }),
        }
    }

    fn populated_cache(key: &SaplingKey, values: &[u64]) -> (NoteCache, PublicAddress) {
        let mut cache = NoteCache::new();
        cache.update_tree_state(100);
        let mut address = None;
        for value in values {
            let entry = spendable_entry(key, *value);
            address = Some(entry.address);
            cache.add_note(entry);
        }
        (cache, address.unwrap())
    }

    #[test]
    fn exact_single_note_match() {
        let key = SaplingKey::generate_key();
        let (cache, address) = populated_cache(&key, &[10, 50, 100]);
        let selection = select(&cache, &address, 50, 1, &[]).unwrap();
        assert_eq!(selection.total, 50);
        assert_eq!(selection.notes.len(), 1);
    }

    #[test]
    fn exact_subset_match() {
        let key = SaplingKey::generate_key();
        let (cache, address) = populated_cache(&key, &[30, 20, 5]);
        let selection = select(&cache, &address, 50, 1, &[]).unwrap();
        assert_eq!(selection.total, 50);
        assert_eq!(selection.notes.len(), 2);
    }

    #[test]
    fn greedy_fallback_when_no_exact_match() {
        let key = SaplingKey::generate_key();
        let (cache, address) = populated_cache(&key, &[40, 40, 40]);
        let selection = select(&cache, &address, 60, 1, &[]).unwrap();
        assert!(selection.total >= 60);
        assert_eq!(selection.notes.len(), 2);
    }

    #[test]
    fn insufficient_funds_reports_error() {
        let key = SaplingKey::generate_key();
        let (cache, address) = populated_cache(&key, &[1, 2, 3]);
        let err = select(&cache, &address, 1_000, 1, &[]).unwrap_err();
        assert_eq!(err.kind, IronfishErrorKind::InsufficientFunds);
    }
}
