/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Incremental, append-only Merkle commitment tree with authentication-path
//! witnesses.
//!
//! Every node is stored either in `leaves` (level 0) or, once both of its
//! children exist, in `levels[level]` in left-to-right order. A node that
//! doesn't exist yet (because its subtree is entirely beyond the current
//! tree size) is represented implicitly by the precomputed empty-subtree
//! hash for its level — no partial/half-filled node is ever materialized,
//! which holds because appends fill the tree strictly left to right: any
//! sibling of an already-committed leaf is either wholly to its left (and
//! therefore complete) or wholly to its right (and therefore untouched).

use blake2s_simd::Params;
use subtle::ConstantTimeEq;

use crate::error::{IronfishError, IronfishErrorKind};

fn combine(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(left);
    hasher.update(right);
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

fn empty_hashes(depth: usize) -> Vec<[u8; 32]> {
    let mut hashes = Vec::with_capacity(depth + 1);
    hashes.push([0u8; 32]);
    for level in 0..depth {
        let prev = hashes[level];
        hashes.push(combine(&prev, &prev));
    }
    hashes
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistState {
    /// No leaves have ever been appended.
    Fresh,
    /// In-memory size exceeds what's been persisted.
    Dirty,
    /// In-memory state matches the persisted snapshot.
    Clean,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleWitness {
    pub auth_path: Vec<[u8; 32]>,
    pub position: u64,
    pub anchor: [u8; 32],
}

/// Recomputes a root from `leaf`, `auth_path`, and `position`, and compares
/// it to `anchor` in constant time. `auth_path[level]` is the sibling of
/// the leaf's ancestor at that level; bit `level` of `position` selects
/// whether the running hash is the left or right child at that step.
pub fn verify(leaf: &[u8; 32], auth_path: &[[u8; 32]], position: u64, anchor: &[u8; 32]) -> bool {
    let mut node = *leaf;
    let mut idx = position;
    for sibling in auth_path {
        node = if idx & 1 == 0 {
            combine(&node, sibling)
        } else {
            combine(sibling, &node)
        };
        idx >>= 1;
    }
    node.ct_eq(anchor).unwrap_u8() == 1
}

pub struct MerkleTree {
    depth: usize,
    leaves: Vec<[u8; 32]>,
    levels: Vec<Vec<[u8; 32]>>,
    empty_hashes: Vec<[u8; 32]>,
    cached_root: Option<[u8; 32]>,
    dirty: bool,
}

impl MerkleTree {
    pub fn new(depth: usize) -> Self {
        MerkleTree {
            depth,
            leaves: Vec::new(),
            levels: vec![Vec::new(); depth + 1],
            empty_hashes: empty_hashes(depth),
            cached_root: None,
            dirty: false,
        }
    }

    pub fn size(&self) -> u64 {
        self.leaves.len() as u64
    }

    pub fn persist_state(&self) -> PersistState {
        if self.leaves.is_empty() {
            PersistState::Fresh
        } else if self.dirty {
            PersistState::Dirty
        } else {
            PersistState::Clean
        }
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Appends `leaf`, returning its position. Cascades completed pairs up
    /// through `levels`, mirroring a binary counter increment.
    pub fn append(&mut self, leaf: [u8; 32]) -> Result<u64, IronfishError> {
        if self.leaves.len() as u64 >= (1u64 << self.depth) {
            return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
        }
        let position = self.leaves.len() as u64;
        self.leaves.push(leaf);
        self.levels[0].push(leaf);

        let mut level = 0;
        while self.levels[level].len() % 2 == 0 {
            let len = self.levels[level].len();
            let right = self.levels[level][len - 1];
            let left = self.levels[level][len - 2];
            let parent = combine(&left, &right);
            self.levels[level + 1].push(parent);
            level += 1;
            if level == self.depth {
                break;
            }
        }

        self.cached_root = None;
        self.dirty = true;
        Ok(position)
    }

    /// The hash of the node at `level` covering the `span = 2^level`
    /// positions starting at `index * span`, treating any position beyond
    /// the current tree size as the empty leaf. Only one branch per level
    /// ever takes the recursive path (the other side is always either
    /// fully complete or fully empty), so this costs O(depth) total.
    fn node_at(&self, level: usize, index: u64) -> [u8; 32] {
        if level == 0 {
            return match self.leaves.get(index as usize) {
                Some(leaf) => *leaf,
                None => self.empty_hashes[0],
            };
        }
        let span = 1u64 << level;
        let start = index * span;
        let size = self.leaves.len() as u64;
        if start + span <= size {
            return self.levels[level][index as usize];
        }
        if start >= size {
            return self.empty_hashes[level];
        }
        let left = self.node_at(level - 1, 2 * index);
        let right = self.node_at(level - 1, 2 * index + 1);
        combine(&left, &right)
    }

    pub fn root(&mut self) -> [u8; 32] {
        if let Some(root) = self.cached_root {
            return root;
        }
        let root = self.node_at(self.depth, 0);
        self.cached_root = Some(root);
        root
    }

    pub fn witness(&mut self, position: u64) -> Result<MerkleWitness, IronfishError> {
        if position >= self.size() {
            return Err(IronfishError::new(IronfishErrorKind::InconsistentWitness));
        }
        let mut auth_path = Vec::with_capacity(self.depth);
        let mut idx = position;
        for level in 0..self.depth {
            let sibling_index = idx ^ 1;
            auth_path.push(self.node_at(level, sibling_index));
            idx >>= 1;
        }
        Ok(MerkleWitness {
            auth_path,
            position,
            anchor: self.root(),
        })
    }

    /// Drops every leaf appended after `new_size`, for reorg handling.
    /// Rebuilds `levels` from the retained leaves.
    pub fn truncate_to(&mut self, new_size: u64) {
        if new_size >= self.size() {
            return;
        }
        let retained: Vec<[u8; 32]> = self.leaves[..new_size as usize].to_vec();
        self.leaves.clear();
        for level in self.levels.iter_mut() {
            level.clear();
        }
        self.cached_root = None;
        for leaf in retained {
            self.append(leaf).expect("retained leaves always fit");
        }
        self.dirty = true;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_leaf_matches_empty_hash_climb() {
        let mut tree = MerkleTree::new(4);
        let leaf = [0x01u8; 32];
        let empties = empty_hashes(4);
        tree.append(leaf).unwrap();

        let mut expected = combine(&leaf, &empties[0]);
        expected = combine(&expected, &empties[1]);
        expected = combine(&expected, &empties[2]);
        expected = combine(&expected, &empties[3]);

        assert_eq!(tree.root(), expected);

        let witness = tree.witness(0).unwrap();
        assert_eq!(witness.auth_path, vec![empties[0], empties[1], empties[2], empties[3]]);
        assert!(verify(&leaf, &witness.auth_path, 0, &witness.anchor));
    }

    #[test]
    fn root_changes_iff_size_changes() {
        let mut tree = MerkleTree::new(8);
        let root0 = tree.root();
        tree.append([0x02u8; 32]).unwrap();
        let root1 = tree.root();
        assert_ne!(root0, root1);
        let root1_again = tree.root();
        assert_eq!(root1, root1_again);
    }

    #[test]
    fn every_appended_leaf_verifies_against_current_root() {
        let mut tree = MerkleTree::new(6);
        let leaves: Vec<[u8; 32]> = (0..10u8).map(|i| [i; 32]).collect();
        for leaf in &leaves {
            tree.append(*leaf).unwrap();
        }
        let root = tree.root();
        for (position, leaf) in leaves.iter().enumerate() {
            let witness = tree.witness(position as u64).unwrap();
            assert_eq!(witness.anchor, root);
            assert!(verify(leaf, &witness.auth_path, position as u64, &root));
        }
    }

    #[test]
    fn truncate_drops_leaves_and_recomputes_root() {
        let mut tree = MerkleTree::new(6);
        for i in 0..8u8 {
            tree.append([i; 32]).unwrap();
        }
        let full_root = tree.root();
        tree.truncate_to(4);
        assert_eq!(tree.size(), 4);
        let truncated_root = tree.root();
        assert_ne!(truncated_root, full_root);

        let mut rebuilt = MerkleTree::new(6);
        for i in 0..4u8 {
            rebuilt.append([i; 32]).unwrap();
        }
        assert_eq!(truncated_root, rebuilt.root());
    }

    #[test]
    fn persist_state_transitions() {
        let mut tree = MerkleTree::new(4);
        assert_eq!(tree.persist_state(), PersistState::Fresh);
        tree.append([0x03u8; 32]).unwrap();
        assert_eq!(tree.persist_state(), PersistState::Dirty);
        tree.mark_clean();
        assert_eq!(tree.persist_state(), PersistState::Clean);
        tree.append([0x04u8; 32]).unwrap();
        assert_eq!(tree.persist_state(), PersistState::Dirty);
    }
}
