/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Test-only helpers for constructing fake witnesses without going through a
//! full [`crate::merkle_tree::MerkleTree`].

use rand::{thread_rng, Rng};

use crate::constants::TREE_DEPTH;
use crate::merkle_tree::MerkleWitness;
use crate::note::Note;

fn combine(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    use blake2s_simd::Params;
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(left);
    hasher.update(right);
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// Given a note, builds a [`MerkleWitness`] with a random authentication path
/// and position, and an anchor that the path actually authenticates the
/// note's commitment against.
pub fn make_fake_witness(note: &Note) -> MerkleWitness {
    let mut rng = thread_rng();
    let position: u64 = rng.gen_range(0..(1u64 << TREE_DEPTH));
    let auth_path: Vec<[u8; 32]> = (0..TREE_DEPTH).map(|_| rng.gen()).collect();

    let leaf = note.commitment().expect("note must hash to a commitment");
    let mut node = leaf;
    let mut idx = position;
    for sibling in &auth_path {
        node = if idx & 1 == 0 {
            combine(&node, sibling)
        } else {
            combine(sibling, &node)
        };
        idx >>= 1;
    }

    MerkleWitness {
        auth_path,
        position,
        anchor: node,
    }
}
