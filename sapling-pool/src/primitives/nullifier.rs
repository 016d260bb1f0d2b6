/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `NullifierPRF`: the tag revealed when a note is spent.

use blake2s_simd::Params;

use crate::constants::PRF_NULLIFIER_PERSONALIZATION;
use crate::group::Point;

pub type Nullifier = [u8; 32];

/// `nf = BLAKE2s-256(domain, nk || position_LE8 || cmu)`.
pub fn nullifier_prf(nk: &Point, position: u64, cmu: &[u8; 32]) -> Nullifier {
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(PRF_NULLIFIER_PERSONALIZATION);
    hasher.update(&nk.compress());
    hasher.update(&position.to_le_bytes());
    hasher.update(cmu);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_bytes());
    out
}
