/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `PRF_expand` (used to derive `rcm` and per-note randomness from
//! `rseed`) and `KDF` (the note-encryption symmetric key).

use blake2s_simd::Params;

use crate::constants::{KDF_PERSONALIZATION, PRF_EXPAND_PERSONALIZATION};
use crate::group::Point;

fn blake2s_256(domain: &[u8], parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(digest.as_bytes());
    out
}

/// `PRF_expand(k, t) = BLAKE2s(domain, k||[t]) || BLAKE2s(domain, k||[t]||[1])`,
/// 64 bytes.
pub fn prf_expand(k: &[u8], t: u8) -> [u8; 64] {
    let first = blake2s_256(PRF_EXPAND_PERSONALIZATION, &[k, &[t]]);
    let second = blake2s_256(PRF_EXPAND_PERSONALIZATION, &[k, &[t], &[1]]);
    let mut out = [0u8; 64];
    out[..32].copy_from_slice(&first);
    out[32..].copy_from_slice(&second);
    out
}

/// `K_enc = BLAKE2s-256(domain, shared_secret || epk)`.
pub fn kdf(shared_secret: &Point, epk: &Point) -> [u8; 32] {
    blake2s_256(
        KDF_PERSONALIZATION,
        &[&shared_secret.compress(), &epk.compress()],
    )
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn prf_expand_deterministic_and_tag_sensitive() {
        let k = [0x11u8; 32];
        let a = prf_expand(&k, 0x04);
        let b = prf_expand(&k, 0x04);
        let c = prf_expand(&k, 0x05);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
