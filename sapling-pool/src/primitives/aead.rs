/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! ChaCha20-Poly1305 AEAD with a nonce derived from the note's ephemeral
//! public key.
//!
//! The nonce is `BLAKE2s-96(domain, epk)`, per the specification's
//! resolution of its nonce-derivation open question. Earlier source
//! material used a literal all-zero nonce for this AEAD (observed directly
//! in the teacher's oldest serialization code, and still present as
//! `Nonce::default()` in its later `chacha20poly1305`-based rewrite); that
//! is in fact sound, since the symmetric key here is itself a fresh KDF
//! output per note (it's bound to `epk`, which is unique per encryption),
//! so nonce reuse under a fixed key never occurs. A derived nonce is used
//! instead of the literal zero only for defense in depth against a future
//! key-derivation change, and critically, it must be derived from a value
//! the receiver already holds *before* decrypting (`epk` is carried
//! alongside the ciphertext on-chain) rather than from `rseed`, which only
//! becomes known once decryption has already succeeded. See `DESIGN.md`
//! (Q2) for the full account.

use blake2s_simd::Params;
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::constants::NONCE_DERIVE_PERSONALIZATION;
use crate::error::{IronfishError, IronfishErrorKind};

fn derive_nonce(nonce_seed: &[u8; 32]) -> Nonce {
    let mut hasher = Params::new().hash_length(12).to_state();
    hasher.update(NONCE_DERIVE_PERSONALIZATION);
    hasher.update(nonce_seed);
    let digest = hasher.finalize();
    *Nonce::from_slice(digest.as_bytes())
}

pub fn encrypt(key: &[u8; 32], nonce_seed: &[u8; 32], plaintext: &[u8]) -> Vec<u8> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = derive_nonce(nonce_seed);
    cipher
        .encrypt(&nonce, Payload { msg: plaintext, aad: b"" })
        .expect("ChaCha20-Poly1305 encryption over an in-memory buffer cannot fail")
}

/// Decrypts and verifies the authentication tag. A failure here is the
/// normal, silent case of "this output is not ours" (see `AuthTagInvalid`
/// in the error-kind table) and must never be logged at more than debug
/// level or surfaced to a user.
pub fn decrypt(
    key: &[u8; 32],
    nonce_seed: &[u8; 32],
    ciphertext: &[u8],
) -> Result<Vec<u8>, IronfishError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let nonce = derive_nonce(nonce_seed);
    cipher
        .decrypt(&nonce, Payload { msg: ciphertext, aad: b"" })
        .map_err(|_| IronfishError::new(IronfishErrorKind::AuthTagInvalid))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = [0x42u8; 32];
        let nonce_seed = [0x07u8; 32];
        let plaintext = b"a shielded note plaintext payload";
        let ciphertext = encrypt(&key, &nonce_seed, plaintext);
        let recovered = decrypt(&key, &nonce_seed, &ciphertext).unwrap();
        assert_eq!(recovered, plaintext);
    }

    #[test]
    fn tampered_ciphertext_rejects() {
        let key = [0x42u8; 32];
        let nonce_seed = [0x07u8; 32];
        let mut ciphertext = encrypt(&key, &nonce_seed, b"hello");
        let last = ciphertext.len() - 1;
        ciphertext[last] ^= 0xff;
        let err = decrypt(&key, &nonce_seed, &ciphertext).unwrap_err();
        assert_eq!(err.kind, IronfishErrorKind::AuthTagInvalid);
    }

    #[test]
    fn different_nonce_seed_fails_cross_decrypt() {
        let key = [0x42u8; 32];
        let ciphertext = encrypt(&key, &[0x01u8; 32], b"hello");
        assert!(decrypt(&key, &[0x02u8; 32], &ciphertext).is_err());
    }
}
