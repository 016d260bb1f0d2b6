/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Note encryption (sender) and trial decryption (receiver), including the
//! error classification the specification requires: most trial-decrypt
//! failures are the ordinary "this output isn't mine" case and must be
//! swallowed rather than surfaced.

use blake2s_simd::Params;
use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::SHARED_KEY_PERSONALIZATION;
use crate::error::{IronfishError, IronfishErrorKind};
use crate::group::Point;
use crate::keys::view_keys::IncomingViewKey;
use crate::note::{Memo, Note, COMPACT_PLAINTEXT_LENGTH, NOTE_PLAINTEXT_LENGTH};
use crate::primitives::aead;
use crate::primitives::kdf::kdf;
use crate::scalar::Scalar;

pub const ENC_CIPHERTEXT_LENGTH: usize = NOTE_PLAINTEXT_LENGTH + 16;
pub const COMPACT_CIPHERTEXT_LENGTH: usize = COMPACT_PLAINTEXT_LENGTH + 16;
pub const OUT_CIPHERTEXT_LENGTH: usize = 80;

pub struct EncryptedOutput {
    pub epk: Point,
    pub esk: Scalar,
    pub enc_ciphertext: Vec<u8>,
    pub out_ciphertext: Vec<u8>,
}

/// `ock = BLAKE2s-256(domain, ovk || cv || cmu || epk)`.
fn outgoing_cipher_key(ovk: &[u8; 32], cv: &[u8; 32], cmu: &[u8; 32], epk: &Point) -> [u8; 32] {
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(SHARED_KEY_PERSONALIZATION);
    hasher.update(ovk);
    hasher.update(cv);
    hasher.update(cmu);
    hasher.update(&epk.compress());
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// Encrypts `note`/`memo` for `note`'s owner, and produces an outgoing
/// ciphertext the sender can later decrypt with `ovk` to recall what they
/// sent. Draws a fresh ephemeral secret internally.
pub fn encrypt(
    note: &Note,
    memo: &Memo,
    ovk: &[u8; 32],
    cv: &[u8; 32],
) -> Result<EncryptedOutput, IronfishError> {
    let mut esk_bytes = [0u8; 64];
    OsRng.fill_bytes(&mut esk_bytes);
    let esk = Scalar::from_bytes_wide(&esk_bytes);
    encrypt_with_esk(note, memo, ovk, cv, esk)
}

/// As [`encrypt`], but with the ephemeral secret supplied by the caller —
/// for the transaction builder, which needs `esk` itself to feed the
/// output proof's epk-consistency check.
pub fn encrypt_with_esk(
    note: &Note,
    memo: &Memo,
    ovk: &[u8; 32],
    cv: &[u8; 32],
    esk: Scalar,
) -> Result<EncryptedOutput, IronfishError> {
    let g_d = crate::constants::diversify(note.diversifier())?;
    let epk = g_d.mul(&esk);
    let shared_secret = note.pk_d().mul(&esk);
    let key = kdf(&shared_secret, &epk);

    // The nonce must be derivable by the receiver *before* decryption
    // succeeds, so it is keyed off `epk` (carried alongside the
    // ciphertext) rather than `rseed` (only known once the plaintext has
    // already been recovered).
    let epk_bytes = epk.compress();
    let plaintext = note.to_plaintext(memo);
    let enc_ciphertext = aead::encrypt(&key, &epk_bytes, &plaintext);

    let cmu = note.commitment()?;
    let ock = outgoing_cipher_key(ovk, cv, &cmu, &epk);
    let mut out_plaintext = Vec::with_capacity(64);
    out_plaintext.extend_from_slice(&note.pk_d().compress());
    out_plaintext.extend_from_slice(&esk.to_bytes());
    // Distinct key (`ock` vs `key`) already rules out nonce reuse under a
    // shared key; `cmu` is used here as the nonce seed purely so the two
    // ciphertexts don't derive identical nonces from identical input.
    let out_ciphertext = aead::encrypt(&ock, &cmu, &out_plaintext);

    Ok(EncryptedOutput {
        epk,
        esk,
        enc_ciphertext,
        out_ciphertext,
    })
}

/// Counters incremented by [`trial_decrypt`], for scanner diagnostics. Per
/// the specification, a decryption failure is a normal event and must
/// never be retried or surfaced to the user; these counts exist purely for
/// operational visibility.
#[derive(Default, Debug, Clone, Copy)]
pub struct DecryptFailureCounters {
    pub auth_tag_invalid: u64,
    pub commitment_mismatch: u64,
    pub malformed_plaintext: u64,
    pub invalid_point: u64,
}

/// Attempts to decrypt `enc_ciphertext` as a note belonging to `ivk`,
/// verifying that the recomputed commitment matches `cmu_onchain`. Returns
/// `Ok(None)` (and bumps the matching counter) for the ordinary case of "not
/// our output"; returns `Err` only for a malformed boundary (wrong-length
/// ciphertext, an `epk` that fails the subgroup check). On success, returns
/// the note together with the memo it was encrypted with.
pub fn trial_decrypt(
    ivk: &IncomingViewKey,
    epk: &Point,
    enc_ciphertext: &[u8],
    cmu_onchain: &[u8; 32],
    counters: &mut DecryptFailureCounters,
) -> Result<Option<(Note, Memo)>, IronfishError> {
    if enc_ciphertext.len() != ENC_CIPHERTEXT_LENGTH {
        return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
    }

    let shared_secret = ivk.shared_secret(epk);
    let key = kdf(&shared_secret, epk);

    let nonce_seed = epk.compress();
    let plaintext = match aead::decrypt(&key, &nonce_seed, enc_ciphertext) {
        Ok(p) => p,
        Err(_) => {
            counters.auth_tag_invalid += 1;
            return Ok(None);
        }
    };

    let (diversifier, value, rseed, memo) = match Note::parts_from_plaintext(&plaintext) {
        Ok(parts) => parts,
        Err(_) => {
            counters.malformed_plaintext += 1;
            return Ok(None);
        }
    };
    let g_d = match crate::constants::diversify(&diversifier) {
        Ok(p) => p,
        Err(_) => {
            counters.invalid_point += 1;
            return Ok(None);
        }
    };
    let pk_d = g_d.mul(&ivk.view_key);

    let note = Note::from_parts(diversifier, pk_d, value, rseed);
    let recomputed_cmu = match note.commitment() {
        Ok(c) => c,
        Err(_) => {
            counters.invalid_point += 1;
            return Ok(None);
        }
    };

    use subtle::ConstantTimeEq;
    if recomputed_cmu.ct_eq(cmu_onchain).unwrap_u8() != 1 {
        counters.commitment_mismatch += 1;
        return Ok(None);
    }

    Ok(Some((note, memo)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::public_address::DIVERSIFIER_LENGTH;
    use crate::keys::sapling_key::SaplingKey;
    use crate::note::MEMO_LENGTH;
    use crate::primitives::commitment::value_commit;

    #[test]
    fn encrypt_then_decrypt_recovers_note() {
        let key = SaplingKey::generate_key();
        let address = key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        let (note, memo) = Note::new(&address, 1_000_000, [9u8; MEMO_LENGTH]).unwrap();
        let cv = value_commit(note.value(), &Scalar::from_bytes_wide(&[0x05; 64])).compress();

        let encrypted = encrypt(&note, &memo, key.outgoing_viewing_key(), &cv).unwrap();
        let cmu = note.commitment().unwrap();

        let mut counters = DecryptFailureCounters::default();
        let (decrypted, decrypted_memo) = trial_decrypt(
            key.incoming_view_key(),
            &encrypted.epk,
            &encrypted.enc_ciphertext,
            &cmu,
            &mut counters,
        )
        .unwrap()
        .expect("note must decrypt for its own ivk");

        assert_eq!(decrypted.value(), note.value());
        assert_eq!(decrypted.diversifier(), note.diversifier());
        assert_eq!(decrypted.rseed(), note.rseed());
        assert_eq!(decrypted_memo, memo);
    }

    #[test]
    fn wrong_ivk_does_not_decrypt() {
        let key = SaplingKey::generate_key();
        let wrong_key = SaplingKey::generate_key();
        let address = key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        let (note, memo) = Note::new(&address, 500, [0u8; MEMO_LENGTH]).unwrap();
        let cv = value_commit(note.value(), &Scalar::from_bytes_wide(&[0x05; 64])).compress();
        let encrypted = encrypt(&note, &memo, key.outgoing_viewing_key(), &cv).unwrap();
        let cmu = note.commitment().unwrap();

        let mut counters = DecryptFailureCounters::default();
        let result = trial_decrypt(
            wrong_key.incoming_view_key(),
            &encrypted.epk,
            &encrypted.enc_ciphertext,
            &cmu,
            &mut counters,
        )
        .unwrap();
        assert!(result.is_none());
        assert!(counters.auth_tag_invalid + counters.commitment_mismatch >= 1);
    }
}
