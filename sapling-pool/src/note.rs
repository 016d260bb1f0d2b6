/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `Note`: the unit of value held in the pool, plus its wire plaintext
//! layouts (full and compact).

use byteorder::{LittleEndian, WriteBytesExt};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

use crate::constants::diversify;
use crate::error::{IronfishError, IronfishErrorKind};
use crate::group::Point;
use crate::keys::public_address::{PublicAddress, DIVERSIFIER_LENGTH};
use crate::primitives::commitment::note_commit;
use crate::primitives::kdf::prf_expand;
use crate::primitives::nullifier::{nullifier_prf, Nullifier};
use crate::scalar::Scalar;

pub const MEMO_LENGTH: usize = 512;
pub const NOTE_PLAINTEXT_LENGTH: usize = 1 + DIVERSIFIER_LENGTH + 8 + 32 + MEMO_LENGTH;
pub const COMPACT_PLAINTEXT_LENGTH: usize = 1 + DIVERSIFIER_LENGTH + 8 + 16;
pub const CURRENT_LEAD_BYTE: u8 = 0x02;

pub type Memo = [u8; MEMO_LENGTH];

/// `rcm = PRF_expand(rseed, 0x04) mod r`, reduced from the first 32 bytes of
/// the 64-byte PRF output.
fn derive_rcm(rseed: &[u8; 32]) -> Scalar {
    let expanded = prf_expand(rseed, 0x04);
    let mut first_half = [0u8; 32];
    first_half.copy_from_slice(&expanded[..32]);
    Scalar::from_bytes_reduce(&first_half)
}

#[derive(Clone, Zeroize)]
pub struct Note {
    #[zeroize(skip)]
    diversifier: [u8; DIVERSIFIER_LENGTH],
    #[zeroize(skip)]
    pk_d: Point,
    value: u64,
    rseed: [u8; 32],
}

impl Note {
    pub fn new(address: &PublicAddress, value: u64, memo: Memo) -> Result<(Self, Memo), IronfishError> {
        let mut rseed = [0u8; 32];
        OsRng.fill_bytes(&mut rseed);
        let note = Note {
            diversifier: *address.diversifier(),
            pk_d: *address.transmission_key(),
            value,
            rseed,
        };
        Ok((note, memo))
    }

    pub fn from_parts(
        diversifier: [u8; DIVERSIFIER_LENGTH],
        pk_d: Point,
        value: u64,
        rseed: [u8; 32],
    ) -> Self {
        Note {
            diversifier,
            pk_d,
            value,
            rseed,
        }
    }

    pub fn diversifier(&self) -> &[u8; DIVERSIFIER_LENGTH] {
        &self.diversifier
    }

    pub fn pk_d(&self) -> &Point {
        &self.pk_d
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn rseed(&self) -> &[u8; 32] {
        &self.rseed
    }

    pub fn rcm(&self) -> Scalar {
        derive_rcm(&self.rseed)
    }

    /// `cmu = NoteCommit(diversifier, pk_d, value, rcm)`.
    pub fn commitment(&self) -> Result<[u8; 32], IronfishError> {
        note_commit(&self.diversifier, &self.pk_d, self.value, &self.rcm())
    }

    /// `nf = NullifierPRF(nk, cmu, position)`, valid only once the note has
    /// been anchored at `position` in the commitment tree.
    pub fn nullifier(&self, nk: &Point, position: u64) -> Result<Nullifier, IronfishError> {
        let cmu = self.commitment()?;
        Ok(nullifier_prf(nk, position, &cmu))
    }

    /// Full 564-byte note plaintext.
    pub fn to_plaintext(&self, memo: &Memo) -> Vec<u8> {
        let mut out = Vec::with_capacity(NOTE_PLAINTEXT_LENGTH);
        out.push(CURRENT_LEAD_BYTE);
        out.extend_from_slice(&self.diversifier);
        out.write_u64::<LittleEndian>(self.value).expect("Vec write cannot fail");
        out.extend_from_slice(&self.rseed);
        out.extend_from_slice(memo);
        out
    }

    /// Parses a 564-byte note plaintext, without reconstructing `pk_d` (the
    /// caller derives that separately from the viewing key and diversifier,
    /// per the specification's trial-decrypt algorithm).
    pub fn parts_from_plaintext(
        plaintext: &[u8],
    ) -> Result<([u8; DIVERSIFIER_LENGTH], u64, [u8; 32], Memo), IronfishError> {
        if plaintext.len() != NOTE_PLAINTEXT_LENGTH {
            return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
        }
        if plaintext[0] != CURRENT_LEAD_BYTE {
            return Err(IronfishError::new(IronfishErrorKind::MalformedPlaintext));
        }
        let mut diversifier = [0u8; DIVERSIFIER_LENGTH];
        diversifier.copy_from_slice(&plaintext[1..1 + DIVERSIFIER_LENGTH]);

        let value_offset = 1 + DIVERSIFIER_LENGTH;
        let mut value_bytes = [0u8; 8];
        value_bytes.copy_from_slice(&plaintext[value_offset..value_offset + 8]);
        let value = u64::from_le_bytes(value_bytes);

        let rseed_offset = value_offset + 8;
        let mut rseed = [0u8; 32];
        rseed.copy_from_slice(&plaintext[rseed_offset..rseed_offset + 32]);

        let memo_offset = rseed_offset + 32;
        let mut memo = [0u8; MEMO_LENGTH];
        memo.copy_from_slice(&plaintext[memo_offset..memo_offset + MEMO_LENGTH]);

        if diversify(&diversifier).is_err() {
            return Err(IronfishError::new(IronfishErrorKind::MalformedPlaintext));
        }

        Ok((diversifier, value, rseed, memo))
    }

    /// Compact 36-byte note plaintext: a 16-byte prefix of `rseed` instead
    /// of the full 32.
    pub fn to_compact_plaintext(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(COMPACT_PLAINTEXT_LENGTH);
        out.push(CURRENT_LEAD_BYTE);
        out.extend_from_slice(&self.diversifier);
        out.write_u64::<LittleEndian>(self.value).expect("Vec write cannot fail");
        out.extend_from_slice(&self.rseed[..16]);
        out
    }
}

impl std::fmt::Debug for Note {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Note")
            .field("diversifier", &self.diversifier)
            .field("value", &self.value)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::sapling_key::SaplingKey;

    fn test_address() -> PublicAddress {
        let key = SaplingKey::generate_key();
        key.incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap()
    }

    #[test]
    fn commitment_is_deterministic() {
        let address = test_address();
        let (note, _memo) = Note::new(&address, 42, [0u8; MEMO_LENGTH]).unwrap();
        let a = note.commitment().unwrap();
        let b = note.commitment().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn plaintext_roundtrip() {
        let address = test_address();
        let memo = [7u8; MEMO_LENGTH];
        let (note, memo) = Note::new(&address, 1_000_000, memo).unwrap();
        let plaintext = note.to_plaintext(&memo);
        assert_eq!(plaintext.len(), NOTE_PLAINTEXT_LENGTH);
        let (diversifier, value, rseed, parsed_memo) =
            Note::parts_from_plaintext(&plaintext).unwrap();
        assert_eq!(diversifier, *note.diversifier());
        assert_eq!(value, note.value());
        assert_eq!(rseed, *note.rseed());
        assert_eq!(parsed_memo, memo);
    }

    #[test]
    fn nullifier_depends_on_position() {
        let address = test_address();
        let (note, _memo) = Note::new(&address, 5, [0u8; MEMO_LENGTH]).unwrap();
        let nk = *address.transmission_key();
        let a = note.nullifier(&nk, 0).unwrap();
        let b = note.nullifier(&nk, 1).unwrap();
        assert_ne!(a, b);
    }
}
