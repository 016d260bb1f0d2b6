/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `NoteCommit` (windowed Pedersen-style hash) and `ValueCommit`.

use crate::constants::{
    NOTE_COMMITMENT_TABLE_0_DOMAIN, NOTE_COMMITMENT_TABLE_1_DOMAIN,
    VALUE_COMMITMENT_RANDOMNESS_GENERATOR, VALUE_COMMITMENT_VALUE_GENERATOR,
};
use crate::error::IronfishError;
use crate::group::{hash_to_curve, Point};
use crate::scalar::Scalar;

/// Upper bound on the number of 4-bit windows any `NoteCommit` input needs.
/// The full note-commitment message is
/// `diversifier(11) || pk_d(32) || value(8) || rcm(32)` = 83 bytes = 166
/// nibbles; 256 leaves headroom without growing unboundedly.
const MAX_WINDOWS: usize = 256;

lazy_static::lazy_static! {
    static ref TABLE_0: Vec<Point> = derive_table(NOTE_COMMITMENT_TABLE_0_DOMAIN);
    static ref TABLE_1: Vec<Point> = derive_table(NOTE_COMMITMENT_TABLE_1_DOMAIN);
}

fn derive_table(domain: &[u8; 8]) -> Vec<Point> {
    (0..MAX_WINDOWS)
        .map(|i| {
            hash_to_curve(domain, &(i as u32).to_le_bytes())
                .expect("fixed generator table entry must hash")
        })
        .collect()
}

/// Splits `bytes` into 4-bit nibbles, least significant nibble of the first
/// byte first.
fn nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(byte & 0x0f);
        out.push(byte >> 4);
    }
    out
}

/// Windowed sum of generator multiples: each 4-bit window of the message
/// selects a scalar multiplier (0-15) for the window's generator, drawn
/// alternately from the two pre-derived tables. This is the specification's
/// simplified stand-in for Sapling's 3-bit-window Pedersen hash, expanded
/// to 4-bit windows to match the specification's wording exactly.
fn windowed_sum(message: &[u8]) -> Result<Point, IronfishError> {
    let mut acc = Point::identity();
    for (i, nibble) in nibbles(message).into_iter().enumerate() {
        if nibble == 0 {
            continue;
        }
        let table = if i % 2 == 0 { &*TABLE_0 } else { &*TABLE_1 };
        let generator = table
            .get(i / 2)
            .expect("MAX_WINDOWS must cover every NoteCommit input");
        let scalar = Scalar::from_bytes_reduce(&{
            let mut buf = [0u8; 32];
            buf[0] = nibble;
            buf
        });
        acc = acc.add(&generator.mul(&scalar));
    }
    Ok(acc)
}

/// `NoteCommit(diversifier, pk_d, value, rcm) -> cmu`, returned as the
/// compressed y-coordinate of the resulting point.
pub fn note_commit(
    diversifier: &[u8; 11],
    pk_d: &Point,
    value: u64,
    rcm: &Scalar,
) -> Result<[u8; 32], IronfishError> {
    let mut message = Vec::with_capacity(11 + 32 + 8 + 32);
    message.extend_from_slice(diversifier);
    message.extend_from_slice(&pk_d.compress());
    message.extend_from_slice(&value.to_le_bytes());
    message.extend_from_slice(&rcm.to_bytes());

    let point = windowed_sum(&message)?;
    Ok(point.compress())
}

/// A `u64` reduced into the scalar field, little-endian.
pub fn value_scalar(value: u64) -> Scalar {
    Scalar::from_bytes_reduce(&{
        let mut buf = [0u8; 32];
        buf[..8].copy_from_slice(&value.to_le_bytes());
        buf
    })
}

/// `cv = [value]*G_v + [rcv]*G_r`.
pub fn value_commit(value: u64, rcv: &Scalar) -> Point {
    VALUE_COMMITMENT_VALUE_GENERATOR
        .mul(&value_scalar(value))
        .add(&VALUE_COMMITMENT_RANDOMNESS_GENERATOR.mul(rcv))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn note_commit_deterministic() {
        let diversifier = [1u8; 11];
        let pk_d = hash_to_curve(b"testpkd0", b"pk_d").unwrap();
        let rcm = Scalar::from_bytes_wide(&[0x07; 64]);
        let a = note_commit(&diversifier, &pk_d, 1_000_000, &rcm).unwrap();
        let b = note_commit(&diversifier, &pk_d, 1_000_000, &rcm).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn note_commit_sensitive_to_value() {
        let diversifier = [1u8; 11];
        let pk_d = hash_to_curve(b"testpkd0", b"pk_d").unwrap();
        let rcm = Scalar::from_bytes_wide(&[0x07; 64]);
        let a = note_commit(&diversifier, &pk_d, 1_000_000, &rcm).unwrap();
        let b = note_commit(&diversifier, &pk_d, 1_000_001, &rcm).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn value_commit_additively_homomorphic_in_value() {
        let rcv = Scalar::from_bytes_wide(&[0x09; 64]);
        let cv1 = value_commit(100, &rcv);
        let cv2 = value_commit(1, &Scalar::zero());
        let combined = cv1.add(&cv2);
        let direct = value_commit(101, &rcv);
        assert_eq!(combined, direct);
    }
}
