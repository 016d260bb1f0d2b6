/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bech32-style checksum encoding for payment addresses. The teacher's
//! address type only ever serializes to raw hex; this codec has no direct
//! counterpart there, so it is implemented from the published Bech32
//! checksum algorithm (BIP-173) directly -- see `DESIGN.md`.

use crate::error::{IronfishError, IronfishErrorKind};

const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7";
const CHECKSUM_LEN: usize = 6;
pub const MAX_LENGTH: usize = 90;

fn charset_index(c: u8) -> Option<u8> {
    CHARSET.iter().position(|&x| x == c).map(|i| i as u8)
}

fn polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [
        0x3b6a_57b2,
        0x2650_8e6d,
        0x1ea1_19fa,
        0x3d42_33dd,
        0x2a14_62b3,
    ];
    let mut chk: u32 = 1;
    for &v in values {
        let top = chk >> 25;
        chk = (chk & 0x01ff_ffff) << 5 ^ (v as u32);
        for (i, g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut v = Vec::with_capacity(hrp.len() * 2 + 1);
    for b in hrp.bytes() {
        v.push(b >> 5);
    }
    v.push(0);
    for b in hrp.bytes() {
        v.push(b & 0x1f);
    }
    v
}

fn create_checksum(hrp: &str, data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    values.extend_from_slice(&[0; CHECKSUM_LEN]);
    let polymod = polymod(&values) ^ 1;
    let mut checksum = [0u8; CHECKSUM_LEN];
    for (i, slot) in checksum.iter_mut().enumerate() {
        *slot = ((polymod >> (5 * (5 - i))) & 31) as u8;
    }
    checksum
}

fn verify_checksum(hrp: &str, data: &[u8]) -> bool {
    let mut values = hrp_expand(hrp);
    values.extend_from_slice(data);
    polymod(&values) == 1
}

/// Repacks `bytes` (8-bit groups) into 5-bit groups, padding the final
/// group with zero bits.
fn convert_8_to_5(bytes: &[u8]) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(bytes.len() * 8 / 5 + 1);
    for &b in bytes {
        acc = (acc << 8) | b as u32;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(((acc >> bits) & 0x1f) as u8);
        }
    }
    if bits > 0 {
        out.push(((acc << (5 - bits)) & 0x1f) as u8);
    }
    out
}

/// Inverse of [`convert_8_to_5`]. Returns `None` if the padding bits at the
/// end are nonzero or don't cleanly resolve to whole bytes, per Bech32's
/// strict decoding rules.
fn convert_5_to_8(values: &[u8]) -> Option<Vec<u8>> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut out = Vec::with_capacity(values.len() * 5 / 8);
    for &v in values {
        acc = (acc << 5) | v as u32;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push(((acc >> bits) & 0xff) as u8);
        }
    }
    if bits >= 5 || (acc & ((1 << bits) - 1)) != 0 {
        return None;
    }
    Some(out)
}

/// Encodes `data` under human-readable prefix `hrp`.
pub fn encode(hrp: &str, data: &[u8]) -> Result<String, IronfishError> {
    let values = convert_8_to_5(data);
    let checksum = create_checksum(hrp, &values);

    let mut out = String::with_capacity(hrp.len() + 1 + values.len() + CHECKSUM_LEN);
    out.push_str(hrp);
    out.push('1');
    for v in values.iter().chain(checksum.iter()) {
        out.push(CHARSET[*v as usize] as char);
    }
    if out.len() > MAX_LENGTH {
        return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
    }
    Ok(out)
}

/// Decodes a Bech32-style string, returning `(hrp, data)`. Rejects mixed
/// case and any single-character corruption (via the polymod checksum).
pub fn decode(encoded: &str) -> Result<(String, Vec<u8>), IronfishError> {
    if encoded.len() > MAX_LENGTH {
        return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
    }
    let has_lower = encoded.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = encoded.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(IronfishError::new(IronfishErrorKind::InvalidChecksum));
    }
    let lowercase = encoded.to_ascii_lowercase();

    let sep = lowercase
        .rfind('1')
        .ok_or_else(|| IronfishError::new(IronfishErrorKind::InvalidChecksum))?;
    if sep == 0 || sep + CHECKSUM_LEN + 1 > lowercase.len() {
        return Err(IronfishError::new(IronfishErrorKind::InvalidChecksum));
    }

    let hrp = &lowercase[..sep];
    let data_part = &lowercase[sep + 1..];

    let mut values = Vec::with_capacity(data_part.len());
    for c in data_part.bytes() {
        values.push(
            charset_index(c).ok_or_else(|| IronfishError::new(IronfishErrorKind::InvalidChecksum))?,
        );
    }

    if !verify_checksum(hrp, &values) {
        return Err(IronfishError::new(IronfishErrorKind::InvalidChecksum));
    }

    let payload = &values[..values.len() - CHECKSUM_LEN];
    let data = convert_5_to_8(payload)
        .ok_or_else(|| IronfishError::new(IronfishErrorKind::InvalidChecksum))?;
    Ok((hrp.to_string(), data))
}
