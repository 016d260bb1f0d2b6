/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The curve's base field: integers modulo the BLS12-381 scalar field prime
//! `p`. This is the field Jubjub's `x`/`y` coordinates live in.

use std::fmt;

use zeroize::Zeroize;

use crate::arith::{self, Limbs};
use crate::error::{IronfishError, IronfishErrorKind};

/// `p = 0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001`
pub const MODULUS: Limbs = [
    0xffff_ffff_0000_0001,
    0x53bd_a402_fffe_5bfe,
    0x3339_d808_09a1_d805,
    0x73ed_a753_299d_7d48,
];

// p - 1 = 2^S * T, T odd. The field's 2-adicity is 32, same as the rest of
// the BLS12-381/Jubjub family, so a full Tonelli-Shanks sqrt is used rather
// than the simplified p = 5 (mod 8) shortcut (that shortcut does not apply
// here: this p is 1 mod 8, not 5 mod 8).
const S: u32 = 32;

const T: Limbs = [
    0xfffe_5bfe_ffff_ffff,
    0x09a1_d805_53bd_a402,
    0x299d_7d48_3339_d808,
    0x0000_0000_73ed_a753,
];

const T_PLUS_1_OVER_2: Limbs = [
    0x7fff_2dff_8000_0000,
    0x04d0_ec02_a9de_d201,
    0x94ce_bea4_199c_ec04,
    0x0000_0000_39f6_d3a9,
];

/// A fixed element of multiplicative order `2^S`, the starting point for
/// Tonelli-Shanks.
const ROOT_OF_UNITY: Limbs = [
    0x1b78_8f50_0b91_2f1f,
    0xc402_4ff2_70b3_e094,
    0x0fd5_6dc8_d168_d6c0,
    0x0212_d79e_5b41_6b6f,
];

#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Field(Limbs);

impl Field {
    pub fn zero() -> Self {
        Field(arith::ZERO)
    }

    pub fn one() -> Self {
        Field(arith::ONE)
    }

    pub fn is_zero(&self) -> bool {
        arith::is_zero(&self.0)
    }

    /// Interprets `bytes` as a little-endian integer and reduces it into
    /// `[0, p)`. Returns `InvalidFr` if the value is not already in range,
    /// matching the specification's requirement that field elements cross
    /// interface boundaries in canonical form.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, IronfishError> {
        let limbs = arith::from_bytes_le(bytes);
        if arith::ge(&limbs, &MODULUS) {
            return Err(IronfishError::new(IronfishErrorKind::InvalidFr));
        }
        Ok(Field(limbs))
    }

    /// Reduces a 64-byte little-endian integer modulo `p`, used to fold wide
    /// hash/PRF output into a field element.
    pub fn from_bytes_wide(bytes: &[u8; 64]) -> Self {
        let wide = arith::reduce_wide_bytes(bytes);
        Field(arith::reduce_512(&wide, &MODULUS))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        arith::to_bytes_le(&self.0)
    }

    pub fn add(&self, other: &Self) -> Self {
        Field(arith::add(&self.0, &other.0, &MODULUS))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Field(arith::sub(&self.0, &other.0, &MODULUS))
    }

    pub fn neg(&self) -> Self {
        Field(arith::negate(&self.0, &MODULUS))
    }

    pub fn mul(&self, other: &Self) -> Self {
        Field(arith::mul(&self.0, &other.0, &MODULUS))
    }

    pub fn square(&self) -> Self {
        Field(arith::square(&self.0, &MODULUS))
    }

    /// Multiplicative inverse via Fermat's little theorem: `a^(p-2) mod p`.
    /// Fails with `DivisionByZero` on the zero element, since 0 has no
    /// inverse.
    pub fn invert(&self) -> Result<Self, IronfishError> {
        if self.is_zero() {
            return Err(IronfishError::new(IronfishErrorKind::DivisionByZero));
        }
        let exp = arith::minus_two(&MODULUS);
        Ok(Field(arith::pow(&self.0, &exp, &MODULUS)))
    }

    pub fn div(&self, other: &Self) -> Result<Self, IronfishError> {
        Ok(self.mul(&other.invert()?))
    }

    /// Tonelli-Shanks square root. Returns `None` if `self` is not a
    /// quadratic residue.
    pub fn sqrt(&self) -> Option<Self> {
        if self.is_zero() {
            return Some(Field::zero());
        }
        let mut m = S;
        let mut c = Field(ROOT_OF_UNITY);
        let mut t = Field(arith::pow(&self.0, &T, &MODULUS));
        let mut r = Field(arith::pow(&self.0, &T_PLUS_1_OVER_2, &MODULUS));

        while t != Field::one() {
            // Find the least i in (0, m) with t^(2^i) == 1.
            let mut i = 0u32;
            let mut t2i = t;
            while t2i != Field::one() {
                t2i = t2i.square();
                i += 1;
                if i == m {
                    // self was not a quadratic residue after all.
                    return None;
                }
            }
            let mut b = c;
            for _ in 0..(m - i - 1) {
                b = b.square();
            }
            m = i;
            c = b.square();
            t = t.mul(&c);
            r = r.mul(&b);
        }
        if r.square() == *self {
            Some(r)
        } else {
            None
        }
    }

    /// True iff the field element is odd, used by point compression to pick
    /// the x-coordinate's sign bit.
    pub fn is_odd(&self) -> bool {
        self.0[0] & 1 == 1
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Field(0x")?;
        for byte in self.to_bytes().iter().rev() {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn zero_and_one() {
        assert!(Field::zero().is_zero());
        assert!(!Field::one().is_zero());
        assert_eq!(Field::one().add(&Field::zero()), Field::one());
    }

    #[test]
    fn add_sub_roundtrip() {
        let a = Field::one().add(&Field::one()).add(&Field::one());
        let b = Field::one();
        let sum = a.add(&b);
        assert_eq!(sum.sub(&b), a);
    }

    #[test]
    fn invert_zero_fails() {
        let err = Field::zero().invert().unwrap_err();
        assert_eq!(err.kind, IronfishErrorKind::DivisionByZero);
    }

    #[test]
    fn invert_roundtrip() {
        let a = Field::one().add(&Field::one()).add(&Field::one());
        let inv = a.invert().unwrap();
        assert_eq!(a.mul(&inv), Field::one());
    }

    #[test]
    fn sqrt_of_square_is_root() {
        let a = Field::one().add(&Field::one());
        let squared = a.square();
        let root = squared.sqrt().expect("square must have a root");
        assert_eq!(root.square(), squared);
    }

    #[test]
    fn bytes_roundtrip() {
        let a = Field::one().add(&Field::one()).add(&Field::one());
        let bytes = a.to_bytes();
        let back = Field::from_bytes(&bytes).unwrap();
        assert_eq!(a, back);
    }

    #[test]
    fn rejects_non_canonical_bytes() {
        let bytes = arith::to_bytes_le(&MODULUS);
        assert!(Field::from_bytes(&bytes).is_err());
    }
}
