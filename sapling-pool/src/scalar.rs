/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The Jubjub subgroup's scalar field: integers modulo the subgroup order
//! `r`. Every secret exponent (`ask`, `nsk`, `esk`, `rcv`, `alpha`, `bsk`)
//! and every `ivk` is a `Scalar`.

use std::fmt;

use zeroize::Zeroize;

use crate::arith::{self, Limbs};
use crate::error::{IronfishError, IronfishErrorKind};

/// `r = 0xe7db4ea6533afa906673b0101343b00a6682093ccc81082d0970e5ed6f72cb7`
pub const MODULUS: Limbs = [
    0xd097_0e5e_d6f7_2cb7,
    0xa668_2093_ccc8_1082,
    0x0667_3b01_0134_3b00,
    0x0e7d_b4ea_6533_afa9,
];

#[derive(Clone, Copy, PartialEq, Eq, Zeroize)]
pub struct Scalar(Limbs);

impl Scalar {
    pub fn zero() -> Self {
        Scalar(arith::ZERO)
    }

    pub fn one() -> Self {
        Scalar(arith::ONE)
    }

    pub fn is_zero(&self) -> bool {
        arith::is_zero(&self.0)
    }

    /// Strict: bytes must already encode a value in `[0, r)`. Used where the
    /// specification requires rejecting non-canonical scalar encodings
    /// outright (e.g. a spend-authorizing key read back from storage).
    pub fn from_bytes_canonical(bytes: &[u8; 32]) -> Result<Self, IronfishError> {
        let limbs = arith::from_bytes_le(bytes);
        if arith::ge(&limbs, &MODULUS) {
            return Err(IronfishError::new(IronfishErrorKind::InvalidFr));
        }
        Ok(Scalar(limbs))
    }

    /// Reduces an arbitrary little-endian integer mod `r`. The
    /// specification requires scalars to be "always reduced before use"
    /// rather than rejected, so this is the default constructor used at
    /// most interface boundaries (signature nonces, challenge hashes,
    /// `rcm`/`rcv` derivation).
    pub fn from_bytes_reduce(bytes: &[u8; 32]) -> Self {
        let mut wide = [0u8; 64];
        wide[..32].copy_from_slice(bytes);
        Self::from_bytes_wide(&wide)
    }

    pub fn from_bytes_wide(bytes: &[u8; 64]) -> Self {
        let wide = arith::reduce_wide_bytes(bytes);
        Scalar(arith::reduce_512(&wide, &MODULUS))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        arith::to_bytes_le(&self.0)
    }

    pub fn add(&self, other: &Self) -> Self {
        Scalar(arith::add(&self.0, &other.0, &MODULUS))
    }

    pub fn sub(&self, other: &Self) -> Self {
        Scalar(arith::sub(&self.0, &other.0, &MODULUS))
    }

    pub fn neg(&self) -> Self {
        Scalar(arith::negate(&self.0, &MODULUS))
    }

    pub fn mul(&self, other: &Self) -> Self {
        Scalar(arith::mul(&self.0, &other.0, &MODULUS))
    }

    pub fn square(&self) -> Self {
        Scalar(arith::square(&self.0, &MODULUS))
    }

    pub fn invert(&self) -> Result<Self, IronfishError> {
        if self.is_zero() {
            return Err(IronfishError::new(IronfishErrorKind::DivisionByZero));
        }
        let exp = arith::minus_two(&MODULUS);
        Ok(Scalar(arith::pow(&self.0, &exp, &MODULUS)))
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Scalar(0x")?;
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
    fn reduces_rather_than_rejects() {
        // MODULUS itself, read back, must reduce to zero rather than error.
        let bytes = arith::to_bytes_le(&MODULUS);
        let s = Scalar::from_bytes_reduce(&bytes);
        assert_eq!(s, Scalar::zero());
    }

    #[test]
    fn canonical_rejects_modulus() {
        let bytes = arith::to_bytes_le(&MODULUS);
        assert!(Scalar::from_bytes_canonical(&bytes).is_err());
    }

    #[test]
    fn invert_roundtrip() {
        let a = Scalar::one().add(&Scalar::one()).add(&Scalar::one());
        let inv = a.invert().unwrap();
        assert_eq!(a.mul(&inv), Scalar::one());
    }

    #[test]
    fn associativity() {
        let a = Scalar::from_bytes_wide(&[0x11; 64]);
        let b = Scalar::from_bytes_wide(&[0x22; 64]);
        let c = Scalar::from_bytes_wide(&[0x33; 64]);
        assert_eq!(a.mul(&b).mul(&c), a.mul(&b.mul(&c)));
    }
}
