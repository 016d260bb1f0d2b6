/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Twisted-Edwards curve arithmetic: `-x^2 + y^2 = 1 + d*x^2*y^2` over
//! [`Field`], with the canonical Zcash Jubjub `d`. Points are kept in
//! affine coordinates throughout, matching the specification's formulas
//! directly rather than introducing a projective/extended coordinate
//! system for speed.

use blake2s_simd::Params as Blake2sParams;

use crate::error::{IronfishError, IronfishErrorKind};
use crate::field::Field;
use crate::scalar::Scalar;

/// `d = -(10240/10241) mod p`, Zcash's canonical Jubjub parameter.
const D_BYTES_LE: [u8; 32] = [
    0xb1, 0x3e, 0x34, 0xd6, 0xd6, 0x5f, 0x06, 0x01, 0x26, 0x9d, 0x57, 0x37, 0x6d, 0x7f, 0x2d, 0x29,
    0xd4, 0x7f, 0xbd, 0xe6, 0x07, 0x92, 0xfd, 0xf5, 0x48, 0x2b, 0xfa, 0x4b, 0xe7, 0x18, 0x93, 0x2a,
];

fn d() -> Field {
    Field::from_bytes(&D_BYTES_LE).expect("d is a canonical field element")
}

/// 64-byte uniform random string appended to hash-to-curve input, fixed so
/// that the map is reproducible across implementations.
const GROUP_HASH_URS: [u8; 64] = *b"Sapling-style shielded pool group hash uniform random string!!!";

/// A point on the curve, in affine coordinates. `Point::identity()` is
/// `(0, 1)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Point {
    x: Field,
    y: Field,
}

impl Point {
    pub fn identity() -> Self {
        Point {
            x: Field::zero(),
            y: Field::one(),
        }
    }

    pub fn x(&self) -> &Field {
        &self.x
    }

    pub fn y(&self) -> &Field {
        &self.y
    }

    /// Constructs a point from affine coordinates without checking that it
    /// lies on the curve. Only used internally once a point has already
    /// been validated (e.g. by `decompress`).
    fn from_xy_unchecked(x: Field, y: Field) -> Self {
        Point { x, y }
    }

    fn on_curve(x: &Field, y: &Field) -> bool {
        let x2 = x.square();
        let y2 = y.square();
        let lhs = y2.sub(&x2);
        let rhs = Field::one().add(&d().mul(&x2).mul(&y2));
        lhs == rhs
    }

    /// `x_3 = (x1*y2 + y1*x2) / (1 + d*x1*x2*y1*y2)`
    /// `y_3 = (y1*y2 + x1*x2) / (1 - d*x1*x2*y1*y2)`
    pub fn add(&self, other: &Self) -> Self {
        let x1y2 = self.x.mul(&other.y);
        let y1x2 = self.y.mul(&other.x);
        let y1y2 = self.y.mul(&other.y);
        let x1x2 = self.x.mul(&other.x);
        let dxxyy = d().mul(&x1x2).mul(&y1y2);

        let x3 = x1y2
            .add(&y1x2)
            .div(&Field::one().add(&dxxyy))
            .expect("1 + d*x1*x2*y1*y2 is never zero for subgroup points");
        let y3 = y1y2
            .add(&x1x2)
            .div(&Field::one().sub(&dxxyy))
            .expect("1 - d*x1*x2*y1*y2 is never zero for subgroup points");
        Point { x: x3, y: y3 }
    }

    pub fn double(&self) -> Self {
        self.add(self)
    }

    pub fn neg(&self) -> Self {
        Point {
            x: self.x.neg(),
            y: self.y,
        }
    }

    /// Right-to-left binary scalar multiplication. The scalar is already
    /// reduced mod `r` by virtue of being a [`Scalar`].
    pub fn mul(&self, scalar: &Scalar) -> Self {
        let mut result = Point::identity();
        let mut base = *self;
        let bytes = scalar.to_bytes();
        for byte in bytes.iter() {
            let mut b = *byte;
            for _ in 0..8 {
                if b & 1 == 1 {
                    result = result.add(&base);
                }
                base = base.double();
                b >>= 1;
            }
        }
        result
    }

    /// Encodes `y` little-endian with the sign bit of `x` packed into the
    /// top bit of the last byte.
    pub fn compress(&self) -> [u8; 32] {
        let mut bytes = self.y.to_bytes();
        if self.x.is_odd() {
            bytes[31] |= 0x80;
        }
        bytes
    }

    /// Decompresses a point, solving `x^2 = (y^2 - 1) / (1 + d*y^2)` and
    /// choosing the root whose parity matches the packed sign bit. Fails
    /// with `InvalidPoint` if there is no such root, or the sign bit does
    /// not match either root.
    pub fn decompress(bytes: &[u8; 32]) -> Result<Self, IronfishError> {
        let sign = bytes[31] & 0x80 != 0;
        let mut y_bytes = *bytes;
        y_bytes[31] &= 0x7f;
        let y = Field::from_bytes(&y_bytes)
            .map_err(|_| IronfishError::new(IronfishErrorKind::InvalidPoint))?;

        let y2 = y.square();
        let numerator = y2.sub(&Field::one());
        let denominator = Field::one().add(&d().mul(&y2));
        let x2 = numerator
            .div(&denominator)
            .map_err(|_| IronfishError::new(IronfishErrorKind::InvalidPoint))?;

        let mut x = x2
            .sqrt()
            .ok_or_else(|| IronfishError::new(IronfishErrorKind::InvalidPoint))?;
        if x.is_odd() != sign {
            x = x.neg();
        }
        if x.is_odd() != sign {
            // Neither root has the requested parity (possible only for
            // x == 0 with sign == true, which is not a valid encoding).
            return Err(IronfishError::new(IronfishErrorKind::InvalidPoint));
        }

        if !Point::on_curve(&x, &y) {
            return Err(IronfishError::new(IronfishErrorKind::InvalidPoint));
        }
        Ok(Point::from_xy_unchecked(x, y))
    }

    /// Decompresses and additionally requires that the point lies in the
    /// prime-order subgroup, failing with `IsSmallOrder` otherwise. Used
    /// anywhere a point is read from untrusted wire data (a transmission
    /// key, an ephemeral public key) rather than freshly derived in-process
    /// by this crate.
    pub fn decompress_checked(bytes: &[u8; 32]) -> Result<Self, IronfishError> {
        let point = Point::decompress(bytes)?;
        if !point.is_in_subgroup() {
            return Err(IronfishError::new(IronfishErrorKind::IsSmallOrder));
        }
        Ok(point)
    }

    /// Checks that a decompressed point is in the prime-order subgroup by
    /// multiplying by the literal subgroup order `r` and confirming the
    /// result is the identity. This has to multiply by `r` as an integer,
    /// not as a `Scalar` (every `Scalar` is already reduced mod `r`, so `r`
    /// itself is indistinguishable from `0` in that representation) — it
    /// walks the raw bits of `r` directly instead. Cleared-cofactor points
    /// (the only ones this crate constructs via [`hash_to_curve`]) always
    /// pass; this guards against a maliciously-crafted point supplied over
    /// the wire.
    pub fn is_in_subgroup(&self) -> bool {
        mul_by_raw_integer(self, &crate::scalar::MODULUS) == Point::identity()
    }
}

/// Double-and-add by the literal bits of a little-endian limb array,
/// without reducing modulo anything. Used only for the subgroup check,
/// which must multiply by the exact integer `r`.
fn mul_by_raw_integer(p: &Point, limbs: &[u64; 4]) -> Point {
    let mut result = Point::identity();
    let mut base = *p;
    for &limb in limbs.iter() {
        let mut word = limb;
        for _ in 0..64 {
            if word & 1 == 1 {
                result = result.add(&base);
            }
            base = base.double();
            word >>= 1;
        }
    }
    result
}

/// Hash-to-curve: `GroupHash(domain, message)`. `domain` must be 8 bytes.
/// Hashes `domain || message || URS` with BLAKE2s-256, attempts to
/// decompress the result as a point, and on failure appends a one-byte
/// counter and retries (up to 256 times). The result is then multiplied by
/// the cofactor (8) to land in the prime-order subgroup; an identity result
/// is rejected (vanishingly unlikely, but would indicate a degenerate
/// input).
pub fn hash_to_curve(domain: &[u8; 8], message: &[u8]) -> Result<Point, IronfishError> {
    for counter in 0u16..256 {
        let mut hasher = Blake2sParams::new().hash_length(32).to_state();
        hasher.update(domain);
        hasher.update(message);
        hasher.update(&GROUP_HASH_URS);
        if counter > 0 {
            hasher.update(&[counter as u8]);
        }
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(digest.as_bytes());

        if let Ok(candidate) = Point::decompress(&bytes) {
            let cleared = clear_cofactor(&candidate);
            if cleared != Point::identity() {
                return Ok(cleared);
            }
        }
    }
    Err(IronfishError::new(IronfishErrorKind::InvalidPoint))
}

/// Multiplies by the cofactor (8) via three doublings.
fn clear_cofactor(p: &Point) -> Point {
    p.double().double().double()
}

#[cfg(test)]
mod test {
    use super::*;

    fn gen() -> Point {
        hash_to_curve(b"test-gen", b"generator").unwrap()
    }

    #[test]
    fn identity_is_on_curve() {
        assert!(Point::on_curve(&Field::zero(), &Field::one()));
    }

    #[test]
    fn addition_commutes() {
        let p = gen();
        let q = hash_to_curve(b"test-gen", b"other").unwrap();
        assert_eq!(p.add(&q), q.add(&p));
    }

    #[test]
    fn addition_associates() {
        let p = gen();
        let q = hash_to_curve(b"test-gen", b"other").unwrap();
        let s = hash_to_curve(b"test-gen", b"third").unwrap();
        assert_eq!(p.add(&q).add(&s), p.add(&q.add(&s)));
    }

    #[test]
    fn compress_decompress_roundtrip() {
        let p = gen();
        let bytes = p.compress();
        let back = Point::decompress(&bytes).unwrap();
        assert_eq!(p, back);
    }

    #[test]
    fn scalar_mult_distributes() {
        let p = gen();
        let a = Scalar::from_bytes_wide(&[0x11; 64]);
        let b = Scalar::from_bytes_wide(&[0x22; 64]);
        let lhs = p.mul(&a).mul(&b);
        let rhs = p.mul(&b).mul(&a);
        let ab = a.mul(&b);
        assert_eq!(lhs, rhs);
        assert_eq!(lhs, p.mul(&ab));
    }

    #[test]
    fn double_equals_add_self() {
        let p = gen();
        assert_eq!(p.double(), p.add(&p));
    }
}
