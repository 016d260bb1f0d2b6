/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Schnorr-on-twisted-Edwards signature: spend-authorization and binding
//! signatures are both instances of this same scheme, differing only in
//! which generator and key they're computed against.

use blake2b_simd::Params;

use crate::error::{IronfishError, IronfishErrorKind};
use crate::group::Point;
use crate::scalar::Scalar;

pub const SIGNATURE_LENGTH: usize = 64;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Signature {
    pub r: Point,
    pub s: Scalar,
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        let mut out = [0u8; SIGNATURE_LENGTH];
        out[..32].copy_from_slice(&self.r.compress());
        out[32..].copy_from_slice(&self.s.to_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8; SIGNATURE_LENGTH]) -> Result<Self, IronfishError> {
        let mut r_bytes = [0u8; 32];
        r_bytes.copy_from_slice(&bytes[..32]);
        let mut s_bytes = [0u8; 32];
        s_bytes.copy_from_slice(&bytes[32..]);
        let r = Point::decompress_checked(&r_bytes)?;
        let s = Scalar::from_bytes_canonical(&s_bytes)
            .map_err(|_| IronfishError::new(IronfishErrorKind::InvalidSignature))?;
        Ok(Signature { r, s })
    }
}

fn hash_to_scalar(domain: &[u8], parts: &[&[u8]]) -> Scalar {
    let mut hasher = Params::new().hash_length(64).to_state();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut wide = [0u8; 64];
    wide.copy_from_slice(digest.as_bytes());
    Scalar::from_bytes_wide(&wide)
}

/// Deterministic Schnorr signature over `message`, using `generator` as the
/// base point and `public_key = [sk]*generator` as the signer's key.
/// `sk` must be nonzero; this is the caller's responsibility (a zero
/// spend-authorizing or binding key is already rejected at key-derivation
/// time).
pub fn sign(generator: &Point, sk: &Scalar, public_key: &Point, message: &[u8]) -> Signature {
    let nonce = hash_to_scalar(b"Sapling_SigNonce", &[&sk.to_bytes(), message]);
    let r_point = generator.mul(&nonce);
    let challenge = hash_to_scalar(
        b"Sapling_SigChall",
        &[&r_point.compress(), &public_key.compress(), message],
    );
    let s = nonce.add(&challenge.mul(sk));
    Signature { r: r_point, s }
}

/// Verifies `[s]*generator == R + [c]*public_key`.
pub fn verify(
    generator: &Point,
    public_key: &Point,
    message: &[u8],
    signature: &Signature,
) -> Result<(), IronfishError> {
    let challenge = hash_to_scalar(
        b"Sapling_SigChall",
        &[&signature.r.compress(), &public_key.compress(), message],
    );
    let lhs = generator.mul(&signature.s);
    let rhs = signature.r.add(&public_key.mul(&challenge));
    if lhs == rhs {
        Ok(())
    } else {
        Err(IronfishError::new(IronfishErrorKind::InvalidSignature))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::group::hash_to_curve;

    #[test]
    fn sign_and_verify() {
        let generator = hash_to_curve(b"testsigG", b"generator").unwrap();
        let sk = Scalar::from_bytes_wide(&[0x13; 64]);
        let pk = generator.mul(&sk);
        let message = b"a sighash";
        let sig = sign(&generator, &sk, &pk, message);
        verify(&generator, &pk, message, &sig).unwrap();
    }

    #[test]
    fn wrong_message_rejects() {
        let generator = hash_to_curve(b"testsigG", b"generator").unwrap();
        let sk = Scalar::from_bytes_wide(&[0x13; 64]);
        let pk = generator.mul(&sk);
        let sig = sign(&generator, &sk, &pk, b"message one");
        assert!(verify(&generator, &pk, b"message two", &sig).is_err());
    }

    #[test]
    fn byte_roundtrip() {
        let generator = hash_to_curve(b"testsigG", b"generator").unwrap();
        let sk = Scalar::from_bytes_wide(&[0x13; 64]);
        let pk = generator.mul(&sk);
        let sig = sign(&generator, &sk, &pk, b"message");
        let bytes = sig.to_bytes();
        let back = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(sig, back);
    }
}
