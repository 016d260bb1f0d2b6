/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Viewing keys: `IncomingViewKey` decrypts notes sent to an address,
//! `OutgoingViewKey` decrypts notes sent *by* the holder, and `ViewKey`
//! bundles both plus the public key material (`ak`, `nk`) needed for
//! nullifier derivation and spend-signature verification.

use blake2b_simd::Params;

use crate::constants::DIFFIE_HELLMAN_PERSONALIZATION;
use crate::error::IronfishError;
use crate::group::Point;
use crate::keys::public_address::{PublicAddress, DIVERSIFIER_LENGTH};
use crate::scalar::Scalar;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct IncomingViewKey {
    pub view_key: Scalar,
}

impl IncomingViewKey {
    pub fn public_address(
        &self,
        diversifier: [u8; DIVERSIFIER_LENGTH],
    ) -> Result<PublicAddress, IronfishError> {
        PublicAddress::from_view_key(&self.view_key, diversifier)
    }

    /// `[ivk] * epk`, the receiver's side of the note-encryption ECDH
    /// agreement.
    pub fn shared_secret(&self, ephemeral_public_key: &Point) -> Point {
        ephemeral_public_key.mul(&self.view_key)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OutgoingViewKey {
    pub view_key: [u8; 32],
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ViewKey {
    pub authorizing_key: Point,
    pub nullifier_deriving_key: Point,
    pub incoming_view_key: IncomingViewKey,
    pub outgoing_view_key: OutgoingViewKey,
}

impl ViewKey {
    pub fn authorizing_key(&self) -> &Point {
        &self.authorizing_key
    }

    pub fn nullifier_deriving_key(&self) -> &Point {
        &self.nullifier_deriving_key
    }

    pub fn public_address(
        &self,
        diversifier: [u8; DIVERSIFIER_LENGTH],
    ) -> Result<PublicAddress, IronfishError> {
        self.incoming_view_key.public_address(diversifier)
    }
}

/// `BLAKE2b-256(domain, [secret]*other_public || reference_public)`, the
/// key-agreement hash both sides of an ECDH exchange converge on. Used by
/// callers that already hold a raw scalar/point pair rather than going
/// through [`IncomingViewKey::shared_secret`] (e.g. the sender's side of
/// note encryption, using `esk` and `pk_d`).
pub fn shared_secret(
    secret_key: &Scalar,
    other_public_key: &Point,
    reference_public_key: &Point,
) -> [u8; 32] {
    let shared_point = other_public_key.mul(secret_key);
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(DIFFIE_HELLMAN_PERSONALIZATION);
    hasher.update(&shared_point.compress());
    hasher.update(&reference_public_key.compress());
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}
