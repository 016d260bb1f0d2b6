/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `PaymentAddress`: `(diversifier, pk_d)`, Bech32-encoded.

use crate::bech32;
use crate::constants::{self, diversify};
use crate::error::{IronfishError, IronfishErrorKind};
use crate::group::Point;
use crate::scalar::Scalar;

pub const DIVERSIFIER_LENGTH: usize = 11;
pub const PUBLIC_ADDRESS_LENGTH: usize = DIVERSIFIER_LENGTH + 32;

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicAddress {
    diversifier: [u8; DIVERSIFIER_LENGTH],
    transmission_key: Point,
}

impl PublicAddress {
    /// `pk_d = [ivk] * g_d`, where `g_d = GroupHash(diversify-domain, d)`.
    pub fn from_view_key(
        ivk: &Scalar,
        diversifier: [u8; DIVERSIFIER_LENGTH],
    ) -> Result<Self, IronfishError> {
        let g_d = diversify(&diversifier)?;
        Ok(PublicAddress {
            diversifier,
            transmission_key: g_d.mul(ivk),
        })
    }

    pub fn diversifier(&self) -> &[u8; DIVERSIFIER_LENGTH] {
        &self.diversifier
    }

    pub fn transmission_key(&self) -> &Point {
        &self.transmission_key
    }

    /// The diversified base point `g_d` for this address's diversifier.
    pub fn diversified_generator(&self) -> Result<Point, IronfishError> {
        diversify(&self.diversifier)
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_ADDRESS_LENGTH] {
        let mut out = [0u8; PUBLIC_ADDRESS_LENGTH];
        out[..DIVERSIFIER_LENGTH].copy_from_slice(&self.diversifier);
        out[DIVERSIFIER_LENGTH..].copy_from_slice(&self.transmission_key.compress());
        out
    }

    pub fn from_bytes(bytes: &[u8; PUBLIC_ADDRESS_LENGTH]) -> Result<Self, IronfishError> {
        let mut diversifier = [0u8; DIVERSIFIER_LENGTH];
        diversifier.copy_from_slice(&bytes[..DIVERSIFIER_LENGTH]);
        let mut key_bytes = [0u8; 32];
        key_bytes.copy_from_slice(&bytes[DIVERSIFIER_LENGTH..]);
        let transmission_key = Point::decompress_checked(&key_bytes)?;
        Ok(PublicAddress {
            diversifier,
            transmission_key,
        })
    }

    pub fn encode(&self, hrp: &str) -> Result<String, IronfishError> {
        bech32::encode(hrp, &self.to_bytes())
    }

    pub fn decode(hrp: &str, encoded: &str) -> Result<Self, IronfishError> {
        let (decoded_hrp, data) = bech32::decode(encoded)?;
        if decoded_hrp != hrp {
            return Err(IronfishError::new(IronfishErrorKind::InvalidViewingKey));
        }
        if data.len() != PUBLIC_ADDRESS_LENGTH {
            return Err(IronfishError::new(IronfishErrorKind::InvalidLength));
        }
        let mut bytes = [0u8; PUBLIC_ADDRESS_LENGTH];
        bytes.copy_from_slice(&data);
        Self::from_bytes(&bytes)
    }

    pub fn encode_mainnet(&self) -> Result<String, IronfishError> {
        self.encode(constants::MAINNET_HRP)
    }

    pub fn encode_testnet(&self) -> Result<String, IronfishError> {
        self.encode(constants::TESTNET_HRP)
    }
}

impl std::fmt::Debug for PublicAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PublicAddress")
            .field("diversifier", &self.diversifier)
            .field("transmission_key", &self.transmission_key.compress())
            .finish()
    }
}
