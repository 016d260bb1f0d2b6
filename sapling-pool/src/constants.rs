/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Domain separators and fixed generator points. Every generator here is
//! derived once, at first use, via [`hash_to_curve`] and cached: the
//! specification forbids ad-hoc fallback generators (see the design notes
//! on invented generators), so nothing here is a literal hardcoded point.

use crate::group::{hash_to_curve, Point};

/// `GroupHash` domain separators. The specification calls for an 8-byte
/// domain tag; each of these names the generator it derives.
pub const DIVERSIFY_DOMAIN: &[u8; 8] = b"Diversfy";
pub const SPENDING_KEY_DOMAIN: &[u8; 8] = b"SpendKeG";
pub const PROOF_GENERATION_KEY_DOMAIN: &[u8; 8] = b"ProofGnK";
pub const VALUE_COMMITMENT_VALUE_DOMAIN: &[u8; 8] = b"ValComV0";
pub const VALUE_COMMITMENT_RANDOMNESS_DOMAIN: &[u8; 8] = b"ValComR0";
pub const NULLIFIER_POSITION_DOMAIN: &[u8; 8] = b"NulPosG0";
pub const NOTE_COMMITMENT_TABLE_0_DOMAIN: &[u8; 8] = b"NoteCm00";
pub const NOTE_COMMITMENT_TABLE_1_DOMAIN: &[u8; 8] = b"NoteCm01";

/// Domain-separation labels used directly by the primitives in
/// `primitives/*.rs`. These are hashed in as an ordinary message prefix
/// (via the hasher's `update`, not BLAKE2's fixed-width `personal` field,
/// which is capped at 8 bytes for BLAKE2s / 16 for BLAKE2b and too short
/// for some of these labels) so every domain tag below can be whatever
/// length reads best.
pub const PRF_NULLIFIER_PERSONALIZATION: &[u8] = b"Sapling_Nullifie";
pub const PRF_EXPAND_PERSONALIZATION: &[u8] = b"Sapling_ExpandSe";
pub const KDF_PERSONALIZATION: &[u8] = b"Zcash_NoteEncryp";
pub const NONCE_DERIVE_PERSONALIZATION: &[u8] = b"Zcash_NonceDerive";
pub const CRH_IVK_PERSONALIZATION: &[u8] = b"Zcash_ivk";
pub const EXPANDED_SPEND_BLAKE2_KEY: &[u8] = b"Sapling_ExpandKey";
pub const SIGHASH_PERSONALIZATION: &[u8] = b"Sapling_SigHash";
pub const SHARED_KEY_PERSONALIZATION: &[u8] = b"Sapling_SharedKey";
pub const DIFFIE_HELLMAN_PERSONALIZATION: &[u8] = b"Sapling_DiffieHellman";

lazy_static::lazy_static! {
    /// Base point for deriving a diversified `g_d` from an 11-byte
    /// diversifier: `g_d = GroupHash(DIVERSIFY_DOMAIN, diversifier)`. Unlike
    /// the other constants here, this isn't a single cached point — each
    /// diversifier hashes to its own `g_d` — so it's exposed as a function,
    /// see [`diversify`].
    pub static ref SPENDING_KEY_GENERATOR: Point =
        hash_to_curve(SPENDING_KEY_DOMAIN, b"generator").expect("fixed generator must hash");
    pub static ref PROOF_GENERATION_KEY_GENERATOR: Point =
        hash_to_curve(PROOF_GENERATION_KEY_DOMAIN, b"generator").expect("fixed generator must hash");
    pub static ref VALUE_COMMITMENT_VALUE_GENERATOR: Point =
        hash_to_curve(VALUE_COMMITMENT_VALUE_DOMAIN, b"generator").expect("fixed generator must hash");
    pub static ref VALUE_COMMITMENT_RANDOMNESS_GENERATOR: Point =
        hash_to_curve(VALUE_COMMITMENT_RANDOMNESS_DOMAIN, b"generator").expect("fixed generator must hash");
    pub static ref NULLIFIER_POSITION_GENERATOR: Point =
        hash_to_curve(NULLIFIER_POSITION_DOMAIN, b"generator").expect("fixed generator must hash");
}

/// `g_d = GroupHash(DIVERSIFY_DOMAIN, diversifier)`.
pub fn diversify(diversifier: &[u8; 11]) -> Result<Point, crate::error::IronfishError> {
    hash_to_curve(DIVERSIFY_DOMAIN, diversifier)
}

/// Depth of the incremental Merkle tree.
pub const TREE_DEPTH: usize = 32;

/// Default checkpoint cadence for the scanner.
pub const DEFAULT_CHECKPOINT_INTERVAL: u64 = 1000;

/// Bech32-style human-readable prefixes (specification §6).
pub const MAINNET_HRP: &str = "zs";
pub const TESTNET_HRP: &str = "ztestsapling";
