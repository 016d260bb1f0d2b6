/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The proving backend is out of scope for this crate (it lives behind a
//! Groth16 circuit implementation elsewhere); this module only defines the
//! interface the transaction builder calls against.
//!
//! `cv`, `rk`, `nf`, and `cmu` are all plain group arithmetic the builder
//! computes for itself (see `transaction/spend.rs` and
//! `transaction/output.rs`); the prover is only asked for the proof bytes
//! attesting that those values are consistent with a well-formed note,
//! taking them as inputs rather than echoing them back.

use crate::error::IronfishError;
use crate::group::Point;
use crate::scalar::Scalar;

pub const PROOF_LENGTH: usize = 192;
pub type Proof = [u8; PROOF_LENGTH];

pub struct SpendProofInputs {
    pub value: u64,
    pub value_commitment_randomness: Scalar,
    pub note_commitment_randomness: Scalar,
    pub ak: Point,
    pub nsk: Scalar,
    pub diversifier: [u8; 11],
    pub auth_path: Vec<[u8; 32]>,
    pub anchor: [u8; 32],
    pub alpha: Scalar,
    pub value_commitment: Point,
    pub randomized_public_key: Point,
}

pub struct OutputProofInputs {
    pub value: u64,
    pub value_commitment_randomness: Scalar,
    pub note_commitment_randomness: Scalar,
    pub diversifier: [u8; 11],
    pub pk_d: Point,
    pub esk: Scalar,
    pub value_commitment: Point,
    pub note_commitment: [u8; 32],
}

/// Abstract Groth16 proving oracle. The core never inspects which concrete
/// backend is behind it (local prover, remote enclave, test stub); it only
/// calls these two methods.
pub trait Prover {
    fn prove_spend(&self, inputs: SpendProofInputs) -> Result<Proof, IronfishError>;
    fn prove_output(&self, inputs: OutputProofInputs) -> Result<Proof, IronfishError>;
}
