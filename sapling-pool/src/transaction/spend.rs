/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Spend descriptions: one per note being consumed.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::SPENDING_KEY_GENERATOR;
use crate::error::IronfishError;
use crate::group::Point;
use crate::keys::sapling_key::SaplingKey;
use crate::merkle_tree::MerkleWitness;
use crate::note::Note;
use crate::primitives::commitment::value_commit;
use crate::primitives::nullifier::Nullifier;
use crate::primitives::signature::{self, Signature, SIGNATURE_LENGTH};
use crate::prover::{Prover, SpendProofInputs, PROOF_LENGTH};
use crate::scalar::Scalar;

pub const SPEND_DESCRIPTION_LENGTH: usize = 32 + 32 + 32 + 32 + PROOF_LENGTH + SIGNATURE_LENGTH;

/// One note queued to be spent, with the witness proving it's anchored in
/// the tree.
pub struct SpendBuilder {
    note: Note,
    witness: MerkleWitness,
}

impl SpendBuilder {
    pub fn new(note: Note, witness: MerkleWitness) -> Self {
        SpendBuilder { note, witness }
    }

    pub fn value(&self) -> u64 {
        self.note.value()
    }

    /// Draws `rcv`/`alpha`, computes `cv`, `rk`, `nf`, and calls the prover.
    /// The signature is added later, once the sighash is known.
    pub fn build(
        &self,
        spender_key: &SaplingKey,
        prover: &dyn Prover,
    ) -> Result<UnsignedSpendDescription, IronfishError> {
        let mut rcv_bytes = [0u8; 64];
        OsRng.fill_bytes(&mut rcv_bytes);
        let rcv = Scalar::from_bytes_wide(&rcv_bytes);

        let mut alpha_bytes = [0u8; 64];
        OsRng.fill_bytes(&mut alpha_bytes);
        let alpha = Scalar::from_bytes_wide(&alpha_bytes);

        let ask = *spender_key.spend_authorizing_key();
        let rk_scalar = ask.add(&alpha);
        let rk = SPENDING_KEY_GENERATOR.mul(&rk_scalar);
        let cv = value_commit(self.note.value(), &rcv);
        let nullifier = self.note.nullifier(spender_key.nullifier_deriving_key(), self.witness.position)?;

        let proof = prover.prove_spend(SpendProofInputs {
            value: self.note.value(),
            value_commitment_randomness: rcv,
            note_commitment_randomness: self.note.rcm(),
            ak: *spender_key.authorizing_key(),
            nsk: *spender_key.proof_authorizing_key(),
            diversifier: *self.note.diversifier(),
            auth_path: self.witness.auth_path.clone(),
            anchor: self.witness.anchor,
            alpha,
            value_commitment: cv,
            randomized_public_key: rk,
        })?;

        Ok(UnsignedSpendDescription {
            cv,
            anchor: self.witness.anchor,
            nullifier,
            rk,
            proof,
            rcv,
            ask,
            alpha,
        })
    }
}

/// A spend description with everything but the authorization signature,
/// which can only be computed once the sighash (covering this description)
/// is known.
pub struct UnsignedSpendDescription {
    pub cv: Point,
    pub anchor: [u8; 32],
    pub nullifier: Nullifier,
    pub rk: Point,
    pub proof: [u8; PROOF_LENGTH],
    pub rcv: Scalar,
    ask: Scalar,
    alpha: Scalar,
}

impl UnsignedSpendDescription {
    /// Serializes everything but the signature, for hashing into the
    /// sighash.
    pub fn serialize_unsigned(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SPEND_DESCRIPTION_LENGTH - SIGNATURE_LENGTH);
        out.extend_from_slice(&self.cv.compress());
        out.extend_from_slice(&self.anchor);
        out.extend_from_slice(&self.nullifier);
        out.extend_from_slice(&self.rk.compress());
        out.extend_from_slice(&self.proof);
        out
    }

    pub fn sign(&self, sighash: &[u8; 32]) -> SpendDescription {
        let sk = self.ask.add(&self.alpha);
        let spend_auth_sig = signature::sign(&SPENDING_KEY_GENERATOR, &sk, &self.rk, sighash);
        SpendDescription {
            cv: self.cv,
            anchor: self.anchor,
            nullifier: self.nullifier,
            rk: self.rk,
            proof: self.proof,
            spend_auth_sig,
        }
    }
}

/// Fully signed spend description, ready for serialization.
pub struct SpendDescription {
    pub cv: Point,
    pub anchor: [u8; 32],
    pub nullifier: Nullifier,
    pub rk: Point,
    pub proof: [u8; PROOF_LENGTH],
    pub spend_auth_sig: Signature,
}

impl SpendDescription {
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<(), IronfishError> {
        writer.write_all(&self.cv.compress())?;
        writer.write_all(&self.anchor)?;
        writer.write_all(&self.nullifier)?;
        writer.write_all(&self.rk.compress())?;
        writer.write_all(&self.proof)?;
        writer.write_all(&self.spend_auth_sig.to_bytes())?;
        Ok(())
    }

    pub fn read<R: std::io::Read>(mut reader: R) -> Result<Self, IronfishError> {
        let mut cv_bytes = [0u8; 32];
        reader.read_exact(&mut cv_bytes)?;
        let mut anchor = [0u8; 32];
        reader.read_exact(&mut anchor)?;
        let mut nullifier = [0u8; 32];
        reader.read_exact(&mut nullifier)?;
        let mut rk_bytes = [0u8; 32];
        reader.read_exact(&mut rk_bytes)?;
        let mut proof = [0u8; PROOF_LENGTH];
        reader.read_exact(&mut proof)?;
        let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
        reader.read_exact(&mut sig_bytes)?;

        Ok(SpendDescription {
            cv: Point::decompress_checked(&cv_bytes)?,
            anchor,
            nullifier,
            rk: Point::decompress_checked(&rk_bytes)?,
            proof,
            spend_auth_sig: Signature::from_bytes(&sig_bytes)?,
        })
    }

    pub fn verify_signature(&self, sighash: &[u8; 32]) -> Result<(), IronfishError> {
        signature::verify(&SPENDING_KEY_GENERATOR, &self.rk, sighash, &self.spend_auth_sig)
    }
}

