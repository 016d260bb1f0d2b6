/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Output descriptions: one per note being created.

use rand::rngs::OsRng;
use rand::RngCore;

use crate::encryption::{encrypt_with_esk, ENC_CIPHERTEXT_LENGTH, OUT_CIPHERTEXT_LENGTH};
use crate::error::IronfishError;
use crate::group::Point;
use crate::note::{Memo, Note};
use crate::primitives::commitment::value_commit;
use crate::prover::{OutputProofInputs, Prover, PROOF_LENGTH};
use crate::scalar::Scalar;

pub const OUTPUT_DESCRIPTION_LENGTH: usize =
    32 + 32 + 32 + ENC_CIPHERTEXT_LENGTH + OUT_CIPHERTEXT_LENGTH + PROOF_LENGTH;

/// A note queued to be created, with the memo and the sender's outgoing
/// viewing key for the recall ciphertext.
pub struct OutputBuilder {
    note: Note,
    memo: Memo,
    ovk: [u8; 32],
}

impl OutputBuilder {
    pub fn new(note: Note, memo: Memo, ovk: [u8; 32]) -> Self {
        OutputBuilder { note, memo, ovk }
    }

    pub fn value(&self) -> u64 {
        self.note.value()
    }

    /// Draws `rcv`, computes `cv` and `cmu`, encrypts the note, and calls
    /// the prover.
    pub fn build(&self, prover: &dyn Prover) -> Result<OutputDescription, IronfishError> {
        let mut rcv_bytes = [0u8; 64];
        OsRng.fill_bytes(&mut rcv_bytes);
        let rcv = Scalar::from_bytes_wide(&rcv_bytes);

        let mut esk_bytes = [0u8; 64];
        OsRng.fill_bytes(&mut esk_bytes);
        let esk = Scalar::from_bytes_wide(&esk_bytes);

        let cv = value_commit(self.note.value(), &rcv);
        let cv_bytes = cv.compress();
        let cmu = self.note.commitment()?;
        let encrypted = encrypt_with_esk(&self.note, &self.memo, &self.ovk, &cv_bytes, esk)?;

        let proof = prover.prove_output(OutputProofInputs {
            value: self.note.value(),
            value_commitment_randomness: rcv,
            note_commitment_randomness: self.note.rcm(),
            diversifier: *self.note.diversifier(),
            pk_d: *self.note.pk_d(),
            esk,
            value_commitment: cv,
            note_commitment: cmu,
        })?;

        Ok(OutputDescription {
            cv,
            cmu,
            epk: encrypted.epk,
            enc_ciphertext: encrypted.enc_ciphertext,
            out_ciphertext: encrypted.out_ciphertext,
            proof,
            rcv: Some(rcv),
        })
    }
}

pub struct OutputDescription {
    pub cv: Point,
    pub cmu: [u8; 32],
    pub epk: Point,
    pub enc_ciphertext: Vec<u8>,
    pub out_ciphertext: Vec<u8>,
    pub proof: [u8; PROOF_LENGTH],
    /// The value-commitment randomness, retained only on a freshly built
    /// description (not on one read back off the wire) so the builder can
    /// fold it into the binding-signature secret.
    pub rcv: Option<Scalar>,
}

impl OutputDescription {
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<(), IronfishError> {
        writer.write_all(&self.cv.compress())?;
        writer.write_all(&self.cmu)?;
        writer.write_all(&self.epk.compress())?;
        writer.write_all(&self.enc_ciphertext)?;
        writer.write_all(&self.out_ciphertext)?;
        writer.write_all(&self.proof)?;
        Ok(())
    }

    pub fn read<R: std::io::Read>(mut reader: R) -> Result<Self, IronfishError> {
        let mut cv_bytes = [0u8; 32];
        reader.read_exact(&mut cv_bytes)?;
        let mut cmu = [0u8; 32];
        reader.read_exact(&mut cmu)?;
        let mut epk_bytes = [0u8; 32];
        reader.read_exact(&mut epk_bytes)?;
        let mut enc_ciphertext = vec![0u8; ENC_CIPHERTEXT_LENGTH];
        reader.read_exact(&mut enc_ciphertext)?;
        let mut out_ciphertext = vec![0u8; OUT_CIPHERTEXT_LENGTH];
        reader.read_exact(&mut out_ciphertext)?;
        let mut proof = [0u8; PROOF_LENGTH];
        reader.read_exact(&mut proof)?;

        Ok(OutputDescription {
            cv: Point::decompress_checked(&cv_bytes)?,
            cmu,
            epk: Point::decompress_checked(&epk_bytes)?,
            enc_ciphertext,
            out_ciphertext,
            proof,
            rcv: None,
        })
    }
}
