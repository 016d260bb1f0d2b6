/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Shielded transaction bundles: builder, wire layout, and sighash.

pub mod builder;
pub mod output;
pub mod spend;

use blake2b_simd::Params;
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::constants::SIGHASH_PERSONALIZATION;
use crate::error::{IronfishError, IronfishErrorKind};
use crate::primitives::signature::{Signature, SIGNATURE_LENGTH};

pub use builder::ProposedTransaction;
pub use output::{OutputDescription, OUTPUT_DESCRIPTION_LENGTH};
pub use spend::{SpendDescription, SPEND_DESCRIPTION_LENGTH};

/// An opaque transparent input, serialized as a length-prefixed blob. The
/// transparent layer's internal layout is outside this crate's scope.
pub struct TransparentInput(pub Vec<u8>);
/// As [`TransparentInput`].
pub struct TransparentOutput(pub Vec<u8>);

pub fn write_compact_size<W: std::io::Write>(mut writer: W, value: u64) -> Result<(), IronfishError> {
    if value < 0xfd {
        writer.write_u8(value as u8)?;
    } else if value <= 0xffff {
        writer.write_u8(0xfd)?;
        writer.write_u16::<LittleEndian>(value as u16)?;
    } else if value <= 0xffff_ffff {
        writer.write_u8(0xfe)?;
        writer.write_u32::<LittleEndian>(value as u32)?;
    } else {
        writer.write_u8(0xff)?;
        writer.write_u64::<LittleEndian>(value)?;
    }
    Ok(())
}

pub fn read_compact_size<R: std::io::Read>(mut reader: R) -> Result<u64, IronfishError> {
    let prefix = reader.read_u8()?;
    Ok(match prefix {
        0xfd => reader.read_u16::<LittleEndian>()? as u64,
        0xfe => reader.read_u32::<LittleEndian>()? as u64,
        0xff => reader.read_u64::<LittleEndian>()?,
        _ => prefix as u64,
    })
}

fn hash_concat(domain: &[u8], items: &[Vec<u8>]) -> [u8; 32] {
    if items.is_empty() {
        return [0u8; 32];
    }
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(domain);
    for item in items {
        hasher.update(item);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// Domain-separated BLAKE2b-256 over the transaction's signable contents.
/// `unsigned_spends` are each spend description's bytes *without* the
/// authorization signature; `outputs` are full output description bytes.
#[allow(clippy::too_many_arguments)]
pub fn compute_sighash(
    version: u32,
    version_group_id: u32,
    transparent_inputs: &[Vec<u8>],
    transparent_outputs: &[Vec<u8>],
    lock_time: u32,
    expiry_height: u32,
    value_balance: i64,
    unsigned_spends: &[Vec<u8>],
    outputs: &[Vec<u8>],
) -> [u8; 32] {
    let mut hasher = Params::new().hash_length(32).to_state();
    hasher.update(SIGHASH_PERSONALIZATION);
    hasher.update(&version.to_le_bytes());
    hasher.update(&version_group_id.to_le_bytes());
    hasher.update(&hash_concat(b"SaplingTin", transparent_inputs));
    hasher.update(&hash_concat(b"SaplingTou", transparent_outputs));
    hasher.update(&lock_time.to_le_bytes());
    hasher.update(&expiry_height.to_le_bytes());
    hasher.update(&value_balance.to_le_bytes());
    hasher.update(&hash_concat(b"SaplingSpe", unsigned_spends));
    hasher.update(&hash_concat(b"SaplingOut", outputs));
    let mut out = [0u8; 32];
    out.copy_from_slice(hasher.finalize().as_bytes());
    out
}

/// A fully assembled, immutable shielded transaction bundle, ready for
/// canonical serialization.
pub struct Transaction {
    pub version: u32,
    pub version_group_id: u32,
    pub transparent_inputs: Vec<TransparentInput>,
    pub transparent_outputs: Vec<TransparentOutput>,
    pub lock_time: u32,
    pub expiry_height: u32,
    pub value_balance: i64,
    pub spends: Vec<SpendDescription>,
    pub outputs: Vec<OutputDescription>,
    pub binding_sig: Signature,
}

impl Transaction {
    pub fn write<W: std::io::Write>(&self, mut writer: W) -> Result<(), IronfishError> {
        writer.write_u32::<LittleEndian>(self.version)?;
        writer.write_u32::<LittleEndian>(self.version_group_id)?;

        write_compact_size(&mut writer, self.transparent_inputs.len() as u64)?;
        for input in &self.transparent_inputs {
            write_compact_size(&mut writer, input.0.len() as u64)?;
            writer.write_all(&input.0)?;
        }

        write_compact_size(&mut writer, self.transparent_outputs.len() as u64)?;
        for output in &self.transparent_outputs {
            write_compact_size(&mut writer, output.0.len() as u64)?;
            writer.write_all(&output.0)?;
        }

        writer.write_u32::<LittleEndian>(self.lock_time)?;
        writer.write_u32::<LittleEndian>(self.expiry_height)?;
        writer.write_i64::<LittleEndian>(self.value_balance)?;

        write_compact_size(&mut writer, self.spends.len() as u64)?;
        for spend in &self.spends {
            spend.write(&mut writer)?;
        }

        write_compact_size(&mut writer, self.outputs.len() as u64)?;
        for output in &self.outputs {
            output.write(&mut writer)?;
        }

        writer.write_all(&self.binding_sig.to_bytes())?;
        Ok(())
    }

    pub fn read<R: std::io::Read>(mut reader: R) -> Result<Self, IronfishError> {
        let version = reader.read_u32::<LittleEndian>()?;
        let version_group_id = reader.read_u32::<LittleEndian>()?;

        let n_tin = read_compact_size(&mut reader)?;
        let mut transparent_inputs = Vec::with_capacity(n_tin as usize);
        for _ in 0..n_tin {
            let len = read_compact_size(&mut reader)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            transparent_inputs.push(TransparentInput(buf));
        }

        let n_tout = read_compact_size(&mut reader)?;
        let mut transparent_outputs = Vec::with_capacity(n_tout as usize);
        for _ in 0..n_tout {
            let len = read_compact_size(&mut reader)? as usize;
            let mut buf = vec![0u8; len];
            reader.read_exact(&mut buf)?;
            transparent_outputs.push(TransparentOutput(buf));
        }

        let lock_time = reader.read_u32::<LittleEndian>()?;
        let expiry_height = reader.read_u32::<LittleEndian>()?;
        let value_balance = reader.read_i64::<LittleEndian>()?;

        let n_spend = read_compact_size(&mut reader)?;
        let mut spends = Vec::with_capacity(n_spend as usize);
        for _ in 0..n_spend {
            spends.push(SpendDescription::read(&mut reader)?);
        }

        let n_out = read_compact_size(&mut reader)?;
        let mut outputs = Vec::with_capacity(n_out as usize);
        for _ in 0..n_out {
            outputs.push(OutputDescription::read(&mut reader)?);
        }

        let mut sig_bytes = [0u8; SIGNATURE_LENGTH];
        reader.read_exact(&mut sig_bytes)?;
        let binding_sig = Signature::from_bytes(&sig_bytes)?;

        Ok(Transaction {
            version,
            version_group_id,
            transparent_inputs,
            transparent_outputs,
            lock_time,
            expiry_height,
            value_balance,
            spends,
            outputs,
            binding_sig,
        })
    }

    /// Recomputes the sighash this transaction was (or should have been)
    /// signed over, from its own serialized contents.
    pub fn sighash(&self) -> Result<[u8; 32], IronfishError> {
        let transparent_inputs: Vec<Vec<u8>> =
            self.transparent_inputs.iter().map(|i| i.0.clone()).collect();
        let transparent_outputs: Vec<Vec<u8>> =
            self.transparent_outputs.iter().map(|o| o.0.clone()).collect();

        let mut unsigned_spends = Vec::with_capacity(self.spends.len());
        for spend in &self.spends {
            let mut buf = Vec::with_capacity(SPEND_DESCRIPTION_LENGTH - SIGNATURE_LENGTH);
            buf.extend_from_slice(&spend.cv.compress());
            buf.extend_from_slice(&spend.anchor);
            buf.extend_from_slice(&spend.nullifier);
            buf.extend_from_slice(&spend.rk.compress());
            buf.extend_from_slice(&spend.proof);
            unsigned_spends.push(buf);
        }

        let mut outputs = Vec::with_capacity(self.outputs.len());
        for output in &self.outputs {
            let mut buf = Vec::with_capacity(OUTPUT_DESCRIPTION_LENGTH);
            output.write(&mut buf)?;
            outputs.push(buf);
        }

        Ok(compute_sighash(
            self.version,
            self.version_group_id,
            &transparent_inputs,
            &transparent_outputs,
            self.lock_time,
            self.expiry_height,
            self.value_balance,
            &unsigned_spends,
            &outputs,
        ))
    }

    /// Verifies every spend-authorization signature and the binding
    /// signature against this transaction's own sighash. Does not verify
    /// the Groth16 proofs themselves (that's the external prover/verifier's
    /// job, out of scope here).
    pub fn verify_signatures(&self) -> Result<(), IronfishError> {
        let sighash = self.sighash()?;
        for spend in &self.spends {
            spend.verify_signature(&sighash)?;
        }

        use crate::constants::{VALUE_COMMITMENT_RANDOMNESS_GENERATOR, VALUE_COMMITMENT_VALUE_GENERATOR};
        use crate::primitives::commitment::value_scalar;
        use crate::primitives::signature;
        use crate::group::Point;

        let mut bvk = Point::identity();
        for spend in &self.spends {
            bvk = bvk.add(&spend.cv);
        }
        for output in &self.outputs {
            bvk = bvk.add(&output.cv.neg());
        }

        let value_balance_scalar = if self.value_balance >= 0 {
            value_scalar(self.value_balance as u64)
        } else {
            value_scalar((-self.value_balance) as u64).neg()
        };
        let bvk_public = bvk.add(&VALUE_COMMITMENT_VALUE_GENERATOR.mul(&value_balance_scalar).neg());

        signature::verify(&VALUE_COMMITMENT_RANDOMNESS_GENERATOR, &bvk_public, &sighash, &self.binding_sig)
            .map_err(|_| IronfishError::new(IronfishErrorKind::InvalidSignature))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::keys::public_address::DIVERSIFIER_LENGTH;
    use crate::merkle_tree::MerkleTree;
    use crate::note::{Note, MEMO_LENGTH};
    use crate::prover::{OutputProofInputs, Prover, SpendProofInputs, PROOF_LENGTH};

    struct FakeProver;

    impl Prover for FakeProver {
        fn prove_spend(&self, _inputs: SpendProofInputs) -> Result<[u8; PROOF_LENGTH], IronfishError> {
            Ok([0x11; PROOF_LENGTH])
        }
        fn prove_output(&self, _inputs: OutputProofInputs) -> Result<[u8; PROOF_LENGTH], IronfishError> {
            Ok([0x22; PROOF_LENGTH])
        }
    }

    #[test]
    fn build_and_verify_roundtrip() {
        let spender_key = SaplingKey::generate_key();
        let spender_address = spender_key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();
        let recipient_key = SaplingKey::generate_key();
        let recipient_address = recipient_key
            .incoming_view_key()
            .public_address([0x02; DIVERSIFIER_LENGTH])
            .unwrap();

        let (note, _memo) = Note::new(&spender_address, 100, [0u8; MEMO_LENGTH]).unwrap();
        let mut tree = MerkleTree::new(8);
        let cmu = note.commitment().unwrap();
        let position = tree.append(cmu).unwrap();
        let witness = tree.witness(position).unwrap();

        let mut builder = ProposedTransaction::new(spender_key, 1, 1, 0, 100);
        builder.add_spend(note, witness);
        builder.add_output(&recipient_address, 60, [0u8; MEMO_LENGTH]).unwrap();

        assert_eq!(builder.value_balance().unwrap(), 40);

        let prover = FakeProver;
        let transaction = builder.build(&prover).unwrap();

        assert_eq!(transaction.value_balance, 40);
        assert_eq!(transaction.spends.len(), 1);
        assert_eq!(transaction.outputs.len(), 1);
        transaction.verify_signatures().unwrap();
    }

    #[test]
    fn wire_roundtrip_is_identity() {
        let spender_key = SaplingKey::generate_key();
        let spender_address = spender_key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();

        let (note, _memo) = Note::new(&spender_address, 100, [0u8; MEMO_LENGTH]).unwrap();
        let mut tree = MerkleTree::new(8);
        let cmu = note.commitment().unwrap();
        let position = tree.append(cmu).unwrap();
        let witness = tree.witness(position).unwrap();

        let mut builder = ProposedTransaction::new(spender_key, 1, 1, 0, 100);
        builder.add_spend(note, witness);
        builder.add_output(&spender_address, 100, [0u8; MEMO_LENGTH]).unwrap();

        let transaction = builder.build(&FakeProver).unwrap();
        let mut bytes = Vec::new();
        transaction.write(&mut bytes).unwrap();

        let parsed = Transaction::read(&bytes[..]).unwrap();
        let mut reserialized = Vec::new();
        parsed.write(&mut reserialized).unwrap();
        assert_eq!(bytes, reserialized);
        parsed.verify_signatures().unwrap();
    }

    #[test]
    fn tampered_sighash_fails_verification() {
        let spender_key = SaplingKey::generate_key();
        let spender_address = spender_key
            .incoming_view_key()
            .public_address([0x01; DIVERSIFIER_LENGTH])
            .unwrap();

        let (note, _memo) = Note::new(&spender_address, 100, [0u8; MEMO_LENGTH]).unwrap();
        let mut tree = MerkleTree::new(8);
        let cmu = note.commitment().unwrap();
        let position = tree.append(cmu).unwrap();
        let witness = tree.witness(position).unwrap();

        let mut builder = ProposedTransaction::new(spender_key, 1, 1, 0, 100);
        builder.add_spend(note, witness);
        builder.add_output(&spender_address, 100, [0u8; MEMO_LENGTH]).unwrap();

        let mut transaction = builder.build(&FakeProver).unwrap();
        transaction.lock_time = transaction.lock_time.wrapping_add(1);
        assert!(transaction.verify_signatures().is_err());
    }
}
