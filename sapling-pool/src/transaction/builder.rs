/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! `ProposedTransaction`: accumulates spends and outputs, then assembles
//! and signs a complete [`Transaction`].

use crate::constants::{VALUE_COMMITMENT_RANDOMNESS_GENERATOR, VALUE_COMMITMENT_VALUE_GENERATOR};
use crate::error::{IronfishError, IronfishErrorKind};
use crate::group::Point;
use crate::keys::public_address::PublicAddress;
use crate::keys::sapling_key::SaplingKey;
use crate::merkle_tree::MerkleWitness;
use crate::note::{Memo, Note};
use crate::primitives::commitment::value_scalar;
use crate::primitives::signature;
use crate::prover::Prover;
use crate::scalar::Scalar;

use super::output::{OutputBuilder, OutputDescription};
use super::spend::SpendBuilder;
use super::{compute_sighash, Transaction, TransparentInput, TransparentOutput, OUTPUT_DESCRIPTION_LENGTH};

pub struct ProposedTransaction {
    spender_key: SaplingKey,
    version: u32,
    version_group_id: u32,
    lock_time: u32,
    expiry_height: u32,
    spends: Vec<SpendBuilder>,
    outputs: Vec<OutputBuilder>,
    transparent_inputs: Vec<TransparentInput>,
    transparent_outputs: Vec<TransparentOutput>,
}

impl ProposedTransaction {
    pub fn new(
        spender_key: SaplingKey,
        version: u32,
        version_group_id: u32,
        lock_time: u32,
        expiry_height: u32,
    ) -> Self {
        ProposedTransaction {
            spender_key,
            version,
            version_group_id,
            lock_time,
            expiry_height,
            spends: Vec::new(),
            outputs: Vec::new(),
            transparent_inputs: Vec::new(),
            transparent_outputs: Vec::new(),
        }
    }

    pub fn add_spend(&mut self, note: Note, witness: MerkleWitness) {
        self.spends.push(SpendBuilder::new(note, witness));
    }

    pub fn add_output(&mut self, address: &PublicAddress, value: u64, memo: Memo) -> Result<(), IronfishError> {
        let (note, memo) = Note::new(address, value, memo)?;
        self.outputs
            .push(OutputBuilder::new(note, memo, *self.spender_key.outgoing_viewing_key()));
        Ok(())
    }

    pub fn add_transparent_input(&mut self, raw: Vec<u8>) {
        self.transparent_inputs.push(TransparentInput(raw));
    }

    pub fn add_transparent_output(&mut self, raw: Vec<u8>) {
        self.transparent_outputs.push(TransparentOutput(raw));
    }

    /// Sum of input values minus sum of output values.
    pub fn value_balance(&self) -> Result<i64, IronfishError> {
        let spent: u64 = self.spends.iter().map(SpendBuilder::value).sum();
        let sent: u64 = self.outputs.iter().map(OutputBuilder::value).sum();
        i64::try_from(spent)?
            .checked_sub(i64::try_from(sent)?)
            .ok_or_else(|| IronfishError::new(IronfishErrorKind::InvalidData))
    }

    /// Builds every spend/output proof, signs the spends and the binding
    /// signature, and returns the finished bundle.
    pub fn build(&self, prover: &dyn Prover) -> Result<Transaction, IronfishError> {
        let value_balance = self.value_balance()?;

        let unsigned_spends = self
            .spends
            .iter()
            .map(|s| s.build(&self.spender_key, prover))
            .collect::<Result<Vec<_>, _>>()?;
        let built_outputs = self
            .outputs
            .iter()
            .map(|o| o.build(prover))
            .collect::<Result<Vec<_>, _>>()?;

        let transparent_inputs: Vec<Vec<u8>> =
            self.transparent_inputs.iter().map(|i| i.0.clone()).collect();
        let transparent_outputs: Vec<Vec<u8>> =
            self.transparent_outputs.iter().map(|o| o.0.clone()).collect();

        let unsigned_spend_bytes: Vec<Vec<u8>> =
            unsigned_spends.iter().map(|s| s.serialize_unsigned()).collect();
        let output_bytes: Vec<Vec<u8>> = built_outputs
            .iter()
            .map(|o| {
                let mut buf = Vec::with_capacity(OUTPUT_DESCRIPTION_LENGTH);
                o.write(&mut buf).expect("Vec write cannot fail");
                buf
            })
            .collect();

        let sighash = compute_sighash(
            self.version,
            self.version_group_id,
            &transparent_inputs,
            &transparent_outputs,
            self.lock_time,
            self.expiry_height,
            value_balance,
            &unsigned_spend_bytes,
            &output_bytes,
        );

        let spends = unsigned_spends.iter().map(|s| s.sign(&sighash)).collect::<Vec<_>>();

        let bsk = self.binding_secret(&unsigned_spends, &built_outputs);
        let bvk_public = self.binding_public_key(&spends, &built_outputs, value_balance);
        let binding_sig = signature::sign(&VALUE_COMMITMENT_RANDOMNESS_GENERATOR, &bsk, &bvk_public, &sighash);

        Ok(Transaction {
            version: self.version,
            version_group_id: self.version_group_id,
            transparent_inputs: self
                .transparent_inputs
                .iter()
                .map(|i| TransparentInput(i.0.clone()))
                .collect(),
            transparent_outputs: self
                .transparent_outputs
                .iter()
                .map(|o| TransparentOutput(o.0.clone()))
                .collect(),
            lock_time: self.lock_time,
            expiry_height: self.expiry_height,
            value_balance,
            spends,
            outputs: built_outputs,
            binding_sig,
        })
    }

    fn binding_secret(
        &self,
        unsigned_spends: &[super::spend::UnsignedSpendDescription],
        outputs: &[OutputDescription],
    ) -> Scalar {
        let spend_rcv = unsigned_spends
            .iter()
            .fold(Scalar::zero(), |acc, s| acc.add(&s.rcv));
        let output_rcv = outputs
            .iter()
            .fold(Scalar::zero(), |acc, o| acc.add(&o.rcv.expect("freshly built output carries rcv")));
        spend_rcv.sub(&output_rcv)
    }

    fn binding_public_key(
        &self,
        spends: &[super::spend::SpendDescription],
        outputs: &[OutputDescription],
        value_balance: i64,
    ) -> Point {
        let mut bvk = Point::identity();
        for spend in spends {
            bvk = bvk.add(&spend.cv);
        }
        for output in outputs {
            bvk = bvk.add(&output.cv.neg());
        }
        let value_balance_scalar = if value_balance >= 0 {
            value_scalar(value_balance as u64)
        } else {
            value_scalar((-value_balance) as u64).neg()
        };
        bvk.add(&VALUE_COMMITMENT_VALUE_GENERATOR.mul(&value_balance_scalar).neg())
    }
}
