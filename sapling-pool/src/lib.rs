/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

#![warn(clippy::dbg_macro)]
#![warn(clippy::print_stderr)]
#![warn(clippy::print_stdout)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_macro_rules)]
#![warn(unused_qualifications)]

pub mod arith;
pub mod bech32;
pub mod cache;
pub mod config;
pub mod constants;
pub mod encryption;
pub mod error;
pub mod field;
pub mod group;
pub mod keys;
pub mod merkle_tree;
pub mod note;
pub mod primitives;
pub mod prover;
pub mod scalar;
pub mod scanner;
pub mod selector;
pub mod store;
pub mod transaction;

#[cfg(any(test, feature = "test-util"))]
pub mod test_util;

pub use cache::{CacheEntry, NoteCache};
pub use config::SyncConfig;
pub use error::{IronfishError, IronfishErrorKind};
pub use group::Point;
pub use keys::{IncomingViewKey, OutgoingViewKey, PublicAddress, SaplingKey, ViewKey};
pub use merkle_tree::{MerkleTree, MerkleWitness};
pub use note::{Memo, Note};
pub use prover::Prover;
pub use scalar::Scalar;
pub use scanner::Synchronizer;
pub use store::{SavePolicy, Store};
pub use transaction::{OutputDescription, ProposedTransaction, SpendDescription, Transaction};
