/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Tunables for the scanner and tree, pulled out of the constants module so
//! an embedder can override them without forking the crate.

use crate::constants::{DEFAULT_CHECKPOINT_INTERVAL, TREE_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncConfig {
    /// How many blocks the scanner processes between checkpoints (see
    /// `scanner::Synchronizer::checkpoint`).
    pub checkpoint_interval: u64,
    /// Confirmations required before a note is considered spendable rather
    /// than merely observed.
    pub min_confirmations: u32,
    /// Depth of the note commitment tree.
    pub tree_depth: u8,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            min_confirmations: 3,
            tree_depth: TREE_DEPTH as u8,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = SyncConfig::default();
        assert_eq!(config.checkpoint_interval, DEFAULT_CHECKPOINT_INTERVAL);
        assert_eq!(config.tree_depth, TREE_DEPTH as u8);
    }
}
