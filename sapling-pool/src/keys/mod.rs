/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

pub mod public_address;
pub mod sapling_key;
pub mod view_keys;

pub use public_address::PublicAddress;
pub use sapling_key::SaplingKey;
pub use view_keys::{IncomingViewKey, OutgoingViewKey, ViewKey};
