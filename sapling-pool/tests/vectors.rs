/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Golden scenarios exercised end to end through the public API, as opposed
//! to the in-module unit tests that check individual building blocks.

use sapling_pool::cache::{CacheEntry, NoteCache};
use sapling_pool::constants::diversify;
use sapling_pool::encryption::{encrypt, trial_decrypt, DecryptFailureCounters};
use sapling_pool::keys::public_address::DIVERSIFIER_LENGTH;
use sapling_pool::keys::sapling_key::SaplingKey;
use sapling_pool::keys::view_keys::IncomingViewKey;
use sapling_pool::merkle_tree::MerkleWitness;
use sapling_pool::note::{Note, MEMO_LENGTH};
use sapling_pool::primitives::commitment::value_commit;
use sapling_pool::scalar::Scalar;
use sapling_pool::selector::select;
use sapling_pool::transaction::{read_compact_size, write_compact_size};

/// S2: the two sides of the note-encryption ECDH agreement must land on the
/// same point regardless of which secret multiplies which public key.
#[test]
fn ecdh_agreement_commutes() {
    let ivk = Scalar::from_bytes_reduce(&[0x2a; 32]);
    let esk = Scalar::from_bytes_reduce(&[0x11; 32]);
    let diversifier = [0x01u8; DIVERSIFIER_LENGTH];

    let g_d = diversify(&diversifier).unwrap();
    let pk_d = g_d.mul(&ivk);
    let epk = g_d.mul(&esk);

    let left = epk.mul(&ivk);
    let right = pk_d.mul(&esk);
    assert_eq!(left.compress(), right.compress());
}

/// S3/S4: a note encrypted for one incoming viewing key round-trips under
/// it, and is rejected (rather than mis-decrypted) under an unrelated key.
#[test]
fn note_roundtrips_under_its_own_ivk_and_rejects_a_foreign_one() {
    let owner = SaplingKey::generate_key();
    let address = owner
        .incoming_view_key()
        .public_address([0x01; DIVERSIFIER_LENGTH])
        .unwrap();
    let (note, memo) = Note::new(&address, 1_000_000, [0x42u8; MEMO_LENGTH]).unwrap();
    let cv = value_commit(note.value(), &Scalar::from_bytes_wide(&[0x03; 64])).compress();
    let encrypted = encrypt(&note, &memo, owner.outgoing_viewing_key(), &cv).unwrap();
    let cmu = note.commitment().unwrap();

    let mut counters = DecryptFailureCounters::default();
    let (recovered, recovered_memo) = trial_decrypt(
        owner.incoming_view_key(),
        &encrypted.epk,
        &encrypted.enc_ciphertext,
        &cmu,
        &mut counters,
    )
    .unwrap()
    .expect("the owner's ivk must recover the note");
    assert_eq!(recovered.value(), 1_000_000);
    assert_eq!(recovered.diversifier(), note.diversifier());
    assert_eq!(recovered.rseed(), note.rseed());
    assert_eq!(recovered_memo, memo);

    let foreign_ivk = IncomingViewKey {
        view_key: Scalar::from_bytes_reduce(&[0x99; 32]),
    };
    let mut foreign_counters = DecryptFailureCounters::default();
    let result = trial_decrypt(
        &foreign_ivk,
        &encrypted.epk,
        &encrypted.enc_ciphertext,
        &cmu,
        &mut foreign_counters,
    )
    .unwrap();
    assert!(result.is_none());
    assert_eq!(
        foreign_counters.auth_tag_invalid + foreign_counters.commitment_mismatch,
        1
    );
    assert_eq!(foreign_counters.malformed_plaintext, 0);
    assert_eq!(foreign_counters.invalid_point, 0);
}

fn spendable_entry(key: &SaplingKey, value: u64) -> CacheEntry {
    let address = key
        .incoming_view_key()
        .public_address([0x01; DIVERSIFIER_LENGTH])
        .unwrap();
    let (note, _memo) = Note::new(&address, value, [0u8; MEMO_LENGTH]).unwrap();
    let cmu = note.commitment().unwrap();
    CacheEntry {
        note,
        cmu,
        address,
        block_height: 1,
        tx_index: 0,
        output_index: 0,
        is_outgoing: false,
        spent: false,
        nullifier: None,
        witness: Some(MerkleWitness {
            auth_path: vec![[0u8; 32]; 4],
            position: 0,
            anchor: [0u8; 32],
        }),
    }
}

/// S5: greedy descending selection over {500, 300, 200}.
#[test]
fn selector_greedy_matches_scenario() {
    let key = SaplingKey::generate_key();
    let mut cache = NoteCache::new();
    cache.update_tree_state(100);
    let mut address = None;
    for value in [500, 300, 200] {
        let entry = spendable_entry(&key, value);
        address = Some(entry.address);
        cache.add_note(entry);
    }
    let address = address.unwrap();

    let picked_400 = select(&cache, &address, 400, 1, &[]).unwrap();
    assert_eq!(picked_400.notes.len(), 1);
    assert_eq!(picked_400.notes[0].note.value(), 500);

    let picked_700 = select(&cache, &address, 700, 1, &[]).unwrap();
    let mut values: Vec<u64> = picked_700.notes.iter().map(|e| e.note.value()).collect();
    values.sort_unstable();
    assert_eq!(values, vec![300, 500]);

    let err = select(&cache, &address, 1_100, 1, &[]).unwrap_err();
    assert_eq!(
        err.kind,
        sapling_pool::error::IronfishErrorKind::InsufficientFunds
    );
}

/// S6: reverting to height 150 keeps notes at 100/150 and drops the one at
/// 200.
#[test]
fn reorg_drops_only_notes_above_the_fork_height() {
    let key = SaplingKey::generate_key();
    let mut cache = NoteCache::new();

    let mut entry_100 = spendable_entry(&key, 10);
    entry_100.block_height = 100;
    let mut entry_150 = spendable_entry(&key, 20);
    entry_150.block_height = 150;
    let mut entry_200 = spendable_entry(&key, 30);
    entry_200.block_height = 200;

    let address = entry_100.address;
    let cmu_100 = entry_100.cmu;
    let cmu_150 = entry_150.cmu;
    let cmu_200 = entry_200.cmu;

    cache.add_note(entry_100);
    cache.add_note(entry_150);
    cache.add_note(entry_200);
    cache.update_tree_state(200);
    cache.update_synced_height(&address, 200);

    cache.revert_to_height(150);

    assert!(cache.get(&cmu_100).is_some());
    assert!(cache.get(&cmu_150).is_some());
    assert!(cache.get(&cmu_200).is_none());
    assert_eq!(cache.synced_height(&address), Some(150));
}

/// Known-answer vectors for the compact-size varint boundaries, cross-checked
/// against their hex encoding.
#[test]
fn compact_size_boundary_vectors() {
    let cases: &[(u64, &str)] = &[
        (0, "00"),
        (252, "fc"),
        (253, "fd fd00"),
        (65535, "fd ffff"),
        (65536, "fe 00000100"),
        (4_294_967_296, "ff 0000000001000000"),
    ];
    for (value, expected_hex) in cases {
        let mut bytes = Vec::new();
        write_compact_size(&mut bytes, *value).unwrap();
        let expected: Vec<u8> = hex::decode(expected_hex.replace(' ', "")).unwrap();
        assert_eq!(bytes, expected, "value {value}");
        assert_eq!(read_compact_size(&bytes[..]).unwrap(), *value);
    }
}

proptest::proptest! {
    /// Every `u64` round-trips through the compact-size encoding.
    #[test]
    fn compact_size_roundtrips(value: u64) {
        let mut bytes = Vec::new();
        write_compact_size(&mut bytes, value).unwrap();
        let parsed = read_compact_size(&bytes[..]).unwrap();
        proptest::prop_assert_eq!(parsed, value);
    }
}
