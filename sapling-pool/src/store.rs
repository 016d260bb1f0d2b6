/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The persistence backend: a narrow opaque key/value interface, plus a
//! debounced, serialized save policy that sits in front of it.
//!
//! The core never talks to a `Store` directly on every mutation — it calls
//! `SavePolicy::mark_dirty()` and leaves the decision of *when* to actually
//! flush to whatever timer or event loop the embedder runs. This keeps disk
//! I/O off the hot path (decrypting a block of notes) without requiring the
//! core to know anything about async runtimes.

use std::time::{Duration, Instant};

use crate::error::{IronfishError, IronfishErrorKind};

/// Keys the core writes under. Values are opaque to the store; the core
/// decides their encoding.
pub const NOTE_CACHE_STATE_KEY: &str = "notecache.state";

pub fn tree_state_key(address_id: &str) -> String {
    format!("tree.{}", address_id)
}

/// Narrow key/value persistence interface. Implementations are free to back
/// this with a file, a database, or nothing at all — the core only ever
/// calls these four methods.
pub trait Store {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IronfishError>;
    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), IronfishError>;
    fn delete(&mut self, key: &str) -> Result<(), IronfishError>;
    fn clear(&mut self) -> Result<(), IronfishError>;
}

/// Debounces writes to a [`Store`]: the core calls `mark_dirty` after every
/// mutation, and whatever driver owns the `SavePolicy` decides when to call
/// `maybe_flush`. At most one flush is ever "in flight" from the core's
/// point of view — `maybe_flush`/`force_flush` just run the write
/// synchronously and record that it happened, since this crate has no
/// opinion on the embedder's async runtime.
pub struct SavePolicy {
    interval: Duration,
    dirty: bool,
    last_flush: Option<Instant>,
}

impl SavePolicy {
    pub fn new(interval: Duration) -> Self {
        SavePolicy {
            interval,
            dirty: false,
            last_flush: None,
        }
    }

    /// ~1s debounce, per the specification.
    pub fn with_default_interval() -> Self {
        Self::new(Duration::from_secs(1))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Called by the core after every mutation. Does not write anything by
    /// itself.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Flushes `write` through `store` if dirty and the debounce interval has
    /// elapsed since the last flush. Returns whether a flush happened.
    pub fn maybe_flush<S: Store>(
        &mut self,
        now: Instant,
        store: &mut S,
        write: impl FnOnce(&mut S) -> Result<(), IronfishError>,
    ) -> Result<bool, IronfishError> {
        if !self.dirty {
            return Ok(false);
        }
        let due = match self.last_flush {
            Some(last) => now.duration_since(last) >= self.interval,
            None => true,
        };
        if !due {
            return Ok(false);
        }
        self.force_flush(store, write)?;
        Ok(true)
    }

    /// Writes through `store` unconditionally if dirty, regardless of the
    /// debounce interval. Used when the embedder needs an up-to-date
    /// snapshot on disk immediately (e.g. shutdown).
    pub fn force_flush<S: Store>(
        &mut self,
        store: &mut S,
        write: impl FnOnce(&mut S) -> Result<(), IronfishError>,
    ) -> Result<(), IronfishError> {
        if !self.dirty {
            return Ok(());
        }
        write(store).map_err(|e| IronfishError::new_with_source(IronfishErrorKind::PersistenceError, e))?;
        self.dirty = false;
        self.last_flush = Some(Instant::now());
        Ok(())
    }
}

/// In-memory [`Store`], useful for tests and as a reference implementation.
#[derive(Default)]
pub struct MemoryStore {
    entries: std::collections::HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, IronfishError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &[u8]) -> Result<(), IronfishError> {
        self.entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), IronfishError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<(), IronfishError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.put("k", b"v").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
        store.delete("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn save_policy_debounces_until_interval_elapses() {
        let mut store = MemoryStore::new();
        let mut policy = SavePolicy::new(Duration::from_millis(0));
        let mut writes = 0;

        // Not dirty yet: no flush.
        assert!(!policy.maybe_flush(Instant::now(), &mut store, |_| {
            writes += 1;
            Ok(())
        })
        .unwrap());
        assert_eq!(writes, 0);

        policy.mark_dirty();
        assert!(policy.is_dirty());
        let flushed = policy
            .maybe_flush(Instant::now(), &mut store, |s| s.put("k", b"v"))
            .unwrap();
        assert!(flushed);
        assert!(!policy.is_dirty());
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn force_flush_writes_even_if_not_due() {
        let mut store = MemoryStore::new();
        let mut policy = SavePolicy::new(Duration::from_secs(3600));
        policy.mark_dirty();
        // Interval hasn't elapsed, but force_flush doesn't care.
        policy.force_flush(&mut store, |s| s.put("k", b"v")).unwrap();
        assert!(!policy.is_dirty());
        assert_eq!(store.get("k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn force_flush_is_a_no_op_when_clean() {
        let mut store = MemoryStore::new();
        let mut policy = SavePolicy::new(Duration::from_secs(1));
        policy
            .force_flush(&mut store, |_| {
                panic!("must not write when not dirty")
            })
            .unwrap();
    }
}
