//! # Generic In-Memory Entity Store
//!
//! A keyed collection with identity assignment, instantiated once per record
//! type. Two key strategies are supported through [`StoreKey`]:
//!
//! - **Sequenced** (`i64`): the store ignores the caller's key and assigns
//!   the next value above the high-water mark. Deleted keys are never reused.
//! - **Supplied** (`String`): the caller's key is used as-is and a duplicate
//!   is rejected with [`StoreError::AlreadyExists`].
//!
//! All operations are synchronous. The lock is `parking_lot`, not
//! `tokio::sync`, because it is never held across an `.await` point, and it
//! does not poison when a holder panics.

use std::collections::HashMap;
use std::fmt::{Debug, Display};
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;

/// Key type of an [`EntityStore`].
pub trait StoreKey: Clone + Eq + Hash + Ord + Display + Debug + Send + Sync + 'static {
    /// Key for a newly added record, given the highest key issued so far.
    ///
    /// `None` means keys are supplied by the caller.
    fn generate(high_water: Option<&Self>) -> Option<Self>;
}

impl StoreKey for i64 {
    fn generate(high_water: Option<&Self>) -> Option<Self> {
        Some(high_water.map_or(0, |last| last + 1))
    }
}

impl StoreKey for String {
    fn generate(_high_water: Option<&Self>) -> Option<Self> {
        None
    }
}

/// A record that can live in an [`EntityStore`].
pub trait Entity: Clone + Debug + Send + Sync + 'static {
    /// Identity type.
    type Key: StoreKey;

    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    /// The record's identity.
    fn key(&self) -> &Self::Key;

    /// The same record carrying a different identity.
    fn with_key(self, key: Self::Key) -> Self;
}

#[derive(Debug)]
struct Inner<V: Entity> {
    records: HashMap<V::Key, V>,
    /// Highest key ever stored. Survives deletion.
    high_water: Option<V::Key>,
}

impl<V: Entity> Inner<V> {
    fn observe(&mut self, key: &V::Key) {
        if self.high_water.as_ref().map_or(true, |hw| key > hw) {
            self.high_water = Some(key.clone());
        }
    }
}

/// Thread-safe, cloneable in-memory entity store.
///
/// Clones share the same data. Every operation takes the lock exactly once,
/// so each one is atomic with respect to concurrent callers.
#[derive(Debug)]
pub struct EntityStore<V: Entity> {
    inner: Arc<RwLock<Inner<V>>>,
}

impl<V: Entity> Clone for EntityStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V: Entity> Default for EntityStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Entity> EntityStore<V> {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                records: HashMap::new(),
                high_water: None,
            })),
        }
    }

    /// Create a store holding `records` under their own keys.
    ///
    /// Seed keys count towards the high-water mark, so generated keys
    /// continue above the largest seeded one. A later duplicate key
    /// replaces an earlier one.
    pub fn seeded(records: impl IntoIterator<Item = V>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.write();
            for record in records {
                let key = record.key().clone();
                inner.observe(&key);
                inner.records.insert(key, record);
            }
        }
        store
    }

    /// All current records, in no particular order.
    pub fn list(&self) -> Vec<V> {
        self.inner.read().records.values().cloned().collect()
    }

    /// All records matching `predicate`, in no particular order.
    pub fn find_all(&self, predicate: impl Fn(&V) -> bool) -> Vec<V> {
        self.inner
            .read()
            .records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Retrieve a record by key.
    pub fn get(&self, key: &V::Key) -> Result<V, StoreError> {
        self.inner
            .read()
            .records
            .get(key)
            .cloned()
            .ok_or_else(|| not_found::<V>(key))
    }

    /// Store a new record and return it as stored.
    ///
    /// For sequenced keys the caller's key is replaced by the next one
    /// above the high-water mark. For supplied keys an existing record
    /// under the same key fails the call and leaves the store unchanged.
    pub fn add(&self, record: V) -> Result<V, StoreError> {
        let mut inner = self.inner.write();
        let record = match V::Key::generate(inner.high_water.as_ref()) {
            Some(key) => record.with_key(key),
            None => {
                if inner.records.contains_key(record.key()) {
                    return Err(StoreError::AlreadyExists {
                        kind: V::KIND,
                        key: record.key().to_string(),
                    });
                }
                record
            }
        };
        let key = record.key().clone();
        inner.observe(&key);
        inner.records.insert(key, record.clone());
        tracing::debug!(kind = V::KIND, key = %record.key(), "record added");
        Ok(record)
    }

    /// Replace the record stored under `record`'s key.
    ///
    /// Full replacement, no field-level merge. Fails without touching the
    /// store when the key is absent.
    pub fn update(&self, record: V) -> Result<V, StoreError> {
        let mut inner = self.inner.write();
        match inner.records.get_mut(record.key()) {
            Some(slot) => {
                *slot = record.clone();
                Ok(record)
            }
            None => Err(not_found::<V>(record.key())),
        }
    }

    /// Edit the record stored under `key` in place and return the result.
    ///
    /// `edit` runs under the write lock, so it sees and replaces the current
    /// record with no interleaved writer. The key is restored afterwards.
    pub fn modify(&self, key: &V::Key, edit: impl FnOnce(&mut V)) -> Result<V, StoreError> {
        let mut inner = self.inner.write();
        let slot = inner.records.get_mut(key).ok_or_else(|| not_found::<V>(key))?;
        let mut record = slot.clone();
        edit(&mut record);
        let record = record.with_key(key.clone());
        *slot = record.clone();
        tracing::debug!(kind = V::KIND, key = %key, "record modified");
        Ok(record)
    }

    /// Remove the record stored under `key`.
    pub fn delete(&self, key: &V::Key) -> Result<(), StoreError> {
        match self.inner.write().records.remove(key) {
            Some(_) => {
                tracing::debug!(kind = V::KIND, key = %key, "record deleted");
                Ok(())
            }
            None => Err(not_found::<V>(key)),
        }
    }

    /// Check if a record exists.
    pub fn contains(&self, key: &V::Key) -> bool {
        self.inner.read().records.contains_key(key)
    }

    /// Return the number of records.
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn not_found<V: Entity>(key: &V::Key) -> StoreError {
    StoreError::NotFound {
        kind: V::KIND,
        key: key.to_string(),
    }
}
