use crate::error::{KvStoreError, Result};
use crate::metrics::{Counters, Metrics};
use crate::network::Record;
use crate::KvsEngine;
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// KvStore stores values by their key, in memory.
///
/// Clones share the same underlying map. Every operation, single or bulk,
/// takes the lock exactly once, so a concurrent reader sees either all of a
/// write or none of it.
///
/// # Example
///
/// ``` rust
/// use kvd::{KvStore, KvsEngine, Record};
///
/// let store = KvStore::new();
///
/// store.set("key1".to_owned(), "value1".to_owned()).unwrap();
/// store.bulk_set(vec![Record::new("key2", "value2")]).unwrap();
///
/// assert_eq!(store.get("key1").unwrap(), "value1");
/// assert_eq!(store.get("key2").unwrap(), "value2");
/// assert_eq!(store.metrics().unwrap().keys_stored, 2);
/// ```
#[derive(Clone, Default)]
pub struct KvStore {
    inner: Arc<RwLock<Inner>>,
}

#[derive(Default)]
struct Inner {
    map: HashMap<String, String>,
    counters: Counters,
}

impl KvStore {
    /// Create a new, empty store.
    pub fn new() -> KvStore {
        KvStore::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| KvStoreError::PoisonedLock)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| KvStoreError::PoisonedLock)
    }
}

impl KvsEngine for KvStore {
    fn get(&self, key: &str) -> Result<String> {
        let inner = self.read()?;

        // Counted whether or not the key is there.
        inner.counters.record_gets(1);

        if key.is_empty() {
            return Err(KvStoreError::EmptyKey);
        }

        inner
            .map
            .get(key)
            .cloned()
            .ok_or(KvStoreError::KeyNotFound)
    }

    fn set(&self, key: String, value: String) -> Result<()> {
        if key.is_empty() {
            return Err(KvStoreError::EmptyKey);
        }

        let mut inner = self.write()?;
        let Inner { map, counters } = &mut *inner;

        let len = value.len();
        let old = map.insert(key, value);
        counters.record_set(old.as_deref(), len);

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<String> {
        if key.is_empty() {
            return Err(KvStoreError::EmptyKey);
        }

        let mut inner = self.write()?;
        let Inner { map, counters } = &mut *inner;

        let removed = map.remove(key).ok_or(KvStoreError::KeyNotFound)?;
        counters.record_removal(&removed);
        counters.record_dels(1);

        Ok(removed)
    }

    fn bulk_set(&self, records: Vec<Record>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        // Reject the whole batch before touching the map.
        if records.iter().any(|r| r.key.is_empty()) {
            return Err(KvStoreError::EmptyKey);
        }

        let mut inner = self.write()?;
        let Inner { map, counters } = &mut *inner;

        let n = records.len();
        for Record { key, value } in records {
            let len = value.len();
            let old = map.insert(key, value);
            counters.record_set(old.as_deref(), len);
        }
        debug!("bulk set applied {} records", n);

        Ok(())
    }

    fn bulk_get(&self, keys: &[String]) -> Result<Vec<Record>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let inner = self.read()?;

        let records = keys
            .iter()
            .map(|key| {
                if key.is_empty() {
                    return Err(KvStoreError::EmptyKey);
                }
                inner
                    .map
                    .get(key)
                    .map(|value| Record::new(key.as_str(), value.as_str()))
                    .ok_or(KvStoreError::KeyNotFound)
            })
            .collect::<Result<Vec<_>>>()?;

        inner.counters.record_gets(keys.len());

        Ok(records)
    }

    fn bulk_remove(&self, keys: &[String]) -> Result<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let mut inner = self.write()?;
        let Inner { map, counters } = &mut *inner;

        for key in keys {
            if key.is_empty() {
                return Err(KvStoreError::EmptyKey);
            }
            if !map.contains_key(key) {
                return Err(KvStoreError::KeyNotFound);
            }
        }

        // A key listed twice is only removed, and accounted for, once.
        for key in keys {
            if let Some(removed) = map.remove(key) {
                counters.record_removal(&removed);
            }
        }
        counters.record_dels(keys.len());
        debug!("bulk remove applied {} keys", keys.len());

        Ok(())
    }

    fn metrics(&self) -> Result<Metrics> {
        Ok(self.read()?.counters.snapshot())
    }
}
