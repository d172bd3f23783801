use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the store's usage counters.
///
/// Serializes to `{"KeysStored": .., "ValueBytesStored": .., "GetOps": ..,
/// "SetOps": .., "DelOps": ..}`.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct Metrics {
    /// Number of keys currently stored.
    pub keys_stored: u64,
    /// Sum of the byte lengths of all stored values.
    pub value_bytes_stored: u64,
    /// Lifetime number of keys read.
    pub get_ops: u64,
    /// Lifetime number of keys written.
    pub set_ops: u64,
    /// Lifetime number of keys deleted.
    pub del_ops: u64,
}

/// Live counters owned by the store and only touched while its lock is held.
///
/// Reads only hold the shared lock, so the read counter is atomic. Everything
/// else is mutated under the exclusive lock together with the map.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    keys_stored: u64,
    value_bytes_stored: u64,
    get_ops: AtomicU64,
    set_ops: u64,
    del_ops: u64,
}

impl Counters {
    pub(crate) fn record_gets(&self, n: usize) {
        self.get_ops.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Account for one written value of `len` bytes, `old` being the value
    /// it replaced.
    pub(crate) fn record_set(&mut self, old: Option<&str>, len: usize) {
        match old {
            Some(old) => {
                self.value_bytes_stored = self.value_bytes_stored - old.len() as u64 + len as u64;
            }
            None => {
                self.keys_stored += 1;
                self.value_bytes_stored += len as u64;
            }
        }
        self.set_ops += 1;
    }

    /// Account for one removed value. Does not touch the op counter, see
    /// `record_dels`.
    pub(crate) fn record_removal(&mut self, removed: &str) {
        self.keys_stored -= 1;
        self.value_bytes_stored -= removed.len() as u64;
    }

    pub(crate) fn record_dels(&mut self, n: usize) {
        self.del_ops += n as u64;
    }

    pub(crate) fn snapshot(&self) -> Metrics {
        Metrics {
            keys_stored: self.keys_stored,
            value_bytes_stored: self.value_bytes_stored,
            get_ops: self.get_ops.load(Ordering::Relaxed),
            set_ops: self.set_ops,
            del_ops: self.del_ops,
        }
    }
}
