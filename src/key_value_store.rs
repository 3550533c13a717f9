use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;

/// Storage backend behind the command handlers.
///
/// Each call is atomic on its own; callers never hold a lock across calls.
/// Strings and hashes live in separate namespaces, so `SET k` and `HSET k`
/// do not collide.
pub trait KeyValueStore: Send + Sync + 'static {
    fn get(&self, key: &[u8]) -> Option<Bytes>;
    fn set(&self, key: Bytes, value: Bytes);
    /// Writes every field/value pair in order and returns how many pairs were
    /// written. A field repeated within one call keeps its last value.
    fn hset(&self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> usize;
    fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes>;
    /// All field/value pairs of a hash. Missing hashes are empty.
    fn hgetall(&self, key: &[u8]) -> Vec<(Bytes, Bytes)>;
    /// Drops every key, used before loading a full resync snapshot.
    fn clear(&self);
}

#[derive(Debug, Default)]
struct Tables {
    strings: HashMap<Bytes, Bytes>,
    hashes: HashMap<Bytes, HashMap<Bytes, Bytes>>,
}

/// The in-memory store shared by every connection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        let tables = self.tables.lock();
        tables.strings.len() + tables.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Option<Bytes> {
        self.tables.lock().strings.get(key).cloned()
    }

    fn set(&self, key: Bytes, value: Bytes) {
        self.tables.lock().strings.insert(key, value);
    }

    fn hset(&self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> usize {
        let written = pairs.len();
        let mut tables = self.tables.lock();
        tables.hashes.entry(key).or_default().extend(pairs);
        written
    }

    fn hget(&self, key: &[u8], field: &[u8]) -> Option<Bytes> {
        self.tables
            .lock()
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field))
            .cloned()
    }

    fn hgetall(&self, key: &[u8]) -> Vec<(Bytes, Bytes)> {
        self.tables
            .lock()
            .hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn clear(&self) {
        let mut tables = self.tables.lock();
        tables.strings.clear();
        tables.hashes.clear();
    }
}

/// Accepts every call and keeps nothing. Useful for exercising the protocol
/// layer without storage effects.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopStore;

impl KeyValueStore for NopStore {
    fn get(&self, _key: &[u8]) -> Option<Bytes> {
        None
    }

    fn set(&self, _key: Bytes, _value: Bytes) {}

    fn hset(&self, _key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> usize {
        pairs.len()
    }

    fn hget(&self, _key: &[u8], _field: &[u8]) -> Option<Bytes> {
        None
    }

    fn hgetall(&self, _key: &[u8]) -> Vec<(Bytes, Bytes)> {
        Vec::new()
    }

    fn clear(&self) {}
}
