//! The expiring string keyspace.
//!
//! Entries expire lazily: nothing sweeps the table in the background, an
//! expired entry is removed the next time it is observed.

use std::collections::HashMap;

use jiff::Timestamp;
use tokio::sync::Mutex;

/// A string value with an optional absolute expiry.
#[derive(Debug, PartialEq, Clone)]
pub struct Value {
    pub data: String,
    pub expiration: Option<Timestamp>,
}

impl Value {
    pub fn new(data: impl Into<String>, expiration: Option<Timestamp>) -> Self {
        Self {
            data: data.into(),
            expiration,
        }
    }

    /// An entry is expired from the instant `now >= expiration`.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        self.expiration
            .is_some_and(|expiration| now >= expiration)
    }
}

/// Process-wide string table shared by every connection.
///
/// One lock covers the table, so a SET and a GET of the same key never
/// observe each other half-done.
#[derive(Debug, Default)]
pub struct KeyValueStore {
    entries: Mutex<HashMap<String, Value>>,
}

impl KeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key`.
    pub async fn set(&self, key: String, value: Value) {
        let mut entries_guard = self.entries.lock().await;
        entries_guard.insert(key, value);
    }

    /// Bulk insert used by the snapshot loader before any client connects.
    pub async fn extend<I>(&self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let mut entries_guard = self.entries.lock().await;
        entries_guard.extend(values);
    }

    /// Returns the live value for `key`, deleting it if it has expired.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut entries_guard = self.entries.lock().await;
        let now = Timestamp::now();

        match entries_guard.get(key) {
            Some(value) if value.is_expired_at(now) => {
                entries_guard.remove(key);
                None
            }
            Some(value) => Some(value.data.clone()),
            None => None,
        }
    }

    /// Whether `key` holds a live value. Expired entries are removed.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    /// Lists every live key in sorted order, purging expired entries first.
    pub async fn keys(&self) -> Vec<String> {
        let mut entries_guard = self.entries.lock().await;
        let now = Timestamp::now();

        entries_guard.retain(|_, value| !value.is_expired_at(now));

        let mut keys = entries_guard.keys().cloned().collect::<Vec<String>>();
        keys.sort();
        keys
    }

    /// Number of physically stored entries, expired or not.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
