//! TTL cache of resolved metadata, keyed by canonical ISBN-13

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use isbn_identifiers::Identifier;
use tokio::time::Instant;

use crate::record::MetadataRecord;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Arc<MetadataRecord>,
    inserted_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) < self.ttl
    }
}

/// Entries are replaced whole; a reader sees either the old record or the new
/// one. Expired entries are dropped lazily on read and by [`purge_expired`].
///
/// [`purge_expired`]: MetadataCache::purge_expired
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: Mutex<HashMap<Identifier, CacheEntry>>,
    max_entries: Option<usize>,
}

impl MetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `max_entries`, evicting the oldest insert first.
    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: Some(max_entries),
        }
    }

    pub fn get(&self, key: &Identifier) -> Option<Arc<MetadataRecord>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Some(Arc::clone(&entry.value)),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: Identifier, value: MetadataRecord, ttl: Duration) {
        if ttl.is_zero() || self.max_entries == Some(0) {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();

        if let Some(max) = self.max_entries {
            if entries.len() >= max && !entries.contains_key(&key) {
                entries.retain(|_, entry| entry.is_live(now));
                while entries.len() >= max {
                    let oldest = entries
                        .iter()
                        .min_by_key(|(_, entry)| entry.inserted_at)
                        .map(|(k, _)| k.clone());
                    match oldest {
                        Some(k) => entries.remove(&k),
                        None => break,
                    };
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                value: Arc::new(value),
                inserted_at: now,
                ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &Identifier) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of stored entries, expired ones included until purged
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
