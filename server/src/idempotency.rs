use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::prelude::*;
use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;

/// A create response kept for replay.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub status: u16,
    pub location: String,
    pub body: Value,
}

#[derive(Clone, Debug)]
struct Entry {
    response: StoredResponse,
    expires_at: DateTime<Utc>,
}

impl Entry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Time-bounded map from client idempotency key to the response first produced for it.
///
/// A missing or empty key never matches anything.
pub struct IdempotencyCache {
    entries: Mutex<HashMap<String, Entry>>,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl IdempotencyCache {
    pub fn new(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stored response for `key`, unless absent or expired. Expired entries are dropped.
    pub fn get(&self, key: Option<&str>) -> Option<StoredResponse> {
        let key = key.filter(|k| !k.is_empty())?;
        let now = self.clock.now();
        let mut entries = self.entries();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                log::debug!("Idempotency key {key:?} expired at {}", entry.expires_at);
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.response.clone()),
            None => None,
        }
    }

    pub fn set(&self, key: Option<&str>, response: StoredResponse) {
        let Some(key) = key.filter(|k| !k.is_empty()) else {
            return;
        };
        let now = self.clock.now();
        let expires_at = now.checked_add_signed(self.ttl).unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries().insert(
            key.to_owned(),
            Entry {
                response,
                expires_at,
            },
        );
    }

    /// Drops every expired entry. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - entries.len();
        if removed > 0 {
            log::debug!("Swept {removed} expired idempotency keys");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
