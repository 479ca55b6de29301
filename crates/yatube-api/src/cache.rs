use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

/// Whole-response cache for the index listing, keyed by the raw `page`
/// query value. Entries expire after `ttl` and are dropped on the next write;
/// writes to posts do not invalidate it.
pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Instant, String)>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.get_at(key, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some((stored, body)) if now.duration_since(*stored) < self.ttl => Some(body.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn put(&self, key: &str, body: String) {
        self.put_at(key, body, Instant::now());
    }

    fn put_at(&self, key: &str, body: String, now: Instant) {
        if !self.is_enabled() {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        // Raw keys may never be read again
        entries.retain(|_, (stored, _)| now.duration_since(*stored) < self.ttl);
        entries.insert(key.to_string(), (now, body));
    }

    /// Drop everything.
    pub fn clear(&self) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        debug!("Clearing {} cached index pages", entries.len());
        entries.clear();
    }
}
