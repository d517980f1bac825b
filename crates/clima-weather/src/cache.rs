//! In-memory freshness cache for weather responses.
//!
//! Entries expire after a fixed TTL and the cache holds at most `capacity`
//! entries. Eviction is by insertion order, not by access.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::types::{CurrentConditions, ForecastBundle, Location};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_CAPACITY: usize = 50;

/// Payloads the weather client stores.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Current(CurrentConditions),
    Forecast(ForecastBundle),
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    stored_at: Instant,
}

#[derive(Debug)]
pub struct FreshnessCache<V> {
    entries: HashMap<String, CacheEntry<V>>,
    insertion_order: VecDeque<String>,
    ttl: Duration,
    capacity: usize,
}

impl<V: Clone> FreshnessCache<V> {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            ttl,
            // a zero capacity would evict every insert
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    /// Returns the payload if it is younger than the TTL at `now`.
    ///
    /// Expired entries are left in place; they only leave through eviction.
    pub fn get_at(&self, key: &str, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = now.saturating_duration_since(entry.stored_at);
        if age < self.ttl {
            Some(entry.payload.clone())
        } else {
            None
        }
    }

    pub fn put(&mut self, key: impl Into<String>, payload: V) {
        self.put_at(key, payload, Instant::now());
    }

    pub fn put_at(&mut self, key: impl Into<String>, payload: V, now: Instant) {
        let key = key.into();
        let entry = CacheEntry {
            payload,
            stored_at: now,
        };

        if self.entries.insert(key.clone(), entry).is_none() {
            self.insertion_order.push_back(key);
        }

        if self.entries.len() > self.capacity {
            if let Some(oldest) = self.insertion_order.pop_front() {
                tracing::debug!("Evicting cache entry {}", oldest);
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.insertion_order.clear();
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<V: Clone> Default for FreshnessCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

/// Cache key for current conditions at a location.
pub fn current_key(location: &Location) -> String {
    format!("current_{}_{}", location.latitude, location.longitude)
}

/// Cache key for a forecast of `days` days at a location.
pub fn forecast_key(location: &Location, days: u32) -> String {
    format!(
        "forecast_{}_{}_{}",
        location.latitude, location.longitude, days
    )
}
