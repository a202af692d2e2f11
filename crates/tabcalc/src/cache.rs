//! Time-bounded result cache
//!
//! Entries are keyed by formula and target cell and expire after a fixed
//! TTL. The cache is best-effort: two concurrent misses on one key both
//! evaluate, and the later insert wins. Evaluation is pure, so either value
//! is correct.
//!
//! Expired entries are dropped when read, by [`FormulaCache::purge_expired`],
//! and by a sweep every [`PURGE_INTERVAL`] inserts, so keys that are never
//! read again do not accumulate.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tabcalc_core::{CellId, ColumnId, FormulaId, RowId, TableId};
use tabcalc_formula::FormulaValue;
use tokio::time::Instant;

/// Number of inserts between sweeps of expired entries
pub const PURGE_INTERVAL: u64 = 256;

/// Cache key for one formula applied to one cell
///
/// The target column is part of the key: a formula that reads its own
/// target column yields a different value per column on the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub formula_id: FormulaId,
    pub table_id: TableId,
    pub row_id: RowId,
    pub column_id: ColumnId,
}

impl CacheKey {
    /// Create a key for a formula applied to a cell
    pub fn new(formula_id: impl Into<FormulaId>, cell: &CellId) -> Self {
        Self {
            formula_id: formula_id.into(),
            table_id: cell.table.clone(),
            row_id: cell.row.clone(),
            column_id: cell.column.clone(),
        }
    }
}

/// A cached value and its expiry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub value: FormulaValue,
    pub expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because they outlived the TTL
    pub expired: u64,
}

impl CacheStats {
    /// Fraction of lookups that hit, or 0 before any lookup
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    inserts: u64,
}

impl Inner {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live(now));
        let removed = before - self.entries.len();
        self.stats.expired += removed as u64;
        removed
    }
}

/// Formula result cache owned by one engine
#[derive(Debug)]
pub struct FormulaCache {
    ttl: Duration,
    inner: Mutex<Inner>,
}

impl FormulaCache {
    /// Create an empty cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Lifetime of new entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for a key
    ///
    /// An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<FormulaValue> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        match inner.entries.get(key).copied() {
            Some(entry) if entry.is_live(now) => {
                inner.stats.hits += 1;
                Some(entry.value)
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.expired += 1;
                inner.stats.misses += 1;
                None
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Store a value, replacing any previous entry for the key
    pub fn insert(&self, key: CacheKey, value: FormulaValue) {
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            expires_at: now + self.ttl,
        };

        let mut inner = self.inner.lock();
        inner.inserts += 1;
        if inner.inserts % PURGE_INTERVAL == 0 {
            inner.purge_expired(now);
        }
        inner.entries.insert(key, entry);
    }

    /// Entry for a key, live or not, without touching statistics
    pub fn peek(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.inner.lock().entries.get(key).copied()
    }

    /// Drop every entry for one row, returning how many were removed
    pub fn invalidate_row(&self, table_id: &str, row_id: &str) -> usize {
        self.remove_where(|key| key.table_id == table_id && key.row_id == row_id)
    }

    /// Drop every entry for one formula, e.g. after its document changed
    pub fn invalidate_formula(&self, formula_id: &str) -> usize {
        self.remove_where(|key| key.formula_id == formula_id)
    }

    /// Drop every entry past its TTL
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired(Instant::now())
    }

    fn remove_where(&self, mut pred: impl FnMut(&CacheKey) -> bool) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|key, _| !pred(key));
        before - inner.entries.len()
    }

    /// Number of stored entries, including expired ones not yet purged
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    /// Current statistics
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Remove all entries and reset statistics
    pub fn clear(&self) {
        *self.inner.lock() = Inner::default();
    }
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::new(crate::options::DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn key(formula: &str, row: &str, column: &str) -> CacheKey {
        CacheKey::new(formula, &CellId::new("t", row, column))
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_and_miss() {
        let cache = FormulaCache::new(Duration::from_secs(300));
        let k = key("f1", "r1", "total");

        assert_eq!(cache.get(&k), None);
        cache.insert(k.clone(), FormulaValue::Number(8.0));
        assert_eq!(cache.get(&k), Some(FormulaValue::Number(8.0)));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire_after_ttl() {
        let cache = FormulaCache::new(Duration::from_secs(300));
        let k = key("f1", "r1", "total");
        cache.insert(k.clone(), FormulaValue::Number(1.0));

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(&k), Some(FormulaValue::Number(1.0)));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get(&k), None);
        assert!(cache.is_empty());
        assert_eq!(cache.stats().expired, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_insert_overwrites_and_renews() {
        let cache = FormulaCache::new(Duration::from_secs(10));
        let k = key("f1", "r1", "total");
        cache.insert(k.clone(), FormulaValue::Number(1.0));

        tokio::time::advance(Duration::from_secs(8)).await;
        cache.insert(k.clone(), FormulaValue::Undefined);

        tokio::time::advance(Duration::from_secs(8)).await;
        assert_eq!(cache.get(&k), Some(FormulaValue::Undefined));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_column_is_part_of_key() {
        let cache = FormulaCache::default();
        cache.insert(key("f1", "r1", "a"), FormulaValue::Number(1.0));
        assert_eq!(cache.get(&key("f1", "r1", "b")), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidation() {
        let cache = FormulaCache::default();
        cache.insert(key("f1", "r1", "a"), FormulaValue::Number(1.0));
        cache.insert(key("f1", "r1", "b"), FormulaValue::Number(2.0));
        cache.insert(key("f2", "r1", "c"), FormulaValue::Number(3.0));
        cache.insert(key("f1", "r2", "a"), FormulaValue::Number(4.0));

        assert_eq!(cache.invalidate_row("t", "r1"), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.invalidate_formula("f1"), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = FormulaCache::new(Duration::from_secs(5));
        cache.insert(key("f1", "r1", "a"), FormulaValue::Number(1.0));
        tokio::time::advance(Duration::from_secs(3)).await;
        cache.insert(key("f1", "r2", "a"), FormulaValue::Number(2.0));
        tokio::time::advance(Duration::from_secs(3)).await;

        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.peek(&key("f1", "r2", "a")).is_some());

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_inserts_sweep_expired_entries() {
        let cache = FormulaCache::new(Duration::from_secs(5));
        for i in 0..PURGE_INTERVAL - 1 {
            cache.insert(key("f1", &format!("r{}", i), "a"), FormulaValue::Number(1.0));
        }
        assert_eq!(cache.len(), (PURGE_INTERVAL - 1) as usize);

        tokio::time::advance(Duration::from_secs(6)).await;
        cache.insert(key("f2", "r0", "a"), FormulaValue::Number(2.0));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().expired, PURGE_INTERVAL - 1);
        assert_eq!(cache.get(&key("f2", "r0", "a")), Some(FormulaValue::Number(2.0)));
    }
}
