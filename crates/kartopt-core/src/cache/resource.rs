//! Bounded in-memory cache of decoded resources with a disk mirror.
//!
//! All bookkeeping (entry map and running size total) sits behind a single
//! mutex, so concurrent `store`/`lookup`/eviction calls never observe a
//! half-applied size change. Decoding and disk I/O happen outside the lock.
//!
//! Eviction runs after every insertion:
//! 1. every entry whose expiry has passed is dropped, regardless of pressure;
//! 2. if the total is still over budget, entries are dropped oldest
//!    `last_used` first, larger entries first among equally stale ones.

use crate::cache::clock::{Clock, SystemClock};
use crate::cache::decode::ResourceDecoder;
use crate::cache::disk::{DiskCopy, DiskMirror};
use crate::config::CacheDefaults;
use crate::options::OptionsManager;
use crate::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// A cache hit.
#[derive(Debug)]
pub struct CachedResource<T> {
    pub value: Arc<T>,
    pub last_modified: DateTime<Utc>,
    pub expires: Option<DateTime<Utc>>,
}

impl<T> Clone for CachedResource<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            last_modified: self.last_modified,
            expires: self.expires,
        }
    }
}

/// A live cache entry.
#[derive(Debug)]
struct CacheEntry<T> {
    value: Arc<T>,
    last_used: DateTime<Utc>,
    last_modified: DateTime<Utc>,
    expires: Option<DateTime<Utc>>,
    estimated_size: u64,
}

impl<T> CacheEntry<T> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires < now)
    }
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries currently cached.
    pub entry_count: usize,
    /// Total estimated size of all entries (bytes).
    pub total_bytes: u64,
    pub hits: u64,
    pub misses: u64,
    /// Entries removed for budget or expiry reasons.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CacheState<T> {
    entries: HashMap<String, CacheEntry<T>>,
    total_bytes: u64,
    stats: CacheStats,
}

impl<T> CacheState<T> {
    fn remove(&mut self, name: &str) -> Option<CacheEntry<T>> {
        let entry = self.entries.remove(name)?;
        self.total_bytes -= entry.estimated_size;
        self.stats.evictions += 1;
        Some(entry)
    }

    fn evict_expired(&mut self, now: DateTime<Utc>) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(name, _)| name.clone())
            .collect();

        for name in &expired {
            debug!("Evicting expired cache entry {}", name);
            self.remove(name);
        }
        expired.len()
    }

    fn evict_to_budget(&mut self, max_bytes: u64) -> usize {
        if self.total_bytes <= max_bytes {
            return 0;
        }

        let mut candidates: Vec<(&String, DateTime<Utc>, u64)> = self
            .entries
            .iter()
            .map(|(name, entry)| (name, entry.last_used, entry.estimated_size))
            .collect();
        candidates.sort_by(|a, b| a.1.cmp(&b.1).then(b.2.cmp(&a.2)));
        let order: Vec<String> = candidates.into_iter().map(|(name, _, _)| name.clone()).collect();

        let mut evicted = 0;
        for name in order {
            if self.total_bytes <= max_bytes {
                break;
            }
            debug!("Evicting {} to fit cache budget of {} bytes", name, max_bytes);
            self.remove(&name);
            evicted += 1;
        }
        evicted
    }
}

/// Mirror maintenance owed by a store.
enum DiskOp {
    Write(DiskMirror),
    Remove(DiskMirror),
}

impl DiskOp {
    /// Failures are logged; the mirror is best-effort.
    fn apply(&self, name: &str, raw: &[u8]) {
        match self {
            DiskOp::Write(disk) => {
                if let Err(e) = disk.write(name, raw) {
                    warn!("Failed to mirror {} to disk: {}", name, e);
                }
            }
            DiskOp::Remove(disk) => {
                if let Err(e) = disk.remove(name) {
                    warn!("Failed to remove disk copy of {}: {}", name, e);
                }
            }
        }
    }
}

/// Bounded, mutex-guarded cache of decoded resources.
pub struct ResourceCache<D: ResourceDecoder> {
    decoder: D,
    state: Mutex<CacheState<D::Output>>,
    disk: Option<DiskMirror>,
    options: Arc<OptionsManager>,
    /// Whether the options' memory budget applies to this cache.
    bounded: bool,
    clock: Arc<dyn Clock>,
}

impl<D: ResourceDecoder> ResourceCache<D> {
    /// Create a cache bounded by the options' memory budget.
    pub fn new(decoder: D, options: Arc<OptionsManager>) -> Self {
        Self {
            decoder,
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                total_bytes: 0,
                stats: CacheStats::default(),
            }),
            disk: None,
            options,
            bounded: true,
            clock: Arc::new(SystemClock),
        }
    }

    /// Mirror stored resources to `mirror`.
    pub fn with_disk(mut self, mirror: DiskMirror) -> Self {
        self.disk = Some(mirror);
        self
    }

    /// Use a custom time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Ignore the memory budget (expiry still applies).
    pub fn unbounded(mut self) -> Self {
        self.bounded = false;
        self
    }

    /// Estimated size of an entry holding `value`.
    fn estimated_size(&self, value: &D::Output, raw: &[u8]) -> u64 {
        CacheDefaults::ENTRY_OVERHEAD_BYTES + self.decoder.payload_size(value, raw)
    }

    /// Look up a fresh entry.
    ///
    /// A hit refreshes the entry's last-used time. An entry whose expiry has
    /// passed is evicted on the spot and reported as a miss.
    pub fn lookup(&self, name: &str) -> Option<CachedResource<D::Output>> {
        let now = self.clock.now();
        let mut guard = self.lock();
        let state = &mut *guard;

        match state.entries.get_mut(name) {
            Some(entry) if !entry.is_expired(now) => {
                entry.last_used = now;
                let hit = CachedResource {
                    value: Arc::clone(&entry.value),
                    last_modified: entry.last_modified,
                    expires: entry.expires,
                };
                state.stats.hits += 1;
                debug!("Cache hit for {}", name);
                return Some(hit);
            }
            Some(_) => {
                debug!("Cache entry {} expired, evicting", name);
                state.remove(name);
            }
            None => {}
        }

        state.stats.misses += 1;
        None
    }

    /// Decode `raw` and insert it under `name`, replacing any previous entry.
    ///
    /// Decode failures leave the cache untouched and are returned to the
    /// caller. After insertion the eviction pass runs against the current
    /// budget. When disk caching is enabled and `persist_to_disk` is set the
    /// raw bytes are mirrored to disk; when disk caching is disabled any
    /// existing mirror copy is deleted. The disk work runs on the calling
    /// thread; async callers use [`store_async`](Self::store_async).
    pub fn store(
        &self,
        name: &str,
        raw: &[u8],
        last_modified: DateTime<Utc>,
        expires: Option<DateTime<Utc>>,
        persist_to_disk: bool,
    ) -> Result<Arc<D::Output>> {
        let (value, disk_op) = self.insert(name, raw, last_modified, expires, persist_to_disk)?;
        if let Some(op) = disk_op {
            op.apply(name, raw);
        }
        Ok(value)
    }

    /// [`store`](Self::store) with the mirror write or delete moved to the
    /// blocking pool.
    ///
    /// The memory entry is visible before the disk work starts; the returned
    /// future completes once the disk work has finished.
    pub async fn store_async(
        &self,
        name: &str,
        raw: Bytes,
        last_modified: DateTime<Utc>,
        expires: Option<DateTime<Utc>>,
        persist_to_disk: bool,
    ) -> Result<Arc<D::Output>> {
        let (value, disk_op) = self.insert(name, &raw, last_modified, expires, persist_to_disk)?;
        if let Some(op) = disk_op {
            let owned_name = name.to_string();
            // Run in blocking task since file I/O is blocking
            if let Err(e) = tokio::task::spawn_blocking(move || op.apply(&owned_name, &raw)).await {
                warn!("Disk cache task for {} failed: {}", name, e);
            }
        }
        Ok(value)
    }

    /// Decode and insert into memory, returning the disk follow-up if any.
    fn insert(
        &self,
        name: &str,
        raw: &[u8],
        last_modified: DateTime<Utc>,
        expires: Option<DateTime<Utc>>,
        persist_to_disk: bool,
    ) -> Result<(Arc<D::Output>, Option<DiskOp>)> {
        let decoded = match self.decoder.decode(name, raw) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!("Not caching {}: {}", name, e);
                return Err(e);
            }
        };

        let estimated_size = self.estimated_size(&decoded, raw);
        let value = Arc::new(decoded);
        let options = self.options.get();
        let now = self.clock.now();

        {
            let mut state = self.lock();
            let entry = CacheEntry {
                value: Arc::clone(&value),
                last_used: now,
                last_modified,
                expires,
                estimated_size,
            };
            let old_size = state
                .entries
                .insert(name.to_string(), entry)
                .map(|old| old.estimated_size)
                .unwrap_or(0);
            state.total_bytes = state.total_bytes - old_size + estimated_size;

            state.evict_expired(now);
            if self.bounded {
                state.evict_to_budget(options.memory_cache_bytes);
            }
        }

        let disk_op = self.disk.as_ref().and_then(|disk| {
            if !options.use_disk_cache {
                Some(DiskOp::Remove(disk.clone()))
            } else if persist_to_disk {
                Some(DiskOp::Write(disk.clone()))
            } else {
                None
            }
        });

        Ok((value, disk_op))
    }

    /// Extend an entry's freshness without re-decoding. Returns whether the
    /// entry was present.
    pub fn update_expiry(&self, name: &str, expires: DateTime<Utc>) -> bool {
        let mut state = self.lock();
        match state.entries.get_mut(name) {
            Some(entry) => {
                entry.expires = Some(expires);
                true
            }
            None => false,
        }
    }

    /// Remove every expired entry. Returns the number removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        self.lock().evict_expired(now)
    }

    /// Remove least-recently-used entries until the total fits `max_bytes`.
    /// Returns the number removed.
    pub fn evict_to_budget(&self, max_bytes: u64) -> usize {
        self.lock().evict_to_budget(max_bytes)
    }

    /// Re-apply expiry and the current options budget.
    pub fn shrink_to_fit(&self) -> usize {
        let now = self.clock.now();
        let budget = self.options.get().memory_cache_bytes;
        let mut state = self.lock();
        let mut evicted = state.evict_expired(now);
        if self.bounded {
            evicted += state.evict_to_budget(budget);
        }
        evicted
    }

    /// Read the disk mirror copy of `name`, if any.
    pub fn read_disk(&self, name: &str) -> Option<DiskCopy> {
        self.disk.as_ref()?.read(name)
    }

    /// Populate the memory cache from the disk mirror.
    ///
    /// The copy is stored without an expiry and without being written back.
    /// Undecodable disk copies are logged and ignored.
    pub fn load_from_disk(&self, name: &str) -> Option<CachedResource<D::Output>> {
        let copy = self.read_disk(name)?;
        match self.store(name, &copy.bytes, copy.modified, None, false) {
            Ok(value) => {
                debug!("Loaded {} from disk cache", name);
                Some(CachedResource {
                    value,
                    last_modified: copy.modified,
                    expires: None,
                })
            }
            Err(e) => {
                warn!("Ignoring unreadable disk copy of {}: {}", name, e);
                None
            }
        }
    }

    /// Drop every in-memory entry.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.total_bytes = 0;
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Total estimated size of all live entries.
    pub fn total_bytes(&self) -> u64 {
        self.lock().total_bytes
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entry_count: state.entries.len(),
            total_bytes: state.total_bytes,
            ..state.stats
        }
    }

    pub fn options(&self) -> &Arc<OptionsManager> {
        &self.options
    }

    /// Current time according to the cache's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<D::Output>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::clock::ManualClock;
    use crate::cache::decode::ImageDecoder;
    use crate::cache::test_support::png_bytes;
    use crate::options::Options;
    use crate::KartError;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    /// Stores the raw bytes as-is; payload size is the byte length.
    #[derive(Debug)]
    struct RawDecoder;

    impl ResourceDecoder for RawDecoder {
        type Output = Vec<u8>;

        fn decode(&self, name: &str, bytes: &[u8]) -> Result<Vec<u8>> {
            if bytes.starts_with(b"corrupt") {
                return Err(KartError::decode(name, "corrupt payload"));
            }
            Ok(bytes.to_vec())
        }
    }

    const OVERHEAD: u64 = CacheDefaults::ENTRY_OVERHEAD_BYTES;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn options(budget: u64, use_disk_cache: bool) -> Arc<OptionsManager> {
        Arc::new(OptionsManager::in_memory(Options {
            memory_cache_bytes: budget,
            use_disk_cache,
            ..Options::default()
        }))
    }

    fn raw_cache(budget: u64) -> (ResourceCache<RawDecoder>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let cache = ResourceCache::new(RawDecoder, options(budget, false)).with_clock(clock.clone());
        (cache, clock)
    }

    #[test]
    fn test_store_then_lookup_roundtrip() {
        let cache = ResourceCache::new(ImageDecoder, options(10_000_000, false));
        let bytes = png_bytes(5, 5);

        cache.store("Mario.png", &bytes, start(), None, false).unwrap();
        let hit = cache.lookup("Mario.png").unwrap();

        let direct = ImageDecoder.decode("Mario.png", &bytes).unwrap();
        assert_eq!(*hit.value, direct);
        assert_eq!(hit.last_modified, start());
        assert_eq!(hit.expires, None);
        assert_eq!(cache.total_bytes(), OVERHEAD + 5 * 5 * 4);
    }

    #[test]
    fn test_decode_failure_leaves_cache_untouched() {
        let (cache, _clock) = raw_cache(10_000);
        cache.store("a", b"good", start(), None, false).unwrap();

        let err = cache.store("a", b"corrupt!", start(), None, false).unwrap_err();
        assert!(matches!(err, KartError::Decode { .. }));
        assert_eq!(*cache.lookup("a").unwrap().value, b"good".to_vec());
        assert_eq!(cache.total_bytes(), OVERHEAD + 4);
    }

    #[test]
    fn test_replacing_entry_adjusts_size_by_delta() {
        let (cache, _clock) = raw_cache(10_000);
        cache.store("a", &[0u8; 100], start(), None, false).unwrap();
        cache.store("b", &[0u8; 10], start(), None, false).unwrap();
        cache.store("a", &[0u8; 40], start(), None, false).unwrap();

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.total_bytes(), 2 * OVERHEAD + 40 + 10);
    }

    #[test]
    fn test_expired_entry_is_a_miss_and_leaves_accounting() {
        let (cache, clock) = raw_cache(10_000);
        let expires = start() + Duration::seconds(30);
        cache.store("a", &[1u8; 20], start(), Some(expires), false).unwrap();
        cache.store("b", &[1u8; 10], start(), None, false).unwrap();

        assert!(cache.lookup("a").is_some());
        clock.advance(Duration::seconds(31));

        assert!(cache.lookup("a").is_none());
        assert!(!cache.contains("a"));
        assert_eq!(cache.total_bytes(), OVERHEAD + 10);
    }

    #[test]
    fn test_budget_eviction_removes_oldest_first() {
        // Room for three 100-byte entries.
        let (cache, clock) = raw_cache(3 * (OVERHEAD + 100));

        for name in ["a", "b", "c"] {
            cache.store(name, &[0u8; 100], start(), None, false).unwrap();
            clock.advance(Duration::seconds(1));
        }
        // Touch "a" so "b" becomes the least recently used.
        assert!(cache.lookup("a").is_some());
        clock.advance(Duration::seconds(1));

        cache.store("d", &[0u8; 100], start(), None, false).unwrap();

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert!(cache.contains("d"));
        assert!(cache.total_bytes() <= 3 * (OVERHEAD + 100));
    }

    #[test]
    fn test_budget_eviction_prefers_larger_among_equally_stale() {
        let (cache, clock) = raw_cache(100_000);
        // Same last-used time for both.
        cache.store("small", &[0u8; 10], start(), None, false).unwrap();
        cache.store("large", &[0u8; 500], start(), None, false).unwrap();
        clock.advance(Duration::seconds(1));
        cache.store("newest", &[0u8; 10], start(), None, false).unwrap();

        let evicted = cache.evict_to_budget(2 * OVERHEAD + 20);
        assert_eq!(evicted, 1);
        assert!(!cache.contains("large"));
        assert!(cache.contains("small"));
        assert!(cache.contains("newest"));
    }

    #[test]
    fn test_expired_entries_are_evicted_before_budget() {
        let (cache, clock) = raw_cache(100_000);
        cache
            .store("stale", &[0u8; 10], start(), Some(start() + Duration::seconds(5)), false)
            .unwrap();
        clock.advance(Duration::seconds(10));
        // Well under budget, but storing still purges the expired entry.
        cache.store("fresh", &[0u8; 10], start(), None, false).unwrap();

        assert!(!cache.contains("stale"));
        assert_eq!(cache.total_bytes(), OVERHEAD + 10);
    }

    #[test]
    fn test_update_expiry() {
        let (cache, clock) = raw_cache(10_000);
        cache
            .store("a", b"x", start(), Some(start() + Duration::seconds(1)), false)
            .unwrap();

        assert!(cache.update_expiry("a", start() + Duration::hours(1)));
        assert!(!cache.update_expiry("missing", start()));

        clock.advance(Duration::minutes(30));
        let hit = cache.lookup("a").unwrap();
        assert_eq!(hit.expires, Some(start() + Duration::hours(1)));
    }

    #[test]
    fn test_shrink_to_fit_after_lowering_budget() {
        let clock = Arc::new(ManualClock::new(start()));
        let options = options(10_000, false);
        let cache = ResourceCache::new(RawDecoder, options.clone()).with_clock(clock.clone());

        for name in ["a", "b", "c", "d"] {
            cache.store(name, &[0u8; 200], start(), None, false).unwrap();
            clock.advance(Duration::seconds(1));
        }
        assert_eq!(cache.total_bytes(), 4 * (OVERHEAD + 200));

        let lowered = Options {
            memory_cache_bytes: 2 * (OVERHEAD + 200),
            ..options.get()
        };
        options.set(lowered).unwrap();
        let evicted = cache.shrink_to_fit();

        assert_eq!(evicted, 2);
        assert!(cache.total_bytes() <= 2 * (OVERHEAD + 200));
        assert!(cache.contains("c") && cache.contains("d"));
    }

    #[test]
    fn test_unbounded_cache_ignores_budget() {
        let cache = ResourceCache::new(RawDecoder, options(1, false)).unbounded();
        cache.store("data.json", &[0u8; 1_000], start(), None, false).unwrap();
        assert!(cache.contains("data.json"));
    }

    #[test]
    fn test_disk_mirror_written_when_enabled() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResourceCache::new(RawDecoder, options(10_000, true))
            .with_disk(DiskMirror::new(temp_dir.path()));

        cache.store("a.webp", b"bytes", start(), None, true).unwrap();
        assert_eq!(std::fs::read(temp_dir.path().join("a.webp")).unwrap(), b"bytes");

        // persist_to_disk = false never writes.
        cache.store("b.webp", b"bytes", start(), None, false).unwrap();
        assert!(!temp_dir.path().join("b.webp").exists());
    }

    #[test]
    fn test_disk_copy_deleted_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.webp"), b"old").unwrap();

        let cache = ResourceCache::new(RawDecoder, options(10_000, false))
            .with_disk(DiskMirror::new(temp_dir.path()));
        cache.store("a.webp", b"new", start(), None, true).unwrap();

        assert!(!temp_dir.path().join("a.webp").exists());
    }

    #[tokio::test]
    async fn test_store_async_finishes_disk_work_before_returning() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResourceCache::new(RawDecoder, options(10_000, true))
            .with_disk(DiskMirror::new(temp_dir.path()));

        let value = cache
            .store_async("c.webp", Bytes::from_static(b"bytes"), start(), None, true)
            .await
            .unwrap();
        assert_eq!(*value, b"bytes".to_vec());
        assert!(cache.contains("c.webp"));
        assert_eq!(std::fs::read(temp_dir.path().join("c.webp")).unwrap(), b"bytes");

        cache
            .store_async("d.webp", Bytes::from_static(b"bytes"), start(), None, false)
            .await
            .unwrap();
        assert!(!temp_dir.path().join("d.webp").exists());
    }

    #[tokio::test]
    async fn test_store_async_deletes_disk_copy_when_disabled() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("a.webp"), b"old").unwrap();

        let cache = ResourceCache::new(RawDecoder, options(10_000, false))
            .with_disk(DiskMirror::new(temp_dir.path()));
        cache
            .store_async("a.webp", Bytes::from_static(b"new"), start(), None, true)
            .await
            .unwrap();

        assert!(!temp_dir.path().join("a.webp").exists());
        assert!(cache.contains("a.webp"));
    }

    #[tokio::test]
    async fn test_store_async_decode_failure_skips_disk() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ResourceCache::new(RawDecoder, options(10_000, true))
            .with_disk(DiskMirror::new(temp_dir.path()));

        let err = cache
            .store_async("bad.webp", Bytes::from_static(b"corrupt"), start(), None, true)
            .await
            .unwrap_err();
        assert!(matches!(err, KartError::Decode { .. }));
        assert!(!temp_dir.path().join("bad.webp").exists());
    }

    #[test]
    fn test_load_from_disk_uses_file_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let mirror = DiskMirror::new(temp_dir.path());
        mirror.write("Yoshi.png", &png_bytes(2, 2)).unwrap();
        let modified = mirror.read("Yoshi.png").unwrap().modified;

        let cache = ResourceCache::new(ImageDecoder, options(10_000, true)).with_disk(mirror);
        let loaded = cache.load_from_disk("Yoshi.png").unwrap();

        assert_eq!(loaded.last_modified, modified);
        assert_eq!(loaded.expires, None);
        assert_eq!(loaded.value.dimensions(), (2, 2));
        assert!(cache.lookup("Yoshi.png").is_some());
    }

    #[test]
    fn test_stats() {
        let (cache, _clock) = raw_cache(10_000);
        cache.store("a", b"1", start(), None, false).unwrap();
        cache.lookup("a");
        cache.lookup("missing");

        let stats = cache.stats();
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.5).abs() < f64::EPSILON);
    }
}
