//! Terrain cache service.
//!
//! Runs the expensive fetch+decode+stitch+aspect path at most once per
//! region. Requests are keyed by [`CacheKey`]; concurrent requests for the
//! same key are serialized so the second one finds the first one's entry.
//!
//! The cache never fails a request on its own account: a read error is
//! treated as a miss and a write error is logged and counted, after which
//! the freshly computed grids are still returned.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use powder_common::{GeoBounds, PowderResult, TileResolution};

use crate::{CacheEntry, TerrainStore};

/// Cache key for one region at one zoom and tile resolution.
///
/// Format: `terrain:{south}_{west}_{north}_{east}:z{zoom}:{multiplier}x`
/// with coordinates quantized to six decimals.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(bounds: &GeoBounds, zoom: u32, resolution: TileResolution) -> Self {
        Self(format!(
            "terrain:{}:z{}:{}x",
            bounds.cache_key(),
            zoom,
            resolution.multiplier()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key rendered safe for use as a file name.
    pub fn file_stem(&self) -> String {
        self.0
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
                _ => '_',
            })
            .collect()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a returned entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Loaded from the store unchanged.
    Hit,
    /// Computed for this request.
    Computed,
}

/// Counters for the terrain cache.
#[derive(Debug, Default)]
pub struct TerrainCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub read_failures: AtomicU64,
    pub write_failures: AtomicU64,
}

impl TerrainCacheStats {
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn read_failures(&self) -> u64 {
        self.read_failures.load(Ordering::Relaxed)
    }

    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    /// Hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits();
        let total = hits + self.misses();
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Terrain cache over an injectable [`TerrainStore`].
pub struct TerrainCache {
    store: Arc<dyn TerrainStore>,
    in_flight: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
    stats: Arc<TerrainCacheStats>,
}

impl TerrainCache {
    pub fn new(store: Arc<dyn TerrainStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
            stats: Arc::new(TerrainCacheStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<TerrainCacheStats> {
        self.stats.clone()
    }

    /// Return the entry for `key`, running `compute` only on a miss.
    ///
    /// Errors from `compute` propagate and nothing is stored.
    pub async fn get_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> PowderResult<(CacheEntry, CacheOutcome)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PowderResult<CacheEntry>>,
    {
        let gate = self.acquire_gate(key).await;
        let result = {
            let _guard = gate.lock().await;
            self.load_or_compute(key, compute).await
        };
        self.release_gate(key, gate).await;
        result
    }

    async fn load_or_compute<F, Fut>(
        &self,
        key: &CacheKey,
        compute: F,
    ) -> PowderResult<(CacheEntry, CacheOutcome)>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = PowderResult<CacheEntry>>,
    {
        match self.store.load(key).await {
            Ok(Some(entry)) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                counter!("terrain_cache_hits_total").increment(1);
                debug!(key = %key, store = self.store.name(), "Terrain cache hit");
                return Ok((entry, CacheOutcome::Hit));
            }
            Ok(None) => {}
            Err(e) => {
                self.stats.read_failures.fetch_add(1, Ordering::Relaxed);
                counter!("terrain_cache_read_failures_total").increment(1);
                warn!(key = %key, store = self.store.name(), error = %e, "Terrain cache read failed, treating as miss");
            }
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        counter!("terrain_cache_misses_total").increment(1);

        let entry = compute().await?;

        match self.store.save(key, &entry).await {
            Ok(()) => {
                info!(
                    key = %key,
                    store = self.store.name(),
                    width = entry.width(),
                    height = entry.height(),
                    "Cached terrain"
                );
            }
            Err(e) => {
                self.stats.write_failures.fetch_add(1, Ordering::Relaxed);
                counter!("terrain_cache_write_failures_total").increment(1);
                warn!(key = %key, store = self.store.name(), error = %e, "Terrain cache write failed");
            }
        }

        Ok((entry, CacheOutcome::Computed))
    }

    async fn acquire_gate(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut in_flight = self.in_flight.lock().await;
        in_flight.entry(key.clone()).or_default().clone()
    }

    async fn release_gate(&self, key: &CacheKey, gate: Arc<Mutex<()>>) {
        let mut in_flight = self.in_flight.lock().await;
        // Only the map and this caller hold it: nobody else is waiting
        if Arc::strong_count(&gate) == 2 {
            in_flight.remove(key);
        }
    }

    /// Number of keys with a request in flight.
    pub async fn in_flight(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        let bounds = GeoBounds::new(40.56, -111.68, 40.61, -111.6).unwrap();
        let key = CacheKey::new(&bounds, 13, TileResolution::Retina);
        assert_eq!(
            key.as_str(),
            "terrain:40.560000_-111.680000_40.610000_-111.600000:z13:2x"
        );
    }

    #[test]
    fn test_key_distinguishes_zoom_and_resolution() {
        let bounds = GeoBounds::new(40.56, -111.68, 40.61, -111.6).unwrap();
        let a = CacheKey::new(&bounds, 13, TileResolution::Retina);
        let b = CacheKey::new(&bounds, 12, TileResolution::Retina);
        let c = CacheKey::new(&bounds, 13, TileResolution::Standard);
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_file_stem_is_safe() {
        let bounds = GeoBounds::new(40.56, -111.68, 40.61, -111.6).unwrap();
        let stem = CacheKey::new(&bounds, 13, TileResolution::Retina).file_stem();
        assert!(!stem.contains(':'));
        assert!(!stem.contains('/'));
        assert!(stem.starts_with("terrain_40.560000"));
    }

    #[test]
    fn test_stats_hit_rate() {
        let stats = TerrainCacheStats::default();
        assert_eq!(stats.hit_rate(), 0.0);
        stats.hits.fetch_add(3, Ordering::Relaxed);
        stats.misses.fetch_add(1, Ordering::Relaxed);
        assert_eq!(stats.hit_rate(), 75.0);
    }
}
