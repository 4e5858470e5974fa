//! Storage backends for the terrain cache.

use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lru::LruCache;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use powder_common::{PowderError, PowderResult};

use crate::codec;
use crate::{CacheEntry, CacheKey};

/// Opaque version of the persisted store. Bumping it makes every entry
/// written under an older revision unreachable.
pub const STORE_REVISION: u32 = 1;

/// A key-value backend holding cached terrain.
#[async_trait]
pub trait TerrainStore: Send + Sync {
    /// Fetch an entry. `Ok(None)` is a miss.
    async fn load(&self, key: &CacheKey) -> PowderResult<Option<CacheEntry>>;

    /// Store an entry, replacing any existing one.
    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> PowderResult<()>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// In-process LRU store.
pub struct MemoryStore {
    cache: RwLock<LruCache<String, CacheEntry>>,
}

impl MemoryStore {
    /// Create a store holding at most `capacity` regions (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(capacity)),
        }
    }

    /// Current number of entries.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Check if the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(16)
    }
}

#[async_trait]
impl TerrainStore for MemoryStore {
    async fn load(&self, key: &CacheKey) -> PowderResult<Option<CacheEntry>> {
        // LRU bookkeeping needs a write lock even for reads
        let mut cache = self.cache.write().await;
        Ok(cache.get(key.as_str()).cloned())
    }

    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> PowderResult<()> {
        let mut cache = self.cache.write().await;
        cache.put(key.as_str().to_string(), entry.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// One file per key under `{root}/r{revision}/`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `root` using the current [`STORE_REVISION`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self::with_revision(root, STORE_REVISION)
    }

    /// Store rooted at `root` for an explicit revision.
    pub fn with_revision(root: impl AsRef<Path>, revision: u32) -> Self {
        Self {
            dir: root.as_ref().join(format!("r{}", revision)),
        }
    }

    /// Directory holding this revision's entries.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File path for a key.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.bin", key.file_stem()))
    }
}

fn unavailable(action: &str, path: &Path, err: impl std::fmt::Display) -> PowderError {
    PowderError::CacheUnavailable(format!("{} {}: {}", action, path.display(), err))
}

#[async_trait]
impl TerrainStore for FileStore {
    #[instrument(skip(self), fields(key = %key))]
    async fn load(&self, key: &CacheKey) -> PowderResult<Option<CacheEntry>> {
        let path = self.path_for(key);

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(unavailable("read", &path, e)),
        };

        let entry = codec::decode(&bytes).map_err(|e| unavailable("decode", &path, e))?;
        debug!(path = %path.display(), bytes = bytes.len(), "Loaded terrain entry");
        Ok(Some(entry))
    }

    #[instrument(skip(self, entry), fields(key = %key))]
    async fn save(&self, key: &CacheKey, entry: &CacheEntry) -> PowderResult<()> {
        let path = self.path_for(key);
        let bytes = codec::encode(entry)?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| unavailable("create", &self.dir, e))?;

        // Write to a sibling temp file, then rename over the target
        let tmp = path.with_extension("bin.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| unavailable("write", &tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| unavailable("rename", &path, e))?;

        debug!(path = %path.display(), bytes = bytes.len(), "Saved terrain entry");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
