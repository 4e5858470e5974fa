//! Storage for derived terrain.
//!
//! Provides:
//! - [`TerrainCache`], the service that runs the fetch+compute path at most
//!   once per region and serializes concurrent requests for the same key
//! - [`TerrainStore`] backends: an in-memory LRU and a file-per-key store
//! - the binary entry codec used by the file store

pub mod codec;
pub mod entry;
pub mod store;
pub mod terrain_cache;

pub use codec::CodecError;
pub use entry::{CacheEntry, TerrainMetadata, TileLayout};
pub use store::{FileStore, MemoryStore, TerrainStore, STORE_REVISION};
pub use terrain_cache::{CacheKey, CacheOutcome, TerrainCache, TerrainCacheStats};
