//! Storage traits and error types
//!
//! Three narrow interfaces are defined here: the record repository for
//! companies and vessels, the store behind source performance statistics and
//! the store behind the result cache. All take `&self`; implementations
//! guard their state internally so one instance can be shared behind an `Arc`.

use crate::roster::CompanySeed;
use crate::search::cache::{CacheEntry, CacheKey};
use crate::search::FusedVesselRecord;
use crate::state::SourcePerformanceStat;
use crate::storage::{MediaItem, RepositorySummary, StoredVessel, VesselFilter};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Vessel not found: {0}")]
    VesselNotFound(i64),

    #[error("Record has neither a vessel name nor an IMO number")]
    MissingNaturalKey,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Storage lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Durable store for companies, vessels and their media
pub trait RecordRepository: Send + Sync {
    /// Inserts or updates a company keyed by name, returning its ID
    fn upsert_company(&self, seed: &CompanySeed, website: Option<&str>) -> StorageResult<i64>;

    /// Inserts or updates a vessel, returning its ID
    ///
    /// The natural key is the IMO number when present, otherwise the vessel
    /// name together with the owner. Calling this twice with the same record
    /// leaves one row.
    fn upsert_vessel(&self, company_id: Option<i64>, record: &FusedVesselRecord)
        -> StorageResult<i64>;

    /// Attaches a photo or document to a vessel; repeated URLs are ignored
    fn insert_media(&self, vessel_id: i64, item: &MediaItem) -> StorageResult<()>;

    fn query_vessels(&self, filter: &VesselFilter) -> StorageResult<Vec<StoredVessel>>;

    /// Counts used by the `--stats` report
    fn summary(&self) -> StorageResult<RepositorySummary>;
}

/// Persistence for per-source reliability statistics
pub trait PerformanceStore: Send + Sync {
    fn load_stat(&self, source: &str) -> StorageResult<Option<SourcePerformanceStat>>;

    fn save_stat(&self, source: &str, stat: &SourcePerformanceStat) -> StorageResult<()>;

    /// All stored statistics, ordered by source name
    fn load_all_stats(&self) -> StorageResult<Vec<(String, SourcePerformanceStat)>>;
}

/// Persistence for cached search results
pub trait CacheStore: Send + Sync {
    fn load_entry(&self, key: &CacheKey) -> StorageResult<Option<CacheEntry>>;

    /// Writes an entry, replacing any previous one under the same key
    fn save_entry(&self, entry: &CacheEntry) -> StorageResult<()>;
}
