//! Time-boxed cache of fused search results
//!
//! Entries are addressed by a SHA-256 key over the identifier and query kind.
//! Expiry is checked on read: an entry whose age has reached its TTL is
//! reported as a miss but left in the store.

use crate::search::fusion::FusedVesselRecord;
use crate::storage::{CacheStore, StorageResult};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of a cached result
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Query kind used by identifier searches
pub const COMPREHENSIVE: &str = "comprehensive";

/// Hex SHA-256 of `"{identifier}:{kind}"`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn new(identifier: &str, kind: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(identifier.as_bytes());
        hasher.update(b":");
        hasher.update(kind.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// Wraps an already computed key, e.g. one read back from storage
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored result with its creation time and lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub payload: FusedVesselRecord,
    pub created_at: DateTime<Utc>,
    pub ttl: Duration,
}

impl CacheEntry {
    /// True once the entry's age has reached its TTL
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        let ttl = match chrono::Duration::from_std(self.ttl) {
            Ok(ttl) => ttl,
            Err(_) => return false,
        };
        now - self.created_at >= ttl
    }
}

/// Read-through view over a `CacheStore` that enforces TTLs
#[derive(Clone)]
pub struct ResultCache {
    store: Arc<dyn CacheStore>,
    default_ttl: Duration,
}

impl ResultCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_default_ttl(store, DEFAULT_TTL)
    }

    pub fn with_default_ttl(store: Arc<dyn CacheStore>, default_ttl: Duration) -> Self {
        Self { store, default_ttl }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Returns the cached record if present and fresh
    pub fn get(&self, key: &CacheKey) -> StorageResult<Option<FusedVesselRecord>> {
        self.get_at(key, Utc::now())
    }

    /// Like `get`, evaluated at a given instant
    pub fn get_at(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> StorageResult<Option<FusedVesselRecord>> {
        let Some(entry) = self.store.load_entry(key)? else {
            return Ok(None);
        };

        if entry.is_expired_at(now) {
            tracing::debug!("Cache entry {} expired", key);
            return Ok(None);
        }

        Ok(Some(entry.payload))
    }

    /// Stores a record, replacing any previous entry under the key
    pub fn put(&self, key: &CacheKey, record: &FusedVesselRecord, ttl: Duration) -> StorageResult<()> {
        self.put_at(key, record, ttl, Utc::now())
    }

    pub fn put_at(
        &self,
        key: &CacheKey,
        record: &FusedVesselRecord,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> StorageResult<()> {
        let entry = CacheEntry {
            key: key.clone(),
            payload: record.clone(),
            created_at: now,
            ttl,
        };
        self.store.save_entry(&entry)
    }
}
