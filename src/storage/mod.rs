//! Storage module for persisting discovery results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Company and vessel upserts with media attachments
//! - Source performance statistics
//! - The backing store of the result cache
//!
//! `MemoryStorage` implements the same traits without a database and is
//! used for dry runs and tests.

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;
pub use traits::{CacheStore, PerformanceStore, RecordRepository, StorageError, StorageResult};

use crate::search::{Attribute, FusedVesselRecord};
use crate::SoundingError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, SoundingError> {
    SqliteStorage::new(path)
}

/// Kind of media attached to a vessel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    Photo,
    Document,
}

impl MediaKind {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Document => "document",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "photo" => Some(Self::Photo),
            "document" => Some(Self::Document),
            _ => None,
        }
    }
}

/// A photo or document URL for a vessel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaItem {
    pub kind: MediaKind,
    pub url: String,
    pub source: String,
}

impl MediaItem {
    pub fn photo(url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Photo,
            url: url.into(),
            source: source.into(),
        }
    }
}

/// Criteria for `RecordRepository::query_vessels`; empty fields match everything
#[derive(Debug, Clone, Default)]
pub struct VesselFilter {
    pub imo: Option<String>,
    /// Case-insensitive substring of the vessel name
    pub name_contains: Option<String>,
    pub owner: Option<String>,
    pub min_confidence: Option<f64>,
    pub limit: Option<usize>,
}

impl VesselFilter {
    pub fn matches(&self, vessel: &StoredVessel) -> bool {
        if let Some(imo) = &self.imo {
            if vessel.imo.as_deref() != Some(imo.as_str()) {
                return false;
            }
        }

        if let Some(needle) = &self.name_contains {
            let needle = needle.to_lowercase();
            if !vessel.name.to_lowercase().contains(&needle) {
                return false;
            }
        }

        if let Some(owner) = &self.owner {
            if vessel.owner.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }

        if let Some(min) = self.min_confidence {
            if vessel.record.confidence < min {
                return false;
            }
        }

        true
    }
}

/// A vessel row as returned by the repository
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVessel {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub imo: Option<String>,
    pub owner: Option<String>,
    pub record: FusedVesselRecord,
    pub updated_at: String,
}

/// Row counts across the repository
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepositorySummary {
    pub companies: u64,
    pub companies_with_website: u64,
    pub vessels: u64,
    pub vessels_with_imo: u64,
    pub media_items: u64,
    pub average_confidence: f64,
}

/// Natural key of a vessel: IMO if known, then (name, owner), then MMSI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum VesselKey {
    Imo(String),
    NameOwner(String, String),
    Mmsi(String),
}

impl VesselKey {
    pub(crate) fn of(record: &FusedVesselRecord) -> StorageResult<Self> {
        if let Some(imo) = record.imo().filter(|s| !s.is_empty()) {
            return Ok(Self::Imo(imo.to_string()));
        }

        if let Some(name) = record.vessel_name().filter(|s| !s.is_empty()) {
            return Ok(Self::NameOwner(
                name.to_string(),
                record.owner().unwrap_or_default().to_string(),
            ));
        }

        match record.text(Attribute::Mmsi).filter(|s| !s.is_empty()) {
            Some(mmsi) => Ok(Self::Mmsi(mmsi.to_string())),
            None => Err(StorageError::MissingNaturalKey),
        }
    }
}
