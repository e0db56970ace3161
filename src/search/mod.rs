//! Multi-source vessel search
//!
//! - `fusion`: attribute model, candidate sets and the `FusionEngine`
//! - `cache`: TTL-bounded cache of fused records
//! - `orchestrator`: ranked, rate-limited fan-out across registry sources

pub mod cache;
pub mod fusion;
mod orchestrator;

pub use cache::{CacheKey, ResultCache};
pub use fusion::{
    confidence_score, Attribute, AttributeValue, CandidateAttributeSet, ConflictPolicy,
    FusedVesselRecord, FusionEngine, ListPolicy, Provenance, ValueKind,
};
pub use orchestrator::{SearchOptions, SearchOrchestrator};

use crate::storage::StorageError;
use thiserror::Error;

/// Errors that end a search
///
/// Failures of individual sources are not errors here; they are recorded
/// against the source and the search continues without it.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid IMO number: {0}")]
    InvalidIdentifier(String),

    #[error("Result cache unavailable: {0}")]
    Cache(#[from] StorageError),

    #[error("Search cancelled")]
    Cancelled,
}
