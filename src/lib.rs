//! Fleet-Sounding: vessel and company discovery from weak seeds
//!
//! This crate turns a roster of company names (and sometimes a vessel IMO
//! number) into structured vessel records. It probes company websites and a
//! registry of external maritime sources, then fuses the partial data each
//! source yields into one record with a confidence score.

pub mod config;
pub mod discovery;
pub mod events;
pub mod identifier;
pub mod output;
pub mod roster;
pub mod search;
pub mod sources;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Fleet-Sounding operations
#[derive(Debug, Error)]
pub enum SoundingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] identifier::IdentifierError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Roster error: {0}")]
    Roster(#[from] roster::RosterError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Fleet-Sounding operations
pub type Result<T> = std::result::Result<T, SoundingError>;

// Re-export commonly used types
pub use config::Config;
pub use discovery::{DiscoveryCoordinator, DiscoveryReport};
pub use identifier::{validate, Imo};
pub use roster::{CompanySeed, MemberClass};
pub use search::{
    CandidateAttributeSet, FusedVesselRecord, FusionEngine, ResultCache, SearchOptions,
    SearchOrchestrator,
};
pub use sources::{SourceDescriptor, SourcePerformanceTracker, SourceRegistry};
