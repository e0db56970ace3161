//! External vessel data sources
//!
//! - `SourceRegistry`: versioned catalog of `SourceDescriptor`s grouped by capability
//! - `SourceParser`: per-layout page parsers attached to each descriptor
//! - `SourcePerformanceTracker`: reliability statistics used to rank and suppress sources

mod parsers;
mod performance;
mod registry;

pub use parsers::SourceParser;
pub(crate) use parsers::{read_definition_list, read_label_value_spans, read_table_rows};
pub use performance::SourcePerformanceTracker;
pub use registry::{
    Capabilities, SourceDescriptor, SourceGroup, SourceRegistry, IMO_PLACEHOLDER,
    REGISTRY_VERSION,
};

use thiserror::Error;

/// Transient failures of a single source query
///
/// These are recorded as failed attempts and never propagated out of a search.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Invalid query URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_connect() {
            Self::Connect(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Body(e.to_string())
        }
    }
}
