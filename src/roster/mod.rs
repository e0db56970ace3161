//! Roster parsing into company seeds
//!
//! A roster document is a JSON object whose `markdown` field holds free text
//! made of company blocks. Each block starts with a bolded company name
//! (`**Acme Sdn Bhd**`) followed by contact lines.

mod parser;

pub use parser::{parse, parse_document};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading a roster document
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("Failed to read roster: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roster is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Roster document has no 'markdown' text field")]
    MissingText,
}

/// Membership class of a company on the roster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MemberClass {
    Primary,
    Associate,
}

impl MemberClass {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Associate => "associate",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "primary" => Some(Self::Primary),
            "associate" => Some(Self::Associate),
            _ => None,
        }
    }
}

/// A company parsed from the roster; the starting point for discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySeed {
    pub name: String,
    pub address: String,
    /// Empty when the block has no `Tel` line
    pub phone: String,
    pub fax: Option<String>,
    pub website_hint: Option<String>,
    pub email: Option<String>,
    pub member_class: MemberClass,
}
