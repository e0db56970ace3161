use crate::roster::MemberClass;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Fleet-Sounding
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub http: HttpConfig,
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub roster: Vec<RosterEntry>,
}

/// HTTP client identity and timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Name sent in the User-Agent header
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Timeout for page fetches and source queries (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for each website probe (seconds)
    #[serde(rename = "probe-timeout-secs", default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Roster discovery behavior
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Number of companies processed concurrently
    #[serde(rename = "batch-width", default = "default_batch_width")]
    pub batch_width: u32,

    /// Upper bound on fleet pages fetched per company
    #[serde(rename = "max-pages-per-company", default = "default_max_pages")]
    pub max_pages_per_company: u32,

    /// Enrich baseline records with a multi-source search when an IMO is known
    #[serde(default = "default_true")]
    pub enrich: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            batch_width: default_batch_width(),
            max_pages_per_company: default_max_pages(),
            enrich: true,
        }
    }
}

/// Multi-source search behavior
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(rename = "cache-ttl-hours", default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Time budget for one search across all sources (seconds)
    #[serde(rename = "deadline-secs", default = "default_deadline")]
    pub deadline_secs: u64,

    #[serde(rename = "include-photos", default = "default_true")]
    pub include_photos: bool,

    #[serde(rename = "include-tracking", default = "default_true")]
    pub include_tracking: bool,
}

impl SearchConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_hours * 3600)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            cache_ttl_hours: default_cache_ttl_hours(),
            deadline_secs: default_deadline(),
            include_photos: true,
            include_tracking: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A roster document to discover from
#[derive(Debug, Clone, Deserialize)]
pub struct RosterEntry {
    /// Path to the JSON roster document
    pub path: String,

    #[serde(rename = "member-class")]
    pub member_class: MemberClass,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_probe_timeout() -> u64 {
    10
}

fn default_batch_width() -> u32 {
    5
}

fn default_max_pages() -> u32 {
    10
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_deadline() -> u64 {
    120
}

fn default_true() -> bool {
    true
}
