//! Roster-driven vessel discovery
//!
//! This module handles discovery from company seeds:
//! - Resolving a working homepage for each company
//! - Finding fleet and vessel pages on that site
//! - Extracting candidate vessel records from those pages
//! - Coordinating batches of companies into stored, optionally enriched records

mod coordinator;
mod extractor;
mod fetcher;
pub(crate) mod html;
pub mod labels;
mod pages;
mod resolver;

pub use coordinator::{DiscoveryCoordinator, DiscoveryReport};
pub use extractor::{RecordExtractor, WEBSITE_RELIABILITY, WEBSITE_SOURCE};
pub use fetcher::{
    build_http_client, fetch_page, fetch_source_page, FetchResult, HttpProbe, UrlProbe,
};
pub use pages::{extract_fleet_links, PageDiscoverer, COMMON_PATHS, VESSEL_KEYWORDS};
pub use resolver::WebsiteResolver;
