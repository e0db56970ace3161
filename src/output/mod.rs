//! Output module for reports and summaries
//!
//! This module handles:
//! - Printing the report of a discovery run
//! - Printing a fused vessel record from a single search
//! - Loading and printing repository statistics

pub mod stats;

pub use stats::{load_statistics, print_statistics, DiscoveryStatistics};

use crate::discovery::DiscoveryReport;
use crate::search::FusedVesselRecord;

/// Prints the totals of a discovery run
pub fn print_report(report: &DiscoveryReport) {
    println!("=== Discovery Report ===\n");
    println!("  Companies processed: {}", report.companies_processed);
    println!("  Websites found: {}", report.websites_found);
    println!("  Pages scanned: {}", report.pages_scanned);
    println!("  Vessels found: {}", report.vessels_found);
    println!("  Vessels saved: {}", report.vessels_saved);
    println!("  Vessels enriched: {}", report.vessels_enriched);

    if !report.errors.is_empty() {
        println!("\nErrors ({}):", report.errors.len());
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
}

/// Prints every attribute of a fused record with the source that supplied it
pub fn print_record(record: &FusedVesselRecord) {
    println!(
        "=== {} ===\n",
        record.vessel_name().unwrap_or("Unnamed vessel")
    );

    for (attribute, value) in &record.attributes {
        let shown = match value.as_list() {
            Some(items) => items.join(", "),
            None => value
                .as_text()
                .map(String::from)
                .or_else(|| value.as_integer().map(|n| n.to_string()))
                .or_else(|| value.as_number().map(|n| format!("{:.2}", n)))
                .unwrap_or_default(),
        };

        match record.provenance.get(attribute) {
            Some(origin) => println!("  {}: {} [{}]", attribute.as_str(), shown, origin.source),
            None => println!("  {}: {}", attribute.as_str(), shown),
        }
    }

    println!();
    println!("  Sources: {}", record.sources.join(", "));
    println!("  Confidence: {:.2}", record.confidence);
    if let Some(fused_at) = record.fused_at {
        println!("  Fused at: {}", fused_at.to_rfc3339());
    }
}
