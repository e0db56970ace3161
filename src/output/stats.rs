//! Statistics from the discovery database
//!
//! This module loads repository totals and per-source reliability from the
//! storage layer and prints them for `--stats`.

use crate::state::SourcePerformanceStat;
use crate::storage::{PerformanceStore, RecordRepository, RepositorySummary, StorageError};
use chrono::Utc;

/// Repository totals plus one row per tracked source
#[derive(Debug, Clone)]
pub struct DiscoveryStatistics {
    pub summary: RepositorySummary,

    /// Source name and statistics, sorted by name
    pub sources: Vec<(String, SourcePerformanceStat)>,
}

impl DiscoveryStatistics {
    /// Sources currently suppressed for low reliability
    pub fn suppressed_sources(&self) -> Vec<&str> {
        let now = Utc::now();
        self.sources
            .iter()
            .filter(|(_, stat)| stat.should_skip(now))
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Loads statistics from storage
pub fn load_statistics(
    repository: &dyn RecordRepository,
    performance: &dyn PerformanceStore,
) -> Result<DiscoveryStatistics, StorageError> {
    let summary = repository.summary()?;

    let mut sources = performance.load_all_stats()?;
    sources.sort_by(|a, b| a.0.cmp(&b.0));

    Ok(DiscoveryStatistics { summary, sources })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DiscoveryStatistics) {
    let summary = &stats.summary;

    println!("=== Discovery Statistics ===\n");

    println!("Companies:");
    println!("  Total: {}", summary.companies);
    println!(
        "  With website: {} ({:.1}%)",
        summary.companies_with_website,
        percentage(summary.companies_with_website, summary.companies)
    );
    println!();

    println!("Vessels:");
    println!("  Total: {}", summary.vessels);
    println!(
        "  With IMO: {} ({:.1}%)",
        summary.vessels_with_imo,
        percentage(summary.vessels_with_imo, summary.vessels)
    );
    println!("  Media items: {}", summary.media_items);
    println!("  Average confidence: {:.2}", summary.average_confidence);
    println!();

    if stats.sources.is_empty() {
        println!("No source has been queried yet");
        return;
    }

    println!("Source Performance ({}):", stats.sources.len());
    println!(
        "  {:<24} {:>8} {:>9} {:>8} {:>11}",
        "Source", "Attempts", "Successes", "Rate", "Latency (s)"
    );
    for (name, stat) in &stats.sources {
        let rate = stat
            .success_rate()
            .map(|r| format!("{:.0}%", r * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<24} {:>8} {:>9} {:>8} {:>11.2}",
            name, stat.attempts, stat.successes, rate, stat.avg_latency_secs
        );
    }

    let suppressed = stats.suppressed_sources();
    if !suppressed.is_empty() {
        println!();
        println!("Suppressed Sources ({}):", suppressed.len());
        for name in suppressed {
            println!("  - {}", name);
        }
    }
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{CompanySeed, MemberClass};
    use crate::storage::MemoryStorage;

    #[test]
    fn test_load_statistics() {
        let storage = MemoryStorage::new();
        let seed = CompanySeed {
            name: "Acme Marine".to_string(),
            address: String::new(),
            phone: String::new(),
            fax: None,
            website_hint: None,
            email: None,
            member_class: MemberClass::Primary,
        };
        storage.upsert_company(&seed, Some("https://acme.example/")).unwrap();

        let now = Utc::now();
        let mut failing = SourcePerformanceStat::new();
        for _ in 0..6 {
            failing.record_attempt(false, 1.0, now);
        }
        let mut healthy = SourcePerformanceStat::new();
        healthy.record_attempt(true, 0.5, now);
        storage.save_stat("Zeta", &healthy).unwrap();
        storage.save_stat("Alpha", &failing).unwrap();

        let stats = load_statistics(&storage, &storage).unwrap();
        assert_eq!(stats.summary.companies, 1);
        assert_eq!(stats.summary.companies_with_website, 1);

        let names: Vec<_> = stats.sources.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
        assert_eq!(stats.suppressed_sources(), vec!["Alpha"]);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 4), 25.0);
        assert_eq!(percentage(3, 0), 0.0);
    }
}
