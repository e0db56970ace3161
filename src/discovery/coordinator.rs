//! Discovery coordinator - roster batch orchestration
//!
//! Each company seed runs through the same pipeline:
//! - Resolve a homepage and record the company
//! - Discover fleet pages and extract vessel candidates from them
//! - Build a baseline record per vessel, enriched by a multi-source search
//!   when the vessel carries an IMO number
//! - Store the vessel and its media
//!
//! Companies run concurrently up to the batch width. A failure for one
//! company is counted in the report and never aborts the batch.

use crate::config::Config;
use crate::discovery::extractor::dedupe_key;
use crate::discovery::{
    fetch_page, FetchResult, HttpProbe, PageDiscoverer, RecordExtractor, UrlProbe,
    WebsiteResolver,
};
use crate::events::{ProgressEvent, ProgressLevel, ProgressSink};
use crate::roster::CompanySeed;
use crate::search::{
    Attribute, CandidateAttributeSet, FusedVesselRecord, FusionEngine, SearchError, SearchOptions,
    SearchOrchestrator,
};
use crate::storage::{MediaItem, MediaKind, RecordRepository};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const DEFAULT_BATCH_WIDTH: usize = 5;
const DEFAULT_MAX_PAGES: usize = 10;

/// Source label stored with media taken from a fused record
const MEDIA_SOURCE: &str = "fusion";

/// Totals for one discovery run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub companies_processed: usize,
    pub websites_found: usize,
    pub pages_scanned: usize,
    pub vessels_found: usize,
    pub vessels_saved: usize,
    pub vessels_enriched: usize,
    pub errors: Vec<String>,
}

impl DiscoveryReport {
    fn absorb(&mut self, other: DiscoveryReport) {
        self.companies_processed += other.companies_processed;
        self.websites_found += other.websites_found;
        self.pages_scanned += other.pages_scanned;
        self.vessels_found += other.vessels_found;
        self.vessels_saved += other.vessels_saved;
        self.vessels_enriched += other.vessels_enriched;
        self.errors.extend(other.errors);
    }
}

/// Everything one company task needs; cheap to clone
#[derive(Clone)]
struct Pipeline {
    client: Client,
    resolver: WebsiteResolver,
    pages: PageDiscoverer,
    extractor: RecordExtractor,
    engine: FusionEngine,
    repository: Arc<dyn RecordRepository>,
    search: Option<Arc<SearchOrchestrator>>,
    search_options: SearchOptions,
    max_pages: usize,
    progress: Option<Arc<dyn ProgressSink>>,
    cancel: CancellationToken,

    /// One lock per IMO so companies listing the same vessel search it once
    enrich_locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

/// Runs roster discovery over batches of company seeds
pub struct DiscoveryCoordinator {
    pipeline: Pipeline,
    batch_width: usize,
}

impl DiscoveryCoordinator {
    /// Creates a coordinator with default batch width and page limit and no enrichment
    pub fn new(
        client: Client,
        probe: Arc<dyn UrlProbe>,
        repository: Arc<dyn RecordRepository>,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                resolver: WebsiteResolver::new(probe.clone()),
                pages: PageDiscoverer::new(client.clone(), probe),
                client,
                extractor: RecordExtractor::new(),
                engine: FusionEngine::new(),
                repository,
                search: None,
                search_options: SearchOptions::default(),
                max_pages: DEFAULT_MAX_PAGES,
                progress: None,
                cancel: CancellationToken::new(),
                enrich_locks: Arc::new(Mutex::new(HashMap::new())),
            },
            batch_width: DEFAULT_BATCH_WIDTH,
        }
    }

    /// Creates a coordinator probing over HTTP with the configured limits
    pub fn from_config(
        config: &Config,
        client: Client,
        repository: Arc<dyn RecordRepository>,
    ) -> Self {
        let probe = Arc::new(HttpProbe::new(client.clone(), config.http.probe_timeout()));
        Self::new(client, probe, repository)
            .with_batch_width(config.discovery.batch_width as usize)
            .with_max_pages(config.discovery.max_pages_per_company as usize)
    }

    pub fn with_batch_width(mut self, batch_width: usize) -> Self {
        self.batch_width = batch_width.max(1);
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.pipeline.max_pages = max_pages;
        self
    }

    /// Enriches vessels that carry an IMO number with a multi-source search
    pub fn with_enrichment(mut self, search: Arc<SearchOrchestrator>, options: SearchOptions) -> Self {
        self.pipeline.search = Some(search);
        self.pipeline.search_options = options;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.pipeline.progress = Some(sink);
        self
    }

    /// Token that stops the run: queued companies are skipped and running
    /// searches are abandoned
    pub fn cancel_token(&self) -> CancellationToken {
        self.pipeline.cancel.clone()
    }

    /// Processes every seed and returns the combined report
    pub async fn run(&self, seeds: Vec<CompanySeed>) -> DiscoveryReport {
        tracing::info!(
            "Starting discovery for {} companies (batch width {})",
            seeds.len(),
            self.batch_width
        );

        let pipeline = Arc::new(self.pipeline.clone());
        let permits = Arc::new(Semaphore::new(self.batch_width));
        let mut tasks = JoinSet::new();

        for seed in seeds {
            let pipeline = pipeline.clone();
            let permits = permits.clone();
            tasks.spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return DiscoveryReport::default();
                };
                if pipeline.cancel.is_cancelled() {
                    return DiscoveryReport::default();
                }
                pipeline.process_company(&seed).await
            });
        }

        let mut report = DiscoveryReport::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(company_report) => report.absorb(company_report),
                Err(e) => {
                    tracing::error!("Discovery task failed: {}", e);
                    report.errors.push(format!("task failed: {}", e));
                }
            }
        }

        tracing::info!(
            "Discovery complete: {} companies, {} websites, {} pages, {} vessels found, {} saved, {} enriched, {} errors",
            report.companies_processed,
            report.websites_found,
            report.pages_scanned,
            report.vessels_found,
            report.vessels_saved,
            report.vessels_enriched,
            report.errors.len()
        );

        if let Some(sink) = &self.pipeline.progress {
            let details = serde_json::to_value(&report).unwrap_or_default();
            sink.emit(
                ProgressEvent::new("discovery", "run", ProgressLevel::Success, "Discovery complete")
                    .with_details(details),
            );
        }

        report
    }
}

impl Pipeline {
    async fn process_company(&self, seed: &CompanySeed) -> DiscoveryReport {
        let mut report = DiscoveryReport {
            companies_processed: 1,
            ..Default::default()
        };
        tracing::info!("Processing company: {}", seed.name);

        let website = self.resolver.resolve(seed).await;
        if website.is_some() {
            report.websites_found = 1;
        }

        let company_id = match self
            .repository
            .upsert_company(seed, website.as_ref().map(|u| u.as_str()))
        {
            Ok(id) => id,
            Err(e) => {
                tracing::error!("Failed to save company {}: {}", seed.name, e);
                report.errors.push(format!("{}: {}", seed.name, e));
                return report;
            }
        };

        let Some(website) = website else {
            self.emit(ProgressLevel::Warning, seed, "No website found", json!({}));
            return report;
        };

        let mut pages = self.pages.discover_pages(&website).await;
        pages.truncate(self.max_pages);

        let mut candidates = Vec::new();
        for page in &pages {
            match fetch_page(&self.client, page).await {
                FetchResult::Success {
                    final_url, body, ..
                } => {
                    report.pages_scanned += 1;
                    candidates.extend(self.extractor.extract(&body, &seed.name, &final_url));
                }
                other => {
                    tracing::warn!("Failed to fetch {}: {}", page, other.describe());
                }
            }
        }

        let candidates = dedupe_across_pages(candidates);
        report.vessels_found = candidates.len();

        for candidate in candidates {
            if self.cancel.is_cancelled() {
                break;
            }

            let (record, enriched) = self.build_record(candidate).await;
            if enriched {
                report.vessels_enriched += 1;
            }

            match self.save_vessel(company_id, &record) {
                Ok(()) => report.vessels_saved += 1,
                Err(e) => {
                    let name = record.vessel_name().unwrap_or("unnamed vessel");
                    tracing::error!("Failed to save {} for {}: {}", name, seed.name, e);
                    report.errors.push(format!("{} / {}: {}", seed.name, name, e));
                }
            }
        }

        self.emit(
            ProgressLevel::Info,
            seed,
            "Company processed",
            json!({
                "website": website.as_str(),
                "pages": report.pages_scanned,
                "vessels": report.vessels_saved,
            }),
        );

        report
    }

    /// Baseline record from one candidate, enriched when possible
    async fn build_record(&self, candidate: CandidateAttributeSet) -> (FusedVesselRecord, bool) {
        let imo = candidate
            .text(Attribute::Imo)
            .filter(|imo| crate::identifier::validate(imo))
            .map(String::from);

        if let (Some(search), Some(imo)) = (&self.search, imo) {
            // Later holders of the lock find the first result in the cache
            let lock = self.enrichment_lock(&imo);
            let _guard = lock.lock().await;

            match search
                .search_with_cancel(&imo, &self.search_options, &self.cancel)
                .await
            {
                Ok(mut record) => {
                    self.engine.merge(&mut record, candidate);
                    self.engine.finalize(&mut record, Utc::now());
                    return (record, true);
                }
                Err(SearchError::Cancelled) => {
                    tracing::info!("Enrichment of IMO {} cancelled", imo);
                }
                Err(e) => {
                    tracing::warn!("Enrichment of IMO {} failed: {}", imo, e);
                }
            }
        }

        let mut record = FusedVesselRecord::new();
        self.engine.merge(&mut record, candidate);
        self.engine.finalize(&mut record, Utc::now());
        (record, false)
    }

    fn enrichment_lock(&self, imo: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.enrich_locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(imo.to_string())
            .or_default()
            .clone()
    }

    fn save_vessel(
        &self,
        company_id: i64,
        record: &FusedVesselRecord,
    ) -> Result<(), crate::storage::StorageError> {
        let vessel_id = self.repository.upsert_vessel(Some(company_id), record)?;

        let media = record
            .photos()
            .iter()
            .map(|url| MediaItem::photo(url.as_str(), MEDIA_SOURCE))
            .chain(record.documents().iter().map(|url| MediaItem {
                kind: MediaKind::Document,
                url: url.clone(),
                source: MEDIA_SOURCE.to_string(),
            }));

        for item in media {
            self.repository.insert_media(vessel_id, &item)?;
        }

        Ok(())
    }

    fn emit(&self, level: ProgressLevel, seed: &CompanySeed, message: &str, mut details: serde_json::Value) {
        let Some(sink) = &self.progress else {
            return;
        };
        if let Some(map) = details.as_object_mut() {
            map.insert("company".to_string(), json!(seed.name));
        }
        sink.emit(ProgressEvent::new("discovery", "company", level, message).with_details(details));
    }
}

/// Collapses candidates repeated across pages by name, IMO and MMSI
fn dedupe_across_pages(candidates: Vec<CandidateAttributeSet>) -> Vec<CandidateAttributeSet> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(dedupe_key(c)))
        .collect()
}
