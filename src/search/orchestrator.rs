use crate::config::SearchConfig;
use crate::discovery::fetch_source_page;
use crate::events::{ProgressEvent, ProgressLevel, ProgressSink};
use crate::identifier::Imo;
use crate::search::cache::{CacheKey, ResultCache, COMPREHENSIVE};
use crate::search::{
    Attribute, AttributeValue, CandidateAttributeSet, FusedVesselRecord, FusionEngine, SearchError,
};
use crate::sources::{
    SourceDescriptor, SourceError, SourceGroup, SourcePerformanceTracker, SourceRegistry,
};
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

/// Per-search switches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Query the photo group
    pub include_photos: bool,

    /// Keep live position and status attributes
    pub include_tracking: bool,

    /// Time budget for gathering; on expiry the partial record is returned
    pub deadline: Option<Duration>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_photos: true,
            include_tracking: true,
            deadline: None,
        }
    }
}

impl From<&SearchConfig> for SearchOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            include_photos: config.include_photos,
            include_tracking: config.include_tracking,
            deadline: Some(config.deadline()),
        }
    }
}

/// Sources of one search whose query has started but not been recorded
#[derive(Default)]
struct InFlight(std::sync::Mutex<HashMap<String, Instant>>);

impl InFlight {
    fn start(&self, source: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(source.to_string(), Instant::now());
    }

    fn finish(&self, source: &str) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(source);
    }

    /// Removes every pending source with the time it has run so far
    fn drain(&self) -> Vec<(String, Duration)> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(source, started)| (source, started.elapsed()))
            .collect()
    }
}

/// Fans an identifier out across ranked sources and fuses what they return
///
/// Groups are visited in priority order. Within a group, sources run
/// concurrently but each source is serialized against itself by a gate that
/// is held across the query and the pause that follows it.
pub struct SearchOrchestrator {
    client: Client,
    registry: Arc<SourceRegistry>,
    tracker: Arc<SourcePerformanceTracker>,
    cache: ResultCache,
    engine: FusionEngine,
    gates: HashMap<String, Arc<Mutex<()>>>,
    progress: Option<Arc<dyn ProgressSink>>,
    cache_ttl: Duration,
}

impl SearchOrchestrator {
    pub fn new(
        client: Client,
        registry: Arc<SourceRegistry>,
        tracker: Arc<SourcePerformanceTracker>,
        cache: ResultCache,
    ) -> Self {
        let gates = registry
            .iter()
            .map(|source| (source.name.clone(), Arc::new(Mutex::new(()))))
            .collect();
        let cache_ttl = cache.default_ttl();

        Self {
            client,
            registry,
            tracker,
            cache,
            engine: FusionEngine::new(),
            gates,
            progress: None,
            cache_ttl,
        }
    }

    pub fn with_engine(mut self, engine: FusionEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_progress(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(sink);
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn tracker(&self) -> &SourcePerformanceTracker {
        &self.tracker
    }

    /// Searches every applicable source for an identifier
    pub async fn search(
        &self,
        identifier: &str,
        options: &SearchOptions,
    ) -> Result<FusedVesselRecord, SearchError> {
        self.search_with_cancel(identifier, options, &CancellationToken::new())
            .await
    }

    /// Like `search`, abandoned with `SearchError::Cancelled` once `cancel` fires
    pub async fn search_with_cancel(
        &self,
        identifier: &str,
        options: &SearchOptions,
        cancel: &CancellationToken,
    ) -> Result<FusedVesselRecord, SearchError> {
        let imo = Imo::parse(identifier)
            .map_err(|_| SearchError::InvalidIdentifier(identifier.to_string()))?;

        let key = CacheKey::new(imo.as_str(), COMPREHENSIVE);
        if let Some(cached) = self.cache.get(&key)? {
            tracing::info!("Cache hit for IMO {}", imo);
            self.emit(
                ProgressLevel::Info,
                "cache",
                format!("Cache hit for IMO {}", imo),
                json!({"imo": imo.as_str()}),
            );
            return Ok(cached);
        }

        tracing::info!("Searching sources for IMO {}", imo);
        let mut record = FusedVesselRecord::new();
        record.seed(Attribute::Imo, AttributeValue::Text(imo.as_str().to_string()));

        let in_flight = InFlight::default();
        let gathering = async {
            match options.deadline {
                Some(limit) => {
                    tokio::time::timeout(limit, self.gather(&imo, options, &mut record, &in_flight))
                        .await
                        .is_ok()
                }
                None => {
                    self.gather(&imo, options, &mut record, &in_flight).await;
                    true
                }
            }
        };

        let complete = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Search for IMO {} cancelled", imo);
                return Err(SearchError::Cancelled);
            }
            complete = gathering => complete,
        };

        self.engine.finalize(&mut record, Utc::now());

        if complete {
            self.cache.put(&key, &record, self.cache_ttl)?;
            tracing::info!(
                "Search for IMO {} complete: {} sources, confidence {:.2}",
                imo,
                record.distinct_source_count(),
                record.confidence
            );
        } else {
            // Queries cut off by the deadline count as failed attempts
            for (source, latency) in in_flight.drain() {
                tracing::debug!("{} still pending at the deadline for IMO {}", source, imo);
                self.tracker.record(&source, false, latency);
            }
            tracing::warn!(
                "Search for IMO {} hit its deadline; returning partial record (not cached)",
                imo
            );
        }

        self.emit(
            ProgressLevel::Success,
            "search",
            format!("Fused record for IMO {}", imo),
            json!({
                "imo": imo.as_str(),
                "complete": complete,
                "confidence": record.confidence,
                "sources": record.sources,
            }),
        );

        Ok(record)
    }

    async fn gather(
        &self,
        imo: &Imo,
        options: &SearchOptions,
        record: &mut FusedVesselRecord,
        in_flight: &InFlight,
    ) {
        for group in SourceGroup::ORDER {
            if group == SourceGroup::Photo && !options.include_photos {
                continue;
            }

            let members = self.registry.in_group(group);
            let ranked: Vec<&SourceDescriptor> = self
                .tracker
                .rank(&members)
                .into_iter()
                .filter(|source| {
                    let skip = self.tracker.should_skip(&source.name);
                    if skip {
                        tracing::debug!("Skipping {}: low success rate, cooling down", source.name);
                    }
                    !skip
                })
                .collect();

            if ranked.is_empty() {
                continue;
            }

            tracing::debug!("Querying {} {} sources", ranked.len(), group.as_str());
            let results = join_all(
                ranked
                    .iter()
                    .map(|source| self.query_source(source, imo, in_flight)),
            )
            .await;

            // join_all keeps input order, so merges follow rank
            for mut candidate in results.into_iter().flatten() {
                candidate.truncate_list(Attribute::Photos, group.photo_cap());
                if !options.include_tracking {
                    strip_tracking(&mut candidate);
                }
                if !candidate.is_empty() {
                    self.engine.merge(record, candidate);
                }
            }
        }
    }

    /// Queries one source under its gate and records the outcome
    async fn query_source(
        &self,
        source: &SourceDescriptor,
        imo: &Imo,
        in_flight: &InFlight,
    ) -> Option<CandidateAttributeSet> {
        let gate = self
            .gates
            .get(&source.name)
            .cloned()
            .unwrap_or_else(|| Arc::new(Mutex::new(())));
        let _guard = gate.lock().await;

        in_flight.start(&source.name);
        let started = Instant::now();
        let outcome = self.fetch_candidate(source, imo).await;
        let latency = started.elapsed();
        in_flight.finish(&source.name);

        let candidate = match outcome {
            Ok(candidate) if !candidate.is_empty() => {
                tracing::debug!("{} returned {} attributes", source.name, candidate.attributes.len());
                self.tracker.record(&source.name, true, latency);
                self.emit(
                    ProgressLevel::Info,
                    "query",
                    format!("{} answered", source.name),
                    json!({"source": source.name, "attributes": candidate.attributes.len()}),
                );
                Some(candidate)
            }
            Ok(_) => {
                tracing::debug!("{} had no data for IMO {}", source.name, imo);
                self.tracker.record(&source.name, false, latency);
                None
            }
            Err(e) => {
                tracing::warn!("{} failed for IMO {}: {}", source.name, imo, e);
                self.tracker.record(&source.name, false, latency);
                self.emit(
                    ProgressLevel::Warning,
                    "query",
                    format!("{} failed: {}", source.name, e),
                    json!({"source": source.name}),
                );
                None
            }
        };

        if !source.min_interval.is_zero() {
            tokio::time::sleep(source.min_interval).await;
        }

        candidate
    }

    async fn fetch_candidate(
        &self,
        source: &SourceDescriptor,
        imo: &Imo,
    ) -> Result<CandidateAttributeSet, SourceError> {
        let url = source.query_url(imo)?;
        let body = fetch_source_page(&self.client, &url).await?;
        Ok(source.parser.parse(&body, &url, source))
    }

    fn emit(&self, level: ProgressLevel, operation: &str, message: String, details: serde_json::Value) {
        if let Some(sink) = &self.progress {
            sink.emit(ProgressEvent::new("search", operation, level, message).with_details(details));
        }
    }
}

fn strip_tracking(candidate: &mut CandidateAttributeSet) {
    for attribute in Attribute::ALL.iter().filter(|a| a.is_tracking()) {
        candidate.remove(*attribute);
    }
}
