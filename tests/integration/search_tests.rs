use fleet_sounding::config::HttpConfig;
use fleet_sounding::discovery::build_http_client;
use fleet_sounding::output::load_statistics;
use fleet_sounding::search::{Attribute, ResultCache, SearchError, SearchOptions, SearchOrchestrator};
use fleet_sounding::sources::{
    SourceDescriptor, SourceGroup, SourceParser, SourcePerformanceTracker, SourceRegistry,
};
use fleet_sounding::storage::SqliteStorage;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IMO: &str = "9074729";

fn registry(server: &MockServer) -> Arc<SourceRegistry> {
    let source = |name: &str, group, prior, parser| {
        SourceDescriptor::new(
            name,
            group,
            format!("{}/{}/{{imo}}", server.uri(), name.to_lowercase()),
            prior,
        )
        .with_parser(parser)
    };

    Arc::new(SourceRegistry::new(
        "test",
        vec![
            source("Tracker", SourceGroup::IdentityTracking, 0.9, SourceParser::DetailTable),
            source("Classifier", SourceGroup::Classification, 0.8, SourceParser::DetailTable),
            source("Gallery", SourceGroup::Photo, 0.7, SourceParser::PhotoGallery),
        ],
    ))
}

fn orchestrator(server: &MockServer, storage: Arc<SqliteStorage>) -> SearchOrchestrator {
    let client = build_http_client(&HttpConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        request_timeout_secs: 5,
        probe_timeout_secs: 2,
    })
    .expect("Failed to build client");

    SearchOrchestrator::new(
        client,
        registry(server),
        Arc::new(SourcePerformanceTracker::with_store(storage.clone())),
        ResultCache::new(storage),
    )
}

async fn mount(server: &MockServer, route: &str, status: u16, html: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_raw(html.to_string(), "text/html"))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_search_across_groups_persists_cache_and_stats() {
    let server = MockServer::start().await;
    mount(
        &server,
        "/tracker/9074729",
        200,
        r#"<h1 class="vessel-name">SEA EAGLE</h1>
        <table><tr><td>MMSI</td><td>533123456</td></tr><tr><td>Flag</td><td>Malaysia</td></tr></table>"#,
    )
    .await;
    mount(&server, "/classifier/9074729", 503, "unavailable").await;
    mount(
        &server,
        "/gallery/9074729",
        200,
        r#"<div class="photo-item"><img src="/p/1.jpg"></div><div class="photo-item"><img src="/p/2.jpg"></div>"#,
    )
    .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("fleet.db");
    let storage = Arc::new(SqliteStorage::new(&db_path).expect("Failed to open DB"));

    let record = orchestrator(&server, storage.clone())
        .search(IMO, &SearchOptions::default())
        .await
        .expect("Search failed");

    assert_eq!(record.imo(), Some(IMO));
    assert_eq!(record.vessel_name(), Some("SEA EAGLE"));
    assert_eq!(record.text(Attribute::Mmsi), Some("533123456"));
    assert!(record.sources.contains(&"Tracker".to_string()));
    assert!(!record.sources.contains(&"Classifier".to_string()));
    assert_eq!(record.photos().len(), 2);
    assert!(record.confidence > 0.0);

    // Statistics survive into a fresh tracker over the same database
    let stats = load_statistics(storage.as_ref(), storage.as_ref()).expect("Failed to load stats");
    let classifier = stats
        .sources
        .iter()
        .find(|(name, _)| name == "Classifier")
        .map(|(_, stat)| stat.clone())
        .expect("Classifier stats missing");
    assert_eq!(classifier.attempts, 1);
    assert_eq!(classifier.successes, 0);

    // Reopening the database serves the record from the cache
    drop(storage);
    server.reset().await;
    let reopened = Arc::new(SqliteStorage::new(&db_path).expect("Failed to reopen DB"));
    let cached = orchestrator(&server, reopened)
        .search(IMO, &SearchOptions::default())
        .await
        .expect("Cached search failed");
    assert_eq!(cached.attributes, record.attributes);
    assert_eq!(cached.sources, record.sources);
}

#[tokio::test]
async fn test_invalid_identifier_is_rejected() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(SqliteStorage::new(&temp_dir.path().join("fleet.db")).unwrap());

    let result = orchestrator(&server, storage)
        .search("IMO 1234568", &SearchOptions::default())
        .await;

    assert!(matches!(result, Err(SearchError::InvalidIdentifier(_))));
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}
