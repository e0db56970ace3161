use fleet_sounding::config::HttpConfig;
use fleet_sounding::discovery::{build_http_client, DiscoveryCoordinator, HttpProbe};
use fleet_sounding::roster::{self, MemberClass};
use fleet_sounding::search::{Attribute, ResultCache, SearchOptions, SearchOrchestrator};
use fleet_sounding::sources::{
    SourceDescriptor, SourceGroup, SourceParser, SourcePerformanceTracker, SourceRegistry,
};
use fleet_sounding::storage::{MemoryStorage, RecordRepository, SqliteStorage, VesselFilter};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn http_config() -> HttpConfig {
    HttpConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: "https://example.com/contact".to_string(),
        contact_email: "test@example.com".to_string(),
        request_timeout_secs: 5,
        probe_timeout_secs: 2,
    }
}

const FLEET_PAGE: &str = r#"<html><body>
    <div class="fleet-list">
      <div class="vessel-card">
        <h3>SEA EAGLE</h3>
        <p>Type: Anchor Handling Tug Supply</p>
        <p>IMO No: 9074729</p>
        <img src="/img/sea-eagle.jpg">
      </div>
      <div class="vessel-card">
        <h3>BORNEO STAR</h3>
        <p>Built: 2012</p>
      </div>
    </div>
    </body></html>"#;

/// Mounts a company site: a homepage linking to one fleet page with two vessels
async fn mount_company_site(server: &MockServer) {
    mount_site_with_fleet_page(server, FLEET_PAGE).await;
}

async fn mount_site_with_fleet_page(server: &MockServer, fleet_html: &str) {
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><head><title>Acme Offshore</title></head><body>
            <nav><a href="/">Home</a><a href="/our-fleet">Our Fleet</a><a href="/contact">Contact</a></nav>
            <p>Offshore support since 1998.</p>
            </body></html>"#,
            "text/html",
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/our-fleet"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(fleet_html.to_string(), "text/html"))
        .mount(server)
        .await;
}

async fn mount_registry_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/registry/9074729"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<h1 class="vessel-name">SEA EAGLE</h1>
            <table><tr><td>Flag</td><td>Malaysia</td></tr><tr><td>Call Sign</td><td>9MAB1</td></tr></table>"#,
            "text/html",
        ))
        .mount(server)
        .await;
}

fn roster_text(server: &MockServer) -> String {
    format!(
        "**Acme Offshore Sdn Bhd**\nLot 5, Jalan Pelabuhan\nTel: 087-411 000\n[www.acme.example]({})\n",
        server.uri()
    )
}

#[tokio::test]
async fn test_discovery_from_roster_with_enrichment() {
    let server = MockServer::start().await;
    mount_company_site(&server).await;
    mount_registry_page(&server).await;

    let seeds = roster::parse(&roster_text(&server), MemberClass::Primary);
    assert_eq!(seeds.len(), 1);

    let client = build_http_client(&http_config()).expect("Failed to build client");
    let storage = Arc::new(MemoryStorage::new());

    let registry = SourceRegistry::new(
        "test",
        vec![SourceDescriptor::new(
            "Registry",
            SourceGroup::NationalRegistry,
            format!("{}/registry/{{imo}}", server.uri()),
            0.9,
        )
        .with_parser(SourceParser::DetailTable)],
    );
    let orchestrator = SearchOrchestrator::new(
        client.clone(),
        Arc::new(registry),
        Arc::new(SourcePerformanceTracker::new()),
        ResultCache::new(storage.clone()),
    );

    let probe = Arc::new(HttpProbe::new(client.clone(), Duration::from_secs(2)));
    let coordinator = DiscoveryCoordinator::new(client, probe, storage.clone())
        .with_enrichment(Arc::new(orchestrator), SearchOptions::default());

    let report = coordinator.run(seeds).await;

    assert_eq!(report.companies_processed, 1);
    assert_eq!(report.websites_found, 1);
    assert_eq!(report.pages_scanned, 1);
    assert_eq!(report.vessels_found, 2);
    assert_eq!(report.vessels_saved, 2);
    assert_eq!(report.vessels_enriched, 1);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);

    let summary = storage.summary().unwrap();
    assert_eq!(summary.companies, 1);
    assert_eq!(summary.companies_with_website, 1);
    assert_eq!(summary.vessels, 2);
    assert_eq!(summary.vessels_with_imo, 1);
    assert_eq!(summary.media_items, 1);

    let enriched = storage
        .query_vessels(&VesselFilter {
            imo: Some("9074729".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(enriched.len(), 1);
    let record = &enriched[0].record;
    assert_eq!(record.vessel_name(), Some("SEA EAGLE"));
    assert_eq!(record.text(Attribute::Flag), Some("Malaysia"));
    assert_eq!(record.owner(), Some("Acme Offshore Sdn Bhd"));
    assert_eq!(record.sources, vec!["Registry", "company_website"]);
    assert_eq!(
        record.photos(),
        &[format!("{}/img/sea-eagle.jpg", server.uri())]
    );

    let baseline = storage
        .query_vessels(&VesselFilter {
            name_contains: Some("borneo".to_string()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(baseline.len(), 1);
    assert_eq!(baseline[0].record.sources, vec!["company_website"]);
    assert!(baseline[0].imo.is_none());
}

#[tokio::test]
async fn test_discovery_without_enrichment_into_sqlite() {
    let server = MockServer::start().await;
    mount_company_site(&server).await;
    Mock::given(method("GET"))
        .and(path("/registry/9074729"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(
        SqliteStorage::new(&temp_dir.path().join("fleet.db")).expect("Failed to open DB"),
    );
    let client = build_http_client(&http_config()).expect("Failed to build client");
    let probe = Arc::new(HttpProbe::new(client.clone(), Duration::from_secs(2)));
    let coordinator = DiscoveryCoordinator::new(client, probe, storage.clone());

    let seeds = roster::parse(&roster_text(&server), MemberClass::Associate);
    let first = coordinator.run(seeds.clone()).await;
    assert_eq!(first.vessels_saved, 2);
    assert_eq!(first.vessels_enriched, 0);

    // A second run updates the same rows
    let second = coordinator.run(seeds).await;
    assert_eq!(second.vessels_saved, 2);

    let summary = storage.summary().unwrap();
    assert_eq!(summary.companies, 1);
    assert_eq!(summary.vessels, 2);
    assert_eq!(summary.media_items, 1);
}

#[tokio::test]
async fn test_vessels_known_only_by_mmsi_are_saved() {
    let server = MockServer::start().await;
    mount_site_with_fleet_page(
        &server,
        r#"<html><body>
        <p>Our tug is tracked as MMSI 533123456.</p>
        <p>Our barge is tracked as MMSI 533987654.</p>
        </body></html>"#,
    )
    .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let storage = Arc::new(
        SqliteStorage::new(&temp_dir.path().join("fleet.db")).expect("Failed to open DB"),
    );
    let client = build_http_client(&http_config()).expect("Failed to build client");
    let probe = Arc::new(HttpProbe::new(client.clone(), Duration::from_secs(2)));
    let coordinator = DiscoveryCoordinator::new(client, probe, storage.clone());

    let seeds = roster::parse(&roster_text(&server), MemberClass::Primary);
    let first = coordinator.run(seeds.clone()).await;
    assert_eq!(first.vessels_found, 2);
    assert_eq!(first.vessels_saved, 2);
    assert!(first.errors.is_empty(), "errors: {:?}", first.errors);

    let second = coordinator.run(seeds).await;
    assert!(second.errors.is_empty(), "errors: {:?}", second.errors);

    let vessels = storage.query_vessels(&VesselFilter::default()).unwrap();
    assert_eq!(vessels.len(), 2);
    assert!(vessels.iter().all(|v| v.imo.is_none()));
    assert!(vessels
        .iter()
        .any(|v| v.record.text(Attribute::Mmsi) == Some("533123456")));
}

#[tokio::test]
async fn test_shared_vessel_is_searched_once_across_companies() {
    let first_site = MockServer::start().await;
    let second_site = MockServer::start().await;
    mount_company_site(&first_site).await;
    mount_company_site(&second_site).await;

    let registry_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/registry/9074729"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    r#"<h1 class="vessel-name">SEA EAGLE</h1>
                    <table><tr><td>Flag</td><td>Malaysia</td></tr></table>"#,
                    "text/html",
                )
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&registry_server)
        .await;

    let roster_text = format!(
        "**Acme Offshore Sdn Bhd**\nTel: 087-411 000\n[www.acme.example]({})\n\
         **Borneo Tug Services**\nTel: 088-765 432\n[www.borneotug.example]({})\n",
        first_site.uri(),
        second_site.uri()
    );
    let seeds = roster::parse(&roster_text, MemberClass::Primary);
    assert_eq!(seeds.len(), 2);

    let client = build_http_client(&http_config()).expect("Failed to build client");
    let storage = Arc::new(MemoryStorage::new());
    let registry = SourceRegistry::new(
        "test",
        vec![SourceDescriptor::new(
            "Registry",
            SourceGroup::NationalRegistry,
            format!("{}/registry/{{imo}}", registry_server.uri()),
            0.9,
        )
        .with_parser(SourceParser::DetailTable)],
    );
    let orchestrator = SearchOrchestrator::new(
        client.clone(),
        Arc::new(registry),
        Arc::new(SourcePerformanceTracker::new()),
        ResultCache::new(storage.clone()),
    );

    let probe = Arc::new(HttpProbe::new(client.clone(), Duration::from_secs(2)));
    let coordinator = DiscoveryCoordinator::new(client, probe, storage.clone())
        .with_batch_width(2)
        .with_enrichment(Arc::new(orchestrator), SearchOptions::default());

    let report = coordinator.run(seeds).await;

    assert_eq!(report.companies_processed, 2);
    assert_eq!(report.vessels_enriched, 2);
    assert!(report.errors.is_empty(), "errors: {:?}", report.errors);

    // Mock expectations on the registry server are checked when it drops
    let received = registry_server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
}
