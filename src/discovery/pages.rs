use crate::discovery::html::{element_text, selector};
use crate::discovery::{fetch_page, FetchResult, UrlProbe};
use crate::url::{resolve_link, same_site};
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Words that mark a link as leading to fleet or vessel content
pub const VESSEL_KEYWORDS: [&str; 16] = [
    "vessel", "fleet", "ship", "boat", "offshore", "marine", "osv", "supply", "platform",
    "anchor", "tug", "barge", "workboat", "crew", "cargo", "charter",
];

/// Conventional fleet page paths probed when a homepage links to none
pub const COMMON_PATHS: [&str; 11] = [
    "/fleet",
    "/vessels",
    "/ships",
    "/marine",
    "/offshore",
    "/services/fleet",
    "/services/vessels",
    "/charter",
    "/fleet.html",
    "/vessels.html",
    "/marine.html",
];

fn has_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    VESSEL_KEYWORDS.iter().any(|k| lower.contains(k))
}

/// Enumerates fleet and vessel subpages of a company homepage
#[derive(Clone)]
pub struct PageDiscoverer {
    client: Client,
    probe: Arc<dyn UrlProbe>,
}

impl PageDiscoverer {
    pub fn new(client: Client, probe: Arc<dyn UrlProbe>) -> Self {
        Self { client, probe }
    }

    /// Returns same-site pages that look like fleet listings
    ///
    /// Links inside navigation containers come first, then the rest of the
    /// page in document order. A homepage that cannot be fetched yields an
    /// empty list.
    pub async fn discover_pages(&self, homepage: &Url) -> Vec<Url> {
        let (base, body) = match fetch_page(&self.client, homepage).await {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            other => {
                tracing::warn!(
                    "Failed to fetch homepage {}: {}",
                    homepage,
                    other.describe()
                );
                return Vec::new();
            }
        };

        let mut pages = extract_fleet_links(&body, &base);
        pages.retain(|page| page != homepage && page != &base);

        if pages.is_empty() {
            tracing::debug!("No fleet links on {}, probing common paths", base);
            pages = self.probe_common_paths(&base).await;
        }

        tracing::info!("Discovered {} fleet pages on {}", pages.len(), base);
        pages
    }

    async fn probe_common_paths(&self, base: &Url) -> Vec<Url> {
        let mut found = Vec::new();
        for path in COMMON_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };
            if self.probe.probe(&candidate).await {
                found.push(candidate);
            }
        }
        found
    }
}

/// Collects same-site keyword links from a page
///
/// Navigation containers (`nav`, `menu`, `ul`) are matched on anchor text;
/// any other anchor matches on its text or its href. Results are
/// de-duplicated with fragments removed.
pub fn extract_fleet_links(html: &str, base: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut links = Vec::new();

    if let (Some(nav_sel), Some(anchor_sel)) = (selector("nav, menu, ul"), selector("a[href]")) {
        for container in root.select(&nav_sel) {
            for anchor in container.select(&anchor_sel) {
                if has_keyword(&element_text(&anchor)) {
                    push_link(&anchor, base, &mut links);
                }
            }
        }
    }

    if let Some(anchor_sel) = selector("a[href]") {
        for anchor in root.select(&anchor_sel) {
            let href = anchor.value().attr("href").unwrap_or_default();
            if has_keyword(&format!("{} {}", element_text(&anchor), href)) {
                push_link(&anchor, base, &mut links);
            }
        }
    }

    let mut seen = HashSet::new();
    links.retain(|url: &Url| seen.insert(url.as_str().to_string()));
    links
}

fn push_link(anchor: &ElementRef<'_>, base: &Url, links: &mut Vec<Url>) {
    let Some(href) = anchor.value().attr("href") else {
        return;
    };

    match resolve_link(href, base) {
        Some(url) if same_site(&url, base) => links.push(url),
        Some(url) => tracing::debug!("Skipping off-site link {}", url),
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use crate::discovery::{build_http_client, HttpProbe};
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client() -> Client {
        build_http_client(&HttpConfig {
            crawler_name: "TestCrawler".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
            request_timeout_secs: 5,
            probe_timeout_secs: 2,
        })
        .unwrap()
    }

    fn discoverer() -> PageDiscoverer {
        let client = client();
        let probe = Arc::new(HttpProbe::new(client.clone(), Duration::from_secs(2)));
        PageDiscoverer::new(client, probe)
    }

    #[test]
    fn test_extract_fleet_links() {
        let base = Url::parse("http://acme.example/").unwrap();
        let html = r#"
            <p><a href="/about">About us</a></p>
            <p><a href="/our-fleet#tugs">Our Fleet</a></p>
            <p><a href="/services/osv-charter">Services</a></p>
            <p><a href="https://other.example/vessels">Partner vessels</a></p>
            <p><a href="/our-fleet">Fleet list</a></p>
            <nav><a href="/boats">Workboats</a></nav>
        "#;

        let links = extract_fleet_links(html, &base);
        let strs: Vec<_> = links.iter().map(|u| u.as_str()).collect();
        assert_eq!(
            strs,
            vec![
                "http://acme.example/boats",
                "http://acme.example/our-fleet",
                "http://acme.example/services/osv-charter",
            ]
        );
    }

    #[test]
    fn test_same_site_requires_matching_port() {
        let base = Url::parse("http://127.0.0.1:8080/").unwrap();
        let html = r#"<a href="http://127.0.0.1:9090/fleet">Fleet</a><a href="/fleet">Fleet</a>"#;

        let links = extract_fleet_links(html, &base);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].as_str(), "http://127.0.0.1:8080/fleet");
    }

    #[tokio::test]
    async fn test_discover_pages_from_links() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"<ul><li><a href="/fleet">Our Fleet</a></li><li><a href="/contact">Contact</a></li></ul>"#,
                "text/html",
            ))
            .mount(&server)
            .await;

        let homepage = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = discoverer().discover_pages(&homepage).await;

        assert_eq!(pages, vec![homepage.join("/fleet").unwrap()]);
    }

    #[tokio::test]
    async fn test_discover_pages_falls_back_to_common_paths() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<p>Welcome</p>", "text/html"),
            )
            .mount(&server)
            .await;
        for live in ["/vessels", "/charter"] {
            Mock::given(method("HEAD"))
                .and(path(live))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;
        }

        let homepage = Url::parse(&format!("{}/", server.uri())).unwrap();
        let pages = discoverer().discover_pages(&homepage).await;

        assert_eq!(
            pages,
            vec![
                homepage.join("/vessels").unwrap(),
                homepage.join("/charter").unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_homepage_failure_yields_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let homepage = Url::parse(&format!("{}/", server.uri())).unwrap();
        assert!(discoverer().discover_pages(&homepage).await.is_empty());
    }
}
