use crate::discovery::UrlProbe;
use crate::roster::CompanySeed;
use crate::url::{hint_variations, name_domain_guesses, parse_hint};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

/// Finds one working homepage for a company seed
///
/// Candidates are probed one at a time in a fixed order and the first that
/// answers HTTP 200 wins: the hinted URL, its variations, then guesses
/// derived from the company name.
#[derive(Clone)]
pub struct WebsiteResolver {
    probe: Arc<dyn UrlProbe>,
}

impl WebsiteResolver {
    pub fn new(probe: Arc<dyn UrlProbe>) -> Self {
        Self { probe }
    }

    /// Ordered, de-duplicated list of URLs to try for a seed
    pub fn candidates(seed: &CompanySeed) -> Vec<Url> {
        let mut ordered = Vec::new();

        if let Some(hint) = seed.website_hint.as_deref() {
            match parse_hint(hint) {
                Ok(url) => {
                    let variations = hint_variations(&url);
                    ordered.push(url);
                    ordered.extend(variations);
                }
                Err(e) => {
                    tracing::debug!("Ignoring website hint '{}' for {}: {}", hint, seed.name, e);
                }
            }
        }

        ordered.extend(name_domain_guesses(&seed.name));

        let mut seen = HashSet::new();
        ordered.retain(|url| seen.insert(url.as_str().to_string()));
        ordered
    }

    /// Returns the first candidate that answers, or None
    pub async fn resolve(&self, seed: &CompanySeed) -> Option<Url> {
        for candidate in Self::candidates(seed) {
            if self.probe.probe(&candidate).await {
                tracing::info!("Resolved website for {}: {}", seed.name, candidate);
                return Some(candidate);
            }
            tracing::debug!("No answer from {} for {}", candidate, seed.name);
        }

        tracing::info!("No website found for {}", seed.name);
        None
    }
}
