use crate::UrlError;
use url::Url;

/// Parses a website hint from a roster into an absolute HTTP(S) URL
///
/// Roster hints are often bare (`www.acme.com`), so a missing scheme is
/// filled with `http://`. The fragment is dropped.
///
/// # Examples
///
/// ```
/// use fleet_sounding::url::parse_hint;
///
/// let url = parse_hint("www.acme.com.my").unwrap();
/// assert_eq!(url.as_str(), "http://www.acme.com.my/");
/// ```
pub fn parse_hint(hint: &str) -> Result<Url, UrlError> {
    let hint = hint.trim();
    if hint.is_empty() {
        return Err(UrlError::Parse("empty website hint".to_string()));
    }

    let with_scheme = if hint.contains("://") {
        hint.to_string()
    } else {
        format!("http://{}", hint)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(UrlError::MissingHost);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Resolves a link href against a page URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Non-HTTP(S) URLs after resolution
///
/// The fragment of the resolved URL is removed so `/fleet#tugs` and
/// `/fleet` collapse to one page.
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut absolute = base_url.join(href).ok()?;
    if absolute.scheme() != "http" && absolute.scheme() != "https" {
        return None;
    }

    absolute.set_fragment(None);
    Some(absolute)
}
