use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// If the URL has no host (which shouldn't happen for valid HTTP(S) URLs), it returns None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fleet_sounding::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the network location of a URL: lowercase host plus explicit port
///
/// Default ports are omitted by the `url` crate, so `http://a.com:80/` and
/// `http://a.com/` have the same network location.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use fleet_sounding::url::netloc;
///
/// let url = Url::parse("http://127.0.0.1:8080/fleet").unwrap();
/// assert_eq!(netloc(&url), Some("127.0.0.1:8080".to_string()));
/// ```
pub fn netloc(url: &Url) -> Option<String> {
    let host = extract_domain(url)?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

/// Returns true if both URLs share a network location
pub fn same_site(a: &Url, b: &Url) -> bool {
    match (netloc(a), netloc(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_subdomain() {
        let url = Url::parse("https://blog.example.com/post").unwrap();
        assert_eq!(extract_domain(&url), Some("blog.example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_netloc_includes_port() {
        let url = Url::parse("https://Example.com:8080/").unwrap();
        assert_eq!(netloc(&url), Some("example.com:8080".to_string()));
    }

    #[test]
    fn test_netloc_omits_default_port() {
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(netloc(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_same_site() {
        let home = Url::parse("https://acme.com/").unwrap();
        let fleet = Url::parse("https://ACME.com/fleet?x=1").unwrap();
        let other = Url::parse("https://other.com/fleet").unwrap();
        let sub = Url::parse("https://www.acme.com/fleet").unwrap();

        assert!(same_site(&home, &fleet));
        assert!(!same_site(&home, &other));
        assert!(!same_site(&home, &sub));
    }

    #[test]
    fn test_same_site_port_matters() {
        let a = Url::parse("http://127.0.0.1:8000/").unwrap();
        let b = Url::parse("http://127.0.0.1:9000/").unwrap();
        assert!(!same_site(&a, &b));
    }
}
