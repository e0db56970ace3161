use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Top-level domains tried for name-derived guesses, in order
const GUESS_SUFFIXES: [&str; 2] = [".com", ".com.my"];

fn non_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\w]+").unwrap())
}

/// Lowercases a company name and removes every non-word character
///
/// ```
/// use fleet_sounding::url::clean_company_name;
///
/// assert_eq!(clean_company_name("Alam Maritim (M) Sdn. Bhd."), "alammaritimmsdnbhd");
/// ```
pub fn clean_company_name(name: &str) -> String {
    non_word_re().replace_all(&name.to_lowercase(), "").into_owned()
}

/// Generates variations of a hinted URL
///
/// The scheme is swapped between http and https, a leading `www.` is toggled,
/// and both changes are combined. The hint itself is not included.
pub fn hint_variations(hint: &Url) -> Vec<Url> {
    let mut variations = Vec::new();

    let swapped = swap_scheme(hint);
    let toggled = toggle_www(hint);
    let both = swapped.as_ref().and_then(toggle_www);

    for candidate in [swapped, toggled, both].into_iter().flatten() {
        variations.push(candidate);
    }

    variations
}

/// Generates domain guesses from a company name
///
/// Each suffix is tried with and without `www.`, over http then https.
/// Returns an empty list if the cleaned name is empty.
pub fn name_domain_guesses(company_name: &str) -> Vec<Url> {
    let clean = clean_company_name(company_name);
    if clean.is_empty() {
        return Vec::new();
    }

    let mut guesses = Vec::new();
    for suffix in GUESS_SUFFIXES {
        for www in ["www.", ""] {
            for scheme in ["http", "https"] {
                let candidate = format!("{}://{}{}{}/", scheme, www, clean, suffix);
                if let Ok(url) = Url::parse(&candidate) {
                    guesses.push(url);
                }
            }
        }
    }

    guesses
}

fn swap_scheme(url: &Url) -> Option<Url> {
    let target = match url.scheme() {
        "http" => "https",
        "https" => "http",
        _ => return None,
    };

    // set_scheme refuses some special-scheme transitions, so rebuild instead
    let rest = url.as_str().split_once("://")?.1;
    Url::parse(&format!("{}://{}", target, rest)).ok()
}

fn toggle_www(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let new_host = match host.strip_prefix("www.") {
        Some(bare) if !bare.is_empty() => bare.to_string(),
        Some(_) => return None,
        None => format!("www.{}", host),
    };

    let mut toggled = url.clone();
    toggled.set_host(Some(&new_host)).ok()?;
    Some(toggled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(urls: &[Url]) -> Vec<&str> {
        urls.iter().map(|u| u.as_str()).collect()
    }

    #[test]
    fn test_clean_company_name() {
        assert_eq!(clean_company_name("Icon Offshore Berhad"), "iconoffshoreberhad");
        assert_eq!(clean_company_name("  "), "");
    }

    #[test]
    fn test_hint_variations_http_bare() {
        let hint = Url::parse("http://old.example.com/").unwrap();
        let variations = hint_variations(&hint);
        assert_eq!(
            strs(&variations),
            vec![
                "https://old.example.com/",
                "http://www.old.example.com/",
                "https://www.old.example.com/",
            ]
        );
    }

    #[test]
    fn test_hint_variations_https_www() {
        let hint = Url::parse("https://www.acme.com.my/home").unwrap();
        let variations = hint_variations(&hint);
        assert_eq!(
            strs(&variations),
            vec![
                "http://www.acme.com.my/home",
                "https://acme.com.my/home",
                "http://acme.com.my/home",
            ]
        );
    }

    #[test]
    fn test_hint_variations_keep_port() {
        let hint = Url::parse("http://127.0.0.1:9000/").unwrap();
        let variations = hint_variations(&hint);
        assert_eq!(variations[0].as_str(), "https://127.0.0.1:9000/");
    }

    #[test]
    fn test_name_domain_guesses_order() {
        let guesses = name_domain_guesses("Acme Marine");
        assert_eq!(
            strs(&guesses),
            vec![
                "http://www.acmemarine.com/",
                "https://www.acmemarine.com/",
                "http://acmemarine.com/",
                "https://acmemarine.com/",
                "http://www.acmemarine.com.my/",
                "https://www.acmemarine.com.my/",
                "http://acmemarine.com.my/",
                "https://acmemarine.com.my/",
            ]
        );
    }

    #[test]
    fn test_name_domain_guesses_empty_name() {
        assert!(name_domain_guesses("&&&").is_empty());
    }
}
