use crate::roster::{CompanySeed, MemberClass, RosterError};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*\*([^*]+?)\*\*").unwrap())
}

fn contact_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:tel(?:ephone)?|phone|fax)\s*(?:no\.?)?\s*[:.]?\s*").unwrap()
    })
}

fn markdown_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap())
}

fn bare_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(www\.[^\s)\]]+|https?://[^\s)\]]+)").unwrap())
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\w.+-]+@[\w.-]+\.\w+").unwrap())
}

fn contact_word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:tel|fax)\b|www\.|http").unwrap())
}

/// Line classes in priority order; the first match wins
#[derive(Debug, PartialEq)]
enum LineKind {
    Phone,
    Fax,
    Website,
    Email,
    Address,
    Skip,
}

/// Parses roster text into company seeds
///
/// The text is split on `**name**` headings. Within each block, lines are
/// classified as phone, fax, website, email or address, in that order, so a
/// `Tel` line never leaks into the address. Blocks with an empty name or an
/// empty body are dropped without aborting the rest of the roster.
///
/// # Example
///
/// ```
/// use fleet_sounding::roster::{parse, MemberClass};
///
/// let text = "**Acme Sdn Bhd**\nLot 5, Jalan Laut\nTel: 03-1234 5678\n";
/// let seeds = parse(text, MemberClass::Primary);
/// assert_eq!(seeds.len(), 1);
/// assert_eq!(seeds[0].phone, "03-1234 5678");
/// assert_eq!(seeds[0].address, "Lot 5, Jalan Laut");
/// ```
pub fn parse(roster_text: &str, member_class: MemberClass) -> Vec<CompanySeed> {
    let headings: Vec<_> = heading_re().captures_iter(roster_text).collect();
    let mut seeds = Vec::new();

    for (i, caps) in headings.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };

        let body_end = headings
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(roster_text.len());
        let body = roster_text[whole.end()..body_end].trim();
        let name = name.as_str().trim();

        if name.is_empty() || body.is_empty() {
            tracing::debug!("Skipping roster block without name or details");
            continue;
        }

        seeds.push(parse_block(name, body, member_class));
    }

    tracing::debug!("Parsed {} seeds from roster", seeds.len());
    seeds
}

/// Reads a roster document from disk and parses its `markdown` field
pub fn parse_document(
    path: &Path,
    member_class: MemberClass,
) -> Result<Vec<CompanySeed>, RosterError> {
    let content = std::fs::read_to_string(path)?;
    let document: serde_json::Value = serde_json::from_str(&content)?;
    let text = document
        .get("markdown")
        .and_then(|v| v.as_str())
        .ok_or(RosterError::MissingText)?;

    Ok(parse(text, member_class))
}

fn parse_block(name: &str, body: &str, member_class: MemberClass) -> CompanySeed {
    let mut address_parts = Vec::new();
    let mut phone = String::new();
    let mut fax = None;
    let mut website_hint = None;
    let mut email = None;

    for raw_line in body.lines() {
        let line = clean_line(raw_line);
        if line.is_empty() {
            continue;
        }

        match classify_line(line) {
            LineKind::Phone => {
                // "Tel: 03-1234 Fax: 03-5678" on one line
                let lower = line.to_ascii_lowercase();
                if let Some(fax_at) = lower.find("fax") {
                    phone = strip_contact_prefix(&line[..fax_at]);
                    fax = Some(strip_contact_prefix(&line[fax_at..])).filter(|f| !f.is_empty());
                } else {
                    phone = strip_contact_prefix(line);
                }
            }
            LineKind::Fax => {
                fax = Some(strip_contact_prefix(line)).filter(|f| !f.is_empty());
            }
            LineKind::Website => {
                if website_hint.is_none() {
                    website_hint = extract_website(line);
                }
            }
            LineKind::Email => {
                email = email_re().find(line).map(|m| m.as_str().to_string());
            }
            LineKind::Address => address_parts.push(line.to_string()),
            LineKind::Skip => {}
        }
    }

    CompanySeed {
        name: name.to_string(),
        address: address_parts.join(", "),
        phone,
        fax,
        website_hint,
        email,
        member_class,
    }
}

fn classify_line(line: &str) -> LineKind {
    let lower = line.to_ascii_lowercase();

    if lower.starts_with("tel") || lower.starts_with("phone") {
        LineKind::Phone
    } else if lower.starts_with("fax") {
        LineKind::Fax
    } else if line.starts_with("[www.") || lower.starts_with("www.") || lower.contains("http") {
        LineKind::Website
    } else if line.contains('@') && email_re().is_match(line) {
        LineKind::Email
    } else if contact_word_re().is_match(line) {
        LineKind::Skip
    } else {
        LineKind::Address
    }
}

/// Trims whitespace and markdown hard-break markers
fn clean_line(line: &str) -> &str {
    line.trim().trim_end_matches('\\').trim_end()
}

fn strip_contact_prefix(line: &str) -> String {
    contact_prefix_re()
        .replace(line.trim(), "")
        .trim()
        .trim_end_matches(|c: char| c == ',' || c == ';' || c == '/')
        .trim()
        .to_string()
}

/// Prefers a markdown link target, then a bare URL; bare `www.` gets `http://`
fn extract_website(line: &str) -> Option<String> {
    if let Some(caps) = markdown_link_re().captures(line) {
        if let Some(target) = caps.get(2) {
            return Some(target.as_str().trim().to_string());
        }
    }

    bare_url_re().find(line).map(|m| {
        let url = m.as_str().trim_end_matches(|c: char| c == '.' || c == ',');
        if url.starts_with("http") {
            url.to_string()
        } else {
            format!("http://{}", url)
        }
    })
}
