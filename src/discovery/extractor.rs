//! Vessel record extraction from company pages
//!
//! Extraction runs in two tiers. The structural tier looks for vessel
//! containers (elements classed like `vessel-card`, `fleet-list`, or tables
//! that mention vessels) and reads label/value structure inside them. Only
//! when that finds nothing does the fallback tier scan the page text with
//! regexes for names near identifiers, after an `MV` prefix, or in all-caps
//! headlines.

use crate::discovery::html::{element_text, image_src, selector, text_lines};
use crate::discovery::labels;
use crate::search::{Attribute, AttributeValue, CandidateAttributeSet};
use crate::sources::{read_definition_list, read_label_value_spans, read_table_rows};
use regex::Regex;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::sync::OnceLock;
use url::Url;

/// Source name attached to candidates read from a company's own pages
pub const WEBSITE_SOURCE: &str = "company_website";

/// Declared reliability of a company's own pages
pub const WEBSITE_RELIABILITY: f64 = 0.5;

/// Photos kept per extracted vessel
const MAX_CANDIDATE_PHOTOS: usize = 5;

/// Longest text treated as a `Label: value` label
const MAX_LABEL_LEN: usize = 40;

/// Words that make an all-caps line a headline rather than a vessel name
const HEADLINE_STOP_WORDS: &[&str] = &[
    "ABOUT", "AND", "BERHAD", "BHD", "CAREERS", "CLIENTS", "CONTACT", "COPYRIGHT", "FLEET",
    "GALLERY", "HOME", "IMO", "LOGIN", "MANAGEMENT", "MENU", "MISSION", "MMSI", "MORE", "NEWS",
    "OF", "OUR", "POLICY", "PRIVACY", "PROJECTS", "READ", "RESERVED", "RIGHTS", "SDN", "SEARCH",
    "SERVICES", "THE", "US", "VESSELS", "VISION", "WELCOME",
];

fn container_class_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)vessel|ship|fleet|boat|marine|offshore").unwrap())
}

fn vessel_table_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)vessel|ship|imo|mmsi").unwrap())
}

fn name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^\s*(?:vessel\s+|ship\s+)?name\s*[:\-]\s*([^\n,]+)").unwrap()
    })
}

fn imo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bIMO\s*(?:no\.?|number)?\s*[#:.]?\s*(\d{7})\b").unwrap())
}

fn mmsi_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\bMMSI\s*(?:no\.?|number)?\s*[#:.]?\s*(\d{9})\b").unwrap()
    })
}

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(IMO|MMSI)\s*(?:no\.?|number)?\s*[#:.]?\s*(\d{9}|\d{7})\b").unwrap()
    })
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(?:built|build\s+year|year)\s*:?\s*(\d{4})\b").unwrap())
}

fn length_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\blength\s*(?:overall)?\s*:?\s*(\d+(?:\.\d+)?)\s*m\b").unwrap()
    })
}

fn prefixed_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(?i:m\.?\s?v\.?|vessel|ship)\s+([A-Z][A-Z0-9]*(?:[ \-][A-Z0-9]+)*)\b")
            .unwrap()
    })
}

fn caps_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b[A-Z][A-Z0-9]*(?:[ \-][A-Z0-9]+)*\b").unwrap())
}

fn leading_caps_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Z][A-Z0-9]*(?:[ \-][A-Z0-9]+)*)\b").unwrap())
}

/// Extracts candidate vessel records from a company page
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordExtractor;

impl RecordExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns one candidate per vessel found on the page
    ///
    /// Every candidate carries a name or an identifier; the owner defaults
    /// to `company_name`. Candidates with the same name, IMO and MMSI
    /// collapse to the first one seen.
    pub fn extract(
        &self,
        html: &str,
        company_name: &str,
        source_url: &Url,
    ) -> Vec<CandidateAttributeSet> {
        let document = Html::parse_document(html);

        let mut candidates: Vec<CandidateAttributeSet> = vessel_containers(document.root_element())
            .iter()
            .flat_map(|container| read_container(container, source_url))
            .filter(CandidateAttributeSet::has_name_or_identifier)
            .collect();

        if candidates.is_empty() {
            candidates = fallback_candidates(&document, company_name);
            if !candidates.is_empty() {
                tracing::debug!(
                    "Recovered {} vessels from page text of {}",
                    candidates.len(),
                    source_url
                );
            }
        }

        for candidate in &mut candidates {
            if !candidate.contains(Attribute::Owner) {
                candidate.set_text(Attribute::Owner, company_name);
            }
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(dedupe_key(c)));

        tracing::debug!("Extracted {} vessels from {}", candidates.len(), source_url);
        candidates
    }
}

fn new_candidate() -> CandidateAttributeSet {
    CandidateAttributeSet::new(WEBSITE_SOURCE, WEBSITE_RELIABILITY)
}

/// Name, IMO and MMSI; candidates agreeing on all three are one vessel
pub(crate) fn dedupe_key(candidate: &CandidateAttributeSet) -> (String, String, String) {
    let text = |attribute| candidate.text(attribute).unwrap_or_default();
    (
        text(Attribute::VesselName).to_lowercase(),
        text(Attribute::Imo).to_string(),
        text(Attribute::Mmsi).to_string(),
    )
}

/// Finds vessel containers in document order
///
/// A container holding two or more other containers is a listing wrapper
/// and is skipped in favour of its children. A container nested inside one
/// already kept is read as part of its ancestor.
fn vessel_containers(root: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let Some(sel) = selector("div, section, article, li, table") else {
        return Vec::new();
    };

    let matched: Vec<ElementRef<'_>> = root
        .select(&sel)
        .filter(|el| {
            let by_class = el
                .value()
                .attr("class")
                .map(|class| container_class_re().is_match(class))
                .unwrap_or(false);
            let by_text =
                el.value().name() == "table" && vessel_table_re().is_match(&element_text(el));
            by_class || by_text
        })
        .collect();

    let matched_ids: HashSet<_> = matched.iter().map(|el| el.id()).collect();
    let mut kept_ids = HashSet::new();
    let mut kept = Vec::new();

    for el in matched {
        let nested = el
            .descendants()
            .skip(1)
            .filter(|node| matched_ids.contains(&node.id()))
            .count();
        if nested >= 2 {
            continue;
        }
        if el.ancestors().any(|node| kept_ids.contains(&node.id())) {
            continue;
        }
        kept_ids.insert(el.id());
        kept.push(el);
    }

    kept
}

fn read_container(container: &ElementRef<'_>, page_url: &Url) -> Vec<CandidateAttributeSet> {
    let rows = read_header_tables(container);
    if !rows.is_empty() {
        return rows;
    }

    let mut candidate = new_candidate();
    let lines = text_lines(container);

    read_text_lines(&lines, &mut candidate);
    read_table_rows(container, &mut candidate);
    read_definition_list(container, &mut candidate);
    read_label_value_spans(container, "*", &mut candidate);
    recover_from_text(&lines.join("\n"), &mut candidate);

    if !candidate.contains(Attribute::VesselName) {
        if let Some(name) = heading_name(container).or_else(|| leading_caps_name(&lines)) {
            candidate.set_text(Attribute::VesselName, name);
        }
    }

    if let Some(img_sel) = selector("img") {
        for img in container.select(&img_sel) {
            if let Some(photo) = image_src(&img, page_url) {
                candidate.push_item(Attribute::Photos, photo);
            }
        }
    }
    candidate.truncate_list(Attribute::Photos, MAX_CANDIDATE_PHOTOS);

    vec![candidate]
}

/// Reads every table with a header row, one candidate per data row
fn read_header_tables(container: &ElementRef<'_>) -> Vec<CandidateAttributeSet> {
    let mut tables: Vec<ElementRef<'_>> = Vec::new();
    if container.value().name() == "table" {
        tables.push(*container);
    }
    if let Some(table_sel) = selector("table") {
        tables.extend(container.select(&table_sel));
    }

    let mut rows = Vec::new();
    for table in &tables {
        if let Some(columns) = header_columns(table) {
            rows.extend(read_columns(table, &columns));
        }
    }
    rows
}

/// Attribute of each column when the first row is all `th` and at least two
/// headers are recognized
fn header_columns(table: &ElementRef<'_>) -> Option<Vec<Option<Attribute>>> {
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let first = table.select(&row_sel).next()?;
    let cells: Vec<_> = first.select(&cell_sel).collect();
    if cells.len() < 2 || !cells.iter().all(|c| c.value().name() == "th") {
        return None;
    }

    let columns: Vec<Option<Attribute>> = cells
        .iter()
        .map(|c| labels::lookup(&element_text(c)))
        .collect();
    if columns.iter().filter(|c| c.is_some()).count() < 2 {
        return None;
    }

    Some(columns)
}

fn read_columns(table: &ElementRef<'_>, columns: &[Option<Attribute>]) -> Vec<CandidateAttributeSet> {
    let (Some(row_sel), Some(cell_sel)) = (selector("tr"), selector("td")) else {
        return Vec::new();
    };

    let mut rows = Vec::new();
    for row in table.select(&row_sel).skip(1) {
        let mut candidate = new_candidate();
        for (cell, column) in row.select(&cell_sel).zip(columns) {
            let Some(attribute) = column else {
                continue;
            };
            if let Some(value) = labels::coerce(*attribute, &element_text(&cell)) {
                candidate.set(*attribute, value);
            }
        }
        if !candidate.is_empty() {
            rows.push(candidate);
        }
    }
    rows
}

/// Reads `Label: value` text lines
fn read_text_lines(lines: &[String], candidate: &mut CandidateAttributeSet) {
    for line in lines {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        if label.len() > MAX_LABEL_LEN || value.trim().is_empty() {
            continue;
        }
        labels::assign(candidate, label, value);
    }
}

/// Regex recovery of attributes the structure did not yield
fn recover_from_text(text: &str, candidate: &mut CandidateAttributeSet) {
    let recovered = [
        (Attribute::VesselName, name_re()),
        (Attribute::Imo, imo_re()),
        (Attribute::Mmsi, mmsi_re()),
        (Attribute::BuildYear, year_re()),
        (Attribute::LengthM, length_re()),
    ];

    for (attribute, re) in recovered {
        if candidate.contains(attribute) {
            continue;
        }
        let Some(raw) = re.captures(text).and_then(|caps| caps.get(1)) else {
            continue;
        };
        if let Some(value) = labels::coerce(attribute, raw.as_str()) {
            candidate.set(attribute, value);
        }
    }
}

/// First heading-like element that reads as a name rather than a label
fn heading_name(container: &ElementRef<'_>) -> Option<String> {
    let sel = selector("h1, h2, h3, h4, h5, h6, .vessel-name, .name, .title, strong, b")?;
    container
        .select(&sel)
        .map(|el| element_text(&el))
        .find(|text| {
            !text.is_empty()
                && text.len() <= 80
                && !text.ends_with(':')
                && text.chars().any(char::is_alphabetic)
                && labels::lookup(text).is_none()
        })
}

fn leading_caps_name(lines: &[String]) -> Option<String> {
    let first = lines.first()?;
    let caps = leading_caps_re().captures(first)?.get(1)?.as_str().trim();
    plausible_name(caps).then(|| caps.to_string())
}

/// True for an all-caps run that could be a vessel name
fn plausible_name(run: &str) -> bool {
    let run = run.trim();
    if run.len() <= 3 || run.chars().filter(|c| c.is_ascii_alphabetic()).count() < 2 {
        return false;
    }

    let tokens: Vec<&str> = run
        .split(|c: char| c == ' ' || c == '-')
        .filter(|t| !t.is_empty())
        .collect();
    let is_stop = |t: &&str| HEADLINE_STOP_WORDS.contains(t);

    match tokens.first() {
        Some(first) if !is_stop(first) => !tokens
            .iter()
            .all(|t| is_stop(t) || t.chars().all(|c| c.is_ascii_digit())),
        _ => false,
    }
}

/// Visible text of the page, one entry per text line
fn page_lines(document: &Html) -> Vec<String> {
    let mut lines = Vec::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name()))
            .map(|name| matches!(name, "script" | "style" | "noscript"))
            .unwrap_or(false);
        if hidden {
            continue;
        }

        for line in text.lines() {
            let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
            if !line.is_empty() {
                lines.push(line);
            }
        }
    }

    lines
}

/// Fallback tier over unstructured page text
fn fallback_candidates(document: &Html, company_name: &str) -> Vec<CandidateAttributeSet> {
    let lines = page_lines(document);
    let company_upper = company_name.to_uppercase();
    let not_company = |name: &str| !company_upper.contains(name);
    let mut candidates = Vec::new();

    // Names beside an identifier, on the same line or the line above
    for (i, line) in lines.iter().enumerate() {
        for caps in identifier_re().captures_iter(line) {
            let (Some(kind), Some(digits)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            let attribute = match (kind.as_str().to_uppercase().as_str(), digits.as_str().len()) {
                ("IMO", 7) => Attribute::Imo,
                ("MMSI", 9) => Attribute::Mmsi,
                _ => continue,
            };

            let remainder = identifier_re().replace_all(line, " ");
            let name = longest_caps_run(&remainder).or_else(|| {
                i.checked_sub(1).and_then(|prev| {
                    longest_caps_run(&identifier_re().replace_all(&lines[prev], " "))
                })
            });

            let mut candidate = new_candidate();
            candidate.set(attribute, AttributeValue::Text(digits.as_str().to_string()));
            if let Some(name) = name.filter(|n| not_company(n.as_str())) {
                candidate.set_text(Attribute::VesselName, name);
            }
            candidates.push(candidate);
        }
    }

    // Names after an MV, Vessel or Ship prefix
    for line in &lines {
        for caps in prefixed_name_re().captures_iter(line) {
            let Some(name) = caps.get(1).map(|m| m.as_str().trim()) else {
                continue;
            };
            if plausible_name(name) && not_company(name) {
                let mut candidate = new_candidate();
                candidate.set_text(Attribute::VesselName, name);
                candidates.push(candidate);
            }
        }
    }

    if !candidates.is_empty() {
        return candidates;
    }

    // All-caps runs at line start, headlines excluded
    for line in &lines {
        let Some(name) = leading_caps_re()
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
        else {
            continue;
        };
        if plausible_name(name) && not_company(name) {
            let mut candidate = new_candidate();
            candidate.set_text(Attribute::VesselName, name);
            candidates.push(candidate);
        }
    }

    candidates
}

fn longest_caps_run(text: &str) -> Option<String> {
    caps_run_re()
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|run| plausible_name(run))
        .max_by_key(|run| run.len())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://acme.example/fleet").unwrap()
    }

    fn names(candidates: &[CandidateAttributeSet]) -> Vec<&str> {
        candidates
            .iter()
            .filter_map(|c| c.text(Attribute::VesselName))
            .collect()
    }

    #[test]
    fn test_vessel_cards_inside_listing() {
        let html = r#"
            <div class="fleet-list">
              <div class="vessel-card">
                <h3>SEA EAGLE</h3>
                <p>Type: Anchor Handling Tug Supply</p>
                <p>IMO No: 9074729</p>
                <p>Built: 2009</p>
                <img src="/img/sea-eagle.jpg">
              </div>
              <div class="vessel-card">
                <h3>BORNEO STAR</h3>
                <dl><dt>Length Overall</dt><dd>60.5 m</dd><dt>Flag</dt><dd>Malaysia</dd></dl>
              </div>
            </div>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme Offshore Sdn Bhd", &page_url());
        assert_eq!(names(&candidates), vec!["SEA EAGLE", "BORNEO STAR"]);

        let first = &candidates[0];
        assert_eq!(first.source, WEBSITE_SOURCE);
        assert_eq!(first.text(Attribute::Imo), Some("9074729"));
        assert_eq!(first.text(Attribute::VesselType), Some("Anchor Handling Tug Supply"));
        assert_eq!(first.get(Attribute::BuildYear), Some(&AttributeValue::Integer(2009)));
        assert_eq!(first.text(Attribute::Owner), Some("Acme Offshore Sdn Bhd"));
        assert_eq!(
            first.get(Attribute::Photos),
            Some(&AttributeValue::List(vec![
                "https://acme.example/img/sea-eagle.jpg".to_string()
            ]))
        );

        let second = &candidates[1];
        assert_eq!(second.get(Attribute::LengthM), Some(&AttributeValue::Number(60.5)));
        assert_eq!(second.text(Attribute::Flag), Some("Malaysia"));
    }

    #[test]
    fn test_header_row_table_reads_one_candidate_per_row() {
        let html = r#"
            <table class="fleet-table">
              <tr><th>Vessel Name</th><th>Type</th><th>Year Built</th><th>GT</th></tr>
              <tr><td>Kapal Satu</td><td>AHTS</td><td>2010</td><td>1,470</td></tr>
              <tr><td>Kapal Dua</td><td>Crew Boat</td><td>2012</td><td>280</td></tr>
            </table>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(names(&candidates), vec!["Kapal Satu", "Kapal Dua"]);
        assert_eq!(
            candidates[0].get(Attribute::GrossTonnage),
            Some(&AttributeValue::Number(1470.0))
        );
        assert_eq!(candidates[1].text(Attribute::VesselType), Some("Crew Boat"));
    }

    #[test]
    fn test_owner_column_does_not_replace_vessel_name() {
        let html = r#"
            <table>
              <tr><th>Vessel Name</th><th>Vessel Owner</th><th>Vessel Operator</th><th>Type</th></tr>
              <tr><td>SEA EAGLE</td><td>Bumi Armada Berhad</td><td>Acme Marine</td><td>AHTS</td></tr>
            </table>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(names(&candidates), vec!["SEA EAGLE"]);
        assert_eq!(candidates[0].text(Attribute::Owner), Some("Bumi Armada Berhad"));
        assert_eq!(candidates[0].text(Attribute::Operator), Some("Acme Marine"));
        assert_eq!(candidates[0].text(Attribute::VesselType), Some("AHTS"));
    }

    #[test]
    fn test_label_value_table_mentioning_imo() {
        let html = r#"
            <table>
              <tr><td>Name</td><td>Jaya Pioneer</td></tr>
              <tr><td>IMO</td><td>9074729</td></tr>
              <tr><td>MMSI</td><td>533123456</td></tr>
            </table>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Jaya", &page_url());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text(Attribute::VesselName), Some("Jaya Pioneer"));
        assert_eq!(candidates[0].text(Attribute::Mmsi), Some("533123456"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"
            <li class="vessel">Name: SEA EAGLE<br>IMO 9074729</li>
            <li class="vessel">Name: Sea Eagle<br>IMO 9074729</li>
            <li class="vessel">Name: SEA EAGLE II</li>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(names(&candidates), vec!["SEA EAGLE", "SEA EAGLE II"]);
    }

    #[test]
    fn test_fallback_name_near_identifier() {
        let html = r#"
            <p>Our newest addition, SEA EAGLE (IMO 9074729), joined in March.</p>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].text(Attribute::VesselName), Some("SEA EAGLE"));
        assert_eq!(candidates[0].text(Attribute::Imo), Some("9074729"));
        assert_eq!(candidates[0].text(Attribute::Owner), Some("Acme"));
    }

    #[test]
    fn test_fallback_mmsi_only_lines_stay_apart() {
        let html = r#"<html><body>
            <p>Our tug is tracked as MMSI 533123456.</p>
            <p>Our barge is tracked as MMSI 533987654.</p>
        </body></html>"#;

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].text(Attribute::Mmsi), Some("533123456"));
        assert_eq!(candidates[1].text(Attribute::Mmsi), Some("533987654"));
        assert!(candidates.iter().all(|c| !c.contains(Attribute::VesselName)));
    }

    #[test]
    fn test_fallback_prefixed_names() {
        let html = "<p>We operate MV SEA EAGLE and M.V. BORNEO STAR in Malaysian waters.</p>";

        let candidates = RecordExtractor::new().extract(html, "Acme", &page_url());
        assert_eq!(names(&candidates), vec!["SEA EAGLE", "BORNEO STAR"]);
    }

    #[test]
    fn test_fallback_all_caps_skips_headlines() {
        let html = r#"
            <p>HOME</p>
            <p>ABOUT US</p>
            <p>ACME MARINE</p>
            <p>KAPAL JAYA</p>
            <p>Contact our office</p>
        "#;

        let candidates = RecordExtractor::new().extract(html, "Acme Marine Sdn Bhd", &page_url());
        assert_eq!(names(&candidates), vec!["KAPAL JAYA"]);
    }

    #[test]
    fn test_page_without_vessels_is_empty() {
        let html = "<html><body><p>Welcome to our company.</p><script>var SHIPS = 1;</script></body></html>";
        assert!(RecordExtractor::new().extract(html, "Acme", &page_url()).is_empty());
    }

    #[test]
    fn test_plausible_name() {
        assert!(plausible_name("SEA EAGLE"));
        assert!(plausible_name("KAPAL 1"));
        assert!(!plausible_name("OUR FLEET"));
        assert!(!plausible_name("THE BEST"));
        assert!(!plausible_name("AB"));
        assert!(!plausible_name("2009 1234"));
    }
}
