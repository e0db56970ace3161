//! Label synonym dictionary and value coercion
//!
//! Vessel pages and registry sources label the same attribute many ways
//! ("LOA", "Length overall (m)", "Length"). Labels are normalized, stripped
//! of parenthetical units and matched exactly against the dictionary. Failing
//! that, an owner or operator role word anywhere in the label decides, and
//! then progressively shorter word prefixes are tried. A prefix is rejected
//! when the words after it name a different attribute, so "Vessel Owner"
//! never becomes a vessel name. There is no substring matching, so "length"
//! never matches the "gt" entry.

use crate::search::{Attribute, AttributeValue, CandidateAttributeSet, ValueKind};
use regex::Regex;
use std::sync::OnceLock;

const SYNONYMS: &[(&str, Attribute)] = &[
    ("name", Attribute::VesselName),
    ("vessel", Attribute::VesselName),
    ("vessel name", Attribute::VesselName),
    ("ship name", Attribute::VesselName),
    ("name of vessel", Attribute::VesselName),
    ("imo", Attribute::Imo),
    ("imo no", Attribute::Imo),
    ("imo number", Attribute::Imo),
    ("mmsi", Attribute::Mmsi),
    ("mmsi no", Attribute::Mmsi),
    ("mmsi number", Attribute::Mmsi),
    ("call sign", Attribute::CallSign),
    ("callsign", Attribute::CallSign),
    ("flag", Attribute::Flag),
    ("flag state", Attribute::Flag),
    ("class", Attribute::ClassSociety),
    ("classification", Attribute::ClassSociety),
    ("class society", Attribute::ClassSociety),
    ("classification society", Attribute::ClassSociety),
    ("port of registry", Attribute::PortOfRegistry),
    ("home port", Attribute::PortOfRegistry),
    ("registry port", Attribute::PortOfRegistry),
    ("type", Attribute::VesselType),
    ("vessel type", Attribute::VesselType),
    ("ship type", Attribute::VesselType),
    ("category", Attribute::VesselType),
    ("built", Attribute::BuildYear),
    ("year built", Attribute::BuildYear),
    ("build year", Attribute::BuildYear),
    ("year of build", Attribute::BuildYear),
    ("delivered", Attribute::BuildYear),
    ("length", Attribute::LengthM),
    ("loa", Attribute::LengthM),
    ("length overall", Attribute::LengthM),
    ("beam", Attribute::BeamM),
    ("breadth", Attribute::BeamM),
    ("width", Attribute::BeamM),
    ("gross tonnage", Attribute::GrossTonnage),
    ("gt", Attribute::GrossTonnage),
    ("grt", Attribute::GrossTonnage),
    ("deadweight", Attribute::Deadweight),
    ("dwt", Attribute::Deadweight),
    ("main engine", Attribute::EnginePowerKw),
    ("engine power", Attribute::EnginePowerKw),
    ("total power", Attribute::EnginePowerKw),
    ("speed", Attribute::SpeedKnots),
    ("max speed", Attribute::SpeedKnots),
    ("service speed", Attribute::SpeedKnots),
    ("deck area", Attribute::DeckAreaM2),
    ("clear deck area", Attribute::DeckAreaM2),
    ("deck space", Attribute::DeckAreaM2),
    ("crane", Attribute::CraneCapacityT),
    ("crane capacity", Attribute::CraneCapacityT),
    ("accommodation", Attribute::Accommodation),
    ("berths", Attribute::Accommodation),
    ("persons on board", Attribute::Accommodation),
    ("pob", Attribute::Accommodation),
    ("dp", Attribute::DpClass),
    ("dp class", Attribute::DpClass),
    ("dynamic positioning", Attribute::DpClass),
    ("position", Attribute::CurrentLocation),
    ("current position", Attribute::CurrentLocation),
    ("location", Attribute::CurrentLocation),
    ("status", Attribute::CurrentStatus),
    ("navigational status", Attribute::CurrentStatus),
    ("owner", Attribute::Owner),
    ("registered owner", Attribute::Owner),
    ("vessel owner", Attribute::Owner),
    ("ship owner", Attribute::Owner),
    ("shipowner", Attribute::Owner),
    ("name of owner", Attribute::Owner),
    ("operator", Attribute::Operator),
    ("manager", Attribute::Operator),
    ("ship manager", Attribute::Operator),
    ("vessel operator", Attribute::Operator),
    ("ship operator", Attribute::Operator),
];

/// Words that name a company role wherever they appear in a label
const ROLE_WORDS: &[(&str, Attribute)] = &[
    ("owner", Attribute::Owner),
    ("owners", Attribute::Owner),
    ("shipowner", Attribute::Owner),
    ("operator", Attribute::Operator),
    ("operators", Attribute::Operator),
    ("manager", Attribute::Operator),
    ("managers", Attribute::Operator),
];

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\([^)]*\)|\[[^\]]*\]").unwrap())
}

fn number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap())
}

fn year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d{4}").unwrap())
}

fn imo_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{7}\b").unwrap())
}

fn mmsi_digits_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\d{9}\b").unwrap())
}

/// Normalizes a label: lowercase, units and punctuation removed, single spaces
pub fn normalize_label(label: &str) -> String {
    let lower = label.to_lowercase();
    let stripped = parenthetical_re().replace_all(&lower, " ");

    stripped
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a raw label to an attribute
///
/// ```
/// use fleet_sounding::discovery::labels::lookup;
/// use fleet_sounding::search::Attribute;
///
/// assert_eq!(lookup("Length Overall (m):"), Some(Attribute::LengthM));
/// assert_eq!(lookup("Main engine power"), Some(Attribute::EnginePowerKw));
/// assert_eq!(lookup("Contact us"), None);
/// assert_eq!(lookup("Vessel Owner"), Some(Attribute::Owner));
/// assert_eq!(lookup("Contact us"), None);
/// ```
pub fn lookup(label: &str) -> Option<Attribute> {
    let normalized = normalize_label(label);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    if words.is_empty() {
        return None;
    }

    if let Some(attribute) = synonym(&normalized) {
        return Some(attribute);
    }

    let role = words
        .iter()
        .find_map(|word| ROLE_WORDS.iter().find(|(w, _)| w == word).map(|(_, a)| *a));
    if role.is_some() {
        return role;
    }

    for len in (1..words.len()).rev() {
        let Some(attribute) = synonym(&words[..len].join(" ")) else {
            continue;
        };
        return match synonym(&words[len..].join(" ")) {
            Some(other) if other != attribute => None,
            _ => Some(attribute),
        };
    }

    None
}

fn synonym(phrase: &str) -> Option<Attribute> {
    SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == phrase)
        .map(|(_, attribute)| *attribute)
}

/// Parses a number, dropping thousands separators and unit suffixes
pub fn parse_number(raw: &str) -> Option<f64> {
    let digits = number_re().find(raw)?.as_str().replace(',', "");
    digits.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Returns the first 4-digit run
pub fn parse_year(raw: &str) -> Option<i64> {
    year_re().find(raw)?.as_str().parse().ok()
}

/// Converts a raw value to the shape the attribute expects
///
/// Returns None when the value carries nothing usable for the attribute,
/// e.g. "N/A" for a length.
pub fn coerce(attribute: Attribute, raw: &str) -> Option<AttributeValue> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match attribute {
        Attribute::Imo => imo_digits_re()
            .find(raw)
            .map(|m| AttributeValue::Text(m.as_str().to_string())),
        Attribute::Mmsi => mmsi_digits_re()
            .find(raw)
            .map(|m| AttributeValue::Text(m.as_str().to_string())),
        Attribute::BuildYear => parse_year(raw).map(AttributeValue::Integer),
        _ => match attribute.kind() {
            ValueKind::Text => Some(AttributeValue::Text(collapse_whitespace(raw))),
            ValueKind::Integer => parse_number(raw).map(|n| AttributeValue::Integer(n as i64)),
            ValueKind::Number => parse_number(raw).map(AttributeValue::Number),
            ValueKind::List => Some(AttributeValue::List(vec![raw.to_string()])),
        },
    }
}

/// Looks up a label and stores the coerced value; true if something was stored
pub fn assign(candidate: &mut CandidateAttributeSet, label: &str, value: &str) -> bool {
    let Some(attribute) = lookup(label) else {
        return false;
    };

    match coerce(attribute, value) {
        Some(coerced) => {
            candidate.set(attribute, coerced);
            true
        }
        None => false,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_lookup() {
        assert_eq!(lookup("IMO Number"), Some(Attribute::Imo));
        assert_eq!(lookup("Call Sign:"), Some(Attribute::CallSign));
        assert_eq!(lookup("GT"), Some(Attribute::GrossTonnage));
        assert_eq!(lookup("Flag"), Some(Attribute::Flag));
        assert_eq!(lookup("year_built"), Some(Attribute::BuildYear));
    }

    #[test]
    fn test_parenthetical_units_are_stripped() {
        assert_eq!(lookup("Beam (m)"), Some(Attribute::BeamM));
        assert_eq!(lookup("Deck Area [m2]"), Some(Attribute::DeckAreaM2));
    }

    #[test]
    fn test_prefix_lookup() {
        assert_eq!(lookup("Length overall approx"), Some(Attribute::LengthM));
        assert_eq!(lookup("Vessel Type / Category"), Some(Attribute::VesselType));
        assert_eq!(lookup("Crane SWL at 10m"), Some(Attribute::CraneCapacityT));
    }

    #[test]
    fn test_role_labels_are_not_vessel_names() {
        assert_eq!(lookup("Vessel Owner"), Some(Attribute::Owner));
        assert_eq!(lookup("Vessel Operator"), Some(Attribute::Operator));
        assert_eq!(lookup("Name of Owner"), Some(Attribute::Owner));
        assert_eq!(lookup("Owner's name"), Some(Attribute::Owner));
        assert_eq!(lookup("Technical Managers"), Some(Attribute::Operator));
        assert_eq!(lookup("Vessel Name"), Some(Attribute::VesselName));
    }

    #[test]
    fn test_prefix_rejected_when_rest_names_another_attribute() {
        assert_eq!(lookup("Length / Beam"), None);
        assert_eq!(lookup("Type of vessel"), Some(Attribute::VesselType));
    }

    #[test]
    fn test_no_substring_matching() {
        // "length" contains "gt"; "weight" alone is unknown
        assert_eq!(lookup("Length"), Some(Attribute::LengthM));
        assert_eq!(lookup("Weight"), None);
        assert_eq!(lookup("Flagship service"), None);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("1,234.5 t"), Some(1234.5));
        assert_eq!(parse_number("65.0m"), Some(65.0));
        assert_eq!(parse_number("approx. 3200 kW"), Some(3200.0));
        assert_eq!(parse_number("N/A"), None);
    }

    #[test]
    fn test_parse_year() {
        assert_eq!(parse_year("Built 2012 (Sibu)"), Some(2012));
        assert_eq!(parse_year("12/2008"), Some(2008));
        assert_eq!(parse_year("unknown"), None);
    }

    #[test]
    fn test_coerce_identifiers() {
        assert_eq!(
            coerce(Attribute::Imo, "IMO 9074729"),
            Some(AttributeValue::Text("9074729".to_string()))
        );
        assert_eq!(coerce(Attribute::Imo, "12345"), None);
        assert_eq!(
            coerce(Attribute::Mmsi, "533 / 533123456"),
            Some(AttributeValue::Text("533123456".to_string()))
        );
    }

    #[test]
    fn test_coerce_kinds() {
        assert_eq!(
            coerce(Attribute::Accommodation, "60 persons"),
            Some(AttributeValue::Integer(60))
        );
        assert_eq!(
            coerce(Attribute::GrossTonnage, "2,150"),
            Some(AttributeValue::Number(2150.0))
        );
        assert_eq!(
            coerce(Attribute::Flag, "  Malaysia \n"),
            Some(AttributeValue::Text("Malaysia".to_string()))
        );
        assert_eq!(coerce(Attribute::LengthM, "TBA"), None);
    }

    #[test]
    fn test_assign() {
        let mut candidate = CandidateAttributeSet::new("test", 0.5);
        assert!(assign(&mut candidate, "Year of Build", "2010"));
        assert!(!assign(&mut candidate, "Contact", "03-1234"));
        assert!(!assign(&mut candidate, "LOA", "-"));
        assert_eq!(
            candidate.get(Attribute::BuildYear),
            Some(&AttributeValue::Integer(2010))
        );
    }
}
