//! Multi-source attribute fusion
//!
//! Candidates from different sources are merged into one `FusedVesselRecord`.
//! Under the default policy a populated scalar is never overwritten, list
//! attributes only grow and every merged candidate's source is appended to
//! the record's source list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A recognized vessel attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    VesselName,
    Imo,
    Mmsi,
    CallSign,
    Flag,
    ClassSociety,
    PortOfRegistry,
    VesselType,
    BuildYear,
    LengthM,
    BeamM,
    GrossTonnage,
    Deadweight,
    EnginePowerKw,
    SpeedKnots,
    DeckAreaM2,
    CraneCapacityT,
    Accommodation,
    DpClass,
    CurrentLocation,
    CurrentStatus,
    Owner,
    Operator,
    Photos,
    Documents,
}

/// The shape of value an attribute carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Number,
    List,
}

impl Attribute {
    pub const ALL: [Attribute; 25] = [
        Attribute::VesselName,
        Attribute::Imo,
        Attribute::Mmsi,
        Attribute::CallSign,
        Attribute::Flag,
        Attribute::ClassSociety,
        Attribute::PortOfRegistry,
        Attribute::VesselType,
        Attribute::BuildYear,
        Attribute::LengthM,
        Attribute::BeamM,
        Attribute::GrossTonnage,
        Attribute::Deadweight,
        Attribute::EnginePowerKw,
        Attribute::SpeedKnots,
        Attribute::DeckAreaM2,
        Attribute::CraneCapacityT,
        Attribute::Accommodation,
        Attribute::DpClass,
        Attribute::CurrentLocation,
        Attribute::CurrentStatus,
        Attribute::Owner,
        Attribute::Operator,
        Attribute::Photos,
        Attribute::Documents,
    ];

    pub fn kind(&self) -> ValueKind {
        match self {
            Self::BuildYear | Self::Accommodation => ValueKind::Integer,
            Self::LengthM
            | Self::BeamM
            | Self::GrossTonnage
            | Self::Deadweight
            | Self::EnginePowerKw
            | Self::SpeedKnots
            | Self::DeckAreaM2
            | Self::CraneCapacityT => ValueKind::Number,
            Self::Photos | Self::Documents => ValueKind::List,
            _ => ValueKind::Text,
        }
    }

    pub fn is_list(&self) -> bool {
        self.kind() == ValueKind::List
    }

    /// Live position data, dropped when a search excludes tracking
    pub fn is_tracking(&self) -> bool {
        matches!(self, Self::CurrentLocation | Self::CurrentStatus)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VesselName => "vessel_name",
            Self::Imo => "imo",
            Self::Mmsi => "mmsi",
            Self::CallSign => "call_sign",
            Self::Flag => "flag",
            Self::ClassSociety => "class_society",
            Self::PortOfRegistry => "port_of_registry",
            Self::VesselType => "vessel_type",
            Self::BuildYear => "build_year",
            Self::LengthM => "length_m",
            Self::BeamM => "beam_m",
            Self::GrossTonnage => "gross_tonnage",
            Self::Deadweight => "deadweight",
            Self::EnginePowerKw => "engine_power_kw",
            Self::SpeedKnots => "speed_knots",
            Self::DeckAreaM2 => "deck_area_m2",
            Self::CraneCapacityT => "crane_capacity_t",
            Self::Accommodation => "accommodation",
            Self::DpClass => "dp_class",
            Self::CurrentLocation => "current_location",
            Self::CurrentStatus => "current_status",
            Self::Owner => "owner",
            Self::Operator => "operator",
            Self::Photos => "photos",
            Self::Documents => "documents",
        }
    }
}

/// A single attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Integer(i64),
    Number(f64),
    List(Vec<String>),
}

impl AttributeValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Number(n) => !n.is_finite(),
            Self::Integer(_) => false,
        }
    }
}

/// A sparse set of attributes reported by one source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAttributeSet {
    /// Name of the originating source
    pub source: String,

    /// Declared reliability of the source, used by weighted conflict resolution
    pub reliability: f64,

    pub attributes: BTreeMap<Attribute, AttributeValue>,
}

impl CandidateAttributeSet {
    pub fn new(source: impl Into<String>, reliability: f64) -> Self {
        Self {
            source: source.into(),
            reliability,
            attributes: BTreeMap::new(),
        }
    }

    /// Sets an attribute, ignoring blank values
    ///
    /// The first value stored for a scalar attribute is kept. A text value
    /// given for a list attribute becomes one list item.
    pub fn set(&mut self, attribute: Attribute, value: AttributeValue) {
        if value.is_blank() {
            return;
        }

        if attribute.is_list() {
            match value {
                AttributeValue::List(items) => {
                    for item in items {
                        self.push_item(attribute, item);
                    }
                }
                AttributeValue::Text(item) => self.push_item(attribute, item),
                _ => {}
            }
            return;
        }

        self.attributes.entry(attribute).or_insert(value);
    }

    pub fn set_text(&mut self, attribute: Attribute, value: impl Into<String>) {
        let value = value.into();
        self.set(attribute, AttributeValue::Text(value.trim().to_string()));
    }

    /// Appends one item to a list attribute
    pub fn push_item(&mut self, attribute: Attribute, item: impl Into<String>) {
        let item = item.into();
        if item.trim().is_empty() {
            return;
        }

        let entry = self
            .attributes
            .entry(attribute)
            .or_insert_with(|| AttributeValue::List(Vec::new()));
        if let AttributeValue::List(items) = entry {
            items.push(item);
        }
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.attributes.get(&attribute)
    }

    pub fn text(&self, attribute: Attribute) -> Option<&str> {
        self.get(attribute).and_then(AttributeValue::as_text)
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.attributes.contains_key(&attribute)
    }

    pub fn remove(&mut self, attribute: Attribute) -> Option<AttributeValue> {
        self.attributes.remove(&attribute)
    }

    /// Keeps at most `cap` items of a list attribute
    pub fn truncate_list(&mut self, attribute: Attribute, cap: usize) {
        if let Some(AttributeValue::List(items)) = self.attributes.get_mut(&attribute) {
            items.truncate(cap);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// True when the candidate names a vessel or carries an identifier
    pub fn has_name_or_identifier(&self) -> bool {
        self.contains(Attribute::VesselName)
            || self.contains(Attribute::Imo)
            || self.contains(Attribute::Mmsi)
    }
}

/// Where a fused scalar came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub source: String,
    pub reliability: f64,
}

/// The best-effort vessel record built from every merged candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedVesselRecord {
    pub attributes: BTreeMap<Attribute, AttributeValue>,

    /// Sources in merge order; repeats are kept
    pub sources: Vec<String>,

    pub confidence: f64,
    pub fused_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub provenance: BTreeMap<Attribute, Provenance>,
}

impl FusedVesselRecord {
    pub fn new() -> Self {
        Self {
            attributes: BTreeMap::new(),
            sources: Vec::new(),
            confidence: 0.0,
            fused_at: None,
            provenance: BTreeMap::new(),
        }
    }

    /// Seeds a scalar that no source may replace, such as the queried identifier
    pub fn seed(&mut self, attribute: Attribute, value: AttributeValue) {
        if value.is_blank() || attribute.is_list() {
            return;
        }
        self.attributes.insert(attribute, value);
        self.provenance.insert(
            attribute,
            Provenance {
                source: "query".to_string(),
                reliability: 1.0,
            },
        );
    }

    pub fn get(&self, attribute: Attribute) -> Option<&AttributeValue> {
        self.attributes.get(&attribute)
    }

    pub fn text(&self, attribute: Attribute) -> Option<&str> {
        self.get(attribute).and_then(AttributeValue::as_text)
    }

    pub fn list(&self, attribute: Attribute) -> &[String] {
        self.get(attribute)
            .and_then(AttributeValue::as_list)
            .unwrap_or(&[])
    }

    pub fn contains(&self, attribute: Attribute) -> bool {
        self.attributes.contains_key(&attribute)
    }

    pub fn vessel_name(&self) -> Option<&str> {
        self.text(Attribute::VesselName)
    }

    pub fn imo(&self) -> Option<&str> {
        self.text(Attribute::Imo)
    }

    pub fn owner(&self) -> Option<&str> {
        self.text(Attribute::Owner)
    }

    pub fn photos(&self) -> &[String] {
        self.list(Attribute::Photos)
    }

    pub fn documents(&self) -> &[String] {
        self.list(Attribute::Documents)
    }

    pub fn distinct_source_count(&self) -> usize {
        self.sources.iter().collect::<HashSet<_>>().len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl Default for FusedVesselRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// How a populated scalar reacts to a competing value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// The first source to supply a value keeps it
    #[default]
    FirstWriterWins,

    /// A value is replaced only by a source with strictly higher reliability
    ReliabilityWeighted,
}

/// How list attributes grow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListPolicy {
    /// Items already present are dropped
    #[default]
    Dedupe,

    /// Every item is appended
    Append,
}

/// Confidence weight of each scored attribute
pub const CONFIDENCE_WEIGHTS: [(Attribute, f64); 10] = [
    (Attribute::VesselName, 0.20),
    (Attribute::Imo, 0.15),
    (Attribute::VesselType, 0.10),
    (Attribute::BuildYear, 0.08),
    (Attribute::Flag, 0.08),
    (Attribute::LengthM, 0.07),
    (Attribute::GrossTonnage, 0.07),
    (Attribute::Mmsi, 0.05),
    (Attribute::Owner, 0.05),
    (Attribute::Photos, 0.05),
];

/// Bonus applied when more than one distinct source contributed
pub const MULTI_SOURCE_BONUS: f64 = 0.10;

/// Merges candidates into records and scores them
#[derive(Debug, Clone, Copy, Default)]
pub struct FusionEngine {
    conflict_policy: ConflictPolicy,
    list_policy: ListPolicy,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policies(conflict_policy: ConflictPolicy, list_policy: ListPolicy) -> Self {
        Self {
            conflict_policy,
            list_policy,
        }
    }

    pub fn conflict_policy(&self) -> ConflictPolicy {
        self.conflict_policy
    }

    /// Merges one candidate into the record
    pub fn merge(&self, record: &mut FusedVesselRecord, candidate: CandidateAttributeSet) {
        let CandidateAttributeSet {
            source,
            reliability,
            attributes,
        } = candidate;

        for (attribute, value) in attributes {
            if value.is_blank() {
                continue;
            }

            if attribute.is_list() {
                self.merge_list(record, attribute, value);
            } else {
                self.merge_scalar(record, attribute, value, &source, reliability);
            }
        }

        record.sources.push(source);
    }

    /// Computes confidence once and stamps the fusion time
    ///
    /// Confidence never drops below the value the record already carried.
    pub fn finalize(&self, record: &mut FusedVesselRecord, now: DateTime<Utc>) {
        let score = confidence_score(record);
        record.confidence = score.max(record.confidence);
        record.fused_at = Some(now);
    }

    fn merge_scalar(
        &self,
        record: &mut FusedVesselRecord,
        attribute: Attribute,
        value: AttributeValue,
        source: &str,
        reliability: f64,
    ) {
        let replace = match record.provenance.get(&attribute) {
            _ if !record.attributes.contains_key(&attribute) => true,
            Some(incumbent) => {
                self.conflict_policy == ConflictPolicy::ReliabilityWeighted
                    && reliability > incumbent.reliability
            }
            None => false,
        };

        if !replace {
            return;
        }

        record.attributes.insert(attribute, value);
        record.provenance.insert(
            attribute,
            Provenance {
                source: source.to_string(),
                reliability,
            },
        );
    }

    fn merge_list(&self, record: &mut FusedVesselRecord, attribute: Attribute, value: AttributeValue) {
        let incoming = match value {
            AttributeValue::List(items) => items,
            AttributeValue::Text(item) => vec![item],
            _ => return,
        };

        let entry = record
            .attributes
            .entry(attribute)
            .or_insert_with(|| AttributeValue::List(Vec::new()));

        let AttributeValue::List(items) = entry else {
            return;
        };

        for item in incoming {
            if self.list_policy == ListPolicy::Dedupe && items.contains(&item) {
                continue;
            }
            items.push(item);
        }
    }
}

/// Scores how complete and corroborated a record is, in [0, 1]
pub fn confidence_score(record: &FusedVesselRecord) -> f64 {
    let mut score: f64 = CONFIDENCE_WEIGHTS
        .iter()
        .filter(|(attribute, _)| match record.get(*attribute) {
            Some(AttributeValue::List(items)) => !items.is_empty(),
            Some(_) => true,
            None => false,
        })
        .map(|(_, weight)| weight)
        .sum();

    if record.distinct_source_count() > 1 {
        score += MULTI_SOURCE_BONUS;
    }

    score.min(1.0)
}
