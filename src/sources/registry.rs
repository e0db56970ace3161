use crate::identifier::Imo;
use crate::sources::parsers::SourceParser;
use crate::sources::SourceError;
use std::time::Duration;
use url::Url;

/// Version of the built-in source catalog
pub const REGISTRY_VERSION: &str = "2024.1";

/// Placeholder replaced by the IMO number in query URL templates
pub const IMO_PLACEHOLDER: &str = "{imo}";

/// Capability class of a source; searches visit groups in `ORDER`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceGroup {
    IdentityTracking,
    Classification,
    NationalRegistry,
    Photo,
    Specialized,
}

impl SourceGroup {
    pub const ORDER: [SourceGroup; 5] = [
        SourceGroup::IdentityTracking,
        SourceGroup::Classification,
        SourceGroup::NationalRegistry,
        SourceGroup::Photo,
        SourceGroup::Specialized,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IdentityTracking => "identity-tracking",
            Self::Classification => "classification",
            Self::NationalRegistry => "national-registry",
            Self::Photo => "photo",
            Self::Specialized => "specialized",
        }
    }

    /// Most photos kept from a single source of this group
    pub fn photo_cap(&self) -> usize {
        match self {
            Self::Photo => 3,
            _ => 5,
        }
    }
}

/// What a source can provide
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub photos: bool,
    pub tracking: bool,
    pub certificates: bool,
    pub requires_subscription: bool,
}

/// A queryable external source
#[derive(Debug, Clone)]
pub struct SourceDescriptor {
    pub name: String,
    pub group: SourceGroup,
    pub base_url: String,

    /// URL with an `{imo}` placeholder
    pub query_url_template: String,

    /// Declared reliability in [0, 1]
    pub reliability_prior: f64,

    /// Pause after every attempt against this source
    pub min_interval: Duration,

    pub capabilities: Capabilities,
    pub parser: SourceParser,
}

impl SourceDescriptor {
    /// Creates a descriptor with the generic parser and no pause between attempts
    pub fn new(
        name: impl Into<String>,
        group: SourceGroup,
        query_url_template: impl Into<String>,
        reliability_prior: f64,
    ) -> Self {
        let query_url_template = query_url_template.into();
        let base_url = Url::parse(&query_url_template.replace(IMO_PLACEHOLDER, "0"))
            .map(|u| u.origin().ascii_serialization())
            .unwrap_or_default();

        Self {
            name: name.into(),
            group,
            base_url,
            query_url_template,
            reliability_prior: reliability_prior.clamp(0.0, 1.0),
            min_interval: Duration::ZERO,
            capabilities: Capabilities::default(),
            parser: SourceParser::Generic,
        }
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    pub fn with_parser(mut self, parser: SourceParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Builds the query URL for an identifier
    pub fn query_url(&self, imo: &Imo) -> Result<Url, SourceError> {
        let raw = self.query_url_template.replace(IMO_PLACEHOLDER, imo.as_str());
        Url::parse(&raw).map_err(|e| SourceError::InvalidUrl(format!("{}: {}", raw, e)))
    }
}

/// Catalog of sources grouped by capability class
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    version: String,
    sources: Vec<SourceDescriptor>,
}

impl SourceRegistry {
    /// Creates a custom registry, e.g. for tests or a private deployment
    pub fn new(version: impl Into<String>, sources: Vec<SourceDescriptor>) -> Self {
        Self {
            version: version.into(),
            sources,
        }
    }

    /// The built-in catalog of public maritime sources
    pub fn builtin() -> Self {
        Self::new(REGISTRY_VERSION, builtin_sources())
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, name: &str) -> Option<&SourceDescriptor> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Sources of one group, in catalog order
    pub fn in_group(&self, group: SourceGroup) -> Vec<&SourceDescriptor> {
        self.sources.iter().filter(|s| s.group == group).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceDescriptor> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn secs(s: f64) -> Duration {
    Duration::from_secs_f64(s)
}

fn builtin_sources() -> Vec<SourceDescriptor> {
    use SourceGroup::*;

    let tracking = Capabilities {
        photos: true,
        tracking: true,
        ..Default::default()
    };
    let certificates = Capabilities {
        certificates: true,
        ..Default::default()
    };
    let photos = Capabilities {
        photos: true,
        ..Default::default()
    };

    vec![
        SourceDescriptor::new(
            "MarineTraffic",
            IdentityTracking,
            "https://www.marinetraffic.com/en/ais/details/ships/imo:{imo}",
            0.95,
        )
        .with_min_interval(secs(3.0))
        .with_capabilities(tracking)
        .with_parser(SourceParser::DetailTable),
        SourceDescriptor::new(
            "VesselFinder",
            IdentityTracking,
            "https://www.vesselfinder.com/vessels/imo-{imo}",
            0.90,
        )
        .with_min_interval(secs(2.0))
        .with_capabilities(tracking)
        .with_parser(SourceParser::SpecList),
        SourceDescriptor::new(
            "FleetMon",
            IdentityTracking,
            "https://www.fleetmon.com/vessels/{imo}",
            0.85,
        )
        .with_min_interval(secs(2.5))
        .with_capabilities(tracking)
        .with_parser(SourceParser::DetailRows),
        SourceDescriptor::new(
            "Lloyd's Register",
            Classification,
            "https://www.lr.org/en/ship-search/?imo={imo}",
            0.95,
        )
        .with_min_interval(secs(4.0))
        .with_capabilities(certificates),
        SourceDescriptor::new(
            "DNV",
            Classification,
            "https://exchange.dnv.com/maritime/search?imo={imo}",
            0.90,
        )
        .with_min_interval(secs(4.0))
        .with_capabilities(certificates),
        SourceDescriptor::new(
            "ABS",
            Classification,
            "https://ww2.eagle.org/eaglexpress/eagleexpress?imo={imo}",
            0.90,
        )
        .with_min_interval(secs(4.0))
        .with_capabilities(certificates),
        SourceDescriptor::new(
            "Marine21 Malaysia",
            NationalRegistry,
            "https://marine21.marine.gov.my/Ship/public_list_ship.cfm?imo={imo}",
            0.85,
        )
        .with_min_interval(secs(3.0)),
        SourceDescriptor::new(
            "MISR Malaysia",
            NationalRegistry,
            "https://misr.com/registry/search?imo={imo}",
            0.80,
        )
        .with_min_interval(secs(3.0)),
        SourceDescriptor::new(
            "Singapore Registry",
            NationalRegistry,
            "https://www.mpa.gov.sg/maritime-singapore/singapore-registry-of-ships/ship-search?imo={imo}",
            0.90,
        )
        .with_min_interval(secs(4.0)),
        SourceDescriptor::new(
            "ShipSpotting",
            Photo,
            "https://www.shipspotting.com/photos/search?imo={imo}",
            0.85,
        )
        .with_min_interval(secs(2.0))
        .with_capabilities(photos)
        .with_parser(SourceParser::PhotoGallery),
        SourceDescriptor::new(
            "Flickr Maritime",
            Photo,
            "https://www.flickr.com/search/?text={imo}+vessel+ship",
            0.70,
        )
        .with_min_interval(secs(2.0))
        .with_capabilities(photos)
        .with_parser(SourceParser::PhotoGallery),
        SourceDescriptor::new(
            "Maritime Connector",
            Photo,
            "https://maritime-connector.com/ships/search?imo={imo}",
            0.75,
        )
        .with_min_interval(secs(1.5))
        .with_capabilities(photos),
        SourceDescriptor::new(
            "IHS Sea-web",
            Specialized,
            "https://sea-web.ihs.com/search?imo={imo}",
            0.95,
        )
        .with_min_interval(secs(5.0))
        .with_capabilities(Capabilities {
            requires_subscription: true,
            ..Default::default()
        }),
        SourceDescriptor::new(
            "Equasis",
            Specialized,
            "http://www.equasis.org/EquasisWeb/public/PublicShipSearch?imo={imo}",
            0.90,
        )
        .with_min_interval(secs(4.0))
        .with_capabilities(certificates),
    ]
}
