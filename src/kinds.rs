//! Namespace kind classification
//!
//! Classifies a namespace URI by its role in the NIEM layered architecture:
//! which release generation it belongs to, whether it is core, a domain, a
//! utility (and which one), or infrastructure, and which version it carries.
//!
//! Classification is derived from the shape of the URI. A caller may install
//! an explicit record for an exact URI with [`NamespaceKinds::set`]; such
//! overrides win over pattern matching for the life of the classifier.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use crate::{XML_NAMESPACE, XSD_INSTANCE_NAMESPACE, XSD_NAMESPACE};

/// Exchange-model architecture generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Architecture {
    /// Not a recognised generation
    Unknown,
    /// NIEM 5 (`release.niem.gov` / `reference.niem.gov`)
    Niem5,
    /// NIEM 6 (NIEMOpen at `docs.oasis-open.org`)
    Niem6,
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Architecture::Unknown => "unknown",
            Architecture::Niem5 => "NIEM5",
            Architecture::Niem6 => "NIEM6",
        })
    }
}

/// Structural kind of a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Nothing known about this namespace
    Unrecognized,
    /// The `xml:` namespace
    Xml,
    /// XML Schema and XML Schema instance namespaces
    Xsd,
    /// NIEM Core
    Core,
    /// A NIEM domain
    Domain,
    /// Other namespaces of the model (code lists, adapters)
    OtherNiem,
    /// A utility namespace; see [`UtilityKind`]
    Utility,
    /// An extension namespace
    Extension,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Unrecognized => "UNKNOWN",
            Kind::Xml => "XML",
            Kind::Xsd => "XSD",
            Kind::Core => "CORE",
            Kind::Domain => "DOMAIN",
            Kind::OtherNiem => "OTHERNIEM",
            Kind::Utility => "UTILITY",
            Kind::Extension => "EXTENSION",
        })
    }
}

/// Subdivision of [`Kind::Utility`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UtilityKind {
    /// Appinfo attributes
    Appinfo,
    /// Code list instance attributes
    CodeListInstance,
    /// Code list schema appinfo
    CodeListSchemaAppinfo,
    /// Conformance targets attribute
    ConformanceTargets,
    /// Proxy types for XSD simple types
    Proxy,
    /// Structures
    Structures,
    /// Not a utility namespace
    NotUtility,
}

impl fmt::Display for UtilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UtilityKind::Appinfo => "APPINFO",
            UtilityKind::CodeListInstance => "CLI",
            UtilityKind::CodeListSchemaAppinfo => "CLSA",
            UtilityKind::ConformanceTargets => "CONFORM",
            UtilityKind::Proxy => "PROXY",
            UtilityKind::Structures => "STRUCTURES",
            UtilityKind::NotUtility => "NOTUTILITY",
        })
    }
}

/// Everything known about one namespace URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRecord {
    /// Architecture generation
    pub architecture: Architecture,
    /// Structural kind
    pub kind: Kind,
    /// Utility subdivision
    pub utility_kind: UtilityKind,
    /// Version path segment, empty when unknown
    pub version: String,
}

impl KindRecord {
    fn unrecognized(architecture: Architecture) -> Self {
        Self {
            architecture,
            kind: Kind::Unrecognized,
            utility_kind: UtilityKind::NotUtility,
            version: String::new(),
        }
    }

    fn infrastructure(kind: Kind) -> Self {
        Self {
            kind,
            ..Self::unrecognized(Architecture::Unknown)
        }
    }
}

/// One URI shape: the pattern's `ver` group holds the version
struct Pattern {
    regex: Regex,
    kind: Kind,
    utility_kind: UtilityKind,
}

fn pattern(re: &str, kind: Kind, utility_kind: UtilityKind) -> Pattern {
    let version = r"(?P<ver>\d+(?:\.\d+)*(?:-[A-Za-z0-9]+)?)";
    Pattern {
        regex: Regex::new(&format!("^{}$", re.replace("VER", version)))
            .expect("namespace pattern is valid"),
        kind,
        utility_kind,
    }
}

const NIEM5_RELEASE: &str = "http://release.niem.gov/niem/";
const NIEM5_REFERENCE: &str = "http://reference.niem.gov/niem/";
const NIEM6_BASE: &str = "https://docs.oasis-open.org/niemopen/ns/";

// Utilities come first so `adapters/niem-xs` is a proxy, not an adapter
static NIEM5_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    use Kind::*;
    use UtilityKind::*;
    vec![
        pattern(r"http://release\.niem\.gov/niem/appinfo/VER/", Utility, Appinfo),
        pattern(r"http://release\.niem\.gov/niem/structures/VER/", Utility, Structures),
        pattern(r"http://release\.niem\.gov/niem/proxy/niem-xs/VER/", Utility, Proxy),
        pattern(r"http://release\.niem\.gov/niem/conformanceTargets/VER/", Utility, ConformanceTargets),
        pattern(
            r"http://reference\.niem\.gov/niem/specification/code-lists/VER/code-lists-instance/",
            Utility,
            CodeListInstance,
        ),
        pattern(
            r"http://reference\.niem\.gov/niem/specification/code-lists/VER/code-lists-schema-appinfo/",
            Utility,
            CodeListSchemaAppinfo,
        ),
        pattern(r"http://release\.niem\.gov/niem/niem-core/VER/", Core, NotUtility),
        pattern(r"http://release\.niem\.gov/niem/domains/[^/]+/VER/", Domain, NotUtility),
        pattern(r"http://release\.niem\.gov/niem/codes/(?:[^/]+/)+VER/", OtherNiem, NotUtility),
        pattern(r"http://release\.niem\.gov/niem/adapters/[^/]+/VER/", OtherNiem, NotUtility),
    ]
});

static NIEM6_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    use Kind::*;
    use UtilityKind::*;
    vec![
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/appinfo/VER/", Utility, Appinfo),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/structures/VER/", Utility, Structures),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/adapters/niem-xs/VER/", Utility, Proxy),
        pattern(
            r"https://docs\.oasis-open\.org/niemopen/ns/specification/conformanceTargets/VER/",
            Utility,
            ConformanceTargets,
        ),
        pattern(
            r"https://docs\.oasis-open\.org/niemopen/ns/specification/code-lists/VER/instance/",
            Utility,
            CodeListInstance,
        ),
        pattern(
            r"https://docs\.oasis-open\.org/niemopen/ns/specification/code-lists/VER/appinfo/",
            Utility,
            CodeListSchemaAppinfo,
        ),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/niem-core/VER/", Core, NotUtility),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/domains/[^/]+/VER/", Domain, NotUtility),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/codes/(?:[^/]+/)+VER/", OtherNiem, NotUtility),
        pattern(r"https://docs\.oasis-open\.org/niemopen/ns/model/adapters/[^/]+/VER/", OtherNiem, NotUtility),
    ]
});

/// Derive a record from the URI alone
pub fn classify_uri(uri: &str) -> KindRecord {
    match uri {
        XSD_NAMESPACE | XSD_INSTANCE_NAMESPACE => return KindRecord::infrastructure(Kind::Xsd),
        XML_NAMESPACE => return KindRecord::infrastructure(Kind::Xml),
        _ => {}
    }
    let (architecture, patterns) = if uri.starts_with(NIEM5_RELEASE) || uri.starts_with(NIEM5_REFERENCE) {
        (Architecture::Niem5, &*NIEM5_PATTERNS)
    } else if uri.starts_with(NIEM6_BASE) {
        (Architecture::Niem6, &*NIEM6_PATTERNS)
    } else {
        return KindRecord::unrecognized(Architecture::Unknown);
    };
    for p in patterns {
        if let Some(caps) = p.regex.captures(uri) {
            return KindRecord {
                architecture,
                kind: p.kind,
                utility_kind: p.utility_kind,
                version: caps.name("ver").map(|m| m.as_str().to_string()).unwrap_or_default(),
            };
        }
    }
    KindRecord::unrecognized(architecture)
}

static NDR_TARGETS: Lazy<[(Architecture, Regex); 2]> = Lazy::new(|| {
    [
        (
            Architecture::Niem5,
            Regex::new(r"^http://reference\.niem\.gov/niem/specification/naming-and-design-rules/(?P<ver>[^/#]+)/#")
                .expect("NDR pattern is valid"),
        ),
        (
            Architecture::Niem6,
            Regex::new(r"^https://docs\.oasis-open\.org/niemopen/ns/specification/NDR/(?P<ver>[^/#]+)/#")
                .expect("NDR pattern is valid"),
        ),
    ]
});

/// Architecture and NDR version named by a conformance target URI
///
/// `http://reference.niem.gov/niem/specification/naming-and-design-rules/5.0/#ExtensionSchemaDocument`
/// yields `(Niem5, "5.0")`.
pub fn ndr_conformance(target: &str) -> Option<(Architecture, String)> {
    NDR_TARGETS.iter().find_map(|(arch, re)| {
        re.captures(target)
            .and_then(|caps| caps.name("ver"))
            .map(|ver| (*arch, ver.as_str().to_string()))
    })
}

/// Caller-owned namespace classifier with explicit overrides
///
/// Pattern-derived records are memoised on first query.
#[derive(Debug, Default)]
pub struct NamespaceKinds {
    overrides: HashMap<String, KindRecord>,
    derived: RefCell<HashMap<String, KindRecord>>,
}

impl NamespaceKinds {
    /// Create a classifier with no overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an explicit record for `uri`
    pub fn set(
        &mut self,
        uri: &str,
        architecture: Architecture,
        kind: Kind,
        utility_kind: UtilityKind,
        version: &str,
    ) {
        self.overrides.insert(
            uri.to_string(),
            KindRecord {
                architecture,
                kind,
                utility_kind,
                version: version.to_string(),
            },
        );
    }

    /// True if an explicit record exists for `uri`
    pub fn is_overridden(&self, uri: &str) -> bool {
        self.overrides.contains_key(uri)
    }

    /// Full record for `uri`
    pub fn record(&self, uri: &str) -> KindRecord {
        if let Some(rec) = self.overrides.get(uri) {
            return rec.clone();
        }
        self.derived
            .borrow_mut()
            .entry(uri.to_string())
            .or_insert_with(|| classify_uri(uri))
            .clone()
    }

    /// Architecture generation of `uri`
    pub fn architecture(&self, uri: &str) -> Architecture {
        self.record(uri).architecture
    }

    /// Structural kind of `uri`
    pub fn kind(&self, uri: &str) -> Kind {
        self.record(uri).kind
    }

    /// Utility subdivision of `uri`
    pub fn utility_kind(&self, uri: &str) -> UtilityKind {
        self.record(uri).utility_kind
    }

    /// Version segment of `uri`, empty when unknown
    pub fn version(&self, uri: &str) -> String {
        self.record(uri).version
    }
}
