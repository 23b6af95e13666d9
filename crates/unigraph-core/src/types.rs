//! Core domain types for the unigraph academic catalog.
//!
//! Six node kinds, each identified by a natural key, connected by three
//! attribute-less relationship kinds. The store's internal node ids never
//! appear in these types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::wide::WideInt;

// ── Schema ────────────────────────────────────────────────────────

/// How an attribute is stored and coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Text,
    Float,
    /// A 64-bit integer exposed as the `BigInt` scalar.
    WideInt,
}

/// A non-identity attribute of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub kind: AttrKind,
}

const fn attr(name: &'static str, kind: AttrKind) -> Attribute {
    Attribute { name, kind }
}

const DEGREE_ATTRS: &[Attribute] = &[
    attr("name", AttrKind::Text),
    attr("offered_places", AttrKind::WideInt),
    attr("mark_cut_off", AttrKind::Float),
    attr("credits", AttrKind::WideInt),
    attr("applications", AttrKind::WideInt),
    attr("students_first_year_2013", AttrKind::WideInt),
];
const CAMPUS_ATTRS: &[Attribute] = &[attr("city", AttrKind::Text)];
const BRANCH_ATTRS: &[Attribute] = &[];
const FOUNDED_ATTRS: &[Attribute] = &[
    attr("foundation", AttrKind::WideInt),
    attr("web", AttrKind::Text),
];
const PARTNER_ATTRS: &[Attribute] = &[attr("web", AttrKind::Text)];

/// The fixed set of node labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    Degree,
    Campus,
    Branch,
    Faculty,
    School,
    PartnerInstitution,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        Self::Degree,
        Self::Campus,
        Self::Branch,
        Self::Faculty,
        Self::School,
        Self::PartnerInstitution,
    ];

    /// Graph label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Degree => "Degree",
            Self::Campus => "Campus",
            Self::Branch => "Branch",
            Self::Faculty => "Faculty",
            Self::School => "School",
            Self::PartnerInstitution => "Partner_institution",
        }
    }

    /// Identity attribute: the only way a node is looked up.
    pub fn key(self) -> &'static str {
        match self {
            Self::Degree => "code",
            _ => "name",
        }
    }

    /// Every attribute except the identity attribute.
    pub fn attributes(self) -> &'static [Attribute] {
        match self {
            Self::Degree => DEGREE_ATTRS,
            Self::Campus => CAMPUS_ATTRS,
            Self::Branch => BRANCH_ATTRS,
            Self::Faculty | Self::School => FOUNDED_ATTRS,
            Self::PartnerInstitution => PARTNER_ATTRS,
        }
    }

    /// Human-readable noun used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Degree => "degree",
            Self::Campus => "campus",
            Self::Branch => "branch",
            Self::Faculty => "faculty",
            Self::School => "school",
            Self::PartnerInstitution => "partner institution",
        }
    }

    /// Whether `create` checks for an existing node before writing.
    ///
    /// Only Degree does; the other kinds rely on the store's own
    /// duplicate-key behavior.
    pub fn prechecks_duplicates(self) -> bool {
        matches!(self, Self::Degree)
    }
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Relationship types. Relationships carry no attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    Teaches,
    LocatedIn,
    Type,
}

impl RelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teaches => "TEACHES",
            Self::LocatedIn => "LOCATED_IN",
            Self::Type => "TYPE",
        }
    }
}

/// The fixed link operations. Each creates one relationship between two
/// existing nodes matched by identity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkKind {
    SchoolTeachesDegree,
    FacultyTeachesDegree,
    PartnerTeachesDegree,
    SchoolLocatedInCampus,
    FacultyLocatedInCampus,
    PartnerLocatedInCampus,
    DegreeTypeBranch,
}

impl LinkKind {
    pub const ALL: [LinkKind; 7] = [
        Self::SchoolTeachesDegree,
        Self::FacultyTeachesDegree,
        Self::PartnerTeachesDegree,
        Self::SchoolLocatedInCampus,
        Self::FacultyLocatedInCampus,
        Self::PartnerLocatedInCampus,
        Self::DegreeTypeBranch,
    ];

    pub fn source(self) -> NodeKind {
        match self {
            Self::SchoolTeachesDegree | Self::SchoolLocatedInCampus => NodeKind::School,
            Self::FacultyTeachesDegree | Self::FacultyLocatedInCampus => NodeKind::Faculty,
            Self::PartnerTeachesDegree | Self::PartnerLocatedInCampus => {
                NodeKind::PartnerInstitution
            }
            Self::DegreeTypeBranch => NodeKind::Degree,
        }
    }

    pub fn target(self) -> NodeKind {
        match self {
            Self::SchoolTeachesDegree | Self::FacultyTeachesDegree | Self::PartnerTeachesDegree => {
                NodeKind::Degree
            }
            Self::SchoolLocatedInCampus
            | Self::FacultyLocatedInCampus
            | Self::PartnerLocatedInCampus => NodeKind::Campus,
            Self::DegreeTypeBranch => NodeKind::Branch,
        }
    }

    pub fn rel(self) -> RelType {
        match self {
            Self::SchoolTeachesDegree | Self::FacultyTeachesDegree | Self::PartnerTeachesDegree => {
                RelType::Teaches
            }
            Self::SchoolLocatedInCampus
            | Self::FacultyLocatedInCampus
            | Self::PartnerLocatedInCampus => RelType::LocatedIn,
            Self::DegreeTypeBranch => RelType::Type,
        }
    }

    /// Confirmation message naming both endpoints.
    pub fn confirmation(self, source: &str, target: &str) -> String {
        let noun = capitalize(self.source().noun());
        match self.rel() {
            RelType::Teaches => format!("{noun} {source} teaches degree {target}."),
            RelType::LocatedIn => format!("{noun} {source} is located in campus {target}."),
            RelType::Type => format!("{noun} {source} is of branch {target}."),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Entities ──────────────────────────────────────────────────────

/// A node record that can be written to and read from the graph.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: NodeKind;

    /// Value of the identity attribute.
    fn key(&self) -> &str;

    /// Non-identity attributes in stored form. Absent values are `null`
    /// so that updates clear them.
    fn attributes(&self) -> Map<String, Value>;
}

fn wide(v: Option<WideInt>) -> Value {
    v.map_or(Value::Null, WideInt::to_store_value)
}

fn text(v: &Option<String>) -> Value {
    v.clone().map_or(Value::Null, Value::String)
}

fn float(v: Option<f64>) -> Value {
    v.map_or(Value::Null, Value::from)
}

/// An academic degree, identified by its code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Degree {
    pub code: String,
    pub name: Option<String>,
    pub offered_places: Option<WideInt>,
    pub mark_cut_off: Option<f64>,
    pub credits: Option<WideInt>,
    pub applications: Option<WideInt>,
    pub students_first_year_2013: Option<WideInt>,
}

impl Degree {
    /// A degree with only its code and name set.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: Some(name.into()),
            offered_places: None,
            mark_cut_off: None,
            credits: None,
            applications: None,
            students_first_year_2013: None,
        }
    }
}

impl Entity for Degree {
    const KIND: NodeKind = NodeKind::Degree;

    fn key(&self) -> &str {
        &self.code
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("name".into(), text(&self.name));
        m.insert("offered_places".into(), wide(self.offered_places));
        m.insert("mark_cut_off".into(), float(self.mark_cut_off));
        m.insert("credits".into(), wide(self.credits));
        m.insert("applications".into(), wide(self.applications));
        m.insert(
            "students_first_year_2013".into(),
            wide(self.students_first_year_2013),
        );
        m
    }
}

/// A physical campus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campus {
    pub name: String,
    pub city: Option<String>,
}

impl Entity for Campus {
    const KIND: NodeKind = NodeKind::Campus;

    fn key(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("city".into(), text(&self.city));
        m
    }
}

/// A branch of study (e.g. "Engineering and Architecture").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
}

impl Entity for Branch {
    const KIND: NodeKind = NodeKind::Branch;

    fn key(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> Map<String, Value> {
        Map::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faculty {
    pub name: String,
    pub foundation: Option<WideInt>,
    pub web: Option<String>,
}

impl Entity for Faculty {
    const KIND: NodeKind = NodeKind::Faculty;

    fn key(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("foundation".into(), wide(self.foundation));
        m.insert("web".into(), text(&self.web));
        m
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    pub name: String,
    pub foundation: Option<WideInt>,
    pub web: Option<String>,
}

impl Entity for School {
    const KIND: NodeKind = NodeKind::School;

    fn key(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("foundation".into(), wide(self.foundation));
        m.insert("web".into(), text(&self.web));
        m
    }
}

/// An external institution that teaches degrees in partnership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerInstitution {
    pub name: String,
    pub web: Option<String>,
}

impl Entity for PartnerInstitution {
    const KIND: NodeKind = NodeKind::PartnerInstitution;

    fn key(&self) -> &str {
        &self.name
    }

    fn attributes(&self) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("web".into(), text(&self.web));
        m
    }
}

// ── Aggregate Rows ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacultyDegreeCount {
    pub faculty: String,
    pub degree_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchDegreeCount {
    pub branch: String,
    pub degree_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDegrees {
    pub branch: String,
    pub degrees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolDegrees {
    pub school: String,
    pub degrees: Vec<String>,
}

/// Average of `applications - students_first_year_2013` for one campus.
/// `None` when no contributing degree has both values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedApplicationsByCampus {
    pub campus: String,
    pub rejected: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeAboveAverage {
    pub code: String,
    pub name: Option<String>,
    pub credits: Option<WideInt>,
}
