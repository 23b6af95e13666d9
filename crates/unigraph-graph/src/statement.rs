//! Named, parameterized Cypher statements and the rows they return.
//!
//! Every query the catalog issues is built here from fixed labels, keys, and
//! relationship types. Caller-supplied values only ever travel as parameters.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use unigraph_core::{LinkKind, NodeKind};

use crate::error::{GraphError, Result};

/// Parameter holding the identity attribute value in keyed statements.
pub const KEY_PARAM: &str = "key";
/// Link parameters: identity of the relationship's start and end node.
pub const SOURCE_PARAM: &str = "source";
pub const TARGET_PARAM: &str = "target";
pub const CAMPUS_NAME_PARAM: &str = "campus_name";

/// Which fixed statement this is. Stores that do not speak Cypher
/// (the in-memory store) dispatch on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    FindByKey(NodeKind),
    ListAll(NodeKind),
    Create(NodeKind),
    Update(NodeKind),
    Delete(NodeKind),
    Link(LinkKind),
    EnsureUniqueKey(NodeKind),
    DegreeCountByFaculty,
    BranchesWithDegrees,
    AverageRejectedByCampus,
    DegreesByCampus,
    SchoolsWithDegrees,
    DegreesAboveAverageCredits,
    DegreeCountByBranch,
}

impl StatementKind {
    /// Stable name, e.g. `find_by_key:Degree` or `degree_count_by_faculty`.
    pub fn name(&self) -> String {
        match self {
            Self::FindByKey(k) => format!("find_by_key:{}", k.label()),
            Self::ListAll(k) => format!("list_all:{}", k.label()),
            Self::Create(k) => format!("create:{}", k.label()),
            Self::Update(k) => format!("update:{}", k.label()),
            Self::Delete(k) => format!("delete:{}", k.label()),
            Self::Link(l) => format!(
                "link:{}-{}->{}",
                l.source().label(),
                l.rel().as_str(),
                l.target().label()
            ),
            Self::EnsureUniqueKey(k) => format!("ensure_unique_key:{}", k.label()),
            Self::DegreeCountByFaculty => "degree_count_by_faculty".to_string(),
            Self::BranchesWithDegrees => "branches_with_degrees".to_string(),
            Self::AverageRejectedByCampus => "average_rejected_by_campus".to_string(),
            Self::DegreesByCampus => "degrees_by_campus".to_string(),
            Self::SchoolsWithDegrees => "schools_with_degrees".to_string(),
            Self::DegreesAboveAverageCredits => "degrees_above_average_credits".to_string(),
            Self::DegreeCountByBranch => "degree_count_by_branch".to_string(),
        }
    }
}

/// Expected shape of a result column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// A whole node, materialized as a JSON object of its properties.
    Node(NodeKind),
    Text,
    Integer,
    Float,
    /// A 64-bit integer that may have been stored as text.
    WideInt,
    TextList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
}

const fn col(name: &'static str, kind: ColumnKind) -> Column {
    Column { name, kind }
}

/// One fixed query with bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    kind: StatementKind,
    cypher: String,
    params: Map<String, Value>,
    columns: Vec<Column>,
}

impl Statement {
    fn new(kind: StatementKind, cypher: String, columns: Vec<Column>) -> Self {
        Self {
            kind,
            cypher,
            params: Map::new(),
            columns,
        }
    }

    fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn name(&self) -> String {
        self.kind.name()
    }

    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// Bound value of `name`, `Null` when unbound.
    pub fn get_param(&self, name: &str) -> &Value {
        self.params.get(name).unwrap_or(&Value::Null)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    // ── Keyed Node Statements ────────────────────────────────────

    pub fn find_by_key(kind: NodeKind, key: &str) -> Self {
        let cypher = format!(
            "MATCH (n:{label} {{{k}: ${KEY_PARAM}}}) RETURN n",
            label = kind.label(),
            k = kind.key(),
        );
        Self::new(
            StatementKind::FindByKey(kind),
            cypher,
            vec![col("n", ColumnKind::Node(kind))],
        )
        .param(KEY_PARAM, key)
    }

    pub fn list_all(kind: NodeKind) -> Self {
        let cypher = format!("MATCH (n:{}) RETURN n", kind.label());
        Self::new(
            StatementKind::ListAll(kind),
            cypher,
            vec![col("n", ColumnKind::Node(kind))],
        )
    }

    /// `CREATE` with the identity attribute plus every schema attribute.
    /// Attributes missing from `attrs` are bound as null.
    pub fn create(kind: NodeKind, key: &str, attrs: &Map<String, Value>) -> Self {
        let mut props = vec![format!("{}: ${KEY_PARAM}", kind.key())];
        props.extend(
            kind.attributes()
                .iter()
                .map(|a| format!("{0}: ${0}", a.name)),
        );
        let cypher = format!(
            "CREATE (n:{label} {{{props}}}) RETURN n",
            label = kind.label(),
            props = props.join(", "),
        );
        Self::new(
            StatementKind::Create(kind),
            cypher,
            vec![col("n", ColumnKind::Node(kind))],
        )
        .param(KEY_PARAM, key)
        .bind_attributes(kind, attrs)
    }

    /// Match by identity and overwrite every other attribute, nulls included.
    pub fn update(kind: NodeKind, key: &str, attrs: &Map<String, Value>) -> Self {
        let assignments: Vec<String> = kind
            .attributes()
            .iter()
            .map(|a| format!("n.{0} = ${0}", a.name))
            .collect();
        let set_clause = if assignments.is_empty() {
            String::new()
        } else {
            format!(" SET {}", assignments.join(", "))
        };
        let cypher = format!(
            "MATCH (n:{label} {{{k}: ${KEY_PARAM}}}){set_clause} RETURN n",
            label = kind.label(),
            k = kind.key(),
        );
        Self::new(
            StatementKind::Update(kind),
            cypher,
            vec![col("n", ColumnKind::Node(kind))],
        )
        .param(KEY_PARAM, key)
        .bind_attributes(kind, attrs)
    }

    /// Delete a node and its relationships; always returns one row with
    /// the number of deleted nodes.
    pub fn delete(kind: NodeKind, key: &str) -> Self {
        let cypher = format!(
            "MATCH (n:{label} {{{k}: ${KEY_PARAM}}}) DETACH DELETE n RETURN count(n) AS deleted",
            label = kind.label(),
            k = kind.key(),
        );
        Self::new(
            StatementKind::Delete(kind),
            cypher,
            vec![col("deleted", ColumnKind::Integer)],
        )
        .param(KEY_PARAM, key)
    }

    /// Match both endpoints by identity and create the relationship.
    /// Yields no rows when either endpoint is missing.
    pub fn link(link: LinkKind, source: &str, target: &str) -> Self {
        let (from, to) = (link.source(), link.target());
        let cypher = format!(
            "MATCH (a:{from_label} {{{from_key}: ${SOURCE_PARAM}}}), \
             (b:{to_label} {{{to_key}: ${TARGET_PARAM}}}) \
             CREATE (a)-[:{rel}]->(b) \
             RETURN a.{from_key} AS source, b.{to_key} AS target",
            from_label = from.label(),
            from_key = from.key(),
            to_label = to.label(),
            to_key = to.key(),
            rel = link.rel().as_str(),
        );
        Self::new(
            StatementKind::Link(link),
            cypher,
            vec![
                col("source", ColumnKind::Text),
                col("target", ColumnKind::Text),
            ],
        )
        .param(SOURCE_PARAM, source)
        .param(TARGET_PARAM, target)
    }

    pub fn ensure_unique_key(kind: NodeKind) -> Self {
        let cypher = format!(
            "CREATE CONSTRAINT {name}_{k}_unique IF NOT EXISTS \
             FOR (n:{label}) REQUIRE n.{k} IS UNIQUE",
            name = kind.label().to_lowercase(),
            label = kind.label(),
            k = kind.key(),
        );
        Self::new(StatementKind::EnsureUniqueKey(kind), cypher, Vec::new())
    }

    fn bind_attributes(mut self, kind: NodeKind, attrs: &Map<String, Value>) -> Self {
        for attr in kind.attributes() {
            let value = attrs.get(attr.name).cloned().unwrap_or(Value::Null);
            self.params.insert(attr.name.to_string(), value);
        }
        self
    }

    // ── Aggregations ─────────────────────────────────────────────

    pub fn degree_count_by_faculty() -> Self {
        Self::new(
            StatementKind::DegreeCountByFaculty,
            "MATCH (f:Faculty)-[:TEACHES]->(d:Degree)
             RETURN f.name AS faculty, count(d) AS degree_count
             ORDER BY degree_count DESC, faculty"
                .to_string(),
            vec![
                col("faculty", ColumnKind::Text),
                col("degree_count", ColumnKind::Integer),
            ],
        )
    }

    pub fn branches_with_degrees() -> Self {
        Self::new(
            StatementKind::BranchesWithDegrees,
            "MATCH (b:Branch)<-[:TYPE]-(d:Degree)
             RETURN b.name AS branch, collect(d.name) AS degrees"
                .to_string(),
            vec![
                col("branch", ColumnKind::Text),
                col("degrees", ColumnKind::TextList),
            ],
        )
    }

    /// Any node that TEACHES a degree and is LOCATED_IN a campus counts,
    /// whatever its label.
    pub fn average_rejected_by_campus() -> Self {
        Self::new(
            StatementKind::AverageRejectedByCampus,
            "MATCH (d:Degree)<-[:TEACHES]-(s)-[:LOCATED_IN]->(c:Campus)
             RETURN c.name AS campus,
                    avg(d.applications - d.students_first_year_2013) AS rejected
             ORDER BY campus"
                .to_string(),
            vec![
                col("campus", ColumnKind::Text),
                col("rejected", ColumnKind::Float),
            ],
        )
    }

    pub fn degrees_by_campus(campus_name: &str) -> Self {
        Self::new(
            StatementKind::DegreesByCampus,
            format!(
                "MATCH (c:Campus {{name: ${CAMPUS_NAME_PARAM}}})<-[:LOCATED_IN]-(s:School)-[:TEACHES]->(d:Degree)
                 RETURN d.name AS degree"
            ),
            vec![col("degree", ColumnKind::Text)],
        )
        .param(CAMPUS_NAME_PARAM, campus_name)
    }

    pub fn schools_with_degrees() -> Self {
        Self::new(
            StatementKind::SchoolsWithDegrees,
            "MATCH (s:School)-[:TEACHES]->(d:Degree)
             RETURN s.name AS school, collect(d.name) AS degrees"
                .to_string(),
            vec![
                col("school", ColumnKind::Text),
                col("degrees", ColumnKind::TextList),
            ],
        )
    }

    /// The mean is taken over all degrees first, then compared per degree.
    /// `credits * n > total` keeps the comparison in integers.
    pub fn degrees_above_average_credits() -> Self {
        Self::new(
            StatementKind::DegreesAboveAverageCredits,
            "MATCH (d:Degree)
             WITH sum(d.credits) AS total, count(d.credits) AS n
             MATCH (a:Degree)
             WHERE n > 0 AND a.credits * n > total
             RETURN DISTINCT a.code AS code, a.name AS name, a.credits AS credits"
                .to_string(),
            vec![
                col("code", ColumnKind::Text),
                col("name", ColumnKind::Text),
                col("credits", ColumnKind::WideInt),
            ],
        )
    }

    pub fn degree_count_by_branch() -> Self {
        Self::new(
            StatementKind::DegreeCountByBranch,
            "MATCH (b:Branch)<-[:TYPE]-(d:Degree)
             RETURN b.name AS branch, count(d) AS degree_count
             ORDER BY degree_count DESC, branch"
                .to_string(),
            vec![
                col("branch", ColumnKind::Text),
                col("degree_count", ColumnKind::Integer),
            ],
        )
    }
}

/// A result row: named fields in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    /// Field value; `Null` when the column is absent.
    pub fn get(&self, name: &str) -> &Value {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map_or(&Value::Null, |(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Deserialize one field.
    pub fn decode<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        serde_json::from_value(self.get(name).clone()).map_err(|e| {
            GraphError::Serialization(format!("Failed to decode column {name}: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigraph_core::{Degree, Entity, WideInt};

    #[test]
    fn keyed_statements_bind_key_as_parameter() {
        let st = Statement::find_by_key(NodeKind::Degree, "x' OR 1=1");
        assert_eq!(st.cypher(), "MATCH (n:Degree {code: $key}) RETURN n");
        assert_eq!(st.get_param(KEY_PARAM).as_str(), Some("x' OR 1=1"));
        assert_eq!(st.name(), "find_by_key:Degree");
    }

    #[test]
    fn create_binds_every_attribute() {
        let degree = Degree {
            credits: Some(WideInt(240)),
            ..Degree::new("G10", "Law")
        };
        let st = Statement::create(NodeKind::Degree, degree.key(), &degree.attributes());
        assert!(st.cypher().starts_with("CREATE (n:Degree {code: $key, name: $name"));
        assert_eq!(st.params().len(), 1 + NodeKind::Degree.attributes().len());
        assert_eq!(st.get_param("credits"), 240);
        assert_eq!(st.get_param("applications"), &Value::Null);
    }

    #[test]
    fn update_sets_all_non_key_attributes() {
        let st = Statement::update(NodeKind::Faculty, "Science", &Map::new());
        assert_eq!(
            st.cypher(),
            "MATCH (n:Faculty {name: $key}) SET n.foundation = $foundation, n.web = $web RETURN n"
        );
        assert_eq!(st.get_param("web"), &Value::Null);

        let branch = Statement::update(NodeKind::Branch, "Arts", &Map::new());
        assert_eq!(branch.cypher(), "MATCH (n:Branch {name: $key}) RETURN n");
    }

    #[test]
    fn delete_detaches_relationships() {
        let st = Statement::delete(NodeKind::Campus, "Norte");
        assert!(st.cypher().contains("DETACH DELETE n"));
        assert_eq!(st.columns()[0].name, "deleted");
    }

    #[test]
    fn link_matches_both_endpoints_by_identity() {
        let st = Statement::link(LinkKind::DegreeTypeBranch, "G10", "Arts");
        assert!(st
            .cypher()
            .starts_with("MATCH (a:Degree {code: $source}), (b:Branch {name: $target})"));
        assert!(st.cypher().contains("CREATE (a)-[:TYPE]->(b)"));
        assert_eq!(st.name(), "link:Degree-TYPE->Branch");
    }

    #[test]
    fn partner_label_keeps_underscore() {
        let st = Statement::list_all(NodeKind::PartnerInstitution);
        assert_eq!(st.cypher(), "MATCH (n:Partner_institution) RETURN n");
        let constraint = Statement::ensure_unique_key(NodeKind::PartnerInstitution);
        assert!(constraint.cypher().contains("partner_institution_name_unique"));
    }

    #[test]
    fn row_lookup_and_decode() {
        let row = Row::new().with("faculty", "Science").with("degree_count", 4);
        assert_eq!(row.len(), 2);
        assert_eq!(row.decode::<String>("faculty").unwrap(), "Science");
        assert_eq!(row.decode::<i64>("degree_count").unwrap(), 4);
        assert_eq!(row.get("missing"), &Value::Null);
        assert!(row.decode::<i64>("faculty").is_err());
    }
}
