//! In-memory graph store.
//!
//! Evaluates the fixed statement set against a property graph held in
//! memory, with the same row shapes and null semantics as Neo4j. Used to
//! test the catalog without a server; statement faults can be injected by
//! name and open sessions are counted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use unigraph_core::{LinkKind, NodeKind, RelType};

use crate::error::{GraphError, Result};
use crate::statement::{
    Row, Statement, StatementKind, CAMPUS_NAME_PARAM, KEY_PARAM, SOURCE_PARAM, TARGET_PARAM,
};
use crate::store::{GraphStore, StoreSession};

type NodeId = u64;

#[derive(Debug, Clone)]
struct MemNode {
    kind: NodeKind,
    props: Map<String, Value>,
}

#[derive(Debug, Clone, Copy)]
struct MemEdge {
    from: NodeId,
    rel: RelType,
    to: NodeId,
}

#[derive(Debug, Default)]
struct MemoryGraph {
    nodes: BTreeMap<NodeId, MemNode>,
    edges: Vec<MemEdge>,
    next_id: NodeId,
    /// Kinds with an installed uniqueness constraint on their identity key.
    unique: HashSet<NodeKind>,
}

/// Shared in-memory store. Clones share the same graph.
#[derive(Clone, Default)]
pub struct MemoryStore {
    graph: Arc<Mutex<MemoryGraph>>,
    faults: Arc<Mutex<HashMap<String, String>>>,
    open_sessions: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every statement named `statement` fail with a store fault.
    pub async fn fail_statement(&self, statement: impl Into<String>, message: impl Into<String>) {
        self.faults
            .lock()
            .await
            .insert(statement.into(), message.into());
    }

    pub async fn clear_faults(&self) {
        self.faults.lock().await.clear();
    }

    /// Sessions acquired and not yet released.
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.load(Ordering::SeqCst)
    }

    pub async fn node_count(&self, kind: NodeKind) -> usize {
        let graph = self.graph.lock().await;
        graph.nodes.values().filter(|n| n.kind == kind).count()
    }

    pub async fn relationship_count(&self, rel: RelType) -> usize {
        let graph = self.graph.lock().await;
        graph.edges.iter().filter(|e| e.rel == rel).count()
    }

    /// Stored properties of the node with the given identity, if any.
    pub async fn stored_properties(&self, kind: NodeKind, key: &str) -> Option<Map<String, Value>> {
        let graph = self.graph.lock().await;
        let id = graph.find(kind, &Value::from(key)).into_iter().next()?;
        graph.nodes.get(&id).map(|n| n.props.clone())
    }

    /// Write a property as-is, bypassing the catalog. Lets tests store
    /// wide integers in their textual form.
    pub async fn set_raw_property(&self, kind: NodeKind, key: &str, name: &str, value: Value) {
        let mut graph = self.graph.lock().await;
        let ids = graph.find(kind, &Value::from(key));
        for id in ids {
            if let Some(node) = graph.nodes.get_mut(&id) {
                node.props.insert(name.to_string(), value.clone());
            }
        }
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    type Session = MemorySession;

    async fn open(&self) -> Result<MemorySession> {
        self.open_sessions.fetch_add(1, Ordering::SeqCst);
        Ok(MemorySession {
            store: self.clone(),
            closed: false,
        })
    }
}

pub struct MemorySession {
    store: MemoryStore,
    closed: bool,
}

#[async_trait]
impl StoreSession for MemorySession {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        if self.closed {
            return Err(GraphError::Connection("session is closed".to_string()));
        }
        if let Some(message) = self.store.faults.lock().await.get(&statement.name()) {
            return Err(GraphError::Query(message.clone()));
        }
        let mut graph = self.store.graph.lock().await;
        graph.execute(statement)
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.store.open_sessions.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

// ── Evaluation ───────────────────────────────────────────────────

impl MemoryGraph {
    fn execute(&mut self, st: &Statement) -> Result<Vec<Row>> {
        match st.kind() {
            StatementKind::FindByKey(kind) => {
                let ids = self.find(kind, st.get_param(KEY_PARAM));
                Ok(self.node_rows(ids))
            }
            StatementKind::ListAll(kind) => {
                let ids = self.ids_of(kind);
                Ok(self.node_rows(ids))
            }
            StatementKind::Create(kind) => self.create(kind, st),
            StatementKind::Update(kind) => Ok(self.update(kind, st)),
            StatementKind::Delete(kind) => Ok(self.delete(kind, st)),
            StatementKind::Link(link) => Ok(self.link(link, st)),
            StatementKind::EnsureUniqueKey(kind) => self.ensure_unique_key(kind),
            StatementKind::DegreeCountByFaculty => {
                Ok(self.degree_count(NodeKind::Faculty, "faculty"))
            }
            StatementKind::DegreeCountByBranch => {
                Ok(self.degree_count(NodeKind::Branch, "branch"))
            }
            StatementKind::BranchesWithDegrees => {
                Ok(self.collect_degree_names(NodeKind::Branch, "branch"))
            }
            StatementKind::SchoolsWithDegrees => {
                Ok(self.collect_degree_names(NodeKind::School, "school"))
            }
            StatementKind::AverageRejectedByCampus => self.average_rejected_by_campus(),
            StatementKind::DegreesByCampus => {
                Ok(self.degrees_by_campus(st.get_param(CAMPUS_NAME_PARAM)))
            }
            StatementKind::DegreesAboveAverageCredits => self.degrees_above_average_credits(),
        }
    }

    fn ids_of(&self, kind: NodeKind) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == kind)
            .map(|(id, _)| *id)
            .collect()
    }

    fn find(&self, kind: NodeKind, key: &Value) -> Vec<NodeId> {
        if key.is_null() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|(_, n)| n.kind == kind && n.props.get(kind.key()) == Some(key))
            .map(|(id, _)| *id)
            .collect()
    }

    fn prop(&self, id: NodeId, name: &str) -> Value {
        self.nodes
            .get(&id)
            .and_then(|n| n.props.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn kind_of(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|n| n.kind)
    }

    fn node_rows(&self, ids: Vec<NodeId>) -> Vec<Row> {
        ids.into_iter()
            .filter_map(|id| self.nodes.get(&id))
            .map(|n| Row::new().with("n", Value::Object(n.props.clone())))
            .collect()
    }

    /// `(from, to)` pairs for edges of `rel` from a `from` node to a `to` node.
    fn edge_pairs(
        &self,
        from: Option<NodeKind>,
        rel: RelType,
        to: NodeKind,
    ) -> Vec<(NodeId, NodeId)> {
        self.edges
            .iter()
            .filter(|e| e.rel == rel)
            .filter(|e| from.map_or(true, |k| self.kind_of(e.from) == Some(k)))
            .filter(|e| self.kind_of(e.to) == Some(to))
            .map(|e| (e.from, e.to))
            .collect()
    }

    fn create(&mut self, kind: NodeKind, st: &Statement) -> Result<Vec<Row>> {
        let key = st.get_param(KEY_PARAM).clone();
        if self.unique.contains(&kind) && !self.find(kind, &key).is_empty() {
            return Err(GraphError::Query(format!(
                "Node already exists with label `{}` and property `{}` = {key}",
                kind.label(),
                kind.key()
            )));
        }

        let mut props = Map::new();
        if !key.is_null() {
            props.insert(kind.key().to_string(), key);
        }
        for attr in kind.attributes() {
            let value = st.get_param(attr.name);
            if !value.is_null() {
                props.insert(attr.name.to_string(), value.clone());
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.nodes.insert(id, MemNode { kind, props });
        Ok(self.node_rows(vec![id]))
    }

    fn update(&mut self, kind: NodeKind, st: &Statement) -> Vec<Row> {
        let ids = self.find(kind, st.get_param(KEY_PARAM));
        for id in &ids {
            if let Some(node) = self.nodes.get_mut(id) {
                for attr in kind.attributes() {
                    match st.get_param(attr.name) {
                        Value::Null => node.props.remove(attr.name),
                        value => node.props.insert(attr.name.to_string(), value.clone()),
                    };
                }
            }
        }
        self.node_rows(ids)
    }

    fn delete(&mut self, kind: NodeKind, st: &Statement) -> Vec<Row> {
        let ids: HashSet<NodeId> = self.find(kind, st.get_param(KEY_PARAM)).into_iter().collect();
        self.edges
            .retain(|e| !ids.contains(&e.from) && !ids.contains(&e.to));
        for id in &ids {
            self.nodes.remove(id);
        }
        vec![Row::new().with("deleted", ids.len() as i64)]
    }

    fn link(&mut self, link: LinkKind, st: &Statement) -> Vec<Row> {
        let sources = self.find(link.source(), st.get_param(SOURCE_PARAM));
        let targets = self.find(link.target(), st.get_param(TARGET_PARAM));
        let mut rows = Vec::new();
        for &a in &sources {
            for &b in &targets {
                self.edges.push(MemEdge {
                    from: a,
                    rel: link.rel(),
                    to: b,
                });
                rows.push(
                    Row::new()
                        .with("source", self.prop(a, link.source().key()))
                        .with("target", self.prop(b, link.target().key())),
                );
            }
        }
        rows
    }

    fn ensure_unique_key(&mut self, kind: NodeKind) -> Result<Vec<Row>> {
        let mut seen = HashSet::new();
        for id in self.ids_of(kind) {
            let key = self.prop(id, kind.key());
            if !key.is_null() && !seen.insert(key.to_string()) {
                return Err(GraphError::Query(format!(
                    "Unable to create constraint: duplicate {} {key} on {}",
                    kind.key(),
                    kind.label()
                )));
            }
        }
        self.unique.insert(kind);
        Ok(Vec::new())
    }

    /// Degrees per Faculty (via TEACHES) or per Branch (via incoming TYPE),
    /// ordered by count descending then name.
    fn degree_count(&self, group: NodeKind, column: &str) -> Vec<Row> {
        let pairs: Vec<(NodeId, NodeId)> = match group {
            NodeKind::Branch => self
                .edge_pairs(Some(NodeKind::Degree), RelType::Type, NodeKind::Branch)
                .into_iter()
                .map(|(d, b)| (b, d))
                .collect(),
            _ => self.edge_pairs(Some(group), RelType::Teaches, NodeKind::Degree),
        };

        let mut counts: BTreeMap<String, i64> = BTreeMap::new();
        let mut null_count = 0_i64;
        for (g, _) in pairs {
            match self.prop(g, "name") {
                Value::String(name) => *counts.entry(name).or_default() += 1,
                _ => null_count += 1,
            }
        }

        let mut rows: Vec<(Value, i64)> = counts
            .into_iter()
            .map(|(name, count)| (Value::String(name), count))
            .collect();
        if null_count > 0 {
            rows.push((Value::Null, null_count));
        }
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.into_iter()
            .map(|(name, count)| Row::new().with(column, name).with("degree_count", count))
            .collect()
    }

    /// Degree names per Branch (incoming TYPE) or per School (outgoing TEACHES).
    fn collect_degree_names(&self, group: NodeKind, column: &str) -> Vec<Row> {
        let pairs: Vec<(NodeId, NodeId)> = match group {
            NodeKind::Branch => self
                .edge_pairs(Some(NodeKind::Degree), RelType::Type, NodeKind::Branch)
                .into_iter()
                .map(|(d, b)| (b, d))
                .collect(),
            _ => self.edge_pairs(Some(group), RelType::Teaches, NodeKind::Degree),
        };

        let mut groups: Vec<(Value, Vec<Value>)> = Vec::new();
        for (g, d) in pairs {
            let name = self.prop(g, "name");
            let degree = self.prop(d, "name");
            let idx = match groups.iter().position(|(n, _)| *n == name) {
                Some(idx) => idx,
                None => {
                    groups.push((name, Vec::new()));
                    groups.len() - 1
                }
            };
            if !degree.is_null() {
                groups[idx].1.push(degree);
            }
        }
        groups
            .into_iter()
            .map(|(name, degrees)| Row::new().with(column, name).with("degrees", degrees))
            .collect()
    }

    fn average_rejected_by_campus(&self) -> Result<Vec<Row>> {
        let teaches = self.edge_pairs(None, RelType::Teaches, NodeKind::Degree);
        let located = self.edge_pairs(None, RelType::LocatedIn, NodeKind::Campus);

        // campus name -> (sum, count of non-null terms)
        let mut groups: BTreeMap<Option<String>, (f64, u32)> = BTreeMap::new();
        for &(s, d) in &teaches {
            for &(_, c) in located.iter().filter(|(from, _)| *from == s) {
                let campus = self.prop(c, "name").as_str().map(str::to_string);
                let entry = groups.entry(campus).or_insert((0.0, 0));
                let applications = self.prop(d, "applications").as_i64();
                let admitted = self.prop(d, "students_first_year_2013").as_i64();
                if let (Some(a), Some(f)) = (applications, admitted) {
                    let rejected = a.checked_sub(f).ok_or_else(integer_overflow)?;
                    entry.0 += rejected as f64;
                    entry.1 += 1;
                }
            }
        }

        // Cypher sorts nulls last in ascending order.
        let mut rows: Vec<_> = groups.into_iter().collect();
        rows.sort_by(|(a, _), (b, _)| match (a, b) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (Some(_), None) => std::cmp::Ordering::Less,
            (Some(x), Some(y)) => x.cmp(y),
        });
        Ok(rows
            .into_iter()
            .map(|(campus, (sum, n))| {
                let avg = if n == 0 {
                    Value::Null
                } else {
                    Value::from(sum / f64::from(n))
                };
                Row::new()
                    .with("campus", campus.map_or(Value::Null, Value::String))
                    .with("rejected", avg)
            })
            .collect())
    }

    fn degrees_by_campus(&self, campus_name: &Value) -> Vec<Row> {
        let campuses = self.find(NodeKind::Campus, campus_name);
        let located = self.edge_pairs(Some(NodeKind::School), RelType::LocatedIn, NodeKind::Campus);
        let teaches = self.edge_pairs(Some(NodeKind::School), RelType::Teaches, NodeKind::Degree);

        let mut rows = Vec::new();
        for &c in &campuses {
            for &(s, _) in located.iter().filter(|(_, to)| *to == c) {
                for &(_, d) in teaches.iter().filter(|(from, _)| *from == s) {
                    rows.push(Row::new().with("degree", self.prop(d, "name")));
                }
            }
        }
        rows
    }

    /// Integer arithmetic throughout, like Cypher on integer properties:
    /// `credits * n > total` with overflow reported as a query error.
    fn degrees_above_average_credits(&self) -> Result<Vec<Row>> {
        let credits: Vec<(NodeId, i64)> = self
            .ids_of(NodeKind::Degree)
            .into_iter()
            .filter_map(|id| self.prop(id, "credits").as_i64().map(|c| (id, c)))
            .collect();
        if credits.is_empty() {
            return Ok(Vec::new());
        }
        let n = credits.len() as i64;
        let total = credits
            .iter()
            .try_fold(0_i64, |acc, (_, c)| acc.checked_add(*c))
            .ok_or_else(integer_overflow)?;

        let mut rows: Vec<Row> = Vec::new();
        for (id, c) in credits {
            let scaled = c.checked_mul(n).ok_or_else(integer_overflow)?;
            if scaled > total {
                let row = Row::new()
                    .with("code", self.prop(id, "code"))
                    .with("name", self.prop(id, "name"))
                    .with("credits", c);
                if !rows.contains(&row) {
                    rows.push(row);
                }
            }
        }
        Ok(rows)
    }
}

fn integer_overflow() -> GraphError {
    GraphError::Query("integer overflow".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use unigraph_core::{Degree, Entity, WideInt};

    async fn run(store: &MemoryStore, st: Statement) -> Result<Vec<Row>> {
        let mut session = store.acquire().await?;
        session.run(&st).await
    }

    fn degree(code: &str, credits: i64) -> Statement {
        let d = Degree {
            credits: Some(WideInt(credits)),
            ..Degree::new(code, format!("Degree {code}"))
        };
        Statement::create(NodeKind::Degree, d.key(), &d.attributes())
    }

    #[tokio::test]
    async fn create_skips_null_properties() {
        let store = MemoryStore::new();
        run(&store, degree("A", 10)).await.unwrap();
        let props = store.stored_properties(NodeKind::Degree, "A").await.unwrap();
        assert_eq!(props["credits"], 10);
        assert!(!props.contains_key("applications"));
        assert_eq!(store.open_sessions(), 0);
    }

    #[tokio::test]
    async fn link_with_missing_endpoint_creates_nothing() {
        let store = MemoryStore::new();
        run(&store, degree("A", 10)).await.unwrap();
        let rows = run(&store, Statement::link(LinkKind::SchoolTeachesDegree, "Nowhere", "A"))
            .await
            .unwrap();
        assert!(rows.is_empty());
        assert_eq!(store.relationship_count(RelType::Teaches).await, 0);
    }

    #[tokio::test]
    async fn delete_detaches_edges() {
        let store = MemoryStore::new();
        run(&store, degree("A", 10)).await.unwrap();
        run(
            &store,
            Statement::create(NodeKind::Branch, "Science", &Map::new()),
        )
        .await
        .unwrap();
        run(&store, Statement::link(LinkKind::DegreeTypeBranch, "A", "Science"))
            .await
            .unwrap();

        let rows = run(&store, Statement::delete(NodeKind::Branch, "Science"))
            .await
            .unwrap();
        assert_eq!(rows[0].get("deleted"), 1);
        assert_eq!(store.relationship_count(RelType::Type).await, 0);
        assert_eq!(store.node_count(NodeKind::Degree).await, 1);
    }

    #[tokio::test]
    async fn unique_key_enforced_only_once_installed() {
        let store = MemoryStore::new();
        let campus = |name: &str| Statement::create(NodeKind::Campus, name, &Map::new());
        run(&store, campus("Norte")).await.unwrap();
        run(&store, campus("Norte")).await.unwrap();
        assert!(run(&store, Statement::ensure_unique_key(NodeKind::Campus))
            .await
            .is_err());

        run(&store, Statement::delete(NodeKind::Campus, "Norte")).await.unwrap();
        run(&store, Statement::ensure_unique_key(NodeKind::Campus)).await.unwrap();
        run(&store, campus("Norte")).await.unwrap();
        let err = run(&store, campus("Norte")).await.unwrap_err();
        assert!(err.is_store_fault());
    }

    #[tokio::test]
    async fn injected_fault_surfaces_as_query_error() {
        let store = MemoryStore::new();
        store
            .fail_statement("list_all:Campus", "connection reset")
            .await;
        let err = run(&store, Statement::list_all(NodeKind::Campus))
            .await
            .unwrap_err();
        assert!(matches!(err, GraphError::Query(ref m) if m == "connection reset"));
        assert_eq!(store.open_sessions(), 0);

        store.clear_faults().await;
        assert!(run(&store, Statement::list_all(NodeKind::Campus)).await.is_ok());
    }

    #[tokio::test]
    async fn above_average_uses_global_mean() {
        let store = MemoryStore::new();
        for (code, credits) in [("A", 60), ("B", 120), ("C", 240)] {
            run(&store, degree(code, credits)).await.unwrap();
        }
        let rows = run(&store, Statement::degrees_above_average_credits())
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("code").as_str(), Some("C"));
    }
}
