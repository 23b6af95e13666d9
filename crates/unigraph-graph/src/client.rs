//! Neo4j connection management and the Bolt-backed store session.

use async_trait::async_trait;
use neo4rs::{BoltNull, BoltType, ConfigBuilder, Graph, Query};
use serde_json::{Map, Value};
use unigraph_core::config::Neo4jSettings;
use unigraph_core::{AttrKind, NodeKind};

use crate::error::{GraphError, Result};
use crate::statement::{Column, ColumnKind, Row, Statement};
use crate::store::{GraphStore, StoreSession};

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Neo4jSettings::default().into()
    }
}

impl From<Neo4jSettings> for GraphConfig {
    fn from(s: Neo4jSettings) -> Self {
        Self {
            uri: s.uri,
            user: s.user,
            password: s.password,
            database: s.database,
            max_connections: s.max_connections,
            fetch_size: s.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Created once at startup and shared by every operation.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size);
        if let Some(db) = &config.database {
            builder = builder.db(db.as_str());
        }
        let neo_config = builder
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }
}

#[async_trait]
impl GraphStore for GraphClient {
    type Session = Neo4jSession;

    async fn open(&self) -> Result<Neo4jSession> {
        Ok(Neo4jSession {
            graph: self.graph.clone(),
            statements: 0,
        })
    }
}

/// A session over the shared pool. Each statement borrows a pooled
/// connection for the duration of its stream.
pub struct Neo4jSession {
    graph: Graph,
    statements: usize,
}

#[async_trait]
impl StoreSession for Neo4jSession {
    async fn run(&mut self, statement: &Statement) -> Result<Vec<Row>> {
        self.statements += 1;
        let q = to_query(statement)?;
        tracing::trace!(statement = %statement.name(), "Executing Cypher");

        let mut stream = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(decode_row(&row, statement.columns())?);
        }
        Ok(rows)
    }

    fn close(&mut self) {
        tracing::trace!(statements = self.statements, "Neo4j session released");
    }
}

fn to_query(statement: &Statement) -> Result<Query> {
    let mut q = neo4rs::query(statement.cypher());
    for (name, value) in statement.params() {
        q = q.param(name, to_bolt(name, value)?);
    }
    Ok(q)
}

fn to_bolt(name: &str, value: &Value) -> Result<BoltType> {
    match value {
        Value::Null => Ok(BoltType::Null(BoltNull)),
        Value::Bool(b) => Ok((*b).into()),
        Value::String(s) => Ok(s.clone().into()),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i.into()),
            (None, Some(f)) => Ok(f.into()),
            _ => Err(GraphError::Serialization(format!(
                "Parameter {name} is out of range: {n}"
            ))),
        },
        Value::Array(_) | Value::Object(_) => Err(GraphError::Serialization(format!(
            "Parameter {name} must be a scalar"
        ))),
    }
}

fn decode_row(row: &neo4rs::Row, columns: &[Column]) -> Result<Row> {
    let mut out = Row::new();
    for column in columns {
        let name = column.name;
        let typed = match column.kind {
            ColumnKind::Node(kind) => {
                let node: neo4rs::Node = row.get(name).map_err(|e| {
                    GraphError::Serialization(format!("Failed to deserialize node: {e}"))
                })?;
                Some(Value::Object(node_properties(&node, kind)?))
            }
            ColumnKind::Text => row.get::<String>(name).ok().map(Value::String),
            ColumnKind::Integer | ColumnKind::WideInt => {
                row.get::<i64>(name).ok().map(Value::from)
            }
            ColumnKind::Float => row.get::<f64>(name).ok().map(Value::from),
            ColumnKind::TextList => row.get::<Vec<String>>(name).ok().map(Value::from),
        };
        let value = match typed {
            Some(v) => v,
            None => raw_column(row, name)?,
        };
        out.insert(name, value);
    }
    Ok(out)
}

/// Untyped read of a column: nulls and values of an unexpected type are
/// passed through as-is and rejected when the row is mapped.
fn raw_column(row: &neo4rs::Row, name: &str) -> Result<Value> {
    row.get::<Value>(name)
        .map_err(|e| GraphError::Serialization(format!("Failed to read column {name}: {e}")))
}

/// Copy the schema attributes of `kind` out of a Bolt node. Absent
/// properties are left out. Present values of an unexpected type are kept
/// raw so the catalog rejects them instead of reading `null`.
fn node_properties(node: &neo4rs::Node, kind: NodeKind) -> Result<Map<String, Value>> {
    let present = node.keys();
    let mut props = Map::new();

    let key = std::iter::once((kind.key(), AttrKind::Text));
    let attrs = kind.attributes().iter().map(|a| (a.name, a.kind));
    for (name, attr_kind) in key.chain(attrs) {
        if !present.contains(&name) {
            continue;
        }
        let typed = match attr_kind {
            AttrKind::Text => node.get::<String>(name).ok().map(Value::String),
            AttrKind::Float => node.get::<f64>(name).ok().map(Value::from),
            AttrKind::WideInt => node.get::<i64>(name).ok().map(Value::from),
        };
        let value = match typed {
            Some(v) => v,
            None => node.get::<Value>(name).map_err(|e| {
                GraphError::Validation(format!("Unreadable {}.{name}: {e}", kind.label()))
            })?,
        };
        props.insert(name.to_string(), value);
    }
    Ok(props)
}

#[cfg(test)]
mod tests {
    use neo4rs::{BoltFloat, BoltInteger, BoltList, BoltMap, BoltNode, BoltString};
    use unigraph_core::Degree;

    use super::*;
    use crate::catalog::decode_entity;

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.max_connections, 16);
        assert!(config.database.is_none());
    }

    #[test]
    fn scalar_parameters_convert() {
        assert!(matches!(to_bolt("a", &Value::Null), Ok(BoltType::Null(_))));
        assert!(matches!(
            to_bolt("a", &serde_json::json!(123_456_789_012_345_i64)),
            Ok(BoltType::Integer(_))
        ));
        assert!(matches!(to_bolt("a", &serde_json::json!(7.5)), Ok(BoltType::Float(_))));
        assert!(matches!(to_bolt("a", &serde_json::json!("x")), Ok(BoltType::String(_))));
    }

    #[test]
    fn structured_parameters_are_rejected() {
        let err = to_bolt("props", &serde_json::json!({"a": 1})).unwrap_err();
        assert!(matches!(err, GraphError::Serialization(_)));
    }

    fn degree_node(credits: BoltType) -> neo4rs::Node {
        let mut props = BoltMap::new();
        props.put(BoltString::from("code"), BoltType::from("G1"));
        props.put(BoltString::from("name"), BoltType::from("Biology"));
        props.put(BoltString::from("credits"), credits);
        let labels = BoltList::from(vec![BoltType::from("Degree")]);
        neo4rs::Node::new(BoltNode::new(BoltInteger::new(1), labels, props))
    }

    #[test]
    fn absent_properties_are_omitted() {
        let node = degree_node(BoltType::Integer(BoltInteger::new(240)));
        let props = node_properties(&node, NodeKind::Degree).unwrap();
        assert_eq!(props["code"], "G1");
        assert_eq!(props["credits"], 240);
        assert!(!props.contains_key("applications"));
    }

    #[test]
    fn mistyped_wide_int_is_rejected_not_dropped() {
        let node = degree_node(BoltType::Float(BoltFloat::new(60.0)));
        let mapped = node_properties(&node, NodeKind::Degree).and_then(|props| {
            let row = Row::new().with("n", Value::Object(props));
            decode_entity::<Degree>(&row, "n")
        });
        assert!(matches!(mapped, Err(GraphError::Validation(_))));
    }

    #[test]
    fn statement_converts_to_query() {
        let st = Statement::find_by_key(NodeKind::School, "ETSI");
        assert!(to_query(&st).is_ok());
    }
}
