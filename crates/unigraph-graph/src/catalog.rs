//! The catalog service: typed operations over a [`GraphStore`].
//!
//! Every operation acquires its own session, runs one or more statements,
//! maps the rows, and releases the session on every exit path. Named API
//! operations live in `queries` and `mutations`; this module holds the
//! generic per-entity building blocks.

use std::future::Future;

use serde_json::{Map, Value};
use unigraph_core::{AttrKind, Entity, LinkKind, NodeKind, WideInt};

use crate::error::{GraphError, Result};
use crate::statement::{Row, Statement};
use crate::store::GraphStore;

/// Column holding the node in keyed and list statements.
const NODE_COLUMN: &str = "n";

pub struct Catalog<S> {
    store: S,
}

impl<S: GraphStore> Catalog<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run a single statement in its own session.
    pub(crate) async fn execute(&self, statement: Statement) -> Result<Vec<Row>> {
        let mut session = self.store.acquire().await?;
        let rows = session.run(&statement).await?;
        session.release();
        Ok(rows)
    }

    /// Install a uniqueness constraint on every kind's identity attribute.
    pub async fn ensure_schema(&self) -> Result<()> {
        traced("ensureSchema", self.install_constraints()).await
    }

    async fn install_constraints(&self) -> Result<()> {
        let mut session = self.store.acquire().await?;
        for kind in NodeKind::ALL {
            session.run(&Statement::ensure_unique_key(kind)).await?;
            tracing::info!(label = kind.label(), key = kind.key(), "Uniqueness constraint ensured");
        }
        session.release();
        Ok(())
    }

    // ── Generic Entity Operations ────────────────────────────────

    /// Look up one node by identity. Zero rows is `NotFound`.
    pub async fn get<E: Entity>(&self, key: &str) -> Result<E> {
        let rows = self.execute(Statement::find_by_key(E::KIND, key)).await?;
        match rows.first() {
            Some(row) => decode_entity(row, NODE_COLUMN),
            None => Err(not_found(E::KIND, key)),
        }
    }

    /// Every node of a kind, in store order.
    pub async fn list<E: Entity>(&self) -> Result<Vec<E>> {
        let rows = self.execute(Statement::list_all(E::KIND)).await?;
        rows.iter().map(|row| decode_entity(row, NODE_COLUMN)).collect()
    }

    /// Create a node. Kinds that pre-check duplicates (Degree) fail with
    /// `Conflict` before writing when the key is taken.
    ///
    /// The check and the write are separate statements; a concurrent create
    /// of the same key can still slip between them.
    pub async fn create<E: Entity>(&self, entity: &E) -> Result<E> {
        let kind = E::KIND;
        let key = entity.key();
        let mut session = self.store.acquire().await?;

        if kind.prechecks_duplicates() {
            let existing = session.run(&Statement::find_by_key(kind, key)).await?;
            if !existing.is_empty() {
                return Err(GraphError::Conflict {
                    label: kind.label(),
                    key: kind.key(),
                    value: key.to_string(),
                });
            }
        }

        let rows = session
            .run(&Statement::create(kind, key, &entity.attributes()))
            .await?;
        session.release();

        match rows.first() {
            Some(row) => decode_entity(row, NODE_COLUMN),
            None => Err(GraphError::Query(format!(
                "Creating {} {key:?} returned no node",
                kind.label()
            ))),
        }
    }

    /// Overwrite every non-identity attribute. Zero rows is `NotFound`.
    pub async fn update<E: Entity>(&self, entity: &E) -> Result<E> {
        let kind = E::KIND;
        let rows = self
            .execute(Statement::update(kind, entity.key(), &entity.attributes()))
            .await?;
        match rows.first() {
            Some(row) => decode_entity(row, NODE_COLUMN),
            None => Err(not_found(kind, entity.key())),
        }
    }

    /// Delete a node and its relationships, returning a confirmation.
    pub async fn delete<E: Entity>(&self, key: &str) -> Result<String> {
        self.delete_kind(E::KIND, key).await
    }

    pub(crate) async fn delete_kind(&self, kind: NodeKind, key: &str) -> Result<String> {
        let rows = self.execute(Statement::delete(kind, key)).await?;
        let deleted = match rows.first() {
            Some(row) => row.decode::<i64>("deleted")?,
            None => 0,
        };
        if deleted == 0 {
            return Err(not_found(kind, key));
        }
        Ok(format!(
            "The {} with {} {key} has been deleted.",
            kind.noun(),
            kind.key()
        ))
    }

    /// Create one relationship between two existing nodes.
    pub async fn link(&self, link: LinkKind, source: &str, target: &str) -> Result<String> {
        let rows = self.execute(Statement::link(link, source, target)).await?;
        let Some(row) = rows.first() else {
            return Err(GraphError::EndpointNotFound {
                rel: link.rel().as_str(),
                from_label: link.source().label(),
                from: source.to_string(),
                to_label: link.target().label(),
                to: target.to_string(),
            });
        };
        let from: String = row.decode("source")?;
        let to: String = row.decode("target")?;
        Ok(link.confirmation(&from, &to))
    }
}

/// Log the outcome of a named operation. Store faults are logged here and
/// returned unchanged.
pub(crate) async fn traced<T, F>(operation: &'static str, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => {
            tracing::debug!(operation, "Catalog operation completed");
            Ok(value)
        }
        Err(e) if e.is_store_fault() => {
            tracing::error!(operation, error = %e, "Graph store fault");
            Err(e)
        }
        Err(e) => {
            tracing::debug!(operation, error = %e, "Catalog operation rejected");
            Err(e)
        }
    }
}

fn not_found(kind: NodeKind, key: &str) -> GraphError {
    GraphError::NotFound {
        label: kind.label(),
        key: kind.key(),
        value: key.to_string(),
    }
}

/// Map a node column to an entity, coercing textual wide integers first.
pub(crate) fn decode_entity<E: Entity>(row: &Row, column: &str) -> Result<E> {
    let mut props = match row.get(column) {
        Value::Object(props) => props.clone(),
        other => {
            return Err(GraphError::Serialization(format!(
                "Expected a {} node in column {column}, got {other}",
                E::KIND.label()
            )))
        }
    };
    coerce_wide_ints(E::KIND, &mut props)?;
    serde_json::from_value(Value::Object(props)).map_err(|e| {
        GraphError::Serialization(format!("Failed to map {} node: {e}", E::KIND.label()))
    })
}

/// Replace textual wide-integer attributes with their integer value.
pub(crate) fn coerce_wide_ints(kind: NodeKind, props: &mut Map<String, Value>) -> Result<()> {
    for attr in kind.attributes() {
        if attr.kind != AttrKind::WideInt {
            continue;
        }
        if let Some(value) = props.get_mut(attr.name) {
            *value = WideInt::from_store_value(value)?.map_or(Value::Null, WideInt::to_store_value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use unigraph_core::{Degree, Faculty};

    use super::*;

    #[test]
    fn textual_wide_ints_are_coerced() {
        let row = Row::new().with(
            "n",
            json!({
                "code": "G1",
                "name": "Biology",
                "credits": "123456789012345",
                "applications": 90,
            }),
        );
        let degree: Degree = decode_entity(&row, "n").unwrap();
        assert_eq!(degree.credits, Some(WideInt(123_456_789_012_345)));
        assert_eq!(degree.applications, Some(WideInt(90)));
        assert_eq!(degree.offered_places, None);
    }

    #[test]
    fn malformed_wide_int_is_a_validation_error() {
        let row = Row::new().with("n", json!({"name": "Science", "foundation": "MCMXX"}));
        let err = decode_entity::<Faculty>(&row, "n").unwrap_err();
        assert!(matches!(err, GraphError::Validation(_)));
    }

    #[test]
    fn non_node_column_is_rejected() {
        let row = Row::new().with("n", 3);
        assert!(matches!(
            decode_entity::<Faculty>(&row, "n"),
            Err(GraphError::Serialization(_))
        ));
    }
}
