//! Errors from graph operations.

use unigraph_core::WideIntError;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Graph store connection error: {0}")]
    Connection(String),

    #[error("Graph store query error: {0}")]
    Query(String),

    #[error("No {label} found with {key} {value:?}")]
    NotFound {
        label: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Cannot create {rel}: {from_label} {from:?} or {to_label} {to:?} not found")]
    EndpointNotFound {
        rel: &'static str,
        from_label: &'static str,
        from: String,
        to_label: &'static str,
        to: String,
    },

    #[error("A {label} with {key} {value:?} already exists")]
    Conflict {
        label: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GraphError {
    /// Connectivity or execution failure reported by the store itself.
    pub fn is_store_fault(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Query(_))
    }

    /// Zero rows matched a keyed read, update, delete, or link.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::EndpointNotFound { .. })
    }
}

impl From<neo4rs::Error> for GraphError {
    fn from(e: neo4rs::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<WideIntError> for GraphError {
    fn from(e: WideIntError) -> Self {
        Self::Validation(e.to_string())
    }
}

impl From<serde_json::Error> for GraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
