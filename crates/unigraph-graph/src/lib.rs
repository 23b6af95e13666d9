//! unigraph-graph: graph access layer for the academic catalog.
//!
//! Two layers:
//! - the store adapter ([`GraphStore`], [`StoreSession`], [`SessionGuard`]) with
//!   a Neo4j-backed [`GraphClient`] and an in-memory [`MemoryStore`];
//! - the [`Catalog`] service, which turns every catalog operation into named,
//!   parameterized [`Statement`]s and maps result rows back to typed entities.
//!
//! [`api`] exposes the same operations under their API names for transports.

pub mod api;
pub mod catalog;
pub mod client;
pub mod error;
pub mod memory;
pub mod mutations;
pub mod queries;
pub mod statement;
pub mod store;

pub use api::{dispatch, Operation};
pub use catalog::Catalog;
pub use client::{GraphClient, GraphConfig};
pub use error::GraphError;
pub use memory::MemoryStore;
pub use statement::{Column, ColumnKind, Row, Statement, StatementKind};
pub use store::{GraphStore, SessionGuard, StoreSession};
