//! unigraph-core: Shared types, configuration, and error handling for the unigraph catalog.
//!
//! This crate provides the foundational types used by the graph layer and the CLI:
//! - Node kinds (Degree, Campus, Branch, ...) and their identity attributes
//! - Relationship kinds (TEACHES, LOCATED_IN, TYPE) and the fixed link operations
//! - The `WideInt` scalar used for 64-bit attributes on the API boundary
//! - Aggregate result rows
//! - Layered configuration

pub mod config;
pub mod error;
pub mod types;
pub mod wide;

pub use error::{CoreError, WideIntError};
pub use types::{
    Attribute, AttrKind, Branch, BranchDegreeCount, BranchDegrees, Campus, Degree,
    DegreeAboveAverage, Entity, Faculty, FacultyDegreeCount, LinkKind, NodeKind,
    PartnerInstitution, RejectedApplicationsByCampus, RelType, School, SchoolDegrees,
};
pub use wide::WideInt;
