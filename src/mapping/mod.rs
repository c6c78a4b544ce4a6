//! Cross-database pathway mappings.
//!
//! - **[`database`]**: the pathway databases and their column order
//! - **[`ontology`]**: raw ontology rows resolved into typed edges, equivalence dictionary and
//!   canonical assignments
//! - **[`store`]**: the equivalence store queried by the consensus engine

pub mod database;
pub mod ontology;
pub mod store;

pub use database::{Database, column_order};
pub use ontology::{MappingType, OntologyEdge, OntologyRow, PathwayRef};
pub use store::{EquivalenceStore, Pathway, PathwayKey};
