//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - graph_store(label, description, graph, created)
//! - nodes(function, identifier_id, key_string, key_fields, fingerprint)
//! - modifications / node_modifications
//! - citations, authors / citation_authors, evidence
//! - edges(subject_id, relation, object_id, citation_id, evidence_id, fingerprint)
//! - properties / edge_properties, edge_annotations, edge_graphs
//! - definitions / definition_terms (namespace and annotation catalog)

pub mod definitions;
pub mod records;
pub mod schema;
pub mod sqlite;
pub mod transactor;

pub use definitions::{DefinitionEntry, DefinitionFile, DefinitionImport};
pub use sqlite::{DbStats, GraphSummary, SqliteStore};
pub use transactor::{Outcome, Record, Transactor};
