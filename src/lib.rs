//! # belstore - Relational storage for biological assertion graphs
//!
//! Persists directed multi-edge assertion graphs (entities connected by
//! causal/correlative relations carrying provenance) into a normalized
//! SQLite store.
//!
//! belstore provides:
//! - Label-addressed whole-graph blobs for exact reload
//! - Relational decomposition with content-addressed deduplication of
//!   nodes, citations, evidence and edges across imported graphs
//! - Namespace/annotation resolution against a versioned definition catalog
//! - Idempotent get-or-create writes inside one transaction per graph

pub mod hash;
pub mod node;
pub mod edge;
pub mod graph;
pub mod cache;
pub mod resolver;
pub mod storage;
pub mod extract;
pub mod graph_store;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use cache::{CacheKind, EntityCache};
pub use edge::{Citation, EdgeAttribute, EdgeData, ModifierKind, Participant, ParticipantModifier};
pub use extract::{ExtractionStats, GraphExtractor};
pub use graph::BelGraph;
pub use graph_store::{GraphStore, StoreConfig, StoreOutcome, StoreReport};
pub use hash::Fingerprint;
pub use node::{Function, NodeData, NodeKey};
pub use resolver::{DefinitionCatalog, DefinitionInfo, DefinitionKind, DefinitionResolver, KeywordTable};
pub use storage::SqliteStore;

/// Result type alias for belstore operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for belstore operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Constraint violation in {table}: {detail}")]
    ConstraintViolation { table: &'static str, detail: String },

    #[error("Unknown {kind} keyword: {keyword}")]
    UnknownKeyword { kind: DefinitionKind, keyword: String },

    #[error("Unresolved {kind} term: {keyword}:{name}")]
    UnresolvedTerm {
        kind: DefinitionKind,
        keyword: String,
        name: String,
    },

    #[error("Unknown definition: {0}")]
    UnknownDefinition(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether a vocabulary reference could not be resolved
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Error::UnknownKeyword { .. } | Error::UnresolvedTerm { .. } | Error::UnknownDefinition(_)
        )
    }
}
