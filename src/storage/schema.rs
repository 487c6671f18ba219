//! Database schema definitions

/// Namespace and annotation definitions (kind is 'N' or 'A')
pub const CREATE_DEFINITIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS definitions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    url TEXT NOT NULL UNIQUE,
    keyword TEXT NOT NULL,
    version TEXT,
    published TEXT,
    author TEXT,
    created TEXT NOT NULL
)
"#;

/// Named terms of a definition
pub const CREATE_DEFINITION_TERMS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS definition_terms (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    definition_id INTEGER NOT NULL REFERENCES definitions(id),
    name TEXT NOT NULL,
    encoding TEXT,
    UNIQUE(definition_id, name)
)
"#;

/// Whole-graph blobs, addressed by label
pub const CREATE_GRAPH_STORE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS graph_store (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    label TEXT NOT NULL UNIQUE,
    description TEXT,
    graph BLOB NOT NULL,
    created TEXT NOT NULL
)
"#;

pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    function TEXT NOT NULL,
    identifier_id INTEGER REFERENCES definition_terms(id),
    key_string TEXT NOT NULL,
    key_fields TEXT NOT NULL,
    fingerprint TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_MODIFICATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS modifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    mod_type TEXT NOT NULL,
    variant_string TEXT,
    pmod_name TEXT,
    pmod_name_id INTEGER REFERENCES definition_terms(id),
    amino_acid TEXT,
    position INTEGER,
    p5_name_id INTEGER REFERENCES definition_terms(id),
    p5_range TEXT,
    p3_name_id INTEGER REFERENCES definition_terms(id),
    p3_range TEXT
)
"#;

pub const CREATE_NODE_MODIFICATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS node_modifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    node_id INTEGER NOT NULL REFERENCES nodes(id),
    modification_id INTEGER NOT NULL REFERENCES modifications(id),
    UNIQUE(node_id, modification_id)
)
"#;

pub const CREATE_CITATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS citations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    citation_type TEXT NOT NULL,
    reference TEXT NOT NULL,
    name TEXT,
    date TEXT,
    comments TEXT,
    UNIQUE(citation_type, reference)
)
"#;

pub const CREATE_AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_CITATION_AUTHORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS citation_authors (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    citation_id INTEGER NOT NULL REFERENCES citations(id),
    author_id INTEGER NOT NULL REFERENCES authors(id),
    UNIQUE(citation_id, author_id)
)
"#;

pub const CREATE_EVIDENCE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS evidence (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    citation_id INTEGER NOT NULL REFERENCES citations(id),
    text TEXT NOT NULL,
    fingerprint TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_EDGES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edges (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL REFERENCES nodes(id),
    relation TEXT NOT NULL,
    object_id INTEGER NOT NULL REFERENCES nodes(id),
    citation_id INTEGER REFERENCES citations(id),
    evidence_id INTEGER REFERENCES evidence(id),
    fingerprint TEXT NOT NULL UNIQUE
)
"#;

pub const CREATE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    participant TEXT NOT NULL,
    modifier TEXT NOT NULL,
    relative_key TEXT,
    prop_value TEXT,
    name_id INTEGER REFERENCES definition_terms(id)
)
"#;

pub const CREATE_EDGE_PROPERTIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edge_properties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    edge_id INTEGER NOT NULL REFERENCES edges(id),
    property_id INTEGER NOT NULL REFERENCES properties(id),
    UNIQUE(edge_id, property_id)
)
"#;

pub const CREATE_EDGE_ANNOTATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edge_annotations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    edge_id INTEGER NOT NULL REFERENCES edges(id),
    annotation_term_id INTEGER NOT NULL REFERENCES definition_terms(id),
    UNIQUE(edge_id, annotation_term_id)
)
"#;

/// Membership of shared edges in stored graphs
pub const CREATE_EDGE_GRAPHS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS edge_graphs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    edge_id INTEGER NOT NULL REFERENCES edges(id),
    graph_id INTEGER NOT NULL REFERENCES graph_store(id),
    UNIQUE(edge_id, graph_id)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_definitions_keyword ON definitions(keyword)",
    "CREATE INDEX IF NOT EXISTS idx_nodes_identifier ON nodes(identifier_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_subject ON edges(subject_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_object ON edges(object_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_citation ON edges(citation_id)",
    "CREATE INDEX IF NOT EXISTS idx_edges_evidence ON edges(evidence_id)",
    "CREATE INDEX IF NOT EXISTS idx_properties_participant ON properties(participant, modifier)",
    "CREATE INDEX IF NOT EXISTS idx_edge_graphs_graph ON edge_graphs(graph_id)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_DEFINITIONS_TABLE,
        CREATE_DEFINITION_TERMS_TABLE,
        CREATE_GRAPH_STORE_TABLE,
        CREATE_NODES_TABLE,
        CREATE_MODIFICATIONS_TABLE,
        CREATE_NODE_MODIFICATIONS_TABLE,
        CREATE_CITATIONS_TABLE,
        CREATE_AUTHORS_TABLE,
        CREATE_CITATION_AUTHORS_TABLE,
        CREATE_EVIDENCE_TABLE,
        CREATE_EDGES_TABLE,
        CREATE_PROPERTIES_TABLE,
        CREATE_EDGE_PROPERTIES_TABLE,
        CREATE_EDGE_ANNOTATIONS_TABLE,
        CREATE_EDGE_GRAPHS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

/// Tables counted by `SqliteStore::stats`, in display order
pub const COUNTED_TABLES: &[&str] = &[
    "graph_store",
    "nodes",
    "modifications",
    "citations",
    "authors",
    "evidence",
    "edges",
    "properties",
    "edge_properties",
    "edge_annotations",
    "edge_graphs",
    "definitions",
    "definition_terms",
];

/// Every table created by [`all_schema_statements`]
pub const ALL_TABLES: &[&str] = &[
    "definitions",
    "definition_terms",
    "graph_store",
    "nodes",
    "modifications",
    "node_modifications",
    "citations",
    "authors",
    "citation_authors",
    "evidence",
    "edges",
    "properties",
    "edge_properties",
    "edge_annotations",
    "edge_graphs",
];
