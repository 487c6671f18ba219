//! SQLite storage implementation

use std::path::Path;
use rusqlite::{Connection, OptionalExtension, Transaction};
use crate::cache::{citation_key, CacheKind};
use crate::node::NodeKey;
use crate::{Error, Result};
use super::schema;

/// SQLite-backed storage for stored graphs and their relational decomposition
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&self) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            self.conn.execute(stmt, [])?;
        }
        Ok(())
    }

    /// Borrow the underlying connection for read-only queries
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a unit of work. Dropping the returned transaction without
    /// committing rolls every write back.
    pub fn transaction(&mut self) -> Result<Transaction<'_>> {
        Ok(self.conn.transaction()?)
    }

    // ========== Stored Graph Operations ==========

    /// Whether a graph is already stored under `label`
    pub fn graph_label_exists(&self, label: &str) -> Result<bool> {
        Ok(self.graph_id(label)?.is_some())
    }

    /// Row id of the stored graph with `label`
    pub fn graph_id(&self, label: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM graph_store WHERE label = ?1", [label], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    /// Serialized graph stored under `label`
    pub fn load_graph_blob(&self, label: &str) -> Result<Option<Vec<u8>>> {
        self.conn
            .query_row("SELECT graph FROM graph_store WHERE label = ?1", [label], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    /// Labels of all stored graphs, in storage order
    pub fn list_graph_labels(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT label FROM graph_store ORDER BY id")?;
        let labels = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(labels)
    }

    /// One summary row per stored graph, in storage order
    pub fn graph_summaries(&self) -> Result<Vec<GraphSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT g.id, g.label, g.description, g.created,
                   (SELECT COUNT(*) FROM edge_graphs m WHERE m.graph_id = g.id)
            FROM graph_store g
            ORDER BY g.id
            "#,
        )?;
        let summaries = stmt
            .query_map([], |row| {
                Ok(GraphSummary {
                    id: row.get(0)?,
                    label: row.get(1)?,
                    description: row.get(2)?,
                    created: row.get(3)?,
                    edges: row.get::<_, i64>(4)? as usize,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(summaries)
    }

    /// Ids of the edges linked to a stored graph
    pub fn edge_ids_in_graph(&self, label: &str) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT m.edge_id
            FROM edge_graphs m JOIN graph_store g ON g.id = m.graph_id
            WHERE g.label = ?1
            ORDER BY m.edge_id
            "#,
        )?;
        let ids = stmt
            .query_map([label], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }

    // ========== Node Operations ==========

    /// Reconstruct the key of a stored node
    pub fn node_key(&self, node_id: i64) -> Result<Option<NodeKey>> {
        let fields: Option<String> = self
            .conn
            .query_row("SELECT key_fields FROM nodes WHERE id = ?1", [node_id], |row| row.get(0))
            .optional()?;
        fields.map(|json| NodeKey::from_json(&json)).transpose()
    }

    /// Id of the node with the given fingerprint
    pub fn node_id_by_fingerprint(&self, fingerprint: &str) -> Result<Option<i64>> {
        self.conn
            .query_row("SELECT id FROM nodes WHERE fingerprint = ?1", [fingerprint], |row| row.get(0))
            .optional()
            .map_err(Into::into)
    }

    // ========== Cache Support ==========

    /// Existing `(cache key, id)` pairs for one entity kind
    pub fn scan_cache_keys(&self, kind: CacheKind) -> Result<Vec<(String, i64)>> {
        let rows = match kind {
            CacheKind::Node => self.scan_fingerprints("nodes")?,
            CacheKind::Evidence => self.scan_fingerprints("evidence")?,
            CacheKind::Edge => self.scan_fingerprints("edges")?,
            CacheKind::Citation => {
                let mut stmt = self.conn.prepare("SELECT citation_type, reference, id FROM citations")?;
                let rows = stmt
                    .query_map([], |row| {
                        let citation_type: String = row.get(0)?;
                        let reference: String = row.get(1)?;
                        Ok((citation_key(&citation_type, &reference), row.get(2)?))
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows
            }
        };
        Ok(rows)
    }

    fn scan_fingerprints(&self, table: &'static str) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(&format!("SELECT fingerprint, id FROM {}", table))?;
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    // ========== Statistics ==========

    /// Row count of one schema table
    pub fn count(&self, table: &str) -> Result<usize> {
        if !schema::ALL_TABLES.contains(&table) {
            return Err(Error::UnknownTable(table.to_string()));
        }
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Row counts for every counted table
    pub fn stats(&self) -> Result<DbStats> {
        let mut tables = Vec::with_capacity(schema::COUNTED_TABLES.len());
        for &table in schema::COUNTED_TABLES {
            tables.push((table, self.count(table)?));
        }
        Ok(DbStats { tables })
    }
}

/// One stored graph as listed by the CLI
#[derive(Debug, Clone)]
pub struct GraphSummary {
    pub id: i64,
    pub label: String,
    pub description: Option<String>,
    pub created: String,
    /// Number of edge membership links
    pub edges: usize,
}

/// Database statistics
#[derive(Debug, Clone, Default)]
pub struct DbStats {
    pub tables: Vec<(&'static str, usize)>,
}

impl DbStats {
    /// Row count of `table`, zero when it is not counted
    pub fn get(&self, table: &str) -> usize {
        self.tables
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|(_, count)| count).sum()
    }
}

impl std::fmt::Display for DbStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        for (table, count) in &self.tables {
            writeln!(f, "  {}: {}", table, count)?;
        }
        Ok(())
    }
}
