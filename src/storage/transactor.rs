//! Get-or-create transactor
//!
//! Every relational write made during extraction goes through
//! [`Transactor::get_or_create`]: look the row up by its discriminator,
//! insert it only when absent. The transactor borrows the connection of an
//! open transaction, so inserted rows are visible to later lookups in the
//! same unit of work while the commit stays with the caller.

use std::collections::BTreeMap;
use std::fmt;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::{Error, Result};

/// A row that can be fetched-or-inserted.
///
/// `values()` must line up with `COLUMNS`.
pub trait Record {
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    /// Columns identifying an existing row. Empty means every column.
    const DISCRIMINATOR: &'static [&'static str];

    fn values(&self) -> Vec<Value>;
}

/// Result of a get-or-create call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Existing(i64),
    Created(i64),
}

impl Outcome {
    pub fn id(&self) -> i64 {
        match self {
            Outcome::Existing(id) | Outcome::Created(id) => *id,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, Outcome::Created(_))
    }
}

/// Idempotent insert-or-fetch against one open transaction
pub struct Transactor<'c> {
    conn: &'c Connection,
    created: BTreeMap<&'static str, usize>,
}

impl<'c> Transactor<'c> {
    /// Wrap a connection; pass a `rusqlite::Transaction` to get rollback on drop
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            created: BTreeMap::new(),
        }
    }

    /// Return the id of the row matching `record`'s discriminator, inserting
    /// the record first if no such row exists
    pub fn get_or_create<R: Record>(&mut self, record: &R) -> Result<Outcome> {
        let values = record.values();
        debug_assert_eq!(values.len(), R::COLUMNS.len());

        if let Some(id) = self.find::<R>(&values)? {
            return Ok(Outcome::Existing(id));
        }

        let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{}", i)).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        self.conn
            .prepare_cached(&sql)?
            .execute(params_from_iter(values.iter()))
            .map_err(|e| constraint_error(R::TABLE, e))?;

        let id = self.conn.last_insert_rowid();
        *self.created.entry(R::TABLE).or_insert(0) += 1;
        Ok(Outcome::Created(id))
    }

    /// NULL-aware lookup by discriminator
    fn find<R: Record>(&self, values: &[Value]) -> Result<Option<i64>> {
        let keyed: Vec<(&str, &Value)> = R::COLUMNS
            .iter()
            .zip(values)
            .filter(|(col, _)| R::DISCRIMINATOR.is_empty() || R::DISCRIMINATOR.contains(*col))
            .map(|(col, value)| (*col, value))
            .collect();

        let conditions: Vec<String> = keyed
            .iter()
            .enumerate()
            .map(|(i, (col, _))| format!("{} IS ?{}", col, i + 1))
            .collect();
        let sql = format!(
            "SELECT id FROM {} WHERE {} LIMIT 1",
            R::TABLE,
            conditions.join(" AND ")
        );

        let id = self
            .conn
            .prepare_cached(&sql)?
            .query_row(params_from_iter(keyed.iter().map(|(_, v)| *v)), |row| row.get(0))
            .optional()?;
        Ok(id)
    }

    /// Insert a whole-graph blob. The label must have been checked free.
    pub fn insert_graph(&mut self, label: &str, description: Option<&str>, blob: &[u8]) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO graph_store (label, description, graph, created) VALUES (?1, ?2, ?3, ?4)",
                params![label, description, blob, chrono::Utc::now().to_rfc3339()],
            )
            .map_err(|e| constraint_error("graph_store", e))?;
        *self.created.entry("graph_store").or_insert(0) += 1;
        Ok(self.conn.last_insert_rowid())
    }

    /// Rows inserted so far, per table
    pub fn created(&self) -> &BTreeMap<&'static str, usize> {
        &self.created
    }

    pub fn created_in(&self, table: &str) -> usize {
        self.created.get(table).copied().unwrap_or(0)
    }

    pub fn connection(&self) -> &Connection {
        self.conn
    }
}

impl fmt::Debug for Transactor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transactor").field("created", &self.created).finish()
    }
}

/// Surface UNIQUE/NOT NULL violations as their own error kind
fn constraint_error(table: &'static str, err: rusqlite::Error) -> Error {
    match err {
        rusqlite::Error::SqliteFailure(code, message) if code.code == rusqlite::ErrorCode::ConstraintViolation => {
            Error::ConstraintViolation {
                table,
                detail: message.unwrap_or_else(|| code.to_string()),
            }
        }
        other => Error::Storage(other),
    }
}

// ========== Value helpers ==========

pub(crate) fn text(value: &str) -> Value {
    Value::Text(value.to_string())
}

pub(crate) fn opt_text(value: Option<&str>) -> Value {
    value.map(text).unwrap_or(Value::Null)
}

pub(crate) fn int(value: i64) -> Value {
    Value::Integer(value)
}

pub(crate) fn opt_int(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::records::{NewCitation, NewNode, NewProperty};
    use crate::storage::SqliteStore;

    fn sample_node(name: &str) -> NewNode {
        let key = crate::node::NodeKey::from_texts(["Protein", "HGNC", name]);
        NewNode::new(&key, crate::node::Function::Protein, None).unwrap()
    }

    #[test]
    fn test_get_or_create_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let mut transactor = Transactor::new(&tx);

        let node = sample_node("APP");
        let first = transactor.get_or_create(&node).unwrap();
        let second = transactor.get_or_create(&node).unwrap();
        let third = transactor.get_or_create(&node).unwrap();

        assert!(first.is_created());
        assert_eq!(second, Outcome::Existing(first.id()));
        assert_eq!(third.id(), first.id());
        assert_eq!(transactor.created_in("nodes"), 1);
        drop(transactor);
        tx.commit().unwrap();

        assert_eq!(store.count("nodes").unwrap(), 1);
    }

    #[test]
    fn test_full_field_match_is_null_aware() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let mut transactor = Transactor::new(&tx);

        let bare = NewProperty {
            participant: "subject".to_string(),
            modifier: "Degradation".to_string(),
            relative_key: None,
            prop_value: None,
            name_id: None,
        };
        let valued = NewProperty {
            relative_key: Some("MolecularActivity".to_string()),
            prop_value: Some("kin".to_string()),
            ..bare.clone()
        };

        let a = transactor.get_or_create(&bare).unwrap();
        let b = transactor.get_or_create(&valued).unwrap();
        let c = transactor.get_or_create(&bare.clone()).unwrap();

        assert_ne!(a.id(), b.id());
        assert_eq!(a.id(), c.id());
        assert_eq!(transactor.created_in("properties"), 2);
    }

    #[test]
    fn test_discriminator_ignores_other_columns() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let mut transactor = Transactor::new(&tx);

        let mut citation = NewCitation {
            citation_type: "PubMed".to_string(),
            reference: "123".to_string(),
            name: Some("First title".to_string()),
            date: None,
            comments: None,
        };
        let first = transactor.get_or_create(&citation).unwrap();
        citation.name = Some("Other title".to_string());
        let second = transactor.get_or_create(&citation).unwrap();

        assert_eq!(second, Outcome::Existing(first.id()));
    }

    #[test]
    fn test_constraint_violation_is_surfaced() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        let mut transactor = Transactor::new(&tx);

        transactor.insert_graph("tg", None, b"{}").unwrap();
        let err = transactor.insert_graph("tg", None, b"{}").unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { table: "graph_store", .. }));
    }

    #[test]
    fn test_rollback_on_drop() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            let mut transactor = Transactor::new(&tx);
            transactor.get_or_create(&sample_node("APP")).unwrap();
            // tx dropped without commit
        }
        assert_eq!(store.count("nodes").unwrap(), 0);
    }
}
