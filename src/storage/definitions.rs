//! Definition catalog backed by the `definitions` and `definition_terms` tables
//!
//! Definitions are imported ahead of time (typically from a JSON definition
//! file through the CLI). Before extraction the whole catalog is read into a
//! [`DefinitionCatalog`] snapshot, so resolution never touches the database
//! while the extraction transaction is open.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::records::{NewDefinition, NewDefinitionTerm};
use super::sqlite::SqliteStore;
use super::transactor::{Outcome, Transactor};
use crate::resolver::{DefinitionCatalog, DefinitionInfo, DefinitionKind};
use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// One definition with its terms, as found in a definition file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionEntry {
    #[serde(flatten)]
    pub info: DefinitionInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub terms: Vec<String>,
}

/// JSON file listing namespace and annotation definitions
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionFile {
    pub definitions: Vec<DefinitionEntry>,
}

impl DefinitionFile {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// What an import wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DefinitionImport {
    pub definitions_created: usize,
    pub terms_created: usize,
}

impl SqliteStore {
    // ========== Definition Operations ==========

    /// Insert a definition and its terms. Idempotent per URL: an existing
    /// definition keeps its metadata and only gains missing terms.
    pub fn insert_definition<I, S>(&mut self, info: &DefinitionInfo, author: Option<&str>, terms: I) -> Result<DefinitionImport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tx = self.transaction()?;
        let import = write_definition(&mut Transactor::new(&tx), info, author, terms)?;
        tx.commit()?;
        Ok(import)
    }

    /// Import every entry of a definition file in one transaction
    pub fn import_definitions(&mut self, file: &DefinitionFile) -> Result<DefinitionImport> {
        let tx = self.transaction()?;
        let mut transactor = Transactor::new(&tx);
        let mut total = DefinitionImport::default();
        for entry in &file.definitions {
            let import = write_definition(&mut transactor, &entry.info, entry.author.as_deref(), entry.terms.iter().cloned())?;
            total.definitions_created += import.definitions_created;
            total.terms_created += import.terms_created;
        }
        drop(transactor);
        tx.commit()?;
        Ok(total)
    }

    /// Snapshot every stored definition and term
    pub fn load_catalog(&self) -> Result<DefinitionCatalog> {
        let conn = self.connection();

        let mut terms: HashMap<i64, Vec<(String, i64)>> = HashMap::new();
        let mut stmt = conn.prepare("SELECT definition_id, name, id FROM definition_terms")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?)))?;
        for row in rows {
            let (definition_id, name, id) = row?;
            terms.entry(definition_id).or_default().push((name, id));
        }

        let mut stmt = conn.prepare("SELECT id, kind, url, keyword, version, published FROM definitions ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut catalog = DefinitionCatalog::new();
        for row in rows {
            let (id, kind, url, keyword, version, published) = row?;
            let kind: DefinitionKind = kind.parse()?;
            let published = published
                .map(|date| {
                    NaiveDate::parse_from_str(&date, DATE_FORMAT)
                        .map_err(|e| Error::InvalidData(format!("Bad publication date {:?} for {}: {}", date, url, e)))
                })
                .transpose()?;

            let info = DefinitionInfo {
                keyword,
                url,
                kind,
                version,
                published,
            };
            catalog.insert(info, terms.remove(&id).unwrap_or_default());
        }

        tracing::debug!("Loaded {} definitions with {} terms", catalog.len(), catalog.term_count());
        Ok(catalog)
    }

    /// Term id of `name` in the definition at `url`
    pub fn definition_term_id(&self, url: &str, name: &str) -> Result<Option<i64>> {
        use rusqlite::OptionalExtension;

        self.connection()
            .query_row(
                r#"
                SELECT t.id FROM definition_terms t JOIN definitions d ON d.id = t.definition_id
                WHERE d.url = ?1 AND t.name = ?2
                "#,
                [url, name],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }
}

fn write_definition<I, S>(
    transactor: &mut Transactor<'_>,
    info: &DefinitionInfo,
    author: Option<&str>,
    terms: I,
) -> Result<DefinitionImport>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let definition = transactor.get_or_create(&NewDefinition {
        kind: info.kind.code().to_string(),
        url: info.url.clone(),
        keyword: info.keyword.clone(),
        version: info.version.clone(),
        published: info.published.map(|d| d.format(DATE_FORMAT).to_string()),
        author: author.map(str::to_string),
        created: chrono::Utc::now().to_rfc3339(),
    })?;

    if let Outcome::Existing(_) = definition {
        tracing::debug!("Definition {} already stored", info.url);
    }

    let mut import = DefinitionImport {
        definitions_created: usize::from(definition.is_created()),
        terms_created: 0,
    };
    for name in terms {
        let term = transactor.get_or_create(&NewDefinitionTerm {
            definition_id: definition.id(),
            name: name.into(),
            encoding: None,
        })?;
        if term.is_created() {
            import.terms_created += 1;
        }
    }
    Ok(import)
}
