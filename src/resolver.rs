//! Namespace/Annotation Resolver
//!
//! Extraction links nodes, properties and annotations to controlled
//! vocabulary terms. The vocabulary itself is owned elsewhere; this module
//! defines the lookups the extractor consumes and an in-memory snapshot
//! ([`DefinitionCatalog`]) that is fully populated before extraction starts.
//!
//! Resolution order for a `(keyword, name)` pair:
//! 1. keyword -> definition URL ([`KeywordTable`])
//! 2. (URL, name) -> term id ([`DefinitionResolver::term_id`])
//!
//! Either step failing is fatal for the extraction of the current graph.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Namespace or annotation definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionKind {
    Namespace,
    Annotation,
}

impl DefinitionKind {
    /// Single-letter code stored in the definitions table
    pub fn code(&self) -> &'static str {
        match self {
            DefinitionKind::Namespace => "N",
            DefinitionKind::Annotation => "A",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefinitionKind::Namespace => "namespace",
            DefinitionKind::Annotation => "annotation",
        }
    }
}

impl FromStr for DefinitionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "n" | "namespace" | "ns" => Ok(DefinitionKind::Namespace),
            "a" | "annotation" | "anno" => Ok(DefinitionKind::Annotation),
            _ => Err(Error::InvalidData(format!("Unknown definition kind: {}", s))),
        }
    }
}

impl fmt::Display for DefinitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata of one versioned definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    pub keyword: String,
    pub url: String,
    pub kind: DefinitionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<NaiveDate>,
}

impl DefinitionInfo {
    pub fn new(kind: DefinitionKind, keyword: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            url: url.into(),
            kind,
            version: None,
            published: None,
        }
    }

    pub fn with_published(mut self, published: NaiveDate) -> Self {
        self.published = Some(published);
        self
    }

    /// Whether this definition should replace `other` under the same
    /// keyword: later publication date wins, a dated definition beats an
    /// undated one, ties go to the greater URL.
    pub fn supersedes(&self, other: &DefinitionInfo) -> bool {
        (self.published, &self.url) > (other.published, &other.url)
    }
}

/// Vocabulary lookups consumed by the extractor
pub trait DefinitionResolver {
    /// URLs of every known definition of a kind
    fn definition_urls(&self, kind: DefinitionKind) -> Vec<String>;

    /// Metadata for a definition URL
    fn definition_info(&self, url: &str) -> Result<DefinitionInfo>;

    /// Storage id of a term within a definition
    fn term_id(&self, url: &str, name: &str) -> Option<i64>;
}

/// In-memory snapshot of the definition tables
#[derive(Debug, Clone, Default)]
pub struct DefinitionCatalog {
    definitions: BTreeMap<String, DefinitionInfo>,
    terms: HashMap<String, HashMap<String, i64>>,
}

impl DefinitionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition with its `(name, term id)` pairs
    pub fn insert<I>(&mut self, info: DefinitionInfo, terms: I)
    where
        I: IntoIterator<Item = (String, i64)>,
    {
        self.terms.entry(info.url.clone()).or_default().extend(terms);
        self.definitions.insert(info.url.clone(), info);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Total number of terms across definitions
    pub fn term_count(&self) -> usize {
        self.terms.values().map(HashMap::len).sum()
    }
}

impl DefinitionResolver for DefinitionCatalog {
    fn definition_urls(&self, kind: DefinitionKind) -> Vec<String> {
        self.definitions
            .values()
            .filter(|d| d.kind == kind)
            .map(|d| d.url.clone())
            .collect()
    }

    fn definition_info(&self, url: &str) -> Result<DefinitionInfo> {
        self.definitions
            .get(url)
            .cloned()
            .ok_or_else(|| Error::UnknownDefinition(url.to_string()))
    }

    fn term_id(&self, url: &str, name: &str) -> Option<i64> {
        self.terms.get(url).and_then(|names| names.get(name)).copied()
    }
}

/// Keyword -> definition lookup for one definition kind
pub struct KeywordTable<'r> {
    resolver: &'r dyn DefinitionResolver,
    kind: DefinitionKind,
    by_keyword: HashMap<String, DefinitionInfo>,
}

impl<'r> KeywordTable<'r> {
    /// Build the table from every definition the resolver knows.
    ///
    /// When several definitions share a keyword, [`DefinitionInfo::supersedes`]
    /// picks the winner, independent of enumeration order.
    pub fn build(resolver: &'r dyn DefinitionResolver, kind: DefinitionKind) -> Result<Self> {
        let mut by_keyword: HashMap<String, DefinitionInfo> = HashMap::new();

        for url in resolver.definition_urls(kind) {
            let info = resolver.definition_info(&url)?;
            match by_keyword.get(&info.keyword) {
                Some(current) if !info.supersedes(current) => {
                    tracing::debug!("Keeping {} for {} {} over {}", current.url, kind, info.keyword, info.url);
                }
                _ => {
                    by_keyword.insert(info.keyword.clone(), info);
                }
            }
        }

        Ok(Self {
            resolver,
            kind,
            by_keyword,
        })
    }

    pub fn kind(&self) -> DefinitionKind {
        self.kind
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.by_keyword.contains_key(keyword)
    }

    /// The definition chosen for a keyword
    pub fn get(&self, keyword: &str) -> Option<&DefinitionInfo> {
        self.by_keyword.get(keyword)
    }

    pub fn len(&self) -> usize {
        self.by_keyword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_keyword.is_empty()
    }

    /// Resolve `(keyword, name)` to a term id
    pub fn resolve_term_id(&self, keyword: &str, name: &str) -> Result<i64> {
        let info = self.by_keyword.get(keyword).ok_or_else(|| Error::UnknownKeyword {
            kind: self.kind,
            keyword: keyword.to_string(),
        })?;

        self.resolver
            .term_id(&info.url, name)
            .ok_or_else(|| Error::UnresolvedTerm {
                kind: self.kind,
                keyword: keyword.to_string(),
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn catalog() -> DefinitionCatalog {
        let mut catalog = DefinitionCatalog::new();
        catalog.insert(
            DefinitionInfo::new(DefinitionKind::Namespace, "HGNC", "http://example.org/2015/hgnc.belns")
                .with_published(date(2015, 6, 11)),
            vec![("APP".to_string(), 1), ("AKT1".to_string(), 2)],
        );
        catalog.insert(
            DefinitionInfo::new(DefinitionKind::Namespace, "HGNC", "http://example.org/2016/hgnc.belns")
                .with_published(date(2016, 1, 1)),
            vec![("APP".to_string(), 11)],
        );
        catalog.insert(
            DefinitionInfo::new(DefinitionKind::Annotation, "Species", "http://example.org/species.belanno"),
            vec![("9606".to_string(), 20)],
        );
        catalog
    }

    #[test]
    fn test_most_recent_definition_wins() {
        let catalog = catalog();
        let table = KeywordTable::build(&catalog, DefinitionKind::Namespace).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("HGNC").unwrap().url, "http://example.org/2016/hgnc.belns");
        assert_eq!(table.resolve_term_id("HGNC", "APP").unwrap(), 11);
    }

    #[test]
    fn test_supersedes_rule() {
        let undated = DefinitionInfo::new(DefinitionKind::Namespace, "X", "http://z");
        let dated = DefinitionInfo::new(DefinitionKind::Namespace, "X", "http://a").with_published(date(2000, 1, 1));
        assert!(dated.supersedes(&undated));
        assert!(!undated.supersedes(&dated));

        let other_url = DefinitionInfo::new(DefinitionKind::Namespace, "X", "http://b").with_published(date(2000, 1, 1));
        assert!(other_url.supersedes(&dated));
    }

    #[test]
    fn test_resolution_failures() {
        let catalog = catalog();
        let table = KeywordTable::build(&catalog, DefinitionKind::Namespace).unwrap();

        // AKT1 only exists in the superseded version
        let err = table.resolve_term_id("HGNC", "AKT1").unwrap_err();
        assert!(matches!(err, Error::UnresolvedTerm { .. }));
        assert!(err.is_resolution_failure());

        let err = table.resolve_term_id("MGI", "App").unwrap_err();
        assert!(matches!(err, Error::UnknownKeyword { kind: DefinitionKind::Namespace, .. }));
    }

    #[test]
    fn test_kinds_are_separate() {
        let catalog = catalog();
        let annotations = KeywordTable::build(&catalog, DefinitionKind::Annotation).unwrap();
        assert!(annotations.contains("Species"));
        assert!(!annotations.contains("HGNC"));
        assert_eq!(annotations.resolve_term_id("Species", "9606").unwrap(), 20);
    }

    #[test]
    fn test_unknown_definition_url() {
        let catalog = catalog();
        assert!(matches!(
            catalog.definition_info("http://nowhere"),
            Err(Error::UnknownDefinition(_))
        ));
    }
}
