//! Graph Blob Store - public entry points
//!
//! A stored graph is two independent artifacts:
//! - the serialized graph under a unique label, for exact reload
//! - optionally, its relational decomposition (see [`crate::extract`])
//!
//! Both are written in one transaction. A duplicate label is reported as
//! [`StoreOutcome::LabelConflict`] and writes nothing; any failure during
//! extraction rolls back the blob as well.

use std::fmt;
use std::path::Path;

use crate::cache::{CacheKind, EntityCache};
use crate::extract::{ExtractionStats, GraphExtractor};
use crate::graph::BelGraph;
use crate::resolver::DefinitionResolver;
use crate::storage::{DbStats, SqliteStore, Transactor};
use crate::Result;

/// Behaviour of [`GraphStore::store_graph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Decompose graphs into relational rows by default
    pub extract_information: bool,
    /// Preload the entity cache from existing rows before extracting
    pub warm_start_cache: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            extract_information: true,
            warm_start_cache: false,
        }
    }
}

/// What a successful store wrote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreReport {
    pub graph_id: i64,
    pub label: String,
    pub nodes: usize,
    pub edges: usize,
    /// `None` when extraction was disabled
    pub extraction: Option<ExtractionStats>,
}

impl fmt::Display for StoreReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Stored '{}' (id {}): {} nodes, {} edges", self.label, self.graph_id, self.nodes, self.edges)?;
        if let Some(extraction) = &self.extraction {
            write!(f, "{}", extraction)?;
        }
        Ok(())
    }
}

/// Result of a store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored(StoreReport),
    /// A graph with this label already exists; nothing was written
    LabelConflict,
}

impl StoreOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, StoreOutcome::Stored(_))
    }

    pub fn report(&self) -> Option<&StoreReport> {
        match self {
            StoreOutcome::Stored(report) => Some(report),
            StoreOutcome::LabelConflict => None,
        }
    }
}

/// Label-addressed graph storage over a [`SqliteStore`]
pub struct GraphStore {
    store: SqliteStore,
    config: StoreConfig,
}

impl GraphStore {
    pub fn new(store: SqliteStore, config: StoreConfig) -> Self {
        Self { store, config }
    }

    /// Open (or create) a database file
    pub fn open(path: &Path, config: StoreConfig) -> Result<Self> {
        Ok(Self::new(SqliteStore::open(path)?, config))
    }

    /// In-memory store with default configuration (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(SqliteStore::open_in_memory()?, StoreConfig::default()))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn store(&self) -> &SqliteStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut SqliteStore {
        &mut self.store
    }

    /// Store `graph` under `label`, decomposing it when
    /// `extract_information` is set.
    ///
    /// Resolution uses a snapshot of the definition catalog taken before the
    /// transaction opens; the entity cache lives for this call only.
    pub fn store_graph(
        &mut self,
        graph: &BelGraph,
        label: &str,
        description: Option<&str>,
        extract_information: bool,
    ) -> Result<StoreOutcome> {
        if self.store.graph_label_exists(label)? {
            tracing::warn!("A graph labelled '{}' is already stored", label);
            return Ok(StoreOutcome::LabelConflict);
        }

        let mut cache = EntityCache::new();
        if !extract_information {
            return self.store_graph_with(graph, label, description, None, &mut cache);
        }

        let catalog = self.store.load_catalog()?;
        if self.config.warm_start_cache {
            let loaded = cache.warm_start(&self.store, CacheKind::all())?;
            tracing::debug!("Warm-started cache with {} entries", loaded);
        }
        self.store_graph_with(graph, label, description, Some(&catalog), &mut cache)
    }

    /// Store with the configured default for extraction
    pub fn store_graph_default(&mut self, graph: &BelGraph, label: &str, description: Option<&str>) -> Result<StoreOutcome> {
        let extract = self.config.extract_information;
        self.store_graph(graph, label, description, extract)
    }

    /// Store `graph` with a caller-supplied resolver and cache.
    ///
    /// Without a resolver only the blob is written. `cache` only takes the
    /// ids of this call once the transaction has committed.
    pub fn store_graph_with(
        &mut self,
        graph: &BelGraph,
        label: &str,
        description: Option<&str>,
        resolver: Option<&dyn DefinitionResolver>,
        cache: &mut EntityCache,
    ) -> Result<StoreOutcome> {
        if self.store.graph_label_exists(label)? {
            tracing::warn!("A graph labelled '{}' is already stored", label);
            return Ok(StoreOutcome::LabelConflict);
        }

        let blob = graph.to_bytes()?;
        let extractor = resolver.map(GraphExtractor::new).transpose()?;

        let tx = self.store.transaction()?;
        let mut transactor = Transactor::new(&tx);
        let graph_id = transactor.insert_graph(label, description, &blob)?;
        let mut scratch = cache.clone();
        let extraction = match &extractor {
            Some(extractor) => Some(extractor.extract(&mut transactor, graph, graph_id, &mut scratch)?),
            None => None,
        };
        drop(transactor);
        tx.commit()?;
        *cache = scratch;

        tracing::info!(
            "Stored graph '{}' ({} nodes, {} edges, {} bytes{})",
            label,
            graph.number_of_nodes(),
            graph.number_of_edges(),
            blob.len(),
            if extraction.is_some() { ", extracted" } else { "" }
        );

        Ok(StoreOutcome::Stored(StoreReport {
            graph_id,
            label: label.to_string(),
            nodes: graph.number_of_nodes(),
            edges: graph.number_of_edges(),
            extraction,
        }))
    }

    /// Reload the graph stored under `label`
    pub fn load_graph(&self, label: &str) -> Result<Option<BelGraph>> {
        match self.store.load_graph_blob(label)? {
            Some(blob) => Ok(Some(BelGraph::from_bytes(&blob)?)),
            None => {
                tracing::debug!("No graph labelled '{}'", label);
                Ok(None)
            }
        }
    }

    /// Labels of every stored graph, in storage order
    pub fn list_stored_graph_labels(&self) -> Result<Vec<String>> {
        self.store.list_graph_labels()
    }

    pub fn stats(&self) -> Result<DbStats> {
        self.store.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Citation, EdgeData, EffectValue, ModifierKind, Participant, ParticipantModifier};
    use crate::node::{Function, NodeData, NodeKey, TermRef, Variant};
    use crate::resolver::{DefinitionInfo, DefinitionKind};
    use crate::Error;

    fn graph_store(config: StoreConfig) -> GraphStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .insert_definition(
                &DefinitionInfo::new(DefinitionKind::Namespace, "HGNC", "http://ns/hgnc"),
                None,
                ["A", "B"],
            )
            .unwrap();
        store
            .insert_definition(
                &DefinitionInfo::new(DefinitionKind::Namespace, "GOMF", "http://ns/gomf"),
                None,
                ["kinase activity"],
            )
            .unwrap();
        store
            .insert_definition(
                &DefinitionInfo::new(DefinitionKind::Annotation, "Species", "http://anno/species"),
                None,
                ["9606"],
            )
            .unwrap();
        GraphStore::new(store, config)
    }

    fn protein(name: &str) -> NodeKey {
        NodeKey::from_texts(["Protein", "HGNC", name])
    }

    fn sample_graph(evidences: &[&str]) -> BelGraph {
        let mut graph = BelGraph::new();
        graph.add_node(protein("A"), NodeData::named(Function::Protein, "HGNC", "A"));
        graph.add_node(protein("B"), NodeData::named(Function::Protein, "HGNC", "B"));
        for text in evidences {
            graph
                .add_edge(
                    &protein("A"),
                    &protein("B"),
                    EdgeData::new("increases")
                        .with_citation(Citation::new("PubMed", "C1"))
                        .with_evidence(*text)
                        .with_annotation("Species", "9606"),
                )
                .unwrap();
        }
        graph
    }

    #[test]
    fn test_store_two_evidences() {
        let mut store = graph_store(StoreConfig::default());
        let outcome = store.store_graph(&sample_graph(&["E1", "E2"]), "tg", None, true).unwrap();

        let report = outcome.report().unwrap();
        assert_eq!(report.edges, 2);
        assert_eq!(report.extraction.as_ref().unwrap().edges_visited, 2);

        let stats = store.stats().unwrap();
        assert_eq!(stats.get("nodes"), 2);
        assert_eq!(stats.get("citations"), 1);
        assert_eq!(stats.get("evidence"), 2);
        assert_eq!(stats.get("edges"), 2);
        assert_eq!(stats.get("edge_graphs"), 2);
        assert_eq!(stats.get("edge_annotations"), 2);
    }

    #[test]
    fn test_same_graph_two_labels_shares_edges() {
        let mut store = graph_store(StoreConfig::default());
        let graph = sample_graph(&["E1"]);
        assert!(store.store_graph(&graph, "first", None, true).unwrap().is_stored());
        let second = store.store_graph(&graph, "second", Some("copy"), true).unwrap();

        assert_eq!(second.report().unwrap().extraction.as_ref().unwrap().created_in("edges"), 0);
        let stats = store.stats().unwrap();
        assert_eq!(stats.get("edges"), 1);
        assert_eq!(stats.get("edge_graphs"), 2);
        assert_eq!(store.store().edge_ids_in_graph("first").unwrap(), store.store().edge_ids_in_graph("second").unwrap());
        assert_eq!(store.list_stored_graph_labels().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_label_conflict_leaves_store_unchanged() {
        let mut store = graph_store(StoreConfig::default());
        store.store_graph(&sample_graph(&["E1"]), "tg", None, true).unwrap();
        let before = store.stats().unwrap().tables;

        let outcome = store.store_graph(&sample_graph(&["E2", "E3"]), "tg", None, true).unwrap();
        assert_eq!(outcome, StoreOutcome::LabelConflict);
        assert_eq!(store.stats().unwrap().tables, before);

        let kept = store.load_graph("tg").unwrap().unwrap();
        assert_eq!(kept.number_of_edges(), 1);
    }

    #[test]
    fn test_round_trip_without_extraction() {
        let mut store = graph_store(StoreConfig::default());
        let mut graph = sample_graph(&["E1", "E2"]);
        graph.document.name = Some("Test".to_string());
        graph.namespace_url.insert("HGNC".to_string(), "http://ns/hgnc".to_string());

        let outcome = store.store_graph(&graph, "L", None, false).unwrap();
        assert!(outcome.report().unwrap().extraction.is_none());
        assert_eq!(store.load_graph("L").unwrap(), Some(graph));
        assert_eq!(store.stats().unwrap().get("nodes"), 0);
        assert_eq!(store.load_graph("missing").unwrap(), None);
    }

    #[test]
    fn test_resolution_failure_rolls_back_blob() {
        let mut store = graph_store(StoreConfig::default());
        let mut graph = sample_graph(&["E1"]);
        graph.add_node(protein("Z"), NodeData::named(Function::Protein, "HGNC", "Z"));
        graph.add_edge(&protein("A"), &protein("Z"), EdgeData::new("decreases")).unwrap();

        let err = store.store_graph(&graph, "bad", None, true).unwrap_err();
        assert!(err.is_resolution_failure());
        assert!(store.list_stored_graph_labels().unwrap().is_empty());
        assert_eq!(store.stats().unwrap().get("edges"), 0);

        // The label is still free afterwards
        assert!(store.store_graph(&graph, "bad", None, false).unwrap().is_stored());
    }

    #[test]
    fn test_warm_start_hits_existing_rows() {
        let config = StoreConfig {
            extract_information: true,
            warm_start_cache: true,
        };
        let mut store = graph_store(config);
        store.store_graph_default(&sample_graph(&["E1"]), "first", None).unwrap();

        let outcome = store.store_graph_default(&sample_graph(&["E1"]), "second", None).unwrap();
        let extraction = outcome.report().unwrap().extraction.clone().unwrap();
        // Both nodes, the citation, the evidence and the edge come from the cache
        assert_eq!(extraction.cache_hits, 5);
        assert_eq!(extraction.cache_misses, 0);
        assert_eq!(extraction.created_in("nodes"), 0);
        assert_eq!(extraction.created_in("edge_graphs"), 1);
    }

    #[test]
    fn test_explicit_resolver_and_cache() {
        let mut store = graph_store(StoreConfig::default());
        let catalog = store.store().load_catalog().unwrap();
        let mut cache = EntityCache::new();

        store
            .store_graph_with(&sample_graph(&["E1"]), "one", None, Some(&catalog), &mut cache)
            .unwrap();
        assert_eq!(cache.len_of(CacheKind::Edge), 1);

        let outcome = store
            .store_graph_with(&sample_graph(&["E1"]), "two", None, None, &mut cache)
            .unwrap();
        assert!(outcome.report().unwrap().extraction.is_none());
        assert_eq!(store.stats().unwrap().get("edge_graphs"), 1);
    }

    #[test]
    fn test_failed_store_leaves_caller_cache_untouched() {
        let mut store = graph_store(StoreConfig::default());
        let catalog = store.store().load_catalog().unwrap();
        let mut cache = EntityCache::new();

        let mut failing = BelGraph::new();
        failing.add_node(protein("A"), NodeData::named(Function::Protein, "HGNC", "A"));
        failing.add_node(protein("Z"), NodeData::named(Function::Protein, "HGNC", "Z"));
        failing.add_edge(&protein("A"), &protein("Z"), EdgeData::new("increases")).unwrap();
        let err = store
            .store_graph_with(&failing, "g1", None, Some(&catalog), &mut cache)
            .unwrap_err();
        assert!(err.is_resolution_failure());
        assert!(cache.is_empty());

        let mut graph = BelGraph::new();
        graph.add_node(protein("B"), NodeData::named(Function::Protein, "HGNC", "B"));
        graph.add_node(protein("A"), NodeData::named(Function::Protein, "HGNC", "A"));
        graph.add_edge(&protein("B"), &protein("A"), EdgeData::new("increases")).unwrap();
        store.store_graph_with(&graph, "g2", None, Some(&catalog), &mut cache).unwrap();

        assert_eq!(store.stats().unwrap().get("nodes"), 2);
        let (subject, object): (i64, i64) = store
            .store()
            .connection()
            .query_row("SELECT subject_id, object_id FROM edges", [], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap();
        assert_ne!(subject, object);
        assert_eq!(store.store().node_key(subject).unwrap(), Some(protein("B")));
        assert_eq!(store.store().node_key(object).unwrap(), Some(protein("A")));
        assert_eq!(cache.len_of(CacheKind::Node), 2);
    }

    fn assert_nothing_stored(store: &GraphStore) {
        let stats = store.stats().unwrap();
        for table in ["graph_store", "nodes", "modifications", "edges", "properties", "edge_annotations"] {
            assert_eq!(stats.get(table), 0, "{} should be empty", table);
        }
    }

    #[test]
    fn test_unresolved_annotation_value_aborts() {
        let mut store = graph_store(StoreConfig::default());
        let mut graph = BelGraph::new();
        graph.add_node(protein("A"), NodeData::named(Function::Protein, "HGNC", "A"));
        graph.add_node(protein("B"), NodeData::named(Function::Protein, "HGNC", "B"));
        graph
            .add_edge(&protein("A"), &protein("B"), EdgeData::new("increases").with_annotation("Species", "10090"))
            .unwrap();

        let err = store.store_graph(&graph, "anno", None, true).unwrap_err();
        assert!(matches!(err, Error::UnresolvedTerm { .. }));
        assert_nothing_stored(&store);
    }

    #[test]
    fn test_unresolved_activity_effect_aborts() {
        let mut store = graph_store(StoreConfig::default());
        let mut graph = BelGraph::new();
        graph.add_node(protein("A"), NodeData::named(Function::Protein, "HGNC", "A"));
        graph.add_node(protein("B"), NodeData::named(Function::Protein, "HGNC", "B"));
        let activity = ParticipantModifier::new(ModifierKind::Activity)
            .with_effect("MolecularActivity", EffectValue::Term(TermRef::new("GOMF", "no such activity")));
        graph
            .add_edge(
                &protein("A"),
                &protein("B"),
                EdgeData::new("increases").with_modifier(Participant::Subject, activity),
            )
            .unwrap();

        let err = store.store_graph(&graph, "act", None, true).unwrap_err();
        assert!(matches!(err, Error::UnresolvedTerm { .. }));
        assert_nothing_stored(&store);
    }

    #[test]
    fn test_pmod_with_unknown_namespace_aborts() {
        let mut store = graph_store(StoreConfig::default());
        let key = NodeKey::from_texts(["ProteinVariant", "HGNC", "A", "ProteinModification", "Ph"]);
        let mut graph = BelGraph::new();
        graph.add_node(
            key.clone(),
            NodeData::named(Function::ProteinVariant, "HGNC", "A").with_variant(Variant::ProteinModification {
                name: "Ph".to_string(),
                namespace: Some("PSIMOD".to_string()),
                amino_acid: None,
                position: None,
            }),
        );
        graph.add_node(protein("B"), NodeData::named(Function::Protein, "HGNC", "B"));
        graph.add_edge(&key, &protein("B"), EdgeData::new("increases")).unwrap();

        let err = store.store_graph(&graph, "pmod", None, true).unwrap_err();
        assert!(matches!(err, Error::UnknownKeyword { .. }));
        assert_nothing_stored(&store);
    }
}
