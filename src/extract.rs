//! Graph Extractor - relational decomposition of an assertion graph
//!
//! Walks the edges of a [`BelGraph`] in insertion order and writes every
//! node, citation, evidence, edge, property and annotation link through the
//! get-or-create [`Transactor`]. The [`EntityCache`] is consulted before
//! each lookup; the transactor stays authoritative on a miss.
//!
//! Per edge:
//! 1. subject and object nodes (plus their modifications)
//! 2. provenance: citation (and authors), then evidence scoped to it
//! 3. the edge row, keyed by (subject, object, relation, evidence)
//! 4. the edge's membership in the stored graph
//! 5. participant modifier properties and annotation links
//!
//! Nothing is committed here. Any error aborts the pass and the caller's
//! transaction is dropped.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::cache::{citation_key, CacheKind, EntityCache};
use crate::edge::{Citation, EdgeAttribute, EffectValue, Participant, ParticipantModifier};
use crate::graph::BelGraph;
use crate::hash::Fingerprint;
use crate::node::{Fusion, NodeData, NodeKey, TermRef, Variant};
use crate::resolver::{DefinitionKind, DefinitionResolver, KeywordTable};
use crate::storage::records::{
    CitationAuthorLink, EdgeAnnotationLink, EdgeGraphLink, EdgePropertyLink, NewAuthor, NewCitation, NewEdge,
    NewEvidence, NewModification, NewNode, NewProperty, NodeModificationLink,
};
use crate::storage::Transactor;
use crate::Result;

/// Summary of one extraction pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub edges_visited: usize,
    /// Nodes without any incident edge, stored after the edge pass
    pub isolated_nodes: usize,
    /// Evidence strings dropped because the edge had no citation
    pub skipped_evidence: usize,
    /// Attribute pairs whose key is not a known annotation keyword
    pub unknown_pairs: usize,
    /// Rows inserted per table
    pub created: BTreeMap<&'static str, usize>,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

impl ExtractionStats {
    pub fn created_in(&self, table: &str) -> usize {
        self.created.get(table).copied().unwrap_or(0)
    }
}

impl fmt::Display for ExtractionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extraction Statistics:")?;
        writeln!(f, "  Edges visited: {}", self.edges_visited)?;
        writeln!(f, "  Isolated nodes: {}", self.isolated_nodes)?;
        writeln!(f, "  Skipped evidence: {}", self.skipped_evidence)?;
        writeln!(f, "  Unknown pairs: {}", self.unknown_pairs)?;
        writeln!(f, "  Cache: {} hits, {} misses", self.cache_hits, self.cache_misses)?;
        for (table, count) in &self.created {
            writeln!(f, "  Created {}: {}", table, count)?;
        }
        Ok(())
    }
}

/// Decomposes graphs against one resolver snapshot
pub struct GraphExtractor<'r> {
    namespaces: KeywordTable<'r>,
    annotations: KeywordTable<'r>,
}

impl<'r> GraphExtractor<'r> {
    /// Build the namespace and annotation keyword tables
    pub fn new(resolver: &'r dyn DefinitionResolver) -> Result<Self> {
        let namespaces = KeywordTable::build(resolver, DefinitionKind::Namespace)?;
        let annotations = KeywordTable::build(resolver, DefinitionKind::Annotation)?;
        tracing::debug!(
            "Keyword tables: {} namespaces, {} annotations",
            namespaces.len(),
            annotations.len()
        );
        Ok(Self { namespaces, annotations })
    }

    /// Decompose `graph` into relational rows, linking every edge to the
    /// stored graph `graph_id`
    pub fn extract(
        &self,
        transactor: &mut Transactor<'_>,
        graph: &BelGraph,
        graph_id: i64,
        cache: &mut EntityCache,
    ) -> Result<ExtractionStats> {
        let created_before = transactor.created().clone();
        let (hits_before, misses_before) = (cache.hits(), cache.misses());
        let mut stats = ExtractionStats::default();
        let mut touched: HashSet<&NodeKey> = HashSet::new();

        for edge in graph.edges() {
            let subject_id = self.node_id(transactor, cache, graph, &edge.subject)?;
            let object_id = self.node_id(transactor, cache, graph, &edge.object)?;
            touched.insert(&edge.subject);
            touched.insert(&edge.object);

            let attributes = edge.data.attributes(|key| self.annotations.contains(key));

            let mut citation_id = None;
            let mut evidence_id = None;
            for attribute in attributes.iter().filter(|a| a.is_provenance()) {
                match attribute {
                    EdgeAttribute::CitationBlock(citation) => {
                        citation_id = Some(citation_id_for(transactor, cache, citation)?);
                    }
                    EdgeAttribute::EvidenceText(text) => match citation_id {
                        Some(cid) => evidence_id = Some(evidence_id_for(transactor, cache, cid, text)?),
                        None => {
                            stats.skipped_evidence += 1;
                            tracing::warn!(
                                "Ignoring evidence without citation on {} {} {}",
                                edge.subject,
                                edge.data.relation,
                                edge.object
                            );
                        }
                    },
                    _ => {}
                }
            }

            let record = NewEdge::new(subject_id, &edge.data.relation, object_id, citation_id, evidence_id);
            let edge_id = match cache.lookup(CacheKind::Edge, record.fingerprint.as_str()) {
                Some(id) => id,
                None => {
                    let id = transactor.get_or_create(&record)?.id();
                    cache.remember(CacheKind::Edge, record.fingerprint.as_str(), id);
                    id
                }
            };
            transactor.get_or_create(&EdgeGraphLink { edge_id, graph_id })?;

            for attribute in &attributes {
                match *attribute {
                    EdgeAttribute::ParticipantModifier(participant, modifier) => {
                        for property in self.properties(participant, modifier)? {
                            let property_id = transactor.get_or_create(&property)?.id();
                            transactor.get_or_create(&EdgePropertyLink { edge_id, property_id })?;
                        }
                    }
                    EdgeAttribute::AnnotationPair { key, value } => {
                        let annotation_term_id = self.annotations.resolve_term_id(key, value)?;
                        transactor.get_or_create(&EdgeAnnotationLink {
                            edge_id,
                            annotation_term_id,
                        })?;
                    }
                    EdgeAttribute::UnknownPair { key, value } => {
                        stats.unknown_pairs += 1;
                        tracing::debug!("Skipping unknown attribute {}={}", key, value);
                    }
                    EdgeAttribute::CitationBlock(_) | EdgeAttribute::EvidenceText(_) => {}
                }
            }

            stats.edges_visited += 1;
        }

        for (key, _) in graph.nodes() {
            if !touched.contains(key) {
                self.node_id(transactor, cache, graph, key)?;
                stats.isolated_nodes += 1;
            }
        }

        for (&table, &count) in transactor.created() {
            let delta = count - created_before.get(table).copied().unwrap_or(0);
            if delta > 0 {
                stats.created.insert(table, delta);
            }
        }
        stats.cache_hits = cache.hits() - hits_before;
        stats.cache_misses = cache.misses() - misses_before;

        tracing::debug!(
            "Extracted {} edges ({} cache hits, {} misses)",
            stats.edges_visited,
            stats.cache_hits,
            stats.cache_misses
        );
        Ok(stats)
    }

    // ========== Nodes ==========

    fn node_id(
        &self,
        transactor: &mut Transactor<'_>,
        cache: &mut EntityCache,
        graph: &BelGraph,
        key: &NodeKey,
    ) -> Result<i64> {
        let fingerprint = Fingerprint::of_node(key);
        if let Some(id) = cache.lookup(CacheKind::Node, fingerprint.as_str()) {
            return Ok(id);
        }

        let data = graph
            .node(key)
            .ok_or_else(|| crate::Error::InvalidGraph(format!("Edge endpoint is not a node: {}", key)))?;

        let identifier_id = self.identifier_id(key, data)?;
        let outcome = transactor.get_or_create(&NewNode::new(key, data.function, identifier_id)?)?;
        let node_id = outcome.id();

        if outcome.is_created() {
            let mut modifications: Vec<NewModification> = Vec::with_capacity(data.variants.len() + 1);
            for variant in &data.variants {
                modifications.push(self.variant_modification(variant)?);
            }
            if let Some(fusion) = &data.fusion {
                modifications.push(self.fusion_modification(fusion)?);
            }
            for modification in &modifications {
                let modification_id = transactor.get_or_create(modification)?.id();
                transactor.get_or_create(&NodeModificationLink {
                    node_id,
                    modification_id,
                })?;
            }
        }

        cache.remember(CacheKind::Node, fingerprint.as_str(), node_id);
        Ok(node_id)
    }

    fn identifier_id(&self, key: &NodeKey, data: &NodeData) -> Result<Option<i64>> {
        if data.function.is_structural() || data.fusion.is_some() {
            return Ok(None);
        }
        match data.term() {
            Some(term) => self.namespaces.resolve_term_id(&term.namespace, &term.name).map(Some),
            None => {
                tracing::warn!("Storing {} node without identifier: {}", data.function, key);
                Ok(None)
            }
        }
    }

    fn variant_modification(&self, variant: &Variant) -> Result<NewModification> {
        let modification = match variant {
            Variant::Variant { hgvs } => NewModification {
                mod_type: variant.mod_type().to_string(),
                variant_string: Some(hgvs.clone()),
                ..NewModification::default()
            },
            Variant::ProteinModification {
                name,
                namespace,
                amino_acid,
                position,
            } => NewModification {
                mod_type: variant.mod_type().to_string(),
                pmod_name: Some(name.clone()),
                pmod_name_id: namespace
                    .as_deref()
                    .map(|ns| self.namespaces.resolve_term_id(ns, name))
                    .transpose()?,
                amino_acid: amino_acid.clone(),
                position: *position,
                ..NewModification::default()
            },
        };
        Ok(modification)
    }

    fn fusion_modification(&self, fusion: &Fusion) -> Result<NewModification> {
        Ok(NewModification {
            mod_type: "ProteinFusion".to_string(),
            p5_name_id: self.partner_id(fusion.partner_5p.as_ref())?,
            p5_range: Some(fusion.range_5p.clone()),
            p3_name_id: self.partner_id(fusion.partner_3p.as_ref())?,
            p3_range: Some(fusion.range_3p.clone()),
            ..NewModification::default()
        })
    }

    fn partner_id(&self, partner: Option<&TermRef>) -> Result<Option<i64>> {
        partner
            .map(|term| self.namespaces.resolve_term_id(&term.namespace, &term.name))
            .transpose()
    }

    // ========== Properties ==========

    /// Activity and translocation blocks expand into one property per
    /// effect; every other modifier is a single bare property
    fn properties(&self, participant: Participant, modifier: &ParticipantModifier) -> Result<Vec<NewProperty>> {
        let bare = NewProperty {
            participant: participant.as_str().to_string(),
            modifier: modifier.modifier.as_str().to_string(),
            relative_key: None,
            prop_value: None,
            name_id: None,
        };

        if !modifier.modifier.has_effects() || modifier.effect.is_empty() {
            return Ok(vec![bare]);
        }

        let mut properties = Vec::with_capacity(modifier.effect.len());
        for (key, value) in &modifier.effect {
            let mut property = NewProperty {
                relative_key: Some(key.clone()),
                ..bare.clone()
            };
            match value {
                EffectValue::Term(term) => {
                    property.name_id = Some(self.namespaces.resolve_term_id(&term.namespace, &term.name)?);
                }
                EffectValue::Literal(literal) => property.prop_value = Some(literal.clone()),
            }
            properties.push(property);
        }
        Ok(properties)
    }
}

// ========== Provenance ==========

fn citation_id_for(transactor: &mut Transactor<'_>, cache: &mut EntityCache, citation: &Citation) -> Result<i64> {
    let key = citation_key(&citation.citation_type, &citation.reference);
    if let Some(id) = cache.lookup(CacheKind::Citation, &key) {
        return Ok(id);
    }

    let outcome = transactor.get_or_create(&NewCitation {
        citation_type: citation.citation_type.clone(),
        reference: citation.reference.clone(),
        name: citation.name.clone(),
        date: citation.date.map(|d| d.format("%Y-%m-%d").to_string()),
        comments: citation.comments.clone(),
    })?;
    let citation_id = outcome.id();

    if outcome.is_created() {
        for name in &citation.authors {
            let author_id = transactor.get_or_create(&NewAuthor { name: name.clone() })?.id();
            transactor.get_or_create(&CitationAuthorLink { citation_id, author_id })?;
        }
    }

    cache.remember(CacheKind::Citation, key, citation_id);
    Ok(citation_id)
}

fn evidence_id_for(transactor: &mut Transactor<'_>, cache: &mut EntityCache, citation_id: i64, text: &str) -> Result<i64> {
    let record = NewEvidence::new(citation_id, text);
    if let Some(id) = cache.lookup(CacheKind::Evidence, record.fingerprint.as_str()) {
        return Ok(id);
    }
    let id = transactor.get_or_create(&record)?.id();
    cache.remember(CacheKind::Evidence, record.fingerprint.as_str(), id);
    Ok(id)
}
