//! Assertion Graph - in-memory directed multi-edge graph
//!
//! This is the structure handed over by the upstream parser. Nodes are
//! indexed by their [`NodeKey`]; edges keep insertion order, which is the
//! order the extractor walks them in. Several edges may connect the same
//! pair of nodes; each gets a per-pair key.
//!
//! The graph serializes through a flattened form (node list + edge list),
//! which is what the graph blob store persists.

use std::collections::{BTreeMap, HashMap};
use serde::{Deserialize, Serialize};

use crate::edge::EdgeData;
use crate::node::{NodeData, NodeKey};
use crate::{Error, Result};

/// Document-level metadata of a graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A stored edge: endpoints, per-pair key, attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub subject: NodeKey,
    pub object: NodeKey,
    pub key: u32,
    pub data: EdgeData,
}

/// Directed multi-edge assertion graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "FlatGraph", try_from = "FlatGraph")]
pub struct BelGraph {
    pub document: Document,
    /// Namespace keyword -> definition URL, as declared by the source document
    pub namespace_url: BTreeMap<String, String>,
    /// Annotation keyword -> definition URL, as declared by the source document
    pub annotation_url: BTreeMap<String, String>,
    nodes: Vec<(NodeKey, NodeData)>,
    node_index: HashMap<NodeKey, usize>,
    edges: Vec<GraphEdge>,
    /// Next free edge key per (subject, object) pair
    pair_keys: HashMap<(usize, usize), u32>,
}

impl BelGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns false (and keeps the existing data) when the
    /// key is already present.
    pub fn add_node(&mut self, key: NodeKey, data: NodeData) -> bool {
        if self.node_index.contains_key(&key) {
            return false;
        }
        self.node_index.insert(key.clone(), self.nodes.len());
        self.nodes.push((key, data));
        true
    }

    /// Add an edge between two existing nodes and return its per-pair key
    pub fn add_edge(&mut self, subject: &NodeKey, object: &NodeKey, data: EdgeData) -> Result<u32> {
        let u = self.index_of(subject)?;
        let v = self.index_of(object)?;

        let next = self.pair_keys.entry((u, v)).or_insert(0);
        let key = *next;
        *next = key
            .checked_add(1)
            .ok_or_else(|| Error::InvalidGraph(format!("Edge keys exhausted for {} -> {}", subject, object)))?;

        self.edges.push(GraphEdge {
            subject: subject.clone(),
            object: object.clone(),
            key,
            data,
        });
        Ok(key)
    }

    fn index_of(&self, key: &NodeKey) -> Result<usize> {
        self.node_index
            .get(key)
            .copied()
            .ok_or_else(|| Error::InvalidGraph(format!("Edge endpoint is not a node: {}", key)))
    }

    /// Get a node's data by key
    pub fn node(&self, key: &NodeKey) -> Option<&NodeData> {
        self.node_index.get(key).map(|&i| &self.nodes[i].1)
    }

    pub fn contains_node(&self, key: &NodeKey) -> bool {
        self.node_index.contains_key(key)
    }

    /// All nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeKey, &NodeData)> {
        self.nodes.iter().map(|(k, d)| (k, d))
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter()
    }

    /// Edges from `subject` to `object`
    pub fn edges_between<'a>(&'a self, subject: &'a NodeKey, object: &'a NodeKey) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges
            .iter()
            .filter(move |e| &e.subject == subject && &e.object == object)
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn number_of_edges(&self) -> usize {
        self.edges.len()
    }

    /// Serialize to the blob form kept by the graph store
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Rebuild a graph from its blob form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Flattened graph: what actually goes through serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlatGraph {
    #[serde(default)]
    document: Document,
    #[serde(default)]
    namespace_url: BTreeMap<String, String>,
    #[serde(default)]
    annotation_url: BTreeMap<String, String>,
    nodes: Vec<FlatNode>,
    edges: Vec<GraphEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FlatNode {
    key: NodeKey,
    data: NodeData,
}

impl From<BelGraph> for FlatGraph {
    fn from(graph: BelGraph) -> Self {
        FlatGraph {
            document: graph.document,
            namespace_url: graph.namespace_url,
            annotation_url: graph.annotation_url,
            nodes: graph
                .nodes
                .into_iter()
                .map(|(key, data)| FlatNode { key, data })
                .collect(),
            edges: graph.edges,
        }
    }
}

impl TryFrom<FlatGraph> for BelGraph {
    type Error = Error;

    fn try_from(flat: FlatGraph) -> Result<Self> {
        let mut graph = BelGraph {
            document: flat.document,
            namespace_url: flat.namespace_url,
            annotation_url: flat.annotation_url,
            ..BelGraph::default()
        };

        for node in flat.nodes {
            if !graph.add_node(node.key.clone(), node.data) {
                return Err(Error::InvalidGraph(format!("Duplicate node: {}", node.key)));
            }
        }

        for edge in flat.edges {
            let u = graph.index_of(&edge.subject)?;
            let v = graph.index_of(&edge.object)?;
            let next = graph.pair_keys.entry((u, v)).or_insert(0);
            let after = edge.key.checked_add(1).ok_or_else(|| {
                Error::InvalidGraph(format!(
                    "Edge key {} out of range for {} -> {}",
                    edge.key, edge.subject, edge.object
                ))
            })?;
            *next = (*next).max(after);
            graph.edges.push(edge);
        }

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{Citation, EdgeData};
    use crate::node::{Function, NodeData};

    fn protein(name: &str) -> (NodeKey, NodeData) {
        (
            NodeKey::from_texts(["Protein", "HGNC", name]),
            NodeData::named(Function::Protein, "HGNC", name),
        )
    }

    #[test]
    fn test_add_nodes_and_edges() {
        let mut graph = BelGraph::new();
        let (a, a_data) = protein("AKT1");
        let (b, b_data) = protein("EGFR");

        assert!(graph.add_node(a.clone(), a_data.clone()));
        assert!(!graph.add_node(a.clone(), a_data));
        graph.add_node(b.clone(), b_data);

        assert_eq!(graph.add_edge(&a, &b, EdgeData::new("increases")).unwrap(), 0);
        assert_eq!(graph.add_edge(&a, &b, EdgeData::new("increases")).unwrap(), 1);
        assert_eq!(graph.add_edge(&b, &a, EdgeData::new("decreases")).unwrap(), 0);

        assert_eq!(graph.number_of_nodes(), 2);
        assert_eq!(graph.number_of_edges(), 3);
        assert_eq!(graph.edges_between(&a, &b).count(), 2);
    }

    #[test]
    fn test_edge_requires_nodes() {
        let mut graph = BelGraph::new();
        let (a, _) = protein("AKT1");
        let (b, b_data) = protein("EGFR");
        graph.add_node(b.clone(), b_data);

        assert!(matches!(
            graph.add_edge(&a, &b, EdgeData::new("increases")),
            Err(Error::InvalidGraph(_))
        ));
    }

    #[test]
    fn test_bytes_roundtrip() {
        let mut graph = BelGraph::new();
        graph.document.name = Some("Test".to_string());
        graph.namespace_url.insert("HGNC".to_string(), "http://example.org/hgnc.belns".to_string());
        let (a, a_data) = protein("AKT1");
        let (b, b_data) = protein("EGFR");
        graph.add_node(a.clone(), a_data);
        graph.add_node(b.clone(), b_data);
        graph
            .add_edge(&a, &b, EdgeData::new("increases").with_citation(Citation::new("PubMed", "1")).with_evidence("E1"))
            .unwrap();
        graph.add_edge(&a, &b, EdgeData::new("increases")).unwrap();

        let bytes = graph.to_bytes().unwrap();
        let mut restored = BelGraph::from_bytes(&bytes).unwrap();
        assert_eq!(restored, graph);

        // Per-pair keys continue where the original left off
        assert_eq!(restored.add_edge(&a, &b, EdgeData::new("decreases")).unwrap(), 2);
    }

    fn graph_with_edge_key(key: u32) -> Vec<u8> {
        let mut graph = BelGraph::new();
        let (a, a_data) = protein("AKT1");
        let (b, b_data) = protein("EGFR");
        graph.add_node(a.clone(), a_data);
        graph.add_node(b.clone(), b_data);
        graph.add_edge(&a, &b, EdgeData::new("increases")).unwrap();

        let mut value: serde_json::Value = serde_json::from_slice(&graph.to_bytes().unwrap()).unwrap();
        value["edges"][0]["key"] = serde_json::json!(key);
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_max_edge_key_is_rejected() {
        let err = BelGraph::from_bytes(&graph_with_edge_key(u32::MAX)).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn test_exhausted_edge_keys() {
        let mut graph = BelGraph::from_bytes(&graph_with_edge_key(u32::MAX - 1)).unwrap();
        let (a, _) = protein("AKT1");
        let (b, _) = protein("EGFR");

        assert!(matches!(
            graph.add_edge(&a, &b, EdgeData::new("increases")),
            Err(Error::InvalidGraph(_))
        ));
        assert_eq!(graph.number_of_edges(), 1);
        // Other pairs are unaffected
        assert_eq!(graph.add_edge(&b, &a, EdgeData::new("increases")).unwrap(), 0);
    }
}
