//! Row types written through the transactor
//!
//! Each type maps onto one table. Entities with a content fingerprint or a
//! natural key are discriminated by those columns; everything else
//! (modifications, properties, link rows) is matched on every column.

use rusqlite::types::Value;

use super::transactor::{int, opt_int, opt_text, text, Record};
use crate::hash::Fingerprint;
use crate::node::{Function, NodeKey};
use crate::Result;

/// Node row, discriminated by fingerprint
#[derive(Debug, Clone)]
pub struct NewNode {
    pub function: Function,
    pub identifier_id: Option<i64>,
    pub key_string: String,
    pub key_fields: String,
    pub fingerprint: Fingerprint,
}

impl NewNode {
    pub fn new(key: &NodeKey, function: Function, identifier_id: Option<i64>) -> Result<Self> {
        Ok(Self {
            function,
            identifier_id,
            key_string: key.to_string(),
            key_fields: key.to_json()?,
            fingerprint: Fingerprint::of_node(key),
        })
    }
}

impl Record for NewNode {
    const TABLE: &'static str = "nodes";
    const COLUMNS: &'static [&'static str] = &["function", "identifier_id", "key_string", "key_fields", "fingerprint"];
    const DISCRIMINATOR: &'static [&'static str] = &["fingerprint"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(self.function.as_str()),
            opt_int(self.identifier_id),
            text(&self.key_string),
            text(&self.key_fields),
            text(self.fingerprint.as_str()),
        ]
    }
}

/// Modification row (variant, protein modification or fusion)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewModification {
    pub mod_type: String,
    pub variant_string: Option<String>,
    pub pmod_name: Option<String>,
    pub pmod_name_id: Option<i64>,
    pub amino_acid: Option<String>,
    pub position: Option<i64>,
    pub p5_name_id: Option<i64>,
    pub p5_range: Option<String>,
    pub p3_name_id: Option<i64>,
    pub p3_range: Option<String>,
}

impl Record for NewModification {
    const TABLE: &'static str = "modifications";
    const COLUMNS: &'static [&'static str] = &[
        "mod_type",
        "variant_string",
        "pmod_name",
        "pmod_name_id",
        "amino_acid",
        "position",
        "p5_name_id",
        "p5_range",
        "p3_name_id",
        "p3_range",
    ];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.mod_type),
            opt_text(self.variant_string.as_deref()),
            opt_text(self.pmod_name.as_deref()),
            opt_int(self.pmod_name_id),
            opt_text(self.amino_acid.as_deref()),
            opt_int(self.position),
            opt_int(self.p5_name_id),
            opt_text(self.p5_range.as_deref()),
            opt_int(self.p3_name_id),
            opt_text(self.p3_range.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NodeModificationLink {
    pub node_id: i64,
    pub modification_id: i64,
}

impl Record for NodeModificationLink {
    const TABLE: &'static str = "node_modifications";
    const COLUMNS: &'static [&'static str] = &["node_id", "modification_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![int(self.node_id), int(self.modification_id)]
    }
}

/// Citation row, discriminated by (type, reference)
#[derive(Debug, Clone)]
pub struct NewCitation {
    pub citation_type: String,
    pub reference: String,
    pub name: Option<String>,
    pub date: Option<String>,
    pub comments: Option<String>,
}

impl Record for NewCitation {
    const TABLE: &'static str = "citations";
    const COLUMNS: &'static [&'static str] = &["citation_type", "reference", "name", "date", "comments"];
    const DISCRIMINATOR: &'static [&'static str] = &["citation_type", "reference"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.citation_type),
            text(&self.reference),
            opt_text(self.name.as_deref()),
            opt_text(self.date.as_deref()),
            opt_text(self.comments.as_deref()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
}

impl Record for NewAuthor {
    const TABLE: &'static str = "authors";
    const COLUMNS: &'static [&'static str] = &["name"];
    const DISCRIMINATOR: &'static [&'static str] = &["name"];

    fn values(&self) -> Vec<Value> {
        vec![text(&self.name)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CitationAuthorLink {
    pub citation_id: i64,
    pub author_id: i64,
}

impl Record for CitationAuthorLink {
    const TABLE: &'static str = "citation_authors";
    const COLUMNS: &'static [&'static str] = &["citation_id", "author_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![int(self.citation_id), int(self.author_id)]
    }
}

/// Evidence row, discriminated by the fingerprint of its text
#[derive(Debug, Clone)]
pub struct NewEvidence {
    pub citation_id: i64,
    pub text: String,
    pub fingerprint: Fingerprint,
}

impl NewEvidence {
    pub fn new(citation_id: i64, text: &str) -> Self {
        Self {
            citation_id,
            text: text.to_string(),
            fingerprint: Fingerprint::of_evidence(text),
        }
    }
}

impl Record for NewEvidence {
    const TABLE: &'static str = "evidence";
    const COLUMNS: &'static [&'static str] = &["citation_id", "text", "fingerprint"];
    const DISCRIMINATOR: &'static [&'static str] = &["fingerprint"];

    fn values(&self) -> Vec<Value> {
        vec![int(self.citation_id), text(&self.text), text(self.fingerprint.as_str())]
    }
}

/// Edge row, discriminated by the fingerprint of its quadruple
#[derive(Debug, Clone)]
pub struct NewEdge {
    pub subject_id: i64,
    pub relation: String,
    pub object_id: i64,
    pub citation_id: Option<i64>,
    pub evidence_id: Option<i64>,
    pub fingerprint: Fingerprint,
}

impl NewEdge {
    pub fn new(subject_id: i64, relation: &str, object_id: i64, citation_id: Option<i64>, evidence_id: Option<i64>) -> Self {
        Self {
            subject_id,
            relation: relation.to_string(),
            object_id,
            citation_id,
            evidence_id,
            fingerprint: Fingerprint::of_edge(subject_id, object_id, relation, evidence_id),
        }
    }
}

impl Record for NewEdge {
    const TABLE: &'static str = "edges";
    const COLUMNS: &'static [&'static str] = &["subject_id", "relation", "object_id", "citation_id", "evidence_id", "fingerprint"];
    const DISCRIMINATOR: &'static [&'static str] = &["fingerprint"];

    fn values(&self) -> Vec<Value> {
        vec![
            int(self.subject_id),
            text(&self.relation),
            int(self.object_id),
            opt_int(self.citation_id),
            opt_int(self.evidence_id),
            text(self.fingerprint.as_str()),
        ]
    }
}

/// Structured edge qualifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProperty {
    pub participant: String,
    pub modifier: String,
    pub relative_key: Option<String>,
    pub prop_value: Option<String>,
    pub name_id: Option<i64>,
}

impl Record for NewProperty {
    const TABLE: &'static str = "properties";
    const COLUMNS: &'static [&'static str] = &["participant", "modifier", "relative_key", "prop_value", "name_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.participant),
            text(&self.modifier),
            opt_text(self.relative_key.as_deref()),
            opt_text(self.prop_value.as_deref()),
            opt_int(self.name_id),
        ]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EdgePropertyLink {
    pub edge_id: i64,
    pub property_id: i64,
}

impl Record for EdgePropertyLink {
    const TABLE: &'static str = "edge_properties";
    const COLUMNS: &'static [&'static str] = &["edge_id", "property_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![int(self.edge_id), int(self.property_id)]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EdgeAnnotationLink {
    pub edge_id: i64,
    pub annotation_term_id: i64,
}

impl Record for EdgeAnnotationLink {
    const TABLE: &'static str = "edge_annotations";
    const COLUMNS: &'static [&'static str] = &["edge_id", "annotation_term_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![int(self.edge_id), int(self.annotation_term_id)]
    }
}

/// Membership of an edge in a stored graph
#[derive(Debug, Clone, Copy)]
pub struct EdgeGraphLink {
    pub edge_id: i64,
    pub graph_id: i64,
}

impl Record for EdgeGraphLink {
    const TABLE: &'static str = "edge_graphs";
    const COLUMNS: &'static [&'static str] = &["edge_id", "graph_id"];
    const DISCRIMINATOR: &'static [&'static str] = &[];

    fn values(&self) -> Vec<Value> {
        vec![int(self.edge_id), int(self.graph_id)]
    }
}

/// Definition row, discriminated by URL
#[derive(Debug, Clone)]
pub struct NewDefinition {
    pub kind: String,
    pub url: String,
    pub keyword: String,
    pub version: Option<String>,
    pub published: Option<String>,
    pub author: Option<String>,
    pub created: String,
}

impl Record for NewDefinition {
    const TABLE: &'static str = "definitions";
    const COLUMNS: &'static [&'static str] = &["kind", "url", "keyword", "version", "published", "author", "created"];
    const DISCRIMINATOR: &'static [&'static str] = &["url"];

    fn values(&self) -> Vec<Value> {
        vec![
            text(&self.kind),
            text(&self.url),
            text(&self.keyword),
            opt_text(self.version.as_deref()),
            opt_text(self.published.as_deref()),
            opt_text(self.author.as_deref()),
            text(&self.created),
        ]
    }
}

/// Term of a definition, discriminated by (definition, name)
#[derive(Debug, Clone)]
pub struct NewDefinitionTerm {
    pub definition_id: i64,
    pub name: String,
    pub encoding: Option<String>,
}

impl Record for NewDefinitionTerm {
    const TABLE: &'static str = "definition_terms";
    const COLUMNS: &'static [&'static str] = &["definition_id", "name", "encoding"];
    const DISCRIMINATOR: &'static [&'static str] = &["definition_id", "name"];

    fn values(&self) -> Vec<Value> {
        vec![int(self.definition_id), text(&self.name), opt_text(self.encoding.as_deref())]
    }
}
