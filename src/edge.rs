//! Edge types - relations between biological entities and their provenance
//!
//! An edge carries a relation label and an attribute set:
//! - a citation block and supporting evidence text
//! - per-participant modifier blocks (activity, translocation, ...)
//! - flat annotation pairs (tissue, species, ...)
//!
//! Before extraction the attribute set is classified once into
//! [`EdgeAttribute`] variants so the extractor can dispatch on them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::node::TermRef;
use crate::{Error, Result};

/// Bibliographic reference supporting an edge.
///
/// Identity is the (type, reference) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    #[serde(rename = "type")]
    pub citation_type: String,
    pub reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

impl Citation {
    pub fn new(citation_type: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            citation_type: citation_type.into(),
            reference: reference.into(),
            name: None,
            date: None,
            authors: Vec::new(),
            comments: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set authors from a `|`-separated list, the form used in citation blocks
    pub fn with_authors(mut self, authors: &str) -> Self {
        self.authors = authors
            .split('|')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .collect();
        self
    }
}

/// Which end of the edge a modifier block qualifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Participant {
    Subject,
    Object,
}

impl Participant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Participant::Subject => "subject",
            Participant::Object => "object",
        }
    }
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of participant modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    Activity,
    Translocation,
    Degradation,
    CellSecretion,
    CellSurfaceExpression,
}

impl ModifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModifierKind::Activity => "Activity",
            ModifierKind::Translocation => "Translocation",
            ModifierKind::Degradation => "Degradation",
            ModifierKind::CellSecretion => "CellSecretion",
            ModifierKind::CellSurfaceExpression => "CellSurfaceExpression",
        }
    }

    /// Whether the modifier's effect map expands into one property per entry
    pub fn has_effects(&self) -> bool {
        matches!(self, ModifierKind::Activity | ModifierKind::Translocation)
    }
}

impl FromStr for ModifierKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Activity" => Ok(ModifierKind::Activity),
            "Translocation" => Ok(ModifierKind::Translocation),
            "Degradation" => Ok(ModifierKind::Degradation),
            "CellSecretion" => Ok(ModifierKind::CellSecretion),
            "CellSurfaceExpression" => Ok(ModifierKind::CellSurfaceExpression),
            _ => Err(Error::InvalidGraph(format!("Unknown modifier: {}", s))),
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Value of one modifier effect: a namespace term or a literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EffectValue {
    Term(TermRef),
    Literal(String),
}

/// Modifier block qualifying the subject or object of an edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantModifier {
    pub modifier: ModifierKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub effect: BTreeMap<String, EffectValue>,
}

impl ParticipantModifier {
    pub fn new(modifier: ModifierKind) -> Self {
        Self {
            modifier,
            effect: BTreeMap::new(),
        }
    }

    pub fn with_effect(mut self, key: impl Into<String>, value: EffectValue) -> Self {
        self.effect.insert(key.into(), value);
        self
    }
}

/// Attributes of one edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeData {
    pub relation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citation: Option<Citation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<ParticipantModifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<ParticipantModifier>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl EdgeData {
    pub fn new(relation: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            citation: None,
            evidence: None,
            subject: None,
            object: None,
            annotations: BTreeMap::new(),
        }
    }

    pub fn with_citation(mut self, citation: Citation) -> Self {
        self.citation = Some(citation);
        self
    }

    pub fn with_evidence(mut self, text: impl Into<String>) -> Self {
        self.evidence = Some(text.into());
        self
    }

    pub fn with_modifier(mut self, participant: Participant, modifier: ParticipantModifier) -> Self {
        match participant {
            Participant::Subject => self.subject = Some(modifier),
            Participant::Object => self.object = Some(modifier),
        }
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Classify the attribute set.
    ///
    /// Provenance (citation, evidence) comes first, then modifiers, then
    /// annotation pairs in key order. A pair whose key is not a known
    /// annotation keyword becomes [`EdgeAttribute::UnknownPair`].
    pub fn attributes<F>(&self, is_annotation: F) -> Vec<EdgeAttribute<'_>>
    where
        F: Fn(&str) -> bool,
    {
        let mut attributes = Vec::with_capacity(4 + self.annotations.len());

        if let Some(citation) = &self.citation {
            attributes.push(EdgeAttribute::CitationBlock(citation));
        }
        if let Some(text) = &self.evidence {
            attributes.push(EdgeAttribute::EvidenceText(text));
        }
        if let Some(modifier) = &self.subject {
            attributes.push(EdgeAttribute::ParticipantModifier(Participant::Subject, modifier));
        }
        if let Some(modifier) = &self.object {
            attributes.push(EdgeAttribute::ParticipantModifier(Participant::Object, modifier));
        }
        for (key, value) in &self.annotations {
            let (key, value) = (key.as_str(), value.as_str());
            if is_annotation(key) {
                attributes.push(EdgeAttribute::AnnotationPair { key, value });
            } else {
                attributes.push(EdgeAttribute::UnknownPair { key, value });
            }
        }

        attributes
    }
}

/// One classified edge attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeAttribute<'a> {
    CitationBlock(&'a Citation),
    EvidenceText(&'a str),
    ParticipantModifier(Participant, &'a ParticipantModifier),
    AnnotationPair { key: &'a str, value: &'a str },
    UnknownPair { key: &'a str, value: &'a str },
}

impl EdgeAttribute<'_> {
    /// Citation and evidence must be resolved before the edge row exists
    pub fn is_provenance(&self) -> bool {
        matches!(self, EdgeAttribute::CitationBlock(_) | EdgeAttribute::EvidenceText(_))
    }
}
