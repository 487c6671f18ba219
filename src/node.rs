//! Node types - biological entities in an assertion graph
//!
//! A node is addressed by a [`NodeKey`], an ordered sequence of typed
//! fields produced by the upstream parser, e.g. `('Protein', 'HGNC', 'APP')`.
//! The key is the node's identity; [`NodeData`] carries the attributes the
//! extractor needs to resolve it against controlled vocabularies.

use crate::hash::quote;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Biological function of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    Abundance,
    Gene,
    #[serde(rename = "RNA")]
    Rna,
    #[serde(rename = "miRNA")]
    MicroRna,
    Protein,
    BiologicalProcess,
    Pathology,
    /// Structural: a complex of other entities
    Complex,
    /// Structural: a composite of other entities
    Composite,
    /// Structural: a reaction between reactants and products
    Reaction,
    ProteinVariant,
    ProteinFusion,
}

impl Function {
    /// Get the string representation of the function
    pub fn as_str(&self) -> &'static str {
        match self {
            Function::Abundance => "Abundance",
            Function::Gene => "Gene",
            Function::Rna => "RNA",
            Function::MicroRna => "miRNA",
            Function::Protein => "Protein",
            Function::BiologicalProcess => "BiologicalProcess",
            Function::Pathology => "Pathology",
            Function::Complex => "Complex",
            Function::Composite => "Composite",
            Function::Reaction => "Reaction",
            Function::ProteinVariant => "ProteinVariant",
            Function::ProteinFusion => "ProteinFusion",
        }
    }

    /// Get all functions
    pub fn all() -> &'static [Function] {
        &[
            Function::Abundance,
            Function::Gene,
            Function::Rna,
            Function::MicroRna,
            Function::Protein,
            Function::BiologicalProcess,
            Function::Pathology,
            Function::Complex,
            Function::Composite,
            Function::Reaction,
            Function::ProteinVariant,
            Function::ProteinFusion,
        ]
    }

    /// Structural nodes are built from other nodes and carry no
    /// namespace identifier of their own.
    pub fn is_structural(&self) -> bool {
        matches!(self, Function::Complex | Function::Composite | Function::Reaction)
    }
}

impl FromStr for Function {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Function::all()
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidGraph(format!("Unknown node function: {}", s)))
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One field of a node key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyField {
    Text(String),
    Int(i64),
    Seq(Vec<KeyField>),
}

impl fmt::Display for KeyField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyField::Text(s) => f.write_str(&quote(s)),
            KeyField::Int(i) => write!(f, "{}", i),
            KeyField::Seq(fields) => write_tuple(f, fields),
        }
    }
}

impl From<&str> for KeyField {
    fn from(s: &str) -> Self {
        KeyField::Text(s.to_string())
    }
}

impl From<String> for KeyField {
    fn from(s: String) -> Self {
        KeyField::Text(s)
    }
}

impl From<i64> for KeyField {
    fn from(i: i64) -> Self {
        KeyField::Int(i)
    }
}

fn write_tuple(f: &mut fmt::Formatter<'_>, fields: &[KeyField]) -> fmt::Result {
    f.write_str("(")?;
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", field)?;
    }
    if fields.len() == 1 {
        f.write_str(",")?;
    }
    f.write_str(")")
}

/// Order-stable composite identity of a node.
///
/// The `Display` form is the canonical string that gets fingerprinted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeKey(pub Vec<KeyField>);

impl NodeKey {
    pub fn new(fields: Vec<KeyField>) -> Self {
        Self(fields)
    }

    /// Build a key made only of text fields
    pub fn from_texts<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(fields.into_iter().map(|s| KeyField::Text(s.into())).collect())
    }

    pub fn fields(&self) -> &[KeyField] {
        &self.0
    }

    /// Serialize the field sequence as JSON, for reconstruction from storage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_tuple(f, &self.0)
    }
}

/// A reference to a controlled-vocabulary term: namespace keyword + name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermRef {
    pub namespace: String,
    pub name: String,
}

impl TermRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// A variant descriptor attached to a ProteinVariant node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Variant {
    /// Sequence variant, e.g. HGVS `p.Arg1Cys`
    Variant { hgvs: String },
    /// Post-translational protein modification
    ProteinModification {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amino_acid: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<i64>,
    },
}

impl Variant {
    pub fn sequence(hgvs: impl Into<String>) -> Self {
        Variant::Variant { hgvs: hgvs.into() }
    }

    pub fn modification(name: impl Into<String>) -> Self {
        Variant::ProteinModification {
            name: name.into(),
            namespace: None,
            amino_acid: None,
            position: None,
        }
    }

    /// Modification type label stored in the modifications table
    pub fn mod_type(&self) -> &'static str {
        match self {
            Variant::Variant { .. } => "Variant",
            Variant::ProteinModification { .. } => "ProteinModification",
        }
    }
}

/// Fusion description attached to a ProteinFusion node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fusion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_5p: Option<TermRef>,
    pub range_5p: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_3p: Option<TermRef>,
    pub range_3p: String,
}

/// Attributes of a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub function: Function,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variants: Vec<Variant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fusion: Option<Fusion>,
}

impl NodeData {
    /// Create a node without a namespace identifier
    pub fn new(function: Function) -> Self {
        Self {
            function,
            namespace: None,
            name: None,
            variants: Vec::new(),
            fusion: None,
        }
    }

    /// Create a node identified by a namespace term
    pub fn named(function: Function, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            name: Some(name.into()),
            ..Self::new(function)
        }
    }

    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    pub fn with_fusion(mut self, fusion: Fusion) -> Self {
        self.fusion = Some(fusion);
        self
    }

    /// The namespace term identifying this node, if it has one
    pub fn term(&self) -> Option<TermRef> {
        match (&self.namespace, &self.name) {
            (Some(ns), Some(name)) => Some(TermRef::new(ns.clone(), name.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_function_roundtrip() {
        for function in Function::all() {
            let parsed: Function = function.as_str().parse().unwrap();
            assert_eq!(*function, parsed);
        }
    }

    #[test]
    fn test_structural_functions() {
        assert!(Function::Complex.is_structural());
        assert!(Function::Reaction.is_structural());
        assert!(!Function::Protein.is_structural());
        assert!(!Function::ProteinFusion.is_structural());
    }

    #[test]
    fn test_key_rendering() {
        let key = NodeKey::from_texts(["Protein", "HGNC", "APP"]);
        assert_eq!(key.to_string(), "('Protein', 'HGNC', 'APP')");

        let nested = NodeKey::new(vec![
            KeyField::from("ProteinVariant"),
            KeyField::Seq(vec![KeyField::from("Protein"), KeyField::from("HGNC"), KeyField::from("AKT1")]),
            KeyField::Seq(vec![KeyField::from("ProteinModification"), KeyField::from("Ph"), KeyField::Int(308)]),
        ]);
        assert_eq!(
            nested.to_string(),
            "('ProteinVariant', ('Protein', 'HGNC', 'AKT1'), ('ProteinModification', 'Ph', 308))"
        );

        let single = NodeKey::new(vec![KeyField::Seq(vec![KeyField::from("x")])]);
        assert_eq!(single.to_string(), "(('x',),)");
    }

    #[test]
    fn test_key_json_roundtrip() {
        let key = NodeKey::new(vec![
            KeyField::from("Complex"),
            KeyField::Seq(vec![KeyField::from("Protein"), KeyField::Int(3)]),
        ]);
        let json = key.to_json().unwrap();
        assert_eq!(json, r#"["Complex",["Protein",3]]"#);
        assert_eq!(NodeKey::from_json(&json).unwrap(), key);
    }

    #[test]
    fn test_node_term() {
        let data = NodeData::named(Function::Protein, "HGNC", "APP");
        assert_eq!(data.term(), Some(TermRef::new("HGNC", "APP")));
        assert_eq!(NodeData::new(Function::Complex).term(), None);
    }
}
