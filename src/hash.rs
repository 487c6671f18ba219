//! Content fingerprints
//!
//! Every deduplicated entity is addressed by a BLAKE3 digest of a canonical
//! string. Node keys and edge quadruples are rendered as tuples:
//!
//! - `('Protein', 'HGNC', 'APP')`
//! - `(1, 2, 'increases', None)`
//!
//! Evidence text is hashed as-is. No case or whitespace normalization is
//! applied; canonicalization happens upstream.

use crate::node::NodeKey;
use std::fmt;

/// Length of a fingerprint in hex characters
pub const FINGERPRINT_HEX_LEN: usize = 64;

/// A stable content hash, rendered as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Hash raw bytes
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    /// Fingerprint of a node key's canonical field sequence
    pub fn of_node(key: &NodeKey) -> Self {
        Self::of_bytes(key.to_string().as_bytes())
    }

    /// Fingerprint of an evidence string
    pub fn of_evidence(text: &str) -> Self {
        Self::of_bytes(text.as_bytes())
    }

    /// Fingerprint of an edge quadruple. A missing evidence id renders as
    /// `None`, so unsupported duplicates of a triple collapse together.
    pub fn of_edge(subject_id: i64, object_id: i64, relation: &str, evidence_id: Option<i64>) -> Self {
        let evidence = evidence_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "None".to_string());
        let canonical = format!(
            "({}, {}, {}, {})",
            subject_id,
            object_id,
            quote(relation),
            evidence
        );
        Self::of_bytes(canonical.as_bytes())
    }

    /// Wrap a hex digest read back from storage
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Render a string as a single-quoted tuple element.
///
/// Backslashes and single quotes are escaped, which keeps the rendering
/// injective.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(c),
        }
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKey;

    #[test]
    fn test_fingerprint_is_stable() {
        let key = NodeKey::from_texts(["Protein", "HGNC", "APP"]);
        let a = Fingerprint::of_node(&key);
        let b = Fingerprint::of_node(&key.clone());
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), FINGERPRINT_HEX_LEN);
        assert_eq!(a, Fingerprint::of_bytes(b"('Protein', 'HGNC', 'APP')"));
    }

    #[test]
    fn test_distinct_nodes_do_not_collide() {
        let keys = [
            NodeKey::from_texts(["Protein", "HGNC", "APP"]),
            NodeKey::from_texts(["Gene", "HGNC", "APP"]),
            NodeKey::from_texts(["Protein", "MGI", "APP"]),
            NodeKey::from_texts(["Protein", "HGNC", "app"]),
            NodeKey::from_texts(["Protein", "HGNC", "APP "]),
        ];
        let prints: std::collections::HashSet<_> = keys.iter().map(Fingerprint::of_node).collect();
        assert_eq!(prints.len(), keys.len());
    }

    #[test]
    fn test_edge_fingerprint_includes_evidence() {
        let none = Fingerprint::of_edge(1, 2, "increases", None);
        let with = Fingerprint::of_edge(1, 2, "increases", Some(7));
        let other = Fingerprint::of_edge(1, 2, "increases", Some(8));
        assert_ne!(none, with);
        assert_ne!(with, other);
        assert_eq!(none, Fingerprint::of_edge(1, 2, "increases", None));
        assert_eq!(none, Fingerprint::of_bytes(b"(1, 2, 'increases', None)"));
    }

    #[test]
    fn test_evidence_is_not_normalized() {
        assert_ne!(Fingerprint::of_evidence("E1"), Fingerprint::of_evidence("e1"));
        assert_ne!(Fingerprint::of_evidence("E1"), Fingerprint::of_evidence(" E1"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("a'b"), r"'a\'b'");
        assert_eq!(quote(r"a\b"), r"'a\\b'");
    }
}
