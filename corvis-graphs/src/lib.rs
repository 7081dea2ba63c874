pub mod entity_graph;
pub mod spanning_tree;

use serde::{Deserialize, Serialize};

pub use entity_graph::EntityGraph;
pub use spanning_tree::{SpanningTreeAlgorithm, TreeEdge};

/// Error type for the graph engine.
#[derive(thiserror::Error, Debug)]
pub enum GraphError {
    #[error("Unknown spanning tree algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Unknown mention type: {0}")]
    UnknownMentionType(String),

    #[error("Antecedent {antecedent} does not precede anaphor {anaphor}")]
    MisorderedEdge { anaphor: String, antecedent: String },
}

pub type Result<T> = std::result::Result<T, GraphError>;

// ── Span type ──────────────────────────────────────────────────────

/// Inclusive token range inside a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub begin: usize,
    pub end: usize,
}

impl Span {
    pub fn new(begin: usize, end: usize) -> Self {
        Self { begin, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.begin) + 1
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.begin
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.begin, self.end)
    }
}

// ── Mention type ───────────────────────────────────────────────────

/// Coarse mention type used to pick antecedents by accessibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MentionType {
    /// Proper name.
    Nam,
    /// Common noun phrase.
    Nom,
    /// Pronoun.
    Pro,
    /// Demonstrative pronoun.
    Dem,
    /// Verb (event mention).
    Vrb,
}

impl MentionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nam => "NAM",
            Self::Nom => "NOM",
            Self::Pro => "PRO",
            Self::Dem => "DEM",
            Self::Vrb => "VRB",
        }
    }

    /// Pronouns and demonstratives always attach to the closest candidate.
    pub fn is_pronominal(&self) -> bool {
        matches!(self, Self::Pro | Self::Dem)
    }
}

impl std::fmt::Display for MentionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MentionType {
    type Err = GraphError;

    /// Accepts the short labels and CoreNLP's long labels.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NAM" | "PROPER" => Ok(Self::Nam),
            "NOM" | "NOMINAL" | "LIST" => Ok(Self::Nom),
            "PRO" | "PRONOMINAL" => Ok(Self::Pro),
            "DEM" | "DEMONSTRATIVE" => Ok(Self::Dem),
            "VRB" | "VERB" => Ok(Self::Vrb),
            _ => Err(GraphError::UnknownMentionType(s.to_string())),
        }
    }
}

// ── Mention keys and nodes ─────────────────────────────────────────

/// Identifies a mention in a corpus. Orders by position in the text, so the
/// largest key among candidates is the closest one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MentionKey {
    pub document: usize,
    pub span: Span,
}

impl MentionKey {
    pub fn new(document: usize, span: Span) -> Self {
        Self { document, span }
    }
}

impl std::fmt::Display for MentionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.document, self.span)
    }
}

/// The mention attributes spanning-tree algorithms look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MentionNode {
    pub key: MentionKey,
    pub mention_type: MentionType,
    /// Lowercased surface string, tokens joined by single spaces.
    pub tokens_lower: String,
    /// Lowercased head string.
    pub head_lower: String,
    /// Antecedents chosen by a coreference system, if any.
    #[serde(default)]
    pub antecedents: Vec<MentionKey>,
}

impl MentionNode {
    pub fn new(key: MentionKey, mention_type: MentionType) -> Self {
        Self {
            key,
            mention_type,
            tokens_lower: String::new(),
            head_lower: String::new(),
            antecedents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_strings(mut self, tokens: &str, head: &str) -> Self {
        self.tokens_lower = tokens.to_lowercase();
        self.head_lower = head.to_lowercase();
        self
    }

    #[must_use]
    pub fn with_antecedent(mut self, antecedent: MentionKey) -> Self {
        self.antecedents.push(antecedent);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_type_parses_corenlp_labels() {
        assert_eq!("PROPER".parse::<MentionType>().unwrap(), MentionType::Nam);
        assert_eq!("NOMINAL".parse::<MentionType>().unwrap(), MentionType::Nom);
        assert_eq!("LIST".parse::<MentionType>().unwrap(), MentionType::Nom);
        assert_eq!(
            "PRONOMINAL".parse::<MentionType>().unwrap(),
            MentionType::Pro
        );
        assert_eq!("dem".parse::<MentionType>().unwrap(), MentionType::Dem);
        assert!("ADJ".parse::<MentionType>().is_err());
    }

    #[test]
    fn mention_type_serializes_as_short_label() {
        let json = serde_json::to_string(&MentionType::Nam).unwrap();
        assert_eq!(json, "\"NAM\"");
        assert_eq!(MentionType::Dem.to_string(), "DEM");
    }

    #[test]
    fn keys_order_by_document_then_span() {
        let a = MentionKey::new(0, Span::new(3, 4));
        let b = MentionKey::new(0, Span::new(3, 6));
        let c = MentionKey::new(0, Span::new(5, 5));
        let d = MentionKey::new(1, Span::new(0, 0));
        let mut keys = vec![d, c, b, a];
        keys.sort();
        assert_eq!(keys, vec![a, b, c, d]);
    }

    #[test]
    fn span_len_and_display() {
        let outer = Span::new(2, 6);
        assert_eq!(outer.len(), 5);
        assert_eq!(outer.to_string(), "(2, 6)");
    }
}
