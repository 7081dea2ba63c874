use std::collections::BTreeMap;

use corvis_graphs::{MentionKey, MentionNode};
use serde::{Deserialize, Serialize};

pub use corvis_graphs::{MentionType, Span};

// ── Tokens ─────────────────────────────────────────────────────────

/// One token with the annotations the visualizer and CoNLL reader keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub pos: String,
    pub lemma: String,
    pub ner: String,
    pub speaker: String,
}

impl Token {
    /// A token with unknown annotations (`-`), as in CoNLL files.
    pub fn bare(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            pos: "-".to_string(),
            lemma: "-".to_string(),
            ner: "-".to_string(),
            speaker: "-".to_string(),
        }
    }
}

// ── Mentions ───────────────────────────────────────────────────────

/// A mention of an entity in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mention {
    pub span: Span,
    pub tokens: Vec<String>,
    pub head: Vec<String>,
    pub mention_type: MentionType,
    /// Index of the sentence containing the mention's first token.
    pub sentence: usize,
    /// Reference entity.
    pub annotated_set_id: Option<u32>,
    /// System entity.
    pub set_id: Option<u32>,
    /// Antecedent chosen by the system.
    pub antecedent: Option<Span>,
}

impl Mention {
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    pub fn head_text(&self) -> String {
        self.head.join(" ")
    }

    /// Graph node for this mention as the `document`-th document of a corpus.
    pub fn node(&self, document: usize) -> MentionNode {
        let mut node = MentionNode::new(MentionKey::new(document, self.span), self.mention_type)
            .with_strings(&self.text(), &self.head_text());
        if let Some(antecedent) = self.antecedent {
            node = node.with_antecedent(MentionKey::new(document, antecedent));
        }
        node
    }
}

// ── Documents ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub identifier: String,
    pub tokens: Vec<Token>,
    /// Inclusive token spans of the sentences, in order.
    pub sentence_spans: Vec<Span>,
    /// Mentions from the reference annotation.
    pub annotated_mentions: Vec<Mention>,
    /// Mentions produced by a coreference system.
    pub system_mentions: Vec<Mention>,
}

impl Document {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            tokens: Vec::new(),
            sentence_spans: Vec::new(),
            annotated_mentions: Vec::new(),
            system_mentions: Vec::new(),
        }
    }

    /// Surface text of a span; out-of-range tokens are skipped.
    pub fn span_text(&self, span: Span) -> String {
        self.tokens
            .iter()
            .skip(span.begin)
            .take(span.len())
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn sentence_of(&self, token: usize) -> Option<usize> {
        self.sentence_spans
            .iter()
            .position(|s| s.begin <= token && token <= s.end)
    }

    /// Reference entities: mentions grouped by `annotated_set_id`.
    pub fn reference_entities(&self) -> BTreeMap<u32, Vec<&Mention>> {
        group_by(&self.annotated_mentions, |m| m.annotated_set_id)
    }

    /// System entities: mentions grouped by `set_id`.
    pub fn system_entities(&self) -> BTreeMap<u32, Vec<&Mention>> {
        group_by(&self.system_mentions, |m| m.set_id)
    }

    /// Copy the reference mentions into the system slot, keeping their set
    /// ids, so a document can be compared against itself.
    pub fn mirror_reference_as_system(&mut self) {
        self.system_mentions = self
            .annotated_mentions
            .iter()
            .map(|m| Mention {
                set_id: m.annotated_set_id,
                ..m.clone()
            })
            .collect();
    }
}

pub(crate) fn group_by<F>(mentions: &[Mention], key: F) -> BTreeMap<u32, Vec<&Mention>>
where
    F: Fn(&Mention) -> Option<u32>,
{
    let mut groups: BTreeMap<u32, Vec<&Mention>> = BTreeMap::new();
    for mention in mentions {
        if let Some(id) = key(mention) {
            groups.entry(id).or_default().push(mention);
        }
    }
    for group in groups.values_mut() {
        group.sort_by_key(|m| m.span);
    }
    groups
}

// ── Corpora ────────────────────────────────────────────────────────

/// A labelled, ordered collection of documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corpus {
    pub description: String,
    pub documents: Vec<Document>,
}

impl Corpus {
    pub fn new(description: impl Into<String>, documents: Vec<Document>) -> Self {
        Self {
            description: description.into(),
            documents,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document(&self, identifier: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.identifier == identifier)
    }

    pub fn system_mention_count(&self) -> usize {
        self.documents.iter().map(|d| d.system_mentions.len()).sum()
    }
}
