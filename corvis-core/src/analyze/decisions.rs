use std::collections::BTreeMap;
use std::sync::Arc;

use corvis_graphs::SpanningTreeAlgorithm;
use serde::Serialize;

use crate::types::{Corpus, Mention, MentionType, Span};

// ── Decisions ────────────────────────────────────────────────────────

/// What a reader needs to see of a mention in an error list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionSummary {
    pub span: Span,
    pub text: String,
    pub mention_type: MentionType,
    pub sentence: usize,
}

impl From<&Mention> for MentionSummary {
    fn from(mention: &Mention) -> Self {
        Self {
            span: mention.span,
            text: mention.text(),
            mention_type: mention.mention_type,
            sentence: mention.sentence,
        }
    }
}

/// One spanning-tree edge: `anaphor` was linked to `antecedent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    /// Identifier of the document both mentions live in.
    pub document: String,
    pub anaphor: MentionSummary,
    pub antecedent: MentionSummary,
}

/// Errors and decisions of one system against one reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemDecisions {
    /// The system output the decisions were extracted from.
    #[serde(skip)]
    pub corpus: Arc<Corpus>,
    /// Reference links the system failed to make.
    pub recall_errors: Vec<Decision>,
    /// System links that join different reference entities.
    pub precision_errors: Vec<Decision>,
    /// Every edge of the system's precision spanning trees.
    pub decisions: Vec<Decision>,
}

/// All systems compared against one reference corpus.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusAnalysis {
    #[serde(skip)]
    pub reference: Arc<Corpus>,
    pub recall_algorithm: SpanningTreeAlgorithm,
    pub precision_algorithm: SpanningTreeAlgorithm,
    /// Keyed by system label.
    pub systems: BTreeMap<String, SystemDecisions>,
}

/// Reference label → system label → decisions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DecisionSet {
    analyses: BTreeMap<String, CorpusAnalysis>,
}

impl DecisionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, analysis: CorpusAnalysis) {
        self.analyses.insert(label.into(), analysis);
    }

    pub fn get(&self, label: &str) -> Option<&CorpusAnalysis> {
        self.analyses.get(label)
    }

    pub fn is_empty(&self) -> bool {
        self.analyses.is_empty()
    }

    pub fn decision_count(&self) -> usize {
        self.analyses
            .values()
            .flat_map(|a| a.systems.values())
            .map(|s| s.decisions.len())
            .sum()
    }

    /// Counts per reference/system pair, broken down by anaphor type.
    pub fn summary(&self) -> Vec<SystemSummary> {
        let mut rows = Vec::new();
        for (reference, analysis) in &self.analyses {
            for (system, decisions) in &analysis.systems {
                let mut by_type: BTreeMap<MentionType, TypeCounts> = BTreeMap::new();
                for d in &decisions.recall_errors {
                    by_type.entry(d.anaphor.mention_type).or_default().recall_errors += 1;
                }
                for d in &decisions.precision_errors {
                    by_type.entry(d.anaphor.mention_type).or_default().precision_errors += 1;
                }
                for d in &decisions.decisions {
                    by_type.entry(d.anaphor.mention_type).or_default().decisions += 1;
                }
                rows.push(SystemSummary {
                    reference: reference.clone(),
                    system: system.clone(),
                    totals: TypeCounts {
                        recall_errors: decisions.recall_errors.len(),
                        precision_errors: decisions.precision_errors.len(),
                        decisions: decisions.decisions.len(),
                    },
                    by_type,
                });
            }
        }
        rows
    }
}

// ── Summaries ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeCounts {
    pub recall_errors: usize,
    pub precision_errors: usize,
    pub decisions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SystemSummary {
    pub reference: String,
    pub system: String,
    pub totals: TypeCounts,
    pub by_type: BTreeMap<MentionType, TypeCounts>,
}
