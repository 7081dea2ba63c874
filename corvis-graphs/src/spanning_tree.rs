// Spanning-tree construction over entity graphs.
//
// Every non-initial mention of an entity contributes exactly one edge
// (anaphor, antecedent). Recall algorithms run over reference entities and
// are partitioned by system entities; precision algorithms run over system
// entities and are partitioned by reference entities.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity_graph::EntityGraph;
use crate::{GraphError, MentionKey, MentionNode, MentionType};

/// An `(anaphor, antecedent)` pair; the antecedent precedes the anaphor.
pub type TreeEdge = (MentionKey, MentionKey);

/// Named strategies for choosing one antecedent per mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanningTreeAlgorithm {
    /// Edges given by the system's own antecedent decisions.
    PrecisionSystemOutput,
    /// Highest-scoring antecedent, closer wins ties.
    PrecisionScores,
    /// String match, then head match, then accessibility by type.
    PrecisionImprovedAccessibility,
    /// Highest score inside the partition, otherwise highest score overall.
    RecallScores,
    /// Closest inside the partition, otherwise closest overall.
    RecallClosest,
    /// Closest inside the partition, otherwise accessibility by type.
    RecallAccessibility,
    /// Closest inside the partition, otherwise match then type.
    RecallImprovedAccessibility,
}

impl SpanningTreeAlgorithm {
    pub const ALL: [Self; 7] = [
        Self::PrecisionSystemOutput,
        Self::PrecisionScores,
        Self::PrecisionImprovedAccessibility,
        Self::RecallScores,
        Self::RecallClosest,
        Self::RecallAccessibility,
        Self::RecallImprovedAccessibility,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PrecisionSystemOutput => "precision_system_output",
            Self::PrecisionScores => "precision_scores",
            Self::PrecisionImprovedAccessibility => "precision_improved_accessibility",
            Self::RecallScores => "recall_scores",
            Self::RecallClosest => "recall_closest",
            Self::RecallAccessibility => "recall_accessibility",
            Self::RecallImprovedAccessibility => "recall_improved_accessibility",
        }
    }

    pub fn is_recall(&self) -> bool {
        matches!(
            self,
            Self::RecallScores
                | Self::RecallClosest
                | Self::RecallAccessibility
                | Self::RecallImprovedAccessibility
        )
    }

    /// Compute the spanning tree of `entity`. `partitioned` is `entity`
    /// restricted to the blocks of the other clustering; precision
    /// algorithms ignore it. Edges come back sorted.
    pub fn spanning_tree(&self, entity: &EntityGraph, partitioned: &EntityGraph) -> Vec<TreeEdge> {
        let mut edges = match self {
            Self::PrecisionSystemOutput => precision_system_output(entity),
            Self::PrecisionScores => each_anaphor(entity, |anaphor, candidates| {
                best_scored(entity, anaphor, candidates)
            }),
            Self::PrecisionImprovedAccessibility => each_anaphor(entity, |anaphor, candidates| {
                by_match_and_type(entity, anaphor, candidates)
            }),
            Self::RecallScores => each_anaphor(entity, |anaphor, candidates| {
                if partitioned.contains(anaphor) {
                    best_scored(partitioned, anaphor, partitioned.antecedents(anaphor))
                } else {
                    best_scored(entity, anaphor, candidates)
                }
            }),
            Self::RecallClosest => recall_with(entity, partitioned, |_, candidates| {
                closest(candidates)
            }),
            Self::RecallAccessibility => recall_with(entity, partitioned, |anaphor, candidates| {
                by_type(entity, anaphor, candidates)
            }),
            Self::RecallImprovedAccessibility => {
                recall_with(entity, partitioned, |anaphor, candidates| {
                    by_match_and_type(entity, anaphor, candidates)
                })
            }
        };
        edges.sort();
        trace!(algorithm = self.name(), mentions = entity.len(), edges = edges.len(), "Spanning tree");
        edges
    }
}

impl std::fmt::Display for SpanningTreeAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for SpanningTreeAlgorithm {
    type Err = GraphError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::ALL
            .iter()
            .find(|a| a.name() == s.trim())
            .copied()
            .ok_or_else(|| GraphError::UnknownAlgorithm(s.to_string()))
    }
}

// ── Strategies ─────────────────────────────────────────────────────

fn precision_system_output(entity: &EntityGraph) -> Vec<TreeEdge> {
    let mut edges = Vec::new();
    for anaphor in entity.anaphors() {
        let Some(node) = entity.node(anaphor) else {
            continue;
        };
        let candidates = entity.antecedents(anaphor);
        for antecedent in &node.antecedents {
            if candidates.contains(antecedent) {
                edges.push((*anaphor, *antecedent));
            }
        }
    }
    edges
}

/// Apply `choose` to every mention that has at least one candidate.
fn each_anaphor<F>(entity: &EntityGraph, choose: F) -> Vec<TreeEdge>
where
    F: Fn(&MentionKey, &[MentionKey]) -> Option<MentionKey>,
{
    entity
        .anaphors()
        .filter_map(|anaphor| {
            let candidates = entity.antecedents(anaphor);
            if candidates.is_empty() {
                return None;
            }
            choose(anaphor, candidates).map(|antecedent| (*anaphor, antecedent))
        })
        .collect()
}

/// Like [`each_anaphor`], but a mention with an antecedent inside its
/// partition block takes the closest such antecedent first.
fn recall_with<F>(entity: &EntityGraph, partitioned: &EntityGraph, fallback: F) -> Vec<TreeEdge>
where
    F: Fn(&MentionKey, &[MentionKey]) -> Option<MentionKey>,
{
    each_anaphor(entity, |anaphor, candidates| {
        if partitioned.contains(anaphor) {
            closest(partitioned.antecedents(anaphor))
        } else {
            fallback(anaphor, candidates)
        }
    })
}

fn closest(candidates: &[MentionKey]) -> Option<MentionKey> {
    candidates.iter().max().copied()
}

fn best_scored(graph: &EntityGraph, anaphor: &MentionKey, candidates: &[MentionKey]) -> Option<MentionKey> {
    candidates
        .iter()
        .map(|c| (graph.score(anaphor, c), *c))
        .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)))
        .map(|(_, c)| c)
}

fn by_type(entity: &EntityGraph, anaphor: &MentionKey, candidates: &[MentionKey]) -> Option<MentionKey> {
    let nearest_first = nearest_first(candidates);
    let anaphor_node = entity.node(anaphor)?;
    if anaphor_node.mention_type.is_pronominal() {
        return nearest_first.first().copied();
    }
    by_mention_type(entity, &nearest_first).or_else(|| nearest_first.first().copied())
}

fn by_match_and_type(
    entity: &EntityGraph,
    anaphor: &MentionKey,
    candidates: &[MentionKey],
) -> Option<MentionKey> {
    let nearest_first = nearest_first(candidates);
    let anaphor_node = entity.node(anaphor)?;
    if anaphor_node.mention_type.is_pronominal() {
        return nearest_first.first().copied();
    }

    let find = |pred: &dyn Fn(&MentionNode) -> bool| {
        nearest_first
            .iter()
            .find(|c| entity.node(c).is_some_and(pred))
            .copied()
    };

    find(&|c: &MentionNode| c.tokens_lower == anaphor_node.tokens_lower)
        .or_else(|| find(&|c: &MentionNode| c.head_lower == anaphor_node.head_lower))
        .or_else(|| by_mention_type(entity, &nearest_first))
        .or_else(|| nearest_first.first().copied())
}

/// Closest proper name, else closest common noun.
fn by_mention_type(entity: &EntityGraph, nearest_first: &[MentionKey]) -> Option<MentionKey> {
    [MentionType::Nam, MentionType::Nom].iter().find_map(|wanted| {
        nearest_first
            .iter()
            .find(|c| entity.node(c).is_some_and(|n| n.mention_type == *wanted))
            .copied()
    })
}

fn nearest_first(candidates: &[MentionKey]) -> Vec<MentionKey> {
    let mut sorted = candidates.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted
}
