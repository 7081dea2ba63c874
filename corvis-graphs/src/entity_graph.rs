// Entity graphs: one graph per entity, every mention linked to all of its
// preceding mentions in that entity.
//
// Spanning-tree algorithms pick one outgoing edge per mention from these
// graphs. A partitioned graph keeps only the edges that stay inside a block
// of some other clustering (system entities for recall, reference entities
// for precision).

use std::collections::{BTreeMap, HashMap};

use crate::{GraphError, MentionKey, MentionNode, Result};

/// A complete backward-linked graph over the mentions of one entity.
#[derive(Debug, Clone, Default)]
pub struct EntityGraph {
    nodes: BTreeMap<MentionKey, MentionNode>,
    /// Anaphor → preceding candidates, ascending by position.
    edges: BTreeMap<MentionKey, Vec<MentionKey>>,
    edge_scores: HashMap<(MentionKey, MentionKey), f64>,
}

impl EntityGraph {
    /// Build the graph for one entity. Duplicate keys are collapsed to the
    /// first occurrence.
    pub fn from_mentions(mentions: impl IntoIterator<Item = MentionNode>) -> Self {
        let mut nodes = BTreeMap::new();
        for mention in mentions {
            nodes.entry(mention.key).or_insert(mention);
        }

        let keys: Vec<MentionKey> = nodes.keys().copied().collect();
        let edges = keys
            .iter()
            .enumerate()
            .map(|(i, key)| (*key, keys[..i].to_vec()))
            .collect();

        Self {
            nodes,
            edges,
            edge_scores: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Mentions that have an edge list in this graph, in text order.
    pub fn anaphors(&self) -> impl Iterator<Item = &MentionKey> {
        self.edges.keys()
    }

    pub fn contains(&self, key: &MentionKey) -> bool {
        self.edges.contains_key(key)
    }

    /// Candidate antecedents of `key`, ascending by position.
    pub fn antecedents(&self, key: &MentionKey) -> &[MentionKey] {
        self.edges.get(key).map_or(&[], Vec::as_slice)
    }

    pub fn node(&self, key: &MentionKey) -> Option<&MentionNode> {
        self.nodes.get(key)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &MentionNode> {
        self.nodes.values()
    }

    /// Attach a pairwise score to an existing edge.
    pub fn set_score(&mut self, anaphor: MentionKey, antecedent: MentionKey, score: f64) -> Result<()> {
        if antecedent >= anaphor {
            return Err(GraphError::MisorderedEdge {
                anaphor: anaphor.to_string(),
                antecedent: antecedent.to_string(),
            });
        }
        self.edge_scores.insert((anaphor, antecedent), score);
        Ok(())
    }

    /// Score of an edge; unscored edges count as 0.0.
    pub fn score(&self, anaphor: &MentionKey, antecedent: &MentionKey) -> f64 {
        self.edge_scores
            .get(&(*anaphor, *antecedent))
            .copied()
            .unwrap_or(0.0)
    }

    /// Restrict the graph to edges whose endpoints share a block under
    /// `block_of`. Mentions without a block are singletons. Mentions left
    /// without any edge are dropped from the edge map, so `contains` answers
    /// "has an antecedent inside its block".
    pub fn partition<F>(&self, block_of: F) -> Self
    where
        F: Fn(&MentionKey) -> Option<u32>,
    {
        let mut edges = BTreeMap::new();
        let mut edge_scores = HashMap::new();

        for (anaphor, candidates) in &self.edges {
            let Some(block) = block_of(anaphor) else {
                continue;
            };
            let kept: Vec<MentionKey> = candidates
                .iter()
                .filter(|c| block_of(c) == Some(block))
                .copied()
                .collect();
            if kept.is_empty() {
                continue;
            }
            for antecedent in &kept {
                if let Some(score) = self.edge_scores.get(&(*anaphor, *antecedent)) {
                    edge_scores.insert((*anaphor, *antecedent), *score);
                }
            }
            edges.insert(*anaphor, kept);
        }

        Self {
            nodes: self.nodes.clone(),
            edges,
            edge_scores,
        }
    }
}
