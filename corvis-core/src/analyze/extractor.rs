// Error extraction: compare system entities with reference entities through
// spanning trees and collect the links that disagree.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use corvis_graphs::{EntityGraph, MentionKey, SpanningTreeAlgorithm, TreeEdge};
use tracing::{debug, info, instrument};

use crate::config::AnalysisSection;
use crate::error::AnalyzeError;
use crate::types::{group_by, Corpus, Document, Mention, Span};

use super::decisions::{CorpusAnalysis, Decision, DecisionSet, MentionSummary, SystemDecisions};

/// Extracts recall errors, precision errors and decisions of one or more
/// systems against a reference corpus.
#[derive(Debug, Clone)]
pub struct ErrorExtractor {
    reference: Arc<Corpus>,
    recall: SpanningTreeAlgorithm,
    precision: SpanningTreeAlgorithm,
    systems: BTreeMap<String, SystemDecisions>,
}

impl ErrorExtractor {
    pub fn new(
        reference: Arc<Corpus>,
        recall: SpanningTreeAlgorithm,
        precision: SpanningTreeAlgorithm,
    ) -> Result<Self, AnalyzeError> {
        if !recall.is_recall() {
            return Err(AnalyzeError::WrongRole {
                algorithm: recall.to_string(),
                role: "recall",
            });
        }
        if precision.is_recall() {
            return Err(AnalyzeError::WrongRole {
                algorithm: precision.to_string(),
                role: "precision",
            });
        }
        if let Some(repeated) = repeated_identifier(&reference) {
            return Err(AnalyzeError::DuplicateDocument(repeated.to_string()));
        }
        Ok(Self {
            reference,
            recall,
            precision,
            systems: BTreeMap::new(),
        })
    }

    /// Extractor using the strategies named in an `[analysis]` section.
    pub fn from_config(reference: Arc<Corpus>, analysis: &AnalysisSection) -> Result<Self, AnalyzeError> {
        Self::new(reference, analysis.recall_algorithm, analysis.precision_algorithm)
    }

    /// Compare `system` with the reference and record the result under the
    /// system's description. A repeated description gets a `-2`, `-3`, …
    /// suffix. Returns the label used.
    #[instrument(skip_all, fields(system = %system.description, documents = system.len()))]
    pub fn add_system(&mut self, system: Arc<Corpus>) -> Result<String, AnalyzeError> {
        let positions: HashMap<&str, usize> = self
            .reference
            .documents
            .iter()
            .enumerate()
            .map(|(i, d)| (d.identifier.as_str(), i))
            .collect();
        if let Some(stray) = system
            .documents
            .iter()
            .find(|d| !positions.contains_key(d.identifier.as_str()))
        {
            return Err(AnalyzeError::UnalignedDocument(stray.identifier.clone()));
        }
        if let Some(repeated) = repeated_identifier(&system) {
            return Err(AnalyzeError::DuplicateDocument(repeated.to_string()));
        }
        let system_docs: HashMap<&str, &Document> = system
            .documents
            .iter()
            .map(|d| (d.identifier.as_str(), d))
            .collect();

        let mut result = SystemDecisions {
            corpus: system.clone(),
            recall_errors: Vec::new(),
            precision_errors: Vec::new(),
            decisions: Vec::new(),
        };
        for (index, reference_doc) in self.reference.documents.iter().enumerate() {
            let system_mentions = system_docs
                .get(reference_doc.identifier.as_str())
                .map_or(&[][..], |d| d.system_mentions.as_slice());
            let pair = DocumentPair::new(index, reference_doc, system_mentions);
            result
                .recall_errors
                .extend(pair.recall_errors(self.recall));
            let (decisions, errors) = pair.precision_decisions(self.precision);
            result.decisions.extend(decisions);
            result.precision_errors.extend(errors);
        }

        let label = self.unique_label(&system.description);
        info!(
            label = %label,
            recall_errors = result.recall_errors.len(),
            precision_errors = result.precision_errors.len(),
            decisions = result.decisions.len(),
            "System compared"
        );
        self.systems.insert(label.clone(), result);
        Ok(label)
    }

    /// Decisions recorded so far, keyed by the reference corpus description.
    pub fn get_errors(&self) -> DecisionSet {
        let mut set = DecisionSet::new();
        set.insert(
            self.reference.description.clone(),
            CorpusAnalysis {
                reference: self.reference.clone(),
                recall_algorithm: self.recall,
                precision_algorithm: self.precision,
                systems: self.systems.clone(),
            },
        );
        set
    }

    fn unique_label(&self, description: &str) -> String {
        if !self.systems.contains_key(description) {
            return description.to_string();
        }
        (2..)
            .map(|n| format!("{description}-{n}"))
            .find(|candidate| !self.systems.contains_key(candidate))
            .unwrap_or_else(|| description.to_string())
    }
}

/// A reference document next to the matching system mentions.
struct DocumentPair<'a> {
    index: usize,
    identifier: &'a str,
    reference: &'a [Mention],
    system: &'a [Mention],
    reference_entity: HashMap<Span, u32>,
    system_entity: HashMap<Span, u32>,
}

impl<'a> DocumentPair<'a> {
    fn new(index: usize, reference_doc: &'a Document, system: &'a [Mention]) -> Self {
        let reference = reference_doc.annotated_mentions.as_slice();
        Self {
            index,
            identifier: &reference_doc.identifier,
            reference,
            system,
            reference_entity: reference
                .iter()
                .filter_map(|m| m.annotated_set_id.map(|id| (m.span, id)))
                .collect(),
            system_entity: system
                .iter()
                .filter_map(|m| m.set_id.map(|id| (m.span, id)))
                .collect(),
        }
    }

    fn recall_errors(&self, algorithm: SpanningTreeAlgorithm) -> Vec<Decision> {
        let entities = group_by(self.reference, |m| m.annotated_set_id);
        let mut errors = Vec::new();
        for mentions in entities.values() {
            let edges = self.tree(mentions, algorithm, &self.system_entity);
            errors.extend(
                edges
                    .into_iter()
                    .filter(|edge| !same_entity(&self.system_entity, edge))
                    .filter_map(|edge| self.decision(self.reference, edge)),
            );
        }
        debug!(document = self.identifier, errors = errors.len(), "Recall errors");
        errors
    }

    /// All precision-tree edges, and the subset that crosses reference entities.
    fn precision_decisions(&self, algorithm: SpanningTreeAlgorithm) -> (Vec<Decision>, Vec<Decision>) {
        let entities = group_by(self.system, |m| m.set_id);
        let mut decisions = Vec::new();
        let mut errors = Vec::new();
        for mentions in entities.values() {
            for edge in self.tree(mentions, algorithm, &self.reference_entity) {
                let Some(decision) = self.decision(self.system, edge) else {
                    continue;
                };
                if !same_entity(&self.reference_entity, &edge) {
                    errors.push(decision.clone());
                }
                decisions.push(decision);
            }
        }
        debug!(
            document = self.identifier,
            decisions = decisions.len(),
            errors = errors.len(),
            "Precision decisions"
        );
        (decisions, errors)
    }

    fn tree(
        &self,
        mentions: &[&Mention],
        algorithm: SpanningTreeAlgorithm,
        other: &HashMap<Span, u32>,
    ) -> Vec<TreeEdge> {
        let entity = EntityGraph::from_mentions(mentions.iter().map(|m| m.node(self.index)));
        let partitioned = entity.partition(|key| other.get(&key.span).copied());
        algorithm.spanning_tree(&entity, &partitioned)
    }

    fn decision(&self, mentions: &[Mention], (anaphor, antecedent): TreeEdge) -> Option<Decision> {
        let find = |key: MentionKey| mentions.iter().find(|m| m.span == key.span);
        Some(Decision {
            document: self.identifier.to_string(),
            anaphor: MentionSummary::from(find(anaphor)?),
            antecedent: MentionSummary::from(find(antecedent)?),
        })
    }
}

/// Documents are aligned by identifier, so each may appear only once.
fn repeated_identifier(corpus: &Corpus) -> Option<&str> {
    let mut seen = HashSet::new();
    corpus
        .documents
        .iter()
        .map(|d| d.identifier.as_str())
        .find(|id| !seen.insert(*id))
}

fn same_entity(entity_of: &HashMap<Span, u32>, (anaphor, antecedent): &TreeEdge) -> bool {
    match (entity_of.get(&anaphor.span), entity_of.get(&antecedent.span)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MentionType, Token};

    fn mention(begin: usize, end: usize, mention_type: MentionType, words: &str) -> Mention {
        let tokens: Vec<String> = words.split(' ').map(str::to_string).collect();
        Mention {
            span: Span::new(begin, end),
            head: vec![tokens.last().cloned().unwrap_or_default()],
            tokens,
            mention_type,
            sentence: 0,
            annotated_set_id: None,
            set_id: None,
            antecedent: None,
        }
    }

    fn gold(m: Mention, id: u32) -> Mention {
        Mention {
            annotated_set_id: Some(id),
            ..m
        }
    }

    fn system(m: Mention, id: u32, antecedent: Option<Span>) -> Mention {
        Mention {
            set_id: Some(id),
            antecedent,
            ..m
        }
    }

    /// "Obama met Putin . He said the president ..." with the system
    /// merging "Putin" into the Obama chain and splitting off "the president".
    fn corpora() -> (Arc<Corpus>, Arc<Corpus>) {
        let words = ["Obama", "met", "Putin", ".", "He", "said", "the", "president", "left"];
        let obama = mention(0, 0, MentionType::Nam, "Obama");
        let putin = mention(2, 2, MentionType::Nam, "Putin");
        let he = mention(4, 4, MentionType::Pro, "He");
        let president = mention(6, 7, MentionType::Nom, "the president");

        let mut reference = Document::new("doc1");
        reference.tokens = words.iter().map(|w| Token::bare(*w)).collect();
        reference.annotated_mentions = vec![
            gold(obama.clone(), 1),
            gold(putin.clone(), 2),
            gold(he.clone(), 1),
            gold(president.clone(), 1),
        ];

        let mut output = reference.clone();
        output.annotated_mentions.clear();
        output.system_mentions = vec![
            system(obama, 10, None),
            system(putin, 10, Some(Span::new(0, 0))),
            system(he, 10, Some(Span::new(2, 2))),
            system(president, 11, None),
        ];

        (
            Arc::new(Corpus::new("gold", vec![reference])),
            Arc::new(Corpus::new("run", vec![output])),
        )
    }

    fn extractor(reference: Arc<Corpus>) -> ErrorExtractor {
        ErrorExtractor::new(
            reference,
            SpanningTreeAlgorithm::RecallAccessibility,
            SpanningTreeAlgorithm::PrecisionSystemOutput,
        )
        .unwrap()
    }

    fn texts(decisions: &[Decision]) -> Vec<(String, String)> {
        decisions
            .iter()
            .map(|d| (d.anaphor.text.clone(), d.antecedent.text.clone()))
            .collect()
    }

    #[test]
    fn finds_recall_and_precision_errors() {
        let (reference, output) = corpora();
        let mut extractor = extractor(reference);
        let label = extractor.add_system(output).unwrap();
        assert_eq!(label, "run");

        let set = extractor.get_errors();
        let run = &set.get("gold").unwrap().systems["run"];

        // "He" links to "Obama" inside the system entity; "the president"
        // is alone in its system entity and falls back to the nearest name.
        assert_eq!(
            texts(&run.recall_errors),
            vec![("the president".to_string(), "Obama".to_string())]
        );
        assert_eq!(
            texts(&run.decisions),
            vec![
                ("Putin".to_string(), "Obama".to_string()),
                ("He".to_string(), "Putin".to_string()),
            ]
        );
        assert_eq!(texts(&run.precision_errors), texts(&run.decisions));
    }

    #[test]
    fn self_comparison_has_no_errors() {
        let (reference, _) = corpora();
        let mut mirrored = (*reference).clone();
        for doc in &mut mirrored.documents {
            doc.mirror_reference_as_system();
        }
        let corpus = Arc::new(mirrored);

        let mut extractor = extractor(corpus.clone());
        extractor.add_system(corpus.clone()).unwrap();
        let set = extractor.get_errors();
        let analysis = set.get("gold").unwrap();
        let decisions = &analysis.systems["gold"];

        assert!(Arc::ptr_eq(&analysis.reference, &corpus));
        assert!(Arc::ptr_eq(&decisions.corpus, &corpus));
        assert!(decisions.recall_errors.is_empty());
        assert!(decisions.precision_errors.is_empty());
    }

    #[test]
    fn repeated_systems_get_suffixes() {
        let (reference, output) = corpora();
        let mut extractor = extractor(reference);
        assert_eq!(extractor.add_system(output.clone()).unwrap(), "run");
        assert_eq!(extractor.add_system(output.clone()).unwrap(), "run-2");
        assert_eq!(extractor.add_system(output).unwrap(), "run-3");
        assert_eq!(extractor.get_errors().get("gold").unwrap().systems.len(), 3);
    }

    #[test]
    fn unaligned_documents_are_rejected() {
        let (reference, output) = corpora();
        let mut stray = (*output).clone();
        stray.documents[0].identifier = "elsewhere".to_string();
        let err = extractor(reference).add_system(Arc::new(stray)).unwrap_err();
        assert!(matches!(err, AnalyzeError::UnalignedDocument(id) if id == "elsewhere"));
    }

    #[test]
    fn missing_system_document_counts_every_link_as_recall_error() {
        let (reference, _) = corpora();
        let empty = Arc::new(Corpus::new("empty", Vec::new()));
        let mut extractor = extractor(reference);
        extractor.add_system(empty).unwrap();
        let set = extractor.get_errors();
        let run = &set.get("gold").unwrap().systems["empty"];
        assert_eq!(run.recall_errors.len(), 2);
        assert!(run.decisions.is_empty());
    }

    #[test]
    fn repeated_document_identifiers_are_rejected() {
        let (reference, output) = corpora();
        let mut doubled = (*output).clone();
        doubled.documents.push(doubled.documents[0].clone());
        let err = extractor(reference.clone())
            .add_system(Arc::new(doubled))
            .unwrap_err();
        assert!(matches!(err, AnalyzeError::DuplicateDocument(id) if id == "doc1"));

        let mut doubled = (*reference).clone();
        doubled.documents.push(doubled.documents[0].clone());
        let err = ErrorExtractor::new(
            Arc::new(doubled),
            SpanningTreeAlgorithm::RecallAccessibility,
            SpanningTreeAlgorithm::PrecisionSystemOutput,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzeError::DuplicateDocument(_)));
    }

    #[test]
    fn configured_strategies_are_used() {
        let (reference, output) = corpora();
        let analysis: AnalysisSection = toml::from_str(
            "recall_algorithm = \"recall_closest\"\nprecision_algorithm = \"precision_improved_accessibility\"\n",
        )
        .unwrap();
        let mut extractor = ErrorExtractor::from_config(reference, &analysis).unwrap();
        extractor.add_system(output).unwrap();

        let set = extractor.get_errors();
        let analysis = set.get("gold").unwrap();
        assert_eq!(analysis.recall_algorithm, SpanningTreeAlgorithm::RecallClosest);
        assert_eq!(
            analysis.precision_algorithm,
            SpanningTreeAlgorithm::PrecisionImprovedAccessibility
        );
        // Closest links "the president" to "He" instead of the nearest name.
        assert_eq!(
            texts(&analysis.systems["run"].recall_errors),
            vec![("the president".to_string(), "He".to_string())]
        );
    }

    #[test]
    fn algorithms_must_match_roles() {
        let (reference, _) = corpora();
        let err = ErrorExtractor::new(
            reference.clone(),
            SpanningTreeAlgorithm::PrecisionScores,
            SpanningTreeAlgorithm::PrecisionSystemOutput,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzeError::WrongRole { role: "recall", .. }));

        let err = ErrorExtractor::new(
            reference,
            SpanningTreeAlgorithm::RecallClosest,
            SpanningTreeAlgorithm::RecallScores,
        )
        .unwrap_err();
        assert!(matches!(err, AnalyzeError::WrongRole { role: "precision", .. }));
    }
}
