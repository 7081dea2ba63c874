// JSON renderer: produces `decisions.json`, the decision set of one
// reference corpus in a machine-readable form.

use std::collections::BTreeMap;

use corvis_graphs::SpanningTreeAlgorithm;
use serde::Serialize;
use tracing::{info, instrument};

use crate::analyze::{DecisionSet, SystemDecisions, SystemSummary};
use crate::error::RenderError;

use super::traits::{Renderer, VisualizationData};

#[derive(Debug)]
pub struct JsonRenderer;

#[derive(Serialize)]
struct DecisionReport<'a> {
    corpus: &'a str,
    generated_at: String,
    for_raw_input: bool,
    recall_algorithm: SpanningTreeAlgorithm,
    precision_algorithm: SpanningTreeAlgorithm,
    summary: Vec<SystemSummary>,
    systems: &'a BTreeMap<String, SystemDecisions>,
}

#[async_trait::async_trait]
impl Renderer for JsonRenderer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn output_path(&self) -> &'static str {
        "decisions.json"
    }

    #[instrument(skip_all, name = "json_render")]
    async fn render(&self, data: &VisualizationData<'_>) -> crate::error::Result<String> {
        let mut single = DecisionSet::new();
        single.insert(data.label, data.analysis.clone());

        let report = DecisionReport {
            corpus: data.label,
            generated_at: data.generated_at.to_rfc3339(),
            for_raw_input: data.for_raw_input,
            recall_algorithm: data.analysis.recall_algorithm,
            precision_algorithm: data.analysis.precision_algorithm,
            summary: single.summary(),
            systems: &data.analysis.systems,
        };
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| RenderError::Template(e.to_string()))?;
        info!(bytes = out.len(), "Decision report rendered");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use crate::analyze::{CorpusAnalysis, Decision, MentionSummary};
    use crate::types::{Corpus, MentionType, Span};

    fn analysis() -> CorpusAnalysis {
        let corpus = Arc::new(Corpus::new("corpus", Vec::new()));
        let summary = |begin: usize, text: &str, mention_type| MentionSummary {
            span: Span::new(begin, begin),
            text: text.to_string(),
            mention_type,
            sentence: 0,
        };
        let decision = Decision {
            document: "doc1.txt".to_string(),
            anaphor: summary(5, "He", MentionType::Pro),
            antecedent: summary(0, "Obama", MentionType::Nam),
        };
        CorpusAnalysis {
            reference: corpus.clone(),
            recall_algorithm: SpanningTreeAlgorithm::RecallAccessibility,
            precision_algorithm: SpanningTreeAlgorithm::PrecisionSystemOutput,
            systems: BTreeMap::from([(
                "corpus".to_string(),
                SystemDecisions {
                    corpus,
                    recall_errors: Vec::new(),
                    precision_errors: Vec::new(),
                    decisions: vec![decision],
                },
            )]),
        }
    }

    #[tokio::test]
    async fn renders_summary_and_decisions() {
        let analysis = analysis();
        let data = VisualizationData {
            label: "corpus",
            analysis: &analysis,
            for_raw_input: true,
            generated_at: Utc::now(),
        };
        let out = JsonRenderer.render(&data).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["corpus"], "corpus");
        assert_eq!(value["for_raw_input"], true);
        assert_eq!(value["precision_algorithm"], "precision_system_output");
        assert_eq!(value["summary"][0]["totals"]["decisions"], 1);
        assert_eq!(value["summary"][0]["by_type"]["PRO"]["decisions"], 1);
        let decision = &value["systems"]["corpus"]["decisions"][0];
        assert_eq!(decision["anaphor"]["text"], "He");
        assert_eq!(decision["antecedent"]["span"]["begin"], 0);
    }
}
