use std::sync::Arc;

use corvis_core::analyze::{Decision, ErrorExtractor};
use corvis_core::render::Visualizer;
use corvis_core::types::{Corpus, MentionType};
use corvis_graphs::SpanningTreeAlgorithm;
use corvis_test::{REFERENCE_CONLL, SYSTEM_CONLL};

fn pairs(decisions: &[Decision]) -> Vec<(&str, &str)> {
    decisions
        .iter()
        .map(|d| (d.anaphor.text.as_str(), d.antecedent.text.as_str()))
        .collect()
}

fn corpus() -> Arc<Corpus> {
    Arc::new(Corpus::from_conll_pair("news", REFERENCE_CONLL, SYSTEM_CONLL).unwrap())
}

#[test]
fn system_errors_against_reference() {
    let corpus = corpus();
    let mut extractor = ErrorExtractor::new(
        corpus.clone(),
        SpanningTreeAlgorithm::RecallAccessibility,
        SpanningTreeAlgorithm::PrecisionSystemOutput,
    )
    .unwrap();
    extractor.add_system(corpus).unwrap();

    let set = extractor.get_errors();
    let run = &set.get("news").unwrap().systems["news"];
    assert_eq!(
        pairs(&run.recall_errors),
        vec![("He", "Obama"), ("the city", "Paris")]
    );
    assert_eq!(pairs(&run.decisions), vec![("He", "Michelle")]);
    assert_eq!(pairs(&run.precision_errors), vec![("He", "Michelle")]);

    let summary = set.summary();
    assert_eq!(summary[0].totals.recall_errors, 2);
    assert_eq!(summary[0].by_type[&MentionType::Pro].recall_errors, 1);
    assert_eq!(summary[0].by_type[&MentionType::Nom].recall_errors, 1);
}

#[test]
fn every_recall_strategy_finds_the_same_missing_links() {
    let corpus = corpus();
    for recall in SpanningTreeAlgorithm::ALL.into_iter().filter(|a| a.is_recall()) {
        let mut extractor = ErrorExtractor::new(
            corpus.clone(),
            recall,
            SpanningTreeAlgorithm::PrecisionSystemOutput,
        )
        .unwrap();
        extractor.add_system(corpus.clone()).unwrap();
        let set = extractor.get_errors();
        let run = &set.get("news").unwrap().systems["news"];
        assert_eq!(run.recall_errors.len(), 2, "{recall}");
    }
}

#[test]
fn reference_against_itself_is_clean() {
    let mut mirrored = Corpus::from_conll("news", REFERENCE_CONLL).unwrap();
    for document in &mut mirrored.documents {
        document.mirror_reference_as_system();
    }
    let corpus = Arc::new(mirrored);
    let mut extractor = ErrorExtractor::new(
        corpus.clone(),
        SpanningTreeAlgorithm::RecallImprovedAccessibility,
        SpanningTreeAlgorithm::PrecisionImprovedAccessibility,
    )
    .unwrap();
    extractor.add_system(corpus).unwrap();
    let set = extractor.get_errors();
    let run = &set.get("news").unwrap().systems["news"];
    assert!(run.recall_errors.is_empty());
    assert!(run.precision_errors.is_empty());
    // Improved accessibility builds a tree over every multi-mention entity.
    assert_eq!(run.decisions.len(), 2);
}

#[tokio::test]
async fn evaluation_visualization_shows_errors() {
    let corpus = corpus();
    let mut extractor = ErrorExtractor::new(
        corpus.clone(),
        SpanningTreeAlgorithm::RecallAccessibility,
        SpanningTreeAlgorithm::PrecisionSystemOutput,
    )
    .unwrap();
    extractor.add_system(corpus).unwrap();

    let out = tempfile::tempdir().unwrap();
    let stats = Visualizer::new(extractor.get_errors(), "news", false)
        .with_output_dir(out.path())
        .run()
        .await
        .unwrap();
    assert_eq!(stats.directory, out.path().join("news-visualization"));

    let html = std::fs::read_to_string(stats.directory.join("index.html")).unwrap();
    assert!(html.contains("Recall errors (2)"));
    assert!(html.contains("Precision errors (1)"));
    assert!(html.contains("Reference entities (3)"));
    assert!(html.contains("System entities (4)"));
}
