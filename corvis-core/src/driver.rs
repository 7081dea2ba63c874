//! Raw-input visualization: annotate files with coreference, compare the
//! result with itself, and render the decisions.
//!
//! The three collaborators are built through a [`Toolkit`], so the exact call
//! sequence can be observed by swapping in a recording implementation.

use std::path::PathBuf;
use std::sync::Arc;

use corvis_graphs::SpanningTreeAlgorithm;
use tracing::{info, instrument};

use crate::analyze::{DecisionSet, ErrorExtractor};
use crate::config::CorvisConfig;
use crate::pipeline::Pipeline;
use crate::progress::{NoopReporter, ProgressReporter};
use crate::render::{VisualizeStats, Visualizer};
use crate::types::Corpus;

/// Label of the corpus built from the input files.
pub const CORPUS_LABEL: &str = "corpus";
pub const RECALL_STRATEGY: SpanningTreeAlgorithm = SpanningTreeAlgorithm::RecallAccessibility;
pub const PRECISION_STRATEGY: SpanningTreeAlgorithm = SpanningTreeAlgorithm::PrecisionSystemOutput;

// ── Collaborator seams ───────────────────────────────────────────────

#[async_trait::async_trait]
pub trait DocumentPipeline: Send + Sync {
    async fn run_on_docs(&self, label: &str, files: &[PathBuf]) -> crate::error::Result<Corpus>;
}

pub trait DecisionExtractor: Send {
    fn add_system(&mut self, system: Arc<Corpus>) -> crate::error::Result<()>;
    fn get_errors(&self) -> DecisionSet;
}

#[async_trait::async_trait]
pub trait DecisionVisualizer: Send + Sync {
    async fn run(&self) -> crate::error::Result<VisualizeStats>;
}

/// Constructors for the collaborators of [`visualize_raw`].
pub trait Toolkit: Send + Sync {
    fn pipeline(
        &self,
        tool_location: &std::path::Path,
        with_coref: bool,
    ) -> crate::error::Result<Box<dyn DocumentPipeline>>;

    fn extractor(
        &self,
        reference: Arc<Corpus>,
        recall: SpanningTreeAlgorithm,
        precision: SpanningTreeAlgorithm,
    ) -> crate::error::Result<Box<dyn DecisionExtractor>>;

    fn visualizer(
        &self,
        decisions: DecisionSet,
        label: &str,
        for_raw_input: bool,
    ) -> crate::error::Result<Box<dyn DecisionVisualizer>>;
}

#[async_trait::async_trait]
impl DocumentPipeline for Pipeline {
    async fn run_on_docs(&self, label: &str, files: &[PathBuf]) -> crate::error::Result<Corpus> {
        Pipeline::run_on_docs(self, label, files).await
    }
}

impl DecisionExtractor for ErrorExtractor {
    fn add_system(&mut self, system: Arc<Corpus>) -> crate::error::Result<()> {
        ErrorExtractor::add_system(self, system)?;
        Ok(())
    }

    fn get_errors(&self) -> DecisionSet {
        ErrorExtractor::get_errors(self)
    }
}

#[async_trait::async_trait]
impl DecisionVisualizer for Visualizer {
    async fn run(&self) -> crate::error::Result<VisualizeStats> {
        Visualizer::run(self).await
    }
}

/// Builds the real collaborators from configuration.
#[derive(Debug)]
pub struct DefaultToolkit {
    config: CorvisConfig,
    reporter: Arc<dyn ProgressReporter>,
}

impl DefaultToolkit {
    pub fn new(config: CorvisConfig) -> Self {
        Self {
            config,
            reporter: Arc::new(NoopReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

impl Toolkit for DefaultToolkit {
    fn pipeline(
        &self,
        tool_location: &std::path::Path,
        with_coref: bool,
    ) -> crate::error::Result<Box<dyn DocumentPipeline>> {
        let pipeline = Pipeline::new(tool_location, with_coref, &self.config.annotator)?
            .with_reporter(self.reporter.clone());
        Ok(Box::new(pipeline))
    }

    fn extractor(
        &self,
        reference: Arc<Corpus>,
        recall: SpanningTreeAlgorithm,
        precision: SpanningTreeAlgorithm,
    ) -> crate::error::Result<Box<dyn DecisionExtractor>> {
        Ok(Box::new(ErrorExtractor::new(reference, recall, precision)?))
    }

    fn visualizer(
        &self,
        decisions: DecisionSet,
        label: &str,
        for_raw_input: bool,
    ) -> crate::error::Result<Box<dyn DecisionVisualizer>> {
        let visualizer = Visualizer::new(decisions, label, for_raw_input)
            .with_output_dir(&self.config.render.output_dir)
            .with_formats(self.config.render.formats.clone());
        Ok(Box::new(visualizer))
    }
}

// ── Driver ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RawInputRequest {
    /// Annotation tool installation.
    pub tool_location: PathBuf,
    pub inputs: Vec<PathBuf>,
}

#[derive(Debug)]
pub struct RunSummary {
    pub documents: usize,
    pub decisions: usize,
    pub visualization: VisualizeStats,
}

/// Annotate the inputs with coreference, register the corpus as both
/// reference and system output, and visualize the decisions.
#[instrument(skip_all, fields(inputs = request.inputs.len()))]
pub async fn visualize_raw(
    toolkit: &dyn Toolkit,
    request: &RawInputRequest,
) -> crate::error::Result<RunSummary> {
    let pipeline = toolkit.pipeline(&request.tool_location, true)?;
    let corpus = Arc::new(pipeline.run_on_docs(CORPUS_LABEL, &request.inputs).await?);

    let mut extractor = toolkit.extractor(corpus.clone(), RECALL_STRATEGY, PRECISION_STRATEGY)?;
    extractor.add_system(corpus.clone())?;
    let decisions = extractor.get_errors();
    let decision_count = decisions.decision_count();

    let visualizer = toolkit.visualizer(decisions, CORPUS_LABEL, true)?;
    let visualization = visualizer.run().await?;

    info!(
        documents = corpus.len(),
        decisions = decision_count,
        files = visualization.files_written.len(),
        "Visualization complete"
    );
    Ok(RunSummary {
        documents: corpus.len(),
        decisions: decision_count,
        visualization,
    })
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::Mutex;

    use super::*;
    use crate::error::{AnnotateError, CorvisError};
    use crate::types::{Document, Mention, MentionType, Span, Token};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Pipeline(PathBuf, bool),
        RunOnDocs(String, Vec<PathBuf>),
        Extractor(SpanningTreeAlgorithm, SpanningTreeAlgorithm),
        AddSystem,
        GetErrors,
        Visualizer(String, bool),
        Run,
    }

    /// Records every call; the corpora and decisions it sees are kept for
    /// identity checks.
    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<Call>>,
        reference: Mutex<Option<Arc<Corpus>>>,
        system: Mutex<Option<Arc<Corpus>>>,
        produced: Mutex<Option<DecisionSet>>,
        received: Mutex<Option<DecisionSet>>,
    }

    impl Recorder {
        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    struct RecordingToolkit {
        recorder: Arc<Recorder>,
        fail_annotation: bool,
    }

    struct RecordingPipeline(Arc<Recorder>, bool);
    struct RecordingExtractor(Arc<Recorder>, ErrorExtractor);
    struct RecordingVisualizer(Arc<Recorder>);

    fn sample_document(name: &str) -> Document {
        let mut doc = Document::new(name);
        doc.tokens = ["Ann", "smiled", ".", "She", "left"]
            .iter()
            .map(|w| Token::bare(*w))
            .collect();
        doc.sentence_spans = vec![Span::new(0, 2), Span::new(3, 4)];
        let ann = Mention {
            span: Span::new(0, 0),
            tokens: vec!["Ann".into()],
            head: vec!["Ann".into()],
            mention_type: MentionType::Nam,
            sentence: 0,
            annotated_set_id: Some(1),
            set_id: Some(1),
            antecedent: None,
        };
        let she = Mention {
            span: Span::new(3, 3),
            tokens: vec!["She".into()],
            head: vec!["She".into()],
            mention_type: MentionType::Pro,
            sentence: 1,
            antecedent: Some(Span::new(0, 0)),
            ..ann.clone()
        };
        doc.annotated_mentions = vec![ann, she];
        doc.system_mentions = doc.annotated_mentions.clone();
        doc
    }

    #[async_trait::async_trait]
    impl DocumentPipeline for RecordingPipeline {
        async fn run_on_docs(&self, label: &str, files: &[PathBuf]) -> crate::error::Result<Corpus> {
            self.0.push(Call::RunOnDocs(label.to_string(), files.to_vec()));
            if self.1 {
                return Err(AnnotateError::Timeout {
                    document: "doc1.txt".into(),
                    seconds: 1,
                }
                .into());
            }
            let documents = files
                .iter()
                .map(|f| sample_document(&f.display().to_string()))
                .collect();
            Ok(Corpus::new(label, documents))
        }
    }

    impl DecisionExtractor for RecordingExtractor {
        fn add_system(&mut self, system: Arc<Corpus>) -> crate::error::Result<()> {
            self.0.push(Call::AddSystem);
            *self.0.system.lock().unwrap() = Some(system.clone());
            DecisionExtractor::add_system(&mut self.1, system)
        }

        fn get_errors(&self) -> DecisionSet {
            self.0.push(Call::GetErrors);
            let set = self.1.get_errors();
            *self.0.produced.lock().unwrap() = Some(set.clone());
            set
        }
    }

    #[async_trait::async_trait]
    impl DecisionVisualizer for RecordingVisualizer {
        async fn run(&self) -> crate::error::Result<VisualizeStats> {
            self.0.push(Call::Run);
            Ok(VisualizeStats::default())
        }
    }

    impl Toolkit for RecordingToolkit {
        fn pipeline(
            &self,
            tool_location: &Path,
            with_coref: bool,
        ) -> crate::error::Result<Box<dyn DocumentPipeline>> {
            self.recorder
                .push(Call::Pipeline(tool_location.to_path_buf(), with_coref));
            Ok(Box::new(RecordingPipeline(
                self.recorder.clone(),
                self.fail_annotation,
            )))
        }

        fn extractor(
            &self,
            reference: Arc<Corpus>,
            recall: SpanningTreeAlgorithm,
            precision: SpanningTreeAlgorithm,
        ) -> crate::error::Result<Box<dyn DecisionExtractor>> {
            self.recorder.push(Call::Extractor(recall, precision));
            *self.recorder.reference.lock().unwrap() = Some(reference.clone());
            let inner = ErrorExtractor::new(reference, recall, precision)?;
            Ok(Box::new(RecordingExtractor(self.recorder.clone(), inner)))
        }

        fn visualizer(
            &self,
            decisions: DecisionSet,
            label: &str,
            for_raw_input: bool,
        ) -> crate::error::Result<Box<dyn DecisionVisualizer>> {
            self.recorder
                .push(Call::Visualizer(label.to_string(), for_raw_input));
            *self.recorder.received.lock().unwrap() = Some(decisions);
            Ok(Box::new(RecordingVisualizer(self.recorder.clone())))
        }
    }

    fn request(inputs: &[&str]) -> RawInputRequest {
        RawInputRequest {
            tool_location: PathBuf::from("/opt/corenlp"),
            inputs: inputs.iter().map(PathBuf::from).collect(),
        }
    }

    fn toolkit(fail_annotation: bool) -> (RecordingToolkit, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        (
            RecordingToolkit {
                recorder: recorder.clone(),
                fail_annotation,
            },
            recorder,
        )
    }

    #[tokio::test]
    async fn calls_collaborators_in_order() {
        let (toolkit, recorder) = toolkit(false);
        let summary = visualize_raw(&toolkit, &request(&["doc1.txt", "doc2.txt"]))
            .await
            .unwrap();

        assert_eq!(
            *recorder.calls.lock().unwrap(),
            vec![
                Call::Pipeline(PathBuf::from("/opt/corenlp"), true),
                Call::RunOnDocs(
                    "corpus".to_string(),
                    vec![PathBuf::from("doc1.txt"), PathBuf::from("doc2.txt")]
                ),
                Call::Extractor(
                    SpanningTreeAlgorithm::RecallAccessibility,
                    SpanningTreeAlgorithm::PrecisionSystemOutput
                ),
                Call::AddSystem,
                Call::GetErrors,
                Call::Visualizer("corpus".to_string(), true),
                Call::Run,
            ]
        );
        assert_eq!(summary.documents, 2);
        assert_eq!(summary.decisions, 2);
    }

    #[tokio::test]
    async fn same_corpus_is_reference_and_system() {
        let (toolkit, recorder) = toolkit(false);
        visualize_raw(&toolkit, &request(&["doc1.txt"])).await.unwrap();

        let reference = recorder.reference.lock().unwrap().clone().unwrap();
        let system = recorder.system.lock().unwrap().clone().unwrap();
        assert!(Arc::ptr_eq(&reference, &system));
        assert_eq!(reference.description, CORPUS_LABEL);
    }

    #[tokio::test]
    async fn decisions_reach_visualizer_unmodified() {
        let (toolkit, recorder) = toolkit(false);
        visualize_raw(&toolkit, &request(&["doc1.txt"])).await.unwrap();

        let produced = recorder.produced.lock().unwrap().clone().unwrap();
        let received = recorder.received.lock().unwrap().clone().unwrap();
        assert_eq!(produced, received);

        let analysis = received.get(CORPUS_LABEL).unwrap();
        let run = &analysis.systems[CORPUS_LABEL];
        assert!(run.recall_errors.is_empty());
        assert!(run.precision_errors.is_empty());
        assert_eq!(run.decisions.len(), 1);
    }

    #[tokio::test]
    async fn no_inputs_still_visualize() {
        let (toolkit, recorder) = toolkit(false);
        let summary = visualize_raw(&toolkit, &request(&[])).await.unwrap();
        assert_eq!(summary.documents, 0);
        assert_eq!(recorder.calls.lock().unwrap().last(), Some(&Call::Run));
    }

    #[tokio::test]
    async fn pipeline_failure_stops_the_sequence() {
        let (toolkit, recorder) = toolkit(true);
        let err = visualize_raw(&toolkit, &request(&["doc1.txt"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CorvisError::Annotate(AnnotateError::Timeout { .. })));
        assert_eq!(recorder.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn default_toolkit_rejects_missing_installation() {
        let toolkit = DefaultToolkit::new(CorvisConfig::default());
        let err = visualize_raw(
            &toolkit,
            &RawInputRequest {
                tool_location: PathBuf::from("/nonexistent/corenlp"),
                inputs: Vec::new(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CorvisError::Annotate(AnnotateError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn default_toolkit_writes_visualization() {
        let tool = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut config = CorvisConfig::default();
        config.render.output_dir = out.path().to_path_buf();

        let summary = visualize_raw(
            &DefaultToolkit::new(config),
            &RawInputRequest {
                tool_location: tool.path().to_path_buf(),
                inputs: Vec::new(),
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.visualization.files_written.len(), 2);
        assert!(out.path().join("corpus-visualization/index.html").exists());
    }
}
