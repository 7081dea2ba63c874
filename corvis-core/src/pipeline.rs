// Preprocessing pipeline: read input files, annotate each one, collect the
// results into a corpus.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, instrument};

use crate::annotate::markup::strip_markup;
use crate::annotate::{Annotator, CoreNlpAnnotator};
use crate::config::AnnotatorSection;
use crate::error::CorpusError;
use crate::progress::{NoopReporter, ProgressReporter};
use crate::types::Corpus;

/// Turns raw text files into an annotated [`Corpus`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    annotator: Arc<dyn Annotator>,
    with_coref: bool,
    reporter: Arc<dyn ProgressReporter>,
}

impl Pipeline {
    /// Pipeline backed by the CoreNLP installation at `tool_location`.
    pub fn new(
        tool_location: &Path,
        with_coref: bool,
        settings: &AnnotatorSection,
    ) -> crate::error::Result<Self> {
        let annotator = CoreNlpAnnotator::new(tool_location, with_coref, settings.clone())?;
        Ok(Self::with_annotator(Arc::new(annotator), with_coref))
    }

    pub fn with_annotator(annotator: Arc<dyn Annotator>, with_coref: bool) -> Self {
        Self {
            annotator,
            with_coref,
            reporter: Arc::new(NoopReporter),
        }
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Annotate `files` in order and label the result `label`. Documents are
    /// named by their path as given; a path listed again is named
    /// `<path> (2)`, `<path> (3)`, ….
    #[instrument(skip(self, files), fields(annotator = self.annotator.name(), files = files.len()))]
    pub async fn run_on_docs(&self, label: &str, files: &[PathBuf]) -> crate::error::Result<Corpus> {
        let start = Instant::now();
        self.reporter
            .start("Annotating documents", Some(files.len() as u64));

        let mut documents = Vec::with_capacity(files.len());
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for file in files {
            let path = file.display().to_string();
            let raw = tokio::fs::read_to_string(file)
                .await
                .map_err(|source| CorpusError::Read {
                    path: path.clone(),
                    source,
                })?;
            let seen = occurrences.entry(path.clone()).or_insert(0);
            *seen += 1;
            let name = if *seen == 1 {
                path
            } else {
                format!("{path} ({seen})")
            };
            let text = if self.with_coref {
                strip_markup(&raw)
            } else {
                raw
            };
            documents.push(self.annotator.annotate(&name, &text).await?);
            self.reporter.step(&name);
        }
        self.reporter.finish();

        let corpus = Corpus::new(label, documents);
        info!(
            documents = corpus.len(),
            mentions = corpus.system_mention_count(),
            elapsed_ms = start.elapsed().as_millis(),
            "Corpus annotated"
        );
        Ok(corpus)
    }
}
