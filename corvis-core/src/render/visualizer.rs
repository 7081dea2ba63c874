// Visualizer: writes every enabled renderer's output for one labelled
// corpus into `<output_dir>/<label>-visualization/`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{info, instrument};

use crate::analyze::DecisionSet;
use crate::error::RenderError;

use super::build_renderer;
use super::traits::VisualizationData;

/// Statistics returned after a visualization run.
#[derive(Debug, Default)]
pub struct VisualizeStats {
    pub directory: PathBuf,
    pub files_written: Vec<PathBuf>,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct Visualizer {
    decisions: DecisionSet,
    label: String,
    for_raw_input: bool,
    output_dir: PathBuf,
    formats: Vec<String>,
}

impl Visualizer {
    pub fn new(decisions: DecisionSet, label: impl Into<String>, for_raw_input: bool) -> Self {
        Self {
            decisions,
            label: label.into(),
            for_raw_input,
            output_dir: PathBuf::from("."),
            formats: vec!["html".to_string(), "json".to_string()],
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    #[must_use]
    pub fn with_formats(mut self, formats: Vec<String>) -> Self {
        self.formats = formats;
        self
    }

    /// Directory the output lands in.
    pub fn target_dir(&self) -> PathBuf {
        visualization_dir(&self.output_dir, &self.label)
    }

    #[instrument(skip(self), fields(label = %self.label, raw = self.for_raw_input))]
    pub async fn run(&self) -> crate::error::Result<VisualizeStats> {
        let start = Instant::now();
        let analysis = self
            .decisions
            .get(&self.label)
            .ok_or_else(|| RenderError::UnknownCorpus(self.label.clone()))?;
        let renderers = self
            .formats
            .iter()
            .map(|f| build_renderer(f))
            .collect::<Result<Vec<_>, _>>()?;

        let data = VisualizationData {
            label: &self.label,
            analysis,
            for_raw_input: self.for_raw_input,
            generated_at: Utc::now(),
        };
        let directory = self.target_dir();
        let mut stats = VisualizeStats {
            directory: directory.clone(),
            ..VisualizeStats::default()
        };
        for renderer in &renderers {
            let path = renderer.write(&data, &directory).await?;
            info!(renderer = renderer.name(), path = %path.display(), "Wrote visualization file");
            stats.files_written.push(path);
        }
        stats.duration = start.elapsed();
        Ok(stats)
    }
}

fn visualization_dir(output_dir: &Path, label: &str) -> PathBuf {
    output_dir.join(format!("{label}-visualization"))
}
