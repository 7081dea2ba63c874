use std::path::{Path, PathBuf};

use corvis_graphs::SpanningTreeAlgorithm;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::KNOWN_FORMATS;

/// Top-level corvis configuration, matching `corvis.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorvisConfig {
    #[serde(default)]
    pub annotator: AnnotatorSection,
    #[serde(default)]
    pub analysis: AnalysisSection,
    #[serde(default)]
    pub render: RenderSection,
}

impl CorvisConfig {
    /// Read, parse and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.analysis.recall_algorithm.is_recall() {
            return Err(ConfigError::Invalid(format!(
                "analysis.recall_algorithm: {} is a precision algorithm",
                self.analysis.recall_algorithm
            )));
        }
        if self.analysis.precision_algorithm.is_recall() {
            return Err(ConfigError::Invalid(format!(
                "analysis.precision_algorithm: {} is a recall algorithm",
                self.analysis.precision_algorithm
            )));
        }
        if let Some(unknown) = self
            .render
            .formats
            .iter()
            .find(|f| !KNOWN_FORMATS.contains(&f.as_str()))
        {
            return Err(ConfigError::Invalid(format!(
                "render.formats: unknown format {unknown}"
            )));
        }
        if self.annotator.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "annotator.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorSection {
    /// Java launcher used to start the annotation tool.
    pub java: String,
    /// Maximum heap handed to the JVM (`-Xmx`).
    pub memory: String,
    pub main_class: String,
    pub timeout_secs: u64,
    /// Annotators appended after the default list.
    pub extra_annotators: Vec<String>,
}

impl Default for AnnotatorSection {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            memory: "3g".to_string(),
            main_class: "edu.stanford.nlp.pipeline.StanfordCoreNLP".to_string(),
            timeout_secs: 600,
            extra_annotators: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub recall_algorithm: SpanningTreeAlgorithm,
    pub precision_algorithm: SpanningTreeAlgorithm,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            recall_algorithm: SpanningTreeAlgorithm::RecallAccessibility,
            precision_algorithm: SpanningTreeAlgorithm::PrecisionSystemOutput,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSection {
    pub output_dir: PathBuf,
    pub formats: Vec<String>,
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            formats: vec!["html".into(), "json".into()],
        }
    }
}
