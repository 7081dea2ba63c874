use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::analyze::CorpusAnalysis;
use crate::error::RenderError;

/// Everything a renderer gets to see.
#[derive(Debug, Clone, Copy)]
pub struct VisualizationData<'a> {
    /// Label of the reference corpus being shown.
    pub label: &'a str,
    pub analysis: &'a CorpusAnalysis,
    /// The reference is the system output itself, so reference panels and
    /// error lists carry no information.
    pub for_raw_input: bool,
    pub generated_at: DateTime<Utc>,
}

/// Common interface for visualization output formats.
#[async_trait::async_trait]
pub trait Renderer: Send + Sync + std::fmt::Debug {
    /// Format name, as used in `render.formats`.
    fn name(&self) -> &'static str;

    /// File name inside the visualization directory.
    fn output_path(&self) -> &'static str;

    async fn render(&self, data: &VisualizationData<'_>) -> crate::error::Result<String>;

    /// Render and write into `directory`, creating it if needed.
    async fn write(
        &self,
        data: &VisualizationData<'_>,
        directory: &Path,
    ) -> crate::error::Result<PathBuf> {
        let content = self.render(data).await?;
        tokio::fs::create_dir_all(directory)
            .await
            .map_err(RenderError::Io)?;
        let output = directory.join(self.output_path());
        tokio::fs::write(&output, content)
            .await
            .map_err(RenderError::Io)?;
        Ok(output)
    }
}
