use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use corvis_core::config::CorvisConfig;
use corvis_core::driver::{DefaultToolkit, RawInputRequest, visualize_raw};
use corvis_core::error::CorvisError;
use corvis_core::progress::IndicatifReporter;

use crate::args::Cli;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => CorvisConfig::load(path)
            .map_err(CorvisError::from)
            .with_context(|| format!("Cannot load config: {}", path.display()))?,
        None => CorvisConfig::default(),
    };
    if let Some(output_dir) = cli.output_dir {
        config.render.output_dir = output_dir;
    }

    let toolkit = DefaultToolkit::new(config).with_reporter(Arc::new(IndicatifReporter::new()));
    let request = RawInputRequest {
        tool_location: cli.corenlp,
        inputs: cli.input_filename,
    };

    let summary = visualize_raw(&toolkit, &request)
        .await
        .context("Visualization failed")?;

    info!(
        documents = summary.documents,
        decisions = summary.decisions,
        directory = %summary.visualization.directory.display(),
        "Done"
    );
    Ok(())
}
