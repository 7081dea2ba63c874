use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "corvis",
    version,
    about = "Annotate raw text with coreference and visualize the system's decisions"
)]
pub struct Cli {
    /// Text files to visualize
    pub input_filename: Vec<PathBuf>,

    /// Location of the CoreNLP installation (the directory holding its jars)
    #[arg(long = "corenlp", value_name = "DIR")]
    pub corenlp: PathBuf,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory receiving `corpus-visualization/` (overrides `render.output_dir`)
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

/// Rewrite the single-dash `-corenlp` spelling to `--corenlp`.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-corenlp") => OsString::from("--corenlp"),
            Some(s) if s.starts_with("-corenlp=") => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}
