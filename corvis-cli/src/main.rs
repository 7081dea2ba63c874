use std::fmt;

use clap::Parser;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

use corvis_core::error::CorvisError;

mod args;
mod visualize;

/// Map an error to the process exit code.
///
///   0: success
///   1: anything else
///   2: usage or configuration error (clap exits with 2 on its own)
///   3: annotation tool failure
///   4: input file failure
///   5: error extraction failure
///   6: render failure
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    let Some(root) = err.chain().find_map(|e| e.downcast_ref::<CorvisError>()) else {
        return 1;
    };
    match root {
        CorvisError::Config(_) => 2,
        CorvisError::Annotate(_) => 3,
        CorvisError::Corpus(_) => 4,
        CorvisError::Analyze(_) | CorvisError::Graph(_) => 5,
        CorvisError::Render(_) => 6,
    }
}

/// `timestamp LEVEL message`, one line per event, without span context.
struct LogLine;

impl<S, N> FormatEvent<S, N> for LogLine
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " {:>5} ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .event_format(LogLine)
        .init();
}

fn main() {
    init_tracing();

    let cli = args::Cli::parse_from(args::normalize_legacy_flags(std::env::args_os()));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: Failed to create runtime: {e}");
            std::process::exit(1);
        }
    };

    match runtime.block_on(visualize::run(cli)) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}
