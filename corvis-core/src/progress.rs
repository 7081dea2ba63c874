//! Progress reporting while documents are annotated and rendered.
//!
//! The binary reports through [`IndicatifReporter`]; library callers and tests
//! use [`NoopReporter`] or a recording implementation of their own.

use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::warn;

const BAR_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:30.cyan/blue}] {pos}/{len} ({eta})";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg} {pos} done";

/// Sink for per-step progress of a long-running stage.
pub trait ProgressReporter: Send + Sync + std::fmt::Debug {
    /// Begin a stage; `total` is the number of steps when known.
    fn start(&self, stage: &str, total: Option<u64>);

    /// One step finished, e.g. one document annotated.
    fn step(&self, item: &str);

    fn finish(&self);
}

#[derive(Debug, Default)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn start(&self, _stage: &str, _total: Option<u64>) {}
    fn step(&self, _item: &str) {}
    fn finish(&self) {}
}

/// Progress bar on standard error.
#[derive(Debug)]
pub struct IndicatifReporter {
    bar: ProgressBar,
    completed: AtomicU64,
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl IndicatifReporter {
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr())
    }

    /// A reporter that keeps counting but never draws.
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden())
    }

    fn with_target(target: ProgressDrawTarget) -> Self {
        Self {
            bar: ProgressBar::with_draw_target(None, target),
            completed: AtomicU64::new(0),
        }
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }
}

impl ProgressReporter for IndicatifReporter {
    fn start(&self, stage: &str, total: Option<u64>) {
        self.completed.store(0, Ordering::Relaxed);
        let template = if total.is_some() {
            BAR_TEMPLATE
        } else {
            SPINNER_TEMPLATE
        };
        match ProgressStyle::with_template(template) {
            Ok(style) => self.bar.set_style(style.progress_chars("=> ")),
            Err(e) => warn!(error = %e, "Invalid progress template"),
        }
        if let Some(total) = total {
            self.bar.set_length(total);
        } else {
            self.bar.unset_length();
        }
        self.bar.set_message(stage.to_string());
        self.bar.reset();
    }

    fn step(&self, item: &str) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.bar.set_message(item.to_string());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_reporter_accepts_calls() {
        let reporter = NoopReporter;
        reporter.start("annotating", Some(2));
        reporter.step("doc1.txt");
        reporter.finish();
    }

    #[test]
    fn hidden_reporter_counts_steps() {
        let reporter = IndicatifReporter::hidden();
        reporter.start("annotating", Some(3));
        reporter.step("a.txt");
        reporter.step("b.txt");
        assert_eq!(reporter.completed(), 2);

        reporter.start("rendering", None);
        assert_eq!(reporter.completed(), 0);
        reporter.finish();
    }
}
