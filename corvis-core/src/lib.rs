//! corvis core library: annotation pipeline, error extraction and visualization.
//!
//! The main entry point is [`driver::visualize_raw`], which runs the
//! Annotate → Extract errors → Visualize sequence through a
//! [`driver::Toolkit`].

pub mod analyze;
pub mod annotate;
pub mod config;
pub mod driver;
pub mod error;
pub mod pipeline;
pub mod progress;
pub mod render;
pub mod types;
