//! Output formatting for validation results
//!
//! Provides colored CLI output and the final report.

pub mod cli;

pub use cli::{CliOutput, OutputLevel};
