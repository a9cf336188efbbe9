//! CLI utilities for ferro-grammar
//!
//! This module provides testable functions used by the CLI binary.
//! Input handling, output formatting and the corpus check live here so the
//! binary stays a thin layer over clap.

pub mod check;
pub mod format;

pub use check::{check_description, read_descriptions, CheckOutcome, CheckSummary};
pub use format::{output_error, output_error_with_context, output_result, OutputFormat};
