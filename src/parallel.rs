//! Parallel parsing support for ferro-grammar
//!
//! Descriptions are independent of each other, and the compiled grammar is
//! shared read-only, so a batch can be spread over rayon's thread pool.
//! Enable with the `parallel` feature.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "parallel")]
//! # fn main() {
//! use ferro_hgvs_grammar::hgvs::HgvsParser;
//! use ferro_hgvs_grammar::parallel::parse_descriptions_parallel;
//!
//! let parser = HgvsParser::new().unwrap();
//! let descriptions = vec!["NC_000001.10:c.58del", "NP_003997.1:p.(Arg97ProfsTer23)"];
//! let parsed: Vec<_> = parse_descriptions_parallel(&parser, &descriptions)
//!     .into_iter()
//!     .filter_map(|r| r.ok())
//!     .collect();
//! # }
//! # #[cfg(not(feature = "parallel"))]
//! # fn main() {}
//! ```

use rayon::prelude::*;

use crate::error::FerroError;
use crate::hgvs::{Description, HgvsParser, ReferenceTable};

/// Parse multiple descriptions in parallel
///
/// Returns a vector of results, one for each input string.
/// Order is preserved.
pub fn parse_descriptions_parallel<S: AsRef<str> + Sync>(
    parser: &HgvsParser,
    descriptions: &[S],
) -> Vec<Result<(Description, ReferenceTable), FerroError>> {
    descriptions
        .par_iter()
        .map(|s| parser.parse_description(s.as_ref()))
        .collect()
}

/// Parse multiple descriptions in parallel, filtering errors
pub fn parse_descriptions_parallel_ok<S: AsRef<str> + Sync>(
    parser: &HgvsParser,
    descriptions: &[S],
) -> Vec<Description> {
    descriptions
        .par_iter()
        .filter_map(|s| parser.parse_description(s.as_ref()).ok())
        .map(|(description, _)| description)
        .collect()
}

/// Statistics from parallel processing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParallelStats {
    /// Total items processed
    pub total: usize,
    /// Successfully processed
    pub success: usize,
    /// Failed to process
    pub errors: usize,
}

impl ParallelStats {
    /// Tally a batch of results
    pub fn from_results<T>(results: &[Result<T, FerroError>]) -> Self {
        let success = results.iter().filter(|r| r.is_ok()).count();
        Self {
            total: results.len(),
            success,
            errors: results.len() - success,
        }
    }

    /// Calculate success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }
}
