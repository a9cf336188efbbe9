//! Corpus check: parse every description and report the ones that still
//! hit an unresolved ambiguity, fail to parse, or do not survive a
//! render/re-parse cycle.

use crate::error::FerroError;
use crate::hgvs::HgvsParser;
use std::io::BufRead;

/// Numbered descriptions from a corpus reader.
///
/// Blank lines and `#` comments are skipped, a leading byte order mark is
/// dropped, and line numbers are 1-based positions in the source.
pub fn read_descriptions<R: BufRead>(reader: R) -> Result<Vec<(usize, String)>, FerroError> {
    let mut descriptions = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let mut text = line.as_str();
        if index == 0 {
            text = text.trim_start_matches('\u{feff}');
        }
        let text = text.split('#').next().unwrap_or_default().trim();
        if !text.is_empty() {
            descriptions.push((index + 1, text.to_string()));
        }
    }
    Ok(descriptions)
}

/// Result of checking one description
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// Parsed, and the rendered text parses back to the same model
    Ok,
    /// Some ambiguity node has no matching disambiguation rule
    Ambiguous { rule: String, candidates: usize },
    /// Any other parse or conversion failure
    Failed(FerroError),
    /// The rendering parses to a different model, or not at all
    Mismatch { rendered: String },
}

impl CheckOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, CheckOutcome::Ok)
    }
}

/// Check a single description.
pub fn check_description(parser: &HgvsParser, input: &str) -> CheckOutcome {
    let (model, _) = match parser.parse(input) {
        Ok(parsed) => parsed,
        Err(FerroError::UnresolvedAmbiguity {
            rule, candidates, ..
        }) => {
            return CheckOutcome::Ambiguous {
                rule,
                candidates: candidates.len(),
            }
        }
        Err(e) => return CheckOutcome::Failed(e),
    };
    let rendered = model.to_string();
    match parser.parse(&rendered) {
        Ok((again, _)) if again == model => CheckOutcome::Ok,
        _ => CheckOutcome::Mismatch { rendered },
    }
}

/// Tally of outcomes over a corpus
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub total: usize,
    pub ok: usize,
    pub ambiguous: usize,
    pub failed: usize,
    pub mismatched: usize,
}

impl CheckSummary {
    pub fn record(&mut self, outcome: &CheckOutcome) {
        self.total += 1;
        match outcome {
            CheckOutcome::Ok => self.ok += 1,
            CheckOutcome::Ambiguous { .. } => self.ambiguous += 1,
            CheckOutcome::Failed(_) => self.failed += 1,
            CheckOutcome::Mismatch { .. } => self.mismatched += 1,
        }
    }

    pub fn all_ok(&self) -> bool {
        self.ok == self.total
    }
}
