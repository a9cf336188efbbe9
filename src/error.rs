//! Error types for ferro-hgvs-grammar
//!
//! This module provides error handling with:
//! - Error codes for categorization
//! - Source span tracking for error location
//! - Diagnostic messages listing the acceptable continuations

use std::fmt;
use thiserror::Error;

use crate::grammar::terminals::describe_terminal;
use crate::tree::Derivation;

/// Error codes for categorizing errors
///
/// These codes can be used for programmatic error handling
/// and for documentation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    // Syntax errors (E1xxx)
    /// Unexpected character
    UnexpectedChar = 1001,
    /// Unexpected end of input
    UnexpectedEnd = 1002,
    /// Parsing exceeded its time budget
    ParseTimeout = 1003,

    // Disambiguation errors (E2xxx)
    /// No disambiguation rule applies
    UnresolvedAmbiguity = 2001,

    // Conversion errors (E3xxx)
    /// Tree shape not understood by the converter
    MalformedDerivation = 3001,
    /// Number does not fit the model
    NumberOutOfRange = 3002,

    // Content errors (E4xxx)
    /// Nested external description too complex
    NestedReferenceTooDeep = 4001,

    // Infrastructure errors (E9xxx)
    /// File IO error
    IoError = 9001,
    /// JSON serialization error
    JsonError = 9002,
    /// Grammar text could not be loaded
    GrammarError = 9003,
    /// Unknown start rule
    UnknownStartRule = 9004,
}

impl ErrorCode {
    /// Get the error code as a string (e.g., "E1001")
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a brief description of this error code
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::UnexpectedChar => "unexpected character",
            ErrorCode::UnexpectedEnd => "unexpected end of input",
            ErrorCode::ParseTimeout => "parsing timed out",
            ErrorCode::UnresolvedAmbiguity => "ambiguity not solved",
            ErrorCode::MalformedDerivation => "malformed derivation tree",
            ErrorCode::NumberOutOfRange => "number out of range",
            ErrorCode::NestedReferenceTooDeep => "nested description too complex",
            ErrorCode::IoError => "file I/O error",
            ErrorCode::JsonError => "JSON serialization error",
            ErrorCode::GrammarError => "invalid grammar",
            ErrorCode::UnknownStartRule => "unknown start rule",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A span in the source input indicating error location
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceSpan {
    /// Starting byte offset (0-indexed)
    pub start: usize,
    /// Ending byte offset (exclusive)
    pub end: usize,
}

impl SourceSpan {
    /// Create a new source span
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Create a span for a single position
    pub fn point(pos: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
        }
    }

    /// Format the source with the error highlighted
    ///
    /// Returns a string like:
    /// ```text
    /// NM_000088.3:c.459A>G
    ///                ^~~~
    /// ```
    pub fn highlight(&self, source: &str) -> String {
        if source.is_empty() {
            return String::new();
        }

        let safe_start = floor_char_boundary(source, self.start);
        let safe_end = floor_char_boundary(source, self.end).max(safe_start);

        // columns are characters, not bytes
        let column = source[..safe_start].chars().count();
        let width = source[safe_start..safe_end].chars().count();

        let mut pointer = " ".repeat(column);
        pointer.push('^');
        if width > 1 {
            pointer.push_str(&"~".repeat(width - 1));
        }

        format!("{}\n{}", source, pointer)
    }
}

fn floor_char_boundary(source: &str, index: usize) -> usize {
    let mut index = index.min(source.len());
    while !source.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Diagnostic information for an error
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diagnostic {
    /// Error code
    pub code: Option<ErrorCode>,
    /// Source span for highlighting
    pub span: Option<SourceSpan>,
    /// The original input (for error display)
    pub source: Option<String>,
    /// Helpful hint
    pub hint: Option<String>,
    /// Acceptable continuations, already in human-readable form
    pub expected: Vec<String>,
}

impl Diagnostic {
    /// Create a new empty diagnostic
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Add a source span
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    /// Add the original source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Add a hint
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Add the list of acceptable continuations
    pub fn with_expected<I, S>(mut self, expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected = expected.into_iter().map(Into::into).collect();
        self
    }

    /// Format the diagnostic as a detailed error message
    pub fn format(&self, primary_message: &str) -> String {
        let mut result = String::new();

        if let Some(code) = &self.code {
            result.push_str(&format!("[{}] ", code));
        }

        result.push_str(primary_message);

        if let (Some(span), Some(source)) = (&self.span, &self.source) {
            result.push_str("\n\n");
            result.push_str(&span.highlight(source));
        }

        if !self.expected.is_empty() {
            result.push_str("\n\nExpecting:");
            for expected in &self.expected {
                result.push_str("\n  - ");
                result.push_str(expected);
            }
        }

        if let Some(hint) = &self.hint {
            result.push_str("\n\nHint: ");
            result.push_str(hint);
        }

        result
    }
}

/// Main error type for ferro-hgvs-grammar operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FerroError {
    /// The description contains a character no grammar rule accepts
    #[error("Unexpected character '{character}' at position {pos} in \"{input}\"")]
    UnexpectedCharacter {
        pos: usize,
        character: char,
        /// Terminal names that would have been accepted at `pos`
        allowed: Vec<String>,
        input: String,
    },

    /// The description stops before a complete derivation was found
    #[error("Unexpected end of input at position {pos} in \"{input}\"")]
    UnexpectedEnd {
        pos: usize,
        allowed: Vec<String>,
        input: String,
    },

    /// The grammar engine exceeded its time budget
    #[error("Parsing timed out after {elapsed_ms} ms")]
    Timeout { elapsed_ms: u128 },

    /// No disambiguation rule selects a candidate
    #[error(
        "Ambiguity not solved in rule '{rule}' ({} candidates){}",
        .candidates.len(),
        in_input(.input)
    )]
    UnresolvedAmbiguity {
        rule: String,
        candidates: Vec<Derivation>,
        /// The description being parsed, empty when the tree was built by hand
        input: String,
    },

    /// The converter met a node combination it does not understand
    #[error("Malformed derivation at '{rule}': {msg}{}", in_input(.input))]
    MalformedDerivation {
        rule: String,
        msg: String,
        input: String,
    },

    /// A numeric token does not fit in the model
    #[error("Number out of range: {text}")]
    NumberOutOfRange { text: String },

    /// A nested external description is more than a single location
    #[error("Nested description for {reference} is too complex: {msg}{}", in_input(.input))]
    NestedReferenceTooDeep {
        reference: String,
        msg: String,
        input: String,
    },

    /// Grammar text could not be loaded or compiled
    #[error("Grammar error: {msg}")]
    Grammar { msg: String },

    /// Requested start rule does not exist in the grammar
    #[error("Unknown start rule: {rule}")]
    UnknownStartRule { rule: String },

    /// IO error (for file operations)
    #[error("IO error: {msg}")]
    Io { msg: String },

    /// JSON serialization error
    #[error("JSON error: {msg}")]
    Json { msg: String },
}

impl FerroError {
    /// Create a grammar error
    pub fn grammar(msg: impl Into<String>) -> Self {
        FerroError::Grammar { msg: msg.into() }
    }

    /// Create a malformed-derivation error for a rule
    pub fn malformed(rule: impl Into<String>, msg: impl Into<String>) -> Self {
        FerroError::MalformedDerivation {
            rule: rule.into(),
            msg: msg.into(),
            input: String::new(),
        }
    }

    /// Attach the description text to errors raised after the grammar engine.
    ///
    /// Syntax errors already carry their input and are returned unchanged.
    pub fn with_input(mut self, text: &str) -> Self {
        match &mut self {
            FerroError::UnresolvedAmbiguity { input, .. }
            | FerroError::MalformedDerivation { input, .. }
            | FerroError::NestedReferenceTooDeep { input, .. }
                if input.is_empty() =>
            {
                *input = text.to_string();
            }
            _ => {}
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            FerroError::UnexpectedCharacter { .. } => ErrorCode::UnexpectedChar,
            FerroError::UnexpectedEnd { .. } => ErrorCode::UnexpectedEnd,
            FerroError::Timeout { .. } => ErrorCode::ParseTimeout,
            FerroError::UnresolvedAmbiguity { .. } => ErrorCode::UnresolvedAmbiguity,
            FerroError::MalformedDerivation { .. } => ErrorCode::MalformedDerivation,
            FerroError::NumberOutOfRange { .. } => ErrorCode::NumberOutOfRange,
            FerroError::NestedReferenceTooDeep { .. } => ErrorCode::NestedReferenceTooDeep,
            FerroError::Grammar { .. } => ErrorCode::GrammarError,
            FerroError::UnknownStartRule { .. } => ErrorCode::UnknownStartRule,
            FerroError::Io { .. } => ErrorCode::IoError,
            FerroError::Json { .. } => ErrorCode::JsonError,
        }
    }

    /// Whether this error comes from the syntax of the description itself
    pub fn is_syntax_error(&self) -> bool {
        matches!(
            self,
            FerroError::UnexpectedCharacter { .. } | FerroError::UnexpectedEnd { .. }
        )
    }

    /// Build the diagnostic for this error, if it carries position information
    pub fn diagnostic(&self) -> Option<Diagnostic> {
        let (pos, allowed, input) = match self {
            FerroError::UnexpectedCharacter {
                pos, allowed, input, ..
            }
            | FerroError::UnexpectedEnd {
                pos, allowed, input, ..
            } => (*pos, allowed, input),
            FerroError::UnresolvedAmbiguity { .. } => {
                return Some(Diagnostic::new().with_code(self.code()).with_hint(
                    "the description is valid but matches several readings; \
                     rewrite it or report it so a disambiguation rule can be added",
                ));
            }
            _ => return None,
        };

        Some(
            Diagnostic::new()
                .with_code(self.code())
                .with_span(SourceSpan::point(pos))
                .with_source(input.clone())
                .with_expected(allowed.iter().map(|name| describe_terminal(name))),
        )
    }

    /// Get a formatted error with full diagnostic output
    pub fn detailed_message(&self) -> String {
        match self.diagnostic() {
            Some(diagnostic) => diagnostic.format(&self.to_string()),
            None => format!("[{}] {}", self.code(), self),
        }
    }
}

fn in_input(input: &str) -> String {
    if input.is_empty() {
        String::new()
    } else {
        format!(" in \"{}\"", input)
    }
}

impl From<std::io::Error> for FerroError {
    fn from(err: std::io::Error) -> Self {
        FerroError::Io {
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FerroError {
    fn from(err: serde_json::Error) -> Self {
        FerroError::Json {
            msg: err.to_string(),
        }
    }
}
