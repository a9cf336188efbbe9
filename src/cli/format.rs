//! Output formatting utilities for CLI operations

use crate::error::FerroError;
use crate::hgvs::{Model, ReferenceTable};
use serde_json::json;
use std::io::{self, Write};
use std::str::FromStr;

/// Output format for CLI results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Re-rendered canonical text (default)
    #[default]
    Text,
    /// Model serialized with serde_json
    Json,
}

impl FromStr for OutputFormat {
    type Err = std::convert::Infallible;

    /// Parse an output format from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use ferro_hgvs_grammar::cli::OutputFormat;
    /// use std::str::FromStr;
    ///
    /// assert_eq!(OutputFormat::from_str("json").unwrap(), OutputFormat::Json);
    /// assert_eq!(OutputFormat::from_str("TEXT").unwrap(), OutputFormat::Text);
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        })
    }
}

/// Write a parsed model
///
/// Text output is the canonical rendering, prefixed with the input when the
/// two differ. JSON output carries the model and any nested references.
pub fn output_result<W: Write>(
    writer: &mut W,
    input: &str,
    model: &Model,
    references: &ReferenceTable,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let value = json!({
                "input": input,
                "model": model,
                "references": references,
                "status": "ok",
            });
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => {
            let output = model.to_string();
            if input == output {
                writeln!(writer, "{}", output)
            } else {
                writeln!(writer, "{} -> {}", input, output)
            }
        }
    }
}

/// Write an error to the output
///
/// # Examples
///
/// ```
/// use ferro_hgvs_grammar::cli::{output_error, OutputFormat};
/// use ferro_hgvs_grammar::FerroError;
/// use std::io::Cursor;
///
/// let mut buffer = Cursor::new(Vec::new());
/// let error = FerroError::Timeout { elapsed_ms: 12 };
/// output_error(&mut buffer, "input", &error, OutputFormat::Text).unwrap();
/// let result = String::from_utf8(buffer.into_inner()).unwrap();
/// assert!(result.contains("ERROR: input"));
/// ```
pub fn output_error<W: Write>(
    writer: &mut W,
    input: &str,
    error: &FerroError,
    format: OutputFormat,
) -> io::Result<()> {
    output_error_with_context(writer, input, error, format, None)
}

/// Write an error to the output with optional line number context
///
/// Text output for syntax errors includes the highlighted diagnostic.
pub fn output_error_with_context<W: Write>(
    writer: &mut W,
    input: &str,
    error: &FerroError,
    format: OutputFormat,
    line_number: Option<usize>,
) -> io::Result<()> {
    match format {
        OutputFormat::Json => {
            let mut value = json!({
                "input": input,
                "error": error.to_string(),
                "code": error.code().as_str(),
                "status": "error",
            });
            if let Some(line) = line_number {
                value["line"] = json!(line);
            }
            writeln!(writer, "{}", value)
        }
        OutputFormat::Text => {
            match line_number {
                Some(line) => writeln!(writer, "ERROR (line {}): {} - {}", line, input, error)?,
                None => writeln!(writer, "ERROR: {} - {}", input, error)?,
            }
            if error.is_syntax_error() {
                writeln!(writer, "{}", error.detailed_message())?;
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hgvs::model::Location;
    use std::io::Cursor;

    fn written<F: FnOnce(&mut Cursor<Vec<u8>>) -> io::Result<()>>(f: F) -> String {
        let mut buffer = Cursor::new(Vec::new());
        f(&mut buffer).unwrap();
        String::from_utf8(buffer.into_inner()).unwrap()
    }

    #[test]
    fn test_output_result_text() {
        let model = Model::Location(Location::range(Location::point(10), Location::point(20)));
        let same = written(|w| {
            output_result(w, "10_20", &model, &ReferenceTable::new(), OutputFormat::Text)
        });
        assert_eq!(same, "10_20\n");
        let changed = written(|w| {
            output_result(w, "10 _ 20", &model, &ReferenceTable::new(), OutputFormat::Text)
        });
        assert_eq!(changed, "10 _ 20 -> 10_20\n");
    }

    #[test]
    fn test_output_result_json() {
        let model = Model::Location(Location::point(58));
        let text = written(|w| {
            output_result(w, "58", &model, &ReferenceTable::new(), OutputFormat::Json)
        });
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["model"]["model"], "location");
        assert_eq!(value["model"]["value"]["position"], 58);
    }

    #[test]
    fn test_output_error_json_with_line() {
        let error = FerroError::Timeout { elapsed_ms: 3 };
        let text = written(|w| {
            output_error_with_context(w, "x", &error, OutputFormat::Json, Some(7))
        });
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["line"], 7);
        assert_eq!(value["code"], "E1003");
    }

    #[test]
    fn test_output_error_text_with_line() {
        let error = FerroError::Timeout { elapsed_ms: 3 };
        let text = written(|w| {
            output_error_with_context(w, "x", &error, OutputFormat::Text, Some(42))
        });
        assert!(text.starts_with("ERROR (line 42): x - "));
    }
}
