//! Configuration file support for ferro-grammar.
//!
//! This module loads `.ferro-grammar.toml` files, which set the default
//! parser behaviour for the CLI.
//!
//! # Example Configuration
//!
//! ```toml
//! [parser]
//! ignore-whitespace = false
//! start-rule = "variants"
//! timeout-ms = 250
//! grammar = "grammars/hgvs.g"
//! ```
//!
//! # Config File Locations
//!
//! Configuration is searched in this order (first found wins):
//! 1. `.ferro-grammar.toml` in current directory
//! 2. `~/.config/ferro/grammar.toml`
//!
//! CLI flags take precedence over config file settings.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::hgvs::{HgvsParser, ParserOptions, StartRule};
use crate::FerroError;

/// Parsed configuration from a `.ferro-grammar.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserConfig {
    /// Skip whitespace between tokens.
    pub ignore_whitespace: Option<bool>,
    /// Default start rule.
    pub start_rule: Option<StartRule>,
    /// Grammar engine budget in milliseconds, `0` for no limit.
    pub timeout_ms: Option<u64>,
    /// Custom grammar text replacing the built-in fragments.
    pub grammar: Option<PathBuf>,
}

/// Configuration loading error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Config IO error: {0}")]
    Io(String),
    /// Parse error in config file.
    #[error("Config parse error on line {line}: {msg}")]
    Parse { line: usize, msg: String },
}

impl ParserConfig {
    /// Load configuration from the default locations.
    pub fn load() -> Option<Self> {
        let cwd_config = PathBuf::from(".ferro-grammar.toml");
        if cwd_config.exists() {
            match Self::load_from_path(&cwd_config) {
                Ok(config) => return Some(config),
                Err(e) => log::warn!("ignoring {}: {}", cwd_config.display(), e),
            }
        }

        if let Some(home) = dirs_home() {
            let home_config = home.join(".config").join("ferro").join("grammar.toml");
            if home_config.exists() {
                match Self::load_from_path(&home_config) {
                    Ok(config) => return Some(config),
                    Err(e) => log::warn!("ignoring {}: {}", home_config.display(), e),
                }
            }
        }

        None
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML content.
    ///
    /// Only the `[parser]` section is read; other sections are skipped.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = ParserConfig::default();
        let mut in_parser = false;

        for (number, line) in content.lines().enumerate() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                in_parser = &line[1..line.len() - 1] == "parser";
                continue;
            }

            if !in_parser {
                continue;
            }

            let error = |msg: String| ConfigError::Parse {
                line: number + 1,
                msg,
            };
            let Some((key, value)) = line.split_once('=') else {
                return Err(error(format!("expected key = value, found '{}'", line)));
            };
            let value = value.trim();

            match key.trim() {
                "ignore-whitespace" => {
                    config.ignore_whitespace = Some(
                        value
                            .parse()
                            .map_err(|_| error(format!("expected true or false, found {}", value)))?,
                    );
                }
                "start-rule" => {
                    config.start_rule = Some(
                        unquote(value)
                            .parse()
                            .map_err(|e: FerroError| error(e.to_string()))?,
                    );
                }
                "timeout-ms" => {
                    config.timeout_ms = Some(
                        value
                            .parse()
                            .map_err(|_| error(format!("expected milliseconds, found {}", value)))?,
                    );
                }
                "grammar" => config.grammar = Some(PathBuf::from(unquote(value))),
                other => log::debug!("unknown parser setting '{}'", other),
            }
        }

        Ok(config)
    }

    /// Merge with CLI flags; CLI values take precedence.
    pub fn merge_with_cli(
        &self,
        ignore_whitespace: Option<bool>,
        start_rule: Option<StartRule>,
        timeout_ms: Option<u64>,
    ) -> ParserConfig {
        ParserConfig {
            ignore_whitespace: ignore_whitespace.or(self.ignore_whitespace),
            start_rule: start_rule.or(self.start_rule),
            timeout_ms: timeout_ms.or(self.timeout_ms),
            grammar: self.grammar.clone(),
        }
    }

    /// Engine options with defaults filled in.
    pub fn to_parser_options(&self) -> ParserOptions {
        let defaults = ParserOptions::default();
        ParserOptions {
            ignore_whitespace: self.ignore_whitespace.unwrap_or(defaults.ignore_whitespace),
            timeout: match self.timeout_ms {
                Some(0) => None,
                Some(ms) => Some(Duration::from_millis(ms)),
                None => defaults.timeout,
            },
        }
    }

    /// Build the parser this configuration describes.
    pub fn build_parser(&self) -> Result<HgvsParser, FerroError> {
        let options = self.to_parser_options();
        let parser = match &self.grammar {
            Some(path) => {
                let text = fs::read_to_string(path)?;
                HgvsParser::from_grammar_text(&text, options)?
            }
            None => HgvsParser::with_options(options)?,
        };
        Ok(parser.start_rule(self.start_rule.unwrap_or_default()))
    }
}

/// Drop a trailing `#` comment outside of quotes.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' | '\'' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

fn unquote(value: &str) -> &str {
    value.trim_matches('"').trim_matches('\'')
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    std::env::var("HOME").ok().map(PathBuf::from)
}
