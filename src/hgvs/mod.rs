//! HGVS description parsing
//!
//! The pipeline runs in four stages, each a pure function of the previous
//! stage's output:
//!
//! 1. the grammar engine parses text into a forest with ambiguity nodes,
//! 2. [`resolve`] picks one derivation per ambiguity node,
//! 3. [`normalize`] maps protein rules onto the nucleotide vocabulary,
//! 4. [`convert`] folds the tree into a [`Model`] plus a [`ReferenceTable`].
//!
//! [`render`] goes the other way, from a model back to text.
//!
//! # Example
//!
//! ```
//! use ferro_hgvs_grammar::hgvs::{parse_description, render::render};
//!
//! let (description, references) = parse_description("NM_004006.2:c.169_170insA").unwrap();
//! assert_eq!(description.variants.len(), 1);
//! assert!(references.is_empty());
//! assert_eq!(render(&description), "NM_004006.2:c.169_170insA");
//! ```

pub mod convert;
pub mod model;
pub mod normalize;
pub mod render;
pub mod resolve;

use once_cell::sync::OnceCell;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::error::FerroError;
use crate::grammar::Grammar;
use crate::tree::Derivation;

pub use model::{Description, Model, ReferenceTable};

static GRAMMAR: OnceCell<Arc<Grammar>> = OnceCell::new();
static GRAMMAR_STRICT: OnceCell<Arc<Grammar>> = OnceCell::new();

/// The built-in grammar, compiled once per process
pub fn builtin_grammar(ignore_whitespace: bool) -> Result<Arc<Grammar>, FerroError> {
    let cell = if ignore_whitespace {
        &GRAMMAR
    } else {
        &GRAMMAR_STRICT
    };
    cell.get_or_try_init(|| {
        log::debug!("compiling built-in grammar (ignore whitespace: {})", ignore_whitespace);
        Grammar::builtin(ignore_whitespace).map(Arc::new)
    })
    .cloned()
}

/// Grammar rule a parse starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StartRule {
    /// A full description, e.g. `NC_000001.10:c.58del`
    #[default]
    Description,
    /// `NG_012337.1(SDHD_v001)`, `LRG_24t1`
    Reference,
    /// `10_20`, `(?_10)_20`
    Location,
    /// `[10=;11_12insT]`
    Variants,
    /// `10del`
    Variant,
    /// `[T;11_21inv]`
    Inserted,
}

impl StartRule {
    pub const ALL: [StartRule; 6] = [
        StartRule::Description,
        StartRule::Reference,
        StartRule::Location,
        StartRule::Variants,
        StartRule::Variant,
        StartRule::Inserted,
    ];

    pub fn rule_name(&self) -> &'static str {
        match self {
            StartRule::Description => "description",
            StartRule::Reference => "reference",
            StartRule::Location => "location",
            StartRule::Variants => "variants",
            StartRule::Variant => "variant",
            StartRule::Inserted => "inserted",
        }
    }
}

impl fmt::Display for StartRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_name())
    }
}

impl FromStr for StartRule {
    type Err = FerroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StartRule::ALL
            .into_iter()
            .find(|rule| rule.rule_name() == s)
            .ok_or_else(|| FerroError::UnknownStartRule {
                rule: s.to_string(),
            })
    }
}

/// Default wall-clock budget of one grammar engine call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for the grammar engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Skip whitespace between tokens
    pub ignore_whitespace: bool,
    /// Wall-clock budget for the grammar engine call, `None` for no limit
    pub timeout: Option<Duration>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            ignore_whitespace: true,
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

/// Parser over a compiled grammar
///
/// Cheap to clone; the grammar is shared.
#[derive(Debug, Clone)]
pub struct HgvsParser {
    grammar: Arc<Grammar>,
    options: ParserOptions,
    start: StartRule,
}

impl HgvsParser {
    /// Parser over the built-in grammar with default options
    pub fn new() -> Result<Self, FerroError> {
        Self::with_options(ParserOptions::default())
    }

    pub fn with_options(options: ParserOptions) -> Result<Self, FerroError> {
        Ok(Self {
            grammar: builtin_grammar(options.ignore_whitespace)?,
            options,
            start: StartRule::default(),
        })
    }

    /// Parser over custom grammar text
    ///
    /// `%ignore WS` is appended when the options ask for whitespace to be
    /// ignored and the text does not declare it already.
    pub fn from_grammar_text(text: &str, options: ParserOptions) -> Result<Self, FerroError> {
        let text = if options.ignore_whitespace && !text.contains("%ignore") {
            format!("{}\n%ignore {}\n", text, crate::grammar::WHITESPACE_TERMINAL)
        } else {
            text.to_string()
        };
        Ok(Self {
            grammar: Arc::new(Grammar::from_text(&text)?),
            options,
            start: StartRule::default(),
        })
    }

    /// Use another start rule
    pub fn start_rule(mut self, start: StartRule) -> Self {
        self.start = start;
        self
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Raw forest, ambiguity nodes included
    pub fn parse_forest(&self, input: &str) -> Result<Derivation, FerroError> {
        self.grammar
            .parse(input, self.start.rule_name(), self.options.timeout)
    }

    /// Disambiguated and normalized tree
    pub fn parse_tree(&self, input: &str) -> Result<Derivation, FerroError> {
        let forest = self.parse_forest(input)?;
        resolve::resolve(forest)
            .and_then(normalize::normalize)
            .map_err(|e| e.with_input(input))
    }

    /// Parse from the configured start rule into a model
    pub fn parse(&self, input: &str) -> Result<(Model, ReferenceTable), FerroError> {
        let tree = self.parse_tree(input)?;
        convert::convert(&tree).map_err(|e| e.with_input(input))
    }

    /// Parse a full description, whatever the configured start rule
    pub fn parse_description(
        &self,
        input: &str,
    ) -> Result<(Description, ReferenceTable), FerroError> {
        let parser = self.clone().start_rule(StartRule::Description);
        match parser.parse(input)? {
            (Model::Description(description), references) => Ok((description, references)),
            (other, _) => Err(FerroError::malformed(
                "description",
                format!("expected a description, found {:?}", other),
            )
            .with_input(input)),
        }
    }
}

/// Parse a full description with the built-in grammar.
pub fn parse_description(input: &str) -> Result<(Description, ReferenceTable), FerroError> {
    HgvsParser::new()?.parse_description(input)
}

/// Parse a fragment (reference, location, variants, ...) with the
/// built-in grammar.
pub fn parse_fragment(
    input: &str,
    start: StartRule,
) -> Result<(Model, ReferenceTable), FerroError> {
    HgvsParser::new()?.start_rule(start).parse(input)
}

/// Disambiguated tree, for tooling.
pub fn parse_tree(input: &str, start: StartRule) -> Result<Derivation, FerroError> {
    HgvsParser::new()?.start_rule(start).parse_tree(input)
}
