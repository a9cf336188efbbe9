//! Grammar engine: EBNF loading, Earley recognition and forest construction.
//!
//! The built-in HGVS grammar is assembled from five fragments, always
//! concatenated in the same order: top-level structure, nucleotide
//! variants, protein variants, reference syntax and shared lexical rules.
//!
//! # Example
//!
//! ```
//! use ferro_hgvs_grammar::grammar::Grammar;
//!
//! let grammar = Grammar::builtin(true).unwrap();
//! let forest = grammar.parse("10_12del", "variant", None).unwrap();
//! assert_eq!(forest.rule_name(), Some("variant"));
//! ```

mod compile;
mod earley;
mod forest;
pub(crate) mod loader;
pub mod terminals;

use regex::Regex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::FerroError;
use crate::tree::Derivation;

/// The built-in grammar fragments, in composition order
pub const FRAGMENTS: [(&str, &str); 5] = [
    ("top", include_str!("ebnf/top.g")),
    ("dna", include_str!("ebnf/dna.g")),
    ("protein", include_str!("ebnf/protein.g")),
    ("reference", include_str!("ebnf/reference.g")),
    ("common", include_str!("ebnf/common.g")),
];

/// Terminal that is skipped between tokens when whitespace is ignored
pub const WHITESPACE_TERMINAL: &str = "WS";

/// Index of a rule in a [`Grammar`]
pub type RuleId = usize;

/// Index of a terminal in a [`Grammar`]
pub type TerminalId = usize;

/// A symbol on the right-hand side of a production
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum Symbol {
    Rule(RuleId),
    /// `keep` is false for string literals written inside rules
    Terminal { id: TerminalId, keep: bool },
}

/// How a rule appears in derivation trees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Always a node of its own
    Keep,
    /// `_rule`: children are spliced into the parent
    Inline,
    /// `?rule`: spliced into the parent when it has a single child
    InlineSingle,
}

#[derive(Debug, Clone)]
pub(crate) struct RuleDef {
    pub name: String,
    pub shape: Shape,
    pub productions: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Production {
    pub lhs: RuleId,
    pub rhs: Vec<Symbol>,
}

#[derive(Debug, Clone)]
pub(crate) struct TerminalDef {
    pub name: String,
    /// Anchored at the start of the haystack
    pub matcher: Regex,
    /// Set when the terminal is a single string literal
    pub literal: Option<String>,
}

/// Wall-clock budget shared by recognition and forest building
#[derive(Debug, Clone, Copy)]
pub(crate) struct Budget {
    started: Instant,
    limit: Option<Duration>,
}

impl Budget {
    pub(crate) fn new(limit: Option<Duration>) -> Self {
        Budget {
            started: Instant::now(),
            limit,
        }
    }

    pub(crate) fn check(&self) -> Result<(), FerroError> {
        match self.limit {
            Some(limit) if self.started.elapsed() > limit => Err(FerroError::Timeout {
                elapsed_ms: self.started.elapsed().as_millis(),
            }),
            _ => Ok(()),
        }
    }
}

/// A compiled grammar, immutable and shareable between threads.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) rules: Vec<RuleDef>,
    pub(crate) productions: Vec<Production>,
    pub(crate) terminals: Vec<TerminalDef>,
    pub(crate) ignore: Vec<TerminalId>,
    pub(crate) rule_index: HashMap<String, RuleId>,
}

/// Concatenate grammar fragments, optionally enabling whitespace skipping.
pub fn compose(fragments: &[(&str, &str)], ignore_whitespace: bool) -> String {
    let mut text = fragments
        .iter()
        .map(|(_, fragment)| *fragment)
        .collect::<Vec<_>>()
        .join("\n");
    if ignore_whitespace {
        text.push_str(&format!("\n%ignore {}\n", WHITESPACE_TERMINAL));
    }
    text
}

impl Grammar {
    /// Compile grammar text.
    pub fn from_text(text: &str) -> Result<Self, FerroError> {
        let definitions = loader::load(text)?;
        let grammar = compile::compile(definitions)?;
        log::debug!(
            "compiled grammar: {} rules, {} productions, {} terminals",
            grammar.rules.len(),
            grammar.productions.len(),
            grammar.terminals.len()
        );
        Ok(grammar)
    }

    /// Compile the built-in HGVS grammar.
    pub fn builtin(ignore_whitespace: bool) -> Result<Self, FerroError> {
        Self::from_text(&compose(&FRAGMENTS, ignore_whitespace))
    }

    /// Look up a rule by name
    pub fn rule_id(&self, name: &str) -> Option<RuleId> {
        self.rule_index.get(name).copied()
    }

    /// Whether the grammar has a (non-helper) rule with this name
    pub fn has_rule(&self, name: &str) -> bool {
        self.rule_index.contains_key(name)
    }

    /// Names of all rules, in definition order
    pub fn rule_names(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.name.as_str())
            .filter(|name| !name.starts_with("__"))
    }

    /// Names of all terminals, including generated names for literals
    pub fn terminal_names(&self) -> impl Iterator<Item = &str> {
        self.terminals.iter().map(|terminal| terminal.name.as_str())
    }

    /// Whether some terminal is skipped between tokens
    pub fn ignores_whitespace(&self) -> bool {
        !self.ignore.is_empty()
    }

    pub(crate) fn productions_of(&self, rule: RuleId) -> &[usize] {
        &self.rules[rule].productions
    }

    /// Length of the match of `terminal` at `from`, if non-empty
    pub(crate) fn match_terminal(
        &self,
        terminal: TerminalId,
        input: &str,
        from: usize,
    ) -> Option<usize> {
        let haystack = input.get(from..)?;
        let definition = &self.terminals[terminal];
        let len = match &definition.literal {
            Some(literal) => haystack.starts_with(literal.as_str()).then_some(literal.len())?,
            None => definition.matcher.find(haystack)?.end(),
        };
        (len > 0).then_some(len)
    }

    /// Position after any run of ignored terminals starting at `from`
    pub(crate) fn skip_ignored(&self, input: &str, from: usize) -> usize {
        let mut position = from;
        loop {
            let advanced = self
                .ignore
                .iter()
                .find_map(|&terminal| self.match_terminal(terminal, input, position));
            match advanced {
                Some(len) => position += len,
                None => return position,
            }
        }
    }

    /// Parse `input` from the rule named `start` into a derivation forest.
    ///
    /// The forest may contain [`Derivation::Ambig`] nodes. `timeout`
    /// bounds the wall-clock time spent in recognition and forest building.
    pub fn parse(
        &self,
        input: &str,
        start: &str,
        timeout: Option<Duration>,
    ) -> Result<Derivation, FerroError> {
        let start_id = self
            .rule_id(start)
            .ok_or_else(|| FerroError::UnknownStartRule {
                rule: start.to_string(),
            })?;
        let budget = Budget::new(timeout);
        let chart = earley::recognize(self, input, start_id, &budget)?;
        forest::build(self, input, &chart, &budget)
    }
}
