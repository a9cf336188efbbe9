//! Compile loaded definitions into flat productions over numbered symbols.
//!
//! Groups and optionals are expanded into alternative productions, `x+`
//! becomes a left-recursive helper rule that is always inlined, and every
//! string literal used inside a rule becomes a terminal of its own.

use regex::Regex;
use std::collections::HashMap;

use super::loader::{is_terminal_name, Definition, Expr, Pattern, Quantifier, TerminalAtom};
use super::terminals::literal_name;
use super::{Grammar, Production, RuleDef, RuleId, Shape, Symbol, TerminalDef, TerminalId};
use crate::error::FerroError;

/// Alternative symbol sequences an expression can expand to
type Expansion = Vec<Vec<Symbol>>;

pub(crate) fn compile(definitions: Vec<Definition>) -> Result<Grammar, FerroError> {
    let mut compiler = Compiler::default();

    for definition in &definitions {
        if let Definition::Terminal { name, alternatives } = definition {
            compiler.define_terminal(name, alternatives)?;
        }
    }
    for definition in &definitions {
        if let Definition::Rule {
            name,
            inline_single,
            ..
        } = definition
        {
            compiler.declare_rule(name, *inline_single)?;
        }
    }
    for definition in &definitions {
        match definition {
            Definition::Rule {
                name, alternatives, ..
            } => compiler.define_rule(name, alternatives)?,
            Definition::Ignore(name) => compiler.ignore(name)?,
            Definition::Terminal { .. } => {}
        }
    }

    Ok(compiler.finish())
}

#[derive(Default)]
struct Compiler {
    rules: Vec<RuleDef>,
    productions: Vec<Production>,
    terminals: Vec<TerminalDef>,
    ignore: Vec<TerminalId>,
    rule_index: HashMap<String, RuleId>,
    terminal_index: HashMap<String, TerminalId>,
    literal_index: HashMap<String, TerminalId>,
    anonymous: usize,
    helpers: usize,
}

impl Compiler {
    fn finish(self) -> Grammar {
        Grammar {
            rules: self.rules,
            productions: self.productions,
            terminals: self.terminals,
            ignore: self.ignore,
            rule_index: self.rule_index,
        }
    }

    fn define_terminal(&mut self, name: &str, atoms: &[TerminalAtom]) -> Result<(), FerroError> {
        if self.terminal_index.contains_key(name) {
            return Err(FerroError::grammar(format!(
                "terminal '{}' is defined twice",
                name
            )));
        }
        let source = atoms
            .iter()
            .map(|atom| match atom {
                TerminalAtom::Literal(literal) => regex::escape(literal),
                TerminalAtom::Pattern(pattern) => pattern_source(pattern),
            })
            .collect::<Vec<_>>()
            .join("|");
        let literal = match atoms {
            [TerminalAtom::Literal(literal)] => Some(literal.clone()),
            _ => None,
        };
        let id = self.push_terminal(name.to_string(), &source, literal.clone())?;
        if let Some(literal) = literal {
            self.literal_index.entry(literal).or_insert(id);
        }
        Ok(())
    }

    fn push_terminal(
        &mut self,
        name: String,
        source: &str,
        literal: Option<String>,
    ) -> Result<TerminalId, FerroError> {
        if literal.as_deref() == Some("") {
            return Err(FerroError::grammar(format!(
                "terminal '{}' matches the empty string",
                name
            )));
        }
        let matcher = Regex::new(&format!("^(?:{})", source))
            .map_err(|e| FerroError::grammar(format!("terminal '{}': {}", name, e)))?;
        let id = self.terminals.len();
        self.terminal_index.insert(name.clone(), id);
        self.terminals.push(TerminalDef {
            name,
            matcher,
            literal,
        });
        Ok(id)
    }

    fn declare_rule(&mut self, name: &str, inline_single: bool) -> Result<RuleId, FerroError> {
        if self.rule_index.contains_key(name) {
            return Err(FerroError::grammar(format!(
                "rule '{}' is defined twice",
                name
            )));
        }
        let shape = if name.starts_with('_') {
            Shape::Inline
        } else if inline_single {
            Shape::InlineSingle
        } else {
            Shape::Keep
        };
        let id = self.rules.len();
        self.rules.push(RuleDef {
            name: name.to_string(),
            shape,
            productions: Vec::new(),
        });
        self.rule_index.insert(name.to_string(), id);
        Ok(id)
    }

    fn define_rule(&mut self, name: &str, alternatives: &[Vec<Expr>]) -> Result<(), FerroError> {
        let lhs = self.rule_index[name];
        for alternative in alternatives {
            for rhs in self.expand_sequence(name, alternative)? {
                if rhs.is_empty() {
                    return Err(FerroError::grammar(format!(
                        "rule '{}' can match the empty string",
                        name
                    )));
                }
                self.add_production(lhs, rhs);
            }
        }
        Ok(())
    }

    fn ignore(&mut self, name: &str) -> Result<(), FerroError> {
        let id = *self.terminal_index.get(name).ok_or_else(|| {
            FerroError::grammar(format!("%ignore names unknown terminal '{}'", name))
        })?;
        if !self.ignore.contains(&id) {
            self.ignore.push(id);
        }
        Ok(())
    }

    fn add_production(&mut self, lhs: RuleId, rhs: Vec<Symbol>) {
        let duplicate = self.rules[lhs]
            .productions
            .iter()
            .any(|&p| self.productions[p].rhs == rhs);
        if !duplicate {
            self.rules[lhs].productions.push(self.productions.len());
            self.productions.push(Production { lhs, rhs });
        }
    }

    fn expand_sequence(&mut self, rule: &str, sequence: &[Expr]) -> Result<Expansion, FerroError> {
        let mut result: Expansion = vec![Vec::new()];
        for expr in sequence {
            let expanded = self.expand(rule, expr)?;
            let options = &expanded;
            result = result
                .iter()
                .flat_map(move |prefix| {
                    options.iter().map(move |option| {
                        let mut joined = prefix.clone();
                        joined.extend_from_slice(option);
                        joined
                    })
                })
                .collect();
        }
        Ok(result)
    }

    fn expand_alternatives(
        &mut self,
        rule: &str,
        alternatives: &[Vec<Expr>],
    ) -> Result<Expansion, FerroError> {
        let mut result = Expansion::new();
        for alternative in alternatives {
            result.extend(self.expand_sequence(rule, alternative)?);
        }
        Ok(result)
    }

    fn expand(&mut self, rule: &str, expr: &Expr) -> Result<Expansion, FerroError> {
        match expr {
            Expr::Name(name) => Ok(vec![vec![self.resolve_name(rule, name)?]]),
            Expr::Literal(literal) => {
                let id = self.literal_terminal(literal)?;
                Ok(vec![vec![Symbol::Terminal { id, keep: false }]])
            }
            Expr::Pattern(pattern) => {
                let name = self.anonymous_name();
                let id = self.push_terminal(name, &pattern_source(pattern), None)?;
                Ok(vec![vec![Symbol::Terminal { id, keep: true }]])
            }
            Expr::Group(alternatives) => self.expand_alternatives(rule, alternatives),
            Expr::Optional(alternatives) => {
                let mut expansion = self.expand_alternatives(rule, alternatives)?;
                expansion.push(Vec::new());
                Ok(expansion)
            }
            Expr::Repeat(inner, quantifier) => match quantifier {
                Quantifier::Optional => {
                    let mut expansion = self.expand(rule, inner)?;
                    expansion.push(Vec::new());
                    Ok(expansion)
                }
                Quantifier::OneOrMore => Ok(vec![vec![self.one_or_more(rule, inner)?]]),
                Quantifier::ZeroOrMore => {
                    Ok(vec![vec![self.one_or_more(rule, inner)?], Vec::new()])
                }
            },
        }
    }

    fn resolve_name(&self, rule: &str, name: &str) -> Result<Symbol, FerroError> {
        let symbol = if is_terminal_name(name) {
            self.terminal_index.get(name).map(|&id| Symbol::Terminal {
                id,
                keep: !name.starts_with('_'),
            })
        } else {
            self.rule_index.get(name).map(|&id| Symbol::Rule(id))
        };
        symbol.ok_or_else(|| {
            FerroError::grammar(format!(
                "rule '{}' refers to undefined symbol '{}'",
                rule, name
            ))
        })
    }

    /// Helper rule `h: e | h e`, spliced into its parent.
    fn one_or_more(&mut self, rule: &str, inner: &Expr) -> Result<Symbol, FerroError> {
        let options = self.expand(rule, inner)?;
        if options.iter().any(Vec::is_empty) {
            return Err(FerroError::grammar(format!(
                "rule '{}' repeats an expression that can match the empty string",
                rule
            )));
        }
        let name = format!("__{}_plus_{}", rule.trim_start_matches('_'), self.helpers);
        self.helpers += 1;
        let helper = self.declare_rule(&name, false)?;
        for option in options {
            self.add_production(helper, option.clone());
            let mut recursive = vec![Symbol::Rule(helper)];
            recursive.extend(option);
            self.add_production(helper, recursive);
        }
        Ok(Symbol::Rule(helper))
    }

    fn literal_terminal(&mut self, literal: &str) -> Result<TerminalId, FerroError> {
        if let Some(&id) = self.literal_index.get(literal) {
            return Ok(id);
        }
        let name = match literal_name(literal) {
            Some(name) if !self.terminal_index.contains_key(&name) => name,
            _ => self.anonymous_name(),
        };
        let id = self.push_terminal(name, &regex::escape(literal), Some(literal.to_string()))?;
        self.literal_index.insert(literal.to_string(), id);
        Ok(id)
    }

    fn anonymous_name(&mut self) -> String {
        let name = format!("__ANON_{}", self.anonymous);
        self.anonymous += 1;
        name
    }
}

fn pattern_source(pattern: &Pattern) -> String {
    if pattern.case_insensitive {
        format!("(?i:{})", pattern.source)
    } else {
        format!("(?:{})", pattern.source)
    }
}

#[cfg(test)]
mod tests {
    use super::super::loader::load;
    use super::*;

    fn compile_text(text: &str) -> Result<Grammar, FerroError> {
        compile(load(text)?)
    }

    #[test]
    fn test_optional_expands_to_alternatives() {
        let grammar = compile_text("start: A [B]\nA: \"a\"\nB: \"b\"").unwrap();
        let start = grammar.rule_id("start").unwrap();
        assert_eq!(grammar.productions_of(start).len(), 2);
    }

    #[test]
    fn test_group_cartesian_product() {
        let grammar = compile_text("start: (\"a\" | \"b\") (\"c\" | \"d\")").unwrap();
        let start = grammar.rule_id("start").unwrap();
        assert_eq!(grammar.productions_of(start).len(), 4);
    }

    #[test]
    fn test_one_or_more_helper() {
        let grammar = compile_text("start: item+\nitem: \"x\"").unwrap();
        let helper = grammar
            .rules
            .iter()
            .find(|rule| rule.name.starts_with("__"))
            .unwrap();
        assert_eq!(helper.shape, Shape::Inline);
        assert_eq!(helper.productions.len(), 2);
    }

    #[test]
    fn test_literal_reuses_named_terminal() {
        let grammar = compile_text("start: \"inv\" X\nX: \"x\"\nINVERTED: \"inv\"").unwrap();
        let names: Vec<_> = grammar.terminal_names().collect();
        assert_eq!(names, vec!["X", "INVERTED"]);
        let start = grammar.rule_id("start").unwrap();
        let production = &grammar.productions[grammar.productions_of(start)[0]];
        assert_eq!(
            production.rhs[0],
            Symbol::Terminal { id: 1, keep: false }
        );
        assert_eq!(production.rhs[1], Symbol::Terminal { id: 0, keep: true });
    }

    #[test]
    fn test_rule_shapes() {
        let grammar = compile_text("start: _inner | maybe\n_inner: \"a\"\n?maybe: \"b\"").unwrap();
        let shape = |name: &str| grammar.rules[grammar.rule_id(name).unwrap()].shape;
        assert_eq!(shape("start"), Shape::Keep);
        assert_eq!(shape("_inner"), Shape::Inline);
        assert_eq!(shape("maybe"), Shape::InlineSingle);
    }

    #[test]
    fn test_empty_production_is_rejected() {
        let err = compile_text("start: [A]\nA: \"a\"").unwrap_err();
        assert!(err.to_string().contains("empty string"));

        let err = compile_text("start: (A?)+\nA: \"a\"").unwrap_err();
        assert!(err.to_string().contains("empty string"));
    }

    #[test]
    fn test_undefined_symbol() {
        let err = compile_text("start: missing").unwrap_err();
        assert!(err.to_string().contains("undefined symbol 'missing'"));
    }

    #[test]
    fn test_duplicate_definitions() {
        assert!(compile_text("a: \"x\"\na: \"y\"").is_err());
        assert!(compile_text("A: \"x\"\nA: \"y\"").is_err());
    }

    #[test]
    fn test_ignore_unknown_terminal() {
        let err = compile_text("start: \"a\"\n%ignore WS").unwrap_err();
        assert!(err.to_string().contains("WS"));
    }

    #[test]
    fn test_case_insensitive_pattern() {
        let grammar = compile_text("start: WORD\nWORD: /abc/i").unwrap();
        assert_eq!(grammar.match_terminal(0, "ABCd", 0), Some(3));
    }
}
