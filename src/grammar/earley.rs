//! Earley recognizer with a dynamic lexer.
//!
//! Terminals are not tokenized up front: at each chart column the
//! recognizer tries only the terminals some item is waiting for, taking
//! the longest leftmost-first match of each. Ignored terminals (usually
//! whitespace) may precede any token; the token then spans from the
//! column where it was expected.
//!
//! Grammars never contain nullable rules, so every completed item spans
//! at least one character and completion never has to look at the
//! current column.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::{Budget, Grammar, RuleId, Symbol, TerminalId};
use crate::error::FerroError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Item {
    production: usize,
    dot: usize,
    origin: usize,
}

impl Item {
    fn advance(self) -> Self {
        Item {
            dot: self.dot + 1,
            ..self
        }
    }
}

#[derive(Debug, Default)]
struct Column {
    items: Vec<Item>,
    seen: HashSet<Item>,
    predicted: HashSet<RuleId>,
    waiting_rule: HashMap<RuleId, Vec<Item>>,
    waiting_terminal: BTreeMap<TerminalId, Vec<Item>>,
}

impl Column {
    fn add(&mut self, item: Item) {
        if self.seen.insert(item) {
            self.items.push(item);
        }
    }
}

/// Result of a successful recognition
#[derive(Debug)]
pub(crate) struct Chart {
    /// `(rule, start, end)` for every completed rule
    pub completed: HashSet<(RuleId, usize, usize)>,
    /// `(terminal, column, end)` to the byte offset where the token text starts
    pub tokens: HashMap<(TerminalId, usize, usize), usize>,
    pub start: RuleId,
    pub begin: usize,
    pub end: usize,
}

/// Run the recognizer over `input` from `start`.
pub(crate) fn recognize(
    grammar: &Grammar,
    input: &str,
    start: RuleId,
    budget: &Budget,
) -> Result<Chart, FerroError> {
    let len = input.len();
    let begin = grammar.skip_ignored(input, 0);

    let mut columns: Vec<Column> = (0..=len).map(|_| Column::default()).collect();
    let mut completed = HashSet::new();
    let mut tokens = HashMap::new();

    for &production in grammar.productions_of(start) {
        columns[begin].add(Item {
            production,
            dot: 0,
            origin: begin,
        });
    }
    columns[begin].predicted.insert(start);

    for i in begin..=len {
        if columns[i].items.is_empty() {
            continue;
        }
        budget.check()?;

        let mut k = 0;
        while k < columns[i].items.len() {
            let item = columns[i].items[k];
            k += 1;
            let rhs = &grammar.productions[item.production].rhs;
            match rhs.get(item.dot) {
                None => {
                    let lhs = grammar.productions[item.production].lhs;
                    completed.insert((lhs, item.origin, i));
                    let parents = columns[item.origin]
                        .waiting_rule
                        .get(&lhs)
                        .cloned()
                        .unwrap_or_default();
                    for parent in parents {
                        columns[i].add(parent.advance());
                    }
                }
                Some(Symbol::Rule(rule)) => {
                    let column = &mut columns[i];
                    column.waiting_rule.entry(*rule).or_default().push(item);
                    if column.predicted.insert(*rule) {
                        for &production in grammar.productions_of(*rule) {
                            column.add(Item {
                                production,
                                dot: 0,
                                origin: i,
                            });
                        }
                    }
                }
                Some(Symbol::Terminal { id, .. }) => {
                    columns[i]
                        .waiting_terminal
                        .entry(*id)
                        .or_default()
                        .push(item);
                }
            }
        }

        let skipped = grammar.skip_ignored(input, i);
        let mut scanned = Vec::new();
        for (&terminal, waiting) in &columns[i].waiting_terminal {
            let mut starts = vec![i];
            if skipped != i {
                starts.push(skipped);
            }
            for from in starts {
                if let Some(matched) = grammar.match_terminal(terminal, input, from) {
                    let to = from + matched;
                    tokens.entry((terminal, i, to)).or_insert(from);
                    scanned.extend(waiting.iter().map(|item| (to, item.advance())));
                }
            }
        }
        for (to, item) in scanned {
            columns[to].add(item);
        }
    }

    log::trace!(
        "earley: {} columns, {} items, {} completions",
        columns.iter().filter(|column| !column.items.is_empty()).count(),
        columns.iter().map(|column| column.items.len()).sum::<usize>(),
        completed.len()
    );

    let accepted = (begin..=len)
        .rev()
        .find(|&end| completed.contains(&(start, begin, end)) && grammar.skip_ignored(input, end) == len);

    match accepted {
        Some(end) => Ok(Chart {
            completed,
            tokens,
            start,
            begin,
            end,
        }),
        None => Err(syntax_error(grammar, input, &columns)),
    }
}

/// Error at the furthest column the recognizer reached
fn syntax_error(grammar: &Grammar, input: &str, columns: &[Column]) -> FerroError {
    let furthest = columns
        .iter()
        .rposition(|column| !column.items.is_empty())
        .unwrap_or(0);
    // a column where every item is complete expects nothing further, so
    // report what the last column still waiting for a token accepted
    let expecting = columns[..=furthest]
        .iter()
        .rposition(|column| !column.waiting_terminal.is_empty())
        .unwrap_or(furthest);
    let mut allowed: Vec<String> = columns[expecting]
        .waiting_terminal
        .keys()
        .map(|&terminal| grammar.terminals[terminal].name.clone())
        .collect();
    allowed.sort();
    allowed.dedup();

    let pos = grammar.skip_ignored(input, furthest);
    match input[pos..].chars().next() {
        Some(character) => FerroError::UnexpectedCharacter {
            pos,
            character,
            allowed,
            input: input.to_string(),
        },
        None => FerroError::UnexpectedEnd {
            pos,
            allowed,
            input: input.to_string(),
        },
    }
}
