//! Build a shaped derivation forest from a recognized chart.
//!
//! Each grammar symbol over a span yields a list of *splices*: the
//! sequences of nodes it contributes to its parent. A kept rule always
//! contributes exactly one node, either a rule node or an ambiguity node
//! over its distinct derivations; inlined rules pass their children (and
//! their alternatives) through to the parent.
//!
//! Productions are split from the right, using the positions where their
//! last symbol can start. Repetition helpers are left-recursive, so a
//! flat list of `n` items is walked in `O(n)` steps, and the splices of
//! consecutive list prefixes share their nodes.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use super::earley::Chart;
use super::{Budget, Grammar, RuleId, Shape, Symbol, TerminalId};
use crate::error::FerroError;
use crate::tree::Derivation;

/// Nodes contributed to a parent, stored last node first
#[derive(Debug, Clone, Default)]
struct Splice(Option<Rc<Link>>);

#[derive(Debug)]
struct Link {
    node: Derivation,
    before: Splice,
    len: usize,
    fingerprint: u64,
}

impl Drop for Link {
    // long lists would otherwise drop recursively
    fn drop(&mut self) {
        let mut before = self.before.0.take();
        while let Some(link) = before {
            match Rc::try_unwrap(link) {
                Ok(mut inner) => before = inner.before.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl Splice {
    fn len(&self) -> usize {
        self.0.as_ref().map_or(0, |link| link.len)
    }

    fn fingerprint(&self) -> u64 {
        self.0.as_ref().map_or(0, |link| link.fingerprint)
    }

    fn push(&self, node: Derivation) -> Splice {
        let mut hasher = DefaultHasher::new();
        self.fingerprint().hash(&mut hasher);
        node.hash(&mut hasher);
        Splice(Some(Rc::new(Link {
            fingerprint: hasher.finish(),
            len: self.len() + 1,
            before: self.clone(),
            node,
        })))
    }

    fn extend(&self, tail: &Splice) -> Splice {
        if self.0.is_none() {
            return tail.clone();
        }
        tail.to_vec()
            .into_iter()
            .fold(self.clone(), |splice, node| splice.push(node))
    }

    fn single(&self) -> Option<&Derivation> {
        match &self.0 {
            Some(link) if link.len == 1 => Some(&link.node),
            _ => None,
        }
    }

    fn to_vec(&self) -> Vec<Derivation> {
        let mut nodes = Vec::with_capacity(self.len());
        let mut cursor = self.0.as_ref();
        while let Some(link) = cursor {
            nodes.push(link.node.clone());
            cursor = link.before.0.as_ref();
        }
        nodes.reverse();
        nodes
    }
}

impl PartialEq for Splice {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() || self.fingerprint() != other.fingerprint() {
            return false;
        }
        let (mut left, mut right) = (self.0.as_ref(), other.0.as_ref());
        while let (Some(a), Some(b)) = (left, right) {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            if a.node != b.node {
                return false;
            }
            left = a.before.0.as_ref();
            right = b.before.0.as_ref();
        }
        true
    }
}

type Splices = Rc<Vec<Splice>>;

pub(crate) fn build(
    grammar: &Grammar,
    input: &str,
    chart: &Chart,
    budget: &Budget,
) -> Result<Derivation, FerroError> {
    let mut builder = ForestBuilder::new(grammar, input, chart, budget);
    let splices = builder.rule(chart.start, chart.begin, chart.end)?;
    let name = &grammar.rules[chart.start].name;
    let mut roots: Vec<Derivation> = Vec::new();
    for splice in splices.iter() {
        let root = match splice.single() {
            Some(single) => single.clone(),
            None => Derivation::rule(name.clone(), splice.to_vec()),
        };
        push_unique(&mut roots, root);
    }
    match roots.len() {
        0 => Err(FerroError::grammar(format!(
            "no derivation of rule '{}' over the accepted input",
            name
        ))),
        1 => Ok(roots.remove(0)),
        _ => Ok(Derivation::Ambig { candidates: roots }),
    }
}

struct ForestBuilder<'a> {
    grammar: &'a Grammar,
    input: &'a str,
    chart: &'a Chart,
    budget: &'a Budget,
    /// `(rule, end)` to the sorted start positions of completed rules
    rule_starts: HashMap<(RuleId, usize), Vec<usize>>,
    /// `(terminal, end)` to the sorted columns where a token was scanned
    token_starts: HashMap<(TerminalId, usize), Vec<usize>>,
    symbols: HashMap<(Symbol, usize, usize), Splices>,
    sequences: HashMap<(usize, usize, usize, usize), Splices>,
    active: HashSet<(RuleId, usize, usize)>,
}

impl<'a> ForestBuilder<'a> {
    fn new(grammar: &'a Grammar, input: &'a str, chart: &'a Chart, budget: &'a Budget) -> Self {
        let mut rule_starts: HashMap<(RuleId, usize), Vec<usize>> = HashMap::new();
        for &(rule, from, to) in &chart.completed {
            rule_starts.entry((rule, to)).or_default().push(from);
        }
        let mut token_starts: HashMap<(TerminalId, usize), Vec<usize>> = HashMap::new();
        for &(terminal, from, to) in chart.tokens.keys() {
            token_starts.entry((terminal, to)).or_default().push(from);
        }
        for starts in rule_starts.values_mut().chain(token_starts.values_mut()) {
            starts.sort_unstable();
        }
        ForestBuilder {
            grammar,
            input,
            chart,
            budget,
            rule_starts,
            token_starts,
            symbols: HashMap::new(),
            sequences: HashMap::new(),
            active: HashSet::new(),
        }
    }

    fn symbol(&mut self, symbol: Symbol, from: usize, to: usize) -> Result<Splices, FerroError> {
        match symbol {
            Symbol::Terminal { id, keep } => {
                let Some(&text_start) = self.chart.tokens.get(&(id, from, to)) else {
                    return Ok(Rc::new(Vec::new()));
                };
                let splice = if keep {
                    Splice::default().push(Derivation::token(
                        self.grammar.terminals[id].name.clone(),
                        &self.input[text_start..to],
                    ))
                } else {
                    Splice::default()
                };
                Ok(Rc::new(vec![splice]))
            }
            Symbol::Rule(rule) => self.rule(rule, from, to),
        }
    }

    fn rule(&mut self, rule: RuleId, from: usize, to: usize) -> Result<Splices, FerroError> {
        let grammar = self.grammar;
        let key = (Symbol::Rule(rule), from, to);
        if let Some(done) = self.symbols.get(&key) {
            return Ok(Rc::clone(done));
        }
        if !self.chart.completed.contains(&(rule, from, to)) || !self.active.insert((rule, from, to)) {
            return Ok(Rc::new(Vec::new()));
        }
        self.budget.check()?;

        let mut alternatives: Vec<Splice> = Vec::new();
        for &production in grammar.productions_of(rule) {
            let length = grammar.productions[production].rhs.len();
            for splice in self.sequence(production, length, from, to)?.iter() {
                push_unique(&mut alternatives, splice.clone());
            }
        }
        self.active.remove(&(rule, from, to));

        let definition = &grammar.rules[rule];
        let shaped = match definition.shape {
            Shape::Inline => alternatives,
            Shape::Keep | Shape::InlineSingle => {
                let mut nodes: Vec<Derivation> = Vec::new();
                for children in alternatives {
                    let node = match (definition.shape, children.single()) {
                        (Shape::InlineSingle, Some(single)) => single.clone(),
                        _ => Derivation::rule(definition.name.clone(), children.to_vec()),
                    };
                    push_unique(&mut nodes, node);
                }
                match nodes.len() {
                    0 => Vec::new(),
                    1 => vec![Splice::default().push(nodes.remove(0))],
                    _ => vec![Splice::default().push(Derivation::Ambig { candidates: nodes })],
                }
            }
        };
        let shaped = Rc::new(shaped);
        self.symbols.insert(key, Rc::clone(&shaped));
        Ok(shaped)
    }

    /// Derivations of `rhs[..end]` of a production over `from..to`
    fn sequence(
        &mut self,
        production: usize,
        end: usize,
        from: usize,
        to: usize,
    ) -> Result<Splices, FerroError> {
        let key = (production, end, from, to);
        if let Some(done) = self.sequences.get(&key) {
            return Ok(Rc::clone(done));
        }
        let last = self.grammar.productions[production].rhs[end - 1];
        if end == 1 {
            let splices = self.symbol(last, from, to)?;
            self.sequences.insert(key, Rc::clone(&splices));
            return Ok(splices);
        }

        // every earlier symbol covers at least one character
        let earliest = from + end - 1;
        let splits: Vec<usize> = self
            .starts(last, to)
            .iter()
            .copied()
            .filter(|&split| split >= earliest && split < to)
            .collect();
        let mut splices: Vec<Splice> = Vec::new();
        for split in splits {
            let heads = self.sequence(production, end - 1, from, split)?;
            if heads.is_empty() {
                continue;
            }
            let tails = self.symbol(last, split, to)?;
            for prefix in heads.iter() {
                for tail in tails.iter() {
                    push_unique(&mut splices, prefix.extend(tail));
                }
            }
        }
        let splices = Rc::new(splices);
        self.sequences.insert(key, Rc::clone(&splices));
        Ok(splices)
    }

    /// Start positions of `symbol` spans ending at `to`
    fn starts(&self, symbol: Symbol, to: usize) -> &[usize] {
        let starts = match symbol {
            Symbol::Terminal { id, .. } => self.token_starts.get(&(id, to)),
            Symbol::Rule(rule) => self.rule_starts.get(&(rule, to)),
        };
        starts.map_or(&[], Vec::as_slice)
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(grammar: &str, input: &str) -> Derivation {
        Grammar::from_text(grammar)
            .unwrap()
            .parse(input, "start", None)
            .unwrap()
    }

    #[test]
    fn test_literals_are_filtered() {
        let tree = parse("start: NUMBER \"del\"\nNUMBER: /\\d+/", "10del");
        assert_eq!(tree.to_string(), r#"(start NUMBER:"10")"#);
    }

    #[test]
    fn test_inline_rules_are_spliced() {
        let tree = parse(
            "start: _pos \"_\" _pos\n_pos: NUMBER | UNKNOWN\nNUMBER: /\\d+/\nUNKNOWN: \"?\"",
            "?_5",
        );
        assert_eq!(tree.to_string(), r#"(start UNKNOWN:"?" NUMBER:"5")"#);
    }

    #[test]
    fn test_inline_single() {
        let grammar = "start: wrap \"/\" wrap\n?wrap: NUMBER | NUMBER \"-\" NUMBER\nNUMBER: /\\d+/";
        let tree = parse(grammar, "1/2-3");
        assert_eq!(
            tree.to_string(),
            r#"(start NUMBER:"1" (wrap NUMBER:"2" NUMBER:"3"))"#
        );
    }

    #[test]
    fn test_repetition_flattens() {
        let tree = parse("start: item+\nitem: LETTER\nLETTER: /[a-z]/", "abc");
        assert_eq!(tree.children().len(), 3);
        assert!(tree.children().iter().all(|child| child.is_rule("item")));
    }

    #[test]
    fn test_long_separated_list() {
        let grammar = "start: \"[\" item (\";\" item)* \"]\"\nitem: NUMBER\nNUMBER: /\\d+/";
        let input = format!(
            "[{}]",
            (1..=2000).map(|i| i.to_string()).collect::<Vec<_>>().join(";")
        );
        let tree = parse(grammar, &input);
        assert_eq!(tree.children().len(), 2000);
        assert_eq!(tree.children()[1999].to_string(), r#"(item NUMBER:"2000")"#);
    }

    #[test]
    fn test_ambiguity_node() {
        let grammar = "start: thing\nthing: count | place\ncount: NUMBER\nplace: NUMBER\nNUMBER: /\\d+/";
        let tree = parse(grammar, "7");
        let thing = &tree.children()[0];
        match thing {
            Derivation::Ambig { candidates } => {
                assert_eq!(candidates.len(), 2);
                assert!(candidates.iter().all(|c| c.is_rule("thing")));
                assert!(candidates[0].child_rule("count").is_some());
                assert!(candidates[1].child_rule("place").is_some());
            }
            other => panic!("expected an ambiguity node, got {}", other),
        }
    }

    #[test]
    fn test_token_text_excludes_whitespace() {
        let tree = parse(
            "start: NUMBER \"_\" NUMBER\nNUMBER: /\\d+/\nWS: /\\s+/\n%ignore WS",
            " 1 _ 2 ",
        );
        assert_eq!(tree.to_string(), r#"(start NUMBER:"1" NUMBER:"2")"#);
    }

    #[test]
    fn test_splice_equality_ignores_sharing() {
        let a = Splice::default().push(Derivation::token("N", "1"));
        let b = Splice::default().push(Derivation::token("N", "1"));
        assert_eq!(a.push(Derivation::token("N", "2")), b.push(Derivation::token("N", "2")));
        assert_ne!(a.push(Derivation::token("N", "2")), b);
        assert_eq!(a.extend(&b).to_vec().len(), 2);
    }
}
