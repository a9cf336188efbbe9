//! Derivation trees produced by the grammar engine.
//!
//! A [`Derivation`] is either a token, a rule node, or (before
//! disambiguation) an ambiguity node holding several candidate
//! derivations of the same input span.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of a derivation tree or parse forest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum Derivation {
    /// A terminal: its kind (e.g. `NUMBER`) and the matched text
    Token { kind: String, text: String },
    /// A grammar rule with ordered children
    Rule {
        name: String,
        children: Vec<Derivation>,
    },
    /// Two or more equally valid derivations of the same span
    Ambig { candidates: Vec<Derivation> },
}

impl Derivation {
    /// Create a token node
    pub fn token(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Derivation::Token {
            kind: kind.into(),
            text: text.into(),
        }
    }

    /// Create a rule node
    pub fn rule(name: impl Into<String>, children: Vec<Derivation>) -> Self {
        Derivation::Rule {
            name: name.into(),
            children,
        }
    }

    /// Rule name of a rule node
    pub fn rule_name(&self) -> Option<&str> {
        match self {
            Derivation::Rule { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Token kind of a token node
    pub fn token_kind(&self) -> Option<&str> {
        match self {
            Derivation::Token { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// Check whether this is a rule node with the given name
    pub fn is_rule(&self, rule: &str) -> bool {
        self.rule_name() == Some(rule)
    }

    /// Children of a rule node (empty for tokens and ambiguity nodes)
    pub fn children(&self) -> &[Derivation] {
        match self {
            Derivation::Rule { children, .. } => children,
            _ => &[],
        }
    }

    /// Follow a fixed path of child indices
    pub fn at(&self, path: &[usize]) -> Option<&Derivation> {
        path.iter()
            .try_fold(self, |node, &index| node.children().get(index))
    }

    /// First direct child that is a rule node with the given name
    pub fn child_rule(&self, rule: &str) -> Option<&Derivation> {
        self.children().iter().find(|child| child.is_rule(rule))
    }

    /// Whether any ambiguity node remains in the tree
    pub fn is_ambiguous(&self) -> bool {
        match self {
            Derivation::Token { .. } => false,
            Derivation::Rule { children, .. } => children.iter().any(Derivation::is_ambiguous),
            Derivation::Ambig { .. } => true,
        }
    }

    /// Number of nodes in the tree, counting tokens
    pub fn size(&self) -> usize {
        match self {
            Derivation::Token { .. } => 1,
            Derivation::Rule { children, .. } => {
                1 + children.iter().map(Derivation::size).sum::<usize>()
            }
            Derivation::Ambig { candidates } => {
                1 + candidates.iter().map(Derivation::size).sum::<usize>()
            }
        }
    }

    /// Concatenated token text covered by this node
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Derivation::Token { text, .. } => out.push_str(text),
            Derivation::Rule { children, .. } => {
                children.iter().for_each(|child| child.collect_text(out))
            }
            Derivation::Ambig { candidates } => {
                if let Some(first) = candidates.first() {
                    first.collect_text(out);
                }
            }
        }
    }

    /// Indented multi-line rendering, one node per line
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.write_pretty(&mut out, 0);
        out
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        match self {
            Derivation::Token { kind, text } => {
                out.push_str(&format!("{}{}\t{:?}\n", indent, kind, text));
            }
            Derivation::Rule { name, children } => {
                out.push_str(&format!("{}{}\n", indent, name));
                for child in children {
                    child.write_pretty(out, depth + 1);
                }
            }
            Derivation::Ambig { candidates } => {
                out.push_str(&format!("{}_ambig\n", indent));
                for candidate in candidates {
                    candidate.write_pretty(out, depth + 1);
                }
            }
        }
    }
}

impl fmt::Display for Derivation {
    /// Compact s-expression form, e.g. `(point NUMBER:"10")`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Derivation::Token { kind, text } => write!(f, "{}:{:?}", kind, text),
            Derivation::Rule { name, children } => {
                write!(f, "({}", name)?;
                for child in children {
                    write!(f, " {}", child)?;
                }
                write!(f, ")")
            }
            Derivation::Ambig { candidates } => {
                write!(f, "(_ambig")?;
                for candidate in candidates {
                    write!(f, " {}", candidate)?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(n: &str) -> Derivation {
        Derivation::rule("point", vec![Derivation::token("NUMBER", n)])
    }

    #[test]
    fn test_display_compact() {
        assert_eq!(point("10").to_string(), r#"(point NUMBER:"10")"#);
    }

    #[test]
    fn test_at_follows_path() {
        let tree = Derivation::rule("location", vec![point("10")]);
        assert_eq!(tree.at(&[0, 0]), Some(&Derivation::token("NUMBER", "10")));
        assert_eq!(tree.at(&[1]), None);
        assert_eq!(tree.at(&[]), Some(&tree));
    }

    #[test]
    fn test_is_ambiguous() {
        let resolved = Derivation::rule("location", vec![point("10")]);
        assert!(!resolved.is_ambiguous());

        let ambiguous = Derivation::rule(
            "insert",
            vec![Derivation::Ambig {
                candidates: vec![point("1"), point("2")],
            }],
        );
        assert!(ambiguous.is_ambiguous());
    }

    #[test]
    fn test_text_and_size() {
        let tree = Derivation::rule(
            "range",
            vec![point("10"), Derivation::token("NUMBER", "20")],
        );
        assert_eq!(tree.text(), "1020");
        assert_eq!(tree.size(), 4);
    }

    #[test]
    fn test_pretty() {
        let tree = Derivation::rule("location", vec![point("7")]);
        assert_eq!(tree.pretty(), "location\n  point\n    NUMBER\t\"7\"\n");
    }

    #[test]
    fn test_serde_tagging() {
        let json = serde_json::to_string(&Derivation::token("NUMBER", "1")).unwrap();
        assert_eq!(json, r#"{"node":"token","kind":"NUMBER","text":"1"}"#);
    }
}
