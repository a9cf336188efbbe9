//! Ambiguity resolution
//!
//! The grammar admits several derivations for some descriptions (a bare
//! number may be a length or a location, `Gln18[23]` may be a repeat or a
//! substitution, ...). The resolver walks the forest bottom-up and replaces
//! each ambiguity node with one candidate, chosen by the first rule of
//! [`RULES`] that recognizes the shape of the candidates. When no rule
//! applies the parse fails instead of guessing.
//!
//! Nucleotide and protein rules are compared by their shared name, so
//! `p_insert` is matched as `insert`.

use crate::error::FerroError;
use crate::tree::Derivation;

/// A structural tie-break between ambiguity candidates
pub struct DisambiguationRule {
    /// Name used in diagnostics
    pub name: &'static str,
    /// Index of the winning candidate when the rule applies
    pub select: fn(&[Derivation]) -> Option<usize>,
}

/// Tie-break rules, in priority order
pub const RULES: &[DisambiguationRule] = &[
    DisambiguationRule {
        name: "nucleotide_over_protein",
        select: nucleotide_over_protein,
    },
    DisambiguationRule {
        name: "length_over_location",
        select: length_over_location,
    },
    DisambiguationRule {
        name: "repeat_or_substitution",
        select: repeat_or_substitution,
    },
    DisambiguationRule {
        name: "sequence_over_reference",
        select: sequence_over_reference,
    },
    DisambiguationRule {
        name: "inverted_reference_over_inversion",
        select: inverted_reference_over_inversion,
    },
];

/// Replace every ambiguity node in `tree` with a single candidate.
///
/// Trees without ambiguity nodes are returned unchanged.
///
/// # Example
///
/// ```
/// use ferro_hgvs_grammar::hgvs::resolve::resolve;
/// use ferro_hgvs_grammar::Derivation;
///
/// let point = Derivation::rule("point", vec![Derivation::token("NUMBER", "10")]);
/// let insert = |child: Derivation| Derivation::rule("insert", vec![child]);
/// let forest = Derivation::Ambig {
///     candidates: vec![
///         insert(Derivation::rule("location", vec![point])),
///         insert(Derivation::rule("length", vec![Derivation::token("NUMBER", "10")])),
///     ],
/// };
/// let resolved = resolve(forest).unwrap();
/// assert!(resolved.child_rule("length").is_some());
/// ```
pub fn resolve(tree: Derivation) -> Result<Derivation, FerroError> {
    match tree {
        Derivation::Token { .. } => Ok(tree),
        Derivation::Rule { name, children } => Ok(Derivation::Rule {
            name,
            children: children
                .into_iter()
                .map(resolve)
                .collect::<Result<Vec<_>, _>>()?,
        }),
        Derivation::Ambig { candidates } => {
            let mut resolved: Vec<Derivation> = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                let candidate = resolve(candidate)?;
                if !resolved.contains(&candidate) {
                    resolved.push(candidate);
                }
            }
            if resolved.len() == 1 {
                return Ok(resolved.remove(0));
            }
            let rule = resolved
                .first()
                .and_then(Derivation::rule_name)
                .unwrap_or("?")
                .to_string();
            for disambiguation in RULES {
                if let Some(index) = (disambiguation.select)(&resolved) {
                    log::debug!(
                        "ambiguity in '{}' ({} candidates) resolved by {}",
                        rule,
                        resolved.len(),
                        disambiguation.name
                    );
                    return Ok(resolved.swap_remove(index));
                }
            }
            Err(FerroError::UnresolvedAmbiguity {
                rule,
                candidates: resolved,
                input: String::new(),
            })
        }
    }
}

/// Rule name without the protein `p_` prefix
fn base_name(node: &Derivation) -> Option<&str> {
    node.rule_name()
        .map(|name| name.strip_prefix("p_").unwrap_or(name))
}

fn all_named(candidates: &[Derivation], name: &str) -> bool {
    candidates.iter().all(|c| base_name(c) == Some(name))
}

/// Whether some direct child has the given shared rule name
fn has_child(node: &Derivation, name: &str) -> bool {
    node.children().iter().any(|c| base_name(c) == Some(name))
}

fn only_index(candidates: &[Derivation], predicate: impl Fn(&Derivation) -> bool) -> Option<usize> {
    let mut matching = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| predicate(c))
        .map(|(i, _)| i);
    match (matching.next(), matching.next()) {
        (Some(index), None) => Some(index),
        _ => None,
    }
}

/// `NP_1.1:p.=` reads as both; the nucleotide reading wins.
fn nucleotide_over_protein(candidates: &[Derivation]) -> Option<usize> {
    if candidates.len() != 2 || !all_named(candidates, "description") {
        return None;
    }
    let first = |c: &Derivation| c.at(&[0]).and_then(Derivation::rule_name).map(str::to_string);
    let kinds: Vec<_> = candidates.iter().map(first).collect();
    let dna = kinds
        .iter()
        .position(|k| k.as_deref() == Some("description_dna"))?;
    let protein = kinds
        .iter()
        .position(|k| k.as_deref() == Some("description_protein"))?;
    (dna != protein).then_some(dna)
}

/// `ins10`: a bare count is a length, not a location.
fn length_over_location(candidates: &[Derivation]) -> Option<usize> {
    if candidates.len() != 2 || !all_named(candidates, "insert") {
        return None;
    }
    let head = |c: &Derivation| c.at(&[0]).and_then(base_name).map(str::to_string);
    let length = candidates
        .iter()
        .position(|c| head(c).as_deref() == Some("length"))?;
    let location = candidates
        .iter()
        .position(|c| head(c).as_deref() == Some("location"))?;
    (length != location).then_some(length)
}

/// `Gln18[23]`: a repeat, unless the substitution inserts more than a count.
fn repeat_or_substitution(candidates: &[Derivation]) -> Option<usize> {
    if candidates.len() != 2 || !all_named(candidates, "variant") {
        return None;
    }
    let repeat = only_index(candidates, |c| has_child(c, "repeat"))?;
    let substitution = only_index(candidates, |c| has_child(c, "substitution"))?;
    if repeat == substitution {
        return None;
    }
    let inserted = candidates[substitution]
        .children()
        .iter()
        .find(|c| base_name(c) == Some("substitution"))
        .and_then(|s| s.children().iter().find(|c| base_name(c) == Some("inserted")))?;
    let bare_count = match inserted.children() {
        [insert] => {
            base_name(insert) == Some("insert")
                && matches!(insert.children(), [only] if base_name(only) == Some("length"))
        }
        _ => false,
    };
    Some(if bare_count { repeat } else { substitution })
}

/// `insA`: a sequence, not a reference named `A` inserted whole.
fn sequence_over_reference(candidates: &[Derivation]) -> Option<usize> {
    if candidates.len() != 2 || !all_named(candidates, "insert") {
        return None;
    }
    let sequence = only_index(candidates, |c| {
        matches!(c.children(), [only] if only.token_kind() == Some("SEQUENCE"))
    })?;
    let reference = only_index(candidates, |c| {
        matches!(c.children(), [only] if base_name(only) == Some("reference_location"))
    })?;
    (sequence != reference).then_some(sequence)
}

/// `insNM_1.1:c.10_20inv`: inverted nested material, not a nested inversion.
fn inverted_reference_over_inversion(candidates: &[Derivation]) -> Option<usize> {
    if candidates.len() != 2 || !all_named(candidates, "insert") {
        return None;
    }
    let inverted = only_index(candidates, |c| {
        matches!(c.children(), [nested, flag]
            if base_name(nested) == Some("reference_location")
                && flag.token_kind() == Some("INVERTED"))
    })?;
    let inversion = only_index(candidates, |c| {
        matches!(c.children(), [nested]
            if nested.child_rule("variant").is_some_and(|v| has_child(v, "inversion")))
    })?;
    (inverted != inversion).then_some(inverted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn token(kind: &str, text: &str) -> Derivation {
        Derivation::token(kind, text)
    }

    fn rule(name: &str, children: Vec<Derivation>) -> Derivation {
        Derivation::rule(name, children)
    }

    fn point(n: &str) -> Derivation {
        rule("point", vec![token("NUMBER", n)])
    }

    fn length(n: &str) -> Derivation {
        rule("length", vec![token("NUMBER", n)])
    }

    fn ambig(candidates: Vec<Derivation>) -> Derivation {
        Derivation::Ambig { candidates }
    }

    #[rstest]
    #[case::nucleotide("insert", "length")]
    #[case::protein("p_insert", "p_length")]
    fn test_length_over_location(#[case] insert: &str, #[case] expected: &str) {
        let location = if insert.starts_with("p_") { "p_location" } else { "location" };
        let length_name = expected;
        let forest = ambig(vec![
            rule(insert, vec![rule(location, vec![point("10")])]),
            rule(insert, vec![rule(length_name, vec![token("NUMBER", "10")])]),
        ]);
        let resolved = resolve(forest).unwrap();
        assert!(resolved.child_rule(expected).is_some());
    }

    #[test]
    fn test_nucleotide_over_protein() {
        let forest = ambig(vec![
            rule("description", vec![rule("description_protein", vec![])]),
            rule("description", vec![rule("description_dna", vec![])]),
        ]);
        let resolved = resolve(forest).unwrap();
        assert!(resolved.child_rule("description_dna").is_some());
    }

    fn protein_variant(edit: Derivation) -> Derivation {
        rule(
            "p_variant",
            vec![
                rule("p_location", vec![rule("p_point", vec![token("AA", "Gln"), token("NUMBER", "18")])]),
                edit,
            ],
        )
    }

    #[test]
    fn test_repeat_wins_over_bare_count_substitution() {
        let repeat = protein_variant(rule(
            "p_repeat",
            vec![rule("p_repeat_number", vec![rule("p_length", vec![token("NUMBER", "23")])])],
        ));
        let substitution = protein_variant(rule(
            "p_substitution",
            vec![rule(
                "p_inserted",
                vec![rule("p_insert", vec![rule("p_length", vec![token("NUMBER", "23")])])],
            )],
        ));
        let resolved = resolve(ambig(vec![substitution, repeat.clone()])).unwrap();
        assert_eq!(resolved, repeat);
    }

    #[test]
    fn test_substitution_wins_otherwise() {
        let repeat = protein_variant(rule(
            "p_repeat",
            vec![rule("p_repeat_number", vec![rule("p_length", vec![token("NUMBER", "2")])])],
        ));
        let substitution = protein_variant(rule(
            "p_substitution",
            vec![rule(
                "p_inserted",
                vec![
                    rule("p_insert", vec![rule("p_length", vec![token("NUMBER", "2")])]),
                    rule("p_insert", vec![token("P_SEQUENCE", "Cys")]),
                ],
            )],
        ));
        let resolved = resolve(ambig(vec![repeat, substitution.clone()])).unwrap();
        assert_eq!(resolved, substitution);
    }

    fn nested(entry: Derivation) -> Derivation {
        rule(
            "reference_location",
            vec![
                rule("reference", vec![token("ACCESSION", "NM_1"), token("VERSION", "1")]),
                token("COORDINATE_SYSTEM", "c"),
                entry,
            ],
        )
    }

    #[test]
    fn test_sequence_over_reference() {
        let sequence = rule("insert", vec![token("SEQUENCE", "A")]);
        let reference = rule(
            "insert",
            vec![rule(
                "reference_location",
                vec![rule("reference", vec![token("ACCESSION", "A")])],
            )],
        );
        let resolved = resolve(ambig(vec![reference, sequence.clone()])).unwrap();
        assert_eq!(resolved, sequence);
    }

    #[test]
    fn test_inverted_reference_over_inversion() {
        let range = rule("location", vec![rule("range", vec![point("10"), point("20")])]);
        let inverted = rule("insert", vec![nested(range.clone()), token("INVERTED", "inv")]);
        let inversion = rule(
            "insert",
            vec![nested(rule("variant", vec![range, rule("inversion", vec![])]))],
        );
        let resolved = resolve(ambig(vec![inversion, inverted.clone()])).unwrap();
        assert_eq!(resolved, inverted);
    }

    #[test]
    fn test_nested_ambiguity_is_resolved_first() {
        let inner = ambig(vec![
            rule("insert", vec![rule("location", vec![point("3")])]),
            rule("insert", vec![length("3")]),
        ]);
        let tree = rule("inserted", vec![inner]);
        let resolved = resolve(tree).unwrap();
        assert!(!resolved.is_ambiguous());
        assert_eq!(resolved.at(&[0, 0]), Some(&length("3")));
    }

    #[test]
    fn test_identical_candidates_collapse() {
        let forest = ambig(vec![point("1"), point("1")]);
        assert_eq!(resolve(forest).unwrap(), point("1"));
    }

    #[test]
    fn test_unresolved_ambiguity() {
        let forest = ambig(vec![
            rule("thing", vec![rule("count", vec![])]),
            rule("thing", vec![rule("place", vec![])]),
        ]);
        match resolve(forest).unwrap_err() {
            FerroError::UnresolvedAmbiguity {
                rule, candidates, ..
            } => {
                assert_eq!(rule, "thing");
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_idempotent() {
        let forest = rule(
            "inserted",
            vec![ambig(vec![
                rule("insert", vec![rule("location", vec![point("3")])]),
                rule("insert", vec![length("3")]),
            ])],
        );
        let once = resolve(forest).unwrap();
        let twice = resolve(once.clone()).unwrap();
        assert_eq!(once, twice);
    }
}
