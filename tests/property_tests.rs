//! Property-based tests for description parsing and rendering
//!
//! Generated descriptions are already in canonical form, so parsing and
//! rendering must give the input back, and parsing must be deterministic.

use ferro_hgvs_grammar::hgvs::resolve::resolve;
use ferro_hgvs_grammar::{parse_description, HgvsParser};
use proptest::prelude::*;
use proptest::test_runner::Config as ProptestConfig;

// =============================================================================
// Base strategies
// =============================================================================

/// Generate RefSeq accession prefixes
fn accession_prefix() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("NC"), Just("NG"), Just("NM"), Just("NR")]
}

/// Generate accessions with a version
fn reference() -> impl Strategy<Value = String> {
    (accession_prefix(), "[0-9]{6}", 1..20u32)
        .prop_map(|(prefix, number, version)| format!("{}_{}.{}", prefix, number, version))
}

fn coordinate_system() -> impl Strategy<Value = &'static str> {
    prop_oneof![Just("c"), Just("g"), Just("n"), Just("m")]
}

fn position() -> impl Strategy<Value = u64> {
    1..100_000u64
}

fn offset() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        (1..500i64).prop_map(|o| format!("+{}", o)),
        (1..500i64).prop_map(|o| format!("-{}", o)),
        Just("+?".to_string()),
        Just("-?".to_string()),
    ]
}

fn point() -> impl Strategy<Value = String> {
    (
        prop_oneof![Just(""), Just("-"), Just("*")],
        position(),
        offset(),
    )
        .prop_map(|(marker, position, offset)| format!("{}{}{}", marker, position, offset))
}

fn location() -> impl Strategy<Value = String> {
    prop_oneof![
        point(),
        (point(), point()).prop_map(|(a, b)| format!("{}_{}", a, b)),
    ]
}

fn nucleotides() -> impl Strategy<Value = String> {
    "[ACGT]{1,12}"
}

/// Canonical nucleotide variants
fn dna_variant() -> impl Strategy<Value = String> {
    prop_oneof![
        location().prop_map(|l| format!("{}del", l)),
        location().prop_map(|l| format!("{}dup", l)),
        location().prop_map(|l| format!("{}inv", l)),
        location().prop_map(|l| format!("{}=", l)),
        (point(), "[ACGT]", "[ACGT]").prop_map(|(p, r, a)| format!("{}{}>{}", p, r, a)),
        (position(), nucleotides()).prop_map(|(p, s)| format!("{}_{}ins{}", p, p + 1, s)),
        (location(), nucleotides()).prop_map(|(l, s)| format!("{}delins{}", l, s)),
        (position(), "[ACGT]{3}", 1..50u64).prop_map(|(p, u, n)| format!("{}{}[{}]", p, u, n)),
    ]
}

fn amino_acid() -> impl Strategy<Value = &'static str> {
    prop_oneof![
        Just("Ala"),
        Just("Arg"),
        Just("Cys"),
        Just("Gln"),
        Just("Gly"),
        Just("Lys"),
        Just("Val"),
        Just("Trp"),
    ]
}

/// Canonical protein variants
fn protein_variant() -> impl Strategy<Value = String> {
    prop_oneof![
        (amino_acid(), position(), amino_acid())
            .prop_map(|(a, p, b)| format!("{}{}{}", a, p, b)),
        (amino_acid(), position()).prop_map(|(a, p)| format!("{}{}del", a, p)),
        (amino_acid(), position()).prop_map(|(a, p)| format!("{}{}dup", a, p)),
        (amino_acid(), position()).prop_map(|(a, p)| format!("{}{}fs", a, p)),
        (amino_acid(), position(), amino_acid(), 1..100u64)
            .prop_map(|(a, p, b, n)| format!("{}{}{}fsTer{}", a, p, b, n)),
    ]
}

fn dna_description() -> impl Strategy<Value = String> {
    (
        reference(),
        coordinate_system(),
        prop::collection::vec(dna_variant(), 1..4),
    )
        .prop_map(|(reference, cs, variants)| {
            let body = if variants.len() == 1 {
                variants[0].clone()
            } else {
                format!("[{}]", variants.join(";"))
            };
            format!("{}:{}.{}", reference, cs, body)
        })
}

fn protein_description() -> impl Strategy<Value = String> {
    ("[0-9]{6}", 1..20u32, protein_variant(), any::<bool>()).prop_map(
        |(number, version, variant, predicted)| {
            if predicted {
                format!("NP_{}.{}:p.({})", number, version, variant)
            } else {
                format!("NP_{}.{}:p.{}", number, version, variant)
            }
        },
    )
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_dna_round_trip(input in dna_description()) {
        let (description, _) = parse_description(&input).unwrap();
        prop_assert_eq!(description.to_string(), input);
    }

    #[test]
    fn prop_protein_round_trip(input in protein_description()) {
        let (description, _) = parse_description(&input).unwrap();
        prop_assert_eq!(description.to_string(), input);
    }

    #[test]
    fn prop_model_stable_under_reparse(input in dna_description()) {
        let (first, _) = parse_description(&input).unwrap();
        let (second, _) = parse_description(&first.to_string()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_resolution_is_deterministic(input in dna_description()) {
        let parser = HgvsParser::new().unwrap();
        let forest = parser.parse_forest(&input).unwrap();
        let a = resolve(forest.clone()).unwrap();
        let b = resolve(forest).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_never_panics(input in "\\PC{0,40}") {
        let _ = parse_description(&input);
    }
}
