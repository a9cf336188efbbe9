//! Parser tests using rstest parameterized tests
//!
//! Test categories:
//! - Corpus: descriptions that parse and render back unchanged
//! - Fragments: parsing from the alternate start rules
//! - Disambiguation: descriptions whose grammar readings overlap
//! - Parse errors: descriptions that must be rejected

use ferro_hgvs_grammar::hgvs::model::{
    Content, Direction, GeneSelector, Length, Offset, Point, ReferenceKind, Source, SpecificLocus,
};
use ferro_hgvs_grammar::{
    parse_description, parse_fragment, parse_tree, DescriptionKind, Location, Model, StartRule,
    VariantKind,
};
use rstest::rstest;

// =============================================================================
// Corpus
// =============================================================================

#[rstest]
// Nucleotide
#[case("NC_000001.10:c.58del")]
#[case("NC_000001.10:g.100_200del")]
#[case("NM_004006.2:c.169_170insA")]
#[case("NM_000088.3:c.459A>G")]
#[case("NM_000088.3:c.100+5G>A")]
#[case("NM_000088.3:c.-10-3del")]
#[case("NM_000088.3:c.*10del")]
#[case("NM_000088.3:c.100+?_101-?del")]
#[case("NM_000088.3:c.10dup")]
#[case("NM_000088.3:c.10_20inv")]
#[case("NM_000088.3:c.10_11delinsTT")]
#[case("NM_000088.3:c.10delA")]
#[case("NM_000088.3:c.10=")]
#[case("NC_000023.10:g.10_20con30_40")]
#[case("NC_000023.10:g.(?_10)_20del")]
#[case("NG_012232.1:g.[10=;11_12insT]")]
#[case("NM_000088.3:c.10CAG[23]")]
#[case("NM_000088.3:c.10CAG[23]CAA[2]")]
#[case("NM_000088.3:c.10_20[5]")]
#[case("NM_000088.3:c.10_11ins5")]
#[case("NM_000088.3:c.10_11ins(5_10)")]
#[case("NM_000088.3:c.10_11ins?")]
#[case("NM_000088.3:c.11_12ins[T;11_21inv]")]
#[case("NC_000001.10:g.11_12ins[T;11_21inv;NM_000001.1:c.101_201]")]
#[case("NM_002001.2:c.11_12insNM_000001.1")]
#[case("NM_002001.2:c.[(12del)]")]
#[case("NM_002001.2:c.[(12del);(12del)]")]
#[case("NC_000001.10:g.[10del;(10del)]")]
#[case("R1:c.10del")]
// Specific loci
#[case("NG_012337.1(NM_003002.2):c.274G>T")]
#[case("NG_012337.1(SDHD):c.274G>T")]
#[case("NG_012337.1(SDHD_v001):c.274G>T")]
#[case("NG_012337.1(SDHD_i001):c.274G>T")]
#[case("LRG_24t1:c.10del")]
// Protein
#[case("NP_003997.1:p.Arg12Cys")]
#[case("NP_003997.1:p.Lys23_Val25del")]
#[case("NP_003997.1:p.Ala3dup")]
#[case("NP_003997.1:p.Lys2_Gly3insGlnSerLys")]
#[case("NP_003997.1:p.Cys28delinsTrpVal")]
#[case("NP_003997.1:p.Gln18[23]")]
#[case("NP_003997.1:p.Arg97fs")]
#[case("NP_003997.1:p.Arg97ProfsTer23")]
#[case("NP_003997.1:p.Met1ext-5")]
#[case("NP_003997.1:p.Ter110GlnextTer17")]
#[case("NP_003997.1:p.(Arg97ProfsTer23)")]
#[case("NP_003997.1:p.[Arg12Cys;Ala3dup]")]
#[case("NP_003997.1:p.[(Ser68Arg)]")]
#[case("NP_003997.1:p.(Ser332_Ser333ins(1))")]
#[case("PREF:p.Ala3dup")]
#[case("PREF:p.Arg12Cys")]
fn test_corpus_renders_unchanged(#[case] input: &str) {
    let (description, _) = parse_description(input)
        .unwrap_or_else(|e| panic!("failed to parse {}: {}", input, e.detailed_message()));
    assert_eq!(description.to_string(), input);
}

#[test]
fn test_deletion_scenario() {
    let (description, references) = parse_description("NC_000001.10:c.58del").unwrap();
    assert_eq!(description.kind, DescriptionKind::Dna);
    assert_eq!(description.reference.id, "NC_000001");
    assert_eq!(description.reference.version.as_deref(), Some("10"));
    assert_eq!(description.reference.coordinate_system.as_deref(), Some("c"));
    assert!(!description.predicted);
    assert!(references.is_empty());

    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Deletion);
    assert_eq!(variant.source, Source::Reference);
    assert_eq!(variant.location, Some(Location::point(58)));
}

#[test]
fn test_offsets_and_markers() {
    let (description, _) = parse_description("NM_000088.3:c.-10-3del").unwrap();
    assert_eq!(
        description.variants[0].location,
        Some(Location::Point(Point {
            position: Some(10),
            offset: Some(Offset::Exact(-3)),
            outside_cds: Some(Direction::Upstream),
            amino_acid: None,
        }))
    );

    let (description, _) = parse_description("NM_000088.3:c.100+?_101-?del").unwrap();
    let Some(Location::Range(range)) = &description.variants[0].location else {
        panic!("expected a range");
    };
    assert_eq!(
        *range.start,
        Location::Point(Point {
            offset: Some(Offset::Uncertain(Direction::Downstream)),
            ..Point::new(100)
        })
    );
}

#[test]
fn test_substitution_deleted_material() {
    let (description, _) = parse_description("NM_000088.3:c.459A>G").unwrap();
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Substitution);
    assert_eq!(variant.deleted[0].content, Content::Sequence("A".to_string()));
    assert_eq!(variant.deleted[0].source, Source::Description);
    assert_eq!(variant.inserted[0].content, Content::Sequence("G".to_string()));
}

#[test]
fn test_conversion_inserts_reference_range() {
    let (description, _) = parse_description("NC_000023.10:g.10_20con30_40").unwrap();
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Conversion);
    assert_eq!(
        variant.inserted[0].content,
        Content::Location(Location::range(Location::point(30), Location::point(40)))
    );
    assert_eq!(variant.inserted[0].source, Source::Reference);
}

#[test]
fn test_nested_reference_table() {
    let (description, references) =
        parse_description("NC_000001.10:g.11_12ins[T;11_21inv;NM_000001.1:c.101_201]").unwrap();
    let inserted = &description.variants[0].inserted;
    assert_eq!(inserted.len(), 3);
    assert!(inserted[1].inverted);
    assert_eq!(
        inserted[2].source,
        Source::External("NM_000001.1:c.".to_string())
    );

    assert_eq!(references.len(), 1);
    let reference = &references["NM_000001.1:c."];
    assert_eq!(reference.id, "NM_000001");
    assert_eq!(reference.version.as_deref(), Some("1"));
}

#[test]
fn test_whole_reference_insert() {
    let (description, references) =
        parse_description("NM_002001.2:c.11_12insNM_000001.1").unwrap();
    let inserted = &description.variants[0].inserted;
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].content, Content::Whole);
    assert_eq!(inserted[0].source, Source::External("NM_000001.1".to_string()));
    assert_eq!(references["NM_000001.1"].id, "NM_000001");
}

#[test]
fn test_inverted_nested_reference() {
    let (description, references) =
        parse_description("NM_002001.2:c.11_12ins[NM_000001.1:c.100_200inv]").unwrap();
    let inserted = &description.variants[0].inserted[0];
    assert!(inserted.inverted);
    assert_eq!(
        inserted.content,
        Content::Location(Location::range(Location::point(100), Location::point(200)))
    );
    assert!(references.contains_key("NM_000001.1:c."));
}

#[test]
fn test_predicted_allele_members() {
    let (description, _) = parse_description("NC_000001.10:g.[10del;(10del)]").unwrap();
    assert_eq!(description.variants.len(), 2);
    assert!(!description.variants[0].predicted);
    assert!(description.variants[1].predicted);
    assert_eq!(description.variants[1].kind, VariantKind::Deletion);
}

#[test]
fn test_generic_reference_identifier() {
    let (description, _) = parse_description("PREF:p.Ala3dup").unwrap();
    assert_eq!(description.reference.id, "PREF");
    assert_eq!(description.reference.version, None);
    assert_eq!(description.kind, DescriptionKind::Protein);
}

#[test]
fn test_long_allele_list() {
    let members: Vec<String> = (1..=300).map(|i| format!("{}del", i)).collect();
    let input = format!("NC_000001.10:g.[{}]", members.join(";"));
    let (description, _) = parse_description(&input).unwrap();
    assert_eq!(description.variants.len(), 300);
    assert_eq!(description.to_string(), input);
}

#[test]
fn test_repeat_units() {
    let (description, _) = parse_description("NM_000088.3:c.10CAG[23]CAA[2]").unwrap();
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Repeat);
    assert_eq!(variant.inserted.len(), 2);
    assert_eq!(
        variant.inserted[1].repeat_number,
        Some(Length::Point { value: Some(2) })
    );
}

#[rstest]
#[case("NG_012337.1(NM_003002.2):c.274G>T", SpecificLocus::Accession { id: "NM_003002".to_string(), version: "2".to_string() })]
#[case("NG_012337.1(SDHD):c.274G>T", SpecificLocus::Gene { id: "SDHD".to_string(), selector: None })]
#[case("NG_012337.1(SDHD_v001):c.274G>T", SpecificLocus::Gene { id: "SDHD".to_string(), selector: Some(GeneSelector::TranscriptVariant("001".to_string())) })]
#[case("LRG_24t1:c.10del", SpecificLocus::LrgTranscript { id: "t1".to_string() })]
fn test_specific_loci(#[case] input: &str, #[case] expected: SpecificLocus) {
    let (description, _) = parse_description(input).unwrap();
    assert_eq!(description.reference.specific_locus, Some(expected));
}

#[test]
fn test_lrg_reference_kind() {
    let (description, _) = parse_description("LRG_24t1:c.10del").unwrap();
    assert_eq!(description.reference.kind, ReferenceKind::Lrg);
    assert_eq!(description.reference.id, "LRG_24");
}

#[test]
fn test_whitespace_is_ignored() {
    let (spaced, _) = parse_description("NC_000001.10 : c.58 del").unwrap();
    let (compact, _) = parse_description("NC_000001.10:c.58del").unwrap();
    assert_eq!(spaced, compact);
}

// =============================================================================
// Protein descriptions
// =============================================================================

#[test]
fn test_protein_substitution() {
    let (description, _) = parse_description("NP_003997.1:p.Arg12Cys").unwrap();
    assert_eq!(description.kind, DescriptionKind::Protein);
    assert_eq!(description.reference.coordinate_system.as_deref(), Some("p"));
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Substitution);
    assert_eq!(
        variant.location,
        Some(Location::Point(Point {
            amino_acid: Some("Arg".to_string()),
            ..Point::new(12)
        }))
    );
}

#[test]
fn test_protein_predicted() {
    let (description, _) = parse_description("NP_003997.1:p.(Arg97ProfsTer23)").unwrap();
    assert!(description.predicted);
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::FrameShift);
    assert_eq!(variant.inserted.len(), 2);
}

#[test]
fn test_upstream_extension() {
    let (description, _) = parse_description("NP_003997.1:p.Met1ext-5").unwrap();
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Extension);
    assert_eq!(
        variant.inserted[0].content,
        Content::Location(Location::Point(Point {
            outside_cds: Some(Direction::Upstream),
            ..Point::new(5)
        }))
    );
}

// =============================================================================
// Disambiguation
// =============================================================================

#[test]
fn test_equal_protein_reference_reads_as_nucleotide() {
    let (description, _) = parse_description("NP_1.1:p.=").unwrap();
    assert_eq!(description.kind, DescriptionKind::Dna);
    assert_eq!(description.variants[0].kind, VariantKind::Equal);
    assert_eq!(description.variants[0].location, None);
}

#[rstest]
#[case("NM_000088.3:c.10_11ins5", Length::Point { value: Some(5) })]
#[case("NM_000088.3:c.10_11ins?", Length::Point { value: None })]
#[case("NM_000088.3:c.10_11ins(5_10)", Length::Range { start: Some(5), end: Some(10) })]
fn test_bare_counts_are_lengths(#[case] input: &str, #[case] expected: Length) {
    let (description, _) = parse_description(input).unwrap();
    assert_eq!(
        description.variants[0].inserted[0].content,
        Content::Length(expected)
    );
}

#[test]
fn test_protein_bracketed_count_is_repeat() {
    let (description, _) = parse_description("NP_003997.1:p.Gln18[23]").unwrap();
    let variant = &description.variants[0];
    assert_eq!(variant.kind, VariantKind::Repeat);
    assert_eq!(
        variant.inserted[0].repeat_number,
        Some(Length::Point { value: Some(23) })
    );
}

#[test]
fn test_raw_forest_is_ambiguous_for_counts() {
    let parser = ferro_hgvs_grammar::HgvsParser::new()
        .unwrap()
        .start_rule(StartRule::Variant);
    let forest = parser.parse_forest("10_11ins5").unwrap();
    assert!(forest.is_ambiguous());
    let tree = parse_tree("10_11ins5", StartRule::Variant).unwrap();
    assert!(!tree.is_ambiguous());
}

// =============================================================================
// Fragments
// =============================================================================

#[test]
fn test_reference_fragment() {
    let (model, _) = parse_fragment("LRG_24t1", StartRule::Reference).unwrap();
    let Model::Reference(reference) = model else {
        panic!("expected a reference");
    };
    assert_eq!(reference.id, "LRG_24");
    assert_eq!(
        reference.specific_locus,
        Some(SpecificLocus::LrgTranscript {
            id: "t1".to_string()
        })
    );
}

#[test]
fn test_variants_fragment() {
    let (model, _) = parse_fragment("[10=;11_12insT]", StartRule::Variants).unwrap();
    let Model::Variants(variants) = model else {
        panic!("expected variants");
    };
    assert_eq!(variants.len(), 2);
    assert_eq!(variants[0].kind, VariantKind::Equal);
    assert_eq!(variants[1].kind, VariantKind::Insertion);
    assert_eq!(
        variants[1].inserted[0].content,
        Content::Sequence("T".to_string())
    );
}

#[rstest]
#[case("(?_10)_20", StartRule::Location)]
#[case("10_20", StartRule::Location)]
#[case("10del", StartRule::Variant)]
#[case("[T;11_21inv]", StartRule::Inserted)]
#[case("NG_012337.1(SDHD_v001)", StartRule::Reference)]
fn test_fragments_render_unchanged(#[case] input: &str, #[case] start: StartRule) {
    let (model, _) = parse_fragment(input, start).unwrap();
    assert_eq!(model.to_string(), input);
}

// =============================================================================
// Parse errors
// =============================================================================

#[rstest]
#[case("")]
#[case("NC_000001.10")]
#[case("NC_000001.10:c.")]
#[case("NC_000001.10:c.58zz")]
#[case("nc_000001.10:c.58del")]
#[case("NP_003997.1:p.Arg12Cys)")]
#[case("NP_003997.1:p.?")]
#[case("NP_003997.1:p.0")]
fn test_rejected(#[case] input: &str) {
    let err = parse_description(input).unwrap_err();
    assert!(err.is_syntax_error(), "{}: {:?}", input, err);
}
