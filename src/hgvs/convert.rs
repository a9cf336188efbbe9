//! Derivation tree to description model
//!
//! A single bottom-up fold. Tokens become scalar parts keyed by their
//! terminal kind; rule nodes combine the parts of their children through
//! the [`RULES`] dispatch table. Nested references met inside inserted
//! material are collected into a [`ReferenceTable`] returned next to the
//! model.
//!
//! Positions are taken as written (1-based). [`number`] is the only place
//! where position text becomes a value.

use crate::error::FerroError;
use crate::hgvs::model::{
    Content, Description, DescriptionKind, Direction, GeneSelector, Length, Location, Model,
    Offset, Point, Reference, ReferenceTable, SequenceSpec, Source, SpecificLocus, Variant,
    VariantKind,
};
use crate::tree::Derivation;

/// Intermediate contribution of a subtree
#[derive(Debug, Clone, PartialEq)]
enum Part {
    Accession(String),
    Version(String),
    GeneName(String),
    Selector(GeneSelector),
    SpecificLocus(SpecificLocus),
    CoordinateSystem(String),
    Number(u64),
    Unknown,
    Offset(Offset),
    OutsideCds(Direction),
    AminoAcid(String),
    Sequence(String),
    Inverted,
    Location(Location),
    Length(Length),
    RepeatNumber(Length),
    Insert(SequenceSpec),
    Inserted(Vec<SequenceSpec>),
    Deleted(Vec<SequenceSpec>),
    ReferenceLocation {
        key: String,
        reference: Reference,
        locations: Vec<Location>,
        variants: Vec<Variant>,
    },
    Edit(Edit),
    Variant(Variant),
    Variants(Vec<Variant>),
    Predicted(Vec<Variant>),
    Reference(Reference),
    Description(Description),
}

/// Operation of a variant, before its location is known
#[derive(Debug, Clone, PartialEq)]
struct Edit {
    kind: VariantKind,
    deleted: Vec<SequenceSpec>,
    inserted: Vec<SequenceSpec>,
    /// `10_20[5]`: the variant's own location repeated
    repeat_number: Option<Length>,
}

type Handler = fn(&mut Converter, &str, Vec<Part>) -> Result<Part, FerroError>;

/// Rule name to part constructor
const RULES: &[(&str, Handler)] = &[
    ("description", description),
    ("description_dna", description_body),
    ("description_protein", description_body),
    ("reference", reference),
    ("specific_locus", specific_locus),
    ("reference_location", reference_location),
    ("variants", variants),
    ("variants_predicted", variants_predicted),
    ("variant", variant),
    ("variant_predicted", variant_predicted),
    ("conversion", edit),
    ("deletion", edit),
    ("deletion_insertion", edit),
    ("duplication", edit),
    ("equal", edit),
    ("insertion", edit),
    ("inversion", edit),
    ("repeat", edit),
    ("substitution", edit),
    ("frame_shift", edit),
    ("extension", edit),
    ("repeat_unit", repeat_unit),
    ("repeat_number", repeat_number),
    ("deleted", inserts),
    ("inserted", inserts),
    ("insert", insert),
    ("length", length),
    ("uncertain_length", uncertain_length),
    ("location", location),
    ("range", range),
    ("uncertain", range),
    ("point", point),
];

/// Convert a disambiguated, normalized tree into a model.
///
/// The root may be any start rule: a description, a reference, a location,
/// a variant list, a variant or inserted material.
pub fn convert(tree: &Derivation) -> Result<(Model, ReferenceTable), FerroError> {
    let mut converter = Converter::default();
    let root = tree.rule_name().unwrap_or("?").to_string();
    let model = match converter.fold(tree)? {
        Part::Description(description) => Model::Description(description),
        Part::Reference(reference) => Model::Reference(reference),
        Part::Location(location) => Model::Location(location),
        Part::Variants(variants) => Model::Variants(variants),
        Part::Variant(variant) => Model::Variant(variant),
        Part::Inserted(inserted) => Model::Inserted(inserted),
        other => {
            return Err(FerroError::malformed(
                root,
                format!("cannot produce a model from {:?}", other),
            ))
        }
    };
    Ok((model, converter.references))
}

#[derive(Debug, Default)]
struct Converter {
    references: ReferenceTable,
}

impl Converter {
    fn fold(&mut self, node: &Derivation) -> Result<Part, FerroError> {
        match node {
            Derivation::Token { kind, text } => token(kind, text),
            Derivation::Ambig { .. } => Err(FerroError::malformed(
                "_ambig",
                "ambiguity node reached conversion",
            )),
            Derivation::Rule { name, children } => {
                let handler = RULES
                    .iter()
                    .find(|(rule, _)| rule == name)
                    .map(|(_, handler)| *handler)
                    .ok_or_else(|| FerroError::malformed(name.as_str(), "no conversion for rule"))?;
                let parts = children
                    .iter()
                    .map(|child| self.fold(child))
                    .collect::<Result<Vec<_>, _>>()?;
                handler(self, name, parts)
            }
        }
    }
}

/// Parse a position or count as written.
pub fn number(text: &str) -> Result<u64, FerroError> {
    text.parse().map_err(|_| FerroError::NumberOutOfRange {
        text: text.to_string(),
    })
}

fn token(kind: &str, text: &str) -> Result<Part, FerroError> {
    let part = match kind {
        "ACCESSION" => Part::Accession(text.to_string()),
        "VERSION" => Part::Version(text.to_string()),
        "GENE_NAME" => Part::GeneName(text.to_string()),
        "GENBANK_LOCUS_SELECTOR" => {
            let selector = text.trim_start_matches('_');
            if let Some(id) = selector.strip_prefix('v') {
                Part::Selector(GeneSelector::TranscriptVariant(id.to_string()))
            } else if let Some(id) = selector.strip_prefix('i') {
                Part::Selector(GeneSelector::ProteinIsoform(id.to_string()))
            } else {
                return Err(FerroError::malformed(kind, format!("bad selector '{}'", text)));
            }
        }
        "LRG_LOCUS" => match text.chars().next() {
            Some('t') => Part::SpecificLocus(SpecificLocus::LrgTranscript {
                id: text.to_string(),
            }),
            Some('p') => Part::SpecificLocus(SpecificLocus::LrgProtein {
                id: text.to_string(),
            }),
            _ => return Err(FerroError::malformed(kind, format!("bad LRG locus '{}'", text))),
        },
        "COORDINATE_SYSTEM" => Part::CoordinateSystem(text.to_string()),
        "NUMBER" => Part::Number(number(text)?),
        "UNKNOWN" => Part::Unknown,
        "OFFSET" => Part::Offset(offset(text)?),
        "OUTSIDE_CDS" => match text {
            "*" => Part::OutsideCds(Direction::Downstream),
            "-" => Part::OutsideCds(Direction::Upstream),
            _ => return Err(FerroError::malformed(kind, format!("bad marker '{}'", text))),
        },
        "AA" => Part::AminoAcid(text.to_string()),
        "SEQUENCE" | "P_SEQUENCE" => Part::Sequence(text.to_string()),
        "INVERTED" => Part::Inverted,
        _ => return Err(FerroError::malformed(kind, "unexpected token")),
    };
    Ok(part)
}

fn offset(text: &str) -> Result<Offset, FerroError> {
    match text {
        "+?" => Ok(Offset::Uncertain(Direction::Downstream)),
        "-?" => Ok(Offset::Uncertain(Direction::Upstream)),
        _ => text
            .parse()
            .map(Offset::Exact)
            .map_err(|_| FerroError::NumberOutOfRange {
                text: text.to_string(),
            }),
    }
}

fn unexpected(rule: &str, part: &Part) -> FerroError {
    FerroError::malformed(rule, format!("unexpected {:?}", part))
}

fn description(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 1]>::try_from(parts) {
        Ok([part @ Part::Description(_)]) => Ok(part),
        Ok([other]) => Err(unexpected(rule, &other)),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected one child, found {}", parts.len()),
        )),
    }
}

fn description_body(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let kind = if rule == "description_protein" {
        DescriptionKind::Protein
    } else {
        DescriptionKind::Dna
    };
    let mut reference = None;
    let mut coordinate_system = (kind == DescriptionKind::Protein).then(|| "p".to_string());
    let mut body = None;
    for part in parts {
        match part {
            Part::Reference(r) => reference = Some(r),
            Part::CoordinateSystem(cs) => coordinate_system = Some(cs),
            Part::Variants(variants) => body = Some((variants, false)),
            Part::Predicted(variants) => body = Some((variants, true)),
            other => return Err(unexpected(rule, &other)),
        }
    }
    let mut reference =
        reference.ok_or_else(|| FerroError::malformed(rule, "missing reference"))?;
    let (variants, predicted) =
        body.ok_or_else(|| FerroError::malformed(rule, "missing variants"))?;
    reference.coordinate_system = coordinate_system;
    Ok(Part::Description(Description {
        kind,
        reference,
        variants,
        predicted,
    }))
}

fn reference(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let mut parts = parts.into_iter();
    let Some(Part::Accession(id)) = parts.next() else {
        return Err(FerroError::malformed(rule, "missing accession"));
    };
    let mut reference = Reference::new(id);
    for part in parts {
        match part {
            Part::Version(version) => reference.version = Some(version),
            Part::SpecificLocus(locus) => reference.specific_locus = Some(locus),
            other => return Err(unexpected(rule, &other)),
        }
    }
    Ok(Part::Reference(reference))
}

fn specific_locus(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let locus = match parts.as_slice() {
        [Part::Accession(id), Part::Version(version)] => SpecificLocus::Accession {
            id: id.clone(),
            version: version.clone(),
        },
        [Part::GeneName(id)] => SpecificLocus::Gene {
            id: id.clone(),
            selector: None,
        },
        [Part::GeneName(id), Part::Selector(selector)] => SpecificLocus::Gene {
            id: id.clone(),
            selector: Some(selector.clone()),
        },
        [Part::SpecificLocus(locus)] => locus.clone(),
        _ => {
            return Err(FerroError::malformed(
                rule,
                format!("unexpected parts {:?}", parts),
            ))
        }
    };
    Ok(Part::SpecificLocus(locus))
}

fn reference_location(
    _: &mut Converter,
    rule: &str,
    parts: Vec<Part>,
) -> Result<Part, FerroError> {
    let mut reference = None;
    let mut locations = Vec::new();
    let mut variants = Vec::new();
    for part in parts {
        match part {
            Part::Reference(r) => reference = Some(r),
            Part::CoordinateSystem(cs) => {
                if let Some(r) = reference.as_mut() {
                    r.coordinate_system = Some(cs);
                }
            }
            Part::Location(location) => locations.push(location),
            Part::Variant(variant) => variants.push(variant),
            other => return Err(unexpected(rule, &other)),
        }
    }
    let reference = reference.ok_or_else(|| FerroError::malformed(rule, "missing reference"))?;
    let key = match (&reference.coordinate_system, locations.is_empty() && variants.is_empty()) {
        (_, true) => reference.to_string(),
        (Some(cs), false) => format!("{}:{}.", reference, cs),
        (None, false) => format!("{}:", reference),
    };
    Ok(Part::ReferenceLocation {
        key,
        reference,
        locations,
        variants,
    })
}

fn variants(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    parts
        .into_iter()
        .map(|part| match part {
            Part::Variant(variant) => Ok(variant),
            other => Err(unexpected(rule, &other)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Part::Variants)
}

fn variants_predicted(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 1]>::try_from(parts) {
        Ok([Part::Variants(variants)]) => Ok(Part::Predicted(variants)),
        Ok([other]) => Err(unexpected(rule, &other)),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected one child, found {}", parts.len()),
        )),
    }
}

fn variant_predicted(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 1]>::try_from(parts) {
        Ok([Part::Variant(variant)]) => Ok(Part::Variant(Variant {
            predicted: true,
            ..variant
        })),
        Ok([other]) => Err(unexpected(rule, &other)),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected one child, found {}", parts.len()),
        )),
    }
}

fn variant(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let mut location = None;
    let mut edit = None;
    for part in parts {
        match part {
            Part::Location(l) => location = Some(l),
            Part::Edit(e) => edit = Some(e),
            other => return Err(unexpected(rule, &other)),
        }
    }
    let edit = edit.ok_or_else(|| FerroError::malformed(rule, "missing operation"))?;
    let mut inserted = edit.inserted;
    if let Some(count) = edit.repeat_number {
        let repeated = location
            .clone()
            .ok_or_else(|| FerroError::malformed(rule, "repeat without a location"))?;
        inserted.push(SequenceSpec {
            repeat_number: Some(count),
            ..SequenceSpec::location(repeated)
        });
    }
    Ok(Part::Variant(Variant {
        kind: edit.kind,
        source: Source::Reference,
        location,
        deleted: edit.deleted,
        inserted,
        predicted: false,
    }))
}

fn edit(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let kind = VariantKind::from_rule(rule)
        .ok_or_else(|| FerroError::malformed(rule, "not an operation"))?;
    let mut edit = Edit {
        kind,
        deleted: Vec::new(),
        inserted: Vec::new(),
        repeat_number: None,
    };
    for part in parts {
        match (kind, part) {
            (_, Part::Deleted(deleted)) => edit.deleted = deleted,
            (_, Part::Inserted(inserted)) => edit.inserted = inserted,
            (VariantKind::Substitution, Part::Sequence(sequence)) => {
                edit.deleted = vec![SequenceSpec::sequence(sequence)]
            }
            (VariantKind::Repeat, Part::Insert(unit)) => edit.inserted.push(unit),
            (VariantKind::Repeat, Part::RepeatNumber(count)) => edit.repeat_number = Some(count),
            (_, other) => return Err(unexpected(rule, &other)),
        }
    }
    Ok(Part::Edit(edit))
}

fn repeat_unit(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 2]>::try_from(parts) {
        Ok([Part::Sequence(sequence), Part::RepeatNumber(count)]) => Ok(Part::Insert(SequenceSpec {
            repeat_number: Some(count),
            ..SequenceSpec::sequence(sequence)
        })),
        Ok(parts) => Err(FerroError::malformed(rule, format!("unexpected parts {:?}", parts))),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected two children, found {}", parts.len()),
        )),
    }
}

fn repeat_number(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 1]>::try_from(parts) {
        Ok([Part::Length(length)]) => Ok(Part::RepeatNumber(length)),
        Ok([other]) => Err(unexpected(rule, &other)),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected one child, found {}", parts.len()),
        )),
    }
}

fn inserts(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let specs = parts
        .into_iter()
        .map(|part| match part {
            Part::Insert(spec) => Ok(spec),
            other => Err(unexpected(rule, &other)),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(if rule == "deleted" {
        Part::Deleted(specs)
    } else {
        Part::Inserted(specs)
    })
}

fn insert(converter: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let mut parts = parts.into_iter();
    let head = parts
        .next()
        .ok_or_else(|| FerroError::malformed(rule, "empty insert"))?;
    let mut spec = match head {
        Part::Sequence(sequence) => SequenceSpec::sequence(sequence),
        Part::Length(length) => SequenceSpec::length(length),
        Part::Location(location) => SequenceSpec::location(location),
        Part::ReferenceLocation {
            key,
            reference,
            mut locations,
            variants,
        } => {
            let content = match (locations.len(), variants.as_slice()) {
                (0, []) => Content::Whole,
                (1, []) => Content::Location(locations.remove(0)),
                (_, [variant]) if locations.is_empty() => {
                    return Err(too_deep(key, nested_variant_problem(variant)))
                }
                (count, _) => {
                    return Err(too_deep(
                        key,
                        format!("{} entries, at most 1 allowed", count + variants.len()),
                    ))
                }
            };
            log::trace!("nested reference {}", key);
            converter.references.insert(key.clone(), reference);
            SequenceSpec {
                content,
                source: Source::External(key),
                inverted: false,
                repeat_number: None,
            }
        }
        other => return Err(unexpected(rule, &other)),
    };
    for part in parts {
        match part {
            Part::Inverted => spec.inverted = true,
            Part::RepeatNumber(count) => spec.repeat_number = Some(count),
            other => return Err(unexpected(rule, &other)),
        }
    }
    Ok(Part::Insert(spec))
}

fn too_deep(reference: String, msg: impl Into<String>) -> FerroError {
    FerroError::NestedReferenceTooDeep {
        reference,
        msg: msg.into(),
        input: String::new(),
    }
}

/// Why a variant written inside a nested description is rejected
fn nested_variant_problem(variant: &Variant) -> String {
    let nests_again = variant
        .deleted
        .iter()
        .chain(&variant.inserted)
        .any(|spec| matches!(spec.source, Source::External(_)));
    if nests_again {
        "it nests another description".to_string()
    } else {
        format!(
            "it holds a {} operation, only a location is allowed",
            variant.kind.keyword()
        )
    }
}

fn count(rule: &str, part: &Part) -> Result<Option<u64>, FerroError> {
    match part {
        Part::Number(value) => Ok(Some(*value)),
        Part::Unknown => Ok(None),
        other => Err(unexpected(rule, other)),
    }
}

fn uncertain_length(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match parts.as_slice() {
        [value] => Ok(Part::Length(Length::Uncertain {
            value: count(rule, value)?,
        })),
        _ => Err(FerroError::malformed(
            rule,
            format!("expected one count, found {}", parts.len()),
        )),
    }
}

fn length(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let length = match parts.as_slice() {
        [Part::Length(length)] => length.clone(),
        [value] => Length::Point {
            value: count(rule, value)?,
        },
        [start, end] => Length::Range {
            start: count(rule, start)?,
            end: count(rule, end)?,
        },
        _ => {
            return Err(FerroError::malformed(
                rule,
                format!("expected one or two counts, found {}", parts.len()),
            ))
        }
    };
    Ok(Part::Length(length))
}

fn location(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 1]>::try_from(parts) {
        Ok([part @ Part::Location(_)]) => Ok(part),
        Ok([other]) => Err(unexpected(rule, &other)),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected one child, found {}", parts.len()),
        )),
    }
}

/// `range` and `uncertain`; the latter is a range written in parentheses
fn range(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    match <[Part; 2]>::try_from(parts) {
        Ok([Part::Location(start), Part::Location(end)]) => Ok(Part::Location(if rule == "uncertain" {
            Location::uncertain_range(start, end)
        } else {
            Location::range(start, end)
        })),
        Ok(parts) => Err(FerroError::malformed(rule, format!("unexpected parts {:?}", parts))),
        Err(parts) => Err(FerroError::malformed(
            rule,
            format!("expected two children, found {}", parts.len()),
        )),
    }
}

fn point(_: &mut Converter, rule: &str, parts: Vec<Part>) -> Result<Part, FerroError> {
    let mut point = Point::default();
    let mut positioned = false;
    for part in parts {
        match part {
            Part::OutsideCds(direction) => point.outside_cds = Some(direction),
            Part::AminoAcid(amino_acid) => point.amino_acid = Some(amino_acid),
            Part::Number(position) if !positioned => {
                point.position = Some(position);
                positioned = true;
            }
            Part::Unknown if !positioned => positioned = true,
            Part::Offset(offset) => point.offset = Some(offset),
            other => return Err(unexpected(rule, &other)),
        }
    }
    if !positioned {
        return Err(FerroError::malformed(rule, "missing position"));
    }
    Ok(Part::Location(Location::Point(point)))
}
