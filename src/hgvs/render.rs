//! Model to description text
//!
//! `Display` implementations for the model types. A parsed description
//! renders back to the text it was parsed from, up to whitespace.

use std::fmt;

use crate::hgvs::model::{
    Content, Description, DescriptionKind, Direction, GeneSelector, Length, Location, Model,
    Offset, Point, Reference, SequenceSpec, Source, SpecificLocus, Variant, VariantKind,
};

/// Render a description.
pub fn render(description: &Description) -> String {
    description.to_string()
}

/// Render any model root.
pub fn render_model(model: &Model) -> String {
    model.to_string()
}

/// `a` for a single item, `[a;b]` otherwise
fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    match items {
        [] => Ok(()),
        [single] => write!(f, "{}", single),
        _ => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(";")?;
                }
                write!(f, "{}", item)?;
            }
            f.write_str("]")
        }
    }
}

impl fmt::Display for SpecificLocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecificLocus::Accession { id, version } => write!(f, "({}.{})", id, version),
            SpecificLocus::Gene { id, selector } => {
                write!(f, "({}", id)?;
                match selector {
                    Some(GeneSelector::TranscriptVariant(n)) => write!(f, "_v{}", n)?,
                    Some(GeneSelector::ProteinIsoform(n)) => write!(f, "_i{}", n)?,
                    None => {}
                }
                f.write_str(")")
            }
            SpecificLocus::LrgTranscript { id } | SpecificLocus::LrgProtein { id } => {
                f.write_str(id)
            }
        }
    }
}

/// The reference without its coordinate system
impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)?;
        if let Some(version) = &self.version {
            write!(f, ".{}", version)?;
        }
        if let Some(locus) = &self.specific_locus {
            write!(f, "{}", locus)?;
        }
        Ok(())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outside_cds {
            Some(Direction::Upstream) => f.write_str("-")?,
            Some(Direction::Downstream) => f.write_str("*")?,
            None => {}
        }
        if let Some(amino_acid) = &self.amino_acid {
            f.write_str(amino_acid)?;
        }
        match self.position {
            Some(position) => write!(f, "{}", position)?,
            None => f.write_str("?")?,
        }
        match self.offset {
            Some(Offset::Exact(offset)) => write!(f, "{:+}", offset),
            Some(Offset::Uncertain(Direction::Downstream)) => f.write_str("+?"),
            Some(Offset::Uncertain(Direction::Upstream)) => f.write_str("-?"),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Point(point) => write!(f, "{}", point),
            Location::Range(range) if range.uncertain => {
                write!(f, "({}_{})", range.start, range.end)
            }
            Location::Range(range) => write!(f, "{}_{}", range.start, range.end),
        }
    }
}

fn count(value: Option<u64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Point { value } => f.write_str(&count(*value)),
            Length::Range { start, end } => write!(f, "({}_{})", count(*start), count(*end)),
            Length::Uncertain { value } => write!(f, "({})", count(*value)),
        }
    }
}

impl fmt::Display for SequenceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Source::External(key) = &self.source {
            f.write_str(key)?;
        }
        match &self.content {
            Content::Sequence(sequence) => f.write_str(sequence)?,
            Content::Length(length) => write!(f, "{}", length)?,
            Content::Location(location) => write!(f, "{}", location)?,
            Content::Whole => {}
        }
        if self.inverted {
            f.write_str("inv")?;
        }
        if let Some(count) = &self.repeat_number {
            write!(f, "[{}]", count)?;
        }
        Ok(())
    }
}

/// A variant rendered for a nucleotide or protein description
struct VariantText<'a> {
    variant: &'a Variant,
    kind: DescriptionKind,
}

impl VariantText<'_> {
    /// Leading sequence, keyword, then the remaining inserted entries
    fn write_around(
        &self,
        f: &mut fmt::Formatter<'_>,
        keyword: &str,
    ) -> fmt::Result {
        let inserted = &self.variant.inserted;
        let rest = match inserted.first() {
            Some(first) if matches!(first.content, Content::Sequence(_)) => {
                write!(f, "{}", first)?;
                &inserted[1..]
            }
            _ => &inserted[..],
        };
        f.write_str(keyword)?;
        rest.iter().try_for_each(|spec| write!(f, "{}", spec))
    }

    fn write_repeat(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for unit in &self.variant.inserted {
            let own_location = matches!(
                (&unit.content, &self.variant.location),
                (Content::Location(l), Some(location)) if l == location
            ) && unit.source == Source::Reference;
            match (&unit.repeat_number, own_location) {
                (Some(count), true) => write!(f, "[{}]", count)?,
                _ => write!(f, "{}", unit)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for VariantText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.variant.predicted {
            f.write_str("(")?;
            self.write_variant(f)?;
            f.write_str(")")
        } else {
            self.write_variant(f)
        }
    }
}

impl VariantText<'_> {
    fn write_variant(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = self.variant;
        if let Some(location) = &variant.location {
            write!(f, "{}", location)?;
        }
        match variant.kind {
            VariantKind::Substitution => {
                if self.kind == DescriptionKind::Dna {
                    variant
                        .deleted
                        .iter()
                        .try_for_each(|spec| write!(f, "{}", spec))?;
                    f.write_str(">")?;
                }
                write_list(f, &variant.inserted)
            }
            VariantKind::DeletionInsertion => {
                f.write_str("del")?;
                write_list(f, &variant.deleted)?;
                f.write_str("ins")?;
                write_list(f, &variant.inserted)
            }
            VariantKind::Deletion => {
                f.write_str("del")?;
                write_list(f, &variant.deleted)
            }
            VariantKind::Duplication
            | VariantKind::Insertion
            | VariantKind::Conversion
            | VariantKind::Inversion
            | VariantKind::Equal => {
                f.write_str(variant.kind.keyword())?;
                write_list(f, &variant.inserted)
            }
            VariantKind::Repeat => self.write_repeat(f),
            VariantKind::FrameShift | VariantKind::Extension => {
                self.write_around(f, variant.kind.keyword())
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            VariantText {
                variant: self,
                kind: DescriptionKind::Dna,
            }
        )
    }
}

fn write_variants(
    f: &mut fmt::Formatter<'_>,
    variants: &[Variant],
    kind: DescriptionKind,
) -> fmt::Result {
    let texts: Vec<VariantText<'_>> = variants
        .iter()
        .map(|variant| VariantText { variant, kind })
        .collect();
    match texts.as_slice() {
        // a lone predicted member keeps its allele brackets
        [single] if single.variant.predicted => write!(f, "[{}]", single),
        _ => write_list(f, &texts),
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.reference)?;
        if let Some(cs) = &self.reference.coordinate_system {
            write!(f, "{}.", cs)?;
        }
        if self.predicted {
            f.write_str("(")?;
            write_variants(f, &self.variants, self.kind)?;
            f.write_str(")")
        } else {
            write_variants(f, &self.variants, self.kind)
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Model::Description(description) => write!(f, "{}", description),
            Model::Reference(reference) => write!(f, "{}", reference),
            Model::Location(location) => write!(f, "{}", location),
            Model::Variants(variants) => write_variants(f, variants, DescriptionKind::Dna),
            Model::Variant(variant) => write!(f, "{}", variant),
            Model::Inserted(inserted) => write_list(f, inserted),
        }
    }
}
