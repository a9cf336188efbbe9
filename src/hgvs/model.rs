//! Description model
//!
//! The typed result of converting a disambiguated derivation tree:
//! a reference, an optional specific locus and coordinate system, and an
//! ordered list of variants with their locations and deleted/inserted
//! material. Positions are stored 1-based, exactly as written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Nucleotide or protein description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptionKind {
    Dna,
    Protein,
}

/// A complete HGVS description, e.g. `NM_004006.2:c.169_170insA`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Description {
    pub kind: DescriptionKind,
    pub reference: Reference,
    pub variants: Vec<Variant>,
    /// Variants were written in parentheses (predicted consequence)
    #[serde(default)]
    pub predicted: bool,
}

/// Reference sequence family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    Genbank,
    Lrg,
}

/// Reference sequence with optional specific locus and coordinate system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Accession (`NC_000001`) or LRG identifier (`LRG_24`)
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub specific_locus: Option<SpecificLocus>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub coordinate_system: Option<String>,
}

impl Reference {
    /// Reference with only an identifier, kind inferred from the LRG prefix
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        let kind = if id.starts_with("LRG") {
            ReferenceKind::Lrg
        } else {
            ReferenceKind::Genbank
        };
        Self {
            kind,
            id,
            version: None,
            specific_locus: None,
            coordinate_system: None,
        }
    }
}

/// Sub-region of a reference named after the accession
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpecificLocus {
    /// `(NM_004006.2)`
    Accession { id: String, version: String },
    /// `(SDHD)`, `(SDHD_v001)`, `(SDHD_i001)`
    Gene {
        id: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        selector: Option<GeneSelector>,
    },
    /// LRG transcript, e.g. `t1`
    LrgTranscript { id: String },
    /// LRG protein, e.g. `p1`
    LrgProtein { id: String },
}

/// Transcript variant or protein isoform number of a gene locus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneSelector {
    TranscriptVariant(String),
    ProteinIsoform(String),
}

/// Type of change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantKind {
    Substitution,
    Deletion,
    Duplication,
    Insertion,
    Inversion,
    Conversion,
    DeletionInsertion,
    Equal,
    Repeat,
    FrameShift,
    Extension,
}

impl VariantKind {
    /// Kind for a (normalized) variant rule name
    pub fn from_rule(rule: &str) -> Option<Self> {
        let kind = match rule {
            "substitution" => VariantKind::Substitution,
            "deletion" => VariantKind::Deletion,
            "duplication" => VariantKind::Duplication,
            "insertion" => VariantKind::Insertion,
            "inversion" => VariantKind::Inversion,
            "conversion" => VariantKind::Conversion,
            "deletion_insertion" => VariantKind::DeletionInsertion,
            "equal" => VariantKind::Equal,
            "repeat" => VariantKind::Repeat,
            "frame_shift" => VariantKind::FrameShift,
            "extension" => VariantKind::Extension,
            _ => return None,
        };
        Some(kind)
    }

    /// Operation keyword used in descriptions
    pub fn keyword(&self) -> &'static str {
        match self {
            VariantKind::Substitution => ">",
            VariantKind::Deletion => "del",
            VariantKind::Duplication => "dup",
            VariantKind::Insertion => "ins",
            VariantKind::Inversion => "inv",
            VariantKind::Conversion => "con",
            VariantKind::DeletionInsertion => "delins",
            VariantKind::Equal => "=",
            VariantKind::Repeat => "",
            VariantKind::FrameShift => "fs",
            VariantKind::Extension => "ext",
        }
    }
}

/// Where a variant or a piece of sequence material comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Literal material written in the description
    Description,
    /// The description's own reference
    Reference,
    /// Another reference, keyed into the [`ReferenceTable`]
    External(String),
}

/// A single variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    pub kind: VariantKind,
    pub source: Source,
    /// Absent only for a whole-description `=`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub deleted: Vec<SequenceSpec>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub inserted: Vec<SequenceSpec>,
    /// Allele member written in parentheses, e.g. `(12del)` in `[(12del);13del]`
    #[serde(default)]
    pub predicted: bool,
}

impl Variant {
    pub fn new(kind: VariantKind) -> Self {
        Self {
            kind,
            source: Source::Reference,
            location: None,
            deleted: Vec::new(),
            inserted: Vec::new(),
            predicted: false,
        }
    }
}

/// Direction relative to a position or to the coding sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// `-`
    Upstream,
    /// `+` for offsets, `*` for positions outside the CDS
    Downstream,
}

/// Offset from a position, e.g. an intronic `+5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Offset {
    Exact(i64),
    /// `+?` or `-?`
    Uncertain(Direction),
}

/// A single position
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    /// 1-based position; `None` when written as `?`
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub offset: Option<Offset>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub outside_cds: Option<Direction>,
    /// Amino acid preceding a protein position, e.g. `Arg` in `Arg12`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub amino_acid: Option<String>,
}

impl Point {
    pub fn new(position: u64) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    /// The position itself is unknown (`?`)
    pub fn is_uncertain(&self) -> bool {
        self.position.is_none()
    }
}

/// Span between two locations
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Box<Location>,
    pub end: Box<Location>,
    /// Written as `(start_end)`
    #[serde(default)]
    pub uncertain: bool,
}

/// A point or a (possibly nested) range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Location {
    Point(Point),
    Range(Range),
}

impl Location {
    pub fn point(position: u64) -> Self {
        Location::Point(Point::new(position))
    }

    pub fn range(start: Location, end: Location) -> Self {
        Location::Range(Range {
            start: Box::new(start),
            end: Box::new(end),
            uncertain: false,
        })
    }

    pub fn uncertain_range(start: Location, end: Location) -> Self {
        Location::Range(Range {
            start: Box::new(start),
            end: Box::new(end),
            uncertain: true,
        })
    }
}

/// A count of units: exact, unknown, or an uncertain range
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Length {
    /// `value` is `None` for `?`
    Point { value: Option<u64> },
    /// `(start_end)`
    Range {
        start: Option<u64>,
        end: Option<u64>,
    },
    /// `(value)`: an estimated count
    Uncertain { value: Option<u64> },
}

/// What a piece of deleted or inserted material consists of
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Content {
    Sequence(String),
    Length(Length),
    Location(Location),
    /// The whole of an external reference, e.g. `insNM_000001.1`
    Whole,
}

/// Deleted or inserted material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceSpec {
    pub content: Content,
    pub source: Source,
    #[serde(default)]
    pub inverted: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub repeat_number: Option<Length>,
}

impl SequenceSpec {
    /// Literal sequence written in the description
    pub fn sequence(sequence: impl Into<String>) -> Self {
        Self {
            content: Content::Sequence(sequence.into()),
            source: Source::Description,
            inverted: false,
            repeat_number: None,
        }
    }

    /// Count of units
    pub fn length(length: Length) -> Self {
        Self {
            content: Content::Length(length),
            source: Source::Description,
            inverted: false,
            repeat_number: None,
        }
    }

    /// Span of the description's own reference
    pub fn location(location: Location) -> Self {
        Self {
            content: Content::Location(location),
            source: Source::Reference,
            inverted: false,
            repeat_number: None,
        }
    }
}

/// Nested references collected during conversion, keyed by the text they
/// were written with (`NM_000001.1:c.` before a location, `NM_000001.1`
/// for a reference inserted whole)
pub type ReferenceTable = BTreeMap<String, Reference>;

/// Result of converting a tree parsed from any start rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "model", content = "value", rename_all = "snake_case")]
pub enum Model {
    Description(Description),
    Reference(Reference),
    Location(Location),
    Variants(Vec<Variant>),
    Variant(Variant),
    Inserted(Vec<SequenceSpec>),
}
