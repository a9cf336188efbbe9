// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-hgvs-grammar: HGVS description parser
//!
//! Part of the ferro bioinformatics toolkit.
//!
//! Descriptions are parsed with an Earley grammar into a forest, the
//! forest is disambiguated by an ordered rule table, and the resulting tree
//! is converted into a typed description model that renders back to text.
//!
//! # Example
//!
//! ```
//! use ferro_hgvs_grammar::{parse_description, VariantKind};
//!
//! let (description, _) = parse_description("NC_000001.10:c.58del").unwrap();
//! assert_eq!(description.variants[0].kind, VariantKind::Deletion);
//! assert_eq!(description.to_string(), "NC_000001.10:c.58del");
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod grammar;
pub mod hgvs;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod tree;

// Re-export commonly used types
pub use error::{Diagnostic, ErrorCode, FerroError};
pub use grammar::Grammar;
pub use hgvs::model::{
    Description, DescriptionKind, Location, Model, Reference, ReferenceTable, SequenceSpec,
    Variant, VariantKind,
};
pub use hgvs::render::render;
pub use hgvs::{parse_description, parse_fragment, parse_tree, HgvsParser, ParserOptions, StartRule};
pub use tree::Derivation;

/// Result type alias for ferro-hgvs-grammar operations
pub type Result<T> = std::result::Result<T, FerroError>;
