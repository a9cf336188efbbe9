//! Protein rule normalization
//!
//! Renames the protein sub-grammar's rules onto the nucleotide vocabulary
//! (`p_location` becomes `location`, `p_inserted` becomes `inserted`, ...)
//! so the converter has a single code path. Frame shifts and extensions
//! are reshaped so that their trailing material is an `inserted` list.

use crate::error::FerroError;
use crate::tree::Derivation;

/// Protein rule name to shared rule name
pub const RENAMES: &[(&str, &str)] = &[
    ("p_variants", "variants"),
    ("p_variants_predicted", "variants_predicted"),
    ("p_variant", "variant"),
    ("p_variant_predicted", "variant_predicted"),
    ("p_location", "location"),
    ("p_range", "range"),
    ("p_point", "point"),
    ("p_length", "length"),
    ("p_uncertain_length", "uncertain_length"),
    ("p_deletion", "deletion"),
    ("p_deletion_insertion", "deletion_insertion"),
    ("p_duplication", "duplication"),
    ("p_equal", "equal"),
    ("p_insertion", "insertion"),
    ("p_repeat", "repeat"),
    ("p_repeat_number", "repeat_number"),
    ("p_substitution", "substitution"),
    ("p_inserted", "inserted"),
    ("p_insert", "insert"),
];

fn shared_name(name: &str) -> Option<&'static str> {
    RENAMES
        .iter()
        .find(|(protein, _)| *protein == name)
        .map(|(_, shared)| *shared)
}

/// Normalize a disambiguated tree.
///
/// Token payloads and child order are preserved; applying the
/// normalization twice gives the same tree.
pub fn normalize(tree: Derivation) -> Result<Derivation, FerroError> {
    match tree {
        Derivation::Token { .. } => Ok(tree),
        Derivation::Ambig { .. } => Err(FerroError::malformed(
            "_ambig",
            "ambiguity node reached normalization",
        )),
        Derivation::Rule { name, children } => {
            let children = children
                .into_iter()
                .map(normalize)
                .collect::<Result<Vec<_>, _>>()?;
            match name.as_str() {
                "extension_n" => extension_n(children),
                "extension_c" => extension_c(children),
                "extension" => match <[Derivation; 1]>::try_from(children) {
                    Ok([inner]) if inner.is_rule("inserted") => {
                        Ok(Derivation::rule("extension", vec![inner]))
                    }
                    Ok([inner]) => Err(FerroError::malformed(
                        "extension",
                        format!("unexpected child {}", inner),
                    )),
                    Err(children) => Err(FerroError::malformed(
                        "extension",
                        format!("expected one child, found {}", children.len()),
                    )),
                },
                "frame_shift" => frame_shift(children),
                _ => {
                    let name = shared_name(&name).map(str::to_string).unwrap_or(name);
                    Ok(Derivation::Rule { name, children })
                }
            }
        }
    }
}

fn insert(child: Derivation) -> Derivation {
    Derivation::rule("insert", vec![child])
}

fn located(point: Derivation) -> Derivation {
    insert(Derivation::rule("location", vec![point]))
}

/// `ext-5`: the upstream start becomes a `-5` point.
fn extension_n(children: Vec<Derivation>) -> Result<Derivation, FerroError> {
    match children.as_slice() {
        [number @ Derivation::Token { .. }] => {
            let point = Derivation::rule(
                "point",
                vec![Derivation::token("OUTSIDE_CDS", "-"), number.clone()],
            );
            Ok(Derivation::rule("inserted", vec![located(point)]))
        }
        _ => Err(FerroError::malformed(
            "extension_n",
            "expected a single number",
        )),
    }
}

/// `GlnextTer17` / `GlnextGln`: new amino acids then the new stop.
fn extension_c(children: Vec<Derivation>) -> Result<Derivation, FerroError> {
    inserted("extension_c", children)
}

/// `fs`, `Profs`, `ProfsTer23`, `fsTer23`
fn frame_shift(children: Vec<Derivation>) -> Result<Derivation, FerroError> {
    if children.iter().all(|c| c.is_rule("inserted")) {
        return Ok(Derivation::rule("frame_shift", children));
    }
    Ok(Derivation::rule(
        "frame_shift",
        vec![inserted("frame_shift", children)?],
    ))
}

/// Wrap amino acid sequences and points as `inserted` entries
fn inserted(rule: &str, children: Vec<Derivation>) -> Result<Derivation, FerroError> {
    let mut inserts = Vec::with_capacity(children.len());
    for child in children {
        let entry = match &child {
            Derivation::Token { .. } => insert(child),
            Derivation::Rule { name, .. } if name == "point" => located(child),
            other => {
                return Err(FerroError::malformed(
                    rule,
                    format!("unexpected child {}", other),
                ))
            }
        };
        inserts.push(entry);
    }
    Ok(Derivation::rule("inserted", inserts))
}
