//! Human-readable names for grammar terminals, used in syntax diagnostics.

/// Terminal name to human-readable description
pub const TERMINALS: &[(&str, &str)] = &[
    ("ACCESSION", "accession (e.g., NG_012337)"),
    ("VERSION", "version (e.g., \"1\")"),
    ("GENE_NAME", "gene name (e.g., SDHD)"),
    (
        "GENBANK_LOCUS_SELECTOR",
        "genbank locus selector (e.g., _v001, _i001)",
    ),
    ("LRG_LOCUS", "lrg specific locus (e.g., p1, t1)"),
    ("COORDINATE_SYSTEM", "coordinate system (e.g., \"g\", \"c\")"),
    ("NUMBER", "number (e.g., 100)"),
    ("UNKNOWN", "\"?\" for an unknown position or length"),
    ("OFFSET", "position offset (e.g., +5, -10, +?)"),
    ("OUTSIDE_CDS", "outside CDS (\"*\" or \"-\")"),
    ("SEQUENCE", "sequence (e.g., ATG)"),
    ("P_SEQUENCE", "amino acid sequence (e.g., Cys, CysGly, C)"),
    ("AA", "amino acid (e.g., Arg, R, Ter)"),
    ("INVERTED", "inv"),
    (
        "DOT",
        "\".\" between the coordinate system and the operation(s)",
    ),
    (
        "COLON",
        "\":\" between the reference part and the coordinate system",
    ),
    (
        "UNDERSCORE",
        "\"_\" between start and end in range or uncertain positions",
    ),
    ("LPAR", "\"(\" for an uncertain position start"),
    ("RPAR", "\")\" for an uncertain position end"),
    ("SEMICOLON", "\";\" to separate variants"),
    ("LSQB", "\"[\" for multiple variants, insertions, or repeats"),
    ("RSQB", "\"]\" for multiple variants, insertions, or repeats"),
    ("MORETHAN", "\">\" in a substitution operation"),
    ("EQUAL", "\"=\" to indicate no changes"),
    ("MINUS", "\"-\" before an N-terminal extension length"),
    ("DEL", "deletion operation (e.g., 10del)"),
    ("DUP", "duplication operation (e.g., 10dup)"),
    ("INS", "insertion operation (e.g., 11_12insTA, ins10_20)"),
    ("CON", "conversion operation (e.g., 10_12con20_22)"),
    ("DELINS", "deletion-insertion operation (e.g., Cys28delinsTrpVal)"),
    ("FS", "frame shift (e.g., Arg97ProfsTer23)"),
    ("EXT", "extension (e.g., Met1ext-5)"),
    ("P", "\"p\" protein coordinate system"),
];

/// Look up the human-readable description of a terminal.
///
/// Unknown terminals are returned as-is.
///
/// # Examples
///
/// ```
/// use ferro_hgvs_grammar::grammar::terminals::describe_terminal;
///
/// assert_eq!(describe_terminal("ACCESSION"), "accession (e.g., NG_012337)");
/// assert_eq!(describe_terminal("__ANON_0"), "__ANON_0");
/// ```
pub fn describe_terminal(name: &str) -> String {
    TERMINALS
        .iter()
        .find(|(terminal, _)| *terminal == name)
        .map(|(_, description)| description.to_string())
        .unwrap_or_else(|| name.to_string())
}

/// Name for an anonymous literal used inside a rule.
///
/// Punctuation gets a fixed name and alphanumeric words are upper-cased,
/// so `":"` becomes `COLON` and `"del"` becomes `DEL`.
pub(crate) fn literal_name(literal: &str) -> Option<String> {
    let name = match literal {
        "." => "DOT",
        ":" => "COLON",
        "_" => "UNDERSCORE",
        "(" => "LPAR",
        ")" => "RPAR",
        ";" => "SEMICOLON",
        "[" => "LSQB",
        "]" => "RSQB",
        ">" => "MORETHAN",
        "<" => "LESSTHAN",
        "=" => "EQUAL",
        "-" => "MINUS",
        "+" => "PLUS",
        "*" => "STAR",
        "?" => "QMARK",
        "," => "COMMA",
        "/" => "SLASH",
        _ if !literal.is_empty() && literal.chars().all(|c| c.is_ascii_alphanumeric()) => {
            return Some(literal.to_ascii_uppercase());
        }
        _ => return None,
    };
    Some(name.to_string())
}
