//! Loader for Lark-flavoured EBNF grammar text.
//!
//! Supported syntax:
//!
//! ```text
//! // comment
//! rule: item item | item ("x" | y)* [z] w+
//!     | continuation alternative
//! ?maybe_inlined: a | b
//! _always_inlined: a | b
//! TERMINAL: "literal" | /regex/i
//! %ignore TERMINAL
//! ```
//!
//! Lines starting with `|` continue the previous definition.

use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, take_while},
    character::complete::{anychar, char, one_of, satisfy, space0, space1},
    combinator::{all_consuming, map, opt, recognize, rest, verify},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult, Parser,
};

use crate::error::FerroError;

/// A regular expression written between slashes
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pattern {
    pub source: String,
    pub case_insensitive: bool,
}

/// Quantifier following an expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Quantifier {
    /// `x?`
    Optional,
    /// `x*`
    ZeroOrMore,
    /// `x+`
    OneOrMore,
}

/// An expression inside a rule body
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Expr {
    /// Reference to a rule or a named terminal
    Name(String),
    /// Anonymous string literal
    Literal(String),
    /// Anonymous regular expression
    Pattern(Pattern),
    /// `( a | b )`
    Group(Vec<Vec<Expr>>),
    /// `[ a | b ]`
    Optional(Vec<Vec<Expr>>),
    /// Quantified expression
    Repeat(Box<Expr>, Quantifier),
}

/// One alternative of a terminal definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TerminalAtom {
    Literal(String),
    Pattern(Pattern),
}

/// A top-level grammar statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Definition {
    Rule {
        name: String,
        /// Declared with a leading `?`
        inline_single: bool,
        alternatives: Vec<Vec<Expr>>,
    },
    Terminal {
        name: String,
        alternatives: Vec<TerminalAtom>,
    },
    Ignore(String),
}

/// Terminal names are upper-case after any leading underscores.
pub(crate) fn is_terminal_name(name: &str) -> bool {
    name.trim_start_matches('_')
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Load grammar text into a list of definitions.
pub(crate) fn load(text: &str) -> Result<Vec<Definition>, FerroError> {
    logical_lines(text)
        .into_iter()
        .map(|(number, line)| {
            all_consuming(terminated(definition, trailing))
                .parse(line.as_str())
                .map(|(_, definition)| definition)
                .map_err(|_| {
                    FerroError::grammar(format!("line {}: cannot read definition '{}'", number, line))
                })
        })
        .collect()
}

/// Join continuation lines and drop blanks and comments.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        if line.starts_with('|') {
            if let Some((_, previous)) = lines.last_mut() {
                previous.push(' ');
                previous.push_str(line);
                continue;
            }
        }
        lines.push((index + 1, line.to_string()));
    }
    lines
}

fn trailing(input: &str) -> IResult<&str, ()> {
    map(pair(space0, opt(preceded(tag("//"), rest))), |_| ()).parse(input)
}

fn definition(input: &str) -> IResult<&str, Definition> {
    alt((ignore_directive, terminal_definition, rule_definition)).parse(input)
}

fn ignore_directive(input: &str) -> IResult<&str, Definition> {
    map(preceded(pair(tag("%ignore"), space1), name), |name| {
        Definition::Ignore(name.to_string())
    })
    .parse(input)
}

fn terminal_definition(input: &str) -> IResult<&str, Definition> {
    let (input, name) = terminated(
        verify(name, |n: &str| is_terminal_name(n)),
        delimited(space0, char(':'), space0),
    )
    .parse(input)?;
    let (input, alternatives) =
        separated_list1(delimited(space0, char('|'), space0), terminal_atom).parse(input)?;
    Ok((
        input,
        Definition::Terminal {
            name: name.to_string(),
            alternatives,
        },
    ))
}

fn terminal_atom(input: &str) -> IResult<&str, TerminalAtom> {
    alt((
        map(literal, TerminalAtom::Literal),
        map(pattern, TerminalAtom::Pattern),
    ))
    .parse(input)
}

fn rule_definition(input: &str) -> IResult<&str, Definition> {
    let (input, inline_single) = map(opt(char('?')), |mark| mark.is_some()).parse(input)?;
    let (input, name) = terminated(
        verify(name, |n: &str| !is_terminal_name(n)),
        delimited(space0, char(':'), space0),
    )
    .parse(input)?;
    let (input, alternatives) = alternatives(input)?;
    Ok((
        input,
        Definition::Rule {
            name: name.to_string(),
            inline_single,
            alternatives,
        },
    ))
}

fn alternatives(input: &str) -> IResult<&str, Vec<Vec<Expr>>> {
    separated_list1(delimited(space0, char('|'), space0), sequence).parse(input)
}

fn sequence(input: &str) -> IResult<&str, Vec<Expr>> {
    many1(preceded(space0, item)).parse(input)
}

fn item(input: &str) -> IResult<&str, Expr> {
    map(pair(atom, opt(one_of("?*+"))), |(atom, quantifier)| {
        match quantifier {
            Some('?') => Expr::Repeat(Box::new(atom), Quantifier::Optional),
            Some('*') => Expr::Repeat(Box::new(atom), Quantifier::ZeroOrMore),
            Some('+') => Expr::Repeat(Box::new(atom), Quantifier::OneOrMore),
            _ => atom,
        }
    })
    .parse(input)
}

fn atom(input: &str) -> IResult<&str, Expr> {
    alt((
        map(
            delimited(pair(char('('), space0), alternatives, pair(space0, char(')'))),
            Expr::Group,
        ),
        map(
            delimited(pair(char('['), space0), alternatives, pair(space0, char(']'))),
            Expr::Optional,
        ),
        map(literal, Expr::Literal),
        map(pattern, Expr::Pattern),
        map(name, |name: &str| Expr::Name(name.to_string())),
    ))
    .parse(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn escaped_or(forbidden: &'static str) -> impl FnMut(&str) -> IResult<&str, &str> {
    move |input: &str| {
        alt((recognize(pair(char('\\'), anychar)), is_not(forbidden))).parse(input)
    }
}

fn literal(input: &str) -> IResult<&str, String> {
    map(
        delimited(char('"'), recognize(many0(escaped_or("\"\\"))), char('"')),
        unescape,
    )
    .parse(input)
}

fn pattern(input: &str) -> IResult<&str, Pattern> {
    map(
        pair(
            delimited(char('/'), recognize(many1(escaped_or("/\\"))), char('/')),
            take_while(|c: char| c == 'i'),
        ),
        |(source, flags): (&str, &str)| Pattern {
            source: source.replace("\\/", "/"),
            case_insensitive: !flags.is_empty(),
        },
    )
    .parse(input)
}

fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}
