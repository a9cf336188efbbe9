// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! ferro-grammar CLI
//!
//! Command-line interface for parsing HGVS descriptions and inspecting
//! their derivation trees.

use clap::{Parser, Subcommand};
use ferro_hgvs_grammar::cli::{
    check_description, output_error, output_error_with_context, output_result,
    read_descriptions, CheckOutcome, CheckSummary, OutputFormat,
};
use ferro_hgvs_grammar::config::ParserConfig;
use ferro_hgvs_grammar::grammar::terminals::TERMINALS;
use ferro_hgvs_grammar::hgvs::resolve::resolve;
use ferro_hgvs_grammar::{FerroError, HgvsParser, StartRule};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "ferro-grammar")]
#[command(author, version, about = "HGVS description parser")]
#[command(
    long_about = "Parse HGVS descriptions into a typed model and back.

Examples:
  ferro-grammar parse 'NM_004006.2:c.169_170insA'
  ferro-grammar parse -f json 'NP_003997.1:p.(Arg97ProfsTer23)'
  ferro-grammar parse --start-rule location '(?_10)_20'
  ferro-grammar tree --raw 'NC_000001.10:c.10_20ins5'
  ferro-grammar check -i corpus.txt"
)]
struct Cli {
    /// Log level filter (e.g. info, debug, ferro_hgvs_grammar=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Configuration file (defaults to .ferro-grammar.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not skip whitespace between tokens
    #[arg(long, global = true)]
    strict_whitespace: bool,

    /// Grammar engine time budget in milliseconds (0 for no limit, default 5000)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse descriptions and print the model or its canonical rendering
    Parse {
        /// Description to parse (reads stdin when neither this nor --input is given)
        description: Option<String>,

        /// Input file (one description per line)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Grammar rule to start from
        #[arg(long)]
        start_rule: Option<StartRule>,

        /// Output format
        #[arg(short = 'f', long, default_value = "text", value_parser = ["text", "json"])]
        format: String,
    },

    /// Print the derivation tree of a description
    Tree {
        /// Description to parse
        description: String,

        /// Print the forest before disambiguation
        #[arg(long)]
        raw: bool,

        /// Grammar rule to start from
        #[arg(long)]
        start_rule: Option<StartRule>,
    },

    /// Parse a corpus and report ambiguities, failures and round-trip mismatches
    Check {
        /// Input file (one description per line, stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Print every description, not only the failing ones
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the terminal dictionary used in error messages
    Terminals,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("{}", e);
        std::process::exit(2);
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}", e.detailed_message());
            std::process::exit(2);
        }
    }
}

/// Returns whether every input was processed successfully
fn run(cli: Cli) -> Result<bool, FerroError> {
    let file_config = match &cli.config {
        Some(path) => ParserConfig::load_from_path(path).map_err(|e| FerroError::Io {
            msg: e.to_string(),
        })?,
        None => ParserConfig::load().unwrap_or_default(),
    };
    let ignore_whitespace = cli.strict_whitespace.then_some(false);

    match cli.command {
        Commands::Parse {
            description,
            input,
            start_rule,
            format,
        } => {
            let config = file_config.merge_with_cli(ignore_whitespace, start_rule, cli.timeout_ms);
            let parser = config.build_parser()?;
            let format: OutputFormat = format.parse().unwrap_or_default();
            let lines = read_inputs(description, input.as_deref())?;
            parse_lines(&parser, &lines, format)
        }
        Commands::Tree {
            description,
            raw,
            start_rule,
        } => {
            let config = file_config.merge_with_cli(ignore_whitespace, start_rule, cli.timeout_ms);
            let parser = config.build_parser()?;
            let forest = parser.parse_forest(&description)?;
            let tree = if raw { forest } else { resolve(forest)? };
            println!("{}", tree.pretty());
            Ok(true)
        }
        Commands::Check { input, verbose } => {
            let config = file_config.merge_with_cli(ignore_whitespace, None, cli.timeout_ms);
            let parser = config.build_parser()?;
            let lines = read_inputs(None, input.as_deref())?;
            check_lines(&parser, &lines, verbose)
        }
        Commands::Terminals => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for (name, description) in TERMINALS {
                writeln!(out, "{:<24} {}", name, description)?;
            }
            Ok(true)
        }
    }
}

/// Numbered input lines from the argument, a file, or stdin
fn read_inputs(
    description: Option<String>,
    input: Option<&Path>,
) -> Result<Vec<(usize, String)>, FerroError> {
    if let Some(description) = description {
        return Ok(vec![(1, description)]);
    }
    let reader: Box<dyn BufRead> = match input {
        Some(path) => {
            info!("reading descriptions from {}", path.display());
            Box::new(BufReader::new(File::open(path)?))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };
    let lines = read_descriptions(reader)?;
    debug!("read {} descriptions", lines.len());
    Ok(lines)
}

fn parse_lines(
    parser: &HgvsParser,
    lines: &[(usize, String)],
    format: OutputFormat,
) -> Result<bool, FerroError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stderr = io::stderr();
    let mut err = stderr.lock();
    let mut all_ok = true;
    let numbered = lines.len() > 1;

    for (line_number, text) in lines {
        match parser.parse(text) {
            Ok((model, references)) => output_result(&mut out, text, &model, &references, format)?,
            Err(e) => {
                all_ok = false;
                if numbered {
                    output_error_with_context(&mut err, text, &e, format, Some(*line_number))?;
                } else {
                    output_error(&mut err, text, &e, format)?;
                }
            }
        }
    }
    Ok(all_ok)
}

fn check_lines(
    parser: &HgvsParser,
    lines: &[(usize, String)],
    verbose: bool,
) -> Result<bool, FerroError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut summary = CheckSummary::default();

    for (line_number, text) in lines {
        let outcome = check_description(parser, text);
        summary.record(&outcome);
        match &outcome {
            CheckOutcome::Ok if verbose => writeln!(out, "ok        {}", text)?,
            CheckOutcome::Ok => {}
            CheckOutcome::Ambiguous { rule, candidates } => writeln!(
                out,
                "AMBIGUOUS line {}: {} ({} candidates in '{}')",
                line_number, text, candidates, rule
            )?,
            CheckOutcome::Failed(e) => {
                writeln!(out, "FAILED    line {}: {} - {}", line_number, text, e)?
            }
            CheckOutcome::Mismatch { rendered } => writeln!(
                out,
                "MISMATCH  line {}: {} -> {}",
                line_number, text, rendered
            )?,
        }
    }

    writeln!(
        out,
        "{} descriptions: {} ok, {} ambiguous, {} failed, {} mismatched",
        summary.total, summary.ok, summary.ambiguous, summary.failed, summary.mismatched
    )?;
    Ok(summary.all_ok())
}

fn init_tracing(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter =
        EnvFilter::try_new(level).map_err(|e| format!("Invalid log level '{}': {}", level, e))?;

    // also installs the log -> tracing bridge for the library's log records
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .try_init()?;

    debug!("Tracing initialized with level: {}", level);

    Ok(())
}
