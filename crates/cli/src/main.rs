mod check;
mod metafile;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lineparser::{Invocation, LineParser, MatchConfig, MatchResult, Metadata};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::metafile::{handler_names, load_metadata, name_handlers, write_starter};

#[derive(Parser)]
#[command(name = "lineparse")]
#[command(version, about = "Check and exercise lineparser metadata files", long_about = None)]
struct Cli {
    /// Path to the metadata JSON file (default: ./lineparser.json)
    #[arg(short, long, global = true, env = "LINEPARSER_META", value_name = "FILE")]
    meta: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter lineparser.json
    Init(InitArgs),

    /// Validate the metadata file
    Check(CheckArgs),

    /// Print the help text rendered from the metadata
    Usage,

    /// Dispatch ARGS to the first matching usage and print the result
    Match(MatchArgs),

    /// Show how every usage matches ARGS
    Explain(ExplainArgs),
}

#[derive(Parser)]
struct InitArgs {
    /// Project directory (default: current directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Program name written into the metadata
    #[arg(short, long, default_value = "my-cli")]
    program: String,
}

#[derive(Parser)]
struct CheckArgs {
    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

#[derive(Parser)]
struct MatchArgs {
    /// Reject usages whose arguments contain unknown options
    #[arg(long)]
    strict: bool,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Argument vector to match (put it after `--`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

#[derive(Parser)]
struct ExplainArgs {
    /// Reject usages whose arguments contain unknown options
    #[arg(long)]
    strict: bool,

    /// Argument vector to match (put it after `--`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

/// Output settings handed to handlers as the parse context.
#[derive(Debug, Clone, Copy)]
struct Output {
    compact: bool,
}

#[derive(Serialize)]
struct Dispatched<'a> {
    usage: usize,
    handler: &'a str,
    result: &'a MatchResult,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();
    let meta_path = cli.meta.as_deref();

    match cli.command {
        Commands::Init(args) => init(args),
        Commands::Check(args) => check_command(meta_path, args),
        Commands::Usage => usage_command(meta_path),
        Commands::Match(args) => match_command(meta_path, args),
        Commands::Explain(args) => explain_command(meta_path, args),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let dir = args.dir.unwrap_or_else(|| PathBuf::from("."));
    let path = write_starter(&dir, &args.program)?;

    eprintln!("Created: {}", path.display());
    eprintln!("\nNext steps:");
    eprintln!("  1. Edit {} to describe your program", metafile::DEFAULT_META_NAME);
    eprintln!("  2. Run: lineparse check");
    eprintln!("  3. Run: lineparse match -- <args...>");

    Ok(())
}

fn print_dispatch(inv: &Invocation<'_, Output>) -> Result<(), lineparser::HandlerError> {
    let out = Dispatched {
        usage: inv.usage,
        handler: inv.handler,
        result: inv.result,
    };
    let compact = inv.context().is_some_and(|o| o.compact);
    let json = if compact {
        serde_json::to_string(&out)?
    } else {
        serde_json::to_string_pretty(&out)?
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Build a parser with every handler name bound to the JSON printer.
fn build_parser(mut meta: Metadata, config: MatchConfig) -> Result<LineParser<Output>> {
    name_handlers(&mut meta);

    let names = handler_names(&meta);

    let mut builder = LineParser::builder(meta).config(config);
    for name in names {
        builder = builder.handler(name, print_dispatch);
    }
    builder.build().context("invalid metadata")
}

fn check_command(meta_path: Option<&Path>, args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let loaded = load_metadata(meta_path)?;
    let report = check::check_metadata(&loaded.path, &loaded.meta);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("=== Metadata Check ===");
        eprintln!("Source: {}", report.source);
        eprintln!(
            "Program: {}",
            report.program.as_deref().unwrap_or("(invocation name)")
        );
        eprintln!("Subcommands: {}", report.subcommands.len());
        eprintln!("Flags: {}", report.flags);
        eprintln!("Parameters: {}", report.parameters);
        eprintln!("Usages: {}", report.usages);
        eprintln!("Handlers: {}", report.handlers.join(", "));
        if !report.unnamed_usages.is_empty() {
            eprintln!(
                "Note: usage(s) without a handler name: {:?}",
                report.unnamed_usages
            );
        }
    }

    if !report.is_valid() {
        bail!(
            "invalid metadata: {}",
            report.error.as_deref().unwrap_or_default()
        );
    }
    if !args.json {
        eprintln!("OK");
    }
    Ok(())
}

fn usage_command(meta_path: Option<&Path>) -> Result<()> {
    tracing::debug!("executing usage command");

    let loaded = load_metadata(meta_path)?;
    let parser = build_parser(loaded.meta, MatchConfig::default())?;
    print!("{}", parser.help()?);
    Ok(())
}

fn match_command(meta_path: Option<&Path>, args: MatchArgs) -> Result<()> {
    tracing::debug!(args = ?args.args, "executing match command");

    let loaded = load_metadata(meta_path)?;
    let config = MatchConfig {
        reject_unrecognized: args.strict,
    };
    let parser = build_parser(loaded.meta, config)?;
    let output = Output {
        compact: args.compact,
    };

    match parser.parse(&args.args, Some(&output))? {
        Some(usage) => tracing::debug!(usage, "handler finished"),
        None => tracing::info!("no usage matched"),
    }
    Ok(())
}

fn explain_command(meta_path: Option<&Path>, args: ExplainArgs) -> Result<()> {
    tracing::debug!(args = ?args.args, "executing explain command");

    let loaded = load_metadata(meta_path)?;
    let config = MatchConfig {
        reject_unrecognized: args.strict,
    };
    let parser = build_parser(loaded.meta, config)?;

    let mut first = None;
    for (i, r) in parser.explain(&args.args).iter().enumerate() {
        if r.matched && first.is_none() {
            first = Some(i);
        }
        let mark = if r.matched { "yes" } else { "no" };
        println!("{}\t{}\t{}", i + 1, mark, serde_json::to_string(r)?);
    }
    match first {
        Some(i) => eprintln!("Selected: usage {}", i + 1),
        None => eprintln!("Selected: none"),
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
