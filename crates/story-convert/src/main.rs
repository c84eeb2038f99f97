//! `story-convert` command line: convert classic documents and validate story graphs

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use story_convert::{ConvertConfig, ConvertOptions, Converter, KeepRemote, ProgressEvent};
use story_graph::{Diagnostics, Graph, StructuralValidator};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("story-convert")
        .version(story_convert::VERSION)
        .about("Convert classic story documents into story graphs")
        .arg_required_else_help(true)
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert a classic document (media stays at its remote URL)")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Classic document JSON"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Write the graph here instead of stdout"),
                )
                .arg(
                    Arg::new("config")
                        .long("config")
                        .value_parser(value_parser!(PathBuf))
                        .help("TOML conversion settings"),
                )
                .arg(
                    Arg::new("theme")
                        .long("theme")
                        .help("Story theme, overrides the config file"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a story graph and print its diagnostics")
                .arg(
                    Arg::new("graph")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Story graph JSON"),
                ),
        )
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_diagnostics(diagnostics: &Diagnostics) {
    for issue in &diagnostics.errors {
        eprintln!("error: {issue}");
    }
    for issue in &diagnostics.warnings {
        eprintln!("warning: {issue}");
    }
    eprintln!(
        "{} error(s), {} warning(s)",
        diagnostics.errors.len(),
        diagnostics.warnings.len()
    );
}

async fn convert(args: &ArgMatches) -> Result<bool> {
    let input = args
        .get_one::<PathBuf>("input")
        .context("input path is required")?;
    let mut config = match args.get_one::<PathBuf>("config") {
        Some(path) => ConvertConfig::load(path)?,
        None => ConvertConfig::default(),
    };
    if let Some(theme) = args.get_one::<String>("theme") {
        config = config.with_theme(theme);
    }

    let text = std::fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let options = ConvertOptions::new(config)
        .with_uploader(Arc::new(KeepRemote))
        .with_progress(Arc::new(|event: &ProgressEvent| {
            tracing::debug!(stage = ?event.stage, current = ?event.current, total = ?event.total, "{}", event.message);
        }));
    let conversion = Converter::new()
        .convert_str(&text, &options)
        .await
        .with_context(|| format!("converting {}", input.display()))?;

    let json = conversion.graph.to_json_pretty()?;
    match args.get_one::<PathBuf>("output") {
        Some(path) => std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{json}"),
    }
    print_diagnostics(&conversion.diagnostics);
    Ok(conversion.is_publishable())
}

fn validate(args: &ArgMatches) -> Result<bool> {
    let path = args
        .get_one::<PathBuf>("graph")
        .context("graph path is required")?;
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let graph = Graph::from_json(&text).with_context(|| format!("parsing {}", path.display()))?;

    let diagnostics = StructuralValidator::new().validate(&graph);
    print_diagnostics(&diagnostics);
    Ok(diagnostics.is_clean())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("json-logs"));

    let clean = match matches.subcommand() {
        Some(("convert", args)) => convert(args).await?,
        Some(("validate", args)) => validate(args)?,
        _ => {
            cli().print_help()?;
            true
        }
    };

    std::process::exit(if clean { 0 } else { 1 });
}
