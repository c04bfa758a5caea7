use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sar_parser::catalog::{Catalog, SectionKind};
use sar_parser::config::Config;
use sar_parser::display::{DisplayManager, JsonOutput};
use sar_parser::logging::init_logging;
use sar_parser::parser::{ParseOptions, SarParser};
use sar_parser::SarSource;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::process;
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "sar-parse")]
#[command(about = "Parse sysstat SAR text reports into time series")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse SAR files and show a summary of every section
    Report {
        /// Files or glob patterns (e.g. /var/log/sa/sar*)
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only this section (CPU, MEM, SWP, IO, TASK)
        #[arg(long)]
        section: Option<SectionKind>,
    },
    /// Print the report date of each file
    Date {
        /// Files or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Show the effective configuration
    Config {
        /// Write the effective configuration to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Configuration error: {:#}", e);
            process::exit(1);
        }
    };
    let _guard = init_logging(&config.logging, &config.paths.log_directory);

    let json = match &cli.command {
        Commands::Report { json, .. } | Commands::Date { json, .. } => *json,
        Commands::Config { .. } => false,
    };

    match run(cli.command, &config) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => handle_error(e, json),
    }
}

/// Returns whether every file was processed successfully.
fn run(command: Commands, config: &Config) -> Result<bool> {
    match command {
        Commands::Report { patterns, json, section } => {
            let files = expand_patterns(&patterns)?;
            let catalog = config.catalog()?;
            let options = config.parse_options();
            report_files(&files, &catalog, &options, config, json, section)
        }
        Commands::Date { patterns, json } => {
            let files = expand_patterns(&patterns)?;
            date_files(&files, config, json)
        }
        Commands::Config { save } => {
            show_config(config, save)?;
            Ok(true)
        }
    }
}

fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let before = files.len();
        for entry in glob::glob(pattern).with_context(|| format!("Invalid pattern: {}", pattern))? {
            let path = entry.with_context(|| format!("Cannot read match of {}", pattern))?;
            if path.is_file() {
                files.push(path);
            }
        }
        if files.len() == before {
            anyhow::bail!("No files match {}", pattern);
        }
    }
    debug!(files = files.len(), "Expanded input patterns");
    Ok(files)
}

fn report_files(
    files: &[PathBuf],
    catalog: &Catalog,
    options: &ParseOptions,
    config: &Config,
    json: bool,
    section: Option<SectionKind>,
) -> Result<bool> {
    let display = DisplayManager::new(config.output.json_pretty);
    let mut parsed = Vec::new();

    for path in files {
        let name = path.display().to_string();
        let mut parser = SarParser::with_catalog(SarSource::file(path), catalog.clone(), options.clone());

        let loaded: Result<()> = match parser.load() {
            Ok(report) if !json => display.display_report(&name, report, section),
            Ok(_) => Ok(()),
            Err(e) => {
                error!(file = %name, error = %e, "Failed to parse SAR file");
                if !json {
                    eprintln!("❌ {}: {}", name, e);
                }
                Err(e.into())
            }
        };
        parsed.push((name, loaded.map(|_| parser)));
    }

    let all_ok = parsed.iter().all(|(_, outcome)| outcome.is_ok());
    if json {
        let rendered = match parsed.as_slice() {
            [(_, Ok(parser))] => match parser.cached_report() {
                Some(report) => display.to_json(report, section)?,
                None => display.render_json(&Value::Null)?,
            },
            _ => {
                let outputs: Vec<(String, JsonOutput<'_>)> = parsed
                    .iter()
                    .map(|(name, outcome)| {
                        let output = match outcome.as_ref().map(SarParser::cached_report) {
                            Ok(Some(report)) => JsonOutput::report(report, section),
                            Ok(None) => JsonOutput::Section(None),
                            Err(e) => JsonOutput::Error { error: e.to_string() },
                        };
                        (name.clone(), output)
                    })
                    .collect();
                display.render_outputs(&outputs)?
            }
        };
        println!("{}", rendered);
    }
    Ok(all_ok)
}

fn date_files(files: &[PathBuf], config: &Config, json: bool) -> Result<bool> {
    let display = DisplayManager::new(config.output.json_pretty);
    let mut dates = Vec::new();

    for path in files {
        let name = path.display().to_string();
        let mut parser = SarParser::new(SarSource::file(path));

        match parser.file_date() {
            Ok(date) => {
                if !json {
                    println!("{}\t{}", name, date);
                }
                dates.push((name, Ok(date.to_string())));
            }
            Err(e) => {
                if !json {
                    eprintln!("❌ {}: {}", name, e);
                }
                dates.push((name, Err(e.to_string())));
            }
        }
    }

    let all_ok = dates.iter().all(|(_, date)| date.is_ok());
    if json {
        let outputs: Vec<(String, JsonOutput<'_>)> = dates
            .iter()
            .map(|(name, date)| {
                let output = match date {
                    Ok(date) => JsonOutput::Date(date),
                    Err(error) => JsonOutput::Error { error: error.clone() },
                };
                (name.clone(), output)
            })
            .collect();
        println!("{}", display.render_outputs(&outputs)?);
    }
    Ok(all_ok)
}

#[cfg(feature = "basic")]
fn show_config(config: &Config, save: Option<PathBuf>) -> Result<()> {
    match save {
        Some(path) => {
            config.save_to_file(&path)?;
            println!("✅ Configuration saved to {}", path.display());
        }
        None => print!("{}", config.to_toml()?),
    }
    Ok(())
}

#[cfg(not(feature = "basic"))]
fn show_config(config: &Config, save: Option<PathBuf>) -> Result<()> {
    if save.is_some() {
        anyhow::bail!("Saving configuration needs the `basic` feature");
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

fn handle_error(e: anyhow::Error, json: bool) -> ! {
    if json {
        println!("{}", json!({ "error": format!("{:#}", e) }));
    } else {
        eprintln!("Error: {:#}", e);
    }
    process::exit(1);
}
