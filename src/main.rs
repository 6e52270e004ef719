//! tfinspect CLI entry point.
//!
//! This binary provides the command-line interface for tfinspect.

use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::process::ExitCode;
use tfinspect::cli::{Cli, Commands, ListArgs};
use tfinspect::reporter::{Report, Reporter};
use tfinspect::{Config, Entity, Inspector};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Configuration file names searched in the working directory.
const DEFAULT_CONFIG_PATHS: [&str; 3] = ["tfinspect.yaml", "tfinspect.yml", ".tfinspect.yaml"];

/// Exit code when rows were listed but some entities or files were skipped.
const EXIT_PARTIAL: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet, cli.log_json);

    match run(cli).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("Error: {e}");

            let mut source = e.source();
            if source.is_some() {
                eprintln!("\nCaused by:");
                let mut i = 0;
                while let Some(cause) = source {
                    eprintln!("  {i}: {cause}");
                    source = cause.source();
                    i += 1;
                }
            }

            let code = e
                .downcast_ref::<tfinspect::TfInspectError>()
                .map_or(1, tfinspect::TfInspectError::exit_code);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool, json: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        // RUST_LOG wins over the verbosity flags
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let level = match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            };
            EnvFilter::new(format!("warn,tfinspect={level}"))
        })
    };

    // Logs go to stderr so rows on stdout stay machine-readable.
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_thread_ids(false).with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    tracing::debug!("Loading configuration");
    let config = load_config(&cli)?;

    match cli.command {
        Commands::List(args) => list(config, &args).await,

        Commands::Init => {
            let config_path = Path::new(DEFAULT_CONFIG_PATHS[0]);
            if config_path.exists() {
                anyhow::bail!("Configuration file already exists: {}", config_path.display());
            }

            std::fs::write(config_path, Config::example_yaml())?;
            println!("Created example configuration: {}", config_path.display());
            Ok(ExitCode::SUCCESS)
        }

        Commands::Validate(args) => {
            let content = std::fs::read_to_string(&args.config)?;
            match Config::from_yaml(&content).and_then(|config| config.validate()) {
                Ok(()) => {
                    println!("Configuration is valid: {}", args.config.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(tfinspect::TfInspectError::Multiple { errors, .. }) => {
                    for e in &errors {
                        eprintln!("Configuration error: {e}");
                    }
                    Ok(ExitCode::from(1))
                }
                Err(e) => {
                    eprintln!("Configuration error: {e}");
                    Ok(ExitCode::from(1))
                }
            }
        }
    }
}

async fn list(mut config: Config, args: &ListArgs) -> anyhow::Result<ExitCode> {
    config.merge_cli_args(args);
    config.validate()?;
    tracing::debug!(table = %args.table, format = ?args.format, "Executing list command");

    let inspector = Inspector::new(config.clone());
    let mut rows: Vec<Entity> = Vec::new();
    let summary = inspector.list(args.table, &mut rows).await?;

    let report = Report { table: args.table, rows: &rows, summary: &summary };
    let rendered = Reporter::new(&config).generate(&report, args.format)?;

    if let Some(output_path) = &args.output {
        std::fs::write(output_path, &rendered)?;
        tracing::info!(path = %output_path.display(), rows = rows.len(), "Rows written");
    } else {
        print!("{rendered}");
    }

    for error in &summary.skipped {
        tracing::warn!(error = %error, "Entity skipped");
    }

    if summary.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(EXIT_PARTIAL))
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    if let Some(ref config_path) = cli.config {
        tracing::debug!(path = %config_path.display(), "Loading configuration from explicit path");
        let content = std::fs::read_to_string(config_path)?;
        return Ok(Config::from_yaml(&content)?);
    }

    tracing::debug!("Searching for default configuration files");
    for path in &DEFAULT_CONFIG_PATHS {
        if Path::new(path).exists() {
            tracing::debug!(path = %path, "Found configuration file");
            let content = std::fs::read_to_string(path)?;
            return Ok(Config::from_yaml(&content)?);
        }
    }

    tracing::debug!("No configuration file found, using default configuration");
    Ok(Config::default())
}
