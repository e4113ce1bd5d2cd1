//! Batch TTS command-line interface.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use tts_core::LoggingConfig;

mod commands;

/// Two-stage TTS inference CLI (acoustic model + vocoder)
#[derive(Debug, Parser)]
#[command(name = "tts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (defaults to the config file's level, then "info")
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Log format (json or text)
    #[arg(long, global = true)]
    log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Json,
    Text,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Synthesize every utterance of a manifest into <output-dir>/<utt_id>.wav
    Synth(commands::synth::SynthArgs),

    /// Convert text to phone/tone ids (dry run)
    Frontend(commands::frontend::FrontendArgs),

    /// Show the declared slots of an exported model and its resolved variant
    Inspect(commands::inspect::InspectArgs),

    /// Show version and supported models
    Info,
}

/// Global flags override the config file's `logging` section.
fn init_logging(cli: &Cli, file: &LoggingConfig) {
    let mut config = file.clone();
    if let Some(level) = &cli.log_level {
        config.level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.format = match format {
            LogFormatArg::Json => "json",
            LogFormatArg::Text => "text",
        }
        .to_string();
    }
    runtime::init_logging_from_config(&config);
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Synth(args) => {
            let config = commands::synth::resolve_config(args)?;
            init_logging(&cli, &config.logging);
            info!(version = env!("CARGO_PKG_VERSION"), "Starting TTS CLI");
            commands::synth::run(config).context("synthesis failed")?;
        }
        Commands::Frontend(args) => {
            init_logging(&cli, &LoggingConfig::default());
            commands::frontend::run(args).context("frontend failed")?;
        }
        Commands::Inspect(args) => {
            init_logging(&cli, &LoggingConfig::default());
            commands::inspect::run(args).context("inspection failed")?;
        }
        Commands::Info => {
            commands::info::run();
        }
    }

    Ok(())
}
