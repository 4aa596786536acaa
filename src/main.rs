// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use polyfield::app_config::{Config, LogLevel};
use polyfield::TranslationService;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the supported languages
    Languages,

    /// Print the translation form choices of a model as JSON
    FormSchema {
        /// Model name as declared in the configuration
        #[arg(short, long)]
        model: String,
    },

    /// List translations whose field is no longer translatable
    Obsolete {
        /// Delete the listed translations
        #[arg(short, long)]
        delete: bool,

        /// Do not ask for confirmation before deleting
        #[arg(short, long, requires = "delete")]
        yes: bool,
    },

    /// Show translation database statistics
    Stats,

    /// Generate shell completions for polyfield
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// polyfield - per-field translations for your models
///
/// Maintenance tool for the polyfield translation store.
#[derive(Parser, Debug)]
#[command(name = "polyfield")]
#[command(version)]
#[command(about = "Maintenance tool for per-field model translations")]
#[command(long_about = "polyfield stores translations of model fields in a side table keyed by
(model, object_id, field, language). This tool inspects and maintains that table.

EXAMPLES:
    polyfield languages                       # List supported languages
    polyfield form-schema --model continent   # Dropdown choices for a translation form
    polyfield obsolete                        # List translations of removed fields
    polyfield obsolete --delete --yes         # Delete them without asking
    polyfield stats                           # Row counts per language
    polyfield completions bash > polyfield.bash

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: PathBuf,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and marker for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌"),
            Level::Warn => ("1;33", "🚧"),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍"),
            Level::Trace => ("1;35", "📋"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, marker) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color,
                now,
                marker,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Some(level) = cli.log_level {
        log::set_max_level(LogLevel::from(level).to_level_filter());
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "polyfield", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load_or_create(&cli.config_path)
        .context(format!("Failed to load config: {}", cli.config_path.display()))?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    } else {
        log::set_max_level(config.log_level.to_level_filter());
    }
    config.validate().context("Configuration validation failed")?;

    let service =
        TranslationService::from_config(&config).context("Failed to open the translation store")?;

    match cli.command {
        Commands::Languages => run_languages(&service),
        Commands::FormSchema { model } => run_form_schema(&service, &model),
        Commands::Obsolete { delete, yes } => run_obsolete(&service, delete, yes).await,
        Commands::Stats => run_stats(&service).await,
        Commands::Completions { .. } => Ok(()),
    }
}

fn run_languages(service: &TranslationService) -> Result<()> {
    let languages = service.languages();
    for language in languages.supported() {
        let marker = if language.code == languages.default_language() {
            " (default)"
        } else {
            ""
        };
        println!("{:<8} {}{}", language.code, language.name, marker);
    }
    Ok(())
}

fn run_form_schema(service: &TranslationService, model: &str) -> Result<()> {
    let schema = service
        .form_schema(model)
        .context(format!("Cannot build the form schema of `{}`", model))?;
    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize the form schema")?;
    println!("{}", json);
    Ok(())
}

async fn run_obsolete(service: &TranslationService, delete: bool, yes: bool) -> Result<()> {
    let repository = service.store();
    let obsolete = repository
        .obsolete_async(service.registry().clone())
        .await
        .context("Failed to list obsolete translations")?;

    if obsolete.is_empty() {
        info!("No obsolete translations found");
        return Ok(());
    }

    for record in &obsolete {
        println!("{}  {:?}", record.key(), record.text);
    }
    info!("Found {} obsolete translations", obsolete.len());

    if !delete {
        return Ok(());
    }

    if !yes && !confirm(&format!("Delete {} translations?", obsolete.len()))? {
        warn!("Nothing deleted");
        return Ok(());
    }

    let deleted = repository
        .delete_obsolete_async(service.registry().clone())
        .await
        .context("Failed to delete obsolete translations")?;
    info!("Deleted {} obsolete translations", deleted);
    Ok(())
}

async fn run_stats(service: &TranslationService) -> Result<()> {
    let stats = service
        .store()
        .stats_async()
        .await
        .context("Failed to read database statistics")?;
    println!("{}", stats);
    Ok(())
}

// @returns: Whether the user answered yes on stdin
fn confirm(question: &str) -> Result<bool> {
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .map_err(|e| anyhow!("Failed to read the answer: {}", e))?;
    debug!("Confirmation answer: {:?}", answer.trim());

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
