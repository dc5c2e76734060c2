//! Command-line interface: clap definitions and command execution.

use crate::config::{ConfigLoader, GraftConfig};
use crate::error::GraftError;
use crate::merge::{RebuildReport, Rebuilder};
use crate::watch::{WatchConfig, WatchDaemon};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;

/// Graft CLI - incremental merging of an upstream tree with an appended tree
#[derive(Parser)]
#[command(name = "graft")]
#[command(about = "Incrementally merge an appended file tree into an upstream file tree")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (where graft.toml lives)
    #[arg(long, default_value = ".")]
    pub root: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a single rebuild of the output tree
    Build {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Rebuild the output tree whenever an input tree changes
    Watch {
        /// Debounce window in milliseconds (overrides configuration)
        #[arg(long)]
        debounce_ms: Option<u64>,
    },
    /// Validate the configuration and print the resolved settings
    Validate,
}

/// Resolved configuration plus the command runner
pub struct RunContext {
    config: GraftConfig,
}

impl RunContext {
    /// Load configuration from `config_path` if given, otherwise from `root`
    pub fn new(root: &Path, config_path: Option<&Path>) -> Result<Self, GraftError> {
        let config = match config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(root)?,
        };
        Ok(Self::with_config(config))
    }

    pub fn with_config(config: GraftConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraftConfig {
        &self.config
    }

    /// Execute a command and return its printable output
    pub fn execute(&self, command: &Commands) -> Result<String, GraftError> {
        self.config.validate().map_err(|errors| {
            GraftError::Config(format!(
                "Configuration validation failed:\n{}",
                errors.join("\n")
            ))
        })?;

        match command {
            Commands::Build { format } => {
                let mut rebuilder = Rebuilder::new(self.config.tree_roots(), &self.config.merge_options());
                let report = rebuilder.rebuild()?;
                format_report(&report, format)
            }
            Commands::Watch { debounce_ms } => {
                let rebuilder = Rebuilder::new(self.config.tree_roots(), &self.config.merge_options());
                let watch_config = WatchConfig {
                    debounce_ms: debounce_ms.unwrap_or(self.config.watch.debounce_ms),
                    max_rebuilds: None,
                };
                info!(output = %self.config.output.display(), "Starting watch mode");
                WatchDaemon::new(rebuilder, watch_config).start()?;
                Ok("Watch stopped".to_string())
            }
            Commands::Validate => Ok(format!(
                "Configuration valid\n  upstream: {}\n  appended: {}\n  output:   {}\n  mappings: {}\n  passthrough: {}",
                self.config.upstream.display(),
                self.config.appended.display(),
                self.config.output.display(),
                self.config.mappings.len(),
                self.config.passthrough.len(),
            )),
        }
    }
}

fn format_report(report: &RebuildReport, format: &str) -> Result<String, GraftError> {
    match format {
        "json" => serde_json::to_string_pretty(report)
            .map_err(|e| GraftError::Config(format!("Failed to serialize report: {}", e))),
        "text" => {
            if report.is_noop() {
                return Ok("Output up to date".to_string());
            }
            Ok(format!(
                "Rebuilt in {} ms: {} created, {} changed, {} removed, {} merge targets flushed",
                report.duration_ms,
                report.created + report.created_dirs,
                report.changed,
                report.unlinked + report.removed_dirs,
                report.flushed,
            ))
        }
        other => Err(GraftError::Config(format!(
            "Invalid output format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

/// User-facing message for an error
pub fn map_error(err: &GraftError) -> String {
    match err {
        GraftError::Config(msg) => format!("Configuration error: {}", msg),
        GraftError::Io { path, source } => {
            format!("Filesystem operation failed on {}: {}", path.display(), source)
        }
        other => format!("Error: {}", other),
    }
}
