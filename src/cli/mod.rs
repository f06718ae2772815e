//! CLI module for leapledger
//!
//! Command-line interface for the campaign audit tooling. Uses clap for
//! argument parsing; each command follows a structured Args + Command
//! pattern.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod args;
pub mod commands;

use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{init_logging, LogMode, LoggingConfig};

use commands::audit::{AuditArgs, AuditCommand};
use commands::history::{HistoryArgs, HistoryCommand};
use commands::positions::{PositionsArgs, PositionsCommand};

#[derive(Parser)]
#[command(name = "leapledger")]
#[command(version)]
#[command(about = "Forensic accounting for diagonal covered-call campaigns", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Use the Tradier sandbox environment
    #[arg(long, global = true)]
    pub sandbox: bool,

    /// Tradier API token (falls back to TRADIER_TOKEN, then a prompt)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Account number (defaults to the first account on the profile)
    #[arg(long, global = true)]
    pub account: Option<String>,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging (-v debug, -vv trace; RUST_LOG wins when set)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Reconcile covered-call campaigns and print the audit report
    Audit(AuditArgs),

    /// List open positions with their leg classification
    Positions(PositionsArgs),

    /// Show normalized account history events
    History(HistoryArgs),
}

/// Connection settings shared by every command.
pub struct Globals {
    pub sandbox: bool,
    pub token: Option<String>,
    pub account: Option<String>,
}

impl Cli {
    fn log_mode(&self) -> LogMode {
        // JSON output owns stdout; keep the console free of log lines.
        match &self.command {
            Commands::Audit(args) if args.json => LogMode::FileOnly,
            _ => LogMode::ConsoleAndFile,
        }
    }

    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);

        // Ensure all directories exist
        data_paths.ensure_directories()?;
        init_logging(LoggingConfig::new(
            self.log_mode(),
            data_paths.clone(),
            self.verbose,
        ))?;

        let globals = Globals {
            sandbox: self.sandbox,
            token: self.token,
            account: self.account,
        };

        match self.command {
            Commands::Audit(args) => AuditCommand::new(args).execute(&globals, data_paths).await,
            Commands::Positions(args) => {
                PositionsCommand::new(args).execute(&globals, data_paths).await
            }
            Commands::History(args) => {
                HistoryCommand::new(args).execute(&globals, data_paths).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_defaults() {
        let cli = Cli::parse_from(["leapledger", "audit"]);
        assert!(!cli.sandbox);
        let Commands::Audit(args) = cli.command else {
            panic!("expected audit command");
        };
        assert_eq!(args.pages, 5);
        assert_eq!(args.since.to_string(), "2024-01-01");
        assert!(!args.json);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["leapledger", "audit", "--sandbox", "--account", "VA42"]);
        assert!(cli.sandbox);
        assert_eq!(cli.account.as_deref(), Some("VA42"));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_verbose_flag_counts() {
        let cli = Cli::parse_from(["leapledger", "positions", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }
}
