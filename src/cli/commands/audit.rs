//! Campaign audit command: the full reconciliation pass

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::campaign::symbol::underlying_root;
use crate::campaign::{run_audit, AccountSnapshot, HistorySource, Position, QuoteBook};
use crate::cli::args::parse_date;
use crate::cli::Globals;
use crate::config::EngineConfig;
use crate::data_paths::DataPaths;
use crate::report::{export_report, print_audit_report, render_json};
use crate::tradier::FeedBatch;

use super::{connect, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    /// Prefer the gain/loss report, fall back to raw history
    Auto,
    /// Raw account history events
    History,
    /// Broker-computed gain/loss report
    Gainloss,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    /// History source to reconcile from
    #[arg(long, value_enum, default_value = "auto")]
    pub source: SourceArg,

    /// Earliest history date to scan (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, default_value = "2024-01-01")]
    pub since: NaiveDate,

    /// History pages to scan (100 events each)
    #[arg(long, default_value_t = 5)]
    pub pages: u32,

    /// Export the report to a file (CSV audit log by default)
    #[arg(long)]
    pub export: bool,

    /// Export path; a .json extension writes the full report instead of CSV
    /// (default: a dated .csv under the data exports directory)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Print the full report as JSON on stdout instead of tables
    #[arg(long)]
    pub json: bool,
}

pub struct AuditCommand {
    args: AuditArgs,
}

impl AuditCommand {
    pub fn new(args: AuditArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, globals: &Globals, data_paths: DataPaths) -> Result<()> {
        let session = connect(globals).await?;
        let config = EngineConfig::from_env();
        let today = Local::now().date_naive();

        // Upstream failures degrade to empty inputs; the report then says
        // "no campaigns" instead of aborting.
        let positions = match session.client.positions(&session.account_id).await {
            Ok(batch) => batch,
            Err(err) => {
                warn!(%err, "Positions fetch failed; auditing an empty snapshot");
                FeedBatch::default()
            }
        };
        let mut boundary_malformed = positions.malformed;

        let quotes = self.fetch_quotes(&session, &positions.records).await;
        let (history, history_malformed) = self.fetch_history(&session).await;
        boundary_malformed += history_malformed;

        let snapshot = AccountSnapshot {
            account_id: session.account_id.clone(),
            positions: positions.records,
            quotes,
            history,
        };
        let mut report = run_audit(&snapshot, &config, today);
        report.skipped.malformed += boundary_malformed;

        if self.args.json {
            println!("{}", render_json(&report)?);
        } else {
            print_audit_report(&report);
        }

        if self.args.export {
            let path = self.args.output.clone().unwrap_or_else(|| {
                data_paths
                    .exports()
                    .join(format!("audit_{}_{}.csv", report.account_id, report.as_of))
            });
            export_report(&report, &path)?;
            if !self.args.json {
                println!("\n✅ Report exported to {}", path.display());
            }
        }

        Ok(())
    }

    /// Quotes for every open symbol plus each underlying root (the root
    /// quote provides the spot price).
    async fn fetch_quotes(&self, session: &Session, positions: &[Position]) -> QuoteBook {
        let symbols: BTreeSet<String> = positions
            .iter()
            .flat_map(|p| [p.symbol.clone(), underlying_root(&p.symbol).to_string()])
            .collect();
        let symbols: Vec<String> = symbols.into_iter().collect();

        match session.client.quotes(&symbols).await {
            Ok(book) => book,
            Err(err) => {
                warn!(%err, "Quote fetch failed; continuing without market data");
                QuoteBook::new()
            }
        }
    }

    async fn fetch_history(&self, session: &Session) -> (HistorySource, usize) {
        match self.args.source {
            SourceArg::Gainloss => self.fetch_gainloss(session).await,
            SourceArg::History => self.fetch_events(session).await,
            SourceArg::Auto => {
                let (source, malformed) = self.fetch_gainloss(session).await;
                if source.is_empty() {
                    info!("Gain/loss report empty; falling back to event history");
                    let (events, event_malformed) = self.fetch_events(session).await;
                    (events, malformed + event_malformed)
                } else {
                    (source, malformed)
                }
            }
        }
    }

    async fn fetch_gainloss(&self, session: &Session) -> (HistorySource, usize) {
        match session.client.gain_loss(&session.account_id).await {
            Ok(batch) => (HistorySource::GainLoss(batch.records), batch.malformed),
            Err(err) => {
                warn!(%err, "Gain/loss fetch failed; treating report as empty");
                (HistorySource::GainLoss(Vec::new()), 0)
            }
        }
    }

    async fn fetch_events(&self, session: &Session) -> (HistorySource, usize) {
        let progress = if self.args.json {
            None
        } else {
            let bar = ProgressBar::new(self.args.pages as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} pages {msg}")
                    .unwrap()
                    .progress_chars("#>-"),
            );
            bar.set_message("scanning history");
            Some(bar)
        };

        let result = session
            .client
            .history(
                &session.account_id,
                self.args.since,
                self.args.pages,
                progress.as_ref(),
            )
            .await;
        if let Some(bar) = progress {
            bar.finish_and_clear();
        }

        match result {
            Ok(batch) => (HistorySource::Events(batch.records), batch.malformed),
            Err(err) => {
                warn!(%err, "History fetch failed; treating stream as empty");
                (HistorySource::Events(Vec::new()), 0)
            }
        }
    }
}
