//! Diagonal covered-call campaign reconciliation
//!
//! Rebuilds the accounting state of "poor man's covered call" campaigns
//! from one point-in-time account pull: open positions and live quotes
//! define the campaigns, historical events are attributed back to them,
//! and the result is a per-underlying report with realized income, ROI
//! and a roll signal for the open short leg.
//!
//! The pipeline is leaf-first and pure: [`symbol`] and [`classify`] feed
//! [`builder`], whose campaigns are filled in by [`reconcile`] and
//! [`juice`], then rolled up by [`kpi`]. Everything is recomputed from
//! scratch on every invocation; there is no ledger state between runs.

pub mod builder;
pub mod classify;
pub mod juice;
pub mod kpi;
pub mod reconcile;
pub mod symbol;
pub mod types;

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::info;

use crate::config::EngineConfig;

pub use builder::{build_campaigns, CONTRACT_MULTIPLIER};
pub use classify::classify;
pub use juice::attach_active_shorts;
pub use kpi::aggregate;
pub use reconcile::reconcile;
pub use types::{
    AuditReport, Campaign, CampaignKpis, CampaignReport, ClosedPositionRecord, HistoricalEvent,
    HistorySource, LegClass, Position, Quote, QuoteBook, SkippedRecords,
};

/// One fully materialized account pull, normalized at the broker boundary.
/// The engine consumes it read-only and never refetches.
#[derive(Debug, Clone)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub positions: Vec<Position>,
    pub quotes: QuoteBook,
    pub history: HistorySource,
}

/// Run one full reconciliation pass over a snapshot.
pub fn run_audit(
    snapshot: &AccountSnapshot,
    config: &EngineConfig,
    today: NaiveDate,
) -> AuditReport {
    let mut campaigns = build_campaigns(&snapshot.positions, &snapshot.quotes, config);
    info!(
        account = %snapshot.account_id,
        campaigns = campaigns.len(),
        source = snapshot.history.label(),
        "Reconciling campaigns"
    );

    let open_symbols: HashSet<String> = snapshot
        .positions
        .iter()
        .map(|p| p.symbol.clone())
        .collect();

    let skipped = reconcile(&mut campaigns, &snapshot.history, &open_symbols, config);
    attach_active_shorts(&mut campaigns, &snapshot.positions, &snapshot.quotes, today, config);

    let campaigns = campaigns
        .into_values()
        .map(|campaign| CampaignReport {
            kpis: aggregate(&campaign, today),
            campaign,
        })
        .collect();

    AuditReport {
        account_id: snapshot.account_id.clone(),
        as_of: today,
        source: snapshot.history.label().to_string(),
        campaigns,
        skipped,
    }
}
