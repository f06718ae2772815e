//! Report export
//!
//! Flat CSV of the closed-trade audit log for spreadsheet work, and a full
//! JSON dump of the report for downstream tooling.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::campaign::types::AuditReport;

/// Write every attributed closed trade, across all campaigns, as one flat
/// CSV file.
pub fn export_audit_csv(report: &AuditReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file at {}", path.display()))?;

    writer.write_record([
        "account",
        "as_of",
        "underlying",
        "symbol",
        "strike",
        "open_date",
        "close_date",
        "operation",
        "leg",
        "realized",
        "days_in_trade",
    ])?;

    for entry in &report.campaigns {
        let campaign = &entry.campaign;
        for trade in &campaign.closed_trades {
            writer.write_record([
                report.account_id.as_str(),
                &report.as_of.to_string(),
                campaign.underlying.as_str(),
                trade.symbol.as_str(),
                &trade.strike.to_string(),
                &trade
                    .open_date
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
                &trade.close_label(),
                trade.operation.as_str(),
                trade.attribution.as_str(),
                &trade.realized.to_string(),
                &trade
                    .days_in_trade()
                    .map(|d| d.to_string())
                    .unwrap_or_default(),
            ])?;
        }
    }

    writer
        .flush()
        .with_context(|| format!("Failed to write CSV file at {}", path.display()))?;
    info!(path = %path.display(), "Audit log exported");
    Ok(())
}

/// Render the full report as pretty JSON.
pub fn render_json(report: &AuditReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Write the full report as pretty JSON.
pub fn write_json(report: &AuditReport, path: &Path) -> Result<()> {
    let body = render_json(report)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write JSON file at {}", path.display()))?;
    info!(path = %path.display(), "Report exported");
    Ok(())
}

/// Write the report to `path`, picking the format from the extension: a
/// `.json` path gets the full report, anything else the audit-log CSV.
pub fn export_report(report: &AuditReport, path: &Path) -> Result<()> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => write_json(report, path),
        _ => export_audit_csv(report, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    use crate::campaign::types::{
        Campaign, CampaignKpis, CampaignReport, ClosedTrade, LegAttribution, SkippedRecords,
    };

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_report() -> AuditReport {
        let mut campaign = Campaign::new("NVDA", Some(dec!(150)));
        campaign.start = Some(date(2024, 3, 1));
        campaign.realized_income = dec!(150);
        campaign.closed_trades.push(ClosedTrade {
            symbol: "NVDA240419C00150000".to_string(),
            strike: dec!(150),
            open_date: Some(date(2024, 4, 1)),
            close_date: Some(date(2024, 4, 11)),
            expired: false,
            operation: "STO/BTC".to_string(),
            realized: dec!(150),
            attribution: LegAttribution::Income,
        });
        AuditReport {
            account_id: "VA000001".to_string(),
            as_of: date(2024, 6, 9),
            source: "event stream".to_string(),
            campaigns: vec![CampaignReport {
                kpis: CampaignKpis {
                    leaps_cost: dec!(5000),
                    leaps_value: dec!(6000),
                    leaps_pnl: dec!(1000),
                    realized_income: dec!(150),
                    net_income: dec!(1150),
                    roi: dec!(23),
                    annualized_roi: dec!(84),
                    days_active: 100,
                },
                campaign,
            }],
            skipped: SkippedRecords::default(),
        }
    }

    #[test]
    fn test_csv_export_writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.csv");
        export_audit_csv(&sample_report(), &path).unwrap();

        let body = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("account,as_of,underlying"));
        assert!(lines[1].contains("NVDA240419C00150000"));
        assert!(lines[1].contains("STO/BTC"));
        assert!(lines[1].contains("INCOME"));
    }

    #[test]
    fn test_json_round_trips() {
        let report = sample_report();
        let body = render_json(&report).unwrap();
        let parsed: AuditReport = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.account_id, report.account_id);
        assert_eq!(parsed.campaigns.len(), 1);
        assert_eq!(parsed.campaigns[0].kpis.net_income, dec!(1150));
    }

    #[test]
    fn test_json_write_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        write_json(&sample_report(), &path).unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn test_export_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();

        let json_path = dir.path().join("report.json");
        export_report(&report, &json_path).unwrap();
        let body = std::fs::read_to_string(&json_path).unwrap();
        let parsed: AuditReport = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed.account_id, "VA000001");

        let csv_path = dir.path().join("report.csv");
        export_report(&report, &csv_path).unwrap();
        let body = std::fs::read_to_string(&csv_path).unwrap();
        assert!(body.starts_with("account,"));
    }
}
