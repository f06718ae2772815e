//! Terminal rendering of the audit report
//!
//! One section per campaign: KPI summary, core position table, juice
//! monitor line for the open short, and the closed-trade audit log.

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;

use crate::campaign::types::{AuditReport, Campaign, CampaignKpis, CampaignReport};

// Decimal's Display truncates digits beyond the precision, so round first.
pub(crate) fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

fn percent(value: Decimal) -> String {
    format!("{:.1}%", value.round_dp(1))
}

fn signed_money(value: Decimal) -> String {
    if value >= Decimal::ZERO {
        money(value).bright_green().to_string()
    } else {
        money(value).bright_red().to_string()
    }
}

/// Print the whole report to stdout.
pub fn print_audit_report(report: &AuditReport) {
    println!("{}", "═".repeat(90).bright_blue());
    println!("{}", "🧾 Campaign Audit".bright_white().bold());
    println!("👤 Account: {}", report.account_id.bright_cyan());
    println!("📅 As of: {}", report.as_of);
    println!("📡 Source: {}", report.source.bright_cyan());
    println!("{}", "═".repeat(90).bright_blue());

    if report.is_empty() {
        println!(
            "\n{}",
            "No campaigns found: no open position qualifies as a CORE leg.".bright_yellow()
        );
    }

    for entry in &report.campaigns {
        print_campaign(entry);
    }

    let skipped = &report.skipped;
    if skipped.total() > 0 {
        println!(
            "{}",
            format!(
                "⚠ {} record(s) excluded: {} malformed, {} without campaign, {} outside window, {} unmatched",
                skipped.total(),
                skipped.malformed,
                skipped.no_campaign,
                skipped.outside_window,
                skipped.unmatched
            )
            .bright_yellow()
        );
    }
}

fn print_campaign(entry: &CampaignReport) {
    let campaign = &entry.campaign;

    println!();
    println!("{}", "─".repeat(90).bright_black());
    let spot = campaign
        .spot
        .map(money)
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "{}",
        format!("📈 Campaign: {}  (spot {})", campaign.underlying, spot)
            .bright_white()
            .bold()
    );
    println!("{}", "─".repeat(90).bright_black());

    print_kpis(&entry.kpis);
    print_core_table(campaign);
    print_juice_monitor(campaign);
    print_audit_log(campaign);
}

fn print_kpis(kpis: &CampaignKpis) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "LEAPS Cost",
            "LEAPS Value",
            "CC Realized",
            "Net Income",
            "ROI",
            "Annualized",
            "Days",
        ]);
    table.add_row(vec![
        money(kpis.leaps_cost),
        money(kpis.leaps_value),
        signed_money(kpis.realized_income),
        signed_money(kpis.net_income),
        percent(kpis.roi),
        percent(kpis.annualized_roi),
        kpis.days_active.to_string(),
    ]);
    println!("{table}");
}

fn print_core_table(campaign: &Campaign) {
    println!("\n{}", "🏛️  Core Position".bright_yellow());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Acquired", "Expiry", "Strike", "Qty", "Cost", "Value", "P/L",
        ]);
    for leg in &campaign.core {
        table.add_row(vec![
            leg.date_acquired
                .map(|d| d.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            leg.expiration
                .map(|d| d.to_string())
                .unwrap_or_else(|| "n/a".to_string()),
            leg.strike.to_string(),
            leg.quantity.to_string(),
            money(leg.cost),
            money(leg.value),
            signed_money(leg.pnl()),
        ]);
    }
    println!("{table}");
}

fn print_juice_monitor(campaign: &Campaign) {
    let Some(short) = &campaign.active_short else {
        return;
    };

    let juice = match (short.extrinsic, short.juice_dollars) {
        (Some(extrinsic), Some(dollars)) => {
            format!("extrinsic {} ({})", money(extrinsic), money(dollars))
        }
        _ => "extrinsic n/a".to_string(),
    };
    let dte = short
        .dte
        .map(|d| d.to_string())
        .unwrap_or_else(|| "n/a".to_string());

    println!(
        "\n{} {} | strike {} | DTE {} | {}",
        "🥤 Juice Monitor:".bright_yellow(),
        short.symbol,
        short.strike,
        dte,
        juice
    );
    if short.roll_signal {
        println!(
            "{}",
            "   ⚠️  Roll signal: juice depleted, consider closing and re-selling"
                .bright_red()
                .bold()
        );
    }
}

fn print_audit_log(campaign: &Campaign) {
    if campaign.closed_trades.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("📔 Audit Log ({} closed trades)", campaign.closed_trades.len()).bright_yellow()
    );
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Closed", "Op", "Symbol", "Strike", "Leg", "Realized", "DIT"]);
    for trade in &campaign.closed_trades {
        table.add_row(vec![
            trade.close_label(),
            trade.operation.clone(),
            trade.symbol.clone(),
            trade.strike.to_string(),
            trade.attribution.as_str().to_string(),
            signed_money(trade.realized),
            trade
                .days_in_trade()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    println!("{table}");
}
