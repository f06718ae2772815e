//! Campaign KPI rollup
//!
//! Pure aggregation over a fully reconciled campaign. Degenerate inputs
//! (zero cost basis, unknown start date) short-circuit to zero rather than
//! dividing by zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::types::{Campaign, CampaignKpis};

/// Roll up one campaign's performance figures.
pub fn aggregate(campaign: &Campaign, today: NaiveDate) -> CampaignKpis {
    let leaps_cost = campaign.leaps_cost();
    let leaps_value = campaign.leaps_value();
    let leaps_pnl = leaps_value - leaps_cost;
    let net_income = leaps_pnl + campaign.realized_income;

    let roi = if leaps_cost > Decimal::ZERO {
        net_income / leaps_cost * Decimal::from(100)
    } else {
        Decimal::ZERO
    };

    let days_active = campaign
        .start
        .map(|start| (today - start).num_days().max(0))
        .unwrap_or(0);
    let annualized_roi = roi / Decimal::from(days_active.max(1)) * Decimal::from(365);

    CampaignKpis {
        leaps_cost,
        leaps_value,
        leaps_pnl,
        realized_income: campaign.realized_income,
        net_income,
        roi,
        annualized_roi,
        days_active,
    }
}
