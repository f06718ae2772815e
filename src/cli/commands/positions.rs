//! Open positions command with leg classification

use std::collections::BTreeSet;

use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;
use tracing::warn;

use crate::campaign::classify;
use crate::campaign::symbol::{self, underlying_root, ContractKind};
use crate::campaign::types::{LegClass, QuoteBook};
use crate::cli::Globals;
use crate::config::EngineConfig;
use crate::data_paths::DataPaths;
use crate::report::display::money;

use super::connect;

#[derive(Args, Debug)]
pub struct PositionsArgs {}

pub struct PositionsCommand {
    _args: PositionsArgs,
}

impl PositionsCommand {
    pub fn new(args: PositionsArgs) -> Self {
        Self { _args: args }
    }

    pub async fn execute(&self, globals: &Globals, _data_paths: DataPaths) -> Result<()> {
        let session = connect(globals).await?;
        let config = EngineConfig::from_env();

        let batch = session.client.positions(&session.account_id).await?;
        if batch.records.is_empty() {
            println!("No open positions in account {}.", session.account_id);
            return Ok(());
        }

        let symbols: BTreeSet<String> = batch
            .records
            .iter()
            .flat_map(|p| [p.symbol.clone(), underlying_root(&p.symbol).to_string()])
            .collect();
        let symbols: Vec<String> = symbols.into_iter().collect();
        let quotes = match session.client.quotes(&symbols).await {
            Ok(book) => book,
            Err(err) => {
                warn!(%err, "Quote fetch failed; classification columns unavailable");
                QuoteBook::new()
            }
        };

        println!("\n{}", "📋 Open Positions".bright_white().bold());
        println!("👤 Account: {}", session.account_id);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                "Symbol", "Kind", "Qty", "Cost Basis", "Last", "Delta", "Leg",
            ]);

        let mut core_count = 0usize;
        let mut short_count = 0usize;
        for position in &batch.records {
            let decoded = symbol::decode(&position.symbol);
            let quote = quotes.get(&position.symbol);
            let delta = quote.and_then(|q| q.delta);

            let class = classify(position.quantity, delta, &config);
            let leg = match class {
                LegClass::Core => {
                    core_count += 1;
                    "CORE".bright_green().to_string()
                }
                LegClass::IncomeShort => {
                    short_count += 1;
                    "INCOME-SHORT".bright_cyan().to_string()
                }
                LegClass::Unclassified => "-".to_string(),
            };

            table.add_row(vec![
                position.symbol.clone(),
                match decoded.kind {
                    ContractKind::Call => "CALL".to_string(),
                    ContractKind::Put => "PUT".to_string(),
                    ContractKind::Equity => "STOCK".to_string(),
                },
                position.quantity.to_string(),
                money(position.cost_basis),
                quote
                    .and_then(|q| q.last)
                    .map(money)
                    .unwrap_or_else(|| "n/a".to_string()),
                delta.map(|d| d.to_string()).unwrap_or_else(|| "n/a".to_string()),
                leg,
            ]);
        }
        println!("{table}");

        println!(
            "\n{} position(s): {} CORE, {} INCOME-SHORT",
            batch.records.len(),
            core_count,
            short_count
        );
        if batch.malformed > 0 {
            println!(
                "{}",
                format!("⚠ {} malformed position record(s) dropped", batch.malformed)
                    .bright_yellow()
            );
        }

        Ok(())
    }
}
