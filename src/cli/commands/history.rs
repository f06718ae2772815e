//! Account history inspection command

use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::campaign::types::EventKind;
use crate::cli::args::parse_date;
use crate::cli::Globals;
use crate::data_paths::DataPaths;
use crate::report::display::money;

use super::connect;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Earliest history date to scan (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date, default_value = "2024-01-01")]
    pub since: NaiveDate,

    /// History pages to scan (100 events each)
    #[arg(long, default_value_t = 5)]
    pub pages: u32,

    /// Number of events to show
    #[arg(short, long, default_value_t = 50)]
    pub limit: usize,
}

pub struct HistoryCommand {
    args: HistoryArgs,
}

impl HistoryCommand {
    pub fn new(args: HistoryArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, globals: &Globals, _data_paths: DataPaths) -> Result<()> {
        let session = connect(globals).await?;
        let batch = session
            .client
            .history(&session.account_id, self.args.since, self.args.pages, None)
            .await?;

        if batch.records.is_empty() {
            println!(
                "No trade or option events since {} in account {}.",
                self.args.since, session.account_id
            );
            return Ok(());
        }

        let mut events = batch.records;
        events.sort_by(|a, b| b.date.cmp(&a.date));

        println!("\n{}", "📜 Account History".bright_white().bold());
        println!("{} event(s) since {}", events.len(), self.args.since);

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Date", "Type", "Side", "Symbol", "Price", "Qty"]);

        for event in events.iter().take(self.args.limit) {
            table.add_row(vec![
                event.date.to_string(),
                match event.kind {
                    EventKind::Trade => "trade".to_string(),
                    EventKind::OptionEvent => "option".to_string(),
                    EventKind::Other => "other".to_string(),
                },
                event
                    .side
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| "-".to_string()),
                event.symbol.clone(),
                money(event.price),
                event.quantity.to_string(),
            ]);
        }
        println!("{table}");

        if events.len() > self.args.limit {
            println!("… {} more (raise --limit to see them)", events.len() - self.args.limit);
        }
        if batch.malformed > 0 {
            println!(
                "{}",
                format!("⚠ {} malformed event(s) dropped", batch.malformed).bright_yellow()
            );
        }

        Ok(())
    }
}
