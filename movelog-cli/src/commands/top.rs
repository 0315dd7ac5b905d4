use std::path::Path;

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use movelog_stats::{RankedKeyword, Trend};

use crate::context::Context;

#[derive(Args)]
pub struct TopArgs {
    /// Category: did, ate or went
    pub category: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run(config: Option<&Path>, args: TopArgs) -> Result<()> {
    let ctx = Context::open(config).await?;
    let entries = ctx.service.get_top_records(&args.category).await?;

    if args.json {
        return super::print_json(&entries);
    }
    if entries.is_empty() {
        println!("No records for {}", args.category);
        return Ok(());
    }
    println!("{}", render(&entries));
    Ok(())
}

fn render(entries: &[RankedKeyword]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Rank").fg(Color::Cyan),
        Cell::new("Keyword").fg(Color::Cyan),
        Cell::new("Count").fg(Color::Cyan),
        Cell::new("Trend").fg(Color::Cyan),
    ]);

    for entry in entries {
        table.add_row(vec![
            Cell::new(entry.rank),
            Cell::new(&entry.keyword),
            Cell::new(entry.count),
            Cell::new(entry.trend).fg(trend_color(entry.trend)),
        ]);
    }
    table
}

fn trend_color(trend: Trend) -> Color {
    match trend {
        Trend::New => Color::Yellow,
        Trend::Up => Color::Green,
        Trend::Down => Color::Red,
        Trend::Same => Color::Reset,
    }
}
