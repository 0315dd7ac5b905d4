use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::context::Context;

#[derive(Args)]
pub struct StatsArgs {
    /// Category: did, ate or went
    #[arg(short = 'C', long)]
    pub category: String,

    /// Period: daily, weekly, monthly or total
    #[arg(short, long, default_value = "total")]
    pub period: String,

    /// Month for the monthly calendar (yyyy-MM)
    #[arg(short, long)]
    pub month: Option<String>,
}

pub async fn run(config: Option<&Path>, args: StatsArgs) -> Result<()> {
    let ctx = Context::open(config).await?;
    let stats = ctx
        .service
        .get_stats(&args.category, &args.period, args.month.as_deref())
        .await?;
    super::print_json(&stats)
}
