use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::context::Context;

#[derive(Args)]
pub struct TodayArgs {
    /// User id
    #[arg(short, long)]
    pub owner: i64,
}

pub async fn run(config: Option<&Path>, args: TodayArgs) -> Result<()> {
    let ctx = Context::open(config).await?;
    let status = ctx.service.today_status(args.owner).await?;
    super::print_json(&status)
}
