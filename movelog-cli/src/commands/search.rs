use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::context::Context;

#[derive(Args)]
pub struct SearchArgs {
    /// Noun prefix, matched case-insensitively
    pub prefix: String,
}

pub async fn run(config: Option<&Path>, args: SearchArgs) -> Result<()> {
    let ctx = Context::open(config).await?;
    let matches = ctx.service.search_keywords(&args.prefix).await?;
    super::print_json(&matches)
}
