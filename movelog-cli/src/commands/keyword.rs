use std::path::Path;

use anyhow::{Result, bail};
use clap::Args;
use movelog_stats::KeywordId;

use crate::context::Context;

#[derive(Args)]
pub struct KeywordArgs {
    /// Noun to summarize across all users
    pub noun: Option<String>,

    /// Summarize one keyword by id instead
    #[arg(long, conflicts_with = "noun")]
    pub id: Option<i64>,
}

pub async fn run(config: Option<&Path>, args: KeywordArgs) -> Result<()> {
    let ctx = Context::open(config).await?;
    let stats = match (args.noun, args.id) {
        (_, Some(id)) => ctx.service.keyword_stats_by_id(KeywordId(id)).await?,
        (Some(noun), None) => ctx.service.keyword_stats(&noun).await?,
        (None, None) => bail!("pass a noun or --id"),
    };
    super::print_json(&stats)
}
