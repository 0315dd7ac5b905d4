use std::path::Path;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use movelog_stats::{Category, KeywordRecord};
use tracing::info;

use crate::context::Context;

#[derive(Args)]
pub struct RecordArgs {
    /// Category: did, ate or went
    #[arg(short = 'C', long)]
    pub category: String,

    /// Noun, e.g. "climbing"
    #[arg(short, long)]
    pub noun: String,

    /// Owning user id
    #[arg(short, long)]
    pub owner: i64,

    /// When it happened (RFC 3339); defaults to now
    #[arg(long)]
    pub at: Option<DateTime<Utc>>,
}

pub async fn run(config: Option<&Path>, args: RecordArgs) -> Result<()> {
    let category = Category::parse(&args.category)?;
    let noun = args.noun.trim();
    let ctx = Context::open(config).await?;

    let keyword = match ctx.store.find_keyword(args.owner, noun, category).await? {
        Some(keyword) => keyword,
        None => ctx.store.insert_keyword(noun, category, args.owner).await?,
    };
    let record = ctx
        .store
        .insert_record(keyword.id, args.at.unwrap_or_else(Utc::now))
        .await
        .context("appending record")?;

    let joined = KeywordRecord::new(&record, &keyword);
    ctx.service.record_action(&joined).await?;
    info!(record_id = %record.id, keyword_id = %keyword.id, "recorded action");

    super::print_json(&joined)
}
