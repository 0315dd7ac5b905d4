use std::path::Path;

use anyhow::Result;

use crate::context::Context;

/// The backfill runs while the context opens; report what it wrote.
pub async fn run(config: Option<&Path>) -> Result<()> {
    let ctx = Context::open(config).await?;
    super::print_json(ctx.service.backfill_report())
}
