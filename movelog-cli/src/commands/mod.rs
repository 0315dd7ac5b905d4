pub mod backfill;
pub mod config;
pub mod keyword;
pub mod record;
pub mod search;
pub mod stats;
pub mod today;
pub mod top;

use anyhow::Result;
use serde::Serialize;

/// Print `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
