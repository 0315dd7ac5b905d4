use std::path::Path;

use anyhow::Result;
use clap::{Args, Subcommand};
use movelog_stats::StatsConfig;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration (with defaults filled in)
    Show,
    /// Show the configuration file path
    Path,
}

pub fn run(config: Option<&Path>, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(config),
        ConfigCommands::Path => show_path(config),
    }
}

fn show_config(config: Option<&Path>) -> Result<()> {
    let config = StatsConfig::load(config)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{}", toml_str);
    Ok(())
}

fn show_path(config: Option<&Path>) -> Result<()> {
    let path = config
        .map(Path::to_path_buf)
        .unwrap_or_else(StatsConfig::default_path);
    println!("Config file: {}", path.display());
    Ok(())
}
