use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "flowdeck", about = "Discover and launch project workflows")]
pub struct Cli {
    /// Optional TOML config file
    #[arg(long, env = "FLOWDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root to scan; repeatable. Defaults to the current directory.
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// List discovered workflows
    List,
    /// Launch a workflow by label or path, or pick one interactively
    Run { query: Option<String> },
    /// Keep the list current until interrupted
    Watch,
    ValidateConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
