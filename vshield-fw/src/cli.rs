use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "vshield-fw")]
#[command(about = "Reconcile declared firewall rules against vShield Edge gateways")]
pub struct Cli {
    /// Raise log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Show what would change without writing to the manager.
    Plan(PlanArgs),
    /// Create and update rules on the manager.
    Apply(ApplyArgs),
    /// Show how every referenced name resolves on the edge.
    Resolve(ResolveArgs),
}

#[derive(Parser, Debug)]
pub struct PlanArgs {
    pub config: PathBuf,
    /// Read edge state from captured XML files instead of the manager.
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Only process the rule with this name.
    #[arg(long)]
    pub rule: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ApplyArgs {
    pub config: PathBuf,
    #[arg(long)]
    pub rule: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct ResolveArgs {
    pub config: PathBuf,
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    #[arg(long)]
    pub rule: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
