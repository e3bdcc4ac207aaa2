use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vshield_fw::config::Config;
use vshield_fw::http::HttpTransport;
use vshield_fw::reconcile::RuleReport;
use vshield_fw::report::render_reports;

mod apply_cmd;
mod cli;
mod plan_cmd;
mod resolve_cmd;

use cli::{Cli, Command, OutputFormat};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Plan(args) => plan_cmd::run_plan(args),
        Command::Apply(args) => apply_cmd::run_apply(args),
        Command::Resolve(args) => resolve_cmd::run_resolve(args),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Live transport for the manager named in `config`.
pub(crate) fn connect(config: &Config) -> Result<HttpTransport> {
    let manager = config.manager()?;
    let password = manager.password()?;
    HttpTransport::new(manager, password)
        .with_context(|| format!("failed to build client for {}", manager.url))
}

pub(crate) fn print_reports(
    reports: &[RuleReport],
    format: OutputFormat,
    show_requests: bool,
) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", render_reports(reports, show_requests)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
    }
    let failed = reports.iter().filter(|report| report.is_failure()).count();
    if failed > 0 {
        bail!("{failed} of {} rules failed", reports.len());
    }
    Ok(())
}
