use anyhow::Result;
use vshield_fw::config::load_config;
use vshield_fw::reconcile::reconcile_all;

use crate::cli::ApplyArgs;
use crate::{connect, print_reports};

pub fn run_apply(args: ApplyArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let rules = config.select(args.rule.as_deref())?;
    let transport = connect(&config)?;
    let reports = reconcile_all(&transport, &config.edge, &rules);
    print_reports(&reports, args.format, false)
}
