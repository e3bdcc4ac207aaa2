use anyhow::{Context, Result};
use tracing::info;
use vshield_fw::config::load_config;
use vshield_fw::reconcile::reconcile_all;
use vshield_fw::snapshot::load_snapshot;
use vshield_fw::transport::DryRun;

use crate::cli::PlanArgs;
use crate::{connect, print_reports};

pub fn run_plan(args: PlanArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let rules = config.select(args.rule.as_deref())?;

    let reports = match &args.snapshot {
        Some(dir) => {
            let transport = load_snapshot(dir, &config.edge)
                .with_context(|| format!("failed to load snapshot {}", dir.display()))?;
            reconcile_all(&transport, &config.edge, &rules)
        }
        None => {
            let transport = DryRun::new(connect(&config)?);
            let reports = reconcile_all(&transport, &config.edge, &rules);
            info!(
                suppressed = transport.take_writes().len(),
                "dry run finished"
            );
            reports
        }
    };

    print_reports(&reports, args.format, true)
}
