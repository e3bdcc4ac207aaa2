use anyhow::{bail, Context, Result};
use serde::Serialize;
use vshield_fw::config::{load_config, Config};
use vshield_fw::loader::{load_remote_state, RemoteState};
use vshield_fw::report::render_resolution;
use vshield_fw::resolve::{explain, Resolution, ResolutionEntry};
use vshield_fw::snapshot::load_snapshot;

use crate::cli::{OutputFormat, ResolveArgs};
use crate::connect;

#[derive(Serialize)]
struct RuleResolution<'a> {
    rule: &'a str,
    references: Vec<ResolutionEntry>,
}

pub fn run_resolve(args: ResolveArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let rules = config.select(args.rule.as_deref())?;
    let state = fetch_state(&args, &config)?;

    let resolved: Vec<RuleResolution<'_>> = rules
        .iter()
        .map(|rule| RuleResolution {
            rule: &rule.name,
            references: explain(&state, rule),
        })
        .collect();

    match args.format {
        OutputFormat::Text => {
            let blocks: Vec<String> = resolved
                .iter()
                .map(|r| render_resolution(r.rule, &r.references))
                .collect();
            println!("{}", blocks.join("\n"));
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolved)?),
    }

    let missing = resolved
        .iter()
        .flat_map(|r| &r.references)
        .filter(|entry| entry.resolution == Resolution::Missing)
        .count();
    if missing > 0 {
        bail!("{missing} references could not be resolved");
    }
    Ok(())
}

fn fetch_state(args: &ResolveArgs, config: &Config) -> Result<RemoteState> {
    let state = match &args.snapshot {
        Some(dir) => {
            let transport = load_snapshot(dir, &config.edge)
                .with_context(|| format!("failed to load snapshot {}", dir.display()))?;
            load_remote_state(&transport, &config.edge)?
        }
        None => load_remote_state(&connect(config)?, &config.edge)?,
    };
    Ok(state)
}
