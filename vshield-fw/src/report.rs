use colored::Colorize;
use edge_xml::{from_value, write_pretty};

use crate::reconcile::{RuleOutcome, RuleReport};
use crate::resolve::{Resolution, ResolutionEntry};
use crate::transport::WriteCall;

/// Render per-rule outcomes for terminal output.
///
/// With `show_requests`, the body of every write is printed as the XML the
/// manager receives.
pub fn render_reports(reports: &[RuleReport], show_requests: bool) -> String {
    let mut out = Vec::new();
    for report in reports {
        out.push(render_outcome(report));
        if !show_requests {
            continue;
        }
        if let Some(call) = &report.request {
            out.push(format!("  {} {}", call.method, call.path).dimmed().to_string());
            for line in render_body(call).lines() {
                out.push(format!("    {line}"));
            }
        }
    }
    out.push(render_summary(reports));
    out.join("\n")
}

fn render_outcome(report: &RuleReport) -> String {
    match &report.outcome {
        RuleOutcome::Created => format!("+ {} created", report.rule).green().to_string(),
        RuleOutcome::Updated { properties } => {
            let names: Vec<&str> = properties.iter().map(|p| p.as_str()).collect();
            format!("~ {} updated ({})", report.rule, names.join(", "))
                .yellow()
                .to_string()
        }
        RuleOutcome::InSync => format!("= {} in sync", report.rule),
        RuleOutcome::DeleteIgnored => format!(
            "! {} marked absent; delete not implemented, rule left in place",
            report.rule
        )
        .magenta()
        .to_string(),
        RuleOutcome::Failed { error } => format!("x {} failed: {error}", report.rule)
            .red()
            .to_string(),
    }
}

/// One-line count of outcomes.
pub fn render_summary(reports: &[RuleReport]) -> String {
    let count = |pred: fn(&RuleOutcome) -> bool| reports.iter().filter(|r| pred(&r.outcome)).count();
    format!(
        "result created={} updated={} in_sync={} delete_ignored={} failed={}",
        count(|o| matches!(o, RuleOutcome::Created)),
        count(|o| matches!(o, RuleOutcome::Updated { .. })),
        count(|o| matches!(o, RuleOutcome::InSync)),
        count(|o| matches!(o, RuleOutcome::DeleteIgnored)),
        count(|o| matches!(o, RuleOutcome::Failed { .. })),
    )
    .cyan()
    .to_string()
}

fn render_body(call: &WriteCall) -> String {
    let xml = from_value(&call.body)
        .ok()
        .and_then(|node| write_pretty(&node).ok())
        .and_then(|bytes| String::from_utf8(bytes).ok());
    // Fall back to JSON when the body has no XML form.
    xml.unwrap_or_else(|| {
        serde_json::to_string_pretty(&call.body).unwrap_or_else(|_| call.body.to_string())
    })
}

/// Render name resolution for one rule.
pub fn render_resolution(rule: &str, entries: &[ResolutionEntry]) -> String {
    let mut out = vec![format!("rule {rule}")];
    if entries.is_empty() {
        out.push("  (no references)".dimmed().to_string());
    }
    for entry in entries {
        let resolved = match &entry.resolution {
            Resolution::Token { id } => format!("{id} (token)"),
            Resolution::Object { id } => id.clone(),
            Resolution::Any => "any (no restriction)".to_string(),
            Resolution::Missing => "MISSING".red().to_string(),
        };
        out.push(format!("  {} {} -> {resolved}", entry.property, entry.name));
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{render_reports, render_resolution, render_summary};
    use crate::accessors::Property;
    use crate::reconcile::{RuleOutcome, RuleReport};
    use crate::resolve::{Resolution, ResolutionEntry};
    use crate::transport::{Method, WriteCall};

    fn reports() -> Vec<RuleReport> {
        vec![
            RuleReport {
                rule: "allow-web".to_string(),
                outcome: RuleOutcome::Created,
                request: Some(WriteCall {
                    method: Method::Post,
                    path: "/api/3.0/edges/edge-1/firewall/config/rules".to_string(),
                    body: json!({ "firewallRules": { "firewallRule": { "name": "allow-web" } } }),
                }),
            },
            RuleReport {
                rule: "allow-ssh".to_string(),
                outcome: RuleOutcome::Updated {
                    properties: vec![Property::Action, Property::ServiceGroup],
                },
                request: None,
            },
            RuleReport {
                rule: "old".to_string(),
                outcome: RuleOutcome::Failed {
                    error: "boom".to_string(),
                },
                request: None,
            },
        ]
    }

    #[test]
    fn renders_outcomes_and_request_bodies() {
        colored::control::set_override(false);
        let text = render_reports(&reports(), true);
        assert!(text.contains("+ allow-web created"));
        assert!(text.contains("POST /api/3.0/edges/edge-1/firewall/config/rules"));
        assert!(text.contains("<name>allow-web</name>"));
        assert!(text.contains("~ allow-ssh updated (action, service_group)"));
        assert!(text.contains("x old failed: boom"));
    }

    #[test]
    fn summary_counts_each_outcome() {
        colored::control::set_override(false);
        assert_eq!(
            render_summary(&reports()),
            "result created=1 updated=1 in_sync=0 delete_ignored=0 failed=1"
        );
    }

    #[test]
    fn resolution_marks_missing_names() {
        colored::control::set_override(false);
        let text = render_resolution(
            "r",
            &[ResolutionEntry {
                property: Property::Destination,
                name: "db".to_string(),
                resolution: Resolution::Missing,
            }],
        );
        assert!(text.contains("destination db -> MISSING"));
    }
}
