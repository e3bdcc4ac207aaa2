//! Drives one [`Session`] per desired rule: detect drift, stage it, write.
//!
//! ## Drift rules
//!
//! - `action`: compared only when the desired rule sets one
//! - `source`/`destination`: compared only when the desired list is
//!   non-empty; named entries against the read accessor, special tokens
//!   against the wire identifiers present on the rule
//! - `service_application`/`service_group`: always compared, `["any"]`
//!   counts as empty
//!
//! Every comparison is between sets; order and repeats never count as drift.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::accessors::Property;
use crate::desired::{DesiredRule, Ensure};
use crate::error::ReconcileError;
use crate::model::AddressScope;
use crate::resolve::{is_any, AddressToken};
use crate::session::Session;
use crate::transport::{Transport, WriteCall};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RuleOutcome {
    Created,
    Updated { properties: Vec<Property> },
    InSync,
    /// Removal was requested for an existing rule; it was left in place.
    DeleteIgnored,
    Failed { error: String },
}

/// Result of reconciling one desired rule.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleReport {
    pub rule: String,
    #[serde(flatten)]
    pub outcome: RuleOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<WriteCall>,
}

impl RuleReport {
    pub fn failed(rule: &str, err: &ReconcileError) -> Self {
        Self {
            rule: rule.to_string(),
            outcome: RuleOutcome::Failed {
                error: err.to_string(),
            },
            request: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.outcome, RuleOutcome::Failed { .. })
    }
}

/// Run a full pass for `desired` against `edge`.
pub fn reconcile_rule(
    transport: &dyn Transport,
    edge: &str,
    desired: &DesiredRule,
) -> Result<RuleReport, ReconcileError> {
    let mut session = Session::open(transport, edge, desired.clone())?;
    let rule = desired.name.clone();

    if desired.ensure == Ensure::Absent {
        if !session.exists() {
            return Ok(report(rule, RuleOutcome::InSync, None));
        }
        session.destroy();
        return Ok(report(rule, RuleOutcome::DeleteIgnored, None));
    }

    if !session.exists() {
        let call = session.create()?;
        return Ok(report(rule, RuleOutcome::Created, Some(call)));
    }

    let drifted = drift(&session);
    for property in &drifted {
        session.stage(*property);
    }
    let call = session.flush()?;
    let outcome = if drifted.is_empty() {
        RuleOutcome::InSync
    } else {
        RuleOutcome::Updated {
            properties: drifted,
        }
    };
    Ok(report(rule, outcome, call))
}

/// Reconcile every rule, turning per-rule errors into failed reports.
pub fn reconcile_all(
    transport: &dyn Transport,
    edge: &str,
    rules: &[&DesiredRule],
) -> Vec<RuleReport> {
    rules
        .iter()
        .map(|desired| {
            reconcile_rule(transport, edge, desired)
                .unwrap_or_else(|err| RuleReport::failed(&desired.name, &err))
        })
        .collect()
}

/// Properties of the matched rule that differ from desired state.
pub fn drift(session: &Session<'_>) -> Vec<Property> {
    let Some(rule) = session.rule() else {
        return Vec::new();
    };
    let desired = session.desired();
    let mut out = Vec::new();

    if let Some(action) = desired.action {
        if session.action() != Some(action.as_str()) {
            out.push(Property::Action);
        }
    }
    if !desired.source.is_empty()
        && !addresses_match(&desired.source, &rule.source, session.source())
    {
        out.push(Property::Source);
    }
    if !desired.destination.is_empty()
        && !addresses_match(&desired.destination, &rule.destination, session.destination())
    {
        out.push(Property::Destination);
    }
    if !services_match(&desired.service_application, session.service_application()) {
        out.push(Property::ServiceApplication);
    }
    if !services_match(&desired.service_group, session.service_group()) {
        out.push(Property::ServiceGroup);
    }
    out
}

fn addresses_match(wanted: &[String], scope: &AddressScope, current_names: Vec<String>) -> bool {
    let mut wanted_names = BTreeSet::new();
    let mut wanted_tokens = BTreeSet::new();
    for entry in wanted {
        match AddressToken::classify(entry).wire_id() {
            Some(id) => wanted_tokens.insert(id),
            None => wanted_names.insert(entry.clone()),
        };
    }

    let current_tokens: BTreeSet<String> = scope
        .grouping_object_id
        .iter()
        .filter(|id| AddressToken::from_wire(id).is_some())
        .cloned()
        .collect();

    let current_names: BTreeSet<String> = current_names.into_iter().collect();
    wanted_names == current_names && wanted_tokens == current_tokens
}

fn services_match(wanted: &[String], current: Vec<String>) -> bool {
    let wanted: BTreeSet<&String> = if is_any(wanted) {
        BTreeSet::new()
    } else {
        wanted.iter().collect()
    };
    let current: BTreeSet<&String> = current.iter().collect();
    wanted == current
}

fn report(rule: String, outcome: RuleOutcome, request: Option<WriteCall>) -> RuleReport {
    RuleReport {
        rule,
        outcome,
        request,
    }
}
