//! Fetches one pass worth of remote state for an edge.
//!
//! The manager returns a bare object instead of a one-element list when a
//! collection has a single member, and omits the member key entirely when the
//! collection is empty. Every list read here goes through [`ensure_array`] so
//! the rest of the crate only ever iterates sequences.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api;
use crate::error::ReconcileError;
use crate::model::{AddressSet, RemoteRule, Service, ServiceGroup};
use crate::transport::Transport;

const IPSET_PATH: &[&str] = &["list", "ipset"];
const APPLICATION_PATH: &[&str] = &["list", "application"];
const APPLICATION_GROUP_PATH: &[&str] = &["list", "applicationGroup"];
const RULE_PATH: &[&str] = &["firewall", "firewallRules", "firewallRule"];

/// Snapshot of the remote collections, valid for a single reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteState {
    pub address_sets: Vec<AddressSet>,
    pub services: Vec<Service>,
    pub service_groups: Vec<ServiceGroup>,
    /// Rules in fetch order.
    pub rules: Vec<RemoteRule>,
}

/// Fetch the firewall rules and the three supporting collections for `edge`.
///
/// Transport failures are returned unchanged.
pub fn load_remote_state(
    transport: &dyn Transport,
    edge: &str,
) -> Result<RemoteState, ReconcileError> {
    let rules = fetch_list(transport, &api::firewall_config(edge), RULE_PATH, "firewall rule")?;
    let address_sets = fetch_list(transport, &api::ipset_list(edge), IPSET_PATH, "ipset")?;
    let services = fetch_list(
        transport,
        &api::application_list(edge),
        APPLICATION_PATH,
        "application",
    )?;
    let service_groups = fetch_list(
        transport,
        &api::application_group_list(edge),
        APPLICATION_GROUP_PATH,
        "application group",
    )?;

    debug!(
        edge,
        rules = rules.len(),
        ipsets = address_sets.len(),
        applications = services.len(),
        application_groups = service_groups.len(),
        "loaded remote state"
    );

    Ok(RemoteState {
        address_sets,
        services,
        service_groups,
        rules,
    })
}

/// Walk `path` through nested objects. Any missing or non-object step yields `None`.
pub fn nested_value<'a>(doc: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(doc, |current, key| current.get(key))
}

/// Coerce an optional member into a sequence: absent or `null` is empty, a
/// single value becomes a one-element sequence, and arrays are kept as-is.
pub fn ensure_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(other) => vec![other.clone()],
    }
}

fn fetch_list<T: DeserializeOwned>(
    transport: &dyn Transport,
    url: &str,
    path: &[&str],
    what: &'static str,
) -> Result<Vec<T>, ReconcileError> {
    debug!(url, "GET");
    let doc = transport.get(url)?;
    ensure_array(nested_value(&doc, path))
        .into_iter()
        .map(|item| {
            serde_json::from_value(item).map_err(|source| ReconcileError::Decode { what, source })
        })
        .collect()
}
