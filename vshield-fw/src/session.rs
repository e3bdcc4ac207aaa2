//! One reconciliation pass for one firewall rule.
//!
//! A [`Session`] is opened by the existence check, which fetches everything the
//! pass needs. Accessors read from that snapshot, setters stage properties in
//! a [`ChangeSet`], and the pass ends when [`Session::create`],
//! [`Session::flush`] or [`Session::destroy`] consumes the session.
//!
//! Updates are full-object replacements: the matched rule, with the desired
//! properties merged in and nulls stripped, is sent back as a whole.

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::accessors::{
    read_addresses, read_service_applications, read_service_groups, ChangeSet, Property,
};
use crate::api;
use crate::desired::DesiredRule;
use crate::error::ReconcileError;
use crate::loader::{load_remote_state, RemoteState};
use crate::matcher::find_rule;
use crate::model::FirewallRule;
use crate::normalize::{empty_rule, normalize};
use crate::resolve::Resolver;
use crate::transport::{Method, Transport, WriteCall};

pub struct Session<'t> {
    transport: &'t dyn Transport,
    edge: String,
    desired: DesiredRule,
    state: RemoteState,
    rule: Option<FirewallRule>,
    changes: ChangeSet,
}

impl<'t> Session<'t> {
    /// Load remote state for `edge` and look up the rule named in `desired`.
    pub fn open(
        transport: &'t dyn Transport,
        edge: impl Into<String>,
        desired: DesiredRule,
    ) -> Result<Self, ReconcileError> {
        let edge = edge.into();
        let state = load_remote_state(transport, &edge)?;
        let rule = find_rule(&state.rules, &desired.name)
            .cloned()
            .map(normalize);
        debug!(
            rule = %desired.name,
            edge = %edge,
            found = rule.is_some(),
            "checked rule existence"
        );
        Ok(Self {
            transport,
            edge,
            desired,
            state,
            rule,
            changes: ChangeSet::default(),
        })
    }

    pub fn exists(&self) -> bool {
        self.rule.is_some()
    }

    pub fn edge(&self) -> &str {
        &self.edge
    }

    pub fn desired(&self) -> &DesiredRule {
        &self.desired
    }

    pub fn state(&self) -> &RemoteState {
        &self.state
    }

    /// The matched rule, normalized.
    pub fn rule(&self) -> Option<&FirewallRule> {
        self.rule.as_ref()
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn action(&self) -> Option<&str> {
        self.rule.as_ref()?.action.as_deref()
    }

    pub fn source(&self) -> Vec<String> {
        self.rule
            .as_ref()
            .map(|rule| read_addresses(&rule.source, &self.state.address_sets))
            .unwrap_or_default()
    }

    pub fn destination(&self) -> Vec<String> {
        self.rule
            .as_ref()
            .map(|rule| read_addresses(&rule.destination, &self.state.address_sets))
            .unwrap_or_default()
    }

    pub fn service_application(&self) -> Vec<String> {
        self.rule
            .as_ref()
            .map(|rule| read_service_applications(&rule.application, &self.state.services))
            .unwrap_or_default()
    }

    pub fn service_group(&self) -> Vec<String> {
        self.rule
            .as_ref()
            .map(|rule| read_service_groups(&rule.application, &self.state.service_groups))
            .unwrap_or_default()
    }

    /// Mark `property` as changed. The rule itself is only rewritten by `flush`.
    pub fn stage(&mut self, property: Property) {
        self.changes.stage(property);
    }

    pub fn set_action(&mut self) {
        self.stage(Property::Action);
    }

    pub fn set_source(&mut self) {
        self.stage(Property::Source);
    }

    pub fn set_destination(&mut self) {
        self.stage(Property::Destination);
    }

    pub fn set_service_application(&mut self) {
        self.stage(Property::ServiceApplication);
    }

    pub fn set_service_group(&mut self) {
        self.stage(Property::ServiceGroup);
    }

    /// Submit the desired rule as a new rule on the edge.
    pub fn create(self) -> Result<WriteCall, ReconcileError> {
        let mut rule = empty_rule();
        rule.name = self.desired.name.clone();
        self.merge_desired(&mut rule)?;

        let body = json!({ "firewallRules": { "firewallRule": self.payload(&rule)? } });
        let path = api::firewall_rules(&self.edge);
        info!(rule = %rule.name, edge = %self.edge, "creating firewall rule");
        self.transport.post(&path, &body)?;
        Ok(WriteCall {
            method: Method::Post,
            path,
            body,
        })
    }

    /// Push staged changes to the matched rule. Returns `None` when nothing is staged.
    pub fn flush(mut self) -> Result<Option<WriteCall>, ReconcileError> {
        if self.changes.is_empty() {
            debug!(rule = %self.desired.name, "no pending changes");
            return Ok(None);
        }
        let Some(mut rule) = self.rule.take() else {
            return Err(ReconcileError::MissingTarget {
                rule: self.desired.name.clone(),
            });
        };
        let Some(id) = rule.id.clone() else {
            return Err(ReconcileError::MissingIdentifier {
                rule: self.desired.name.clone(),
            });
        };
        if !api::is_path_segment(&id) {
            return Err(ReconcileError::InvalidIdentifier {
                rule: self.desired.name.clone(),
                id,
            });
        }
        self.merge_desired(&mut rule)?;

        let body = json!({ "firewallRule": self.payload(&rule)? });
        let path = api::firewall_rule(&self.edge, &id);
        info!(
            rule = %rule.name,
            id = %id,
            changed = ?self.changes.properties(),
            "updating firewall rule"
        );
        self.transport.put(&path, &body)?;
        Ok(Some(WriteCall {
            method: Method::Put,
            path,
            body,
        }))
    }

    /// Removal is not supported; the remote rule is left in place.
    pub fn destroy(self) {
        info!(
            rule = %self.desired.name,
            edge = %self.edge,
            "delete not implemented; firewall rule left in place"
        );
    }

    /// Fold every desired property into `rule`.
    ///
    /// `source`/`destination` are only written when the desired list is
    /// non-empty; services are always written since `any` already resolves to
    /// an empty list. An unset desired action keeps the rule's current one.
    fn merge_desired(&self, rule: &mut FirewallRule) -> Result<(), ReconcileError> {
        let desired = &self.desired;
        let resolver = Resolver::new(&self.state, &desired.name);

        if let Some(action) = desired.action {
            rule.action = Some(action.to_string());
        }
        if !desired.source.is_empty() {
            rule.source.grouping_object_id =
                resolver.addresses(&desired.source, Property::Source)?;
        }
        if !desired.destination.is_empty() {
            rule.destination.grouping_object_id =
                resolver.addresses(&desired.destination, Property::Destination)?;
        }
        rule.application.application_id =
            resolver.services(&desired.service_application, &desired.service_group)?;
        Ok(())
    }

    fn payload(&self, rule: &FirewallRule) -> Result<Value, ReconcileError> {
        rule.payload().map_err(|source| ReconcileError::Encode {
            rule: rule.name.clone(),
            source,
        })
    }
}
