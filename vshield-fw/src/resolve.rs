//! Name → identifier resolution against a fetched [`RemoteState`].
//!
//! ## Address references
//!
//! Source and destination entries are classified before any lookup:
//!
//! | Desired        | Wire identifier   |
//! |----------------|-------------------|
//! | `external`     | `external`        |
//! | `internal`     | `internal`        |
//! | `vse`          | `vse`             |
//! | `vnic0`..`vnic9` | `vnic-index-N`  |
//! | anything else  | ipset `objectId`  |
//!
//! ## Service references
//!
//! Services and service groups are looked up by exact name. A list holding
//! only `any` means "no restriction" and contributes no identifiers. The
//! combined list is sorted so repeated passes produce identical payloads.

use serde::Serialize;
use thiserror::Error;

use crate::accessors::Property;
use crate::desired::{unique_names, DesiredRule};
use crate::loader::RemoteState;
use crate::model::NamedObject;

/// A referenced name that does not exist on the manager.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("ipset '{name}' does not exist for rule '{rule}' (property {property})")]
    AddressSet {
        name: String,
        rule: String,
        property: Property,
    },
    #[error("service '{name}' does not exist for rule '{rule}'")]
    Service { name: String, rule: String },
    #[error("service group '{name}' does not exist for rule '{rule}'")]
    ServiceGroup { name: String, rule: String },
}

/// Built-in address keywords passed to the manager verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    External,
    Internal,
    Vse,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::External => "external",
            Keyword::Internal => "internal",
            Keyword::Vse => "vse",
        }
    }
}

/// Classification of one source/destination entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressToken<'a> {
    Keyword(Keyword),
    /// Edge interface by index, `vnicN` in desired state.
    Vnic(u8),
    /// Address-set name to look up.
    Named(&'a str),
}

impl<'a> AddressToken<'a> {
    /// Classify a desired-state entry.
    pub fn classify(name: &'a str) -> Self {
        if let Some(keyword) = keyword(name) {
            return AddressToken::Keyword(keyword);
        }
        match vnic_digit(name.strip_prefix("vnic")) {
            Some(index) => AddressToken::Vnic(index),
            None => AddressToken::Named(name),
        }
    }

    /// Classify an identifier found on a remote rule. Address-set ids yield `None`.
    pub fn from_wire(id: &str) -> Option<AddressToken<'static>> {
        if let Some(keyword) = keyword(id) {
            return Some(AddressToken::Keyword(keyword));
        }
        vnic_digit(id.strip_prefix("vnic-index-")).map(AddressToken::Vnic)
    }

    /// The identifier the manager uses for a token; `None` for named entries.
    pub fn wire_id(&self) -> Option<String> {
        match self {
            AddressToken::Keyword(keyword) => Some(keyword.as_str().to_string()),
            AddressToken::Vnic(index) => Some(format!("vnic-index-{index}")),
            AddressToken::Named(_) => None,
        }
    }
}

fn keyword(value: &str) -> Option<Keyword> {
    match value {
        "external" => Some(Keyword::External),
        "internal" => Some(Keyword::Internal),
        "vse" => Some(Keyword::Vse),
        _ => None,
    }
}

/// Exactly one ASCII digit.
fn vnic_digit(rest: Option<&str>) -> Option<u8> {
    match rest?.as_bytes() {
        [digit @ b'0'..=b'9'] => Some(digit - b'0'),
        _ => None,
    }
}

/// True when a service list is the single `any` sentinel.
pub fn is_any(names: &[String]) -> bool {
    matches!(names, [only] if only == "any")
}

/// Resolves the references of one rule against one pass's remote state.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    state: &'a RemoteState,
    rule: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(state: &'a RemoteState, rule: &'a str) -> Self {
        Self { state, rule }
    }

    /// Resolve one source/destination entry.
    pub fn address(&self, name: &str, property: Property) -> Result<String, ResolutionError> {
        let token = AddressToken::classify(name);
        if let Some(id) = token.wire_id() {
            return Ok(id);
        }
        lookup(&self.state.address_sets, name)
            .map(|set| set.object_id.clone())
            .ok_or_else(|| ResolutionError::AddressSet {
                name: name.to_string(),
                rule: self.rule.to_string(),
                property,
            })
    }

    /// Resolve a source/destination list, keeping its order. Each identifier
    /// appears once.
    pub fn addresses(
        &self,
        names: &[String],
        property: Property,
    ) -> Result<Vec<String>, ResolutionError> {
        let ids = names
            .iter()
            .map(|name| self.address(name, property))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(unique_names(&ids))
    }

    /// Resolve services and service groups into one sorted, duplicate-free
    /// identifier list.
    pub fn services(
        &self,
        applications: &[String],
        groups: &[String],
    ) -> Result<Vec<String>, ResolutionError> {
        let mut ids = Vec::new();
        for name in without_any(applications) {
            let service = lookup(&self.state.services, name).ok_or_else(|| {
                ResolutionError::Service {
                    name: name.clone(),
                    rule: self.rule.to_string(),
                }
            })?;
            ids.push(service.object_id.clone());
        }
        for name in without_any(groups) {
            let group = lookup(&self.state.service_groups, name).ok_or_else(|| {
                ResolutionError::ServiceGroup {
                    name: name.clone(),
                    rule: self.rule.to_string(),
                }
            })?;
            ids.push(group.object_id.clone());
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

fn without_any(names: &[String]) -> &[String] {
    if is_any(names) {
        &[]
    } else {
        names
    }
}

fn lookup<'o>(objects: &'o [NamedObject], name: &str) -> Option<&'o NamedObject> {
    objects.iter().find(|object| object.name == name)
}

/// How a single desired reference resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// Special token passed through or rewritten.
    Token { id: String },
    /// Looked up by name.
    Object { id: String },
    /// The `any` sentinel; contributes nothing.
    Any,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionEntry {
    pub property: Property,
    pub name: String,
    pub resolution: Resolution,
}

/// Resolve every reference of `desired` without stopping at the first miss.
pub fn explain(state: &RemoteState, desired: &DesiredRule) -> Vec<ResolutionEntry> {
    let mut out = Vec::new();
    for (property, names) in [
        (Property::Source, &desired.source),
        (Property::Destination, &desired.destination),
    ] {
        for name in names {
            let resolution = match AddressToken::classify(name).wire_id() {
                Some(id) => Resolution::Token { id },
                None => object_resolution(&state.address_sets, name),
            };
            out.push(entry(property, name, resolution));
        }
    }
    for (property, names, objects) in [
        (
            Property::ServiceApplication,
            &desired.service_application,
            &state.services,
        ),
        (
            Property::ServiceGroup,
            &desired.service_group,
            &state.service_groups,
        ),
    ] {
        if is_any(names) {
            out.push(entry(property, "any", Resolution::Any));
            continue;
        }
        for name in names {
            out.push(entry(property, name, object_resolution(objects, name)));
        }
    }
    out
}

fn object_resolution(objects: &[NamedObject], name: &str) -> Resolution {
    lookup(objects, name).map_or(Resolution::Missing, |object| Resolution::Object {
        id: object.object_id.clone(),
    })
}

fn entry(property: Property, name: &str, resolution: Resolution) -> ResolutionEntry {
    ResolutionEntry {
        property,
        name: name.to_string(),
        resolution,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{explain, is_any, AddressToken, Keyword, Resolution, ResolutionError, Resolver};
    use crate::accessors::{
        read_addresses, read_service_applications, read_service_groups, Property,
    };
    use crate::desired::DesiredRule;
    use crate::loader::RemoteState;
    use crate::model::{AddressScope, ApplicationScope, NamedObject};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn state() -> RemoteState {
        RemoteState {
            address_sets: vec![
                NamedObject::new("ipset-7", "web-servers"),
                NamedObject::new("ipset-9", "admin-hosts"),
            ],
            services: vec![
                NamedObject::new("application-1", "http"),
                NamedObject::new("application-22", "ssh"),
            ],
            service_groups: vec![NamedObject::new("applicationgroup-2", "db-group")],
            rules: Vec::new(),
        }
    }

    #[test]
    fn classifies_tokens() {
        assert_eq!(
            AddressToken::classify("vse"),
            AddressToken::Keyword(Keyword::Vse)
        );
        assert_eq!(AddressToken::classify("vnic0"), AddressToken::Vnic(0));
        assert_eq!(
            AddressToken::classify("vnic10"),
            AddressToken::Named("vnic10")
        );
        assert_eq!(AddressToken::classify("vnic"), AddressToken::Named("vnic"));
        assert_eq!(
            AddressToken::classify("External"),
            AddressToken::Named("External")
        );
        assert_eq!(
            AddressToken::from_wire("vnic-index-4"),
            Some(AddressToken::Vnic(4))
        );
        assert_eq!(AddressToken::from_wire("ipset-4"), None);
    }

    #[test]
    fn tokens_bypass_lookup() {
        let empty = RemoteState::default();
        let resolver = Resolver::new(&empty, "r");
        assert_eq!(
            resolver.address("external", Property::Source),
            Ok("external".to_string())
        );
        assert_eq!(
            resolver.address("vnic3", Property::Source),
            Ok("vnic-index-3".to_string())
        );
    }

    #[test]
    fn named_addresses_resolve_to_object_ids() {
        let state = state();
        let resolver = Resolver::new(&state, "r");
        assert_eq!(
            resolver.address("web-servers", Property::Destination),
            Ok("ipset-7".to_string())
        );
    }

    #[test]
    fn unknown_address_names_the_rule_and_property() {
        let empty = RemoteState::default();
        let err = Resolver::new(&empty, "allow-web")
            .address("unknown", Property::Destination)
            .expect_err("missing ipset");
        assert_eq!(
            err,
            ResolutionError::AddressSet {
                name: "unknown".to_string(),
                rule: "allow-web".to_string(),
                property: Property::Destination,
            }
        );
        assert!(err.to_string().contains("allow-web"));
    }

    #[test]
    fn any_resolves_to_nothing() {
        let state = state();
        let resolver = Resolver::new(&state, "r");
        assert_eq!(resolver.services(&strings(&["any"]), &[]), Ok(Vec::new()));
        assert_eq!(
            resolver.services(&[], &strings(&["any"])),
            Ok(Vec::new())
        );
        assert!(is_any(&strings(&["any"])));
        assert!(!is_any(&strings(&["any", "http"])));
    }

    #[test]
    fn services_and_groups_resolve_sorted() {
        let state = state();
        let resolver = Resolver::new(&state, "r");
        assert_eq!(
            resolver.services(&strings(&["ssh", "http"]), &strings(&["db-group"])),
            Ok(strings(&["application-1", "application-22", "applicationgroup-2"]))
        );
    }

    #[test]
    fn repeated_names_resolve_to_one_identifier() {
        let state = state();
        let resolver = Resolver::new(&state, "r");
        assert_eq!(
            resolver.addresses(
                &strings(&["web-servers", "vnic1", "web-servers", "vnic1"]),
                Property::Destination
            ),
            Ok(strings(&["ipset-7", "vnic-index-1"]))
        );
        assert_eq!(
            resolver.services(&strings(&["http", "http"]), &strings(&["db-group", "db-group"])),
            Ok(strings(&["application-1", "applicationgroup-2"]))
        );
    }

    #[test]
    fn any_mixed_with_names_is_looked_up_literally() {
        let state = state();
        let err = Resolver::new(&state, "r")
            .services(&strings(&["http", "any"]), &[])
            .expect_err("'any' is only special on its own");
        assert!(matches!(err, ResolutionError::Service { name, .. } if name == "any"));
    }

    #[test]
    fn missing_group_is_reported() {
        let state = state();
        let err = Resolver::new(&state, "r")
            .services(&[], &strings(&["web-group"]))
            .expect_err("missing group");
        assert!(matches!(err, ResolutionError::ServiceGroup { .. }));
    }

    #[test]
    fn resolved_names_read_back_to_the_same_set() {
        let state = state();
        let resolver = Resolver::new(&state, "r");

        let addresses = strings(&["web-servers", "admin-hosts"]);
        let scope = AddressScope {
            grouping_object_id: resolver
                .addresses(&addresses, Property::Source)
                .expect("resolve"),
            ..AddressScope::default()
        };
        assert_eq!(
            read_addresses(&scope, &state.address_sets),
            strings(&["admin-hosts", "web-servers"])
        );

        let apps = strings(&["ssh", "http"]);
        let groups = strings(&["db-group"]);
        let application = ApplicationScope {
            application_id: resolver.services(&apps, &groups).expect("resolve"),
            ..ApplicationScope::default()
        };
        assert_eq!(
            read_service_applications(&application, &state.services),
            strings(&["http", "ssh"])
        );
        assert_eq!(
            read_service_groups(&application, &state.service_groups),
            groups
        );
    }

    #[test]
    fn explain_reports_every_reference() {
        let state = state();
        let mut desired = DesiredRule::new("r");
        desired.source = strings(&["vnic1", "nowhere"]);
        desired.service_application = strings(&["http"]);
        desired.service_group = strings(&["any"]);

        let entries = explain(&state, &desired);
        let resolutions: Vec<_> = entries.iter().map(|e| e.resolution.clone()).collect();
        assert_eq!(
            resolutions,
            vec![
                Resolution::Token {
                    id: "vnic-index-1".to_string()
                },
                Resolution::Missing,
                Resolution::Object {
                    id: "application-1".to_string()
                },
                Resolution::Any,
            ]
        );
    }
}
