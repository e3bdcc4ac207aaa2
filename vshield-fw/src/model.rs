//! Remote object shapes for address sets, services, service groups and rules.
//!
//! Rule documents are only partly modeled. Every field the reconciler does not
//! manage (`enabled`, `loggingEnabled`, `description`, `ruleTag`, ...) is kept
//! in an `extra` map so that full-object updates resend it untouched.

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identifier prefix carried by individual services.
pub const SERVICE_PREFIX: &str = "application-";
/// Identifier prefix carried by service groups.
pub const SERVICE_GROUP_PREFIX: &str = "applicationgroup-";

/// A remotely managed object referenced by name in desired state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedObject {
    pub object_id: String,
    /// An empty `<name/>` arrives as `null` and reads as `""`.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub name: String,
}

impl NamedObject {
    pub fn new(object_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            object_id: object_id.into(),
            name: name.into(),
        }
    }
}

/// Address set (`ipset`).
pub type AddressSet = NamedObject;
/// Individual service (`application`), identifiers prefixed `application-`.
pub type Service = NamedObject;
/// Service group (`applicationGroup`), identifiers prefixed `applicationgroup-`.
pub type ServiceGroup = NamedObject;

/// Source or destination block of a rule.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressScope {
    #[serde(default, deserialize_with = "one_or_many")]
    pub grouping_object_id: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Allowed-services block of a rule.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationScope {
    #[serde(default, deserialize_with = "one_or_many")]
    pub application_id: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A firewall rule exactly as the manager returns it: every nested block may
/// be missing.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<AddressScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<AddressScope>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application: Option<ApplicationScope>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A firewall rule after normalization: the nested blocks always exist.
///
/// Built only through [`crate::normalize::normalize`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FirewallRule {
    pub id: Option<String>,
    pub name: String,
    pub rule_type: Option<String>,
    pub action: Option<String>,
    pub source: AddressScope,
    pub destination: AddressScope,
    pub application: ApplicationScope,
    pub extra: Map<String, Value>,
}

impl FirewallRule {
    /// The rule as a request document with every `null` removed.
    pub fn payload(&self) -> Result<Value, serde_json::Error> {
        let mut value = serde_json::to_value(RemoteRule::from(self.clone()))?;
        strip_nulls(&mut value);
        Ok(value)
    }
}

impl From<FirewallRule> for RemoteRule {
    fn from(rule: FirewallRule) -> Self {
        Self {
            id: rule.id,
            name: Some(rule.name),
            rule_type: rule.rule_type,
            action: rule.action,
            source: Some(rule.source),
            destination: Some(rule.destination),
            application: Some(rule.application),
            extra: rule.extra,
        }
    }
}

/// Remove `null` members from every object in `value`, recursively.
pub fn strip_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, member| !member.is_null());
            for member in map.values_mut() {
                strip_nulls(member);
            }
        }
        Value::Array(items) => {
            items.retain(|item| !item.is_null());
            for item in items {
                strip_nulls(item);
            }
        }
        _ => {}
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Read a missing or `null` string as empty.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept a lone identifier, a list of identifiers, or nothing.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(id)) => vec![id],
        Some(OneOrMany::Many(ids)) => ids,
    })
}
