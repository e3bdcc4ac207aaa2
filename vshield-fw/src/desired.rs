use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize};

/// What the rule does with matching traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Accept,
    Deny,
    Reject,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Accept => "accept",
            Action::Deny => "deny",
            Action::Reject => "reject",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the rule should exist at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensure {
    #[default]
    Present,
    /// Removal is not supported; passes only log a notice.
    Absent,
}

/// Desired state for one firewall rule, expressed with human-readable names.
///
/// The four name lists are sets: repeated names are dropped on load, keeping
/// the first occurrence.
///
/// `source` and `destination` accept address-set names plus the tokens
/// `external`, `internal`, `vse` and `vnic0`..`vnic9`. An empty list leaves
/// the remote value alone. For services, a list holding only `any` means no
/// restriction.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DesiredRule {
    pub name: String,
    #[serde(default)]
    pub ensure: Ensure,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, deserialize_with = "name_set")]
    pub source: Vec<String>,
    #[serde(default, deserialize_with = "name_set")]
    pub destination: Vec<String>,
    #[serde(default, deserialize_with = "name_set")]
    pub service_application: Vec<String>,
    #[serde(default, deserialize_with = "name_set")]
    pub service_group: Vec<String>,
}

impl DesiredRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ensure: Ensure::Present,
            action: None,
            source: Vec::new(),
            destination: Vec::new(),
            service_application: Vec::new(),
            service_group: Vec::new(),
        }
    }
}

/// Drop repeated names, keeping first-occurrence order.
pub fn unique_names(names: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

fn name_set<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(unique_names(&Vec::<String>::deserialize(deserializer)?))
}

#[cfg(test)]
mod tests {
    use super::{unique_names, Action, DesiredRule, Ensure};

    #[test]
    fn decodes_minimal_rule_with_defaults() {
        let rule: DesiredRule = toml::from_str(r#"name = "allow-web""#).expect("decode");
        assert_eq!(rule, DesiredRule::new("allow-web"));
        assert_eq!(rule.ensure, Ensure::Present);
    }

    #[test]
    fn decodes_full_rule() {
        let rule: DesiredRule = toml::from_str(
            r#"
name = "allow-web"
action = "reject"
ensure = "absent"
source = ["external"]
destination = ["web-servers", "vnic2"]
service_application = ["http"]
service_group = ["any"]
"#,
        )
        .expect("decode");
        assert_eq!(rule.action, Some(Action::Reject));
        assert_eq!(rule.ensure, Ensure::Absent);
        assert_eq!(rule.destination, vec!["web-servers", "vnic2"]);
    }

    #[test]
    fn rejects_unknown_keys_and_actions() {
        assert!(toml::from_str::<DesiredRule>("name = \"r\"\nlog = true").is_err());
        assert!(toml::from_str::<DesiredRule>("name = \"r\"\naction = \"drop\"").is_err());
    }

    #[test]
    fn repeated_names_load_once() {
        let rule: DesiredRule = toml::from_str(
            r#"
name = "r"
destination = ["web-servers", "vnic1", "web-servers"]
service_application = ["http", "http"]
"#,
        )
        .expect("decode");
        assert_eq!(rule.destination, vec!["web-servers", "vnic1"]);
        assert_eq!(rule.service_application, vec!["http"]);
    }

    #[test]
    fn unique_names_keeps_first_occurrence_order() {
        let names: Vec<String> = ["b", "a", "b", "c", "a"].iter().map(|s| s.to_string()).collect();
        assert_eq!(unique_names(&names), vec!["b", "a", "c"]);
    }
}
