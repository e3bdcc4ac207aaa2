use crate::model::{FirewallRule, RemoteRule};

/// Fill in every optional block of a fetched rule.
///
/// Missing `source`/`destination` become an empty grouping list and a missing
/// `application` becomes an empty application list. This is the only place
/// the optional case is handled; everything downstream works on
/// [`FirewallRule`]. Converting the result back with `RemoteRule::from` and
/// normalizing again yields the same rule.
pub fn normalize(rule: RemoteRule) -> FirewallRule {
    FirewallRule {
        id: rule.id,
        name: rule.name.unwrap_or_default(),
        rule_type: rule.rule_type,
        action: rule.action,
        source: rule.source.unwrap_or_default(),
        destination: rule.destination.unwrap_or_default(),
        application: rule.application.unwrap_or_default(),
        extra: rule.extra,
    }
}

/// An empty rule ready to receive desired state before creation.
pub fn empty_rule() -> FirewallRule {
    normalize(RemoteRule::default())
}
