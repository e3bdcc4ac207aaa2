use tracing::warn;

use crate::model::RemoteRule;

/// The only rule type this crate manages. System rules (`internal_high`,
/// `default_policy`, ...) are never matched, even on an exact name.
pub const MANAGED_RULE_TYPE: &str = "user";

/// Find the user rule named `name`.
///
/// The manager is assumed to keep user rule names unique. When it does not,
/// the first rule in fetch order wins and a warning is logged.
pub fn find_rule<'a>(rules: &'a [RemoteRule], name: &str) -> Option<&'a RemoteRule> {
    let mut matches = rules.iter().filter(|rule| {
        rule.name.as_deref() == Some(name) && rule.rule_type.as_deref() == Some(MANAGED_RULE_TYPE)
    });
    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        warn!(
            rule = name,
            id = first.id.as_deref().unwrap_or("-"),
            duplicates = others,
            "multiple user rules share this name; using the first"
        );
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::find_rule;
    use crate::model::RemoteRule;

    fn rules(value: serde_json::Value) -> Vec<RemoteRule> {
        serde_json::from_value(value).expect("decode rules")
    }

    #[test]
    fn ignores_non_user_rule_types() {
        let rules = rules(json!([{ "name": "x", "ruleType": "internal" }]));
        assert!(find_rule(&rules, "x").is_none());
    }

    #[test]
    fn matches_user_rule_by_exact_name() {
        let rules = rules(json!([
            { "id": "1", "name": "x", "ruleType": "internal_high" },
            { "id": "2", "name": "X", "ruleType": "user" },
            { "id": "3", "name": "x", "ruleType": "user" }
        ]));
        let found = find_rule(&rules, "x").expect("match");
        assert_eq!(found.id.as_deref(), Some("3"));
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let rules = rules(json!([
            { "id": "4", "name": "dup", "ruleType": "user" },
            { "id": "5", "name": "dup", "ruleType": "user" }
        ]));
        assert_eq!(
            find_rule(&rules, "dup").and_then(|r| r.id.as_deref()),
            Some("4")
        );
    }

    #[test]
    fn missing_rule_type_never_matches() {
        let rules = rules(json!([{ "name": "x" }]));
        assert!(find_rule(&rules, "x").is_none());
    }
}
