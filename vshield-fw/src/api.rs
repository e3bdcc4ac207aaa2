//! Manager REST endpoint paths, parameterized by edge scope.

pub fn ipset_list(edge: &str) -> String {
    format!("/api/2.0/services/ipset/scope/{edge}")
}

pub fn application_list(edge: &str) -> String {
    format!("/api/2.0/services/application/scope/{edge}")
}

pub fn application_group_list(edge: &str) -> String {
    format!("/api/2.0/services/applicationgroup/scope/{edge}")
}

pub fn firewall_config(edge: &str) -> String {
    format!("/api/3.0/edges/{edge}/firewall/config")
}

/// Collection endpoint that accepts new rules.
pub fn firewall_rules(edge: &str) -> String {
    format!("/api/3.0/edges/{edge}/firewall/config/rules")
}

pub fn firewall_rule(edge: &str, rule_id: &str) -> String {
    format!("/api/3.0/edges/{edge}/firewall/config/rules/{rule_id}")
}

/// True when `value` can be placed in a path as one segment without encoding:
/// ASCII letters, digits, `-`, `_` and `.`, and not `.` or `..`.
pub fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

#[cfg(test)]
mod tests {
    use super::{application_group_list, firewall_rule, ipset_list, is_path_segment};

    #[test]
    fn paths_embed_edge_scope() {
        assert_eq!(ipset_list("edge-3"), "/api/2.0/services/ipset/scope/edge-3");
        assert_eq!(
            application_group_list("edge-3"),
            "/api/2.0/services/applicationgroup/scope/edge-3"
        );
        assert_eq!(
            firewall_rule("edge-3", "131074"),
            "/api/3.0/edges/edge-3/firewall/config/rules/131074"
        );
    }

    #[test]
    fn path_segments_reject_separators_and_queries() {
        assert!(is_path_segment("edge-12"));
        assert!(is_path_segment("131074"));
        for bad in ["", ".", "..", "edge/1", "edge?x=1", "edge 1", "edge%2F1"] {
            assert!(!is_path_segment(bad), "{bad:?} should be rejected");
        }
    }
}
