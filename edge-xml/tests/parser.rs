use std::path::PathBuf;

use edge_xml::parse_file;

fn fixture(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join(path)
}

#[test]
fn parses_collection_listing() {
    let node = parse_file(&fixture("fixtures/edge-12/ipset.xml")).expect("parse should succeed");
    assert_eq!(node.tag, "list");

    let ipsets = node.get_children("ipset");
    assert_eq!(ipsets.len(), 3);
    assert_eq!(ipsets[0].get_text(&["objectId"]), Some("ipset-7"));
    assert_eq!(ipsets[0].get_text(&["type", "typeName"]), Some("IPSet"));
}

#[test]
fn parses_firewall_config() {
    let node = parse_file(&fixture("fixtures/edge-12/firewall.xml")).expect("parse should succeed");
    assert_eq!(node.tag, "firewall");

    let rules = node
        .get_child("firewallRules")
        .expect("firewallRules should exist")
        .get_children("firewallRule");
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[1].get_text(&["ruleType"]), Some("user"));
}
