use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::api;
use crate::desired::DesiredRule;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the vShield Manager.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagerConfig {
    pub url: String,
    pub username: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password, used when `password` is unset.
    #[serde(default)]
    pub password_env: Option<String>,
    /// Accept self-signed manager certificates.
    #[serde(default)]
    pub insecure: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ManagerConfig {
    /// The inline password, or the value of `password_env`.
    pub fn password(&self) -> Result<String, ConfigError> {
        if let Some(password) = &self.password {
            return Ok(password.clone());
        }
        let Some(var) = &self.password_env else {
            return Err(ConfigError::MissingPassword);
        };
        std::env::var(var).map_err(|_| ConfigError::PasswordEnvUnset(var.clone()))
    }
}

/// A rules file: one edge, its manager, and the rules to enforce there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub edge: String,
    #[serde(default)]
    pub manager: Option<ManagerConfig>,
    #[serde(default, rename = "rule")]
    pub rules: Vec<DesiredRule>,
}

impl Config {
    /// Rules to process: all of them, or only the one named `only`.
    pub fn select(&self, only: Option<&str>) -> Result<Vec<&DesiredRule>, ConfigError> {
        let Some(name) = only else {
            return Ok(self.rules.iter().collect());
        };
        self.rules
            .iter()
            .find(|rule| rule.name == name)
            .map(|rule| vec![rule])
            .ok_or_else(|| ConfigError::UnknownRule(name.to_string()))
    }

    pub fn manager(&self) -> Result<&ManagerConfig, ConfigError> {
        self.manager.as_ref().ok_or(ConfigError::MissingManager)
    }
}

/// Errors returned when loading or using a rules file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("invalid config file {path}: {reason}")]
    Invalid { path: String, reason: String },
    #[error("config has no [manager] section")]
    MissingManager,
    #[error("no manager password configured; set password or password_env")]
    MissingPassword,
    #[error("manager password variable {0} is not set")]
    PasswordEnvUnset(String),
    #[error("rule '{0}' is not defined in the config")]
    UnknownRule(String),
}

/// Load and validate a rules file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&raw, path.display().to_string())
}

pub fn parse_config(raw: &str, path: String) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.clone(),
        source,
    })?;
    validate(&config).map_err(|reason| ConfigError::Invalid { path, reason })?;
    Ok(config)
}

fn validate(config: &Config) -> Result<(), String> {
    if config.edge.trim().is_empty() {
        return Err("edge must not be empty".to_string());
    }
    if !api::is_path_segment(&config.edge) {
        return Err(format!(
            "edge '{}' may only contain letters, digits, '-', '_' and '.'",
            config.edge
        ));
    }
    let mut seen = BTreeSet::new();
    for rule in &config.rules {
        if rule.name.trim().is_empty() {
            return Err("rule name must not be empty".to_string());
        }
        if !seen.insert(rule.name.as_str()) {
            return Err(format!("rule '{}' is defined more than once", rule.name));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::{load_config, parse_config, ConfigError, ManagerConfig};
    use crate::desired::Action;

    const SAMPLE: &str = r#"
edge = "edge-12"

[manager]
url = "https://vsm.example.com"
username = "admin"
password = "secret"

[[rule]]
name = "allow-web"
action = "accept"
destination = ["web-servers"]

[[rule]]
name = "allow-ssh"
"#;

    #[test]
    fn loads_valid_config_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("rules.toml");
        fs::write(&path, SAMPLE).expect("write config");

        let config = load_config(&path).expect("config should parse");
        assert_eq!(config.edge, "edge-12");
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].action, Some(Action::Accept));

        let manager = config.manager().expect("manager");
        assert_eq!(manager.timeout_secs, 30);
        assert!(!manager.insecure);
        assert_eq!(manager.password().expect("password"), "secret");
    }

    #[test]
    fn returns_parse_error_for_invalid_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.toml");
        fs::write(&path, "edge = [unterminated").expect("write broken file");

        let err = load_config(&path).expect_err("should fail parse");
        match err {
            ConfigError::Parse { .. } => {}
            other => panic!("unexpected error variant: {other}"),
        }
    }

    #[test]
    fn rejects_duplicate_rule_names() {
        let raw = "edge = \"e\"\n[[rule]]\nname = \"a\"\n[[rule]]\nname = \"a\"\n";
        let err = parse_config(raw, "dupes.toml".to_string()).expect_err("duplicate");
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_empty_edge() {
        let err = parse_config("edge = \" \"", "e.toml".to_string()).expect_err("empty edge");
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn rejects_edge_that_is_not_a_single_path_segment() {
        for edge in ["edge-1/firewall", "edge 1", "edge-1?x=1"] {
            let raw = format!("edge = \"{edge}\"");
            let err = parse_config(&raw, "e.toml".to_string()).expect_err("unsafe edge");
            assert!(err.to_string().contains("may only contain"), "{err}");
        }
    }

    #[test]
    fn select_filters_by_rule_name() {
        let config = parse_config(SAMPLE, "sample".to_string()).expect("parse");
        assert_eq!(config.select(None).expect("all").len(), 2);
        assert_eq!(
            config.select(Some("allow-ssh")).expect("one")[0].name,
            "allow-ssh"
        );
        assert!(matches!(
            config.select(Some("nope")),
            Err(ConfigError::UnknownRule(_))
        ));
    }

    #[test]
    fn password_falls_back_to_named_environment_variable() {
        let manager = ManagerConfig {
            url: "https://vsm".to_string(),
            username: "admin".to_string(),
            password: None,
            password_env: Some("VSHIELD_FW_TEST_UNSET_PASSWORD".to_string()),
            insecure: false,
            timeout_secs: 5,
        };
        let err = manager.password().expect_err("unset variable");
        assert!(err.to_string().contains("VSHIELD_FW_TEST_UNSET_PASSWORD"));
    }

    #[test]
    fn missing_manager_is_reported_on_use() {
        let config = parse_config("edge = \"e\"", "e.toml".to_string()).expect("parse");
        assert!(matches!(config.manager(), Err(ConfigError::MissingManager)));
    }
}
