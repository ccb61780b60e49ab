//! Gateway configuration parsing and validation.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level configuration for the gateway adaptation layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Static alias provisioning, read once at startup.
    #[serde(default, rename = "predefined_alias")]
    pub predefined_aliases: Vec<PredefinedAliasEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySection {
    /// Gateway id announced in discovery frames.
    #[serde(default = "default_gateway_id")]
    pub gateway_id: u8,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            gateway_id: default_gateway_id(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive, e.g. "info" or "sngate=debug".
    #[serde(default)]
    pub log_level: Option<String>,
}

/// One provisioned alias_id -> topic pair.
#[derive(Debug, Clone, Deserialize)]
pub struct PredefinedAliasEntry {
    pub alias: u16,
    pub topic: String,
}

impl GatewayConfig {
    /// Load configuration from a path resolved via SNGATE_CONFIG or
    /// defaulting to `config/sngate.toml`; SNGATE_LOG overrides the log
    /// level after parsing.
    pub fn load_from_env() -> Result<Self> {
        let path = env_config_path();
        let mut config = Self::load(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file (TOML or JSON based on
    /// extension).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = fs::read_to_string(path_ref)
            .with_context(|| format!("unable to read config {}", path_ref.display()))?;
        if is_json(path_ref) {
            Ok(serde_json::from_str(&data)
                .with_context(|| format!("invalid JSON config {}", path_ref.display()))?)
        } else {
            Ok(toml::from_str(&data)
                .with_context(|| format!("invalid TOML config {}", path_ref.display()))?)
        }
    }

    /// Schema-level invariants checked before the gateway starts.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for entry in &self.predefined_aliases {
            if entry.alias == 0 {
                bail!("predefined alias id 0 is reserved (topic {})", entry.topic);
            }
            if entry.topic.is_empty() {
                bail!("predefined alias {} has an empty topic", entry.alias);
            }
            if !seen.insert(entry.alias) {
                bail!("duplicate predefined alias {}", entry.alias);
            }
        }
        Ok(())
    }

    /// Provisioned pairs in the shape the alias table is built from.
    pub fn predefined_entries(&self) -> impl Iterator<Item = (u16, String)> + '_ {
        self.predefined_aliases
            .iter()
            .map(|entry| (entry.alias, entry.topic.clone()))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("SNGATE_LOG") {
            self.telemetry.log_level = Some(level);
        }
    }
}

fn env_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("SNGATE_CONFIG") {
        PathBuf::from(path)
    } else {
        PathBuf::from("config/sngate.toml")
    }
}

fn is_json(path: &Path) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json"))
}

fn default_gateway_id() -> u8 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_document() {
        let doc = r#"
            [gateway]
            gateway_id = 3

            [telemetry]
            log_level = "debug"

            [[predefined_alias]]
            alias = 5
            topic = "site/a"

            [[predefined_alias]]
            alias = 6
            topic = "site/b"
        "#;
        let config: GatewayConfig = toml::from_str(doc).unwrap();
        assert_eq!(config.gateway.gateway_id, 3);
        assert_eq!(config.telemetry.log_level.as_deref(), Some("debug"));
        assert_eq!(config.predefined_aliases.len(), 2);
        config.validate().unwrap();

        let entries: Vec<_> = config.predefined_entries().collect();
        assert_eq!(entries[0], (5, "site/a".to_string()));
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.gateway.gateway_id, 1);
        assert!(config.telemetry.log_level.is_none());
        assert!(config.predefined_aliases.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_json_document() {
        let doc = r#"{
            "gateway": { "gateway_id": 2 },
            "predefined_alias": [ { "alias": 9, "topic": "plant/line" } ]
        }"#;
        let config: GatewayConfig = serde_json::from_str(doc).unwrap();
        assert_eq!(config.gateway.gateway_id, 2);
        assert_eq!(config.predefined_aliases[0].alias, 9);
    }

    #[test]
    fn test_validate_rejects_bad_provisioning() {
        let zero: GatewayConfig = toml::from_str(
            "[[predefined_alias]]\nalias = 0\ntopic = \"site/a\"\n",
        )
        .unwrap();
        assert!(zero.validate().is_err());

        let duplicate: GatewayConfig = toml::from_str(
            "[[predefined_alias]]\nalias = 4\ntopic = \"site/a\"\n\n\
             [[predefined_alias]]\nalias = 4\ntopic = \"site/b\"\n",
        )
        .unwrap();
        assert!(duplicate.validate().is_err());

        let empty_topic: GatewayConfig =
            toml::from_str("[[predefined_alias]]\nalias = 4\ntopic = \"\"\n").unwrap();
        assert!(empty_topic.validate().is_err());
    }
}
