//! Election configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use elect_types::{AccessPolicy, Address, NationalId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for one election instance.
///
/// Can be loaded from a TOML file via [`ElectionConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ElectionConfig {
    /// Human-readable election name.
    #[serde(default = "default_election_name")]
    pub election_name: String,

    /// Address holding the commission role.
    #[serde(default = "default_commission")]
    pub commission: String,

    /// Required number of digits in a national id.
    #[serde(default = "default_national_id_length")]
    pub national_id_length: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to collect Prometheus metrics.
    #[serde(default)]
    pub enable_metrics: bool,

    /// Where to persist state snapshots, if anywhere.
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_election_name() -> String {
    "General Election".to_string()
}

fn default_commission() -> String {
    Address::from_bytes([0; 20]).to_string()
}

fn default_national_id_length() -> usize {
    NationalId::DEFAULT_LENGTH
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ElectionConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(format!("{path}: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        let config: Self = toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Check every field that has a restricted domain.
    pub fn validate(&self) -> Result<(), NodeError> {
        self.access_policy()?;
        self.parsed_log_format()?;
        if self.national_id_length == 0 {
            return Err(NodeError::Config("national_id_length must be at least 1".into()));
        }
        if self.election_name.trim().is_empty() {
            return Err(NodeError::Config("election_name must not be empty".into()));
        }
        Ok(())
    }

    /// The commission policy named by this configuration.
    pub fn access_policy(&self) -> Result<AccessPolicy, NodeError> {
        let commission = Address::parse(&self.commission)
            .map_err(|e| NodeError::Config(format!("commission: {e}")))?;
        Ok(AccessPolicy::new(commission))
    }

    pub fn parsed_log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            election_name: default_election_name(),
            commission: default_commission(),
            national_id_length: default_national_id_length(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            snapshot_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ElectionConfig::default();
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ElectionConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.election_name, config.election_name);
        assert_eq!(parsed.commission, config.commission);
        assert_eq!(parsed.national_id_length, 6);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ElectionConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.national_id_length, 6);
        assert_eq!(config.log_format, "human");
        assert!(!config.enable_metrics);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            election_name = "Municipal 2026"
            commission = "0x00000000000000000000000000000000000000AA"
            enable_metrics = true
            snapshot_path = "/tmp/election.bin"
        "#;
        let config = ElectionConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.election_name, "Municipal 2026");
        assert!(config.enable_metrics);
        assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/election.bin")));
        let policy = config.access_policy().unwrap();
        assert_eq!(
            policy.commission().as_str(),
            "0x00000000000000000000000000000000000000aa"
        );
    }

    #[test]
    fn malformed_commission_rejected() {
        let err = ElectionConfig::from_toml_str(r#"commission = "alice""#).unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }

    #[test]
    fn unknown_log_format_rejected() {
        assert!(ElectionConfig::from_toml_str(r#"log_format = "xml""#).is_err());
    }

    #[test]
    fn zero_id_length_rejected() {
        assert!(ElectionConfig::from_toml_str("national_id_length = 0").is_err());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("election.toml");
        std::fs::write(&path, "election_name = \"From File\"\n").unwrap();
        let config = ElectionConfig::from_toml_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.election_name, "From File");
        assert!(ElectionConfig::from_toml_file("/nonexistent/election.toml").is_err());
    }
}
