//! Service Configuration

use config::{Config, ConfigError, Environment, File};
use rule_engine::RuleConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Service settings, from `gridwatch.toml` (optional) plus `GRIDWATCH_*`
/// environment overrides
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Prometheus exporter address; disabled when unset
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    #[serde(default)]
    pub rules: RuleConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_model_path() -> PathBuf {
    PathBuf::from("models/theft_classifier.onnx")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            model_path: default_model_path(),
            metrics_addr: None,
            rules: RuleConfig::default(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("gridwatch").required(false))
            .add_source(Environment::with_prefix("GRIDWATCH").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.bind_addr, "0.0.0.0:8080");
        assert!(settings.metrics_addr.is_none());
        assert_eq!(settings.rules.low_voltage, 200.0);
    }
}
