//! Core configuration from YAML/JSON.
//!
//! Documents are checked against `schema/config.schema.json` before they are
//! deserialized, then against the semantic rules in [`ParleyConfig::validate`].
//! Unknown top-level sections are ignored so one file can also carry the
//! runtime settings.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::compliance::BotMode;

/// Embedded configuration schema.
const CONFIG_SCHEMA_JSON: &str = include_str!("../schema/config.schema.json");

static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors that can occur when loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config schema validation failed: {}", .0.join("; "))]
    Schema(Vec<String>),

    #[error("Config validation failed: {0}")]
    Validation(String),
}

/// Safe replacement messages, one per bot mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafeFallbacks {
    pub seller: String,
    pub buyer: String,
    pub lead: String,
    pub general: String,
}

impl SafeFallbacks {
    pub fn for_mode(&self, mode: BotMode) -> &str {
        match mode {
            BotMode::Seller => &self.seller,
            BotMode::Buyer => &self.buyer,
            BotMode::Lead => &self.lead,
            BotMode::General => &self.general,
        }
    }
}

impl Default for SafeFallbacks {
    fn default() -> Self {
        Self {
            seller: "Let's stick to the facts about your property. What price are you looking to get?"
                .to_string(),
            buyer: "I'd be happy to help you find a home that fits your needs. What features matter most to you?"
                .to_string(),
            lead: "Thanks for reaching out! What are you hoping to accomplish with your real estate plans?"
                .to_string(),
            general: "Thanks for your message. Let me get you accurate information on that."
                .to_string(),
        }
    }
}

/// Outbound compliance settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComplianceConfig {
    /// Cumulative violations per contact that trigger escalation.
    pub escalation_threshold: usize,
    pub fallbacks: SafeFallbacks,
}

impl Default for ComplianceConfig {
    fn default() -> Self {
        Self {
            escalation_threshold: 3,
            fallbacks: SafeFallbacks::default(),
        }
    }
}

/// Objection handling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectionConfig {
    /// Number of A/B variants contacts are spread across.
    pub variant_count: usize,
}

impl Default for ObjectionConfig {
    fn default() -> Self {
        Self { variant_count: 2 }
    }
}

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    pub compliance: ComplianceConfig,
    pub objections: ObjectionConfig,
}

impl ParleyConfig {
    /// Parse from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load from a file; `.json` is parsed as JSON, anything else as YAML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        // An empty YAML document parses to null
        if value.is_null() {
            return Ok(Self::default());
        }

        validate_config_schema(&value).map_err(ConfigError::Schema)?;
        let config: ParleyConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Semantic checks the schema cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.compliance.escalation_threshold == 0 {
            return Err(ConfigError::Validation(
                "compliance.escalation_threshold must be at least 1".to_string(),
            ));
        }

        if self.objections.variant_count == 0 {
            return Err(ConfigError::Validation(
                "objections.variant_count must be at least 1".to_string(),
            ));
        }

        let fallbacks = &self.compliance.fallbacks;
        for (mode, text) in [
            ("seller", &fallbacks.seller),
            ("buyer", &fallbacks.buyer),
            ("lead", &fallbacks.lead),
            ("general", &fallbacks.general),
        ] {
            if text.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "compliance.fallbacks.{} must not be blank",
                    mode
                )));
            }
        }

        Ok(())
    }
}

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(CONFIG_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result.as_ref().map_err(Clone::clone)
}

/// Validate a configuration document against the embedded schema.
pub fn validate_config_schema(value: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e])?;

    let errors: Vec<String> = validator
        .iter_errors(value)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParleyConfig::default();
        assert_eq!(config.compliance.escalation_threshold, 3);
        assert_eq!(config.objections.variant_count, 2);
        assert_eq!(
            config.compliance.fallbacks.for_mode(BotMode::Seller),
            "Let's stick to the facts about your property. What price are you looking to get?"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(ParleyConfig::from_yaml("").unwrap(), ParleyConfig::default());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
compliance:
  escalation_threshold: 5
  fallbacks:
    buyer: "Happy to help with your search."
guard:
  llm_timeout: 5s
"#;
        let config = ParleyConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.compliance.escalation_threshold, 5);
        assert_eq!(config.compliance.fallbacks.buyer, "Happy to help with your search.");
        assert_eq!(config.compliance.fallbacks.seller, SafeFallbacks::default().seller);
        assert_eq!(config.objections.variant_count, 2);
    }

    #[test]
    fn test_json_config() {
        let config = ParleyConfig::from_json(r#"{"objections": {"variant_count": 3}}"#).unwrap();
        assert_eq!(config.objections.variant_count, 3);
    }

    #[test]
    fn test_schema_rejects_zero_threshold() {
        let err = ParleyConfig::from_yaml("compliance:\n  escalation_threshold: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Schema(_)));
    }

    #[test]
    fn test_schema_rejects_unknown_field() {
        let err = ParleyConfig::from_yaml("objections:\n  variants: 2\n").unwrap_err();
        match err {
            ConfigError::Schema(errors) => assert!(!errors.is_empty()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_fallback_rejected() {
        let err = ParleyConfig::from_yaml("compliance:\n  fallbacks:\n    lead: \"   \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(msg) if msg.contains("lead")));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = ParleyConfig::from_yaml("compliance: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }
}
