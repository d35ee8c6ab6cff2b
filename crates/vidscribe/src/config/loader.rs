use std::path::Path;

use crate::config::schema::OrchestratorConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

const MAX_INTERVAL_SECS: u64 = 300;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<OrchestratorConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<OrchestratorConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: OrchestratorConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Checks the schema cannot express.
pub fn validate_config(config: &OrchestratorConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.storage.bucket.trim().is_empty() {
        return Err(invalid("storage.bucket", "must not be empty"));
    }

    let prefix = &config.storage.output_prefix;
    if prefix.starts_with('/') || prefix.ends_with('/') {
        return Err(invalid(
            "storage.outputPrefix",
            "must not start or end with '/'",
        ));
    }

    let endpoint = &config.recognition.endpoint;
    if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
        return Err(invalid("recognition.endpoint", "must be an http(s) URL"));
    }

    let artifacts = &config.artifacts;
    match (&artifacts.endpoint, &artifacts.local_root) {
        (None, None) => {
            return Err(invalid(
                "artifacts",
                "set either endpoint or localRoot to read result artifacts",
            ));
        }
        (Some(url), None) if !(url.starts_with("http://") || url.starts_with("https://")) => {
            return Err(invalid("artifacts.endpoint", "must be an http(s) URL"));
        }
        _ => {}
    }

    let polling = &config.polling;
    if !(1..=MAX_INTERVAL_SECS).contains(&polling.interval_secs) {
        return Err(invalid(
            "polling.intervalSecs",
            &format!("must be between 1 and {}", MAX_INTERVAL_SECS),
        ));
    }
    if polling.interval() >= polling.ceiling() {
        return Err(invalid(
            "polling.timeoutMins",
            "must be longer than the polling interval",
        ));
    }

    Ok(())
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
