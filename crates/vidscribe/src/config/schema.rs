use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db::default_database_path;
use crate::secrets::SecretSource;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorConfig {
    pub version: String,
    pub storage: StorageConfig,
    pub recognition: RecognitionConfig,
    #[serde(default)]
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            recognition: RecognitionConfig::default(),
            artifacts: ArtifactsConfig {
                endpoint: Some("http://localhost:9000".to_string()),
                local_root: None,
            },
            polling: PollingConfig::default(),
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Object storage holding the uploaded media and the result artifacts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    pub bucket: String,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
}

fn default_output_prefix() -> String {
    "transcriptions".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: "vidscribe-media".to_string(),
            output_prefix: default_output_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecognitionConfig {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env_var: Option<String>,
    /// Per-call timeout for every remote operation.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl RecognitionConfig {
    pub fn api_key_source(&self) -> SecretSource<'_> {
        SecretSource {
            direct: self.api_key.as_deref(),
            file: self.api_key_file.as_deref(),
            env_var: self.api_key_env_var.as_deref(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8090".to_string(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Where result artifacts are read from. A local mirror takes precedence.
/// One of the two must be set for `s3://` artifacts to be readable.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PollingConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Hard ceiling on one polling sequence.
    #[serde(default = "default_timeout_mins")]
    pub timeout_mins: u64,
}

fn default_interval_secs() -> u64 {
    5
}

fn default_timeout_mins() -> u64 {
    30
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn ceiling(&self) -> Duration {
        Duration::from_secs(self.timeout_mins.saturating_mul(60))
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            timeout_mins: default_timeout_mins(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Configured path, else the per-user default. `None` without a home directory.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        self.path.clone().or_else(default_database_path)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}
