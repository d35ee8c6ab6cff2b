//! Resolution of the recognition service API key.
//!
//! A key may be given inline, in a file (mounted secrets) or through an
//! environment variable. The first non-empty source wins, in that order.

use std::path::PathBuf;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No API key source configured")]
    NoSourceProvided,

    #[error("Failed to read API key file '{}': {source}", .path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("API key file '{}' is empty", .path.display())]
    EmptyFile { path: PathBuf },

    #[error("Environment variable '{name}' not set or empty")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

/// Where to look for a secret. Empty strings count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretSource<'a> {
    pub direct: Option<&'a str>,
    pub file: Option<&'a str>,
    pub env_var: Option<&'a str>,
}

impl<'a> SecretSource<'a> {
    pub fn is_configured(&self) -> bool {
        [self.direct, self.file, self.env_var]
            .iter()
            .any(|s| non_empty(*s).is_some())
    }

    pub fn resolve(&self) -> Result<SecretString, SecretError> {
        if let Some(value) = non_empty(self.direct) {
            return Ok(SecretString::from(value.to_string()));
        }

        if let Some(path) = non_empty(self.file) {
            let path = expand_home(path);
            let content = std::fs::read_to_string(&path).map_err(|source| SecretError::FileRead {
                path: path.clone(),
                source,
            })?;
            let trimmed = content.trim();
            if trimmed.is_empty() {
                return Err(SecretError::EmptyFile { path });
            }
            return Ok(SecretString::from(trimmed.to_string()));
        }

        if let Some(name) = non_empty(self.env_var) {
            return match std::env::var(name) {
                Ok(value) if !value.trim().is_empty() => {
                    Ok(SecretString::from(value.trim().to_string()))
                }
                Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                    name: name.to_string(),
                }),
                Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                    name: name.to_string(),
                }),
            };
        }

        Err(SecretError::NoSourceProvided)
    }

    /// Like [`resolve`](Self::resolve) but an unconfigured source is `None`.
    pub fn resolve_optional(&self) -> Result<Option<SecretString>, SecretError> {
        match self.resolve() {
            Ok(secret) => Ok(Some(secret)),
            Err(SecretError::NoSourceProvided) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// Expands a leading `~` to the home directory. `~user` is not supported.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), dirs::home_dir()) {
        (Some(""), Some(home)) => home,
        (Some(rest), Some(home)) if rest.starts_with('/') => home.join(&rest[1..]),
        _ => PathBuf::from(path),
    }
}
