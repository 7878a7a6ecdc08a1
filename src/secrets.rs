// src/secrets.rs
//! Secret parameter lookup for the webhook URL.

use std::collections::HashMap;

use crate::error::{PipelineError, Result};

#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    /// Resolve a secret parameter by name. Missing or empty values are
    /// configuration errors.
    async fn get_parameter(&self, name: &str) -> Result<String>;
}

/// Reads parameters from the process environment.
///
/// Parameter paths are mapped to variable names: `/slack/daily-url`
/// becomes `SLACK_DAILY_URL`.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore;

impl EnvSecretStore {
    pub fn env_key(name: &str) -> String {
        name.trim_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect()
    }
}

#[async_trait::async_trait]
impl SecretStore for EnvSecretStore {
    async fn get_parameter(&self, name: &str) -> Result<String> {
        let key = Self::env_key(name);
        match std::env::var(&key) {
            Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => Err(PipelineError::config(format!(
                "secret parameter {name} not found (looked up {key})"
            ))),
        }
    }
}

/// Fixed parameter map, for tests and local tools.
#[derive(Debug, Clone, Default)]
pub struct StaticSecretStore {
    values: HashMap<String, String>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

#[async_trait::async_trait]
impl SecretStore for StaticSecretStore {
    async fn get_parameter(&self, name: &str) -> Result<String> {
        self.values
            .get(name)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or_else(|| PipelineError::config(format!("secret parameter {name} not found")))
    }
}
