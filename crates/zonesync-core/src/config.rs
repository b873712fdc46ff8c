//! Configuration types for zonesync
//!
//! This module defines all configuration structures used throughout the workspace.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Upper bound on `ClientConfig::max_retries`
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Main zonesync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonesyncConfig {
    /// Provider account configuration
    pub provider: ProviderConfig,

    /// Transport and retry settings of the remote directory client
    #[serde(default)]
    pub client: ClientConfig,

    /// Reconciler behavior
    #[serde(default)]
    pub reconciler: ReconcilerConfig,

    /// Where tracked records are kept between invocations
    #[serde(default)]
    pub state_store: StateStoreConfig,
}

impl ZonesyncConfig {
    /// Create a configuration for `provider` with default settings
    pub fn new(provider: ProviderConfig) -> Self {
        Self {
            provider,
            client: ClientConfig::default(),
            reconciler: ReconcilerConfig::default(),
            state_store: StateStoreConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.provider.validate()?;
        self.client.validate()?;
        self.state_store.validate()?;
        Ok(())
    }
}

/// Provider account configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// LWS reseller API
    Lws {
        /// Account login (sent as `X-Auth-Login`)
        login: String,
        /// API key (sent as `X-Auth-Pass`)
        api_key: String,
        /// API base URL, `https://api.lws.net/v1` when unset
        #[serde(default)]
        base_url: Option<String>,
        /// Ask the provider to validate without applying
        #[serde(default)]
        test_mode: bool,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Lws {
                login,
                api_key,
                base_url,
                ..
            } => {
                if login.trim().is_empty() {
                    return Err(crate::Error::config("LWS login cannot be empty"));
                }
                if api_key.trim().is_empty() {
                    return Err(crate::Error::config("LWS API key cannot be empty"));
                }
                if let Some(url) = base_url
                    && !(url.starts_with("http://") || url.starts_with("https://"))
                {
                    return Err(crate::Error::config(format!(
                        "LWS base URL must start with http:// or https://, got '{}'",
                        url
                    )));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Lws { .. } => "lws",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

// The API key never reaches logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::Lws {
                login,
                base_url,
                test_mode,
                ..
            } => f
                .debug_struct("Lws")
                .field("login", login)
                .field("api_key", &"<redacted>")
                .field("base_url", base_url)
                .field("test_mode", test_mode)
                .finish(),
            ProviderConfig::Custom { factory, .. } => f
                .debug_struct("Custom")
                .field("factory", factory)
                .finish_non_exhaustive(),
        }
    }
}

/// Transport and retry settings of the remote directory client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Per-request timeout (in seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    ///
    /// A call makes at most `1 + max_retries` attempts.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry (in seconds)
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Factor applied to the delay after each failed attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,
}

impl ClientConfig {
    /// Validate the client configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Client timeout must be > 0"));
        }
        if self.backoff_multiplier == 0 {
            return Err(crate::Error::config("Backoff multiplier must be >= 1"));
        }
        if self.max_retries > MAX_RETRIES_LIMIT {
            return Err(crate::Error::config(format!(
                "max_retries must be <= {}, got {}",
                MAX_RETRIES_LIMIT, self.max_retries
            )));
        }
        Ok(())
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the first retry
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    15
}

fn default_backoff_multiplier() -> u32 {
    2
}

/// Reconciler behavior
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Treat a tracked record as absent when Read cannot fetch its zone
    ///
    /// Off by default: a failed fetch is surfaced as an error and the tracked
    /// record is kept. When on, an unconfirmed absence drops the record from
    /// tracking and the next apply recreates (or adopts) it.
    #[serde(default)]
    pub drop_on_unconfirmed_read: bool,
}

/// State store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateStoreConfig {
    /// File-based state store
    File {
        /// Path to the state file
        path: String,
    },

    /// In-memory state store (not persistent)
    #[default]
    Memory,
}

impl StateStoreConfig {
    /// Validate the state store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StateStoreConfig::File { path } if path.trim().is_empty() => {
                Err(crate::Error::config("State file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lws() -> ProviderConfig {
        ProviderConfig::Lws {
            login: "user".to_string(),
            api_key: "s3cr3t-key".to_string(),
            base_url: None,
            test_mode: false,
        }
    }

    #[test]
    fn client_defaults() {
        let client = ClientConfig::default();
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.max_retries, 3);
        assert_eq!(client.retry_delay(), Duration::from_secs(15));
        assert_eq!(client.backoff_multiplier, 2);
        assert!(client.validate().is_ok());
    }

    #[test]
    fn client_validation() {
        let zero_timeout = ClientConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_backoff = ClientConfig {
            backoff_multiplier: 0,
            ..Default::default()
        };
        assert!(zero_backoff.validate().is_err());

        let too_many = ClientConfig {
            max_retries: MAX_RETRIES_LIMIT + 1,
            ..Default::default()
        };
        assert!(too_many.validate().is_err());

        let no_retries = ClientConfig {
            max_retries: 0,
            retry_delay_secs: 0,
            ..Default::default()
        };
        assert!(no_retries.validate().is_ok());
    }

    #[test]
    fn provider_validation() {
        assert!(lws().validate().is_ok());

        let empty_key = ProviderConfig::Lws {
            login: "user".to_string(),
            api_key: " ".to_string(),
            base_url: None,
            test_mode: false,
        };
        assert!(empty_key.validate().is_err());

        let bad_url = ProviderConfig::Lws {
            login: "user".to_string(),
            api_key: "key".to_string(),
            base_url: Some("api.lws.net".to_string()),
            test_mode: false,
        };
        assert!(bad_url.validate().is_err());

        assert_eq!(lws().type_name(), "lws");
    }

    #[test]
    fn debug_redacts_api_key() {
        let rendered = format!("{:?}", lws());
        assert!(!rendered.contains("s3cr3t-key"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("user"));
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: ZonesyncConfig = serde_json::from_value(serde_json::json!({
            "provider": { "type": "lws", "login": "user", "api_key": "key" },
            "state_store": { "type": "file", "path": "/tmp/state.json" }
        }))
        .unwrap();

        assert_eq!(config.client, ClientConfig::default());
        assert!(!config.reconciler.drop_on_unconfirmed_read);
        assert!(matches!(config.state_store, StateStoreConfig::File { .. }));
        assert!(config.validate().is_ok());
    }
}
