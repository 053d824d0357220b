// common/src/config.rs
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use config::{Config as ConfigFile, File, Environment};

use crate::audit::DEFAULT_AUDIT_CAPACITY;

/// Central configuration for the auth server and the sign-in client
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server_addr: String,
    /// Base URL of the sign-in API, used by the client
    pub endpoint: String,
    /// Host the verifier accepts challenges for (domain binding)
    pub expected_domain: String,
    pub request_timeout_secs: u64,
    pub audit_capacity: usize,

    pub challenge: ChallengeConfig,
    pub nonce_store: NonceStoreConfig,
    pub rate_limit: RateLimitConfig,
    pub client: ClientConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ChallengeConfig {
    pub statement: String,
    pub chain_id: Option<String>,
    pub resources: Option<Vec<String>>,
    /// expirationTime = issuedAt + ttl
    pub ttl_secs: i64,
    /// Window applied to challenges that carry no expirationTime
    pub max_window_secs: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NonceStoreConfig {
    pub enabled: bool,
    pub require_issued: bool,
    pub cleanup_interval_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub max_requests: usize,
    pub window_secs: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URI the client claims to sign in from
    pub origin: String,
    /// Base58 ed25519 seed; an ephemeral key is generated when absent
    pub signer_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:4000".to_string(),
            endpoint: "http://localhost:4000/api".to_string(),
            expected_domain: "localhost:3000".to_string(),
            request_timeout_secs: 10,
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            challenge: ChallengeConfig::default(),
            nonce_store: NonceStoreConfig::default(),
            rate_limit: RateLimitConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            statement: "Sign in with Solana to the app.".to_string(),
            chain_id: None,
            resources: None,
            ttl_secs: 600,
            max_window_secs: 600,
        }
    }
}

impl Default for NonceStoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            require_issued: true,
            cleanup_interval_secs: 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_secs: 60,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            origin: "http://localhost:3000/".to_string(),
            signer_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        // Get the run mode, defaulting to "development"
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        // Locate the config directory
        let config_dir = env::var("CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                // Check if we're in the project root or a subcrate
                let mut path = PathBuf::from("./config");
                if !path.exists() {
                    path = PathBuf::from("../config");
                }
                path
            });

        tracing::info!("Loading configuration from {}", config_dir.display());
        tracing::info!("Using run mode: {}", run_mode);

        let config = ConfigFile::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", run_mode))).required(false))
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            // e.g. APP__EXPECTED_DOMAIN, APP__NONCE_STORE__ENABLED
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load from files, falling back to plain environment variables
    pub fn from_env() -> Self {
        match Self::load() {
            Ok(config) => {
                tracing::info!("Configuration loaded from files and environment");
                config
            },
            Err(e) => {
                tracing::warn!("Failed to load configuration from files: {}", e);
                tracing::info!("Falling back to environment variables only");

                let defaults = Self::default();

                let server_addr = env::var("SERVER_ADDR")
                    .unwrap_or(defaults.server_addr);

                let endpoint = env::var("SIGN_IN_ENDPOINT")
                    .unwrap_or(defaults.endpoint);

                let expected_domain = env::var("EXPECTED_DOMAIN")
                    .unwrap_or(defaults.expected_domain);

                let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(defaults.request_timeout_secs);

                let nonce_store_enabled = env::var("NONCE_STORE_ENABLED")
                    .map(|v| v.to_lowercase() == "true")
                    .unwrap_or(defaults.nonce_store.enabled);

                let client_origin = env::var("CLIENT_ORIGIN")
                    .unwrap_or(defaults.client.origin);

                Self {
                    server_addr,
                    endpoint,
                    expected_domain,
                    request_timeout_secs,
                    nonce_store: NonceStoreConfig {
                        enabled: nonce_store_enabled,
                        ..defaults.nonce_store
                    },
                    client: ClientConfig {
                        origin: client_origin,
                        signer_secret: env::var("SIGNER_SECRET").ok(),
                    },
                    ..defaults
                }
            }
        }
    }
}
