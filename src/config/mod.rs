//! Environment-backed configuration.
//!
//! Most settings have defaults. Override with `CATWISE_*` environment variables.
//! The one hard requirement is service credentials: [`Config::validate`] fails
//! when the credential variable is missing, unless the mock provider is enabled.

pub mod error;
pub mod tier;


pub use error::ConfigError;
pub use tier::{Tier, TierConfig};

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_ATTEMPTS, DEFAULT_SIMILARITY_THRESHOLD};

/// Server configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `CATWISE_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory for the exact cache and similarity snapshot. Default: `./.data`.
    pub storage_path: PathBuf,

    /// Sentence-embedding model directory (config.json, model.safetensors, tokenizer.json).
    ///
    /// When unset the embedder runs in stub mode.
    pub model_path: Option<PathBuf>,

    /// Model name handed to the chat client. Default: `gpt-4o-mini`.
    pub llm_model: String,

    /// Name of the variable that must hold service credentials. Default: `OPENAI_API_KEY`.
    pub api_key_env: String,

    /// Use the scripted mock provider instead of a live service.
    pub mock_provider: bool,

    /// Tier used when a request does not name one. Default: `tier3`.
    pub tier: Tier,

    /// Cosine similarity needed for a similarity-cache hit. Default: `0.85`.
    pub similarity_threshold: f32,

    /// Max entries in the in-memory exact cache. Default: `10_000`.
    pub l1_capacity: u64,

    /// Attempts per title against the service. Default: `3`.
    pub max_attempts: u32,

    /// Per-call timeout for the service. Default: 30 s.
    pub request_timeout: Duration,
}

/// Default chat model when `CATWISE_LLM_MODEL` is not set.
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Default credential variable when `CATWISE_API_KEY_ENV` is not set.
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: PathBuf::from("./.data"),
            model_path: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            mock_provider: false,
            tier: Tier::default(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            l1_capacity: 10_000,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "CATWISE_PORT";
    const ENV_BIND_ADDR: &'static str = "CATWISE_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "CATWISE_STORAGE_PATH";
    const ENV_MODEL_PATH: &'static str = "CATWISE_MODEL_PATH";
    const ENV_LLM_MODEL: &'static str = "CATWISE_LLM_MODEL";
    const ENV_API_KEY_ENV: &'static str = "CATWISE_API_KEY_ENV";
    const ENV_MOCK_PROVIDER: &'static str = "CATWISE_MOCK_PROVIDER";
    const ENV_TIER: &'static str = "CATWISE_TIER";
    const ENV_SIMILARITY_THRESHOLD: &'static str = "CATWISE_SIMILARITY_THRESHOLD";
    const ENV_L1_CAPACITY: &'static str = "CATWISE_L1_CAPACITY";
    const ENV_MAX_RETRIES: &'static str = "CATWISE_MAX_RETRIES";
    const ENV_REQUEST_TIMEOUT_SECS: &'static str = "CATWISE_REQUEST_TIMEOUT_SECS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let storage_path = Self::parse_path_from_env(Self::ENV_STORAGE_PATH, defaults.storage_path);
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);
        let api_key_env = Self::parse_string_from_env(Self::ENV_API_KEY_ENV, defaults.api_key_env);
        let mock_provider = Self::parse_bool_from_env(Self::ENV_MOCK_PROVIDER);
        let tier = match env::var(Self::ENV_TIER) {
            Ok(value) => value.parse()?,
            Err(_) => defaults.tier,
        };
        let similarity_threshold = Self::parse_f32_from_env(
            Self::ENV_SIMILARITY_THRESHOLD,
            "similarity_threshold",
            defaults.similarity_threshold,
        )?;
        let l1_capacity = Self::parse_u64_from_env(Self::ENV_L1_CAPACITY, defaults.l1_capacity);
        let max_attempts = Self::parse_u64_from_env(
            Self::ENV_MAX_RETRIES,
            u64::from(defaults.max_attempts),
        )
        .min(u64::from(u32::MAX)) as u32;
        let request_timeout = Duration::from_secs(Self::parse_u64_from_env(
            Self::ENV_REQUEST_TIMEOUT_SECS,
            defaults.request_timeout.as_secs(),
        ));

        Ok(Self {
            port,
            bind_addr,
            storage_path,
            model_path,
            llm_model,
            api_key_env,
            mock_provider,
            tier,
            similarity_threshold,
            l1_capacity,
            max_attempts,
            request_timeout,
        })
    }

    /// Validates paths, ranges and credentials (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_path.exists() && !self.storage_path.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.storage_path.clone(),
            });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(ConfigError::InvalidValue {
                name: "similarity_threshold",
                value: self.similarity_threshold.to_string(),
                reason: "must be in (0, 1]",
            });
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                name: "max_attempts",
                value: "0".to_string(),
                reason: "must be at least 1",
            });
        }

        if !self.mock_provider && !self.credentials_present() {
            return Err(ConfigError::MissingEnvVar {
                name: self.api_key_env.clone(),
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    /// Exact-cache directory under the storage root.
    pub fn cache_dir(&self) -> PathBuf {
        self.storage_path.join("category_cache")
    }

    /// Similarity snapshot file under the storage root.
    pub fn similarity_snapshot_path(&self) -> PathBuf {
        self.storage_path.join("similarity.rkyv")
    }

    fn credentials_present(&self) -> bool {
        env::var(&self.api_key_env)
            .map(|v| !v.trim().is_empty())
            .unwrap_or(false)
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(default)
    }

    fn parse_bool_from_env(var_name: &str) -> bool {
        env::var(var_name)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false)
    }

    fn parse_f32_from_env(
        var_name: &str,
        field: &'static str,
        default: f32,
    ) -> Result<f32, ConfigError> {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    name: field,
                    value,
                    reason: "not a number",
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_u64_from_env(var_name: &str, default: u64) -> u64 {
        env::var(var_name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }
}
