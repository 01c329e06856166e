//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `VERIFILY_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS, DEFAULT_MAX_TEXT_CHARS, DEFAULT_MIN_TEXT_CHARS,
    DEFAULT_MIN_TEXT_WORDS, DEFAULT_PRODUCER_TIMEOUT_MS, DEFAULT_VARIANCE_CAP, TextLimits,
};
use crate::ensemble::{EnsembleConfig, Thresholds};
use crate::model::missing_model_file;
use crate::signal::ClassifierConfig;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `VERIFILY_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Directory for durable verification records. Unset keeps records in memory.
    pub storage_path: Option<PathBuf>,

    /// Local classifier directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    pub model_path: Option<PathBuf>,

    /// Self-hosted model server base URL.
    pub model_server_url: Option<String>,

    pub zerogpt_api_key: Option<String>,
    pub gptzero_api_key: Option<String>,

    /// Enables the free hosted inference API. Default: `false`.
    pub hf_inference: bool,

    pub min_chars: usize,
    pub min_words: usize,
    pub max_chars: usize,

    /// Per-producer budget in milliseconds. Default: `15000`.
    pub producer_timeout_ms: u64,

    /// Budget for a single classifier backend call. Default: `5000`.
    ///
    /// Must fit at least twice inside `producer_timeout_ms`.
    pub classifier_link_timeout_ms: u64,

    pub variance_cap: f64,
    pub thresholds: Thresholds,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            storage_path: None,
            model_path: None,
            model_server_url: None,
            zerogpt_api_key: None,
            gptzero_api_key: None,
            hf_inference: false,
            min_chars: DEFAULT_MIN_TEXT_CHARS,
            min_words: DEFAULT_MIN_TEXT_WORDS,
            max_chars: DEFAULT_MAX_TEXT_CHARS,
            producer_timeout_ms: DEFAULT_PRODUCER_TIMEOUT_MS,
            classifier_link_timeout_ms: DEFAULT_CLASSIFIER_LINK_TIMEOUT_MS,
            variance_cap: DEFAULT_VARIANCE_CAP,
            thresholds: Thresholds::default(),
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "VERIFILY_PORT";
    const ENV_BIND_ADDR: &'static str = "VERIFILY_BIND_ADDR";
    const ENV_STORAGE_PATH: &'static str = "VERIFILY_STORAGE_PATH";
    const ENV_MODEL_PATH: &'static str = "VERIFILY_MODEL_PATH";
    const ENV_MODEL_SERVER_URL: &'static str = "VERIFILY_MODEL_SERVER_URL";
    const ENV_ZEROGPT_API_KEY: &'static str = "VERIFILY_ZEROGPT_API_KEY";
    const ENV_GPTZERO_API_KEY: &'static str = "VERIFILY_GPTZERO_API_KEY";
    const ENV_HF_INFERENCE: &'static str = "VERIFILY_HF_INFERENCE";
    const ENV_MIN_CHARS: &'static str = "VERIFILY_MIN_CHARS";
    const ENV_MIN_WORDS: &'static str = "VERIFILY_MIN_WORDS";
    const ENV_MAX_CHARS: &'static str = "VERIFILY_MAX_CHARS";
    const ENV_PRODUCER_TIMEOUT_MS: &'static str = "VERIFILY_PRODUCER_TIMEOUT_MS";
    const ENV_CLASSIFIER_LINK_TIMEOUT_MS: &'static str = "VERIFILY_CLASSIFIER_LINK_TIMEOUT_MS";
    const ENV_VARIANCE_CAP: &'static str = "VERIFILY_VARIANCE_CAP";
    const ENV_THRESHOLDS: &'static str = "VERIFILY_THRESHOLDS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            port: Self::parse_port_from_env(defaults.port)?,
            bind_addr: Self::parse_bind_addr_from_env(defaults.bind_addr)?,
            storage_path: Self::parse_optional_path_from_env(Self::ENV_STORAGE_PATH),
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            model_server_url: Self::parse_optional_string_from_env(Self::ENV_MODEL_SERVER_URL),
            zerogpt_api_key: Self::parse_optional_string_from_env(Self::ENV_ZEROGPT_API_KEY),
            gptzero_api_key: Self::parse_optional_string_from_env(Self::ENV_GPTZERO_API_KEY),
            hf_inference: Self::parse_bool_from_env(Self::ENV_HF_INFERENCE, defaults.hf_inference)?,
            min_chars: Self::parse_from_env(Self::ENV_MIN_CHARS, defaults.min_chars)?,
            min_words: Self::parse_from_env(Self::ENV_MIN_WORDS, defaults.min_words)?,
            max_chars: Self::parse_from_env(Self::ENV_MAX_CHARS, defaults.max_chars)?,
            producer_timeout_ms: Self::parse_from_env(
                Self::ENV_PRODUCER_TIMEOUT_MS,
                defaults.producer_timeout_ms,
            )?,
            classifier_link_timeout_ms: Self::parse_from_env(
                Self::ENV_CLASSIFIER_LINK_TIMEOUT_MS,
                defaults.classifier_link_timeout_ms,
            )?,
            variance_cap: Self::parse_from_env(Self::ENV_VARIANCE_CAP, defaults.variance_cap)?,
            thresholds: Self::parse_thresholds_from_env(defaults.thresholds)?,
        })
    }

    /// Validates paths and scoring parameters (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.storage_path
            && path.exists()
            && !path.is_dir()
        {
            return Err(ConfigError::NotADirectory { path: path.clone() });
        }

        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
            if let Some(missing) = missing_model_file(path) {
                return Err(ConfigError::MissingModelFile { path: missing });
            }
        }

        self.ensemble_config().validate()?;

        let link_ms = self.classifier_link_timeout_ms;
        if link_ms == 0 || link_ms.saturating_mul(2) > self.producer_timeout_ms {
            return Err(ConfigError::LinkTimeoutBudget {
                link_ms,
                producer_ms: self.producer_timeout_ms,
            });
        }

        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn producer_timeout(&self) -> Duration {
        Duration::from_millis(self.producer_timeout_ms)
    }

    pub fn classifier_link_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_link_timeout_ms)
    }

    pub fn text_limits(&self) -> TextLimits {
        TextLimits::new(self.min_chars, self.min_words, self.max_chars)
    }

    /// Scoring parameters; bucket weights and platform factors keep their defaults.
    pub fn ensemble_config(&self) -> EnsembleConfig {
        EnsembleConfig::default()
            .with_limits(self.text_limits())
            .with_thresholds(self.thresholds)
            .with_variance_cap(self.variance_cap)
            .with_producer_timeout(self.producer_timeout())
    }

    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            zerogpt_api_key: self.zerogpt_api_key.clone(),
            gptzero_api_key: self.gptzero_api_key.clone(),
            model_server_url: self.model_server_url.clone(),
            hf_inference: self.hf_inference,
            model_path: self.model_path.clone(),
            link_timeout: self.classifier_link_timeout(),
            ..ClassifierConfig::default()
        }
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

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
                name: var_name,
                reason: e.to_string(),
                value,
            }),
            None => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match Self::parse_optional_string_from_env(var_name) {
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue {
                    name: var_name,
                    value,
                    reason: "expected true/false".to_string(),
                }),
            },
            None => Ok(default),
        }
    }

    fn parse_thresholds_from_env(default: Thresholds) -> Result<Thresholds, ConfigError> {
        match Self::parse_optional_string_from_env(Self::ENV_THRESHOLDS) {
            Some(value) => Ok(value.parse()?),
            None => Ok(default),
        }
    }
}
