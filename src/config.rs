use hms_core::CacheConfig;
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
const DEFAULT_STALE_SECS: u64 = 0;
const DEFAULT_GC_SECS: u64 = 300;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Console configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Base URL of the REST backend, including the API prefix
    pub api_url: ConfigValue<String>,
    /// Bearer token sent with every request
    #[serde(serialize_with = "mask_token")]
    pub api_token: ConfigValue<Option<String>>,
    /// Seconds cached reads are served without refetching
    pub cache_stale_secs: ConfigValue<u64>,
    /// Seconds unobserved cache entries are kept
    pub cache_gc_secs: ConfigValue<u64>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    api_url: Option<String>,
    api_token: Option<String>,
    cache_stale_secs: Option<u64>,
    cache_gc_secs: Option<u64>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |name| std::env::var(name).ok())
    }

    /// Like [`load`](Self::load), reading environment variables through `env`.
    pub fn load_with<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut api_url = ConfigValue::new(DEFAULT_API_URL.to_string(), ConfigSource::Default);
        let mut api_token = ConfigValue::new(None, ConfigSource::Default);
        let mut cache_stale_secs = ConfigValue::new(DEFAULT_STALE_SECS, ConfigSource::Default);
        let mut cache_gc_secs = ConfigValue::new(DEFAULT_GC_SECS, ConfigSource::Default);
        let mut config_file = None;

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(url) = file_config.api_url {
                api_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(token) = file_config.api_token {
                api_token = ConfigValue::new(Some(token), ConfigSource::File);
            }
            if let Some(secs) = file_config.cache_stale_secs {
                cache_stale_secs = ConfigValue::new(secs, ConfigSource::File);
            }
            if let Some(secs) = file_config.cache_gc_secs {
                cache_gc_secs = ConfigValue::new(secs, ConfigSource::File);
            }
        }

        if let Some(url) = env("HMS_API_URL") {
            api_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(token) = env("HMS_API_TOKEN") {
            api_token = ConfigValue::new(Some(token), ConfigSource::Environment);
        }
        if let Some(secs) = env("HMS_CACHE_STALE_SECS") {
            cache_stale_secs =
                ConfigValue::new(parse_secs("HMS_CACHE_STALE_SECS", &secs)?, ConfigSource::Environment);
        }
        if let Some(secs) = env("HMS_CACHE_GC_SECS") {
            cache_gc_secs =
                ConfigValue::new(parse_secs("HMS_CACHE_GC_SECS", &secs)?, ConfigSource::Environment);
        }

        Ok(Self {
            api_url,
            api_token,
            cache_stale_secs,
            cache_gc_secs,
            config_file,
        })
    }

    /// Cache timing for the query client.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            stale_time: Duration::from_secs(self.cache_stale_secs.value),
            gc_time: Duration::from_secs(self.cache_gc_secs.value),
        }
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/hms/
    /// - macOS: ~/Library/Application Support/hms/
    /// - Windows: %APPDATA%/hms/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("hms")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

fn parse_secs(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name, value.to_string()))
}

fn mask_token<S: Serializer>(
    token: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let masked = ConfigValue::new(
        token.value.as_ref().map(|_| "********"),
        token.source.clone(),
    );
    masked.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue(&'static str, String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue(name, value) => {
                write!(f, "Invalid value for {}: '{}' (expected seconds)", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
