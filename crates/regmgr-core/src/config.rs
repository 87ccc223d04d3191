//! Configuration for the registry manager.
//!
//! Configuration is read from a TOML file. Every field has a default, so an
//! empty or missing default file yields a usable configuration; command-line
//! flags override individual values.
//!
//! ```toml
//! [engine]
//! url = "http://localhost:9200"
//! timeout_secs = 5
//! auth_file = "/etc/regmgr/auth.toml"
//!
//! [retry]
//! max_retries = 3
//!
//! [registry]
//! index = "registry"
//! dictionary_suffix = "-dd"
//!
//! [loader]
//! batch_size = 100
//! concurrency = 1
//!
//! [datatypes]
//! ASCII_Real = "double"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::DEFAULT_DICTIONARY_SUFFIX;

/// Project name, used for the config directory.
pub const PROJECT_NAME: &str = "regmgr";

/// Where documentation on registering new fields can be found.
pub const DEFAULT_DOCS_URL: &str =
    "https://nasa-pds.github.io/pds-registry-app/operate/common-ops.html#Load";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegmgrConfig {
    /// Search engine connection.
    #[serde(default)]
    pub engine: EngineConfig,

    /// Transport retry policy.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Registry naming.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Bulk loader settings.
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Overrides for the dictionary logical type → engine type table.
    #[serde(default)]
    pub datatypes: BTreeMap<String, String>,
}

/// Search engine connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Engine base URL.
    #[serde(default = "default_url")]
    pub url: String,

    /// Per-call timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Path to the authentication file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_file: Option<String>,
}

/// Retry policy for transient transport failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial backoff delay in milliseconds.
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Maximum backoff delay in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Randomize delays.
    #[serde(default = "default_true")]
    pub jitter: bool,
}

/// Registry naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Primary index name.
    #[serde(default = "default_index")]
    pub index: String,

    /// Suffix appended to the primary name for the Field Registry index.
    #[serde(default = "default_dictionary_suffix")]
    pub dictionary_suffix: String,

    /// Documentation URL quoted in unresolved-field errors.
    #[serde(default = "default_docs_url")]
    pub docs_url: String,
}

/// Bulk loader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Documents per bulk request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Bulk requests in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_retries() -> usize {
    3
}

fn default_min_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5_000
}

fn default_true() -> bool {
    true
}

fn default_index() -> String {
    "registry".to_string()
}

fn default_dictionary_suffix() -> String {
    DEFAULT_DICTIONARY_SUFFIX.to_string()
}

fn default_docs_url() -> String {
    DEFAULT_DOCS_URL.to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_concurrency() -> usize {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            auth_file: None,
        }
    }
}

impl EngineConfig {
    /// Per-call timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            jitter: default_true(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            dictionary_suffix: default_dictionary_suffix(),
            docs_url: default_docs_url(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            concurrency: default_concurrency(),
        }
    }
}

impl RegmgrConfig {
    /// Default config file location (`<config dir>/regmgr/config.toml`).
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(PROJECT_NAME).join("config.toml"))
    }

    /// Resolve the config path: an explicit path wins over the default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        match explicit {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::default_config_path(),
        }
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the default path is used if
    /// present and built-in defaults otherwise.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(Path::new(path));
        }

        match Self::default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Check values that have no sensible meaning when zero.
    pub fn validate(&self) -> Result<()> {
        if self.engine.timeout_secs == 0 {
            return Err(Error::config("engine.timeout_secs must be > 0"));
        }
        if self.loader.batch_size == 0 {
            return Err(Error::config("loader.batch_size must be > 0"));
        }
        if self.loader.concurrency == 0 {
            return Err(Error::config("loader.concurrency must be > 0"));
        }
        Ok(())
    }

    /// Serialize to pretty TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// Look up a value by dotted key (e.g. `engine.url`).
    pub fn get(&self, key: &str) -> Result<Option<toml::Value>> {
        let root = toml::Value::try_from(self).map_err(|e| Error::config(e.to_string()))?;
        let mut current = &root;
        for part in key.split('.') {
            match current.as_table().and_then(|t| t.get(part)) {
                Some(next) => current = next,
                None => return Ok(None),
            }
        }
        Ok(Some(current.clone()))
    }
}

/// Credentials and TLS trust settings for the engine connection.
///
/// ```toml
/// user = "admin"
/// password = "secret"
/// trust_self_signed = true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Basic authentication user.
    #[serde(default)]
    pub user: Option<String>,

    /// Basic authentication password.
    #[serde(default)]
    pub password: Option<String>,

    /// Accept self-signed server certificates.
    #[serde(default)]
    pub trust_self_signed: bool,
}

impl AuthConfig {
    /// Load an authentication file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::io_with_path(e, path))?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// User and password, when both are set.
    pub fn basic_credentials(&self) -> Option<(&str, &str)> {
        match (&self.user, &self.password) {
            (Some(user), Some(password)) => Some((user, password)),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
