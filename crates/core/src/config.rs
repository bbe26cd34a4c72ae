//! Configuration for the OS2mo → OS2rollekatalog synchronization.
//!
//! Configuration comes from one of two places:
//!
//! * a TOML file, where secrets are stored as `_env` fields naming the
//!   environment variable that holds them (resolved at runtime via
//!   [`AppConfig::resolve_env_vars`]), or
//! * the `MOX_ROLLE_*` environment variables alone ([`AppConfig::from_env`]).
//!
//! Either way the result is one [`AppConfig`] that is passed explicitly into
//! every component.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::ConfigError;

pub const ENV_MAPPING_PATH: &str = "MOX_ROLLE_EMPLOYEE_MAPPING_PATH";
pub const ENV_AD_SYSTEM_NAME: &str = "MOX_ROLLE_AD_SYSTEM_NAME";
pub const ENV_OS2MO_URL: &str = "MOX_ROLLE_OS2MO_URL";
pub const ENV_OS2MO_API_KEY: &str = "MOX_ROLLE_OS2MO_API_KEY";
pub const ENV_ROLLEKATALOG_URL: &str = "MOX_ROLLE_ROLLEKATALOG_URL";
pub const ENV_ROLLEKATALOG_API_KEY: &str = "MOX_ROLLE_ROLLEKATALOG_API_KEY";
pub const ENV_LOG_FILE: &str = "MOX_ROLLE_LOG_FILE";
pub const ENV_LOG_LEVEL: &str = "MOX_ROLLE_LOG_LEVEL";
pub const ENV_INSECURE_SKIP_TLS_VERIFY: &str = "MOX_ROLLE_INSECURE_SKIP_TLS_VERIFY";
pub const ENV_OUTPUT_FILE: &str = "MOX_ROLLE_OUTPUT_FILE";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// OS2mo source API settings.
    pub os2mo: Os2moConfig,

    /// OS2rollekatalog target API settings.
    pub rollekatalog: RollekatalogConfig,

    /// Employee identity mapping settings.
    pub identity: IdentityConfig,

    /// Log file and level.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Shared HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Payload shaping.
    #[serde(default)]
    pub sync: SyncConfig,

    /// Local copies of the payload.
    #[serde(default)]
    pub output: OutputConfig,
}

// ---------------------------------------------------------------------------
// OS2mo
// ---------------------------------------------------------------------------

/// OS2mo connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Os2moConfig {
    /// Base URL, e.g. `https://os2mo.example.com`.
    pub url: String,

    /// Environment variable holding the OS2mo API token.
    #[serde(default = "default_os2mo_api_key_env")]
    pub api_key_env: String,

    /// Organisation to read from. Discovered via `/service/o/` when unset.
    #[serde(default)]
    pub organisation_uuid: Option<String>,

    /// Page size for the bulk listing endpoints.
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Resolved API token (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_os2mo_api_key_env() -> String {
    ENV_OS2MO_API_KEY.into()
}
fn default_page_size() -> usize {
    1000
}

// ---------------------------------------------------------------------------
// OS2rollekatalog
// ---------------------------------------------------------------------------

/// OS2rollekatalog connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RollekatalogConfig {
    /// Full URL of the organisation import endpoint.
    pub url: String,

    /// Environment variable holding the `ApiKey` header value.
    #[serde(default = "default_rollekatalog_api_key_env")]
    pub api_key_env: String,

    /// Accept any TLS certificate from the role catalog. Off unless set.
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,

    /// Resolved API key (populated by `resolve_env_vars`).
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_rollekatalog_api_key_env() -> String {
    ENV_ROLLEKATALOG_API_KEY.into()
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Employee identity mapping settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Semicolon-separated file with `mo_uuid` and `ad_guid` columns.
    pub mapping_file: PathBuf,

    /// Display name of the directory IT system in OS2mo.
    #[serde(default = "default_ad_system_name")]
    pub ad_system_name: String,
}

fn default_ad_system_name() -> String {
    "Active Directory".into()
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log sink settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log file path (default `log.log`).
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Rotate the log file once it grows past this many bytes.
    #[serde(default = "default_log_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated copies to keep.
    #[serde(default = "default_log_backups")]
    pub backups: usize,
}

fn default_log_file() -> PathBuf {
    PathBuf::from("log.log")
}
fn default_log_level() -> String {
    "debug".into()
}
fn default_log_max_bytes() -> u64 {
    1_000_000
}
fn default_log_backups() -> usize {
    5
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_log_level(),
            max_bytes: default_log_max_bytes(),
            backups: default_log_backups(),
        }
    }
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

/// Settings shared by both HTTP clients.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout. Requests never time out when unset.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Sync behaviour
// ---------------------------------------------------------------------------

/// Which engagements become positions on a user record.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PositionPolicy {
    /// Every engagement becomes a position.
    #[default]
    All,
    /// Only the first engagement returned by OS2mo.
    First,
}

/// Shape of the payload sent to the role catalog.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// `{orgUnits, users}` lists with parent references.
    #[default]
    Flat,
    /// Nested org unit tree with employees per unit (older API).
    Tree,
}

/// Sync behaviour configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub positions: PositionPolicy,

    #[serde(default)]
    pub payload_format: PayloadFormat,

    /// Root of the tree when `payload_format = "tree"`.
    #[serde(default)]
    pub root_org_unit: Option<String>,
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Local payload copies.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Append the pretty-printed payload to this file before sending.
    #[serde(default)]
    pub dump_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading & resolving
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** resolve environment variables -- call
    /// [`resolve_env_vars`](Self::resolve_env_vars) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Build the configuration from the `MOX_ROLLE_*` environment variables.
    ///
    /// Missing required variables are reported by [`validate`](Self::validate),
    /// not here, so that all problems surface through one path.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let insecure_skip_tls_verify = match get(ENV_INSECURE_SKIP_TLS_VERIFY) {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                field: ENV_INSECURE_SKIP_TLS_VERIFY.into(),
                detail: format!("expected true/false, got '{}'", raw),
            })?,
            None => false,
        };

        let mut logging = LoggingConfig::default();
        if let Some(file) = get(ENV_LOG_FILE) {
            logging.file = PathBuf::from(file);
        }
        if let Some(level) = get(ENV_LOG_LEVEL) {
            logging.level = level;
        }

        Ok(Self {
            os2mo: Os2moConfig {
                url: get(ENV_OS2MO_URL).unwrap_or_default(),
                api_key_env: default_os2mo_api_key_env(),
                organisation_uuid: None,
                page_size: default_page_size(),
                api_key: get(ENV_OS2MO_API_KEY),
            },
            rollekatalog: RollekatalogConfig {
                url: get(ENV_ROLLEKATALOG_URL).unwrap_or_default(),
                api_key_env: default_rollekatalog_api_key_env(),
                insecure_skip_tls_verify,
                api_key: get(ENV_ROLLEKATALOG_API_KEY),
            },
            identity: IdentityConfig {
                mapping_file: get(ENV_MAPPING_PATH).map(PathBuf::from).unwrap_or_default(),
                ad_system_name: get(ENV_AD_SYSTEM_NAME).unwrap_or_default(),
            },
            logging,
            http: HttpConfig::default(),
            sync: SyncConfig::default(),
            output: OutputConfig {
                dump_path: get(ENV_OUTPUT_FILE).map(PathBuf::from),
            },
        })
    }

    /// Resolve all `*_env` fields from environment variables and populate the
    /// corresponding resolved fields.
    pub fn resolve_env_vars(&mut self) -> Result<(), ConfigError> {
        info!("resolving environment variable references in config");

        self.os2mo.api_key = resolve_optional_env(&self.os2mo.api_key_env, "os2mo.api_key_env");
        self.rollekatalog.api_key =
            resolve_optional_env(&self.rollekatalog.api_key_env, "rollekatalog.api_key_env");

        debug!("environment variable resolution complete");
        Ok(())
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_url(&self.os2mo.url, "os2mo.url")?;
        require_url(&self.rollekatalog.url, "rollekatalog.url")?;

        if self.os2mo.api_key.is_none() {
            warn!(
                var = %self.os2mo.api_key_env,
                "no OS2mo API token configured, requests will be unauthenticated"
            );
        }
        if self.rollekatalog.api_key.is_none() {
            return Err(ConfigError::EnvVarMissing {
                var: self.rollekatalog.api_key_env.clone(),
                field: "rollekatalog.api_key_env".into(),
            });
        }
        if self.identity.mapping_file.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.mapping_file".into(),
                detail: "mapping file path must not be empty".into(),
            });
        }
        if self.identity.ad_system_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.ad_system_name".into(),
                detail: "directory system name must not be empty".into(),
            });
        }
        if self.os2mo.page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "os2mo.page_size".into(),
                detail: "page size must be > 0".into(),
            });
        }
        if self.sync.payload_format == PayloadFormat::Tree && self.sync.root_org_unit.is_none() {
            return Err(ConfigError::InvalidValue {
                field: "sync.root_org_unit".into(),
                detail: "a root org unit is required for the tree payload".into(),
            });
        }
        if self.rollekatalog.insecure_skip_tls_verify {
            warn!("TLS certificate verification towards OS2rollekatalog is disabled");
        }

        Ok(())
    }

    /// Convenience: load, resolve, and validate in one call.
    pub fn load_and_resolve<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file(path)?;
        config.resolve_env_vars()?;
        config.validate()?;
        Ok(config)
    }
}

fn require_url(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: "URL must not be empty".into(),
        });
    }
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: format!("'{}' is not an http(s) URL", value),
        });
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Try to read an environment variable by name. Returns `Some(value)` on
/// success; logs a warning and returns `None` if the variable is unset.
fn resolve_optional_env(env_name: &str, field: &str) -> Option<String> {
    match std::env::var(env_name) {
        Ok(val) if !val.is_empty() => {
            debug!(field, env_name, "resolved env var");
            Some(val)
        }
        Ok(_) => {
            warn!(field, env_name, "env var is set but empty");
            None
        }
        Err(_) => {
            warn!(field, env_name, "env var not set");
            None
        }
    }
}
