//! Server settings
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. TOML file (`--config`, else `~/.maum/maum.toml` when it exists)
//! 3. Environment / CLI flags, applied through [`SettingsOverrides`]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default maximum connections for the pool.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DAILY_FEED_LIMIT: i64 = 3;
const DEFAULT_MAX_ACTIVE_PLANS: i64 = 5;
const DEFAULT_STUDENT_SESSION_DAYS: i64 = 14;

const MAX_STUDENT_SESSION_DAYS: i64 = 365;
const MAX_TIMEOUT_SECS: u64 = 600;
const MAX_LIMIT: i64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file {0} does not exist")]
    Missing(PathBuf),

    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Where teacher identities live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityBackend {
    /// Supabase GoTrue REST API
    Supabase { url: String, anon_key: String },
    /// Process-local accounts for development; lost on restart
    Memory,
}

/// Cross-origin policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsPolicy {
    /// Any origin, no credentials. Development only.
    Permissive,
    /// Listed origins with credentials (cookies) allowed
    Origins(Vec<String>),
}

/// Per-student usage limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Feeds a student may post per UTC day
    pub daily_feed_limit: i64,
    /// Active plans a student may hold
    pub max_active_plans: i64,
    /// Lifetime of a student login
    pub student_session_days: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            daily_feed_limit: DEFAULT_DAILY_FEED_LIMIT,
            max_active_plans: DEFAULT_MAX_ACTIVE_PLANS,
            student_session_days: DEFAULT_STUDENT_SESSION_DAYS,
        }
    }
}

/// Fully resolved server settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub identity: IdentityBackend,
    /// Mark session cookies `Secure` (set behind HTTPS)
    pub cookie_secure: bool,
    pub cors: CorsPolicy,
    pub request_timeout_secs: u64,
    pub limits: Limits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3030)),
            database_url: None,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            identity: IdentityBackend::Memory,
            cookie_secure: false,
            cors: CorsPolicy::Origins(vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ]),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            limits: Limits::default(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub bind_addr: Option<SocketAddr>,
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub cookie_secure: Option<bool>,
    pub cors_permissive: bool,
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: Option<u64>,
    pub daily_feed_limit: Option<i64>,
    pub max_active_plans: Option<i64>,
    pub student_session_days: Option<i64>,
}

impl Settings {
    /// Load defaults merged with the TOML file, if any.
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(provided: Option<&Path>) -> Result<Self, ConfigError> {
        let raw = match provided {
            Some(path) if !path.exists() => return Err(ConfigError::Missing(path.to_path_buf())),
            Some(path) => Some(load_raw(path)?),
            None => match default_config_path() {
                Some(path) if path.exists() => Some(load_raw(&path)?),
                _ => None,
            },
        };

        let mut settings = Self::default();
        if let Some(raw) = raw {
            settings.merge(raw)?;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn merge(&mut self, raw: RawSettings) -> Result<(), ConfigError> {
        if let Some(bind) = raw.bind {
            self.bind_addr = bind.parse().map_err(|_| ConfigError::Invalid {
                field: "bind",
                reason: format!("'{}' is not a socket address", bind),
            })?;
        }
        if raw.database_url.is_some() {
            self.database_url = raw.database_url;
        }
        if let Some(max) = raw.max_connections {
            self.max_connections = max;
        }
        if let Some(secure) = raw.cookie_secure {
            self.cookie_secure = secure;
        }
        if let Some(timeout) = raw.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }

        if let (Some(url), Some(anon_key)) = (raw.identity.url, raw.identity.anon_key) {
            self.identity = IdentityBackend::Supabase { url, anon_key };
        }

        if raw.cors.permissive.unwrap_or(false) {
            self.cors = CorsPolicy::Permissive;
        } else if !raw.cors.origins.is_empty() {
            self.cors = CorsPolicy::Origins(raw.cors.origins);
        }

        let limits = &mut self.limits;
        if let Some(v) = raw.limits.daily_feed_limit {
            limits.daily_feed_limit = v;
        }
        if let Some(v) = raw.limits.max_active_plans {
            limits.max_active_plans = v;
        }
        if let Some(v) = raw.limits.student_session_days {
            limits.student_session_days = v;
        }
        Ok(())
    }

    /// Apply CLI/environment values on top of the loaded settings.
    pub fn apply(&mut self, overrides: SettingsOverrides) -> Result<(), ConfigError> {
        if let Some(addr) = overrides.bind_addr {
            self.bind_addr = addr;
        }
        if overrides.database_url.is_some() {
            self.database_url = overrides.database_url;
        }
        if let Some(max) = overrides.max_connections {
            self.max_connections = max;
        }
        if let Some(secure) = overrides.cookie_secure {
            self.cookie_secure = secure;
        }
        if let Some(timeout) = overrides.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }

        match (overrides.supabase_url, overrides.supabase_anon_key) {
            (Some(url), Some(anon_key)) => self.identity = IdentityBackend::Supabase { url, anon_key },
            (Some(url), None) => match &mut self.identity {
                IdentityBackend::Supabase { url: current, .. } => *current = url,
                IdentityBackend::Memory => {
                    return Err(ConfigError::Invalid {
                        field: "supabase_anon_key",
                        reason: "required when a Supabase URL is set".to_string(),
                    })
                }
            },
            (None, Some(anon_key)) => {
                if let IdentityBackend::Supabase { anon_key: current, .. } = &mut self.identity {
                    *current = anon_key;
                }
            }
            (None, None) => {}
        }

        if overrides.cors_permissive {
            self.cors = CorsPolicy::Permissive;
        } else if !overrides.cors_origins.is_empty() {
            self.cors = CorsPolicy::Origins(overrides.cors_origins);
        }

        if let Some(v) = overrides.daily_feed_limit {
            self.limits.daily_feed_limit = v;
        }
        if let Some(v) = overrides.max_active_plans {
            self.limits.max_active_plans = v;
        }
        if let Some(v) = overrides.student_session_days {
            self.limits.student_session_days = v;
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let bounded = |field: &'static str, value: i64, max: i64| {
            if (1..=max).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be between 1 and {}, got {}", max, value),
                })
            }
        };
        bounded("daily_feed_limit", self.limits.daily_feed_limit, MAX_LIMIT)?;
        bounded("max_active_plans", self.limits.max_active_plans, MAX_LIMIT)?;
        bounded(
            "student_session_days",
            self.limits.student_session_days,
            MAX_STUDENT_SESSION_DAYS,
        )?;

        if !(1..=MAX_TIMEOUT_SECS).contains(&self.request_timeout_secs) {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs",
                reason: format!(
                    "must be between 1 and {}, got {}",
                    MAX_TIMEOUT_SECS, self.request_timeout_secs
                ),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                field: "max_connections",
                reason: "must be at least 1".to_string(),
            });
        }

        if let IdentityBackend::Supabase { url, .. } = &self.identity {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(ConfigError::Invalid {
                    field: "supabase_url",
                    reason: format!("'{}' is not an http(s) URL", url),
                });
            }
        }
        Ok(())
    }

    /// Database URL, required by every command that touches storage.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url.as_deref().ok_or(ConfigError::Invalid {
            field: "database_url",
            reason: "not set (use --database-url, DATABASE_URL or the config file)".to_string(),
        })
    }
}

/// `~/.maum/maum.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".maum").join("maum.toml"))
}

fn load_raw(path: &Path) -> Result<RawSettings, ConfigError> {
    let data = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&data).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    bind: Option<String>,
    #[serde(default)]
    database_url: Option<String>,
    #[serde(default)]
    max_connections: Option<u32>,
    #[serde(default)]
    cookie_secure: Option<bool>,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
    #[serde(default)]
    identity: RawIdentity,
    #[serde(default)]
    cors: RawCors,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawIdentity {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    anon_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCors {
    #[serde(default)]
    permissive: Option<bool>,
    #[serde(default)]
    origins: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLimits {
    #[serde(default)]
    daily_feed_limit: Option<i64>,
    #[serde(default)]
    max_active_plans: Option<i64>,
    #[serde(default)]
    student_session_days: Option<i64>,
}
