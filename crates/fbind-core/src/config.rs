#![forbid(unsafe_code)]

//! Binder configuration.
//!
//! [`BinderConfig`] is owned by the [`AppContext`](crate::AppContext) and
//! read by every mount. It can be built in code, read from the environment,
//! or (with the `policy-config` feature) loaded from a TOML or JSON file.
//!
//! # Environment
//!
//! | Variable | Values | Field |
//! |----------|--------|-------|
//! | `FBIND_DUPLICATE_HANDLERS` | `replace`, `warn`, `reject` | `duplicate_handlers` |
//! | `FBIND_TRACE_PHASES` | `1`, `true`, `0`, `false` | `trace_phases` |

use std::fmt;
use std::str::FromStr;

/// What happens when a second single handler is registered for a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "policy-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "policy-config", serde(rename_all = "lowercase"))]
pub enum DuplicateHandlerPolicy {
    /// Keep the last registration silently.
    #[default]
    Replace,
    /// Keep the last registration and log a warning.
    Warn,
    /// Panic.
    Reject,
}

impl FromStr for DuplicateHandlerPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(Self::Replace),
            "warn" => Ok(Self::Warn),
            "reject" => Ok(Self::Reject),
            other => Err(ConfigError::InvalidValue {
                key: "duplicate_handlers",
                value: other.to_string(),
            }),
        }
    }
}

/// Mount-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "policy-config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct BinderConfig {
    pub duplicate_handlers: DuplicateHandlerPolicy,
    /// Emit a trace event for every mount phase.
    pub trace_phases: bool,
}

/// Errors from loading a [`BinderConfig`].
#[derive(Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    Io(std::io::Error),
    /// The config file could not be parsed.
    Parse(String),
    /// The file extension is neither `.toml` nor `.json`.
    UnknownFormat(String),
    /// A value was not recognized.
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "config i/o error: {err}"),
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
            Self::UnknownFormat(path) => write!(f, "unknown config format: {path}"),
            Self::InvalidValue { key, value } => write!(f, "invalid value '{value}' for {key}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl BinderConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn duplicate_handlers(mut self, policy: DuplicateHandlerPolicy) -> Self {
        self.duplicate_handlers = policy;
        self
    }

    #[must_use]
    pub fn trace_phases(mut self, enabled: bool) -> Self {
        self.trace_phases = enabled;
        self
    }

    /// Defaults overridden by `FBIND_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let duplicates = std::env::var("FBIND_DUPLICATE_HANDLERS").ok();
        let trace = std::env::var("FBIND_TRACE_PHASES").ok();
        Self::from_vars(duplicates.as_deref(), trace.as_deref())
    }

    fn from_vars(duplicates: Option<&str>, trace: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(raw) = duplicates {
            config.duplicate_handlers = raw.parse()?;
        }
        if let Some(raw) = trace {
            config.trace_phases = parse_flag("trace_phases", raw)?;
        }
        Ok(config)
    }

    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    #[cfg(feature = "policy-config")]
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Load from a `.toml` or `.json` file.
    #[cfg(feature = "policy-config")]
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&source),
            Some("json") => Self::from_json_str(&source),
            _ => Err(ConfigError::UnknownFormat(path.display().to_string())),
        }
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key,
            value: other.to_string(),
        }),
    }
}
