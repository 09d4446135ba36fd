//! # Configuration Module
//!
//! Settings for one dispatch layer instance.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. [`DispatchConfig::default()`]
//! 2. A YAML file ([`DispatchConfig::from_yaml_file`]); missing keys keep their defaults
//! 3. The host's init parameter block ([`DispatchConfig::apply_init_params`])
//! 4. Environment variables ([`DispatchConfig::apply_env`])
//!
//! ## Init parameters
//!
//! | Parameter      | Effect                                               |
//! |----------------|------------------------------------------------------|
//! | `logname`      | log file destination                                 |
//! | `criticalonly` | critical-only mode; any value, even empty, enables it |
//!
//! ## Environment Variables
//!
//! | Variable              | Field             | Default  |
//! |-----------------------|-------------------|----------|
//! | `NSD_LOG_DESTINATION` | `log_destination` | unset    |
//! | `NSD_CRITICAL_ONLY`   | `critical_only`   | `false`  |
//! | `NSD_LOG_LEVEL`       | `log_level`       | `info`   |
//! | `NSD_LOG_FORMAT`      | `log_format`      | `json`   |
//!
//! `NSD_CRITICAL_ONLY` accepts `1`/`true`/`yes`/`on` (case-insensitive); anything
//! else disables it.
//!
//! ## Example
//!
//! ```yaml
//! log_destination: /var/log/nsdispatch.log
//! critical_only: false
//! log_level: debug
//! log_format: pretty
//! ```

use crate::context::ParamBlock;
use crate::logging::LogFormat;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Init parameter naming the log file.
pub const LOGNAME_PARAM: &str = "logname";
/// Init parameter whose presence enables critical-only mode.
pub const CRITICAL_ONLY_PARAM: &str = "criticalonly";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Append log events to this file. `None` logs to stdout.
    pub log_destination: Option<PathBuf>,
    /// Serialize every dispatch call under one global critical section.
    pub critical_only: bool,
    /// Request-block entry holding the request path.
    pub uri_param: String,
    /// Parameter naming the authentication module.
    pub auth_module_param: String,
    /// Path suffix that turns on debug mode for a request.
    pub request_debug_suffix: String,
    /// Module-name suffix that turns on debug mode for authentication.
    pub auth_debug_suffix: String,
    /// Content type a handler starts with.
    pub default_content_type: String,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            log_destination: None,
            critical_only: false,
            uri_param: "uri".to_string(),
            auth_module_param: "userdb".to_string(),
            request_debug_suffix: "d".to_string(),
            auth_debug_suffix: "DEBUG".to_string(),
            default_content_type: "text/html".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl DispatchConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        // An empty document is all defaults
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Defaults with the host's init parameters applied.
    #[must_use]
    pub fn from_init_params(params: &ParamBlock) -> Self {
        let mut config = Self::default();
        config.apply_init_params(params);
        config
    }

    /// Apply `logname` and `criticalonly` from the host's init block.
    pub fn apply_init_params(&mut self, params: &ParamBlock) {
        if let Some(logname) = params.findval(LOGNAME_PARAM) {
            if !logname.is_empty() {
                self.log_destination = Some(PathBuf::from(logname));
            }
        }
        if params.findval(CRITICAL_ONLY_PARAM).is_some() {
            self.critical_only = true;
        }
    }

    /// Apply the `NSD_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(dest) = env::var("NSD_LOG_DESTINATION") {
            self.log_destination = (!dest.is_empty()).then(|| PathBuf::from(dest));
        }
        if let Ok(flag) = env::var("NSD_CRITICAL_ONLY") {
            self.critical_only = parse_flag(&flag);
        }
        if let Ok(level) = env::var("NSD_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(format) = env::var("NSD_LOG_FORMAT") {
            self.log_format = LogFormat::parse(&format);
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
