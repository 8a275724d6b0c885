//! Configuration module.
//!
//! Handles loading, validating, and merging `banner-carbon.toml`. The file is
//! sparse: stock defaults are the base layer and the user file overrides only
//! the keys it names. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [estimator]
//! model = "gpt-4o-mini"                    # Chat model used for estimates
//! base_url = "https://api.openai.com/v1"   # Chat-completions API root
//! timeout_ms = 30000                       # Hard limit for one request
//! system_profile = "..."                   # Prompt context only
//! location = "..."                         # Prompt context only
//!
//! [upload]
//! max_size_mb = 10                         # Largest accepted upload
//!
//! [report]
//! views = 1000000                          # Default campaign view count
//! metrics = "offsets"                      # "offsets" or "equivalents"
//! detailed_traditional = false             # Also ask for a traditional estimate
//! ```
//!
//! ## Environment
//!
//! The service credential never lives in the file. It is read from
//! `BANNER_CARBON_OPENAI_API_KEY`; `BANNER_CARBON_OPENAI_MODEL` overrides
//! `estimator.model`. A missing key is not an error: every estimate then comes
//! from the offline formulas.

use crate::recovery::MetricSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the estimation service credential.
pub const API_KEY_ENV: &str = "BANNER_CARBON_OPENAI_API_KEY";
/// Environment variable overriding the estimation model.
pub const MODEL_ENV: &str = "BANNER_CARBON_OPENAI_MODEL";
/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "banner-carbon.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Estimation service settings.
    pub estimator: EstimatorConfig,
    /// Upload limits.
    pub upload: UploadConfig,
    /// Report defaults.
    pub report: ReportConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.estimator.model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "estimator.model must not be empty".into(),
            ));
        }
        if !(self.estimator.base_url.starts_with("http://")
            || self.estimator.base_url.starts_with("https://"))
        {
            return Err(ConfigError::Validation(
                "estimator.base_url must be an http(s) URL".into(),
            ));
        }
        if self.estimator.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "estimator.timeout_ms must be positive".into(),
            ));
        }
        if !(self.upload.max_size_mb.is_finite() && self.upload.max_size_mb > 0.0) {
            return Err(ConfigError::Validation(
                "upload.max_size_mb must be a positive number".into(),
            ));
        }
        Ok(())
    }
}

/// Estimation service settings.
///
/// Built once at startup and handed to [`Estimator`](crate::estimate::Estimator).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EstimatorConfig {
    /// Bearer credential. Only ever set from the environment.
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Chat model id.
    pub model: String,
    /// API root; `/chat/completions` is appended.
    pub base_url: String,
    /// Hard limit for one request, in milliseconds.
    pub timeout_ms: u64,
    /// Hardware/energy profile quoted in the prompt.
    pub system_profile: String,
    /// Grid location quoted in the prompt.
    pub location: String,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_ms: 30_000,
            system_profile: "diffusion model inference on a single NVIDIA A100 GPU".to_string(),
            location: "European Union average grid mix".to_string(),
        }
    }
}

impl fmt::Debug for EstimatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EstimatorConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout_ms", &self.timeout_ms)
            .field("system_profile", &self.system_profile)
            .field("location", &self.location)
            .finish()
    }
}

impl EstimatorConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether a service credential is configured.
    pub fn has_credential(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Overlay the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Overlay values from `lookup`. Empty values are ignored.
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(model) = lookup(MODEL_ENV).filter(|m| !m.trim().is_empty()) {
            self.model = model.trim().to_string();
        }
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UploadConfig {
    /// Largest accepted upload, in megabytes.
    pub max_size_mb: f64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_size_mb: crate::validate::DEFAULT_MAX_SIZE_MB,
        }
    }
}

/// Report defaults, overridable per run on the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportConfig {
    /// Campaign view count used when `--views` is not given.
    pub views: u64,
    /// Recovery metric set shown in reports.
    pub metrics: MetricSet,
    /// Also request a detailed traditional-design estimate.
    pub detailed_traditional: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            views: 1_000_000,
            metrics: MetricSet::Offsets,
            detailed_traditional: false,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// `AppConfig::default()` as a TOML table: the layer a user's
/// `banner-carbon.toml` is laid over.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(AppConfig::default()).expect("default config must serialize")
}

/// Lay `overlay` over `base`.
///
/// Sections such as `[estimator]` combine key by key, so a file that only
/// sets `estimator.model` keeps the stock `timeout_ms`. Any other value from
/// `overlay` wins outright.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    let toml::Value::Table(overrides) = overlay else {
        return overlay;
    };
    let mut merged = match base {
        toml::Value::Table(table) => table,
        _ => toml::map::Map::new(),
    };
    for (key, value) in overrides {
        let value = match merged.remove(&key) {
            Some(stock) => merge_toml(stock, value),
            None => value,
        };
        merged.insert(key, value);
    }
    toml::Value::Table(merged)
}

/// Parse the user's config file without applying defaults.
///
/// A missing file is `Ok(None)`: running without `banner-carbon.toml` is the
/// common case. Unreadable files and malformed TOML are errors.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(toml::from_str(&content)?))
}

/// Build the final [`AppConfig`] from the stock table and the user's file,
/// if any. Unknown keys and out-of-range values are rejected here.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = overlay.into_iter().fold(base, merge_toml);
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, falling back to stock defaults when absent.
///
/// The environment is not consulted here; callers overlay it with
/// [`EstimatorConfig::apply_env`].
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# banner-carbon configuration
# ===========================
# Every key is optional. Values below are the stock defaults.
#
# The estimation service credential is NOT read from this file. Set
# BANNER_CARBON_OPENAI_API_KEY in the environment instead; without it every
# estimate uses the offline formulas. BANNER_CARBON_OPENAI_MODEL overrides
# estimator.model.

[estimator]
# Chat model used for emission estimates.
model = "gpt-4o-mini"
# API root. "/chat/completions" is appended.
base_url = "https://api.openai.com/v1"
# Hard limit for one request. Slower answers are dropped in favour of the
# offline estimate.
timeout_ms = 30000
# Context quoted in the prompt. These do not enter any calculation.
system_profile = "diffusion model inference on a single NVIDIA A100 GPU"
location = "European Union average grid mix"

[upload]
# Largest accepted image, in megabytes.
max_size_mb = 10.0

[report]
# Campaign view count when --views is not given.
views = 1000000
# Recovery metric set:
#   "offsets"     trees, plastic bottles, bee hotels, walking weeks
#   "equivalents" trees, plastic bottles, bike kilometers, ocean absorption hours
metrics = "offsets"
# Also ask the service for a detailed traditional-design estimate.
detailed_traditional = false
"##
}
