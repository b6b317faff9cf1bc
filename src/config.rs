//! TOML-based configuration for the engine's own tunables.
//!
//! Grounded on `config::settings::Settings`: a `serde`-derived root struct
//! loaded from a TOML file with `${ENV_VAR}` expansion, searched for in the
//! same order (explicit path, local file, user config directory). This is
//! config for the core's bisection/threading/sampling knobs, not the
//! connection-string/credential layer spec.md places out of scope.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::normalize::JsonComparisonMode;
use crate::orchestrator::{Algorithm, DiffOptions};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure. Named profiles let an operator keep
/// several tuned presets (e.g. `[profiles.nightly_full]`,
/// `[profiles.quick_check]`) in one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Default tunables, used when no profile is named.
    pub defaults: TunablesConfig,

    /// Named tunable profiles, overlaid on `defaults`.
    #[serde(default)]
    pub profiles: HashMap<String, TunablesConfig>,
}

/// Mirrors [`DiffOptions`] field-for-field, as plain TOML-friendly types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunablesConfig {
    pub algorithm: Algorithm,
    pub bisection_factor: Option<usize>,
    pub bisection_threshold: Option<u64>,
    pub threads: Option<usize>,
    pub float_tolerance: Option<f64>,
    pub case_sensitive: Option<bool>,
    pub strict_type_checking: Option<bool>,
    pub timestamp_precision: Option<u8>,
    pub json_comparison_mode: Option<JsonComparisonMode>,
    pub timeout_secs: Option<u64>,
}

impl Default for TunablesConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Auto,
            bisection_factor: None,
            bisection_threshold: None,
            threads: None,
            float_tolerance: None,
            case_sensitive: None,
            strict_type_checking: None,
            timestamp_precision: None,
            json_comparison_mode: None,
            timeout_secs: None,
        }
    }
}

impl TunablesConfig {
    /// Overlays this profile's set fields onto engine defaults, producing
    /// a ready-to-use [`DiffOptions`].
    pub fn into_diff_options(self) -> DiffOptions {
        let base = DiffOptions::default();
        DiffOptions {
            algorithm: self.algorithm,
            bisection_factor: self.bisection_factor.unwrap_or(base.bisection_factor),
            bisection_threshold: self.bisection_threshold.unwrap_or(base.bisection_threshold),
            threads: self.threads.unwrap_or(base.threads),
            extra_columns: None,
            float_tolerance: self.float_tolerance.unwrap_or(base.float_tolerance),
            case_sensitive: self.case_sensitive.unwrap_or(base.case_sensitive),
            strict_type_checking: self.strict_type_checking.unwrap_or(base.strict_type_checking),
            timestamp_precision: self.timestamp_precision.unwrap_or(base.timestamp_precision),
            json_comparison_mode: self.json_comparison_mode.unwrap_or(base.json_comparison_mode),
            timeout: self.timeout_secs.map(std::time::Duration::from_secs).or(base.timeout),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let expanded = expand_env_vars(&content)?;
        Ok(toml::from_str(&expanded)?)
    }

    /// Searches, in order: `$TABLEDIFF_CONFIG`, `./tablediff.toml`, the
    /// user config directory. Returns defaults if none exist.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = env::var("TABLEDIFF_CONFIG") {
            return Self::from_file(path);
        }
        let local = PathBuf::from("tablediff.toml");
        if local.exists() {
            return Self::from_file(local);
        }
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("tablediff").join("config.toml");
            if user_config.exists() {
                return Self::from_file(user_config);
            }
        }
        Ok(Self::default())
    }

    /// Resolves a named profile overlaid on `defaults`, or just `defaults`
    /// if `profile` is `None`.
    pub fn resolve(&self, profile: Option<&str>) -> DiffOptions {
        match profile.and_then(|name| self.profiles.get(name)) {
            Some(profile) => profile.clone().into_diff_options(),
            None => self.defaults.clone().into_diff_options(),
        }
    }
}

/// Expands `${VAR}` references, failing if the variable is unset.
pub fn expand_env_vars(s: &str) -> Result<String, ConfigError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            let value =
                env::var(&var_name).map_err(|_| ConfigError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            result.push(c);
        }
    }
    Ok(result)
}
