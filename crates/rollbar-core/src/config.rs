//! Configuration management for the Rollbar CLI
//!
//! Settings come from, in order: an explicit `--config` file, the nearest
//! `.rollbar.toml` / `.rollbar.json` found walking up from the working
//! directory, the global `~/.config/rollbar/config.toml` profile file (only
//! consulted while no token is known), and finally the `ROLLBAR_ACCESS_TOKEN`
//! and `ROLLBAR_ENVIRONMENT` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::{Result, RollbarError};

/// Project-local config file name
pub const LOCAL_CONFIG_FILE: &str = ".rollbar.toml";

/// Alternate project-local config file name (JSON)
pub const LOCAL_CONFIG_JSON: &str = ".rollbar.json";

/// Output format names accepted in `output.format`
pub const OUTPUT_FORMATS: [&str; 4] = ["table", "json", "compact", "markdown"];

/// Keys accepted by [`Config::set`]
pub const CONFIG_KEYS: [&str; 5] = [
    "access_token",
    "project_id",
    "default_environment",
    "output.format",
    "output.color",
];

/// CLI configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Project access token (read scope is enough for everything but `resolve`)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<i64>,

    /// Environment filter applied when `--env` is not given
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub default_environment: String,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// One of [`OUTPUT_FORMATS`]
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub color: ColorMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            color: ColorMode::default(),
        }
    }
}

fn default_format() -> String {
    "table".to_string()
}

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Color only when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl std::fmt::Display for ColorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Always => write!(f, "always"),
            Self::Never => write!(f, "never"),
        }
    }
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(format!("Invalid color mode: {}", s)),
        }
    }
}

/// Global profile file (`~/.config/rollbar/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub default_profile: String,

    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Directory path -> project binding
    #[serde(default)]
    pub projects: BTreeMap<String, ProjectBinding>,
}

/// A named set of credentials
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub access_token: String,

    #[serde(default)]
    pub account_token: String,
}

/// Binds a directory tree to a profile and project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectBinding {
    #[serde(default)]
    pub profile: String,

    #[serde(default)]
    pub project_id: Option<i64>,
}

impl GlobalConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            RollbarError::Config(format!(
                "Failed to parse global config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// The default profile, else the alphabetically first one
    pub fn default_profile(&self) -> Option<&Profile> {
        if !self.default_profile.is_empty() {
            return self.profiles.get(&self.default_profile);
        }
        self.profiles.values().next()
    }

    /// First project binding whose directory contains `cwd`
    pub fn project_for(&self, cwd: &Path, home: Option<&Path>) -> Option<&ProjectBinding> {
        self.projects
            .iter()
            .find(|(dir, _)| cwd.starts_with(expand_home(dir, home)))
            .map(|(_, binding)| binding)
    }
}

fn expand_home(dir: &str, home: Option<&Path>) -> PathBuf {
    match (dir.strip_prefix("~/"), home) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(dir),
    }
}

/// Process environment relevant to configuration, captured once
#[derive(Debug, Clone, Default)]
pub struct ConfigEnv {
    pub cwd: PathBuf,
    pub home: Option<PathBuf>,
    /// `ROLLBAR_ACCESS_TOKEN`
    pub access_token: Option<String>,
    /// `ROLLBAR_ENVIRONMENT`
    pub environment: Option<String>,
}

impl ConfigEnv {
    pub fn from_process() -> Result<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Ok(Self {
            cwd: std::env::current_dir()?,
            home: dirs::home_dir(),
            access_token: var("ROLLBAR_ACCESS_TOKEN"),
            environment: var("ROLLBAR_ENVIRONMENT"),
        })
    }

    /// Location of the global profile file
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.home
            .as_ref()
            .map(|home| home.join(".config").join("rollbar").join("config.toml"))
    }
}

impl Config {
    /// Resolve configuration from all sources
    pub fn load(explicit: Option<&Path>, env: &ConfigEnv) -> Result<Self> {
        if let Some(path) = explicit {
            let mut config = Self::from_file(path)?;
            config.apply_env(env);
            return Ok(config);
        }

        let mut config = match Self::discover(&env.cwd) {
            Some(path) => {
                debug!("Loading config from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        if config.access_token.is_empty() {
            if let Some(global_path) = env.global_config_path().filter(|p| p.exists()) {
                match GlobalConfig::load(&global_path) {
                    Ok(global) => config.apply_global(&global, env),
                    Err(e) => debug!("Ignoring global config: {}", e),
                }
            }
        }

        config.apply_env(env);
        Ok(config)
    }

    /// Load a single config file; `.json` files are JSON, everything else TOML
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RollbarError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let parsed = if is_json(path) {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            toml::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|e| {
            RollbarError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
        })
    }

    /// Walk up from `start` looking for a project-local config file
    pub fn discover(start: &Path) -> Option<PathBuf> {
        start.ancestors().find_map(|dir| {
            [LOCAL_CONFIG_FILE, LOCAL_CONFIG_JSON]
                .iter()
                .map(|name| dir.join(name))
                .find(|path| path.is_file())
        })
    }

    fn apply_global(&mut self, global: &GlobalConfig, env: &ConfigEnv) {
        if let Some(profile) = global.default_profile() {
            if self.access_token.is_empty() {
                self.access_token = profile.access_token.clone();
            }
        }

        if let Some(binding) = global.project_for(&env.cwd, env.home.as_deref()) {
            if let Some(profile) = global.profiles.get(&binding.profile) {
                self.access_token = profile.access_token.clone();
            }
            if let Some(project_id) = binding.project_id.filter(|id| *id != 0) {
                self.project_id = Some(project_id);
            }
        }
    }

    fn apply_env(&mut self, env: &ConfigEnv) {
        if let Some(token) = &env.access_token {
            self.access_token = token.clone();
        }
        if let Some(environment) = &env.environment {
            self.default_environment = environment.clone();
        }
    }

    /// Check the configuration is usable for API calls
    pub fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(RollbarError::Config(format!(
                "access token not configured. Set ROLLBAR_ACCESS_TOKEN or create {}",
                LOCAL_CONFIG_FILE
            )));
        }
        Ok(())
    }

    /// Update one setting by its dotted key
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "access_token" => self.access_token = value.to_string(),
            "project_id" => {
                let id = value.trim().parse::<i64>().map_err(|_| {
                    RollbarError::InvalidArgument(format!("invalid project_id: {}", value))
                })?;
                self.project_id = Some(id);
            }
            "default_environment" => self.default_environment = value.to_string(),
            "output.format" => {
                let format = value.trim().to_lowercase();
                if !OUTPUT_FORMATS.contains(&format.as_str()) {
                    return Err(RollbarError::InvalidArgument(format!(
                        "invalid output.format: {} (expected one of: {})",
                        value,
                        OUTPUT_FORMATS.join(", ")
                    )));
                }
                self.output.format = format;
            }
            "output.color" => {
                self.output.color = value.parse().map_err(RollbarError::InvalidArgument)?;
            }
            _ => {
                return Err(RollbarError::InvalidArgument(format!(
                    "unknown config key: {} (expected one of: {})",
                    key,
                    CONFIG_KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Access token with everything but the first and last four characters hidden
    pub fn masked_token(&self) -> Option<String> {
        if self.access_token.is_empty() {
            return None;
        }
        let chars: Vec<char> = self.access_token.chars().collect();
        if chars.len() <= 8 {
            return Some("****".to_string());
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        Some(format!("{}****{}", head, tail))
    }

    /// Write the config with owner-only permissions
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = if is_json(path) {
            serde_json::to_string_pretty(self)?
        } else {
            toml::to_string_pretty(self).map_err(|e| {
                RollbarError::Config(format!("Failed to serialize config: {}", e))
            })?
        };
        write_private(path, &content)
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some("json")
}

fn write_private(path: &Path, content: &str) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(content.as_bytes())?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}
