//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::report::ReportStrings;

/// Default Claude model for prompt classification.
const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

/// Application configuration.
///
/// Values merge in order: built-in defaults, the user config file, an
/// explicit `--config` file, then `ASA_*` environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory containing per-project session logs.
    pub sessions_path: PathBuf,
    /// Default IANA timezone; the system zone is used when unset.
    pub timezone: Option<String>,
    /// Project name patterns excluded from every statistic.
    pub exclude_projects: Vec<String>,
    /// Include agent-delegation sub-sessions.
    pub include_sub_sessions: bool,
    /// Gap (minutes) after which a duplicate submit restarts the interval.
    pub restart_tolerance_minutes: i64,
    /// Claude model used for prompt classification.
    pub model: String,
    /// Report copy, overridable per deployment.
    pub report: ReportStrings,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            sessions_path: home.join(".amplifier").join("projects"),
            timezone: None,
            exclude_projects: Vec::new(),
            include_sub_sessions: false,
            restart_tolerance_minutes: 30,
            model: DEFAULT_MODEL.to_string(),
            report: ReportStrings::default(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (ASA_*)
        figment = figment.merge(Env::prefixed("ASA_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for asa.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("asa"))
}
