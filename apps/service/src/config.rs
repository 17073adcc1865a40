use std::{env, fmt, fs, path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::metrics::{MAX_RESPONSE_HOURS, MAX_UPTIME_DAYS, OpenIncidentPolicy};
use crate::models::Monitor;
use crate::runner::{DEFAULT_PARALLELISM, RetryPolicy};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to read config {path}: {source}")]
    ReadFailed { path: path::PathBuf, source: std::io::Error },
    #[error("Failed to write config {path}: {source}")]
    WriteFailed { path: path::PathBuf, source: std::io::Error },
    #[error("Failed to parse config: {0}")]
    ParseFailed(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("Invalid config value {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("No config path available: set XDG_CONFIG_HOME or HOME, or pass --config")]
    ConfigPathUnavailable,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub runner: RunnerSettings,
    pub defaults: MonitorDefaults,
    pub metrics: MetricsSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: path::PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerSettings {
    /// Probes allowed in flight at once during `check-all`
    pub parallelism: usize,
    pub retry_policy: RetryPolicy,
}

/// Values applied to `add` when the flag is omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorDefaults {
    pub interval_seconds: u64,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSettings {
    pub uptime_days: u32,
    pub response_hours: u32,
    pub open_incident_policy: OpenIncidentPolicy,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self { path: default_database_path() }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self { parallelism: DEFAULT_PARALLELISM, retry_policy: RetryPolicy::default() }
    }
}

impl Default for MonitorDefaults {
    fn default() -> Self {
        Self {
            interval_seconds: Monitor::DEFAULT_INTERVAL_SECONDS,
            timeout_seconds: Monitor::DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self { uptime_days: 30, response_hours: 24, open_incident_policy: OpenIncidentPolicy::default() }
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

fn home_relative(xdg_var: &str, fallback: &str) -> Option<path::PathBuf> {
    if let Ok(dir) = env::var(xdg_var) {
        Some(path::PathBuf::from(dir))
    } else {
        env::home_dir().map(|home| home.join(fallback))
    }
}

/// Get default config path ($XDG_CONFIG_HOME/uptime/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, Error> {
    home_relative("XDG_CONFIG_HOME", ".config")
        .map(|dir| dir.join("uptime/config.toml"))
        .ok_or(Error::ConfigPathUnavailable)
}

/// $XDG_DATA_HOME/uptime/uptime.db or $HOME/.local/share/..., else the
/// working directory
fn default_database_path() -> path::PathBuf {
    home_relative("XDG_DATA_HOME", ".local/share")
        .map(|dir| dir.join("uptime/uptime.db"))
        .unwrap_or_else(|| path::PathBuf::from("uptime.db"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Database")?;
        write_1(f, "Path", &self.database.path.display())?;
        write_title_1(f, "Runner")?;
        write_1(f, "Parallelism", &self.runner.parallelism)?;
        write_1(f, "Retry Policy", &self.runner.retry_policy)?;
        write_title_1(f, "Monitor Defaults")?;
        write_1(f, "Interval (s)", &self.defaults.interval_seconds)?;
        write_1(f, "Timeout (s)", &self.defaults.timeout_seconds)?;
        write_title_1(f, "Metrics")?;
        write_1(f, "Uptime Window (days)", &self.metrics.uptime_days)?;
        write_1(f, "Response Window (hours)", &self.metrics.response_hours)?;
        write_1(f, "Open Incidents", &self.metrics.open_incident_policy)?;

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/uptime/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    ///
    /// ```rust,no_run
    /// let cfg = uptime_service::config::Config::from_config(None::<&std::path::Path>).unwrap();
    /// println!("{}", cfg);
    /// ```
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, Error> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path)
                .map_err(|source| Error::ReadFailed { path: config_path.clone(), source })?;
            let config: Self = toml::from_str(raw_string.as_str())?;
            config.validate()?;
            Ok(config)
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            tracing::info!("Wrote default config to {}", config_path.display());
            Ok(config)
        }
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), Error> {
        if self.metrics.uptime_days > MAX_UPTIME_DAYS {
            return Err(Error::InvalidValue {
                field: "metrics.uptime_days",
                reason: format!("{} exceeds {MAX_UPTIME_DAYS}", self.metrics.uptime_days),
            });
        }
        if self.metrics.response_hours > MAX_RESPONSE_HOURS {
            return Err(Error::InvalidValue {
                field: "metrics.response_hours",
                reason: format!("{} exceeds {MAX_RESPONSE_HOURS}", self.metrics.response_hours),
            });
        }
        Ok(())
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), Error> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::WriteFailed { path: path.to_path_buf(), source })?;
        }

        fs::write(path, config_str).map_err(|source| Error::WriteFailed { path: path.to_path_buf(), source })
    }
}
