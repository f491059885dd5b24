use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a home configuration directory")]
    NoHomeDir,
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode config: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("invalid interval '{value}': {message}")]
    InvalidInterval { value: String, message: String },
}

/// Persisted CLI state: database location and the currently logged-in user.
///
/// Stored as a small JSON file under the platform config directory. Reads and
/// writes go through [`Config::load`] / [`Config::save`]; the file is replaced
/// by rename so concurrent readers never observe a torn write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub current_user_name: Option<String>,
    #[serde(skip)]
    path: PathBuf,
}

impl Config {
    /// Load the config from its default location.
    ///
    /// A missing file is not an error: a fresh config pointing at the default
    /// database path is returned and written out on the first save.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or if
    /// no home directory can be determined.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(default_config_path()?)
    }

    /// Load the config from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: PathBuf) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Self>(&bytes).map_err(|source| {
                ConfigError::Parse {
                    path: path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self {
                db_path: default_db_path()?,
                current_user_name: None,
                path: PathBuf::new(),
            },
            Err(source) => return Err(ConfigError::Read { path, source }),
        };

        // Environment override, mainly for ad-hoc runs against another database.
        if let Ok(db) = std::env::var("DATABASE_PATH") {
            if !db.is_empty() {
                config.db_path = PathBuf::from(db);
            }
        }

        config.path = path;
        Ok(config)
    }

    /// Record `name` as the logged-in user and persist the change.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be written.
    pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
        self.current_user_name = Some(name.to_string());
        self.save()
    }

    /// Write the config to disk, replacing any previous contents atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                    path: self.path.clone(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(self).map_err(ConfigError::Encode)?;

        // Write to a sibling temp file, then rename over the target.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|source| ConfigError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Path the config was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn project_dirs() -> Result<ProjectDirs, ConfigError> {
    ProjectDirs::from("", "", "feed-collector").ok_or(ConfigError::NoHomeDir)
}

fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

fn default_db_path() -> Result<PathBuf, ConfigError> {
    Ok(project_dirs()?.data_dir().join("collector.sqlite"))
}

/// Parse an interval string like `30s`, `1m`, or `2h` into a [`Duration`].
///
/// A bare number is taken as seconds. Zero-length intervals are rejected:
/// the collection loop must always sleep between cycles.
///
/// # Errors
///
/// Returns an error if the string is malformed or the interval is zero.
pub fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    let trimmed = value.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: u64 = digits.parse().map_err(|_| ConfigError::InvalidInterval {
        value: value.to_string(),
        message: "expected a number followed by ms, s, m, or h".to_string(),
    })?;

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "" | "s" => Duration::from_secs(amount),
        "m" => Duration::from_secs(amount * 60),
        "h" => Duration::from_secs(amount * 3600),
        other => {
            return Err(ConfigError::InvalidInterval {
                value: value.to_string(),
                message: format!("unknown unit '{other}'"),
            })
        }
    };

    if duration.is_zero() {
        return Err(ConfigError::InvalidInterval {
            value: value.to_string(),
            message: "interval must be greater than zero".to_string(),
        });
    }

    Ok(duration)
}
