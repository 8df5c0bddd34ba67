//! User configuration for the terminal front end.
//!
//! Loaded from `config.json` under the platform config directory, or from the
//! file named by `TODOAPP_CONFIG_PATH`. A broken file never stops the app: it
//! falls back to defaults and reports the error to the caller.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use todo_core::error::AppError;
use todo_core::view::FilterMode;

const APP_DIR_NAME: &str = "todoapp";
const CONFIG_FILE_NAME: &str = "config.json";
const STORE_FILE_NAME: &str = "tasks.json";
const CONFIG_ENV_VAR: &str = "TODOAPP_CONFIG_PATH";
const STORE_ENV_VAR: &str = "TODOAPP_STORE_PATH";

/// ANSI colours for the active filter and the empty-state label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
}

impl Palette {
    pub const PLAIN: Palette = Palette {
        accent: "",
        muted: "",
    };

    pub fn accentize(&self, text: &str) -> String {
        paint(self.accent, text)
    }

    pub fn mutedize(&self, text: &str) -> String {
        paint(self.muted, text)
    }
}

fn paint(color: &str, text: &str) -> String {
    if color.is_empty() {
        text.to_string()
    } else {
        format!("{color}{text}\x1b[0m")
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    #[serde(alias = "default", alias = "light", alias = "vanilla")]
    Plain,
    #[serde(alias = "dark")]
    Noir,
    Solarized,
}

impl Theme {
    pub fn palette(self) -> Palette {
        match self {
            Self::Plain => Palette::PLAIN,
            Self::Noir => Palette {
                accent: "\x1b[38;5;208m",
                muted: "\x1b[38;5;250m",
            },
            Self::Solarized => Palette {
                accent: "\x1b[38;5;108m",
                muted: "\x1b[38;5;250m",
            },
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "plain" | "default" | "light" | "vanilla" => Ok(Self::Plain),
            "noir" | "dark" => Ok(Self::Noir),
            "solarized" => Ok(Self::Solarized),
            other => Err(AppError::invalid_input(format!(
                "theme must be one of plain, noir, solarized (got '{other}')"
            ))),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub theme: Option<Theme>,
    pub store_path: Option<PathBuf>,
    pub default_filter: Option<FilterMode>,
}

/// Effective config plus the reason the file was ignored, if it was.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub theme: Option<Theme>,
    pub store_path: Option<PathBuf>,
    pub default_filter: Option<FilterMode>,
}

fn app_dir() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join(APP_DIR_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home).join(".config").join(APP_DIR_NAME))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
}

pub fn config_path() -> Result<PathBuf, AppError> {
    match env_path(CONFIG_ENV_VAR) {
        Some(path) => Ok(path),
        None => Ok(app_dir()?.join(CONFIG_FILE_NAME)),
    }
}

/// Resolves the task store file: `TODOAPP_STORE_PATH`, then the configured
/// `store_path`, then `tasks.json` beside the config file.
pub fn store_path(config: &Config) -> Result<PathBuf, AppError> {
    if let Some(path) = env_path(STORE_ENV_VAR) {
        return Ok(path);
    }

    match config.store_path.as_ref() {
        Some(path) => Ok(path.clone()),
        None => Ok(app_dir()?.join(STORE_FILE_NAME)),
    }
}

pub fn load_config() -> ConfigLoad {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

/// A missing file is not an error; an unreadable or invalid one is.
pub fn load_config_from(path: &Path) -> ConfigLoad {
    let parsed = match std::fs::read_to_string(path) {
        Ok(content) => serde_json::from_str::<Config>(&content).map_err(|err| {
            AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
        }),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(err) => Err(AppError::io(format!("{}: {}", path.display(), err))),
    };

    match parsed {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(error) => ConfigLoad {
            config: Config::default(),
            error: Some(error),
        },
    }
}

pub fn merge_overrides(base: &Config, overrides: &ConfigOverrides) -> Config {
    Config {
        theme: overrides.theme.or(base.theme),
        store_path: overrides
            .store_path
            .clone()
            .or_else(|| base.store_path.clone()),
        default_filter: overrides.default_filter.or(base.default_filter),
    }
}
