//! Run settings loaded from YAML.
//!
//! # Lookup order
//!
//! 1. An explicit path (`--config`); it must exist.
//! 2. `./sheetmail.yaml` in the working directory.
//! 3. `<config_dir>/sheetmail/config.yaml` (via `dirs::config_dir()`).
//! 4. Built-in defaults.
//!
//! Every field is optional in the file; omitted fields take their default.
//! Defaults keep the historical layout: `template/template.html` in, `output/`
//! out, `credentials.json` and `token.json` next to the working directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, CoreError};

/// File name looked up in the working directory.
pub const LOCAL_SETTINGS_FILE: &str = "sheetmail.yaml";

/// Settings for one run. Built once, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub template_path: PathBuf,
    pub output_dir: PathBuf,
    pub credentials_path: PathBuf,
    pub token_path: PathBuf,
    /// Leading part of every artifact name.
    pub file_prefix: String,
    pub file_extension: String,
    /// HTML-escape `{{name}}` substitutions. Triple-stash output is never escaped.
    pub escape_html: bool,
    /// Extra write attempts per artifact after the first failure.
    pub persist_retries: u32,
    /// Extra fetch attempts after the first failure.
    pub fetch_retries: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            template_path: PathBuf::from("template").join("template.html"),
            output_dir: PathBuf::from("output"),
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            file_prefix: "email".to_string(),
            file_extension: "html".to_string(),
            escape_html: true,
            persist_retries: 0,
            fetch_retries: 0,
        }
    }
}

impl Settings {
    /// Parse settings from the YAML file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            return Err(CoreError::SettingsNotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        if contents.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(&contents).map_err(|e| CoreError::SettingsParse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Resolve settings using the lookup order above, rooted at `cwd`.
    pub fn load_at(cwd: &Path, explicit: Option<&Path>) -> Result<Self, CoreError> {
        if let Some(path) = explicit {
            return Settings::from_file(path);
        }
        let local = cwd.join(LOCAL_SETTINGS_FILE);
        if local.exists() {
            return Settings::from_file(&local);
        }
        if let Some(global) = global_settings_path() {
            if global.exists() {
                return Settings::from_file(&global);
            }
        }
        Ok(Settings::default())
    }

    /// `load_at` convenience wrapper using the process working directory.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CoreError> {
        let cwd = std::env::current_dir().map_err(|e| io_err(".", e))?;
        Settings::load_at(&cwd, explicit)
    }
}

/// `<config_dir>/sheetmail/config.yaml`, when a config dir is known.
pub fn global_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("sheetmail").join("config.yaml"))
}
