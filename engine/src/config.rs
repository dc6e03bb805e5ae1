//! Runtime configuration.
//!
//! Settings are resolved once at startup and passed by reference to every
//! component. Layers, lowest priority first:
//! 1. built-in defaults
//! 2. a `KEY=value` configuration file
//! 3. `TERMUXPORT_*` environment variables

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use figment::providers::{Env, Serialized};
use figment::value::{Dict, Map, Value};
use figment::{Figment, Metadata, Profile, Provider};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Folder under the home directory that holds exports, scratch space and config.
pub const APP_DIR: &str = "TermuXport";

/// Name of the configuration file inside [`APP_DIR`].
pub const CONFIG_FILE_NAME: &str = "termuxport.conf";

const ENV_PREFIX: &str = "TERMUXPORT_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Destination offered at startup; also holds the undo list and the log
    pub default_dest: PathBuf,

    /// Whether to post a completion notification
    pub enable_notify: bool,

    /// Display only
    pub creator: String,

    /// Display only; also used in the notification title
    pub version: String,

    /// Where the intermediate archive is built before encryption
    pub scratch_dir: PathBuf,
}

impl AppConfig {
    /// Defaults rooted at the given home directory.
    pub fn with_home(home: &Path) -> Self {
        let app_dir = home.join(APP_DIR);
        AppConfig {
            default_dest: app_dir.join("export"),
            enable_notify: true,
            creator: "RIDHIN V".to_string(),
            version: concat!("v", env!("CARGO_PKG_VERSION")).to_string(),
            scratch_dir: app_dir.join("tmp"),
        }
    }

    /// Defaults rooted at the current user's home directory.
    pub fn defaults() -> Result<Self, EngineError> {
        let home = home_dir()?;
        Ok(Self::with_home(&home))
    }

    /// Load the layered configuration, reading `file` if it exists.
    pub fn load(file: &Path) -> Result<Self, EngineError> {
        Self::figment(Self::defaults()?, file)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(EngineError::from)
    }

    /// Defaults merged with a configuration file, without the environment layer.
    pub fn load_file(defaults: Self, file: &Path) -> Result<Self, EngineError> {
        Self::figment(defaults, file)
            .extract()
            .map_err(EngineError::from)
    }

    fn figment(defaults: Self, file: &Path) -> Figment {
        Figment::from(Serialized::defaults(defaults)).merge(KeyValueFile::new(file))
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> Result<PathBuf, EngineError> {
    Ok(home_dir()?.join(APP_DIR).join(CONFIG_FILE_NAME))
}

fn home_dir() -> Result<PathBuf, EngineError> {
    BaseDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .ok_or(EngineError::NoHomeDirectory)
}

/// Figment provider for shell-style `KEY=value` files.
///
/// Recognised keys are `DEFAULT_DEST`, `ENABLE_NOTIFY`, `CREATOR`, `VERSION`
/// and `SCRATCH_DIR`. Other keys are ignored. A missing file yields no values.
pub struct KeyValueFile {
    path: PathBuf,
}

impl KeyValueFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        KeyValueFile { path: path.into() }
    }
}

impl Provider for KeyValueFile {
    fn metadata(&self) -> Metadata {
        Metadata::named(format!("config file {}", self.path.display()))
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        let dict = match fs::read_to_string(&self.path) {
            Ok(text) => parse_key_values(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Dict::new(),
            Err(e) => {
                return Err(figment::Error::from(format!(
                    "failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };
        Ok(Profile::Default.collect(dict))
    }
}

fn parse_key_values(text: &str) -> Dict {
    let mut dict = Dict::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = line.split_once('=') else {
            continue;
        };
        let value = unquote(raw.trim());
        match key.trim() {
            "DEFAULT_DEST" => {
                dict.insert("default_dest".into(), Value::from(value.to_string()));
            }
            "SCRATCH_DIR" => {
                dict.insert("scratch_dir".into(), Value::from(value.to_string()));
            }
            "ENABLE_NOTIFY" => {
                dict.insert("enable_notify".into(), Value::from(parse_flag(value)));
            }
            "CREATOR" => {
                dict.insert("creator".into(), Value::from(value.to_string()));
            }
            "VERSION" => {
                dict.insert("version".into(), Value::from(value.to_string()));
            }
            _ => {}
        }
    }
    dict
}

fn unquote(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
