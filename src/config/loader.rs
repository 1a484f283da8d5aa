//! Project configuration loader
//!
//! Finds the project's config file, records its digest, converts it to a
//! JSON tree and normalizes it into a [`ProjectConfig`]. Missing files and
//! malformed optional settings fall back to defaults; an explicit path that
//! does not exist is fatal.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::defaults::CONFIG_FILE_NAMES;
use super::project::{
    BaseSettings, BridgeSettings, ConfigFile, DevServerSettings, EntrySpec, ProjectConfig,
};

const BASE_KEYS: &[&str] = &["base", "baseConfig"];
const TOOLCHAIN_KEYS: &[&str] = &["toolchain", "webpackConfig"];
const DEV_SERVER_KEYS: &[&str] = &["dev_server", "devServer", "devServerConfig"];
const BRIDGE_KEYS: &[&str] = &["bridge"];

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Loads a [`ProjectConfig`] from a project root.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    root: PathBuf,
    explicit: Option<PathBuf>,
    bridge_override: Option<String>,
}

impl ConfigLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            explicit: None,
            bridge_override: None,
        }
    }

    /// Use this file instead of probing the root. Relative paths resolve
    /// against the root.
    pub fn with_config_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit = path;
        self
    }

    /// Whitespace-separated bridge command that wins over the file.
    pub fn with_bridge_override(mut self, command: Option<String>) -> Self {
        self.bridge_override = command;
        self
    }

    pub fn load(&self) -> Result<ProjectConfig, ConfigError> {
        let mut config = match self.locate()? {
            Some(path) => {
                let (tree, digest) = read_config_file(&path)?;
                debug!(path = %path.display(), %digest, "loaded config file");
                let mut config = normalize(&self.root, &tree)?;
                config.source = Some(ConfigFile { path, digest });
                config
            }
            None => {
                info!(root = %self.root.display(), "no config file found, using defaults");
                ProjectConfig::with_defaults(&self.root)
            }
        };

        if let Some(command) = self.bridge_override.as_deref() {
            let argv = split_command(command);
            if !argv.is_empty() {
                config.bridge.command = argv;
            }
        }

        Ok(config)
    }

    fn locate(&self) -> Result<Option<PathBuf>, ConfigError> {
        if let Some(explicit) = &self.explicit {
            let path = if explicit.is_absolute() {
                explicit.clone()
            } else {
                self.root.join(explicit)
            };
            if !path.is_file() {
                return Err(ConfigError::NotFound(path));
            }
            return Ok(Some(path));
        }

        Ok(CONFIG_FILE_NAMES
            .iter()
            .map(|name| self.root.join(name))
            .find(|candidate| candidate.is_file()))
    }
}

/// Read a TOML or JSON config file, returning the tree and a digest of the
/// raw bytes.
pub fn read_config_file(path: &Path) -> Result<(Value, String), ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::Io {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    let contents =
        String::from_utf8(bytes).map_err(|e| parse_err(format!("invalid UTF-8: {}", e)))?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let tree = if is_json {
        serde_json::from_str(&contents).map_err(|e| parse_err(e.to_string()))?
    } else {
        let toml_value: toml::Value =
            toml::from_str(&contents).map_err(|e| parse_err(e.to_string()))?;
        toml_to_json(toml_value)
    };

    if !tree.is_object() {
        return Err(parse_err("top level must be a table".to_string()));
    }

    Ok((tree, digest))
}

/// Convert a TOML value to a JSON value.
pub fn toml_to_json(toml: toml::Value) -> Value {
    match toml {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

/// Normalize a raw tree into the three sections plus bridge settings.
pub fn normalize(root: &Path, tree: &Value) -> Result<ProjectConfig, ConfigError> {
    let empty = Map::new();
    let top = tree.as_object().unwrap_or(&empty);

    for key in top.keys() {
        let known = [BASE_KEYS, TOOLCHAIN_KEYS, DEV_SERVER_KEYS, BRIDGE_KEYS]
            .iter()
            .any(|keys| keys.contains(&key.as_str()));
        if !known {
            warn!(key = %key, "ignoring unknown config section");
        }
    }

    let base = parse_base(section(top, BASE_KEYS).unwrap_or(&empty))?;
    let toolchain = Value::Object(section(top, TOOLCHAIN_KEYS).cloned().unwrap_or_default());
    let dev_server = parse_dev_server(section(top, DEV_SERVER_KEYS).unwrap_or(&empty));
    let bridge = parse_bridge(section(top, BRIDGE_KEYS).unwrap_or(&empty));

    Ok(ProjectConfig {
        root: root.to_path_buf(),
        source: None,
        base,
        toolchain,
        dev_server,
        bridge,
    })
}

/// First present section among `keys`; a non-table section is ignored.
fn section<'a>(top: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Map<String, Value>> {
    let (key, value) = keys
        .iter()
        .find_map(|k| top.get(*k).map(|v| (*k, v)))?;
    match value.as_object() {
        Some(map) => Some(map),
        None => {
            warn!(section = key, "config section is not a table, using defaults");
            None
        }
    }
}

/// Read an optional setting, falling back to `None` with a warning when it
/// has the wrong type.
fn lenient<T: DeserializeOwned>(map: &Map<String, Value>, keys: &[&str]) -> Option<T> {
    let (key, value) = keys.iter().find_map(|k| map.get(*k).map(|v| (*k, v)))?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(setting = key, error = %e, "ignoring malformed setting");
            None
        }
    }
}

fn parse_base(map: &Map<String, Value>) -> Result<BaseSettings, ConfigError> {
    let defaults = BaseSettings::default();

    let entry = match map.get("entry") {
        None => defaults.entry,
        Some(value) => parse_entry(value)?,
    };

    let templates = match ["templates", "pages"].iter().find_map(|k| map.get(*k)) {
        None => defaults.templates,
        Some(value) => serde_json::from_value(value.clone()).map_err(|e| {
            ConfigError::Invalid(format!("templates must map entry names to templates: {}", e))
        })?,
    };

    let alias: Option<Map<String, Value>> = lenient(map, &["alias"]);
    let alias = alias
        .map(|aliases| {
            aliases
                .into_iter()
                .filter_map(|(name, target)| match target {
                    Value::String(dir) => Some((name, dir)),
                    _ => {
                        warn!(alias = %name, "alias target must be a path string, skipping");
                        None
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(BaseSettings {
        entry,
        templates,
        out_dir: lenient(map, &["build", "outputDir", "out_dir"]).unwrap_or(defaults.out_dir),
        public_path: lenient(map, &["public_path", "publicPath"]).unwrap_or(defaults.public_path),
        extensions: lenient(map, &["extensions"]).unwrap_or_default(),
        alias,
        define: lenient(map, &["define"]).unwrap_or_default(),
        analyze: lenient(map, &["analyze"]).unwrap_or(false),
    })
}

fn parse_entry(value: &Value) -> Result<EntrySpec, ConfigError> {
    match value {
        Value::String(path) => Ok(EntrySpec::Single(path.clone())),
        Value::Object(map) if map.is_empty() => Err(ConfigError::Invalid(
            "entry mapping must declare at least one entry".to_string(),
        )),
        Value::Object(map) => map
            .iter()
            .map(|(name, path)| match path {
                Value::String(p) => Ok((name.clone(), p.clone())),
                _ => Err(ConfigError::Invalid(format!(
                    "entry '{}' must be a path string",
                    name
                ))),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(EntrySpec::Named),
        _ => Err(ConfigError::Invalid(
            "entry must be a path or a mapping of names to paths".to_string(),
        )),
    }
}

fn parse_dev_server(map: &Map<String, Value>) -> DevServerSettings {
    DevServerSettings {
        host: lenient(map, &["host"]),
        port: lenient(map, &["port"]),
        https: lenient(map, &["https"]).unwrap_or(false),
        overrides: map.clone(),
    }
}

fn parse_bridge(map: &Map<String, Value>) -> BridgeSettings {
    let command = match map.get("command") {
        Some(Value::String(s)) => split_command(s),
        Some(Value::Array(_)) => lenient::<Vec<String>>(map, &["command"]).unwrap_or_default(),
        Some(_) => {
            warn!("bridge command must be a string or list, using default");
            Vec::new()
        }
        None => Vec::new(),
    };

    if command.is_empty() {
        BridgeSettings::default()
    } else {
        BridgeSettings { command }
    }
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}
