//! Normalized project configuration.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::defaults::{
    DEFAULT_BRIDGE_COMMAND, DEFAULT_ENTRY, DEFAULT_ENTRY_NAME, DEFAULT_OUT_DIR,
    DEFAULT_PUBLIC_PATH, DEFAULT_TEMPLATE,
};

/// Project configuration after loading and normalization.
///
/// Loaded once per command and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectConfig {
    /// Directory the project lives in; relative paths resolve against it.
    pub root: PathBuf,
    /// File the configuration came from, if any.
    pub source: Option<ConfigFile>,
    pub base: BaseSettings,
    /// Toolchain-override fragment, merged over the generated tree.
    pub toolchain: Value,
    pub dev_server: DevServerSettings,
    pub bridge: BridgeSettings,
}

impl ProjectConfig {
    /// Configuration for a project with no config file.
    pub fn with_defaults(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            source: None,
            base: BaseSettings::default(),
            toolchain: Value::Object(Map::new()),
            dev_server: DevServerSettings::default(),
            bridge: BridgeSettings::default(),
        }
    }

    /// Resolve a project-relative path against the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path.strip_prefix("./").unwrap_or(path));
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }
}

/// Provenance of a loaded configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFile {
    pub path: PathBuf,
    /// SHA-256 of the raw file bytes, hex encoded.
    pub digest: String,
}

/// Entry declaration as written by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySpec {
    /// One source path, named [`DEFAULT_ENTRY_NAME`].
    Single(String),
    /// Named entries in declaration order.
    Named(Vec<(String, String)>),
}

impl Default for EntrySpec {
    fn default() -> Self {
        EntrySpec::Single(DEFAULT_ENTRY.to_string())
    }
}

impl EntrySpec {
    /// Promote to a name → path list.
    pub fn normalize(&self) -> Vec<(String, String)> {
        match self {
            EntrySpec::Single(path) => vec![(DEFAULT_ENTRY_NAME.to_string(), path.clone())],
            EntrySpec::Named(entries) => entries.clone(),
        }
    }
}

/// HTML emission settings for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawTemplate")]
pub struct TemplateDescriptor {
    pub template: String,
    pub favicon: Option<String>,
    pub title: Option<String>,
    /// Chunks to inject; `None` means all chunks.
    pub chunks: Option<Vec<String>>,
}

impl Default for TemplateDescriptor {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            favicon: None,
            title: None,
            chunks: None,
        }
    }
}

/// A template may be written as a bare path or a table.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTemplate {
    Path(String),
    Full {
        #[serde(default = "default_template")]
        template: String,
        #[serde(default)]
        favicon: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        chunks: Option<Vec<String>>,
    },
}

fn default_template() -> String {
    DEFAULT_TEMPLATE.to_string()
}

impl From<RawTemplate> for TemplateDescriptor {
    fn from(raw: RawTemplate) -> Self {
        match raw {
            RawTemplate::Path(template) => Self {
                template,
                ..Self::default()
            },
            RawTemplate::Full {
                template,
                favicon,
                title,
                chunks,
            } => Self {
                template,
                favicon,
                title,
                chunks,
            },
        }
    }
}

/// The `[base]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseSettings {
    pub entry: EntrySpec,
    pub templates: BTreeMap<String, TemplateDescriptor>,
    /// Output directory relative to the root.
    pub out_dir: String,
    pub public_path: String,
    /// Extensions added to the default resolvable list.
    pub extensions: Vec<String>,
    /// Alias name → directory, in declaration order.
    pub alias: Vec<(String, String)>,
    /// Compile-time constants for the definition plugin.
    pub define: Map<String, Value>,
    /// Emit a bundle-analysis report in production builds.
    pub analyze: bool,
}

impl Default for BaseSettings {
    fn default() -> Self {
        Self {
            entry: EntrySpec::default(),
            templates: BTreeMap::new(),
            out_dir: DEFAULT_OUT_DIR.to_string(),
            public_path: DEFAULT_PUBLIC_PATH.to_string(),
            extensions: Vec::new(),
            alias: Vec::new(),
            define: Map::new(),
            analyze: false,
        }
    }
}

/// The `[dev_server]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DevServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub https: bool,
    /// The whole section as written, overlaid onto the server baseline.
    pub overrides: Map<String, Value>,
}

/// How to reach the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Program followed by its arguments.
    pub command: Vec<String>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_BRIDGE_COMMAND.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_entry_normalizes_to_default_name() {
        let entry = EntrySpec::Single("./src/app.ts".to_string());
        assert_eq!(
            entry.normalize(),
            vec![("index".to_string(), "./src/app.ts".to_string())]
        );
    }

    #[test]
    fn test_template_from_bare_path() {
        let t: TemplateDescriptor = serde_json::from_value(json!("./public/admin.html")).unwrap();
        assert_eq!(t.template, "./public/admin.html");
        assert!(t.chunks.is_none());
    }

    #[test]
    fn test_template_from_table_defaults_template() {
        let t: TemplateDescriptor =
            serde_json::from_value(json!({"title": "Admin", "chunks": ["vendors", "admin"]}))
                .unwrap();
        assert_eq!(t.template, DEFAULT_TEMPLATE);
        assert_eq!(t.title.as_deref(), Some("Admin"));
        assert_eq!(t.chunks.unwrap().len(), 2);
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let config = ProjectConfig::with_defaults("/work/app");
        assert_eq!(config.resolve("src"), PathBuf::from("/work/app/src"));
        assert_eq!(config.resolve("./public/a.html"), PathBuf::from("/work/app/public/a.html"));
        assert_eq!(config.resolve("/opt/lib"), PathBuf::from("/opt/lib"));
    }
}
