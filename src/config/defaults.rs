//! Built-in project defaults
//!
//! Values used whenever the project configuration leaves a setting out.

/// File names probed in the project root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["bean.toml", "bean.json"];

/// Entry used when the project declares none.
pub const DEFAULT_ENTRY: &str = "./src/main.js";

/// Name given to a single, unnamed entry.
pub const DEFAULT_ENTRY_NAME: &str = "index";

/// HTML template used for an entry without a descriptor.
pub const DEFAULT_TEMPLATE: &str = "./public/index.html";

/// Output directory, relative to the project root.
pub const DEFAULT_OUT_DIR: &str = "dist";

pub const DEFAULT_PUBLIC_PATH: &str = "/";

/// Resolvable extensions every project gets; project extras are appended.
pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".tsx", ".ts", ".js", ".json", ".vue", ".css", ".scss", ".less",
];

/// Alias name that always points at `<root>/src`.
pub const SOURCE_ALIAS: &str = "@";

/// Directory served as static files in dev mode.
pub const STATIC_DIR: &str = "public";

pub const DEFAULT_HOST: &str = "localhost";

pub const DEFAULT_PORT: u16 = 8800;

/// Command used to reach the bundler when nothing else is configured.
pub const DEFAULT_BRIDGE_COMMAND: &[&str] = &["node", "./node_modules/.bin/bean-bridge"];

/// Environment variable overriding the bridge command.
pub const BRIDGE_ENV: &str = "BEAN_BRIDGE";

/// Title shown for an entry without an explicit one.
pub fn default_title(entry: &str) -> String {
    format!("{} Page", entry)
}
