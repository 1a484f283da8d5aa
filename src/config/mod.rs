//! Project configuration
//!
//! Loads `bean.toml` (or `bean.json`) from the project root and normalizes it
//! into three sections:
//! 1. `[base]`: entries, templates, output, aliases, constants
//! 2. `[toolchain]`: a fragment merged over the generated bundler config
//! 3. `[dev_server]`: host, port and any server-level option
//!
//! plus `[bridge]`, the command used to reach the bundler.

pub mod defaults;
mod loader;
mod project;

pub use loader::{normalize, read_config_file, toml_to_json, ConfigError, ConfigLoader};
pub use project::{
    BaseSettings, BridgeSettings, ConfigFile, DevServerSettings, EntrySpec, ProjectConfig,
    TemplateDescriptor,
};
