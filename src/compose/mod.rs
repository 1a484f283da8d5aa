//! Config composer
//!
//! Turns a [`ProjectConfig`] into the full bundler configuration:
//! 1. normalize entries and check templates
//! 2. build the base tree
//! 3. build the mode tree and merge the user's toolchain overrides into it
//! 4. merge the mode tree over the base tree
//! 5. check the shape of the result
//!
//! Every step is pure; nothing here touches a compiler.

mod base;
mod debug;
pub mod plugin;
mod profile;
mod tables;
mod validate;

use bean_merge::{merge_with_report, StrategyTable};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::config::ProjectConfig;
use crate::mode::Mode;

pub use base::{base_tree, merge_extensions, resolve_entries, ResolvedEntry};
pub use debug::{DebugArtifact, DEBUG_FILE_NAME};
pub use profile::{
    generator, MinifierOptions, ModeGenerator, ProfileInputs, COMPRESSION_MIN_RATIO,
    COMPRESSION_THRESHOLD,
};
pub use tables::{composition_table, override_table};
pub use validate::validate_shape;

/// Composition errors. All of them are configuration errors to the user.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error(
        "no template declared for {}; every entry needs one when more than one entry is declared",
        describe_entries(.entries)
    )]
    MissingTemplates { entries: Vec<String> },

    #[error("composed configuration is invalid at {path}: {reason}")]
    Shape { path: String, reason: String },

    #[error("failed to encode configuration: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write debug artifact {}: {message}", path.display())]
    DebugArtifact { path: PathBuf, message: String },
}

fn describe_entries(entries: &[String]) -> String {
    let quoted: Vec<String> = entries.iter().map(|e| format!("'{}'", e)).collect();
    match quoted.len() {
        1 => format!("entry {}", quoted[0]),
        _ => format!("entries {}", quoted.join(", ")),
    }
}

/// Knobs that come from the command line rather than the project file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeOptions {
    /// Force the bundle analyzer on, regardless of the project setting.
    pub analyze: bool,
}

/// Compose the configuration for `mode`.
pub fn compose(project: &ProjectConfig, mode: Mode) -> Result<Value, ComposeError> {
    compose_with(project, mode, ComposeOptions::default())
}

pub fn compose_with(
    project: &ProjectConfig,
    mode: Mode,
    options: ComposeOptions,
) -> Result<Value, ComposeError> {
    let entries = resolve_entries(&project.base)?;
    debug!(%mode, entries = entries.len(), "composing configuration");

    let base = base_tree(project, &entries, mode);

    let inputs = ProfileInputs {
        analyze: options.analyze || project.base.analyze,
    };
    let mut mode_tree = generator(mode)(&inputs)?;
    inherit_split_chunks(&base, &mut mode_tree);
    let mode_tree = merge_logged(
        &mode_tree,
        &project.toolchain,
        &override_table(),
        "toolchain overrides",
    );

    let composed = merge_logged(&base, &mode_tree, &composition_table(), "mode over base");
    validate_shape(&composed)?;
    Ok(composed)
}

/// A mode without its own chunk groups starts from the base ones, so user
/// cache groups extend them instead of replacing them.
fn inherit_split_chunks(base: &Value, mode_tree: &mut Value) {
    let Some(split_chunks) = base.pointer("/optimization/splitChunks") else {
        return;
    };
    if mode_tree.pointer("/optimization/splitChunks").is_some() {
        return;
    }
    let Some(tree) = mode_tree.as_object_mut() else {
        return;
    };
    let optimization = tree
        .entry("optimization")
        .or_insert_with(|| Value::Object(Default::default()));
    if let Some(optimization) = optimization.as_object_mut() {
        optimization.insert("splitChunks".to_string(), split_chunks.clone());
    }
}

fn merge_logged(left: &Value, right: &Value, table: &StrategyTable, stage: &str) -> Value {
    let outcome = merge_with_report(left, right, table);
    for mismatch in &outcome.mismatches {
        warn!(
            stage,
            path = %mismatch.path,
            strategy = mismatch.strategy,
            "value shapes do not fit the merge strategy, replacing"
        );
    }
    outcome.value
}
