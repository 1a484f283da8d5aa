//! Mode trees.
//!
//! Each mode is one generator function; [`generator`] picks it once and the
//! composer never branches on the mode string again.

use serde::Serialize;
use serde_json::{json, Value};

use super::plugin::{self, descriptor};
use super::ComposeError;
use crate::mode::Mode;

/// Smallest file, in bytes, the compression plugin will gzip.
pub const COMPRESSION_THRESHOLD: u64 = 10240;

/// Compressed/original ratio above which the gzip copy is dropped.
pub const COMPRESSION_MIN_RATIO: f64 = 0.8;

/// Inputs a mode generator may read.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProfileInputs {
    /// Emit a bundle-analysis report.
    pub analyze: bool,
}

pub type ModeGenerator = fn(&ProfileInputs) -> Result<Value, ComposeError>;

pub fn generator(mode: Mode) -> ModeGenerator {
    match mode {
        Mode::Development => development,
        Mode::Production => production,
    }
}

/// Options handed to the JavaScript minifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MinifierOptions {
    pub parse: ParseOptions,
    pub compress: CompressOptions,
    pub mangle: MangleOptions,
    pub output: OutputOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseOptions {
    pub ecma: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressOptions {
    pub ecma: u16,
    pub comparisons: bool,
    pub inline: u8,
    pub drop_console: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MangleOptions {
    pub safari10: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputOptions {
    pub ecma: u16,
    pub comments: bool,
    pub ascii_only: bool,
}

impl Default for MinifierOptions {
    fn default() -> Self {
        Self {
            parse: ParseOptions { ecma: 2020 },
            compress: CompressOptions {
                ecma: 5,
                // Known to break valid code when enabled.
                comparisons: false,
                inline: 2,
                drop_console: true,
            },
            mangle: MangleOptions { safari10: true },
            output: OutputOptions {
                ecma: 5,
                comments: false,
                ascii_only: true,
            },
        }
    }
}

fn development(_inputs: &ProfileInputs) -> Result<Value, ComposeError> {
    Ok(json!({
        "mode": Mode::Development.as_str(),
        "devtool": "eval-cheap-module-source-map",
        "optimization": {
            "minimize": false,
            "runtimeChunk": "single"
        },
        "plugins": []
    }))
}

fn production(inputs: &ProfileInputs) -> Result<Value, ComposeError> {
    let terser_options = serde_json::to_value(MinifierOptions::default())?;

    let mut plugins = vec![descriptor(
        plugin::CSS_EXTRACT,
        json!({
            "filename": "css/[name].[contenthash:8].css",
            "chunkFilename": "css/[name].[contenthash:8].chunk.css"
        }),
    )];
    if inputs.analyze {
        plugins.push(descriptor(
            plugin::BUNDLE_ANALYZER,
            json!({
                "analyzerMode": "static",
                "reportFilename": "report.html",
                "openAnalyzer": false
            }),
        ));
    }
    plugins.push(descriptor(
        plugin::COMPRESSION,
        json!({
            "filename": "[path][base].gz[query]",
            "algorithm": "gzip",
            "test": "\\.(js|css|html|svg)$",
            "threshold": COMPRESSION_THRESHOLD,
            "minRatio": COMPRESSION_MIN_RATIO,
            "deleteOriginalAssets": false
        }),
    ));

    Ok(json!({
        "mode": Mode::Production.as_str(),
        "devtool": "source-map",
        "stats": {
            "preset": "normal",
            "assets": true,
            "modules": false,
            "children": false
        },
        "plugins": plugins,
        "optimization": {
            "minimize": true,
            "minimizer": [
                descriptor(plugin::TERSER, json!({
                    "parallel": true,
                    "extractComments": false,
                    "terserOptions": terser_options
                })),
                descriptor(plugin::CSS_MINIMIZER, json!({}))
            ],
            "splitChunks": {
                "chunks": "all",
                "cacheGroups": {
                    "vendors": {
                        "name": "vendors",
                        "test": "[\\\\/]node_modules[\\\\/]",
                        "priority": -10,
                        "reuseExistingChunk": true
                    },
                    "common": {
                        "name": "common",
                        "chunks": "initial",
                        "minChunks": 2,
                        "priority": -9,
                        "reuseExistingChunk": true
                    },
                    "async": {
                        "name": "async",
                        "chunks": "async",
                        "minChunks": 2,
                        "priority": -9,
                        "reuseExistingChunk": true
                    }
                }
            }
        }
    }))
}
