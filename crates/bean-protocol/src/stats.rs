//! Stats report produced by one compile pass.

use serde::{Deserialize, Serialize};

/// Structured record of one compile pass.
///
/// Field names follow the bundler's own JSON stats so bridges can forward
/// them with little reshaping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsReport {
    #[serde(default)]
    pub assets: Vec<StatsAsset>,
    #[serde(default)]
    pub warnings: Vec<StatsDiagnostic>,
    #[serde(default)]
    pub errors: Vec<StatsDiagnostic>,
    /// Compile duration in milliseconds, when the compiler measured it.
    #[serde(default, rename = "time", skip_serializing_if = "Option::is_none")]
    pub time_ms: Option<u64>,
}

impl StatsReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One emitted asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsAsset {
    pub name: String,
    pub size: u64,
    /// Asset classification (`asset`, `chunk`, ...).
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub related: Vec<RelatedAsset>,
}

fn default_kind() -> String {
    "asset".to_string()
}

impl StatsAsset {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
            kind: default_kind(),
            related: Vec::new(),
        }
    }

    pub fn with_related(mut self, related: RelatedAsset) -> Self {
        self.related.push(related);
        self
    }

    /// The gzip sibling emitted next to this asset, if any.
    pub fn compressed_sibling(&self) -> Option<&RelatedAsset> {
        self.related
            .iter()
            .find(|r| r.kind == "gzipped" || r.name.ends_with(".gz"))
    }
}

/// A file derived from an asset (compressed copy, source map, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedAsset {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub size: u64,
}

impl RelatedAsset {
    pub fn gzipped(name: impl Into<String>, size: u64) -> Self {
        Self {
            kind: "gzipped".to_string(),
            name: name.into(),
            size,
        }
    }
}

/// A warning or error message from the compiler.
///
/// Accepts either a bare string or an object with `message` and an optional
/// `moduleName`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawDiagnostic")]
pub struct StatsDiagnostic {
    pub message: String,
    #[serde(rename = "moduleName", skip_serializing_if = "Option::is_none")]
    pub module_name: Option<String>,
}

impl StatsDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            module_name: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDiagnostic {
    Text(String),
    Full {
        message: String,
        #[serde(default, rename = "moduleName")]
        module_name: Option<String>,
    },
}

impl From<RawDiagnostic> for StatsDiagnostic {
    fn from(raw: RawDiagnostic) -> Self {
        match raw {
            RawDiagnostic::Text(message) => Self {
                message,
                module_name: None,
            },
            RawDiagnostic::Full {
                message,
                module_name,
            } => Self {
                message,
                module_name,
            },
        }
    }
}
