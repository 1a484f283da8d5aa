//! Debug artifact for the composed configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;

use super::ComposeError;
use crate::config::{ConfigFile, ProjectConfig};
use crate::mode::Mode;

/// File written next to the project when `--debug` is set.
pub const DEBUG_FILE_NAME: &str = "bean.config.debug.json";

/// Schema identifier
pub const SCHEMA_ID: &str = "bean/composed_config@1";

/// Snapshot of one composition. Diagnostic only; never read back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugArtifact {
    pub schema_id: String,
    pub created_at: DateTime<Utc>,
    pub mode: Mode,
    /// Config file the composition started from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DebugSource>,
    pub config: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugSource {
    pub path: String,
    pub digest: String,
}

impl From<&ConfigFile> for DebugSource {
    fn from(file: &ConfigFile) -> Self {
        Self {
            path: file.path.to_string_lossy().into_owned(),
            digest: file.digest.clone(),
        }
    }
}

impl DebugArtifact {
    pub fn new(project: &ProjectConfig, mode: Mode, config: &Value) -> Self {
        Self {
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            mode,
            source: project.source.as_ref().map(DebugSource::from),
            config: config.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to `<root>/bean.config.debug.json`, returning the path.
    pub fn write(&self, project: &ProjectConfig) -> Result<PathBuf, ComposeError> {
        let path = project.root.join(DEBUG_FILE_NAME);
        let json = self.to_json()?;
        fs::write(&path, json).map_err(|e| ComposeError::DebugArtifact {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }
}
