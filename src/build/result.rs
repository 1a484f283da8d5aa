//! Classified outcome of one compile pass.

use bean_protocol::{StatsAsset, StatsDiagnostic, StatsReport};
use serde::Serialize;
use std::time::Duration;

/// Asset kinds that show up in the report.
const REPORTED_KINDS: &[&str] = &["asset", "chunk"];

/// File name suffixes never shown in the report.
const HIDDEN_SUFFIXES: &[&str] = &[".gz", ".map", ".LICENSE.txt"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    SuccessWithWarnings,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl Diagnostic {
    fn from_stats(severity: Severity, diagnostic: &StatsDiagnostic) -> Self {
        Self {
            severity,
            message: diagnostic.message.clone(),
            module: diagnostic.module_name.clone(),
        }
    }
}

/// One row of the asset report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRow {
    pub name: String,
    pub size: u64,
    /// Size of the gzip sibling, when one was emitted.
    pub compressed_size: Option<u64>,
}

impl AssetRow {
    /// Compressed size as a fraction of the original.
    pub fn ratio(&self) -> Option<f64> {
        match self.compressed_size {
            Some(compressed) if self.size > 0 => Some(compressed as f64 / self.size as f64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildResult {
    pub outcome: BuildOutcome,
    pub assets: Vec<AssetRow>,
    /// Warnings first, then errors, each in compiler order.
    pub diagnostics: Vec<Diagnostic>,
    pub elapsed: Duration,
}

impl BuildResult {
    pub fn from_stats(stats: &StatsReport, elapsed: Duration) -> Self {
        let outcome = if stats.has_errors() {
            BuildOutcome::Failure
        } else if stats.has_warnings() {
            BuildOutcome::SuccessWithWarnings
        } else {
            BuildOutcome::Success
        };

        Self {
            outcome,
            assets: collect_assets(&stats.assets),
            diagnostics: diagnostics(stats),
            elapsed,
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    /// Total original size and total compressed size. Assets without a
    /// compressed sibling count at full size in the compressed total.
    pub fn totals(&self) -> (u64, u64) {
        self.assets.iter().fold((0, 0), |(original, compressed), row| {
            (
                original + row.size,
                compressed + row.compressed_size.unwrap_or(row.size),
            )
        })
    }
}

/// Warnings first, then errors, each in compiler order.
pub fn diagnostics(stats: &StatsReport) -> Vec<Diagnostic> {
    stats
        .warnings
        .iter()
        .map(|d| Diagnostic::from_stats(Severity::Warning, d))
        .chain(
            stats
                .errors
                .iter()
                .map(|d| Diagnostic::from_stats(Severity::Error, d)),
        )
        .collect()
}

fn is_hidden(name: &str) -> bool {
    HIDDEN_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Keep emitted chunks and top-level assets, pairing each with its gzip
/// sibling.
pub fn collect_assets(assets: &[StatsAsset]) -> Vec<AssetRow> {
    assets
        .iter()
        .filter(|a| REPORTED_KINDS.contains(&a.kind.as_str()) && !is_hidden(&a.name))
        .map(|asset| {
            let gz_name = format!("{}.gz", asset.name);
            let compressed_size = asset
                .compressed_sibling()
                .map(|r| r.size)
                .or_else(|| assets.iter().find(|a| a.name == gz_name).map(|a| a.size));
            AssetRow {
                name: asset.name.clone(),
                size: asset.size,
                compressed_size,
            }
        })
        .collect()
}
