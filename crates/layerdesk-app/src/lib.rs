//! LayerDesk command-line tooling.
//!
//! The reset report loads a project, runs the side-effect-free reset
//! self-check over it and writes the outcome as JSON.

use layerdesk_core::{Editor, EditorConfig, Project, ProjectError, ResetCheck};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Directory reports go to when none is given.
pub const DEFAULT_REPORT_DIR: &str = "reports";

/// Report errors.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Outcome of one reset self-check run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetReport {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub entries: Vec<ResetCheck>,
}

impl ResetReport {
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|entry| entry.ok)
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|entry| !entry.ok).count()
    }
}

pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

/// Run the self-check over the project's selection, or every visible
/// unlocked layer when nothing is selected.
pub fn check_project(project: Project, config: EditorConfig, timestamp: u64) -> ResetReport {
    let mut editor = Editor::from_project(project, config);
    ResetReport {
        timestamp,
        entries: editor.validate_reset(),
    }
}

pub fn report_path(dir: &Path, timestamp: u64) -> PathBuf {
    dir.join(format!("validate-reset-{timestamp}.json"))
}

/// Write a report into `dir`, creating it if needed.
pub fn write_report(report: &ResetReport, dir: &Path) -> ReportResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = report_path(dir, report.timestamp);
    std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Load an optional JSON config file, falling back to the defaults.
pub fn load_config(path: Option<&Path>) -> ReportResult<EditorConfig> {
    match path {
        Some(path) => {
            let json = std::fs::read_to_string(path)?;
            Ok(EditorConfig::from_json(&json)?)
        }
        None => Ok(EditorConfig::default()),
    }
}

/// Load `project_path`, check it and write the report into `out_dir`.
pub fn validate_reset(
    project_path: &Path,
    out_dir: &Path,
    config: EditorConfig,
) -> ReportResult<(PathBuf, ResetReport)> {
    let project = Project::load(project_path)?;
    log::info!("Checking {} layers from {}", project.layers.len(), project_path.display());
    let report = check_project(project, config, unix_timestamp());
    let path = write_report(&report, out_dir)?;
    Ok((path, report))
}
