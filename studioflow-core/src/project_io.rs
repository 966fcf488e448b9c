//! Project I/O — save / load session state as JSON.
//!
//! Format: JSON object with the footage directory, the last analyzed clips,
//! and the last generated rough-cut plan (if any).

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{ClipAnalysis, RoughCutPlan};

const PROJECT_VERSION: u32 = 1;

/// Top-level project structure for serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Schema version for future-proofing.
    pub version: u32,

    /// Application version that created this file.
    pub app_version: String,

    /// ISO-8601 timestamp of last save.
    pub saved_at: String,

    /// Footage directory this project was built from.
    pub footage_dir: PathBuf,

    /// Clip analyses from the last scan (empty until `analyze_clips` runs).
    pub clips: Vec<ClipAnalysis>,

    /// The last generated rough-cut plan, if any.
    pub plan: Option<RoughCutPlan>,
}

impl ProjectFile {
    /// Create a new project file from the current state.
    pub fn new(footage_dir: PathBuf, clips: Vec<ClipAnalysis>, plan: Option<RoughCutPlan>) -> Self {
        Self {
            version: PROJECT_VERSION,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            saved_at: chrono::Utc::now().to_rfc3339(),
            footage_dir,
            clips,
            plan,
        }
    }
}

/// Save project to a JSON file.
pub fn save_project(
    path: &Path,
    footage_dir: &Path,
    clips: &[ClipAnalysis],
    plan: Option<&RoughCutPlan>,
) -> Result<()> {
    let project = ProjectFile::new(footage_dir.to_path_buf(), clips.to_vec(), plan.cloned());

    let json = serde_json::to_string_pretty(&project).context("Failed to serialize project to JSON")?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    std::fs::write(path, &json).with_context(|| format!("Failed to write project file: {}", path.display()))?;

    info!("Project saved: {} ({} bytes)", path.display(), json.len());
    Ok(())
}

/// Load project from a JSON file.
pub fn load_project(path: &Path) -> Result<ProjectFile> {
    let json = std::fs::read_to_string(path).with_context(|| format!("Cannot read project file: {}", path.display()))?;

    let project: ProjectFile =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse project file: {}", path.display()))?;

    if project.version > PROJECT_VERSION {
        anyhow::bail!(
            "Project file version {} is newer than supported version {}. Please update StudioFlow.",
            project.version,
            PROJECT_VERSION
        );
    }

    info!(
        "Project loaded: {} ({} clips, saved {})",
        path.display(),
        project.clips.len(),
        project.saved_at
    );
    Ok(project)
}

/// Get the default project directory.
pub fn default_projects_dir() -> PathBuf {
    if let Some(docs) = dirs::document_dir() {
        docs.join("StudioFlow")
    } else if let Some(home) = dirs::home_dir() {
        home.join("StudioFlow")
    } else {
        PathBuf::from(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let clip = ClipAnalysis::new(PathBuf::from("a.mov"));
        let project = ProjectFile::new(PathBuf::from("/tmp/footage"), vec![clip], None);

        let json = serde_json::to_string(&project).unwrap();
        let loaded: ProjectFile = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded.version, PROJECT_VERSION);
        assert_eq!(loaded.clips.len(), 1);
        assert_eq!(loaded.footage_dir, PathBuf::from("/tmp/footage"));
        assert!(loaded.plan.is_none());
    }

    #[test]
    fn test_load_rejects_future_version() {
        let dir = std::env::temp_dir().join(format!("studioflow_test_projio_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("future.json");
        std::fs::write(
            &path,
            r#"{"version":999,"app_version":"x","saved_at":"2020-01-01T00:00:00Z","footage_dir":"/tmp","clips":[],"plan":null}"#,
        )
        .unwrap();

        let err = load_project(&path).unwrap_err();
        assert!(err.to_string().contains("newer than supported"));
    }
}
