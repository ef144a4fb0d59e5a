//! Result artifact - the JSON file a driver invocation leaves behind
//!
//! Downstream tooling reads these files instead of parsing terminal
//! output, so the shape stays stable: `id`/`existed` on success, `error`
//! on failure, and a completion timestamp either way.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use stratus_core::descriptor::ResourceHandle;

/// Outcome of one reconciliation, as written to the result file
#[derive(Debug, Serialize)]
pub struct ResultArtifact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl ResultArtifact {
    pub fn success(handle: &ResourceHandle) -> Self {
        Self {
            id: Some(handle.id.clone()),
            existed: Some(handle.existed),
            error: None,
            completed_at: Utc::now(),
        }
    }

    /// Lookup that found nothing; not an error
    pub fn absent() -> Self {
        Self {
            id: None,
            existed: Some(false),
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            id: None,
            existed: None,
            error: Some(error.into()),
            completed_at: Utc::now(),
        }
    }
}

/// Write one artifact as pretty-printed JSON
pub fn write_artifact(path: &Path, artifact: &ResultArtifact) -> Result<(), String> {
    let json = serde_json::to_string_pretty(artifact)
        .map_err(|e| format!("failed to serialize result: {}", e))?;
    fs::write(path, json).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}

/// Write a batch's artifacts as a JSON array, in task order
pub fn write_artifacts(path: &Path, artifacts: &[ResultArtifact]) -> Result<(), String> {
    let json = serde_json::to_string_pretty(artifacts)
        .map_err(|e| format!("failed to serialize results: {}", e))?;
    fs::write(path, json).map_err(|e| format!("failed to write {}: {}", path.display(), e))
}
