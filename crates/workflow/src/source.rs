//! Read-only directory source for workflow definitions.
//!
//! Definitions live as one JSON file per workflow under a root directory.
//! Lookup is by `workflow_id` field, not filename.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::definition::WorkflowDefinition;

/// Errors from definition loading.
#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed workflow definition: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("workflow root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("workflow not found: {0}")]
    NotFound(String),
}

fn definition_files(root: &Path) -> Result<Vec<PathBuf>, WorkflowError> {
    let mut files: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

/// Workflow ids available under the root, in filename order.
///
/// A missing root is an empty catalog, not an error.
pub fn list_workflows(root: &Path) -> Result<Vec<String>, WorkflowError> {
    if !root.exists() {
        return Ok(Vec::new());
    }
    let mut ids = Vec::new();
    for file in definition_files(root)? {
        let definition: WorkflowDefinition = serde_json::from_str(&fs::read_to_string(&file)?)?;
        ids.push(definition.workflow_id);
    }
    Ok(ids)
}

/// Load one definition by `workflow_id`.
pub fn load_workflow_definition(
    root: &Path,
    workflow_id: &str,
) -> Result<WorkflowDefinition, WorkflowError> {
    if !root.exists() {
        return Err(WorkflowError::RootNotFound(root.to_path_buf()));
    }
    for file in definition_files(root)? {
        let definition: WorkflowDefinition = serde_json::from_str(&fs::read_to_string(&file)?)?;
        if definition.workflow_id == workflow_id {
            return Ok(definition);
        }
    }
    Err(WorkflowError::NotFound(workflow_id.to_string()))
}
