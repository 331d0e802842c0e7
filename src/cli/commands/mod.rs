//! CLI command handlers.

pub mod config;
pub mod run;
pub mod validate;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::domain::models::{Task, TaskGraph};

/// On-disk task graph format. The session id is optional; a fresh one is
/// minted when absent so graph files stay reusable across sessions.
#[derive(Debug, Deserialize)]
struct GraphFile {
    #[serde(default)]
    session_id: Option<Uuid>,
    tasks: Vec<Task>,
}

/// Load and deserialize a task graph JSON file.
pub fn load_graph(path: impl AsRef<Path>) -> Result<TaskGraph> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read task graph from {}", path.display()))?;
    let file: GraphFile = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse task graph {}", path.display()))?;
    Ok(TaskGraph::new(
        file.session_id.unwrap_or_else(Uuid::new_v4),
        file.tasks,
    ))
}
