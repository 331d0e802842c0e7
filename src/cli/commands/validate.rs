//! `taskforge validate` command handler.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cli::output::table::format_execution_order;

/// Validate a task graph file and print its deterministic execution order.
pub fn execute(graph_path: &Path, json: bool) -> Result<()> {
    let graph = super::load_graph(graph_path)?;
    graph.validate().context("Task graph is invalid")?;
    let order = graph
        .execution_order()
        .context("Failed to compute execution order")?;

    if json {
        let output = serde_json::json!({
            "valid": true,
            "tasks": graph.len(),
            "execution_order": order,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!(
            "Task graph is valid: {} task(s), deterministic order below.",
            graph.len()
        );
        println!("{}", format_execution_order(&order, &graph.tasks));
    }

    Ok(())
}
