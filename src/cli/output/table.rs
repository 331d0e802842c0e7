//! Table output formatting for CLI commands using comfy-table.

use comfy_table::{presets, Attribute, Cell, ContentArrangement, Table};

use crate::domain::models::{StatusSummary, Task};

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Render the deterministic execution order of a graph.
pub fn format_execution_order(order: &[String], tasks: &[Task]) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Task").add_attribute(Attribute::Bold),
        Cell::new("Role").add_attribute(Attribute::Bold),
        Cell::new("Depends on").add_attribute(Attribute::Bold),
    ]);

    for (position, id) in order.iter().enumerate() {
        let (role, dependencies) = tasks
            .iter()
            .find(|t| &t.id == id)
            .map(|t| (t.role.as_str(), t.dependencies.join(", ")))
            .unwrap_or(("?", String::new()));
        table.add_row(vec![
            Cell::new(position + 1),
            Cell::new(id),
            Cell::new(role),
            Cell::new(dependencies),
        ]);
    }

    table.to_string()
}

/// Render aggregate execution status counts.
pub fn format_status_summary(summary: &StatusSummary) -> String {
    let mut table = base_table();
    table.set_header(vec![
        Cell::new("Status").add_attribute(Attribute::Bold),
        Cell::new("Count").add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![Cell::new("done"), Cell::new(summary.done)]);
    table.add_row(vec![Cell::new("failed"), Cell::new(summary.failed)]);
    table.add_row(vec![Cell::new("skipped"), Cell::new(summary.skipped)]);
    table.add_row(vec![Cell::new("pending"), Cell::new(summary.pending)]);
    table.add_row(vec![Cell::new("ready"), Cell::new(summary.ready)]);
    table.add_row(vec![Cell::new("running"), Cell::new(summary.running)]);
    table.add_row(vec![
        Cell::new("total").add_attribute(Attribute::Bold),
        Cell::new(summary.total).add_attribute(Attribute::Bold),
    ]);
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_order_table_lists_all_tasks() {
        let tasks = vec![
            Task::new("a", "Task A"),
            Task::new("b", "Task B").with_dependency("a"),
        ];
        let order = vec!["a".to_string(), "b".to_string()];
        let rendered = format_execution_order(&order, &tasks);
        assert!(rendered.contains("a"));
        assert!(rendered.contains("b"));
        assert!(rendered.contains("worker"));
    }

    #[test]
    fn test_status_summary_table() {
        let summary = StatusSummary {
            total: 3,
            done: 2,
            failed: 1,
            ..Default::default()
        };
        let rendered = format_status_summary(&summary);
        assert!(rendered.contains("done"));
        assert!(rendered.contains("3"));
    }
}
