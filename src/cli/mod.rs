//! Command-line interface.

pub mod commands;
pub mod output;
mod types;

pub use types::{Cli, Commands};

use tracing::error;

/// Print a top-level error and exit nonzero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        let output = serde_json::json!({
            "error": err.to_string(),
            "causes": err.chain().skip(1).map(|c| c.to_string()).collect::<Vec<_>>(),
        });
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&output).unwrap_or_else(|_| err.to_string())
        );
    } else {
        error!(error = %err, "command failed");
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
