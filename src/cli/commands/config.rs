//! `taskforge config` command handler.

use anyhow::Result;

use crate::domain::models::OrchestratorConfig;

/// Print the effective merged configuration.
pub fn execute(config: &OrchestratorConfig, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        print!("{}", serde_yaml::to_string(config)?);
    }
    Ok(())
}
