//! Taskforge CLI entry point.

use clap::Parser;

use taskforge::cli::commands::run::RunArgs;
use taskforge::cli::{handle_error, Cli, Commands};
use taskforge::infrastructure::config::ConfigLoader;
use taskforge::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_ref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            handle_error(err, cli.json);
            return;
        }
    };

    if let Err(err) = logging::init(&config.logging) {
        handle_error(err, cli.json);
        return;
    }

    let result = match &cli.command {
        Commands::Validate { graph } => taskforge::cli::commands::validate::execute(graph, cli.json),
        Commands::Run {
            graph,
            spec,
            fail_once,
            fail_verification,
        } => {
            taskforge::cli::commands::run::execute(
                config,
                RunArgs {
                    graph,
                    spec: spec.as_deref(),
                    fail_once,
                    fail_verification: *fail_verification,
                },
                cli.json,
            )
            .await
        }
        Commands::Config => taskforge::cli::commands::config::execute(&config, cli.json),
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
