//! `taskforge run` command handler.
//!
//! Drives a whole session over a graph file with scripted collaborators, so
//! graphs and gate settings can be exercised offline before wiring in real
//! agent backends.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::domain::models::{BuildSpec, OrchestratorConfig, SessionPhase};
use crate::domain::ports::TracingEventSink;
use crate::infrastructure::runners::{RecordingEffects, ScriptedRunner, ScriptedVerifier};
use crate::services::SessionCoordinator;

use crate::cli::output::table::format_status_summary;

pub struct RunArgs<'a> {
    pub graph: &'a Path,
    pub spec: Option<&'a Path>,
    pub fail_once: &'a [String],
    pub fail_verification: usize,
}

pub async fn execute(config: OrchestratorConfig, args: RunArgs<'_>, json: bool) -> Result<()> {
    let graph = super::load_graph(args.graph)?;
    let build_spec = match args.spec {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read build spec from {}", path.display()))?;
            serde_yaml::from_str::<BuildSpec>(&raw)
                .with_context(|| format!("Failed to parse build spec {}", path.display()))?
        }
        None => BuildSpec::default(),
    };

    let mut runner = ScriptedRunner::succeeding();
    for task_id in args.fail_once {
        runner = runner.with_failures(task_id, 1);
    }
    let effects = Arc::new(RecordingEffects::new());
    let verifier = Arc::new(ScriptedVerifier::failing_times(args.fail_verification));

    let mut coordinator = SessionCoordinator::new(
        config,
        Arc::new(runner),
        Arc::clone(&effects) as Arc<dyn crate::domain::ports::EffectExecutor>,
        verifier,
        Arc::new(TracingEventSink),
    );

    coordinator.begin().await?;
    coordinator.submit_questionnaire(build_spec).await?;
    coordinator.finalize_spec().await?;
    coordinator.submit_plan(graph).await?;
    coordinator.approve_plan().await?;

    let outcome = coordinator.run(".").await;
    let session = coordinator.session();
    let summary = coordinator.status();

    if json {
        let output = serde_json::json!({
            "session_id": session.id,
            "phase": session.phase.as_str(),
            "fix_cycles": session.fix_cycles,
            "summary": summary,
            "effects_applied": effects.applications().len(),
            "errors": session.error_history,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Session {} ended in {}.", session.id, session.phase.as_str());
        if session.fix_cycles > 0 {
            println!("Fix cycles used: {}", session.fix_cycles);
        }
        println!("{}", format_status_summary(&summary));
        if let Some(report) = &session.failure_report {
            println!("Root cause: {}", report.root_cause);
            for option in &report.recovery_options {
                println!("  - {option}");
            }
        }
    }

    match outcome {
        Ok(SessionPhase::Complete) => Ok(()),
        Ok(phase) => anyhow::bail!("session ended in unexpected phase {}", phase.as_str()),
        Err(err) => Err(err).context("Session did not complete"),
    }
}
