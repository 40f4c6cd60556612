//! Run lifecycle commands.

use clap::Subcommand;

use faultline_core::RunPhase;
use faultline_store::{RunMeta, RunStore};

use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};

/// Run subcommands.
#[derive(Subcommand)]
pub enum RunCommands {
    /// Start a debug run
    Start {
        /// Project the run belongs to
        #[arg(long)]
        project: String,
        /// Target device id
        #[arg(long)]
        target: String,
        /// Explicit run id (defaults to a timestamp form)
        #[arg(long, default_value = "")]
        run_id: String,
        /// What started the run
        #[arg(long, default_value = "manual")]
        trigger: String,
    },

    /// Show run status
    Status {
        #[arg(long)]
        run_id: String,
    },

    /// Record a phase transition (any phase is accepted)
    Transition {
        #[arg(long)]
        run_id: String,
        /// Target phase, e.g. TEST_LOOP or FAILED
        #[arg(long)]
        phase: RunPhase,
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Stop a run (transition to REPORT)
    Stop {
        #[arg(long)]
        run_id: String,
        #[arg(long, default_value = "manual stop")]
        reason: String,
    },
}

/// Execute a run command.
pub fn execute(command: RunCommands, store: &RunStore, format: OutputFormat) -> CliResult<i32> {
    match command {
        RunCommands::Start {
            project,
            target,
            run_id,
            trigger,
        } => {
            let run_id = (!run_id.is_empty()).then_some(run_id);
            let meta = store.create_run(&project, &target, run_id, &trigger)?;
            show_run(store, &meta, format)?;
            Ok(0)
        }
        RunCommands::Status { run_id } => {
            let meta = store.load_run(&run_id)?;
            show_run(store, &meta, format)?;
            Ok(0)
        }
        RunCommands::Transition {
            run_id,
            phase,
            reason,
        } => {
            let meta = store.transition_run(&run_id, phase, &reason)?;
            show_run(store, &meta, format)?;
            Ok(0)
        }
        RunCommands::Stop { run_id, reason } => {
            let meta = store.transition_run(&run_id, RunPhase::Report, &reason)?;
            show_run(store, &meta, format)?;
            Ok(0)
        }
    }
}

fn show_run(store: &RunStore, meta: &RunMeta, format: OutputFormat) -> CliResult<()> {
    let event_count = store.run_event_count(&meta.run_id)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "run": meta,
            "event_count": event_count,
            "run_root": store.run_root().display().to_string(),
        })),
        OutputFormat::Text => {
            println!("run_id: {}", meta.run_id);
            println!("project_name: {}", meta.project_name);
            println!("target_id: {}", meta.target_id);
            println!("state: {}", meta.state);
            println!("started_at: {}", meta.started_at.to_rfc3339());
            match meta.finished_at {
                Some(at) => println!("finished_at: {}", at.to_rfc3339()),
                None => println!("finished_at: -"),
            }
            println!("event_count: {event_count}");
            Ok(())
        }
    }
}
