//! Workflow control commands.

use std::collections::BTreeSet;
use std::path::Path;

use clap::Subcommand;

use faultline_store::RunStore;
use faultline_workflow::{list_workflows, load_workflow_definition, run_workflow, RunStatus};

use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};

/// Workflow subcommands.
#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// List available workflow definitions
    List,

    /// Show a workflow definition
    Show { workflow_id: String },

    /// Execute a workflow against a run's evidence
    Run {
        workflow_id: String,
        #[arg(long)]
        run_id: String,
        /// Evidence reference, repeatable
        #[arg(long = "evidence")]
        evidence: Vec<String>,
    },
}

/// Execute a workflow command. A blocked run exits 3.
pub fn execute(
    command: WorkflowCommands,
    store: &RunStore,
    workflow_root: &Path,
    format: OutputFormat,
) -> CliResult<i32> {
    match command {
        WorkflowCommands::List => {
            let workflow_ids = list_workflows(workflow_root)?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "workflows": workflow_ids,
                }))?,
                OutputFormat::Text => {
                    for workflow_id in &workflow_ids {
                        println!("{workflow_id}");
                    }
                }
            }
            Ok(0)
        }
        WorkflowCommands::Show { workflow_id } => {
            let definition = load_workflow_definition(workflow_root, &workflow_id)?;
            match format {
                OutputFormat::Json => print_json(&definition)?,
                OutputFormat::Text => {
                    println!("workflow_id: {}", definition.workflow_id);
                    println!("name: {}", definition.name);
                    println!("version: {}", definition.version);
                    println!("step_count: {}", definition.steps.len());
                }
            }
            Ok(0)
        }
        WorkflowCommands::Run {
            workflow_id,
            run_id,
            evidence,
        } => {
            store.load_run(&run_id)?;
            let definition = load_workflow_definition(workflow_root, &workflow_id)?;
            let evidence_set: BTreeSet<String> = evidence.into_iter().collect();
            let workflow_run = run_workflow(&definition, &run_id, &evidence_set);
            let output_file = store.append_workflow_record(&run_id, &workflow_run)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "workflow_run": &workflow_run,
                    "output_file": output_file.display().to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("workflow_run_id: {}", workflow_run.workflow_run_id);
                    println!("workflow_id: {}", workflow_run.workflow_id);
                    println!("run_id: {}", workflow_run.run_id);
                    println!(
                        "status: {}",
                        match workflow_run.status {
                            RunStatus::Running => "running",
                            RunStatus::Success => "success",
                            RunStatus::Blocked => "blocked",
                        }
                    );
                    if workflow_run.blocked_reason.is_empty() {
                        println!("blocked_reason: -");
                    } else {
                        println!("blocked_reason: {}", workflow_run.blocked_reason);
                    }
                    println!("output_file: {}", output_file.display());
                }
            }

            if workflow_run.status == RunStatus::Blocked {
                Ok(3)
            } else {
                Ok(0)
            }
        }
    }
}
