//! Report and patch-proposal commands.

use clap::Subcommand;

use faultline_store::{
    build_evidence_bundle, build_patch_proposal, write_evidence_bundle, write_patch_proposal,
    ProposalStatus, RunStore,
};

use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};

/// Report subcommands.
#[derive(Subcommand)]
pub enum ReportCommands {
    /// Generate the run's evidence bundle
    EvidenceBundle {
        #[arg(long)]
        run_id: String,
    },
}

/// Patch subcommands.
#[derive(Subcommand)]
pub enum PatchCommands {
    /// Derive a patch proposal from the consensus log
    Suggest {
        #[arg(long)]
        run_id: String,
    },
}

/// Execute a report command.
pub fn execute_report(
    command: ReportCommands,
    store: &RunStore,
    format: OutputFormat,
) -> CliResult<i32> {
    match command {
        ReportCommands::EvidenceBundle { run_id } => {
            store.load_run(&run_id)?;
            let bundle = build_evidence_bundle(store, &run_id)?;
            let output_file = write_evidence_bundle(store, &run_id, &bundle)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "evidence_bundle": bundle,
                    "output_file": output_file.display().to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("run_id: {run_id}");
                    println!("event_count: {}", bundle.event_count);
                    println!("auto_merge: {}", bundle.auto_merge);
                    println!("output_file: {}", output_file.display());
                }
            }
            Ok(0)
        }
    }
}

/// Execute a patch command.
pub fn execute_patch(
    command: PatchCommands,
    store: &RunStore,
    format: OutputFormat,
) -> CliResult<i32> {
    match command {
        PatchCommands::Suggest { run_id } => {
            store.load_run(&run_id)?;
            let proposal = build_patch_proposal(store, &run_id)?;
            let output_file = write_patch_proposal(store, &run_id, &proposal)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "patch_proposal": proposal,
                    "output_file": output_file.display().to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("run_id: {run_id}");
                    println!(
                        "status: {}",
                        match proposal.status {
                            ProposalStatus::Ready => "ready",
                            ProposalStatus::Blocked => "blocked",
                        }
                    );
                    println!("auto_merge: {}", proposal.auto_merge);
                    println!("output_file: {}", output_file.display());
                }
            }
            Ok(0)
        }
    }
}
