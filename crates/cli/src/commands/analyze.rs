//! Analysis commands — consensus over the registered agents.

use std::collections::BTreeSet;

use clap::Subcommand;

use faultline_core::{AgentContext, AgentDispatcher, ConsensusEngine};
use faultline_store::RunStore;

use crate::agents::register_mock_agents;
use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};

/// Analysis subcommands.
#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Run a consensus round over the registered agents
    Consensus {
        #[arg(long)]
        run_id: String,
        #[arg(long, default_value = "root-cause")]
        topic: String,
        /// Comma-separated agent ids
        #[arg(long, default_value = "codex,copilot,gemini")]
        agents: String,
        /// Required evidence reference, repeatable
        #[arg(long = "required-evidence", default_value = "trace.captured")]
        required_evidence: Vec<String>,
    },
}

/// Execute an analysis command. A vetoed consensus exits 3.
pub fn execute(command: AnalyzeCommands, store: &RunStore, format: OutputFormat) -> CliResult<i32> {
    match command {
        AnalyzeCommands::Consensus {
            run_id,
            topic,
            agents,
            required_evidence,
        } => {
            store.load_run(&run_id)?;

            let mut dispatcher = AgentDispatcher::new();
            register_mock_agents(&mut dispatcher)?;
            let agent_ids: Vec<String> = agents
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect();
            let context = AgentContext {
                run_id: run_id.clone(),
                topic: topic.clone(),
            };
            let reports = dispatcher.dispatch(&agent_ids, &context)?;

            let required: BTreeSet<String> = required_evidence.into_iter().collect();
            let record = ConsensusEngine::new().evaluate(&run_id, &topic, &reports, &required);
            let output_file = store.append_consensus_record(&run_id, &record)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "consensus": &record,
                    "output_file": output_file.display().to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("run_id: {run_id}");
                    println!("topic: {topic}");
                    println!("vetoed: {}", record.vetoed);
                    if record.winning_claim.is_empty() {
                        println!("winning_claim: -");
                    } else {
                        println!("winning_claim: {}", record.winning_claim);
                    }
                    println!("output_file: {}", output_file.display());
                }
            }

            if record.vetoed {
                Ok(3)
            } else {
                Ok(0)
            }
        }
    }
}
