//! Memory tier commands.

use clap::Subcommand;

use faultline_core::BoundaryGuard;
use faultline_memory::{MemoryStore, MemoryTier, PromotionEngine};
use faultline_store::RunStore;

use crate::error::CliResult;
use crate::output::{print_json, OutputFormat};

/// Memory subcommands.
#[derive(Subcommand)]
pub enum MemoryCommands {
    /// Add a finding to a memory tier
    ///
    /// The long tier is not writable here; long records only come from
    /// `memory promote`.
    Add {
        #[arg(long)]
        run_id: String,
        /// Memory tier (raw, working, candidate)
        #[arg(long)]
        tier: MemoryTier,
        #[arg(long)]
        content: String,
        /// Evidence reference, repeatable
        #[arg(long = "evidence")]
        evidence: Vec<String>,
    },

    /// List memory records
    List {
        #[arg(long)]
        run_id: String,
        /// Restrict to one tier
        #[arg(long)]
        tier: Option<MemoryTier>,
    },

    /// Gate-check a candidate and promote it on approval
    Promote {
        #[arg(long)]
        run_id: String,
        #[arg(long)]
        candidate_id: String,
        #[arg(long)]
        repro_count: u32,
        #[arg(long)]
        consensus_score: f64,
        /// Consensus gate threshold (default 0.7)
        #[arg(long)]
        threshold: Option<f64>,
        /// Evidence reference, repeatable
        #[arg(long = "evidence")]
        evidence: Vec<String>,
    },
}

/// Execute a memory command. A withheld promotion exits 3.
pub fn execute(command: MemoryCommands, store: &RunStore, format: OutputFormat) -> CliResult<i32> {
    match command {
        MemoryCommands::Add {
            run_id,
            tier,
            content,
            evidence,
        } => {
            store.load_run(&run_id)?;
            if tier == MemoryTier::Long {
                BoundaryGuard::new().assert_write_allowed("memory.long")?;
            }
            let memory_store = MemoryStore::open(store.run_root(), &run_id)?;
            let record = memory_store.create_record(tier, content, evidence, "")?;

            match format {
                OutputFormat::Json => print_json(&record)?,
                OutputFormat::Text => {
                    println!("memory_id: {}", record.memory_id);
                    println!("memory_tier: {}", record.memory_tier);
                    println!("content: {}", record.content);
                }
            }
            Ok(0)
        }
        MemoryCommands::List { run_id, tier } => {
            store.load_run(&run_id)?;
            let memory_store = MemoryStore::open(store.run_root(), &run_id)?;
            let records = memory_store.list_records(tier)?;

            match format {
                OutputFormat::Json => print_json(&records)?,
                OutputFormat::Text => {
                    for record in &records {
                        println!(
                            "{}\t{}\t{}",
                            record.memory_id, record.memory_tier, record.content
                        );
                    }
                }
            }
            Ok(0)
        }
        MemoryCommands::Promote {
            run_id,
            candidate_id,
            repro_count,
            consensus_score,
            threshold,
            evidence,
        } => {
            store.load_run(&run_id)?;
            let memory_store = MemoryStore::open(store.run_root(), &run_id)?;
            let engine = PromotionEngine::default();
            let (decision, promoted) = engine.evaluate_and_apply(
                &memory_store,
                &candidate_id,
                repro_count,
                consensus_score,
                threshold,
                &evidence,
            )?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "decision": &decision,
                    "promoted": &promoted,
                }))?,
                OutputFormat::Text => {
                    println!("decision_id: {}", decision.decision_id);
                    println!("approved: {}", decision.approved);
                    for reason in &decision.reasons {
                        println!("reason: {reason}");
                    }
                    match &promoted {
                        Some(record) => println!("promoted: {}", record.memory_id),
                        None => println!("promoted: -"),
                    }
                }
            }

            if decision.approved {
                Ok(0)
            } else {
                Ok(3)
            }
        }
    }
}
