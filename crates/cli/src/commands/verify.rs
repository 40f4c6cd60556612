//! Verification commands — compression over a run's raw event log.

use std::fs;

use clap::Subcommand;
use serde::Serialize;

use faultline_memory::{CompressionCodec, CompressionPayload};
use faultline_store::RunStore;

use crate::error::{CliError, CliResult};
use crate::output::{print_json, OutputFormat};

/// Verification subcommands.
#[derive(Subcommand)]
pub enum VerifyCommands {
    /// Compress the run's event log and optionally verify the roundtrip
    Compression {
        #[arg(long)]
        run_id: String,
        /// Decompress and compare against the original lines
        #[arg(long)]
        roundtrip: bool,
    },
}

/// The persisted compression artifact: the payload plus the outer
/// roundtrip verdict.
#[derive(Serialize)]
struct CompressionArtifact {
    #[serde(flatten)]
    payload: CompressionPayload,
    roundtrip_ok: bool,
}

/// Execute a verification command. A roundtrip mismatch exits 3.
pub fn execute(command: VerifyCommands, store: &RunStore, format: OutputFormat) -> CliResult<i32> {
    match command {
        VerifyCommands::Compression { run_id, roundtrip } => {
            store.load_run(&run_id)?;

            let events_file = store.events_path(&run_id);
            if !events_file.exists() {
                return Err(CliError::InvalidArgument(format!(
                    "events file not found: {}",
                    events_file.display()
                )));
            }
            let raw_lines: Vec<String> = fs::read_to_string(&events_file)?
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();

            let codec = CompressionCodec::new();
            let payload = codec.compress(&run_id, &raw_lines);
            let roundtrip_ok = if roundtrip {
                CompressionCodec::decompress(&payload) == raw_lines
            } else {
                true
            };

            let artifact = CompressionArtifact {
                payload,
                roundtrip_ok,
            };
            let output_file = store
                .run_root()
                .join(&run_id)
                .join("index")
                .join("compression.json");
            if let Some(parent) = output_file.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&output_file, serde_json::to_string_pretty(&artifact)?)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "compression": artifact,
                    "output_file": output_file.display().to_string(),
                }))?,
                OutputFormat::Text => {
                    println!("run_id: {run_id}");
                    println!("raw_count: {}", raw_lines.len());
                    println!("roundtrip_ok: {roundtrip_ok}");
                    println!("output_file: {}", output_file.display());
                }
            }

            if roundtrip && !roundtrip_ok {
                Ok(3)
            } else {
                Ok(0)
            }
        }
    }
}
