//! Faultline CLI — terminal interface to the debugging orchestration kit.
//!
//! Command areas:
//! - `run`: run lifecycle (start, status, transition, stop)
//! - `workflow`: list/show/run declarative workflows
//! - `analyze`: consensus rounds over the registered agents
//! - `verify`: compression of the run's event log
//! - `memory`: tiered findings memory and promotion
//! - `report` / `patch`: evidence bundle and patch proposal
//! - `tools`: external tool catalog
//!
//! Exit codes: 0 success, 2 user/validation error, 3 a well-formed blocked
//! or vetoed outcome (blocked workflow, vetoed consensus, failed roundtrip,
//! withheld promotion).

use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod agents;
mod commands;
mod error;
mod output;
mod registry;

use commands::{analyze, memory, report, run as run_cmd, tools, verify, workflow};
use faultline_core::EventSchema;
use faultline_store::{default_run_root, RunStore};
pub use error::{CliError, CliResult};

/// Faultline CLI application.
#[derive(Parser)]
#[command(name = "faultline")]
#[command(about = "Faultline - automated debugging orchestration", long_about = None)]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: output::OutputFormat,

    /// Root directory for run storage (default: ./tmp/runs)
    #[arg(long, global = true)]
    run_root: Option<PathBuf>,

    /// Directory of workflow definition files
    #[arg(long, global = true, default_value = "workflows")]
    workflow_root: PathBuf,

    /// Event schema file (default: the built-in schema)
    #[arg(long, global = true)]
    event_schema: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run lifecycle
    Run {
        #[command(subcommand)]
        command: run_cmd::RunCommands,
    },

    /// Workflow control
    Workflow {
        #[command(subcommand)]
        command: workflow::WorkflowCommands,
    },

    /// Analysis commands
    Analyze {
        #[command(subcommand)]
        command: analyze::AnalyzeCommands,
    },

    /// Verification commands
    Verify {
        #[command(subcommand)]
        command: verify::VerifyCommands,
    },

    /// Memory tiers
    Memory {
        #[command(subcommand)]
        command: memory::MemoryCommands,
    },

    /// Report generation
    Report {
        #[command(subcommand)]
        command: report::ReportCommands,
    },

    /// Patch proposal
    Patch {
        #[command(subcommand)]
        command: report::PatchCommands,
    },

    /// Tool catalog
    Tools {
        #[command(subcommand)]
        command: tools::ToolsCommands,
    },
}

/// Run using the current process arguments; returns the process exit code.
pub fn run() -> i32 {
    run_with_args(std::env::args_os())
}

/// Run using the provided argument iterator; returns the process exit code.
pub fn run_with_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::parse_from(args);

    let filter = if cli.verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).without_time())
        .try_init();

    match dispatch(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err}");
            2
        }
    }
}

fn dispatch(cli: Cli) -> CliResult<i32> {
    let run_root = match cli.run_root {
        Some(path) => path,
        None => default_run_root(&std::env::current_dir()?),
    };
    fs::create_dir_all(&run_root)?;

    let schema = match &cli.event_schema {
        Some(path) => {
            let document: serde_json::Value = serde_json::from_str(&fs::read_to_string(path)?)?;
            EventSchema::from_json(&document)?
        }
        None => EventSchema::builtin(),
    };
    let store = RunStore::with_schema(run_root, schema);

    match cli.command {
        Commands::Run { command } => run_cmd::execute(command, &store, cli.format),
        Commands::Workflow { command } => {
            workflow::execute(command, &store, &cli.workflow_root, cli.format)
        }
        Commands::Analyze { command } => analyze::execute(command, &store, cli.format),
        Commands::Verify { command } => verify::execute(command, &store, cli.format),
        Commands::Memory { command } => memory::execute(command, &store, cli.format),
        Commands::Report { command } => report::execute_report(command, &store, cli.format),
        Commands::Patch { command } => report::execute_patch(command, &store, cli.format),
        Commands::Tools { command } => {
            let registry = registry::build_default_registry();
            tools::execute(command, &registry, cli.format)
        }
    }
}
