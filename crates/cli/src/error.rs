//! CLI error types.
//!
//! Every variant maps to exit code 2 (user/validation error). Expected
//! negative outcomes — blocked workflows, vetoed consensus, roundtrip
//! mismatches — are not errors; commands report those as data and exit 3.

use thiserror::Error;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    RunStore(#[from] faultline_store::RunStoreError),

    #[error("{0}")]
    Workflow(#[from] faultline_workflow::WorkflowError),

    #[error("{0}")]
    Memory(#[from] faultline_memory::MemoryStoreError),

    #[error("{0}")]
    Dispatch(#[from] faultline_core::DispatchError),

    #[error("{0}")]
    Boundary(#[from] faultline_core::BoundaryViolation),

    #[error("{0}")]
    Event(#[from] faultline_core::EventError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Registry(#[from] crate::registry::ToolRegistryError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
