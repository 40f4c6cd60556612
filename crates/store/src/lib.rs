//! Run persistence for faultline debugging runs.
//!
//! The core engines are I/O-free; this crate is the collaborator that loads
//! their inputs and persists their outputs. Per-run layout under the run
//! root:
//!
//! ```text
//! <run_root>/<run_id>/
//!   index/run.json                  run metadata + state machine snapshot
//!   index/consensus.json            consensus record log (JSON array)
//!   assets/events.raw.jsonl         newline-delimited run events
//!   workflows/<stamp>-<id>.json     one file per workflow run
//! ```
//!
//! The memory tier layout under the same run directory is owned by
//! `faultline-memory`.

pub mod report;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use faultline_core::{
    ConsensusRecord, EventBus, EventError, EventSchema, RunPhase, RunStateMachine, StateSnapshot,
};
use faultline_workflow::WorkflowRun;

pub use report::{
    build_evidence_bundle, build_patch_proposal, write_evidence_bundle, write_patch_proposal,
    EvidenceBundle, PatchProposal, ProposalStatus, RiskLevel,
};

/// Errors from run persistence.
#[derive(Error, Debug)]
pub enum RunStoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("run already exists: {0}")]
    AlreadyExists(String),

    #[error("run not found: {0}")]
    NotFound(String),

    #[error("event rejected: {0}")]
    Event(#[from] EventError),
}

/// Persistent metadata for one run, including the state machine snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunMeta {
    pub run_id: String,
    pub project_name: String,
    pub target_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub state: RunPhase,
    pub trigger: String,
    #[serde(default)]
    pub summary_note: String,
    pub core_state: StateSnapshot,
}

/// File-backed store for run metadata, events, and decision records.
#[derive(Clone, Debug)]
pub struct RunStore {
    run_root: PathBuf,
    schema: EventSchema,
}

/// Conventional run root under a base directory.
pub fn default_run_root(base: &Path) -> PathBuf {
    base.join("tmp").join("runs")
}

fn run_id_now() -> String {
    Utc::now().format("run-%Y%m%d-%H%M%S").to_string()
}

fn now_ns() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

fn write_pretty(path: &Path, value: &impl Serialize) -> Result<(), RunStoreError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

impl RunStore {
    /// A store over `run_root` with the built-in event schema.
    pub fn new(run_root: impl Into<PathBuf>) -> Self {
        Self::with_schema(run_root, EventSchema::builtin())
    }

    /// A store with a collaborator-supplied event schema.
    pub fn with_schema(run_root: impl Into<PathBuf>, schema: EventSchema) -> Self {
        Self {
            run_root: run_root.into(),
            schema,
        }
    }

    pub fn run_root(&self) -> &Path {
        &self.run_root
    }

    fn run_dir(&self, run_id: &str) -> PathBuf {
        self.run_root.join(run_id)
    }

    fn run_meta_path(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join("index").join("run.json")
    }

    /// Path of the raw event log for a run.
    pub fn events_path(&self, run_id: &str) -> PathBuf {
        self.run_dir(run_id).join("assets").join("events.raw.jsonl")
    }

    fn ensure_layout(&self, run_id: &str) -> Result<PathBuf, RunStoreError> {
        let run_dir = self.run_dir(run_id);
        fs::create_dir_all(run_dir.join("index"))?;
        fs::create_dir_all(run_dir.join("assets"))?;
        fs::create_dir_all(run_dir.join("workflows"))?;
        Ok(run_dir)
    }

    /// Validate an event against the schema and append it to the run's log.
    ///
    /// Validation goes through a transient [`EventBus`], the only sanctioned
    /// channel into the event log.
    fn publish_event(&self, run_id: &str, event: Value) -> Result<(), RunStoreError> {
        let mut bus = EventBus::new(self.schema.clone());
        bus.publish(event.clone())?;
        let path = self.events_path(run_id);
        let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", serde_json::to_string(&event)?)?;
        Ok(())
    }

    /// Create a new run. The id defaults to a timestamp form
    /// (`run-%Y%m%d-%H%M%S`); an existing id is a conflict.
    pub fn create_run(
        &self,
        project_name: &str,
        target_id: &str,
        run_id: Option<String>,
        trigger: &str,
    ) -> Result<RunMeta, RunStoreError> {
        let run_id = run_id.filter(|id| !id.is_empty()).unwrap_or_else(run_id_now);
        let run_dir = self.ensure_layout(&run_id)?;
        let meta_path = self.run_meta_path(&run_id);
        if meta_path.exists() {
            return Err(RunStoreError::AlreadyExists(run_id));
        }

        let machine = RunStateMachine::new();
        let meta = RunMeta {
            run_id: run_id.clone(),
            project_name: project_name.to_string(),
            target_id: target_id.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            state: machine.phase(),
            trigger: trigger.to_string(),
            summary_note: String::new(),
            core_state: machine.snapshot(),
        };
        write_pretty(&meta_path, &meta)?;

        self.publish_event(
            &run_id,
            json!({
                "event_id": format!("{run_id}-e1"),
                "run_id": run_id,
                "ts_ns": now_ns(),
                "phase": machine.phase(),
                "source": "host",
                "tool": "fldbg.run",
                "target_id": target_id,
                "severity": "info",
                "payload": {
                    "action": "run.start",
                    "project_name": project_name,
                    "run_dir": run_dir.display().to_string(),
                },
            }),
        )?;

        tracing::info!(run_id = %meta.run_id, project = project_name, "Run created");
        Ok(meta)
    }

    pub fn load_run(&self, run_id: &str) -> Result<RunMeta, RunStoreError> {
        let path = self.run_meta_path(run_id);
        if !path.exists() {
            return Err(RunStoreError::NotFound(run_id.to_string()));
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }

    pub fn save_run(&self, meta: &RunMeta) -> Result<(), RunStoreError> {
        if meta.run_id.is_empty() {
            return Err(RunStoreError::NotFound("<empty run_id>".to_string()));
        }
        self.ensure_layout(&meta.run_id)?;
        write_pretty(&self.run_meta_path(&meta.run_id), meta)
    }

    /// Count non-blank lines in the run's event log.
    pub fn run_event_count(&self, run_id: &str) -> Result<usize, RunStoreError> {
        let path = self.events_path(run_id);
        if !path.exists() {
            return Ok(0);
        }
        let text = fs::read_to_string(path)?;
        Ok(text.lines().filter(|line| !line.trim().is_empty()).count())
    }

    /// Advance a run's phase through the snapshot boundary and persist.
    ///
    /// Entering `REPORT` stamps `finished_at` once. Every transition also
    /// lands on the event log.
    pub fn transition_run(
        &self,
        run_id: &str,
        to_phase: RunPhase,
        reason: &str,
    ) -> Result<RunMeta, RunStoreError> {
        let mut meta = self.load_run(run_id)?;
        let mut machine = RunStateMachine::from_snapshot(meta.core_state.clone());
        let audit = machine.transition(to_phase, reason);
        meta.state = machine.phase();
        meta.core_state = machine.snapshot();
        if to_phase == RunPhase::Report && meta.finished_at.is_none() {
            meta.finished_at = Some(Utc::now());
        }
        self.save_run(&meta)?;

        let event_number = self.run_event_count(run_id)? + 1;
        self.publish_event(
            run_id,
            json!({
                "event_id": format!("{run_id}-e{event_number}"),
                "run_id": run_id,
                "ts_ns": now_ns(),
                "phase": machine.phase(),
                "source": "host",
                "tool": "fldbg.run",
                "target_id": meta.target_id,
                "severity": "info",
                "payload": {
                    "action": "run.transition",
                    "from_phase": audit.from_phase,
                    "to_phase": audit.to_phase,
                    "reason": reason,
                },
            }),
        )?;
        Ok(meta)
    }

    /// Persist one completed workflow run under `workflows/`.
    pub fn append_workflow_record(
        &self,
        run_id: &str,
        workflow_run: &WorkflowRun,
    ) -> Result<PathBuf, RunStoreError> {
        let run_dir = self.ensure_layout(run_id)?;
        let token: String = workflow_run
            .started_at
            .to_rfc3339()
            .chars()
            .filter(|c| !matches!(c, ':' | '-' | '.'))
            .collect();
        let output = run_dir
            .join("workflows")
            .join(format!("{token}-{}.json", workflow_run.workflow_id));
        write_pretty(&output, workflow_run)?;
        Ok(output)
    }

    /// Append one consensus record to the per-run consensus log.
    pub fn append_consensus_record(
        &self,
        run_id: &str,
        record: &ConsensusRecord,
    ) -> Result<PathBuf, RunStoreError> {
        let run_dir = self.ensure_layout(run_id)?;
        let output = run_dir.join("index").join("consensus.json");
        let mut records: Vec<ConsensusRecord> = if output.exists() {
            serde_json::from_str(&fs::read_to_string(&output)?)?
        } else {
            Vec::new()
        };
        records.push(record.clone());
        write_pretty(&output, &records)?;
        Ok(output)
    }

    /// The per-run consensus log, oldest first.
    pub fn read_consensus_records(
        &self,
        run_id: &str,
    ) -> Result<Vec<ConsensusRecord>, RunStoreError> {
        let path = self.run_dir(run_id).join("index").join("consensus.json");
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    }
}
