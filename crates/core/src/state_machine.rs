//! Run phase bookkeeping — an append-only transition log.
//!
//! The machine records every phase change but never rejects one: callers
//! must be able to log `FAILED` and out-of-order phases without the machine
//! second-guessing them. Transition validity policy, if any, belongs to the
//! caller; this type is the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::phase::RunPhase;

/// A single recorded phase change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransitionAudit {
    pub from_phase: RunPhase,
    pub to_phase: RunPhase,
    /// Free-text context about why this transition happened.
    pub reason: String,
    pub at: DateTime<Utc>,
}

/// Serializable snapshot of a machine's phase and full audit history.
///
/// This is the persistence boundary: the run store serializes snapshots into
/// run metadata and restores machines from them on the next command.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub phase: RunPhase,
    pub audits: Vec<TransitionAudit>,
}

/// Append-only phase log for one debugging run.
#[derive(Clone, Debug)]
pub struct RunStateMachine {
    phase: RunPhase,
    audits: Vec<TransitionAudit>,
}

impl RunStateMachine {
    /// Create a machine at the initial `Bootstrap` phase with no history.
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Bootstrap,
            audits: Vec::new(),
        }
    }

    /// The current phase: the last audit's target, or `Bootstrap` if none.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// The full transition history, oldest first.
    pub fn audits(&self) -> &[TransitionAudit] {
        &self.audits
    }

    /// Record a transition and advance the current phase.
    ///
    /// Appends exactly one audit entry per call. Cannot fail: any phase may
    /// follow any phase.
    pub fn transition(&mut self, to_phase: RunPhase, reason: impl Into<String>) -> TransitionAudit {
        let audit = TransitionAudit {
            from_phase: self.phase,
            to_phase,
            reason: reason.into(),
            at: Utc::now(),
        };

        tracing::debug!(
            from = %audit.from_phase,
            to = %audit.to_phase,
            "Phase transition"
        );

        self.phase = to_phase;
        self.audits.push(audit.clone());
        audit
    }

    /// Capture the machine's state for persistence.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            phase: self.phase,
            audits: self.audits.clone(),
        }
    }

    /// Rebuild a machine from a previously captured snapshot.
    pub fn from_snapshot(snapshot: StateSnapshot) -> Self {
        Self {
            phase: snapshot.phase,
            audits: snapshot.audits,
        }
    }
}

impl Default for RunStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_bootstrap_with_empty_history() {
        let machine = RunStateMachine::new();
        assert_eq!(machine.phase(), RunPhase::Bootstrap);
        assert!(machine.audits().is_empty());
    }

    #[test]
    fn transition_appends_one_audit_and_advances() {
        let mut machine = RunStateMachine::new();
        let audit = machine.transition(RunPhase::TestLoop, "suite started");

        assert_eq!(audit.from_phase, RunPhase::Bootstrap);
        assert_eq!(audit.to_phase, RunPhase::TestLoop);
        assert_eq!(audit.reason, "suite started");
        assert_eq!(machine.phase(), RunPhase::TestLoop);
        assert_eq!(machine.audits().len(), 1);
    }

    #[test]
    fn any_phase_may_follow_any_phase() {
        // Deliberately out of order: the machine is an audit log, not a
        // guarded FSM, and callers rely on that.
        let mut machine = RunStateMachine::new();
        machine.transition(RunPhase::Report, "skip straight to report");
        machine.transition(RunPhase::Failed, "late failure");
        machine.transition(RunPhase::Bootstrap, "start over");

        assert_eq!(machine.phase(), RunPhase::Bootstrap);
        assert_eq!(machine.audits().len(), 3);
        assert_eq!(machine.audits()[1].from_phase, RunPhase::Report);
        assert_eq!(machine.audits()[1].to_phase, RunPhase::Failed);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut machine = RunStateMachine::new();
        machine.transition(RunPhase::Monitor, "watch serial console");
        machine.transition(RunPhase::Detect, "oops pattern seen");

        let json = serde_json::to_string(&machine.snapshot()).unwrap();
        let snapshot: StateSnapshot = serde_json::from_str(&json).unwrap();
        let restored = RunStateMachine::from_snapshot(snapshot);

        assert_eq!(restored.phase(), RunPhase::Detect);
        assert_eq!(restored.audits().len(), 2);
        assert_eq!(restored.audits()[0].reason, "watch serial console");
    }
}
