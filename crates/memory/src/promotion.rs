//! Dual-gate promotion engine for candidate findings.
//!
//! Two independent gates: reproducibility (fixed floor of two observed
//! reproductions) and consensus (score against a configurable threshold).
//! Both must pass. Every attempt is recorded in the store's decision log,
//! approved or not, before any promotion side effect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::{MemoryRecord, MemoryStore, MemoryStoreError, MemoryTier};

/// The fixed reproducibility floor. Not configurable.
const REPRO_FLOOR: u32 = 2;

/// Default consensus threshold when the caller does not override it.
pub const DEFAULT_CONSENSUS_THRESHOLD: f64 = 0.7;

/// Per-gate pass/fail breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateChecks {
    pub repro_gate_passed: bool,
    pub consensus_gate_passed: bool,
}

/// Where an approved candidate goes; `Pending` means it stays put.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionTarget {
    Long,
    Pending,
}

/// Audit trail of one promotion attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PromotionDecision {
    pub decision_id: String,
    pub candidate_memory_id: String,
    pub run_id: String,
    pub repro_count: u32,
    pub consensus_score: f64,
    pub threshold: f64,
    pub approved: bool,
    pub promotion_target: PromotionTarget,
    pub gate_checks: GateChecks,
    pub reasons: Vec<String>,
    pub evidence_refs: Vec<String>,
    pub evaluated_at: DateTime<Utc>,
}

/// Evaluates and applies the dual gate.
#[derive(Clone, Copy, Debug)]
pub struct PromotionEngine {
    threshold: f64,
}

fn new_decision_id() -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    format!("decision-{hex}")
}

impl PromotionEngine {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    fn gate_checks(repro_count: u32, consensus_score: f64, threshold: f64) -> GateChecks {
        GateChecks {
            repro_gate_passed: repro_count >= REPRO_FLOOR,
            consensus_gate_passed: consensus_score >= threshold,
        }
    }

    /// Evaluate the gates without touching the store.
    ///
    /// `threshold` overrides the engine default for this call only.
    pub fn evaluate(
        &self,
        run_id: &str,
        candidate_memory_id: &str,
        repro_count: u32,
        consensus_score: f64,
        threshold: Option<f64>,
        evidence_refs: &[String],
    ) -> PromotionDecision {
        let threshold = threshold.unwrap_or(self.threshold);
        let checks = Self::gate_checks(repro_count, consensus_score, threshold);
        let approved = checks.repro_gate_passed && checks.consensus_gate_passed;

        let mut reasons = Vec::with_capacity(3);
        reasons.push(if checks.repro_gate_passed {
            "repro gate passed".to_string()
        } else {
            format!("repro gate failed: repro_count < {REPRO_FLOOR}")
        });
        reasons.push(if checks.consensus_gate_passed {
            "consensus gate passed".to_string()
        } else {
            "consensus gate failed: score below threshold".to_string()
        });
        reasons.push(if approved {
            "promotion approved".to_string()
        } else {
            "promotion pending".to_string()
        });

        PromotionDecision {
            decision_id: new_decision_id(),
            candidate_memory_id: candidate_memory_id.to_string(),
            run_id: run_id.to_string(),
            repro_count,
            consensus_score,
            threshold,
            approved,
            promotion_target: if approved {
                PromotionTarget::Long
            } else {
                PromotionTarget::Pending
            },
            gate_checks: checks,
            reasons,
            evidence_refs: evidence_refs.to_vec(),
            evaluated_at: Utc::now(),
        }
    }

    /// Evaluate against a store-resident candidate and apply on approval.
    ///
    /// The named record must currently be tier `candidate`. The decision is
    /// appended to the store's log regardless of outcome; promotion happens
    /// only when both gates pass.
    pub fn evaluate_and_apply(
        &self,
        store: &MemoryStore,
        candidate_memory_id: &str,
        repro_count: u32,
        consensus_score: f64,
        threshold: Option<f64>,
        evidence_refs: &[String],
    ) -> Result<(PromotionDecision, Option<MemoryRecord>), MemoryStoreError> {
        let candidate = store.get_record(candidate_memory_id)?;
        if candidate.memory_tier != MemoryTier::Candidate {
            return Err(MemoryStoreError::NotCandidate {
                memory_id: candidate.memory_id,
                tier: candidate.memory_tier,
            });
        }

        let decision = self.evaluate(
            store.run_id(),
            candidate_memory_id,
            repro_count,
            consensus_score,
            threshold,
            evidence_refs,
        );
        store.append_promotion_decision(&decision)?;

        if !decision.approved {
            tracing::info!(
                candidate = candidate_memory_id,
                repro_count,
                consensus_score,
                "Promotion withheld"
            );
            return Ok((decision, None));
        }

        let promoted = store.promote_candidate_to_long(candidate_memory_id)?;
        Ok((decision, Some(promoted)))
    }
}

impl Default for PromotionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_CONSENSUS_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn single_repro_is_rejected_despite_strong_consensus() {
        let engine = PromotionEngine::default();
        let decision = engine.evaluate("run-1", "mem-candidate-1", 1, 0.95, Some(0.7), &[]);

        assert!(!decision.approved);
        assert_eq!(decision.promotion_target, PromotionTarget::Pending);
        assert!(!decision.gate_checks.repro_gate_passed);
        assert!(decision.gate_checks.consensus_gate_passed);
        assert!(decision
            .reasons
            .contains(&"repro gate failed: repro_count < 2".to_string()));
        assert!(decision.reasons.contains(&"promotion pending".to_string()));
    }

    #[test]
    fn both_gates_passing_approves() {
        let engine = PromotionEngine::default();
        let decision = engine.evaluate("run-1", "mem-candidate-1", 2, 0.85, Some(0.7), &[]);

        assert!(decision.approved);
        assert_eq!(decision.promotion_target, PromotionTarget::Long);
        assert!(decision.reasons.contains(&"promotion approved".to_string()));
    }

    #[test]
    fn threshold_is_inclusive() {
        let engine = PromotionEngine::default();
        let decision = engine.evaluate("run-1", "mem-candidate-1", 3, 0.7, Some(0.7), &[]);
        assert!(decision.gate_checks.consensus_gate_passed);
    }

    #[test]
    fn weak_consensus_fails_its_gate() {
        let engine = PromotionEngine::default();
        let decision = engine.evaluate("run-1", "mem-candidate-1", 4, 0.5, None, &[]);

        assert!(!decision.approved);
        assert!(decision.gate_checks.repro_gate_passed);
        assert!(!decision.gate_checks.consensus_gate_passed);
        assert!(decision
            .reasons
            .contains(&"consensus gate failed: score below threshold".to_string()));
    }

    #[test]
    fn apply_promotes_only_on_approval_but_always_logs() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(dir.path(), "run-1").unwrap();
        let candidate = store
            .create_record(MemoryTier::Candidate, "finding", vec![], "")
            .unwrap();
        let engine = PromotionEngine::default();

        // Rejected attempt: decision logged, no long record.
        let (decision, promoted) = engine
            .evaluate_and_apply(&store, &candidate.memory_id, 1, 0.95, Some(0.7), &[])
            .unwrap();
        assert!(!decision.approved);
        assert!(promoted.is_none());
        assert!(store.list_records(Some(MemoryTier::Long)).unwrap().is_empty());

        // Approved attempt: long record exists with lineage.
        let (decision, promoted) = engine
            .evaluate_and_apply(&store, &candidate.memory_id, 2, 0.85, Some(0.7), &[])
            .unwrap();
        assert!(decision.approved);
        let promoted = promoted.unwrap();
        assert_eq!(promoted.memory_tier, MemoryTier::Long);
        assert_eq!(promoted.promoted_from, candidate.memory_id);

        // Both attempts are on the decision log.
        let log_path = dir
            .path()
            .join("run-1/index/memory-promotion-decisions.jsonl");
        let text = std::fs::read_to_string(log_path).unwrap();
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn apply_refuses_non_candidate_records() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::open(dir.path(), "run-1").unwrap();
        let record = store
            .create_record(MemoryTier::Raw, "raw finding", vec![], "")
            .unwrap();

        let err = PromotionEngine::default()
            .evaluate_and_apply(&store, &record.memory_id, 5, 0.99, None, &[])
            .unwrap_err();
        assert!(matches!(err, MemoryStoreError::NotCandidate { .. }));
    }
}
