//! Consensus engine — reconciles independent agent hypotheses into one
//! decision, gated on evidence sufficiency.
//!
//! Scoring is additive: agents asserting the same claim text pool their
//! confidences, so repeated agreement amplifies a claim rather than
//! averaging it down. Ties between claims keep first-seen order, which is a
//! contract (the grouping is insertion-ordered, not hashed).

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::veto::VetoGate;

/// One agent's normalized claim about the fault under analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AgentReport {
    pub agent_id: String,
    pub claim: String,
    /// Expected in 0..=1 but not enforced; the engine sums whatever it gets.
    pub confidence: f64,
    pub evidence_refs: Vec<String>,
}

/// Structured veto reason carried on a vetoed consensus record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VetoReason {
    pub code: String,
    pub message: String,
    pub required_evidence: Vec<String>,
}

/// A losing claim with its aggregate score and pooled evidence.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DissentingClaim {
    pub claim: String,
    pub score: f64,
    pub evidence_refs: Vec<String>,
}

/// Outcome of one consensus evaluation, appended to the per-run log.
///
/// `winning_claim` is empty exactly when `vetoed` is true.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub consensus_id: String,
    pub run_id: String,
    pub topic: String,
    pub winning_claim: String,
    pub weighted_score: f64,
    pub evidence_refs: Vec<String>,
    pub dissenting_claims: Vec<DissentingClaim>,
    pub vetoed: bool,
    pub veto_reasons: Vec<VetoReason>,
    pub evaluated_at: DateTime<Utc>,
}

/// Reconciles agent reports into a single `ConsensusRecord`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConsensusEngine {
    veto_gate: VetoGate,
}

fn new_consensus_id() -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    format!("consensus-{hex}")
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self {
            veto_gate: VetoGate::new(),
        }
    }

    /// Evaluate one round of agent reports on a topic.
    ///
    /// Delegates to the veto gate first; a vetoed round returns a record
    /// with an empty winning claim and zero score, and no scoring happens.
    /// An empty report list is a caller bug, not a recoverable condition.
    pub fn evaluate(
        &self,
        run_id: &str,
        topic: &str,
        reports: &[AgentReport],
        required_evidence: &BTreeSet<String>,
    ) -> ConsensusRecord {
        assert!(
            !reports.is_empty(),
            "consensus evaluation requires at least one agent report"
        );

        let available_evidence: BTreeSet<String> = reports
            .iter()
            .flat_map(|report| report.evidence_refs.iter().cloned())
            .collect();

        let veto = self
            .veto_gate
            .evaluate(required_evidence, &available_evidence);

        let mut record = ConsensusRecord {
            consensus_id: new_consensus_id(),
            run_id: run_id.to_string(),
            topic: topic.to_string(),
            winning_claim: String::new(),
            weighted_score: 0.0,
            evidence_refs: available_evidence.iter().cloned().collect(),
            dissenting_claims: Vec::new(),
            vetoed: veto.vetoed,
            veto_reasons: Vec::new(),
            evaluated_at: Utc::now(),
        };

        if veto.vetoed {
            let required: Vec<String> = required_evidence.iter().cloned().collect();
            record.veto_reasons = veto
                .reasons
                .into_iter()
                .map(|message| VetoReason {
                    code: "missing-evidence".to_string(),
                    message,
                    required_evidence: required.clone(),
                })
                .collect();

            tracing::warn!(
                run_id,
                topic,
                reasons = record.veto_reasons.len(),
                "Consensus vetoed on insufficient evidence"
            );
            return record;
        }

        // Group by exact claim text, preserving first-seen order. A linear
        // scan keeps the tie-break contract without hashing away insertion
        // order; rounds have a handful of agents at most.
        struct ClaimGroup {
            claim: String,
            score: f64,
            evidence: BTreeSet<String>,
        }

        let mut groups: Vec<ClaimGroup> = Vec::new();
        for report in reports {
            match groups.iter_mut().find(|g| g.claim == report.claim) {
                Some(group) => {
                    group.score += report.confidence;
                    group.evidence.extend(report.evidence_refs.iter().cloned());
                }
                None => groups.push(ClaimGroup {
                    claim: report.claim.clone(),
                    score: report.confidence,
                    evidence: report.evidence_refs.iter().cloned().collect(),
                }),
            }
        }

        // Stable sort: equal scores keep first-seen claim order.
        groups.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

        let winner = &groups[0];
        record.winning_claim = winner.claim.clone();
        record.weighted_score = winner.score;
        record.dissenting_claims = groups[1..]
            .iter()
            .map(|group| DissentingClaim {
                claim: group.claim.clone(),
                score: group.score,
                evidence_refs: group.evidence.iter().cloned().collect(),
            })
            .collect();

        tracing::info!(
            run_id,
            topic,
            winning_claim = %record.winning_claim,
            weighted_score = record.weighted_score,
            dissenting = record.dissenting_claims.len(),
            "Consensus reached"
        );

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(agent_id: &str, claim: &str, confidence: f64, refs: &[&str]) -> AgentReport {
        AgentReport {
            agent_id: agent_id.to_string(),
            claim: claim.to_string(),
            confidence,
            evidence_refs: refs.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn required(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn agreement_amplifies_the_winning_score() {
        let engine = ConsensusEngine::new();
        let reports = vec![
            report("codex", "stack overflow in parser", 0.6, &["trace.captured"]),
            report("copilot", "stack overflow in parser", 0.3, &["symbol.mapped"]),
            report("gemini", "heap corruption", 0.7, &["trace.captured"]),
        ];

        let record = engine.evaluate("run-1", "root-cause", &reports, &required(&[]));

        assert!(!record.vetoed);
        assert_eq!(record.winning_claim, "stack overflow in parser");
        assert!((record.weighted_score - 0.9).abs() < 1e-9);
        assert_eq!(record.dissenting_claims.len(), 1);
        assert_eq!(record.dissenting_claims[0].claim, "heap corruption");
        // Winner's evidence pools across its agents.
        assert_eq!(
            record.evidence_refs,
            vec!["symbol.mapped", "trace.captured"]
        );
    }

    #[test]
    fn veto_bypasses_scoring_entirely() {
        let engine = ConsensusEngine::new();
        let reports = vec![report("codex", "anything", 0.99, &["symbol.mapped"])];

        let record = engine.evaluate(
            "run-1",
            "root-cause",
            &reports,
            &required(&["trace.captured"]),
        );

        assert!(record.vetoed);
        assert_eq!(record.winning_claim, "");
        assert_eq!(record.weighted_score, 0.0);
        assert!(record.dissenting_claims.is_empty());
        assert_eq!(record.veto_reasons.len(), 1);
        assert_eq!(record.veto_reasons[0].code, "missing-evidence");
        assert_eq!(
            record.veto_reasons[0].message,
            "missing evidence: trace.captured"
        );
    }

    #[test]
    fn score_ties_keep_first_seen_claim_order() {
        let engine = ConsensusEngine::new();
        let reports = vec![
            report("a1", "claim one", 0.5, &[]),
            report("a2", "claim two", 0.5, &[]),
        ];

        let record = engine.evaluate("run-1", "root-cause", &reports, &required(&[]));

        assert_eq!(record.winning_claim, "claim one");
        assert_eq!(record.dissenting_claims[0].claim, "claim two");
    }

    #[test]
    fn dissenting_claims_are_sorted_by_descending_score() {
        let engine = ConsensusEngine::new();
        let reports = vec![
            report("a1", "weak", 0.1, &[]),
            report("a2", "strong", 0.9, &[]),
            report("a3", "middle", 0.5, &[]),
        ];

        let record = engine.evaluate("run-1", "root-cause", &reports, &required(&[]));

        assert_eq!(record.winning_claim, "strong");
        let order: Vec<&str> = record
            .dissenting_claims
            .iter()
            .map(|d| d.claim.as_str())
            .collect();
        assert_eq!(order, vec!["middle", "weak"]);
    }

    #[test]
    fn identical_inputs_yield_identical_decisions() {
        let engine = ConsensusEngine::new();
        let reports = vec![
            report("codex", "stack overflow in parser", 0.6, &["trace.captured"]),
            report("gemini", "heap corruption", 0.7, &["trace.captured"]),
        ];
        let needed = required(&["trace.captured"]);

        let first = engine.evaluate("run-1", "root-cause", &reports, &needed);
        let second = engine.evaluate("run-1", "root-cause", &reports, &needed);

        assert_eq!(first.winning_claim, second.winning_claim);
        assert_eq!(first.weighted_score, second.weighted_score);
        assert_eq!(first.evidence_refs, second.evidence_refs);
        assert_eq!(first.vetoed, second.vetoed);
    }

    #[test]
    #[should_panic(expected = "at least one agent report")]
    fn empty_report_list_is_a_caller_bug() {
        ConsensusEngine::new().evaluate("run-1", "root-cause", &[], &required(&[]));
    }
}
