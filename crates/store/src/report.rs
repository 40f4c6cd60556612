//! Report builders: the evidence bundle and the patch proposal.
//!
//! Both are derived views over a run's persisted records. Neither is ever
//! auto-merged — `merge_policy` is pinned to manual review.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use faultline_core::RunPhase;

use crate::{RunStore, RunStoreError};

const MERGE_POLICY: &str = "manual-review-only";

/// Summary of everything a run has produced so far.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvidenceBundle {
    pub bundle_id: String,
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub project_name: String,
    pub target_id: String,
    pub state: RunPhase,
    pub event_count: usize,
    /// Filenames of persisted workflow runs, sorted.
    pub workflow_runs: Vec<String>,
    pub consensus_count: usize,
    pub auto_merge: bool,
    pub merge_policy: String,
}

/// Whether a proposal is actionable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Ready,
    Blocked,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A fix proposal derived from the latest non-vetoed consensus.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PatchProposal {
    pub proposal_id: String,
    pub run_id: String,
    pub summary: String,
    pub diff_preview: String,
    pub related_consensus: String,
    pub risk_level: RiskLevel,
    pub evidence_min_set: Vec<String>,
    pub merge_policy: String,
    pub auto_merge: bool,
    pub status: ProposalStatus,
    pub generated_at: DateTime<Utc>,
}

fn new_proposal_id() -> String {
    let mut hex = uuid::Uuid::new_v4().simple().to_string();
    hex.truncate(12);
    format!("proposal-{hex}")
}

/// Collect a run's persisted state into an evidence bundle.
pub fn build_evidence_bundle(
    store: &RunStore,
    run_id: &str,
) -> Result<EvidenceBundle, RunStoreError> {
    let meta = store.load_run(run_id)?;

    let workflow_dir = store.run_root().join(run_id).join("workflows");
    let mut workflow_runs: Vec<String> = if workflow_dir.exists() {
        fs::read_dir(&workflow_dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.ends_with(".json"))
            .collect()
    } else {
        Vec::new()
    };
    workflow_runs.sort();

    Ok(EvidenceBundle {
        bundle_id: format!("bundle-{run_id}"),
        run_id: run_id.to_string(),
        generated_at: Utc::now(),
        project_name: meta.project_name,
        target_id: meta.target_id,
        state: meta.state,
        event_count: store.run_event_count(run_id)?,
        workflow_runs,
        consensus_count: store.read_consensus_records(run_id)?.len(),
        auto_merge: false,
        merge_policy: MERGE_POLICY.to_string(),
    })
}

pub fn write_evidence_bundle(
    store: &RunStore,
    run_id: &str,
    bundle: &EvidenceBundle,
) -> Result<PathBuf, RunStoreError> {
    let output = store
        .run_root()
        .join(run_id)
        .join("index")
        .join("evidence-bundle.json");
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_string_pretty(bundle)?)?;
    Ok(output)
}

/// Derive a patch proposal from the latest non-vetoed consensus record.
///
/// With no usable consensus the proposal is blocked at high risk with an
/// empty evidence set; it never fails on an empty log.
pub fn build_patch_proposal(
    store: &RunStore,
    run_id: &str,
) -> Result<PatchProposal, RunStoreError> {
    let records = store.read_consensus_records(run_id)?;
    let latest_non_veto = records.iter().rev().find(|record| !record.vetoed);

    let proposal = match latest_non_veto {
        None => PatchProposal {
            proposal_id: new_proposal_id(),
            run_id: run_id.to_string(),
            summary: "insufficient consensus evidence".to_string(),
            diff_preview: String::new(),
            related_consensus: String::new(),
            risk_level: RiskLevel::High,
            evidence_min_set: Vec::new(),
            merge_policy: MERGE_POLICY.to_string(),
            auto_merge: false,
            status: ProposalStatus::Blocked,
            generated_at: Utc::now(),
        },
        Some(record) => PatchProposal {
            proposal_id: new_proposal_id(),
            run_id: run_id.to_string(),
            summary: format!("proposed fix for: {}", record.winning_claim),
            diff_preview: "diff generation pending analyzer output".to_string(),
            related_consensus: record.consensus_id.clone(),
            risk_level: RiskLevel::Medium,
            evidence_min_set: record.evidence_refs.clone(),
            merge_policy: MERGE_POLICY.to_string(),
            auto_merge: false,
            status: ProposalStatus::Ready,
            generated_at: Utc::now(),
        },
    };
    Ok(proposal)
}

pub fn write_patch_proposal(
    store: &RunStore,
    run_id: &str,
    proposal: &PatchProposal,
) -> Result<PathBuf, RunStoreError> {
    let output = store
        .run_root()
        .join(run_id)
        .join("index")
        .join("patch-proposal.json");
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&output, serde_json::to_string_pretty(proposal)?)?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    use faultline_core::{AgentReport, ConsensusEngine};

    fn seeded_store() -> (TempDir, RunStore) {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        store
            .create_run("gateway-fw", "board-01", Some("run-1".to_string()), "manual")
            .unwrap();
        (dir, store)
    }

    fn consensus(vetoed: bool) -> faultline_core::ConsensusRecord {
        let engine = ConsensusEngine::new();
        let reports = vec![AgentReport {
            agent_id: "codex".to_string(),
            claim: "root cause hypothesis accepted".to_string(),
            confidence: 0.8,
            evidence_refs: vec!["trace.captured".to_string()],
        }];
        let required: BTreeSet<String> = if vetoed {
            ["coredump.saved".to_string()].into()
        } else {
            BTreeSet::new()
        };
        engine.evaluate("run-1", "root-cause", &reports, &required)
    }

    #[test]
    fn bundle_counts_events_workflows_and_consensus() {
        let (_dir, store) = seeded_store();
        store
            .append_consensus_record("run-1", &consensus(false))
            .unwrap();

        let bundle = build_evidence_bundle(&store, "run-1").unwrap();
        assert_eq!(bundle.bundle_id, "bundle-run-1");
        assert_eq!(bundle.event_count, 1);
        assert_eq!(bundle.consensus_count, 1);
        assert!(!bundle.auto_merge);
        assert_eq!(bundle.merge_policy, "manual-review-only");

        let path = write_evidence_bundle(&store, "run-1", &bundle).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn proposal_blocked_without_usable_consensus() {
        let (_dir, store) = seeded_store();
        store
            .append_consensus_record("run-1", &consensus(true))
            .unwrap();

        let proposal = build_patch_proposal(&store, "run-1").unwrap();
        assert_eq!(proposal.status, ProposalStatus::Blocked);
        assert_eq!(proposal.risk_level, RiskLevel::High);
        assert!(proposal.evidence_min_set.is_empty());
        assert!(!proposal.auto_merge);
    }

    #[test]
    fn proposal_uses_latest_non_vetoed_record() {
        let (_dir, store) = seeded_store();
        let good = consensus(false);
        store.append_consensus_record("run-1", &good).unwrap();
        store
            .append_consensus_record("run-1", &consensus(true))
            .unwrap();

        let proposal = build_patch_proposal(&store, "run-1").unwrap();
        assert_eq!(proposal.status, ProposalStatus::Ready);
        assert_eq!(proposal.risk_level, RiskLevel::Medium);
        assert_eq!(proposal.related_consensus, good.consensus_id);
        assert_eq!(
            proposal.summary,
            "proposed fix for: root cause hypothesis accepted"
        );
    }
}
