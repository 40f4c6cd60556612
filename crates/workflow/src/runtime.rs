//! Guard-gated workflow execution.
//!
//! Steps run strictly in definition order. The first failing or unresolved
//! guard blocks its step, the run goes `blocked` with that guard's reason,
//! and no further steps execute — fail-fast, not best-effort. Workflows are
//! not resumable; rerunning starts a fresh `WorkflowRun`.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::definition::{GuardExpression, WorkflowDefinition};

/// Overall status of a workflow run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Success,
    Blocked,
}

/// Status of one executed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Success,
    Blocked,
}

/// Result of one step, in execution order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    pub name: String,
    pub plugin_ref: String,
    pub action: String,
    pub status: StepStatus,
    #[serde(default)]
    pub reason: String,
}

/// One execution of a workflow definition, persisted once on completion.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub workflow_run_id: String,
    pub workflow_id: String,
    pub run_id: String,
    pub status: RunStatus,
    #[serde(default)]
    pub blocked_reason: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub steps: Vec<StepResult>,
}

/// Execute a definition against the caller's evidence set.
pub fn run_workflow(
    definition: &WorkflowDefinition,
    run_id: &str,
    evidence: &BTreeSet<String>,
) -> WorkflowRun {
    let guards = definition.guard_table();
    let started_at = Utc::now();
    let mut run = WorkflowRun {
        workflow_run_id: format!(
            "{run_id}:{}:{}",
            definition.workflow_id,
            started_at.to_rfc3339()
        ),
        workflow_id: definition.workflow_id.clone(),
        run_id: run_id.to_string(),
        status: RunStatus::Running,
        blocked_reason: String::new(),
        started_at,
        finished_at: None,
        steps: Vec::new(),
    };

    for step in &definition.steps {
        let mut step_status = StepStatus::Success;
        let mut step_reason = String::new();

        for guard_id in &step.guards {
            let Some(guard) = guards.get(guard_id.as_str()) else {
                step_status = StepStatus::Blocked;
                step_reason = format!("guard not found: {guard_id}");
                break;
            };
            let passed = GuardExpression::parse(&guard.expression)
                .is_some_and(|expression| expression.holds(evidence));
            if !passed {
                step_status = StepStatus::Blocked;
                step_reason = if guard.reason.is_empty() {
                    format!("guard failed: {guard_id}")
                } else {
                    guard.reason.clone()
                };
                break;
            }
        }

        run.steps.push(StepResult {
            step_id: step.step_id.clone(),
            name: step.name.clone(),
            plugin_ref: step.plugin_ref.clone(),
            action: step.action.clone(),
            status: step_status,
            reason: step_reason.clone(),
        });

        if step_status == StepStatus::Blocked {
            run.status = RunStatus::Blocked;
            run.blocked_reason = step_reason;
            run.finished_at = Some(Utc::now());
            tracing::warn!(
                workflow_id = %run.workflow_id,
                run_id,
                step_id = %step.step_id,
                reason = %run.blocked_reason,
                "Workflow blocked"
            );
            return run;
        }
    }

    run.status = RunStatus::Success;
    run.finished_at = Some(Utc::now());
    tracing::info!(
        workflow_id = %run.workflow_id,
        run_id,
        steps = run.steps.len(),
        "Workflow completed"
    );
    run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{GuardSpec, WorkflowStep};

    fn step(id: &str, guards: &[&str]) -> WorkflowStep {
        WorkflowStep {
            step_id: id.to_string(),
            name: format!("step {id}"),
            plugin_ref: "plugin".to_string(),
            action: "noop".to_string(),
            guards: guards.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn guard(id: &str, expression: &str, reason: &str) -> GuardSpec {
        GuardSpec {
            guard_id: id.to_string(),
            expression: expression.to_string(),
            reason: reason.to_string(),
            on_block: "halt".to_string(),
        }
    }

    fn definition(steps: Vec<WorkflowStep>, guards: Vec<GuardSpec>) -> WorkflowDefinition {
        WorkflowDefinition {
            workflow_id: "test-flow".to_string(),
            name: "test".to_string(),
            version: 1,
            core_boundary_policy: "event-bus-only".to_string(),
            steps,
            guards,
            outputs: vec!["report".to_string()],
        }
    }

    fn evidence(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn all_guards_passing_succeeds() {
        let definition = definition(
            vec![step("a", &["g1"]), step("b", &["g1", "g2"])],
            vec![
                guard("g1", "has_evidence:trace.captured", ""),
                guard("g2", "has_evidence:symbol.mapped", ""),
            ],
        );

        let run = run_workflow(
            &definition,
            "run-1",
            &evidence(&["trace.captured", "symbol.mapped"]),
        );

        assert_eq!(run.status, RunStatus::Success);
        assert!(run.blocked_reason.is_empty());
        assert!(run.finished_at.is_some());
        assert_eq!(run.steps.len(), 2);
        assert!(run.steps.iter().all(|s| s.status == StepStatus::Success));
    }

    #[test]
    fn halts_at_first_failing_guard() {
        // A passes, B fails, C would pass — C must never execute.
        let definition = definition(
            vec![step("a", &["g1"]), step("b", &["g2"]), step("c", &["g1"])],
            vec![
                guard("g1", "has_evidence:trace.captured", ""),
                guard("g2", "has_evidence:symbol.mapped", "symbols must be mapped first"),
            ],
        );

        let run = run_workflow(&definition, "run-1", &evidence(&["trace.captured"]));

        assert_eq!(run.status, RunStatus::Blocked);
        assert_eq!(run.blocked_reason, "symbols must be mapped first");
        assert!(run.finished_at.is_some());
        assert_eq!(run.steps.len(), 2);
        assert_eq!(run.steps[0].status, StepStatus::Success);
        assert_eq!(run.steps[1].status, StepStatus::Blocked);
        assert!(!run.steps.iter().any(|s| s.step_id == "c"));
    }

    #[test]
    fn unresolved_guard_id_blocks_with_default_message() {
        let definition = definition(vec![step("a", &["ghost"])], vec![]);

        let run = run_workflow(&definition, "run-1", &evidence(&["trace.captured"]));

        assert_eq!(run.status, RunStatus::Blocked);
        assert_eq!(run.blocked_reason, "guard not found: ghost");
    }

    #[test]
    fn failing_guard_without_reason_gets_default_text() {
        let definition = definition(
            vec![step("a", &["g1"])],
            vec![guard("g1", "has_evidence:coredump.saved", "")],
        );

        let run = run_workflow(&definition, "run-1", &BTreeSet::new());

        assert_eq!(run.blocked_reason, "guard failed: g1");
    }

    #[test]
    fn unparseable_expression_blocks() {
        let definition = definition(
            vec![step("a", &["g1"])],
            vec![guard("g1", "device_is_warm", "unsupported guard")],
        );

        let run = run_workflow(&definition, "run-1", &evidence(&["device_is_warm"]));

        assert_eq!(run.status, RunStatus::Blocked);
        assert_eq!(run.blocked_reason, "unsupported guard");
    }

    #[test]
    fn stepless_definition_succeeds_trivially() {
        let definition = definition(vec![], vec![]);
        let run = run_workflow(&definition, "run-1", &BTreeSet::new());
        assert_eq!(run.status, RunStatus::Success);
        assert!(run.steps.is_empty());
    }

    #[test]
    fn guards_evaluate_in_declared_order() {
        // Both guards fail; the first one declared on the step wins.
        let definition = definition(
            vec![step("a", &["g1", "g2"])],
            vec![
                guard("g1", "has_evidence:first.missing", "first reason"),
                guard("g2", "has_evidence:second.missing", "second reason"),
            ],
        );

        let run = run_workflow(&definition, "run-1", &BTreeSet::new());
        assert_eq!(run.blocked_reason, "first reason");
    }
}
