//! Workflow definitions — the read-only blueprint for a recovery or
//! analysis procedure.
//!
//! Definitions arrive from a collaborator as JSON. Guard ids referenced by
//! steps are deliberately NOT resolved at load time: an unresolved guard
//! blocks the step when the workflow runs, it does not fail the load.

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A declarative recovery/analysis procedure.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub workflow_id: String,
    pub name: String,
    pub version: u32,
    /// Interaction policy with the core; informational here.
    #[serde(default)]
    pub core_boundary_policy: String,
    #[serde(default)]
    pub steps: Vec<WorkflowStep>,
    #[serde(default)]
    pub guards: Vec<GuardSpec>,
    #[serde(default)]
    pub outputs: Vec<String>,
}

impl WorkflowDefinition {
    /// Guard specs keyed by id, for runtime lookup.
    pub fn guard_table(&self) -> HashMap<&str, &GuardSpec> {
        self.guards
            .iter()
            .map(|guard| (guard.guard_id.as_str(), guard))
            .collect()
    }
}

/// One ordered step of a workflow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub step_id: String,
    pub name: String,
    pub plugin_ref: String,
    pub action: String,
    /// Guard ids evaluated in order before the step may run.
    #[serde(default)]
    pub guards: Vec<String>,
}

fn default_on_block() -> String {
    "halt".to_string()
}

/// A named guard as declared in the definition.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GuardSpec {
    pub guard_id: String,
    /// Raw expression text, e.g. `has_evidence:trace.captured`. Parsed at
    /// run time; unparseable text makes the guard fail, not the load.
    pub expression: String,
    /// Reason reported when this guard blocks; a default is used if empty.
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_on_block")]
    pub on_block: String,
}

/// The closed set of guard expression kinds.
///
/// Only evidence-presence checks exist today; new kinds get a variant here
/// so every evaluation site is forced to handle them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardExpression {
    HasEvidence(String),
}

impl GuardExpression {
    /// Parse raw expression text. `None` means unrecognized (which the
    /// runtime treats as a failing guard).
    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.strip_prefix("has_evidence:")?.trim();
        if key.is_empty() {
            return None;
        }
        Some(Self::HasEvidence(key.to_string()))
    }

    /// Whether the expression holds for the given evidence set.
    pub fn holds(&self, evidence: &BTreeSet<String>) -> bool {
        match self {
            Self::HasEvidence(key) => evidence.contains(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_has_evidence_expressions() {
        let expr = GuardExpression::parse("has_evidence:trace.captured").unwrap();
        assert_eq!(
            expr,
            GuardExpression::HasEvidence("trace.captured".to_string())
        );
        assert!(expr.holds(&evidence(&["trace.captured"])));
        assert!(!expr.holds(&evidence(&["symbol.mapped"])));
    }

    #[test]
    fn unrecognized_expressions_do_not_parse() {
        assert!(GuardExpression::parse("always_true").is_none());
        assert!(GuardExpression::parse("has_evidence:").is_none());
        assert!(GuardExpression::parse("has_evidence:   ").is_none());
    }

    #[test]
    fn definition_deserializes_from_collaborator_json() {
        let definition: WorkflowDefinition = serde_json::from_str(
            r#"{
                "workflow_id": "trace-capture-flow",
                "name": "Trace capture",
                "version": 1,
                "core_boundary_policy": "event-bus-only",
                "steps": [
                    {
                        "step_id": "s1",
                        "name": "arm tracer",
                        "plugin_ref": "tracezone",
                        "action": "trace.arm",
                        "guards": ["g1"]
                    }
                ],
                "guards": [
                    {
                        "guard_id": "g1",
                        "expression": "has_evidence:device.online",
                        "reason": "device must be reachable"
                    }
                ],
                "outputs": ["trace.captured"]
            }"#,
        )
        .unwrap();

        assert_eq!(definition.workflow_id, "trace-capture-flow");
        assert_eq!(definition.steps.len(), 1);
        let table = definition.guard_table();
        assert_eq!(table["g1"].on_block, "halt");
    }
}
