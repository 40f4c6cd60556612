//! Evidence-sufficiency gate for consensus evaluation.
//!
//! A claim set can only be scored when every required evidence reference is
//! actually present among the agents' combined evidence. The gate is a pure
//! set-difference check; the consensus engine consults it before scoring.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Verdict of one sufficiency check.
///
/// `reasons` is non-empty exactly when `vetoed` is true, one entry per
/// missing evidence reference in lexicographic order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VetoDecision {
    pub vetoed: bool,
    pub reasons: Vec<String>,
}

/// Pure evidence-sufficiency predicate.
#[derive(Clone, Copy, Debug, Default)]
pub struct VetoGate;

impl VetoGate {
    pub fn new() -> Self {
        Self
    }

    /// Compare required against available evidence.
    ///
    /// Missing = required − available. Vetoed iff missing is non-empty.
    pub fn evaluate(
        &self,
        required_evidence: &BTreeSet<String>,
        available_evidence: &BTreeSet<String>,
    ) -> VetoDecision {
        let reasons: Vec<String> = required_evidence
            .difference(available_evidence)
            .map(|item| format!("missing evidence: {item}"))
            .collect();

        VetoDecision {
            vetoed: !reasons.is_empty(),
            reasons,
        }
    }
}
