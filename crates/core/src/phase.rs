//! The closed set of phases a debugging run moves through.

use serde::{Deserialize, Serialize};

/// One discrete named stage of a debugging run's lifecycle.
///
/// The set is closed; there is no implicit ordering between phases. The
/// state machine accepts any phase after any phase, so callers are free to
/// jump to `Failed` or re-enter `TestLoop` without going through the
/// nominal sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunPhase {
    /// Initial device/run setup.
    Bootstrap,
    /// Repeated execution of the test suite on the target.
    TestLoop,
    /// Passive observation of device output.
    Monitor,
    /// A fault signature has been spotted.
    Detect,
    /// Narrowing down the conditions that trigger the fault.
    ConditionAnalysis,
    /// Attempting a controlled reproduction.
    Reproduce,
    /// Debug instrumentation enabled on the target.
    DebugOn,
    /// Hypothesis formation over collected evidence.
    Analyze,
    /// Deciding whether to bring in heavier tooling.
    AdvToolDecision,
    /// Automated recovery/analysis action in flight.
    AutoAction,
    /// Capturing a trace of the reproduced fault.
    ReproTrace,
    /// Testing a candidate patch on the live target.
    RuntimePatchTest,
    /// Producing the final report.
    Report,
    /// The run gave up.
    Failed,
}

impl RunPhase {
    /// Canonical wire name, as stored in run metadata and events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bootstrap => "BOOTSTRAP",
            Self::TestLoop => "TEST_LOOP",
            Self::Monitor => "MONITOR",
            Self::Detect => "DETECT",
            Self::ConditionAnalysis => "CONDITION_ANALYSIS",
            Self::Reproduce => "REPRODUCE",
            Self::DebugOn => "DEBUG_ON",
            Self::Analyze => "ANALYZE",
            Self::AdvToolDecision => "ADV_TOOL_DECISION",
            Self::AutoAction => "AUTO_ACTION",
            Self::ReproTrace => "REPRO_TRACE",
            Self::RuntimePatchTest => "RUNTIME_PATCH_TEST",
            Self::Report => "REPORT",
            Self::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "BOOTSTRAP" => Ok(Self::Bootstrap),
            "TEST_LOOP" => Ok(Self::TestLoop),
            "MONITOR" => Ok(Self::Monitor),
            "DETECT" => Ok(Self::Detect),
            "CONDITION_ANALYSIS" => Ok(Self::ConditionAnalysis),
            "REPRODUCE" => Ok(Self::Reproduce),
            "DEBUG_ON" => Ok(Self::DebugOn),
            "ANALYZE" => Ok(Self::Analyze),
            "ADV_TOOL_DECISION" => Ok(Self::AdvToolDecision),
            "AUTO_ACTION" => Ok(Self::AutoAction),
            "REPRO_TRACE" => Ok(Self::ReproTrace),
            "RUNTIME_PATCH_TEST" => Ok(Self::RuntimePatchTest),
            "REPORT" => Ok(Self::Report),
            "FAILED" => Ok(Self::Failed),
            other => Err(format!("unknown phase: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn wire_names_roundtrip() {
        for phase in [
            RunPhase::Bootstrap,
            RunPhase::TestLoop,
            RunPhase::Monitor,
            RunPhase::Detect,
            RunPhase::ConditionAnalysis,
            RunPhase::Reproduce,
            RunPhase::DebugOn,
            RunPhase::Analyze,
            RunPhase::AdvToolDecision,
            RunPhase::AutoAction,
            RunPhase::ReproTrace,
            RunPhase::RuntimePatchTest,
            RunPhase::Report,
            RunPhase::Failed,
        ] {
            assert_eq!(RunPhase::from_str(phase.as_str()).unwrap(), phase);
        }
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&RunPhase::AdvToolDecision).unwrap();
        assert_eq!(json, "\"ADV_TOOL_DECISION\"");
        let back: RunPhase = serde_json::from_str("\"TEST_LOOP\"").unwrap();
        assert_eq!(back, RunPhase::TestLoop);
    }

    #[test]
    fn unknown_phase_is_rejected() {
        assert!(RunPhase::from_str("REBOOT").is_err());
    }
}
