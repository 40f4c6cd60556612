//! Stock mock agents for consensus rounds.
//!
//! Each produces a fixed hypothesis regardless of context; real agents plug
//! in through the same [`AgentHandler`] contract.

use faultline_core::{AgentContext, AgentDispatcher, AgentHandler, DispatchError, Hypothesis};

fn fixed(claim: &str, confidence: f64, refs: &[&str]) -> Box<dyn AgentHandler> {
    let claim = claim.to_string();
    let refs: Vec<String> = refs.iter().map(|s| s.to_string()).collect();
    Box::new(move |_: &AgentContext| Hypothesis {
        claim: claim.clone(),
        confidence,
        evidence_refs: refs.clone(),
    })
}

/// Register the three stock agents on a dispatcher.
pub fn register_mock_agents(dispatcher: &mut AgentDispatcher) -> Result<(), DispatchError> {
    dispatcher.register(
        "codex",
        fixed(
            "root cause hypothesis accepted",
            0.82,
            &["trace.captured", "symbol.mapped"],
        ),
    )?;
    dispatcher.register(
        "copilot",
        fixed(
            "root cause hypothesis accepted",
            0.77,
            &["trace.captured", "source.linked"],
        ),
    )?;
    dispatcher.register(
        "gemini",
        fixed(
            "fallback path missing guard check",
            0.66,
            &["trace.captured"],
        ),
    )?;
    Ok(())
}
