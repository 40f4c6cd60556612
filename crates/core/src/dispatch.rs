//! Agent dispatch — a caller-owned registry of hypothesis producers.
//!
//! Agents are opaque: anything that can turn a context into a hypothesis.
//! The registry is explicitly constructed and passed around (never a
//! module-level singleton) so tests can wire their own agents.

use std::collections::HashMap;

use thiserror::Error;

use crate::consensus::AgentReport;

/// Context handed to every agent in a dispatch round.
#[derive(Clone, Debug)]
pub struct AgentContext {
    pub run_id: String,
    pub topic: String,
}

/// A single fault hypothesis produced by an agent.
#[derive(Clone, Debug)]
pub struct Hypothesis {
    pub claim: String,
    pub confidence: f64,
    pub evidence_refs: Vec<String>,
}

/// Anything that can propose a hypothesis for a context.
pub trait AgentHandler {
    fn propose(&self, context: &AgentContext) -> Hypothesis;
}

impl<F> AgentHandler for F
where
    F: Fn(&AgentContext) -> Hypothesis,
{
    fn propose(&self, context: &AgentContext) -> Hypothesis {
        self(context)
    }
}

/// Errors from agent registration and dispatch.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("agent already registered: {0}")]
    AlreadyRegistered(String),

    #[error("agent not registered: {0}")]
    NotRegistered(String),
}

/// Registry of agent handlers keyed by agent id.
#[derive(Default)]
pub struct AgentDispatcher {
    handlers: HashMap<String, Box<dyn AgentHandler>>,
}

impl AgentDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a handler under an id. Re-registering an id is an error.
    pub fn register(
        &mut self,
        agent_id: impl Into<String>,
        handler: Box<dyn AgentHandler>,
    ) -> Result<(), DispatchError> {
        let agent_id = agent_id.into();
        if self.handlers.contains_key(&agent_id) {
            return Err(DispatchError::AlreadyRegistered(agent_id));
        }
        self.handlers.insert(agent_id, handler);
        Ok(())
    }

    /// Collect one report per requested agent, in request order.
    ///
    /// The dispatcher stamps each report with the registered agent id; an
    /// unregistered id fails the whole round.
    pub fn dispatch(
        &self,
        agent_ids: &[String],
        context: &AgentContext,
    ) -> Result<Vec<AgentReport>, DispatchError> {
        let mut reports = Vec::with_capacity(agent_ids.len());
        for agent_id in agent_ids {
            let handler = self
                .handlers
                .get(agent_id)
                .ok_or_else(|| DispatchError::NotRegistered(agent_id.clone()))?;
            let hypothesis = handler.propose(context);
            reports.push(AgentReport {
                agent_id: agent_id.clone(),
                claim: hypothesis.claim,
                confidence: hypothesis.confidence,
                evidence_refs: hypothesis.evidence_refs,
            });
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(claim: &str, confidence: f64) -> Box<dyn AgentHandler> {
        let claim = claim.to_string();
        Box::new(move |_: &AgentContext| Hypothesis {
            claim: claim.clone(),
            confidence,
            evidence_refs: vec!["trace.captured".to_string()],
        })
    }

    fn context() -> AgentContext {
        AgentContext {
            run_id: "run-1".to_string(),
            topic: "root-cause".to_string(),
        }
    }

    #[test]
    fn dispatch_preserves_request_order_and_stamps_ids() {
        let mut dispatcher = AgentDispatcher::new();
        dispatcher.register("alpha", fixed("claim a", 0.8)).unwrap();
        dispatcher.register("beta", fixed("claim b", 0.6)).unwrap();

        let ids = vec!["beta".to_string(), "alpha".to_string()];
        let reports = dispatcher.dispatch(&ids, &context()).unwrap();

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].agent_id, "beta");
        assert_eq!(reports[0].claim, "claim b");
        assert_eq!(reports[1].agent_id, "alpha");
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut dispatcher = AgentDispatcher::new();
        dispatcher.register("alpha", fixed("claim", 0.5)).unwrap();

        let err = dispatcher.register("alpha", fixed("claim", 0.5)).unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyRegistered(id) if id == "alpha"));
    }

    #[test]
    fn unregistered_agent_fails_the_round() {
        let mut dispatcher = AgentDispatcher::new();
        dispatcher.register("alpha", fixed("claim", 0.5)).unwrap();

        let ids = vec!["alpha".to_string(), "ghost".to_string()];
        let err = dispatcher.dispatch(&ids, &context()).unwrap_err();
        assert!(matches!(err, DispatchError::NotRegistered(id) if id == "ghost"));
    }
}
