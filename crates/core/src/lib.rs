//! Core decision engines for faultline debugging runs.
//!
//! Everything here is synchronous and free of I/O: the run store hands
//! already-loaded data in, and persists what comes back out. The pieces:
//!
//! - [`RunStateMachine`]: append-only phase transition log with a
//!   snapshot/restore persistence boundary.
//! - [`VetoGate`] + [`ConsensusEngine`]: evidence-gated reconciliation of
//!   independent agent hypotheses into one scored decision.
//! - [`AgentDispatcher`]: caller-owned registry of hypothesis producers.
//! - [`EventBus`] + [`EventSchema`]: field-set validation for run events.
//! - [`BoundaryGuard`]: write-path assertions for protected core state.

pub mod boundary;
pub mod consensus;
pub mod dispatch;
pub mod event;
pub mod phase;
pub mod state_machine;
pub mod veto;

pub use boundary::{BoundaryGuard, BoundaryViolation};
pub use consensus::{AgentReport, ConsensusEngine, ConsensusRecord, DissentingClaim, VetoReason};
pub use dispatch::{AgentContext, AgentDispatcher, AgentHandler, DispatchError, Hypothesis};
pub use event::{EventBus, EventError, EventSchema};
pub use phase::RunPhase;
pub use state_machine::{RunStateMachine, StateSnapshot, TransitionAudit};
pub use veto::{VetoDecision, VetoGate};
