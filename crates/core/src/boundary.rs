//! Write-path boundary guard for protected core state.
//!
//! Core phase state and long-term memory may only change through their
//! sanctioned channels (run transitions, the promotion gate). The guard
//! gives callers a single place to assert that before writing.

use thiserror::Error;

/// Raised when a write or channel violates the core boundary.
#[derive(Error, Debug)]
pub enum BoundaryViolation {
    #[error("channel not allowed: {0}")]
    ChannelNotAllowed(String),

    #[error("direct write blocked: {0}")]
    WriteBlocked(String),
}

const BLOCKED_PATHS: [&str; 2] = ["core.state", "memory.long"];

const ALLOWED_CHANNELS: [&str; 3] = ["event_bus", "workflow_action", "evidence_input"];

/// Guards direct writes to protected targets.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoundaryGuard;

impl BoundaryGuard {
    pub fn new() -> Self {
        Self
    }

    pub fn assert_allowed_channel(&self, channel: &str) -> Result<(), BoundaryViolation> {
        if ALLOWED_CHANNELS.contains(&channel) {
            Ok(())
        } else {
            Err(BoundaryViolation::ChannelNotAllowed(channel.to_string()))
        }
    }

    pub fn assert_write_allowed(&self, target_path: &str) -> Result<(), BoundaryViolation> {
        if BLOCKED_PATHS.contains(&target_path) {
            Err(BoundaryViolation::WriteBlocked(target_path.to_string()))
        } else {
            Ok(())
        }
    }
}
