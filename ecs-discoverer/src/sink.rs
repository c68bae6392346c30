//! Where the stages report the candidates they drop.
//!
//! The resolver is built with one sink for the whole run; stages never look
//! at a debug flag themselves.

use crate::error::Stage;
use std::fmt;
use tracing::debug;

/// Why a candidate was left out of a stage's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Task or EC2 instance not in the running state.
    NotRunning { status: String },
    /// Container instance not registered as ACTIVE.
    NotActive { status: String },
    /// The task runs on the host asking the question.
    IsSelf,
    /// The task has no container instance (Fargate or still provisioning).
    NoContainerInstance,
    NoInstanceId,
    NoPrivateAddress,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::NotRunning { status } => write!(f, "not running (state {})", status),
            DropReason::NotActive { status } => write!(f, "not ACTIVE (status {})", status),
            DropReason::IsSelf => f.write_str("is this instance, we don't return ourself"),
            DropReason::NoContainerInstance => f.write_str("has no container instance"),
            DropReason::NoInstanceId => f.write_str("has no EC2 instance id"),
            DropReason::NoPrivateAddress => f.write_str("has no private IP address"),
        }
    }
}

pub trait ExclusionSink: Send + Sync {
    fn excluded(&self, stage: Stage, id: &str, reason: &DropReason);
}

/// Debug mode: every exclusion becomes a structured `tracing` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ExclusionSink for TracingSink {
    fn excluded(&self, stage: Stage, id: &str, reason: &DropReason) {
        debug!(stage = stage.as_str(), id, reason = %reason, "{} excluded from results: {}", id, reason);
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl ExclusionSink for SilentSink {
    fn excluded(&self, _stage: Stage, _id: &str, _reason: &DropReason) {}
}

/// Pick the sink matching the `--debug` switch.
pub fn for_debug(debug: bool) -> Box<dyn ExclusionSink> {
    if debug {
        Box::new(TracingSink)
    } else {
        Box::new(SilentSink)
    }
}
