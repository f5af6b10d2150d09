//! Crawl lifecycle definitions
//!
//! A crawl moves `Idle -> Running -> {Paused <-> Running} -> {Completed | Cancelled}`.

use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlState {
    // ===== Active States =====
    /// Crawl has been created but nothing has been dispatched yet
    Idle,

    /// Frontier is dispatching URLs to workers
    Running,

    /// No new dispatches; in-flight fetches are allowed to finish
    Paused,

    // ===== Terminal States =====
    /// Frontier drained or page budget exhausted
    Completed,

    /// Caller cancelled the crawl; the partial corpus is still returned
    Cancelled,
}

impl CrawlState {
    /// Returns true if this is a terminal state (no further dispatching)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Returns true if new URLs may be dispatched in this state
    pub fn can_dispatch(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Checks whether the state machine allows moving to `next`
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        use CrawlState::*;
        matches!(
            (self, next),
            (Idle, Running)
                | (Idle, Cancelled)
                | (Running, Paused)
                | (Running, Completed)
                | (Running, Cancelled)
                | (Paused, Running)
                | (Paused, Cancelled)
        )
    }

    /// Performs a transition, rejecting the ones the lifecycle forbids
    pub fn transition(self, next: CrawlState) -> Result<CrawlState, crate::SumiError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(crate::SumiError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A request issued through the crawl handle
///
/// Signals are level-triggered: the coordinator reads the latest one before
/// every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Run,
    Pause,
    Cancel,
}
