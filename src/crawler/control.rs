//! Pause, resume and cancel for a running crawl
//!
//! A [`CrawlHandle`] is a cheap, cloneable remote control. Signals are
//! carried over `tokio::sync::watch` channels and are checked by the
//! coordinator before every dispatch; in-flight fetches are never
//! interrupted.

use crate::state::{ControlSignal, CrawlState};
use std::sync::Arc;
use tokio::sync::watch;

/// Remote control for one crawl
#[derive(Debug, Clone)]
pub struct CrawlHandle {
    control: Arc<watch::Sender<ControlSignal>>,
    state: Arc<watch::Sender<CrawlState>>,
}

impl Default for CrawlHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CrawlHandle {
    pub fn new() -> Self {
        let (control, _) = watch::channel(ControlSignal::Run);
        let (state, _) = watch::channel(CrawlState::Idle);
        Self {
            control: Arc::new(control),
            state: Arc::new(state),
        }
    }

    /// Stops new dispatches until [`resume`](Self::resume) is called
    ///
    /// Has no effect once the crawl has been cancelled.
    pub fn pause(&self) {
        self.control.send_if_modified(|signal| {
            if *signal == ControlSignal::Run {
                *signal = ControlSignal::Pause;
                true
            } else {
                false
            }
        });
    }

    /// Resumes dispatching after a pause
    pub fn resume(&self) {
        self.control.send_if_modified(|signal| {
            if *signal == ControlSignal::Pause {
                *signal = ControlSignal::Run;
                true
            } else {
                false
            }
        });
    }

    /// Stops dispatching for good; in-flight fetches finish or time out
    pub fn cancel(&self) {
        self.control.send_replace(ControlSignal::Cancel);
    }

    /// Current state of the crawl
    pub fn state(&self) -> CrawlState {
        *self.state.borrow()
    }

    /// Most recent control signal
    pub fn signal(&self) -> ControlSignal {
        *self.control.borrow()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ControlSignal> {
        self.control.subscribe()
    }

    /// Moves the published state, rejecting transitions the state machine
    /// does not allow
    pub(crate) fn set_state(&self, next: CrawlState) -> crate::Result<CrawlState> {
        let current = self.state();
        if current == next {
            return Ok(current);
        }
        let next = current.transition(next)?;
        self.state.send_replace(next);
        Ok(next)
    }
}
