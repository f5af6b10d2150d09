//! State module for tracking crawl progress
//!
//! This module provides the lifecycle state machine shared by the frontier,
//! the coordinator loop and the control handle.
//!
//! # Components
//!
//! - `CrawlState`: Idle, Running, Paused, Completed, Cancelled
//! - `ControlSignal`: the pause/resume/cancel requests a caller can issue

mod crawl_state;

// Re-export main types
pub use crawl_state::{ControlSignal, CrawlState};
