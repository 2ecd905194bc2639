//! Application orchestration layer
//!
//! This module coordinates between input, domain, UI, and platform layers.
//! It owns the selection state and hands blocking work to the dispatcher.

pub mod controller;
pub mod dispatch;
pub mod state;

pub use controller::{MapController, ShellCommand};
pub use dispatch::{Completion, Dispatch, Job, Services, WorkerPool};
