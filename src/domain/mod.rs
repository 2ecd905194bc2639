//! Domain logic and core data structures
//!
//! This module contains pure logic that is independent of the windowing
//! platform and of the network.

pub mod core;
pub mod geo;
pub mod submission;
pub mod viewport;

pub use geo::{Coordinate, CoordinateError, Radius};
pub use submission::SubmissionRequest;
pub use viewport::Viewport;
