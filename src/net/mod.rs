//! Outbound HTTP clients
//!
//! Both clients are blocking and are only ever called from dispatcher
//! worker threads, never from the UI thread.

pub mod geocode;
pub mod submit;

#[cfg(test)]
pub(crate) mod test_server;

pub use geocode::{GeoLookup, LookupError, NominatimClient};
pub use submit::{Acknowledgement, HttpSubmitter, PromptSubmitter, SubmissionError};
