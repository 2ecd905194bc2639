//! The tuple forwarded to the processing endpoint

use serde::Serialize;

use crate::domain::geo::{Coordinate, Radius};

/// A finalized selection plus the user's question about it.
///
/// Only constructible with a non-empty prompt. The text is forwarded exactly
/// as typed, surrounding whitespace included.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRequest {
    coordinate: Coordinate,
    radius: Radius,
    prompt: String,
}

impl SubmissionRequest {
    /// Builds a request for a committed location
    ///
    /// # Arguments
    /// * `coordinate` - Location frozen at commit time
    /// * `radius` - Radius frozen at commit time
    /// * `prompt` - Text the user typed
    ///
    /// # Returns
    /// `None` when `prompt` is empty
    pub fn new(coordinate: Coordinate, radius: Radius, prompt: &str) -> Option<Self> {
        if prompt.is_empty() {
            return None;
        }
        Some(Self {
            coordinate,
            radius,
            prompt: prompt.to_string(),
        })
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    pub fn radius(&self) -> Radius {
        self.radius
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// JSON body understood by the endpoint
    pub fn body(&self) -> SubmissionBody<'_> {
        SubmissionBody {
            latitude: self.coordinate.latitude,
            longitude: self.coordinate.longitude,
            // The endpoint parses the radius as an integer
            radius: self.radius.meters().round() as u64,
            prompt: &self.prompt,
        }
    }
}

/// Wire shape of a submission
#[derive(Debug, Serialize)]
pub struct SubmissionBody<'a> {
    pub latitude: f64,
    pub longitude: f64,
    pub radius: u64,
    pub prompt: &'a str,
}
