//! Submission controller module for the per-submit lifecycle

mod controller;
mod transport;

pub use controller::{SubmissionController, SubmitFailure, SubmitOptions, SubmitState};
pub use transport::{HttpTransport, Transport, TransportResponse};

#[cfg(test)]
pub use transport::MockTransport;
