//! Capture job state machine and the serialized job runner.

pub mod job;
pub mod runner;

pub use job::{CaptureJob, JobState};
pub use runner::{JobOutcome, JobRunner, JobTicket};
