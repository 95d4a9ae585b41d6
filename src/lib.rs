//! # imcapp core library
//!
//! Capture orchestration and unique path allocation for a lab image-capture
//! workstation: an operator selects a sample identifier, optionally runs
//! autofocus, and captures a still image to a uniquely named file inside a
//! per-experiment directory tree.
//!
//! ## Crate Structure
//!
//! - **`naming`**: the [`naming::PathTemplate`] rendering canonical paths
//!   from initials/experiment/batch/sample fields, the
//!   [`naming::UniquePathAllocator`] resolving them against the filesystem,
//!   and the composed [`naming::NamingSubject`] that publishes the next
//!   capture path.
//! - **`capture`**: the [`capture::CaptureJob`] state machine
//!   (optional autofocus, then still capture) and the [`capture::JobRunner`]
//!   that executes jobs on worker tasks with at-most-one job in flight per
//!   camera.
//! - **`hardware`**: the [`hardware::CaptureDevice`] trait marking the
//!   camera boundary, plus a mock implementation for tests and the demo
//!   binary.
//! - **`events`**: the broadcast [`events::EventBus`] carrying
//!   `path_changed` / `job_completed` / `job_failed` notifications to the
//!   interactive context.
//! - **`settings`**: the key-value store seeding naming-template defaults,
//!   written back only on explicit save.
//! - **`samples`**: ordered sample-list CRUD with CSV import/export.
//! - **`error`**: the `ImcapError` / `CaptureError` taxonomy.

pub mod capture;
pub mod error;
pub mod events;
pub mod hardware;
pub mod naming;
pub mod samples;
pub mod settings;

pub use capture::{CaptureJob, JobOutcome, JobRunner, JobState, JobTicket};
pub use error::{CaptureError, ImcapError, ImcapResult};
pub use events::{CoreEvent, EventBus};
pub use hardware::{CaptureDevice, DeviceJob};
pub use naming::{NamingSubject, PathTemplate, UniqueCandidatePath, UniquePathAllocator};
pub use samples::SampleList;
