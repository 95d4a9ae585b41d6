//! Custom error types for the capture core.
//!
//! Two layers are distinguished on purpose. [`CaptureError`] is the hardware
//! classification delivered with a failed job: the presentation layer uses it
//! to decide between "retry autofocus" and "retry capture". [`ImcapError`] is
//! the application error type everything else resolves to; it wraps template
//! validation, path allocation, the synchronous busy rejection and the
//! ordinary I/O failures of the settings and sample-list surfaces.
//!
//! None of these are allowed to terminate the process: every variant is
//! recovered at the runner/allocator boundary and converted into an explicit
//! result value delivered back to the interactive context.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type ImcapResult<T> = std::result::Result<T, ImcapError>;

/// Errors reported by the camera resource, or by job execution itself.
///
/// `AutofocusFailed` and `StillCaptureFailed` originate in the hardware
/// boundary. `Runner` marks an unexpected fault inside job execution (the
/// worker task itself failed); it is fatal to that job only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("autofocus failed: {0}")]
    AutofocusFailed(String),

    #[error("still capture failed: {0}")]
    StillCaptureFailed(String),

    #[error("job execution fault: {0}")]
    Runner(String),
}

#[derive(Error, Debug)]
pub enum ImcapError {
    /// A naming component is empty or malformed. Surfaced immediately to the
    /// caller that attempted the mutation; the mutation is never partially
    /// applied.
    #[error("invalid naming template: {0}")]
    InvalidTemplate(String),

    /// The filesystem could not be queried for existence during unique-path
    /// allocation. Propagated, not swallowed; the capture attempt must be
    /// blocked and the underlying reason reported.
    #[error("cannot allocate a unique path at {path}: {source}")]
    Allocation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A capture job is already in flight for the camera resource. Returned
    /// synchronously from `submit`; requests are rejected, never queued.
    #[error("a capture job is already in flight")]
    Busy,

    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),

    #[error("settings store error: {0}")]
    Settings(String),

    #[error("sample list CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
