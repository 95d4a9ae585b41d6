//! The camera resource boundary.
//!
//! The core never talks to hardware directly; it drives a [`CaptureDevice`]
//! through begin/wait pairs so every blocking hardware call lands on a
//! worker task, never on the interactive context. Exclusive ownership of
//! the device is enforced by the job runner's busy flag, not by the device
//! itself.

pub mod mock;

use crate::error::CaptureError;
use async_trait::async_trait;
use std::path::Path;

/// Opaque handle to an in-flight device operation, redeemed via
/// [`CaptureDevice::wait`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceJob(pub u64);

/// Contract of the hardware capture device.
///
/// `begin_*` calls start an operation and return immediately; `wait` blocks
/// the calling task until the operation signals completion or error. No
/// timeout is imposed here: a hung hardware call blocks its worker task
/// indefinitely, which the presentation layer must surface as a visible
/// "in progress" state.
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Select the sensor resolution used for subsequent captures.
    async fn configure(&self, width: u32, height: u32) -> Result<(), CaptureError>;

    /// Start the device. Must precede any `begin_*` call.
    async fn start(&self) -> Result<(), CaptureError>;

    /// Start an autofocus cycle.
    async fn begin_autofocus(&self) -> Result<DeviceJob, CaptureError>;

    /// Start writing a still image to `path`.
    async fn begin_still_capture(&self, path: &Path) -> Result<DeviceJob, CaptureError>;

    /// Suspend until the given operation completes or errors.
    async fn wait(&self, job: DeviceJob) -> Result<(), CaptureError>;
}
