//! Mock capture device for tests and the demo binary.

use crate::error::CaptureError;
use crate::hardware::{CaptureDevice, DeviceJob};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tokio::time::{sleep, Duration};

#[derive(Debug, Clone)]
enum PendingOp {
    Autofocus,
    Still(PathBuf),
}

/// Simulated camera implementing the full [`CaptureDevice`] contract.
///
/// Supports:
/// - Configurable per-operation delays (to hold the busy flag in tests)
/// - One-shot failure injection for autofocus and still capture
/// - Still captures that really write the target file, so path-allocation
///   tests observe the path being consumed
/// - Call counters for asserting which operations ran
pub struct MockCamera {
    resolution: Mutex<(u32, u32)>,
    started: AtomicBool,
    autofocus_delay: Duration,
    capture_delay: Duration,
    fail_next_autofocus: AtomicBool,
    fail_next_capture: AtomicBool,
    autofocus_count: AtomicU32,
    capture_count: AtomicU32,
    next_job: AtomicU64,
    pending: Mutex<HashMap<u64, PendingOp>>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self {
            resolution: Mutex::new((2592, 1944)),
            started: AtomicBool::new(false),
            autofocus_delay: Duration::ZERO,
            capture_delay: Duration::ZERO,
            fail_next_autofocus: AtomicBool::new(false),
            fail_next_capture: AtomicBool::new(false),
            autofocus_count: AtomicU32::new(0),
            capture_count: AtomicU32::new(0),
            next_job: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Make the autofocus cycle take `delay` before it signals completion.
    pub fn with_autofocus_delay(mut self, delay: Duration) -> Self {
        self.autofocus_delay = delay;
        self
    }

    /// Make the still capture take `delay` before it signals completion.
    pub fn with_capture_delay(mut self, delay: Duration) -> Self {
        self.capture_delay = delay;
        self
    }

    /// The next autofocus cycle reports an error.
    pub fn fail_next_autofocus(&self) {
        self.fail_next_autofocus.store(true, Ordering::SeqCst);
    }

    /// The next still capture reports an error.
    pub fn fail_next_capture(&self) {
        self.fail_next_capture.store(true, Ordering::SeqCst);
    }

    /// Number of autofocus cycles that completed `wait`.
    pub fn autofocus_count(&self) -> u32 {
        self.autofocus_count.load(Ordering::SeqCst)
    }

    /// Number of still captures that were begun.
    pub fn capture_count(&self) -> u32 {
        self.capture_count.load(Ordering::SeqCst)
    }

    pub async fn resolution(&self) -> (u32, u32) {
        *self.resolution.lock().await
    }

    fn ensure_started(&self) -> Result<(), CaptureError> {
        if !self.started.load(Ordering::SeqCst) {
            return Err(CaptureError::Runner("capture device not started".into()));
        }
        Ok(())
    }

    async fn register(&self, op: PendingOp) -> DeviceJob {
        let id = self.next_job.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().await.insert(id, op);
        DeviceJob(id)
    }
}

impl Default for MockCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureDevice for MockCamera {
    async fn configure(&self, width: u32, height: u32) -> Result<(), CaptureError> {
        if width == 0 || height == 0 {
            return Err(CaptureError::Runner(
                "resolution must be non-zero".into(),
            ));
        }
        *self.resolution.lock().await = (width, height);
        tracing::debug!(width, height, "MockCamera: configured");
        Ok(())
    }

    async fn start(&self) -> Result<(), CaptureError> {
        self.started.store(true, Ordering::SeqCst);
        tracing::debug!("MockCamera: started");
        Ok(())
    }

    async fn begin_autofocus(&self) -> Result<DeviceJob, CaptureError> {
        self.ensure_started()?;
        tracing::debug!("MockCamera: autofocus cycle begun");
        Ok(self.register(PendingOp::Autofocus).await)
    }

    async fn begin_still_capture(&self, path: &Path) -> Result<DeviceJob, CaptureError> {
        self.ensure_started()?;
        self.capture_count.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(path = %path.display(), "MockCamera: still capture begun");
        Ok(self.register(PendingOp::Still(path.to_path_buf())).await)
    }

    async fn wait(&self, job: DeviceJob) -> Result<(), CaptureError> {
        let op = self
            .pending
            .lock()
            .await
            .remove(&job.0)
            .ok_or_else(|| CaptureError::Runner(format!("unknown device job {}", job.0)))?;

        match op {
            PendingOp::Autofocus => {
                sleep(self.autofocus_delay).await;
                if self.fail_next_autofocus.swap(false, Ordering::SeqCst) {
                    return Err(CaptureError::AutofocusFailed(
                        "injected autofocus fault".into(),
                    ));
                }
                self.autofocus_count.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            PendingOp::Still(path) => {
                sleep(self.capture_delay).await;
                if self.fail_next_capture.swap(false, Ordering::SeqCst) {
                    return Err(CaptureError::StillCaptureFailed(
                        "injected capture fault".into(),
                    ));
                }
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        CaptureError::StillCaptureFailed(format!(
                            "cannot create {}: {e}",
                            parent.display()
                        ))
                    })?;
                }
                tokio::fs::write(&path, b"mock still capture")
                    .await
                    .map_err(|e| {
                        CaptureError::StillCaptureFailed(format!(
                            "cannot write {}: {e}",
                            path.display()
                        ))
                    })?;
                tracing::debug!(path = %path.display(), "MockCamera: still written");
                Ok(())
            }
        }
    }
}
