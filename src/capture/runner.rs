//! Serialized execution of capture jobs against the camera resource.
//!
//! The runner owns the single "camera busy" flag and a worker task per
//! submitted job. All camera I/O happens inside the worker; completion is a
//! message back to the subscriber context, not a nested callback chain. A
//! supervisor task joins the worker so that even a panicking worker is
//! converted into a classified failure and the busy flag is cleared
//! unconditionally; a later submission is never permanently blocked.

use crate::capture::job::{CaptureJob, JobState};
use crate::error::{CaptureError, ImcapError, ImcapResult};
use crate::events::{CoreEvent, EventBus};
use crate::hardware::CaptureDevice;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use uuid::Uuid;

/// Terminal result of a submitted job, as observed through its ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// The still image was written; carries the realized path.
    Completed(PathBuf),
    /// The job failed with the given classification.
    Failed(CaptureError),
    /// The submitter abandoned the job before the still capture engaged.
    Abandoned,
}

/// Handle returned by [`JobRunner::submit`]: observe state transitions,
/// abandon the job, or await its outcome.
#[derive(Debug)]
pub struct JobTicket {
    id: Uuid,
    state: watch::Receiver<JobState>,
    abandon: Arc<AtomicBool>,
    outcome: oneshot::Receiver<JobOutcome>,
}

impl JobTicket {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Most recently observed job state.
    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Request abandonment. Returns whether the request was registered,
    /// based on the last observed state; the worker makes the final call at
    /// its next check, so a request landing after the still capture engaged
    /// is ignored and the job runs to completion. The authoritative
    /// disposition is the outcome delivered by [`JobTicket::wait`]. An
    /// abandoned job emits no completion or failure event and its state
    /// receiver keeps the last value published before abandonment.
    pub fn abandon(&self) -> bool {
        if self.state().can_abandon() {
            self.abandon.store(true, Ordering::SeqCst);
            true
        } else {
            false
        }
    }

    /// Wait for the job to reach a terminal state.
    pub async fn wait(self) -> JobOutcome {
        self.outcome.await.unwrap_or_else(|_| {
            JobOutcome::Failed(CaptureError::Runner(
                "worker ended without reporting an outcome".into(),
            ))
        })
    }
}

/// Executes capture jobs one at a time against a shared camera resource.
#[derive(Clone)]
pub struct JobRunner {
    device: Arc<dyn CaptureDevice>,
    busy: Arc<AtomicBool>,
    bus: EventBus,
}

impl JobRunner {
    pub fn new(device: Arc<dyn CaptureDevice>, bus: EventBus) -> Self {
        Self {
            device,
            busy: Arc::new(AtomicBool::new(false)),
            bus,
        }
    }

    /// Check whether a job currently owns the camera resource.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Submit a job for execution.
    ///
    /// Rejects synchronously with [`ImcapError::Busy`] while another job is
    /// in flight; requests are never queued. On acceptance the job's
    /// suspension points run on a dedicated worker task and the outcome is
    /// delivered both through the returned ticket and as a
    /// `JobCompleted`/`JobFailed` event on the bus.
    pub fn submit(&self, job: CaptureJob) -> ImcapResult<JobTicket> {
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::warn!(job = %job.id(), "capture rejected: camera busy");
            return Err(ImcapError::Busy);
        }

        let id = job.id();
        tracing::info!(
            job = %id,
            target = %job.target().path.display(),
            autofocus = job.requires_autofocus(),
            "capture job submitted"
        );

        let (state_tx, state_rx) = watch::channel(JobState::Idle);
        let (outcome_tx, outcome_rx) = oneshot::channel();
        let abandon = Arc::new(AtomicBool::new(false));

        let worker = tokio::spawn(run_job(
            self.device.clone(),
            job,
            state_tx,
            abandon.clone(),
        ));

        let busy = self.busy.clone();
        let bus = self.bus.clone();
        tokio::spawn(async move {
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                Err(fault) => {
                    tracing::error!(job = %id, %fault, "capture worker faulted");
                    JobOutcome::Failed(CaptureError::Runner(fault.to_string()))
                }
            };

            // The flag is cleared before anything else so a subscriber
            // reacting to the notification can submit immediately.
            busy.store(false, Ordering::SeqCst);

            match &outcome {
                JobOutcome::Completed(path) => {
                    tracing::info!(job = %id, path = %path.display(), "capture job completed");
                    bus.publish(CoreEvent::JobCompleted(path.clone()));
                }
                JobOutcome::Failed(err) => {
                    tracing::warn!(job = %id, error = %err, "capture job failed");
                    bus.publish(CoreEvent::JobFailed(err.clone()));
                }
                JobOutcome::Abandoned => {
                    tracing::info!(job = %id, "capture job abandoned before the camera engaged");
                }
            }

            let _ = outcome_tx.send(outcome);
        });

        Ok(JobTicket {
            id,
            state: state_rx,
            abandon,
            outcome: outcome_rx,
        })
    }
}

/// Drive one job through its state machine on the worker task.
async fn run_job(
    device: Arc<dyn CaptureDevice>,
    mut job: CaptureJob,
    state_tx: watch::Sender<JobState>,
    abandon: Arc<AtomicBool>,
) -> JobOutcome {
    let advance = |job: &mut CaptureJob, next: JobState| {
        job.set_state(next);
        let _ = state_tx.send(next);
    };

    if abandon.load(Ordering::SeqCst) {
        return JobOutcome::Abandoned;
    }

    if job.requires_autofocus() {
        advance(&mut job, JobState::AutofocusPending);
        advance(&mut job, JobState::AutofocusRunning);

        let af = async {
            let handle = device.begin_autofocus().await?;
            device.wait(handle).await
        };
        if let Err(err) = af.await {
            job.finish(Err(err.clone()));
            let _ = state_tx.send(JobState::Failed);
            return JobOutcome::Failed(err);
        }

        // Abandonment requested while focusing is honored here, before the
        // non-cancellable still capture engages.
        if abandon.load(Ordering::SeqCst) {
            return JobOutcome::Abandoned;
        }
    }

    advance(&mut job, JobState::CaptureRunning);
    let target = job.target().path.clone();

    let capture = async {
        let handle = device.begin_still_capture(&target).await?;
        device.wait(handle).await
    };
    match capture.await {
        Ok(()) => {
            job.finish(Ok(target.clone()));
            let _ = state_tx.send(JobState::Completed);
            JobOutcome::Completed(target)
        }
        Err(err) => {
            job.finish(Err(err.clone()));
            let _ = state_tx.send(JobState::Failed);
            JobOutcome::Failed(err)
        }
    }
}
