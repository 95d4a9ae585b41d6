//! One user-initiated capture request, modeled as a state machine.

use crate::error::CaptureError;
use crate::naming::UniqueCandidatePath;
use std::path::PathBuf;
use uuid::Uuid;

/// Capture job lifecycle state.
///
/// # State Machine
///
/// ```text
/// Idle ──(autofocus required)──> AutofocusPending ──> AutofocusRunning ──┐
///   │                                                        │           │
///   └──────────────(autofocus skipped)───────────────────────┼──> CaptureRunning
///                                                            │           │
///                                                          Failed <──────┤
///                                                                        │
///                                                                   Completed
/// ```
///
/// `Completed` and `Failed` are terminal. A job that has not yet reached
/// `CaptureRunning` may be abandoned by its submitter; once the still
/// capture is engaged the job runs to completion or failure, since the
/// underlying hardware operation is not itself cancellable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Constructed, target path and autofocus flag fixed; not yet submitted.
    Idle,
    /// Queued for the autofocus routine.
    AutofocusPending,
    /// Autofocus routine engaged on the camera resource.
    AutofocusRunning,
    /// Still capture engaged on the camera resource.
    CaptureRunning,
    /// Capture succeeded; result carries the realized path.
    Completed,
    /// Camera or runner reported an error; result carries the classification.
    Failed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "Idle"),
            JobState::AutofocusPending => write!(f, "AutofocusPending"),
            JobState::AutofocusRunning => write!(f, "AutofocusRunning"),
            JobState::CaptureRunning => write!(f, "CaptureRunning"),
            JobState::Completed => write!(f, "Completed"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

impl JobState {
    /// Check if the job has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Check if the camera resource is engaged in this state. The runner's
    /// busy flag rejects concurrent submissions while this holds.
    pub fn is_engaged(&self) -> bool {
        matches!(self, JobState::AutofocusRunning | JobState::CaptureRunning)
    }

    /// Check if the submitter may still abandon the job. True until the
    /// still capture starts.
    pub fn can_abandon(&self) -> bool {
        !self.is_terminal() && *self != JobState::CaptureRunning
    }
}

/// A single capture request: optional autofocus, then a still capture at the
/// path that was current when the job was created.
///
/// Exactly one job may be active per camera resource; the active job owns
/// the resource exclusively until it reaches a terminal state. Jobs are
/// never retried automatically.
#[derive(Debug)]
pub struct CaptureJob {
    id: Uuid,
    requires_autofocus: bool,
    target: UniqueCandidatePath,
    state: JobState,
    result: Option<Result<PathBuf, CaptureError>>,
}

impl CaptureJob {
    /// Create a job against the currently allocated path. Target and
    /// autofocus flag are fixed for the job's lifetime.
    pub fn new(target: UniqueCandidatePath, requires_autofocus: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            requires_autofocus,
            target,
            state: JobState::Idle,
            result: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn requires_autofocus(&self) -> bool {
        self.requires_autofocus
    }

    pub fn target(&self) -> &UniqueCandidatePath {
        &self.target
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn result(&self) -> Option<&Result<PathBuf, CaptureError>> {
        self.result.as_ref()
    }

    pub(crate) fn set_state(&mut self, next: JobState) {
        tracing::debug!(job = %self.id, from = %self.state, to = %next, "job state transition");
        self.state = next;
    }

    pub(crate) fn finish(&mut self, result: Result<PathBuf, CaptureError>) {
        self.set_state(match result {
            Ok(_) => JobState::Completed,
            Err(_) => JobState::Failed,
        });
        self.result = Some(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn target() -> UniqueCandidatePath {
        UniqueCandidatePath {
            directory: Path::new("/data/AB/3/A_2026-08-23").to_path_buf(),
            stem: "Unnamed".into(),
            extension: ".png".into(),
            path: Path::new("/data/AB/3/A_2026-08-23/Unnamed.png").to_path_buf(),
        }
    }

    #[test]
    fn state_predicates() {
        assert!(JobState::Idle.can_abandon());
        assert!(JobState::AutofocusPending.can_abandon());
        assert!(JobState::AutofocusRunning.can_abandon());
        assert!(!JobState::CaptureRunning.can_abandon());
        assert!(!JobState::Completed.can_abandon());

        assert!(JobState::AutofocusRunning.is_engaged());
        assert!(JobState::CaptureRunning.is_engaged());
        assert!(!JobState::Idle.is_engaged());

        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::CaptureRunning.is_terminal());
    }

    #[test]
    fn new_job_is_idle_with_fixed_target() {
        let job = CaptureJob::new(target(), true);
        assert_eq!(job.state(), JobState::Idle);
        assert!(job.requires_autofocus());
        assert!(job.result().is_none());
        assert_eq!(job.target().stem, "Unnamed");
    }

    #[test]
    fn finish_records_classification() {
        let mut job = CaptureJob::new(target(), false);
        job.finish(Err(CaptureError::StillCaptureFailed("sensor".into())));
        assert_eq!(job.state(), JobState::Failed);
        assert!(matches!(
            job.result(),
            Some(Err(CaptureError::StillCaptureFailed(_)))
        ));
    }
}
