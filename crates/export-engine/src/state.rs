//! Export job state and its transition function.

use lumen_common::error::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};

use crate::engine::{BatchEvent, EngineError};

/// Lifecycle of the controller's current job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExportStatus {
    #[default]
    Idle,
    Exporting,
    Success,
    Error,
    Cancelled,
}

impl ExportStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExportStatus::Success | ExportStatus::Error | ExportStatus::Cancelled
        )
    }
}

/// Images written so far out of the job total. `current <= total` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExportProgress {
    pub current: usize,
    pub total: usize,
}

/// Something the engine reported about a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobEvent {
    Progress { current: usize },
    Completed,
    Failed { message: String },
    Cancelled,
}

impl From<BatchEvent> for JobEvent {
    fn from(event: BatchEvent) -> Self {
        match event {
            BatchEvent::Progress { current, .. } => JobEvent::Progress { current },
            BatchEvent::Completed => JobEvent::Completed,
            BatchEvent::Failed { message } => JobEvent::Failed { message },
            BatchEvent::Cancelled => JobEvent::Cancelled,
        }
    }
}

impl From<Result<(), EngineError>> for JobEvent {
    fn from(result: Result<(), EngineError>) -> Self {
        match result {
            Ok(()) => JobEvent::Completed,
            Err(EngineError::Fault(message)) => JobEvent::Failed { message },
            Err(EngineError::Cancelled) => JobEvent::Cancelled,
        }
    }
}

/// Process-local export state observed by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportState {
    pub status: ExportStatus,
    pub progress: ExportProgress,
    /// Empty unless `status` is `Error`.
    pub error_message: String,
    /// Job the state belongs to. Events for any other job are ignored.
    pub job_id: Option<u64>,
}

impl ExportState {
    /// State of a freshly submitted job.
    pub fn exporting(job_id: u64, total: usize) -> Self {
        Self {
            status: ExportStatus::Exporting,
            progress: ExportProgress { current: 0, total },
            error_message: String::new(),
            job_id: Some(job_id),
        }
    }

    /// State after a local failure, before anything reached the engine.
    pub fn failed(job_id: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            status: ExportStatus::Error,
            progress: ExportProgress::default(),
            error_message: message.into(),
            job_id,
        }
    }

    pub fn is_exporting(&self) -> bool {
        self.status == ExportStatus::Exporting
    }

    /// The finished job as a `Result`, or `None` while idle or still exporting.
    pub fn outcome(&self) -> Option<ExportResult<()>> {
        match self.status {
            ExportStatus::Idle | ExportStatus::Exporting => None,
            ExportStatus::Success => Some(Ok(())),
            ExportStatus::Error => Some(Err(ExportError::engine(self.error_message.clone()))),
            ExportStatus::Cancelled => Some(Err(ExportError::Cancelled)),
        }
    }

    /// Apply an engine event for `job_id`. Returns whether anything changed.
    ///
    /// Events are dropped when they belong to another job or arrive after the job reached
    /// a terminal state, so a late cancellation echo never replaces `Success` or `Error`.
    /// Progress only moves forward and never passes the total.
    pub fn apply(&mut self, job_id: u64, event: &JobEvent) -> bool {
        if self.job_id != Some(job_id) || !self.is_exporting() {
            return false;
        }
        match event {
            JobEvent::Progress { current } => {
                let current = (*current).min(self.progress.total);
                if current <= self.progress.current {
                    return false;
                }
                self.progress.current = current;
            }
            JobEvent::Completed => {
                self.status = ExportStatus::Success;
                self.progress.current = self.progress.total;
            }
            JobEvent::Failed { message } => {
                self.status = ExportStatus::Error;
                self.error_message = message.clone();
            }
            JobEvent::Cancelled => {
                self.status = ExportStatus::Cancelled;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_and_capped() {
        let mut state = ExportState::exporting(1, 3);
        assert!(state.apply(1, &JobEvent::Progress { current: 2 }));
        assert!(!state.apply(1, &JobEvent::Progress { current: 1 }));
        assert_eq!(state.progress.current, 2);
        assert!(state.apply(1, &JobEvent::Progress { current: 10 }));
        assert_eq!(state.progress, ExportProgress { current: 3, total: 3 });
        assert!(!state.apply(1, &JobEvent::Progress { current: 3 }));
    }

    #[test]
    fn test_terminal_state_is_sticky() {
        let mut state = ExportState::exporting(4, 1);
        assert!(state.apply(4, &JobEvent::Completed));
        assert!(!state.apply(4, &JobEvent::Cancelled));
        assert_eq!(state.status, ExportStatus::Success);
        assert_eq!(state.progress.current, 1);

        let mut failed = ExportState::exporting(5, 2);
        failed.apply(
            5,
            &JobEvent::Failed {
                message: "disk full".into(),
            },
        );
        assert!(!failed.apply(5, &JobEvent::Completed));
        assert_eq!(failed.status, ExportStatus::Error);
        assert_eq!(failed.error_message, "disk full");
    }

    #[test]
    fn test_events_for_other_jobs_are_ignored() {
        let mut state = ExportState::exporting(2, 5);
        assert!(!state.apply(1, &JobEvent::Completed));
        assert!(!ExportState::default().apply(2, &JobEvent::Progress { current: 1 }));
        assert!(state.is_exporting());
    }

    #[test]
    fn test_outcome_of_terminal_states() {
        assert!(ExportState::default().outcome().is_none());
        assert!(ExportState::exporting(1, 2).outcome().is_none());

        let mut state = ExportState::exporting(1, 2);
        state.apply(1, &JobEvent::Completed);
        assert!(matches!(state.outcome(), Some(Ok(()))));

        let failed = ExportState::failed(Some(2), "disk full");
        match failed.outcome() {
            Some(Err(err @ ExportError::Engine { .. })) => assert_eq!(err.to_string(), "disk full"),
            other => panic!("unexpected outcome: {other:?}"),
        }

        let mut cancelled = ExportState::exporting(3, 1);
        cancelled.apply(3, &JobEvent::Cancelled);
        assert!(matches!(cancelled.outcome(), Some(Err(ExportError::Cancelled))));
    }

    #[test]
    fn test_engine_results_map_to_events() {
        assert_eq!(JobEvent::from(Ok(())), JobEvent::Completed);
        assert_eq!(
            JobEvent::from(Err(EngineError::fault("disk full"))),
            JobEvent::Failed {
                message: "disk full".into()
            }
        );
        assert_eq!(JobEvent::from(Err(EngineError::Cancelled)), JobEvent::Cancelled);
    }
}
