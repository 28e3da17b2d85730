//! Export job controller.
//!
//! Owns the [`ExportState`] of one interactive surface and runs at most one export at a
//! time. The state is published through a `watch` channel; every transition goes through
//! [`watch::Sender::send_if_modified`] so the check and the update are a single step.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lumen_common::clock::ExportClock;
use lumen_common::error::{ExportError, ExportResult};
use lumen_export_model::{Destination, ExportJob, ExportMode, ExportSettings, PartialAdjustments};
use tokio::sync::watch;

use crate::engine::{BatchExportRequest, EngineError, ExportEngine, SingleExportRequest};
use crate::picker::FilePicker;
use crate::plan::{export_mode, plan_job, suggested_file_name, ExportContext, JobPlan};
use crate::state::{ExportState, JobEvent};

/// What the user asked to export.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub targets: Vec<PathBuf>,
    /// Current edits of the editor image. Only used in single mode.
    pub adjustments: PartialAdjustments,
    pub settings: ExportSettings,
    pub context: ExportContext,
}

/// Result of an accepted submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The job was handed to the engine. Watch the state for its outcome.
    Started { job_id: u64 },
    /// The user dismissed the destination dialog. Nothing was sent to the engine.
    DestinationCancelled,
}

/// Which job the engine knows about, and a cancel that arrived before it did.
#[derive(Debug, Default)]
struct DispatchSlot {
    dispatched: Option<u64>,
    cancel_pending: Option<u64>,
}

pub struct ExportJobController {
    engine: Arc<dyn ExportEngine>,
    picker: Arc<dyn FilePicker>,
    clock: Arc<dyn ExportClock>,
    state: Arc<watch::Sender<ExportState>>,
    selection: Mutex<Vec<PathBuf>>,
    dispatch: Mutex<DispatchSlot>,
    last_job_id: AtomicU64,
}

impl ExportJobController {
    pub fn new(
        engine: Arc<dyn ExportEngine>,
        picker: Arc<dyn FilePicker>,
        clock: Arc<dyn ExportClock>,
    ) -> Self {
        let (state, _) = watch::channel(ExportState::default());
        Self {
            engine,
            picker,
            clock,
            state: Arc::new(state),
            selection: Mutex::new(Vec::new()),
            dispatch: Mutex::new(DispatchSlot::default()),
            last_job_id: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ExportState {
        self.state.borrow().clone()
    }

    pub fn selection(&self) -> Vec<PathBuf> {
        self.selection
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record the current target selection.
    ///
    /// A different selection resets a finished job to `Idle`. A running job is bound to
    /// its own snapshot of targets and is left alone.
    pub fn select(&self, targets: Vec<PathBuf>) {
        {
            let mut selection = self.selection.lock().unwrap_or_else(PoisonError::into_inner);
            if *selection == targets {
                return;
            }
            *selection = targets;
        }

        let reset = self.state.send_if_modified(|state| {
            if state.is_exporting() || *state == ExportState::default() {
                return false;
            }
            *state = ExportState::default();
            true
        });
        if reset {
            tracing::debug!("Selection changed, export state reset");
        }
    }

    /// Submit an export.
    ///
    /// Fails with [`ExportError::NoTargets`] (state untouched) for an empty selection and
    /// with [`ExportError::Busy`] while another job runs. Settings are validated before
    /// any dialog opens; a validation failure moves the state to `Error`. Once a
    /// destination is chosen the job runs in a background task and this returns
    /// immediately.
    ///
    /// Dropping the returned future before a destination is chosen abandons the job and
    /// returns the state to `Idle`.
    pub async fn submit(&self, request: SubmitRequest) -> ExportResult<SubmitOutcome> {
        let SubmitRequest {
            targets,
            adjustments,
            settings,
            context,
        } = request;

        if targets.is_empty() {
            tracing::warn!("Export rejected: no images selected");
            return Err(ExportError::NoTargets);
        }

        let job_id = self.last_job_id.fetch_add(1, Ordering::Relaxed) + 1;
        let total = targets.len();
        let mut accepted = false;
        self.state.send_if_modified(|state| {
            if state.is_exporting() {
                return false;
            }
            *state = ExportState::exporting(job_id, total);
            accepted = true;
            true
        });
        if !accepted {
            tracing::warn!(job_id, "Export rejected: another export is in progress");
            return Err(ExportError::Busy);
        }

        let pending = PendingSubmit {
            state: &self.state,
            job_id,
            armed: true,
        };
        *self.selection.lock().unwrap_or_else(PoisonError::into_inner) = targets.clone();

        let mode = export_mode(context, total);
        tracing::info!(job_id, targets = total, ?mode, ?context, "Export submitted");

        match self
            .prepare(job_id, &targets, &adjustments, &settings, mode)
            .await
        {
            Ok(Some(job)) => {
                self.dispatch(job);
                pending.disarm();
                Ok(SubmitOutcome::Started { job_id })
            }
            Ok(None) => {
                tracing::info!(job_id, "Destination selection cancelled");
                drop(pending);
                Ok(SubmitOutcome::DestinationCancelled)
            }
            Err(err) => {
                tracing::warn!(job_id, error = %err, "Export rejected before dispatch");
                let message = err.to_string();
                self.state.send_if_modified(|state| {
                    if state.job_id != Some(job_id) || !state.is_exporting() {
                        return false;
                    }
                    *state = ExportState::failed(Some(job_id), message);
                    true
                });
                pending.disarm();
                Err(err)
            }
        }
    }

    /// Validate, ask for a destination, and plan. `None` when the dialog was dismissed.
    async fn prepare(
        &self,
        job_id: u64,
        targets: &[PathBuf],
        adjustments: &PartialAdjustments,
        settings: &ExportSettings,
        mode: ExportMode,
    ) -> ExportResult<Option<ExportJob>> {
        let settings = settings.normalized()?;
        let created_at = self.clock.now();

        let destination = match mode {
            ExportMode::Single => {
                let suggested = suggested_file_name(&targets[0], &settings, created_at);
                match self.picker.pick_output_file(&suggested).await {
                    Some(path) => Destination::File(path),
                    None => return Ok(None),
                }
            }
            ExportMode::Batch => match self.picker.pick_output_directory().await {
                Some(dir) => Destination::Directory(dir),
                None => return Ok(None),
            },
        };

        plan_job(JobPlan {
            job_id,
            targets,
            adjustments,
            settings,
            destination,
            created_at,
        })
        .map(Some)
    }

    fn dispatch(&self, job: ExportJob) {
        let job_id = job.job_id;
        let cancelled = {
            let mut slot = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
            slot.dispatched = Some(job_id);
            slot.cancel_pending.take() == Some(job_id)
        };
        if cancelled {
            tracing::info!(job_id, "Export cancelled before reaching the engine");
            report(&self.state, job_id, JobEvent::Cancelled);
            return;
        }

        let engine = Arc::clone(&self.engine);
        let state = Arc::clone(&self.state);
        tokio::spawn(run_job(engine, state, job));
    }

    /// Ask the engine to stop the running job.
    ///
    /// Returns `false` without contacting the engine unless a job is running. The final
    /// state is whatever the engine reports next, which may still be `Success`. A cancel
    /// made while the destination dialog is still open is held until the job is planned,
    /// and the job then ends `Cancelled` without reaching the engine.
    pub async fn cancel(&self) -> bool {
        let job_id = {
            let state = self.state.borrow();
            if !state.is_exporting() {
                tracing::debug!("Cancel ignored: no export running");
                return false;
            }
            state.job_id
        };

        let dispatched = {
            let mut slot = self.dispatch.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.dispatched == job_id {
                true
            } else {
                slot.cancel_pending = job_id;
                false
            }
        };
        if !dispatched {
            tracing::info!(job_id, "Cancel held until the job is dispatched");
            return true;
        }

        tracing::info!(job_id, "Requesting export cancellation");
        self.engine.cancel_export().await;
        true
    }

    /// Wait until no job is running and return the state at that point.
    pub async fn wait_for_terminal(&self) -> ExportState {
        let mut rx = self.state.subscribe();
        let result = rx
            .wait_for(|state| !state.is_exporting())
            .await
            .map(|state| state.clone());
        result.unwrap_or_else(|_| self.state())
    }
}

/// Puts an accepted job back to `Idle` unless it was dispatched or failed explicitly.
struct PendingSubmit<'a> {
    state: &'a watch::Sender<ExportState>,
    job_id: u64,
    armed: bool,
}

impl PendingSubmit<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for PendingSubmit<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let job_id = self.job_id;
        let reset = self.state.send_if_modified(|state| {
            if state.job_id != Some(job_id) || !state.is_exporting() {
                return false;
            }
            *state = ExportState::default();
            true
        });
        if reset {
            tracing::debug!(job_id, "Submission abandoned before dispatch, state reset");
        }
    }
}

/// Drive one job to its terminal event.
async fn run_job(
    engine: Arc<dyn ExportEngine>,
    state: Arc<watch::Sender<ExportState>>,
    job: ExportJob,
) {
    let job_id = job.job_id;

    match job.mode() {
        ExportMode::Single => {
            let Some(request) = single_request(&job) else {
                report(&state, job_id, JobEvent::Failed {
                    message: "The export job has no planned output".to_string(),
                });
                return;
            };
            tracing::info!(
                job_id,
                engine = engine.name(),
                output = %request.output_path.display(),
                "Dispatching single export"
            );
            let result = engine.export_image(request).await;
            report(&state, job_id, JobEvent::from(result));
        }
        ExportMode::Batch => {
            let request = BatchExportRequest {
                job_id,
                output_folder: job.destination.path().to_path_buf(),
                paths: job.targets.clone(),
                export_settings: job.settings.clone(),
                output_format: job.settings.format,
                outputs: job.outputs.clone(),
            };
            tracing::info!(
                job_id,
                engine = engine.name(),
                targets = job.total(),
                output = %job.destination.path().display(),
                "Dispatching batch export"
            );
            let mut events = match engine.batch_export_images(request).await {
                Ok(events) => events,
                Err(err) => {
                    report(&state, job_id, JobEvent::from(Err::<(), EngineError>(err)));
                    return;
                }
            };

            let mut finished = false;
            while let Some(event) = events.recv().await {
                finished = event.is_terminal();
                report(&state, job_id, event.into());
                if finished {
                    break;
                }
            }
            if !finished {
                report(&state, job_id, JobEvent::Failed {
                    message: "The engine stopped without reporting a result".to_string(),
                });
            }
        }
    }
}

fn single_request(job: &ExportJob) -> Option<SingleExportRequest> {
    let planned = job.outputs.first()?;
    Some(SingleExportRequest {
        job_id: job.job_id,
        original_path: planned.target.clone(),
        output_path: planned.output.clone(),
        adjustments: job
            .adjustments_for(&planned.target)
            .cloned()
            .unwrap_or_default(),
        export_settings: job.settings.clone(),
    })
}

fn report(state: &watch::Sender<ExportState>, job_id: u64, event: JobEvent) {
    let applied = state.send_if_modified(|current| current.apply(job_id, &event));
    match (&event, applied) {
        (JobEvent::Progress { .. }, _) => {}
        (_, true) => {
            let current = state.borrow();
            tracing::info!(
                job_id,
                status = ?current.status,
                error = %current.error_message,
                "Export finished"
            );
        }
        (_, false) => {
            tracing::debug!(job_id, ?event, "Ignored event for a finished or superseded job");
        }
    }
}
