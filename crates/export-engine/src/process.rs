//! Engine adapter for an external executable.
//!
//! Every command starts one engine process. The request is written to its stdin as a
//! single JSON line, then stdin is closed. The process answers with JSON lines on stdout,
//! one event per line, ending with exactly one terminal event:
//!
//! ```text
//! {"event":"progress","current":1,"total":3}
//! {"event":"completed"}
//! {"event":"failed","message":"disk full"}
//! {"event":"cancelled"}
//! {"event":"preview","uri":"/tmp/preview.png","width":800,"height":600}
//! {"event":"white_balance","temperature":12.5,"tint":-3.0}
//! ```
//!
//! Lines that are not events are logged and skipped. A process that exits without a
//! terminal event is reported as a fault carrying its stderr.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use lumen_common::config::EngineConfig;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, oneshot};

use crate::engine::{
    BatchEvent, BatchExportRequest, EngineError, ExportEngine, PixelSample, PreviewHandle,
    PreviewRequest, SingleExportRequest, WhiteBalanceSample,
};

#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum EngineCommand {
    ExportImage(SingleExportRequest),
    BatchExportImages(BatchExportRequest),
    GenerateWatermarkPreview(PreviewRequest),
    SamplePixelForWhiteBalance(PixelSample),
}

impl EngineCommand {
    fn name(&self) -> &'static str {
        match self {
            EngineCommand::ExportImage(_) => "export_image",
            EngineCommand::BatchExportImages(_) => "batch_export_images",
            EngineCommand::GenerateWatermarkPreview(_) => "generate_watermark_preview",
            EngineCommand::SamplePixelForWhiteBalance(_) => "sample_pixel_for_white_balance",
        }
    }

    /// Export commands can be stopped by `cancel_export`.
    fn is_cancellable(&self) -> bool {
        matches!(
            self,
            EngineCommand::ExportImage(_) | EngineCommand::BatchExportImages(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum WireEvent {
    Progress { current: usize, total: usize },
    Completed,
    Failed { message: String },
    Cancelled,
    Preview(PreviewHandle),
    WhiteBalance(WhiteBalanceSample),
}

impl WireEvent {
    fn is_terminal(&self) -> bool {
        !matches!(self, WireEvent::Progress { .. })
    }
}

/// Runs the processing engine as a child process per command.
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
    event_capacity: usize,
    cancel: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            event_capacity: 64,
            cancel: Arc::new(Mutex::new(None)),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
            .with_event_capacity(config.event_capacity)
    }

    /// Buffer size of event channels handed to callers.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Start the engine for `command` and return its event stream.
    async fn start(&self, command: EngineCommand) -> Result<mpsc::Receiver<WireEvent>, EngineError> {
        let payload = serde_json::to_string(&command)
            .map_err(|e| EngineError::fault(format!("Failed to encode engine request: {e}")))?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                EngineError::fault(format!(
                    "Failed to start engine {}: {e}",
                    self.program.display()
                ))
            })?;

        tracing::info!(
            pid = child.id(),
            program = %self.program.display(),
            command = command.name(),
            "Engine process started"
        );

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::fault("Failed to capture engine stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::fault("Failed to capture engine stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::fault("Failed to capture engine stderr"))?;

        let cancel = if command.is_cancellable() {
            let (tx, rx) = oneshot::channel();
            *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = Some(tx);
            Some(rx)
        } else {
            None
        };

        stdin
            .write_all(format!("{payload}\n").as_bytes())
            .await
            .map_err(|e| EngineError::fault(format!("Failed to send engine request: {e}")))?;
        drop(stdin);

        let (tx, rx) = mpsc::channel(self.event_capacity);
        tokio::spawn(drive(child, stdout, stderr, cancel, tx));
        Ok(rx)
    }

    /// Run `command` to its terminal event. Failures and cancellations become errors.
    async fn run(&self, command: EngineCommand) -> Result<WireEvent, EngineError> {
        let mut events = self.start(command).await?;
        while let Some(event) = events.recv().await {
            match event {
                WireEvent::Progress { .. } => {}
                WireEvent::Failed { message } => return Err(EngineError::Fault(message)),
                WireEvent::Cancelled => return Err(EngineError::Cancelled),
                terminal => return Ok(terminal),
            }
        }
        Err(EngineError::fault("Engine closed its output without a result"))
    }
}

#[async_trait]
impl ExportEngine for ProcessEngine {
    async fn export_image(&self, request: SingleExportRequest) -> Result<(), EngineError> {
        match self.run(EngineCommand::ExportImage(request)).await? {
            WireEvent::Completed => Ok(()),
            other => Err(unexpected(&other)),
        }
    }

    async fn batch_export_images(
        &self,
        request: BatchExportRequest,
    ) -> Result<mpsc::Receiver<BatchEvent>, EngineError> {
        let mut wire = self.start(EngineCommand::BatchExportImages(request)).await?;
        let (tx, rx) = mpsc::channel(self.event_capacity);
        tokio::spawn(async move {
            while let Some(event) = wire.recv().await {
                let event = match event {
                    WireEvent::Progress { current, total } => BatchEvent::Progress { current, total },
                    WireEvent::Completed => BatchEvent::Completed,
                    WireEvent::Failed { message } => BatchEvent::Failed { message },
                    WireEvent::Cancelled => BatchEvent::Cancelled,
                    other => BatchEvent::Failed {
                        message: unexpected(&other).to_string(),
                    },
                };
                let terminal = event.is_terminal();
                if tx.send(event).await.is_err() || terminal {
                    break;
                }
            }
        });
        Ok(rx)
    }

    async fn cancel_export(&self) {
        let pending = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match pending {
            Some(tx) => {
                if tx.send(()).is_err() {
                    tracing::debug!("Cancel ignored: export already finished");
                }
            }
            None => tracing::debug!("Cancel ignored: no export running"),
        }
    }

    async fn generate_watermark_preview(
        &self,
        request: PreviewRequest,
    ) -> Result<PreviewHandle, EngineError> {
        match self.run(EngineCommand::GenerateWatermarkPreview(request)).await? {
            WireEvent::Preview(handle) => Ok(handle),
            other => Err(unexpected(&other)),
        }
    }

    async fn sample_pixel_for_white_balance(
        &self,
        sample: PixelSample,
    ) -> Result<WhiteBalanceSample, EngineError> {
        match self
            .run(EngineCommand::SamplePixelForWhiteBalance(sample))
            .await?
        {
            WireEvent::WhiteBalance(cast) => Ok(cast),
            other => Err(unexpected(&other)),
        }
    }

    fn name(&self) -> &str {
        "process"
    }
}

fn unexpected(event: &WireEvent) -> EngineError {
    EngineError::fault(format!("Unexpected engine event: {event:?}"))
}

/// Forward events from one engine process until it ends or is cancelled.
async fn drive(
    mut child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
    cancel: Option<oneshot::Receiver<()>>,
    events: mpsc::Sender<WireEvent>,
) {
    let pid = child.id();

    // Drain stderr concurrently so the engine never blocks on a full pipe.
    let stderr_task = tokio::spawn(async move {
        let mut output = String::new();
        match BufReader::new(stderr).read_to_string(&mut output).await {
            Ok(_) => output,
            Err(err) => format!("<failed to read engine stderr: {err}>"),
        }
    });

    // Resolves only when a cancellation is actually requested.
    let cancelled = async move {
        if let Some(rx) = cancel {
            if rx.await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    };
    tokio::pin!(cancelled);

    let mut lines = BufReader::new(stdout).lines();
    let mut finished = false;
    loop {
        tokio::select! {
            _ = &mut cancelled => {
                tracing::info!(pid, "Stopping engine process on cancellation");
                if let Err(err) = child.kill().await {
                    tracing::warn!(pid, error = %err, "Failed to stop engine process");
                }
                stderr_task.abort();
                let _ = events.send(WireEvent::Cancelled).await;
                return;
            }
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() {
                        match serde_json::from_str::<WireEvent>(trimmed) {
                            Ok(event) => {
                                finished = event.is_terminal();
                                if events.send(event).await.is_err() {
                                    tracing::debug!(pid, "Engine event receiver dropped");
                                }
                                if finished {
                                    break;
                                }
                            }
                            Err(err) => {
                                tracing::debug!(pid, line = trimmed, error = %err, "Skipping engine output");
                            }
                        }
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    tracing::warn!(pid, error = %err, "Failed reading engine output");
                    break;
                }
            }
        }
    }

    let status = child.wait().await;
    let stderr_output = stderr_task
        .await
        .unwrap_or_else(|_| "<failed to join stderr reader>".to_string());

    if finished {
        tracing::debug!(pid, "Engine process finished");
        return;
    }

    let message = match status {
        Ok(status) if status.success() => {
            "Engine exited without reporting a result".to_string()
        }
        Ok(status) => format!(
            "Engine failed (status {}): {}",
            status,
            stderr_output.trim()
        ),
        Err(err) => format!("Failed to wait on engine: {err}"),
    };
    tracing::warn!(pid, error = %message, "Engine process ended without a terminal event");
    let _ = events.send(WireEvent::Failed { message }).await;
}
