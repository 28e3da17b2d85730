//! Scripted engine and picker shared by the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use lumen_common::clock::FixedClock;
use lumen_export_engine::{
    BatchEvent, BatchExportRequest, EngineError, ExportEngine, ExportJobController, FilePicker,
    PixelSample, PreviewHandle, PreviewRequest, SingleExportRequest, WhiteBalanceSample,
};
use tokio::sync::{mpsc, oneshot, Notify};

pub fn export_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 1)
        .unwrap()
        .and_hms_opt(10, 15, 0)
        .unwrap()
}

pub fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

/// Handles the test uses to answer the engine's pending calls.
pub struct EngineScript {
    pub single: Option<oneshot::Sender<Result<(), EngineError>>>,
    pub batch: Option<mpsc::Sender<BatchEvent>>,
    pub preview: Option<oneshot::Sender<Result<PreviewHandle, EngineError>>>,
}

/// Engine whose answers are fed in by the test. Every call is recorded.
pub struct ScriptedEngine {
    calls: Mutex<Vec<&'static str>>,
    single: Mutex<Option<oneshot::Receiver<Result<(), EngineError>>>>,
    batch: Mutex<Option<mpsc::Receiver<BatchEvent>>>,
    preview: Mutex<Option<oneshot::Receiver<Result<PreviewHandle, EngineError>>>>,
    white_balance: Mutex<Option<WhiteBalanceSample>>,
    pub single_requests: Mutex<Vec<SingleExportRequest>>,
    pub batch_requests: Mutex<Vec<BatchExportRequest>>,
}

impl ScriptedEngine {
    pub fn new() -> (Arc<Self>, EngineScript) {
        let (single_tx, single_rx) = oneshot::channel();
        let (batch_tx, batch_rx) = mpsc::channel(16);
        let (preview_tx, preview_rx) = oneshot::channel();
        let engine = Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            single: Mutex::new(Some(single_rx)),
            batch: Mutex::new(Some(batch_rx)),
            preview: Mutex::new(Some(preview_rx)),
            white_balance: Mutex::new(None),
            single_requests: Mutex::new(Vec::new()),
            batch_requests: Mutex::new(Vec::new()),
        });
        let script = EngineScript {
            single: Some(single_tx),
            batch: Some(batch_tx),
            preview: Some(preview_tx),
        };
        (engine, script)
    }

    pub fn set_white_balance(&self, sample: WhiteBalanceSample) {
        *self.white_balance.lock().unwrap() = Some(sample);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, name: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|call| *call == name)
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

#[async_trait]
impl ExportEngine for ScriptedEngine {
    async fn export_image(&self, request: SingleExportRequest) -> Result<(), EngineError> {
        self.record("export_image");
        self.single_requests.lock().unwrap().push(request);
        let answer = self.single.lock().unwrap().take();
        match answer {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(EngineError::fault("script dropped"))),
            None => Err(EngineError::fault("export_image called twice")),
        }
    }

    async fn batch_export_images(
        &self,
        request: BatchExportRequest,
    ) -> Result<mpsc::Receiver<BatchEvent>, EngineError> {
        self.record("batch_export_images");
        self.batch_requests.lock().unwrap().push(request);
        self.batch
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| EngineError::fault("batch_export_images called twice"))
    }

    async fn cancel_export(&self) {
        self.record("cancel_export");
    }

    async fn generate_watermark_preview(
        &self,
        _request: PreviewRequest,
    ) -> Result<PreviewHandle, EngineError> {
        self.record("generate_watermark_preview");
        let answer = self.preview.lock().unwrap().take();
        match answer {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(EngineError::fault("script dropped"))),
            None => Err(EngineError::fault("no preview scripted")),
        }
    }

    async fn sample_pixel_for_white_balance(
        &self,
        _sample: PixelSample,
    ) -> Result<WhiteBalanceSample, EngineError> {
        self.record("sample_pixel_for_white_balance");
        self.white_balance
            .lock()
            .unwrap()
            .ok_or_else(|| EngineError::fault("no sample scripted"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Picker answering with fixed paths. `None` plays a dismissed dialog.
///
/// With a `gate`, output dialogs stay open until the gate is notified.
#[derive(Default)]
pub struct ScriptedPicker {
    pub file: Option<PathBuf>,
    pub directory: Option<PathBuf>,
    pub watermark_image: Option<PathBuf>,
    pub gate: Option<Arc<Notify>>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedPicker {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn wait_for_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }
}

#[async_trait]
impl FilePicker for ScriptedPicker {
    async fn pick_output_file(&self, suggested_name: &str) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("pick_output_file:{suggested_name}"));
        self.wait_for_gate().await;
        self.file.clone()
    }

    async fn pick_output_directory(&self) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push("pick_output_directory".to_string());
        self.wait_for_gate().await;
        self.directory.clone()
    }

    async fn pick_watermark_image(&self) -> Option<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push("pick_watermark_image".to_string());
        self.watermark_image.clone()
    }
}

pub fn controller(
    engine: &Arc<ScriptedEngine>,
    picker: &Arc<ScriptedPicker>,
) -> ExportJobController {
    ExportJobController::new(
        engine.clone(),
        picker.clone(),
        Arc::new(FixedClock(export_time())),
    )
}
