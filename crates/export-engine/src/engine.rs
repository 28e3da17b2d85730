//! Command interface of the external processing engine.

use std::path::PathBuf;

use async_trait::async_trait;
use lumen_export_model::{
    ColorAdjustments, ExportFormat, NormalizedExportSettings, PlannedOutput, ResolvedWatermark,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Failure reported across the engine boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Render or write failure. The message is shown to the user as-is.
    #[error("{0}")]
    Fault(String),

    /// The engine acknowledged a cancellation request.
    #[error("Export cancelled")]
    Cancelled,
}

impl EngineError {
    pub fn fault(msg: impl Into<String>) -> Self {
        Self::Fault(msg.into())
    }
}

/// Render one image to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleExportRequest {
    pub job_id: u64,
    pub original_path: PathBuf,
    pub output_path: PathBuf,
    pub adjustments: ColorAdjustments,
    pub export_settings: NormalizedExportSettings,
}

/// Render many images into one directory.
///
/// Adjustments are not carried inline; the engine reads each image's stored edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchExportRequest {
    pub job_id: u64,
    pub output_folder: PathBuf,
    pub paths: Vec<PathBuf>,
    pub export_settings: NormalizedExportSettings,
    pub output_format: ExportFormat,
    /// File names resolved up front, in `paths` order.
    pub outputs: Vec<PlannedOutput>,
}

/// Events emitted while a batch runs. Exactly one terminal event ends the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Progress { current: usize, total: usize },
    Completed,
    Failed { message: String },
    Cancelled,
}

impl BatchEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BatchEvent::Progress { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub image_path: PathBuf,
    pub adjustments: ColorAdjustments,
    pub watermark: ResolvedWatermark,
}

/// Rendered watermark preview, owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewHandle {
    /// Location of the rendered image (file path or data URI).
    pub uri: String,
    pub width: u32,
    pub height: u32,
}

/// Pixel to sample for white balance, in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelSample {
    pub x: u32,
    pub y: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crop_x: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crop_y: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rotation: Option<f64>,
    #[serde(default)]
    pub flip_horizontal: bool,
    #[serde(default)]
    pub flip_vertical: bool,
}

/// Color cast measured at a sampled pixel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WhiteBalanceSample {
    pub temperature: f64,
    pub tint: f64,
}

/// The external image-processing engine.
#[async_trait]
pub trait ExportEngine: Send + Sync {
    /// Render and write a single file.
    async fn export_image(&self, request: SingleExportRequest) -> Result<(), EngineError>;

    /// Start a batch and return its event stream.
    async fn batch_export_images(
        &self,
        request: BatchExportRequest,
    ) -> Result<mpsc::Receiver<BatchEvent>, EngineError>;

    /// Best-effort cancellation of the running export. The outcome arrives through the
    /// export's own result.
    async fn cancel_export(&self);

    async fn generate_watermark_preview(
        &self,
        request: PreviewRequest,
    ) -> Result<PreviewHandle, EngineError>;

    async fn sample_pixel_for_white_balance(
        &self,
        sample: PixelSample,
    ) -> Result<WhiteBalanceSample, EngineError>;

    /// Engine name for logs.
    fn name(&self) -> &str;
}
