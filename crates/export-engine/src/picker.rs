//! File-picker collaborator.
//!
//! Pickers return `None` when the user dismisses the dialog. Cancellation is an ordinary
//! outcome, never an error.

use std::path::PathBuf;

use async_trait::async_trait;
use lumen_export_model::WatermarkSpec;

#[async_trait]
pub trait FilePicker: Send + Sync {
    /// Ask for an output file, pre-filled with `suggested_name`.
    async fn pick_output_file(&self, suggested_name: &str) -> Option<PathBuf>;

    async fn pick_output_directory(&self) -> Option<PathBuf>;

    async fn pick_watermark_image(&self) -> Option<PathBuf>;
}

/// Let the user choose a watermark image.
///
/// A selection yields a copy of `spec` switched to the image variant. `None` means the
/// dialog was dismissed and `spec` stays as it was.
pub async fn choose_watermark_image(
    spec: &WatermarkSpec,
    picker: &dyn FilePicker,
) -> Option<WatermarkSpec> {
    match picker.pick_watermark_image().await {
        Some(path) => {
            tracing::debug!(path = %path.display(), "Watermark image selected");
            Some(spec.with_image(path))
        }
        None => {
            tracing::debug!("Watermark image selection cancelled");
            None
        }
    }
}

/// Non-interactive picker answering with preset paths.
#[derive(Debug, Clone, Default)]
pub struct PresetPicker {
    output: Option<PathBuf>,
    watermark_image: Option<PathBuf>,
}

impl PresetPicker {
    pub fn new(output: Option<PathBuf>, watermark_image: Option<PathBuf>) -> Self {
        Self {
            output,
            watermark_image,
        }
    }
}

#[async_trait]
impl FilePicker for PresetPicker {
    /// An existing directory preset receives the suggested name.
    async fn pick_output_file(&self, suggested_name: &str) -> Option<PathBuf> {
        let output = self.output.as_deref()?;
        if output.is_dir() {
            Some(output.join(suggested_name))
        } else {
            Some(output.to_path_buf())
        }
    }

    async fn pick_output_directory(&self) -> Option<PathBuf> {
        self.output.clone()
    }

    async fn pick_watermark_image(&self) -> Option<PathBuf> {
        self.watermark_image.clone()
    }
}
