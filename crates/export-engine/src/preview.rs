//! Watermark previews.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use lumen_common::error::{ExportError, ExportResult};
use lumen_export_model::{PartialAdjustments, WatermarkSpec};
use tokio::sync::watch;

use crate::engine::{ExportEngine, PreviewHandle, PreviewRequest};

/// Build the engine request for previewing `spec` on `image_path`.
///
/// `Ok(None)` when the watermark is disabled, since there is nothing to draw.
pub fn preview_request(
    image_path: impl Into<PathBuf>,
    adjustments: &PartialAdjustments,
    spec: &WatermarkSpec,
) -> ExportResult<Option<PreviewRequest>> {
    let Some(watermark) = spec.normalize_for_submission()? else {
        return Ok(None);
    };
    Ok(Some(PreviewRequest {
        image_path: image_path.into(),
        adjustments: adjustments.resolve(),
        watermark,
    }))
}

/// Runs preview renders independently of export jobs.
///
/// One request may be outstanding at a time; further requests are rejected with
/// [`ExportError::PreviewBusy`]. A failed render clears the displayed preview.
pub struct PreviewController {
    engine: Arc<dyn ExportEngine>,
    busy: AtomicBool,
    current: watch::Sender<Option<PreviewHandle>>,
}

impl PreviewController {
    pub fn new(engine: Arc<dyn ExportEngine>) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            engine,
            busy: AtomicBool::new(false),
            current,
        }
    }

    /// The preview currently on display.
    pub fn current(&self) -> Option<PreviewHandle> {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<PreviewHandle>> {
        self.current.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Render a preview. Engine failures yield `Ok(None)`.
    pub async fn request(&self, request: PreviewRequest) -> ExportResult<Option<PreviewHandle>> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Preview rejected: another preview is being generated");
            return Err(ExportError::PreviewBusy);
        }
        let _busy = BusyFlag(&self.busy);

        tracing::debug!(image = %request.image_path.display(), "Generating watermark preview");
        match self.engine.generate_watermark_preview(request).await {
            Ok(handle) => {
                self.current.send_replace(Some(handle.clone()));
                Ok(Some(handle))
            }
            Err(err) => {
                tracing::warn!(error = %err, "Watermark preview failed");
                self.current.send_replace(None);
                Ok(None)
            }
        }
    }
}

/// Clears the busy flag when the request ends, including on cancellation of the future.
struct BusyFlag<'a>(&'a AtomicBool);

impl Drop for BusyFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
