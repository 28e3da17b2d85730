//! White-balance picker.

use lumen_export_model::{AdjustmentField, PartialAdjustments};

use crate::engine::{EngineError, ExportEngine, PixelSample};

/// Sample a neutral pixel and fold the correction into `adjustments`.
///
/// The engine reports the cast present at the pixel, so both values are negated before
/// they are merged. Every other field of `adjustments` is kept.
pub async fn pick_white_balance(
    engine: &dyn ExportEngine,
    adjustments: &PartialAdjustments,
    sample: PixelSample,
) -> Result<PartialAdjustments, EngineError> {
    let cast = engine.sample_pixel_for_white_balance(sample).await?;
    tracing::debug!(
        x = sample.x,
        y = sample.y,
        temperature = cast.temperature,
        tint = cast.tint,
        "Sampled white balance"
    );
    Ok(adjustments
        .merge_field(AdjustmentField::Temperature, -cast.temperature)
        .merge_field(AdjustmentField::Tint, -cast.tint))
}
