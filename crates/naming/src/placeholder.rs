//! Metadata placeholders for text watermarks.
//!
//! Watermark text may embed tokens such as `{camera_model}` or `{iso}`. The engine
//! substitutes them per image at render time; this module defines the supported set,
//! the formatting of each value, and a reference substitution used for previews.

use serde::{Deserialize, Serialize};

use crate::tokens::render_tokens;

/// Every placeholder understood in watermark text.
pub const PLACEHOLDERS: [&str; 10] = [
    "photographer",
    "camera_make",
    "camera_model",
    "lens_model",
    "aperture",
    "shutter_speed",
    "iso",
    "focal_length",
    "date_time",
    "filename",
];

/// Metadata of one source image. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageMetadata {
    pub photographer: Option<String>,
    pub camera_make: Option<String>,
    pub camera_model: Option<String>,
    pub lens_model: Option<String>,
    /// f-number, e.g. `2.8`.
    pub aperture: Option<f64>,
    /// Exposure time in seconds, e.g. `0.004`.
    pub shutter_speed: Option<f64>,
    pub iso: Option<u32>,
    /// Focal length in millimetres.
    pub focal_length: Option<f64>,
    pub date_time: Option<String>,
    pub filename: Option<String>,
}

impl ImageMetadata {
    /// Formatted value for a placeholder.
    ///
    /// Returns `None` for unrecognised names and `Some("")` for recognised
    /// placeholders whose metadatum is absent.
    pub fn value_for(&self, placeholder: &str) -> Option<String> {
        let value = match placeholder {
            "photographer" => self.photographer.clone(),
            "camera_make" => self.camera_make.clone(),
            "camera_model" => self.camera_model.clone(),
            "lens_model" => self.lens_model.clone(),
            "aperture" => self.aperture.map(|f| format!("{f:.1}")),
            "shutter_speed" => self.shutter_speed.and_then(format_shutter_speed),
            "iso" => self.iso.map(|iso| iso.to_string()),
            "focal_length" => self.focal_length.map(|mm| format!("{mm:.0}")),
            "date_time" => self.date_time.clone(),
            "filename" => self.filename.clone(),
            _ => return None,
        };
        Some(value.unwrap_or_default())
    }
}

/// Replace every supported placeholder in `text` with the image's metadata.
///
/// Unrecognised `{...}` tokens are left verbatim.
pub fn substitute_placeholders(text: &str, metadata: &ImageMetadata) -> String {
    render_tokens(text, |name| metadata.value_for(name))
}

fn format_shutter_speed(seconds: f64) -> Option<String> {
    if !seconds.is_finite() || seconds <= 0.0 {
        return None;
    }
    if seconds >= 1.0 {
        Some(format!("{seconds:.1}"))
    } else {
        Some(format!("1/{}", (1.0 / seconds).round() as u64))
    }
}
