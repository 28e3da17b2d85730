//! Watermark description.
//!
//! [`WatermarkSpec`] is the value edited in the export panel. It keeps both the text
//! and the image variant around so toggling between them loses nothing. Before a job
//! is submitted it is reduced with [`WatermarkSpec::normalize_for_submission`] to a
//! [`ResolvedWatermark`], or to nothing at all when the watermark is disabled.

use std::path::{Path, PathBuf};

use lumen_common::error::{ExportError, ExportResult};
use lumen_naming::tokens::scan_tokens;
use serde::{Deserialize, Serialize};

use crate::color::Rgba;

/// Image formats accepted as watermark sources.
pub const WATERMARK_IMAGE_EXTENSIONS: [&str; 7] =
    ["png", "jpg", "jpeg", "webp", "tif", "tiff", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WatermarkType {
    #[default]
    Text,
    Image,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

/// Anchor plus margins. Margins are measured from the anchored edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatermarkPosition {
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
    pub margin_x: u32,
    pub margin_y: u32,
}

impl Default for WatermarkPosition {
    fn default() -> Self {
        Self {
            horizontal: HorizontalAlignment::Right,
            vertical: VerticalAlignment::Bottom,
            margin_x: 50,
            margin_y: 50,
        }
    }
}

impl WatermarkPosition {
    /// Top-left origin of a `mark`-sized watermark on a `canvas`-sized image.
    ///
    /// Centered axes ignore their margin. Origins are clamped to the canvas' top-left
    /// corner when the mark does not fit.
    pub fn place(&self, canvas: (u32, u32), mark: (u32, u32)) -> (u32, u32) {
        let x = match self.horizontal {
            HorizontalAlignment::Left => self.margin_x as i64,
            HorizontalAlignment::Center => (canvas.0 as i64 - mark.0 as i64) / 2,
            HorizontalAlignment::Right => canvas.0 as i64 - mark.0 as i64 - self.margin_x as i64,
        };
        let y = match self.vertical {
            VerticalAlignment::Top => self.margin_y as i64,
            VerticalAlignment::Center => (canvas.1 as i64 - mark.1 as i64) / 2,
            VerticalAlignment::Bottom => canvas.1 as i64 - mark.1 as i64 - self.margin_y as i64,
        };
        (x.max(0) as u32, y.max(0) as u32)
    }
}

/// Styling of a text watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextWatermarkSettings {
    /// Text with embedded `{placeholder}` tokens. May be empty.
    pub text: String,
    pub font_family: String,
    /// Points, before the watermark scale is applied.
    pub font_size: f32,
    pub color: Rgba,
    pub bold: bool,
    pub italic: bool,
    pub shadow: bool,
    pub shadow_color: Rgba,
    pub shadow_offset_x: i32,
    pub shadow_offset_y: i32,
}

impl Default for TextWatermarkSettings {
    fn default() -> Self {
        Self {
            text: "© {photographer} - {camera_make} {camera_model} {lens_model} - \
                   {focal_length}mm f/{aperture} {shutter_speed}s ISO{iso} - {date_time} {filename}"
                .to_string(),
            font_family: "Arial".to_string(),
            font_size: 24.0,
            color: Rgba::WHITE,
            bold: false,
            italic: false,
            shadow: true,
            shadow_color: Rgba::new(0, 0, 0, 128),
            shadow_offset_x: 1,
            shadow_offset_y: 1,
        }
    }
}

impl TextWatermarkSettings {
    /// Text color with the watermark opacity folded into its alpha.
    pub fn effective_color(&self, opacity: f32) -> Rgba {
        self.color.with_alpha_scaled(opacity)
    }

    /// Shadow color with the watermark opacity folded into its alpha.
    pub fn effective_shadow_color(&self, opacity: f32) -> Rgba {
        self.shadow_color.with_alpha_scaled(opacity)
    }

    /// Rendered font size for a watermark scale.
    pub fn scaled_font_size(&self, scale: f32) -> f32 {
        self.font_size * scale
    }
}

/// The watermark as edited in the export panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkSpec {
    pub enabled: bool,
    pub watermark_type: WatermarkType,
    pub position: WatermarkPosition,
    /// Size multiplier, typically between 0.1 and 3.0.
    pub scale: f32,
    /// Overall opacity in `[0, 1]`, applied on top of per-color alpha.
    pub opacity: f32,
    pub text_settings: Option<TextWatermarkSettings>,
    pub image_path: Option<PathBuf>,
}

impl Default for WatermarkSpec {
    fn default() -> Self {
        Self::default_spec()
    }
}

impl WatermarkSpec {
    /// The fixed starting point: disabled, bottom-right text watermark.
    pub fn default_spec() -> Self {
        Self {
            enabled: false,
            watermark_type: WatermarkType::Text,
            position: WatermarkPosition::default(),
            scale: 1.0,
            opacity: 0.8,
            text_settings: Some(TextWatermarkSettings::default()),
            image_path: None,
        }
    }

    /// Switch to the image variant using `path`, keeping every other setting.
    pub fn with_image(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            watermark_type: WatermarkType::Image,
            image_path: Some(path.into()),
            ..self.clone()
        }
    }

    /// Reduce the spec to what the engine receives.
    ///
    /// Returns `Ok(None)` when disabled, whatever the other fields hold. Otherwise
    /// every optional part is filled in, opacity is clamped to `[0, 1]`, and the
    /// variant-specific requirements are checked.
    pub fn normalize_for_submission(&self) -> ExportResult<Option<ResolvedWatermark>> {
        if !self.enabled {
            return Ok(None);
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(ExportError::validation(format!(
                "Watermark scale must be a positive number, got {}",
                self.scale
            )));
        }
        if !self.opacity.is_finite() {
            return Err(ExportError::validation("Watermark opacity must be a number"));
        }

        let content = match self.watermark_type {
            WatermarkType::Text => {
                let settings = self.text_settings.clone().unwrap_or_default();
                if !settings.font_size.is_finite() || settings.font_size <= 0.0 {
                    return Err(ExportError::validation(format!(
                        "Watermark font size must be positive, got {}",
                        settings.font_size
                    )));
                }
                scan_tokens(&settings.text).map_err(|e| {
                    ExportError::validation(format!("Malformed watermark text: {e}"))
                })?;
                WatermarkContent::Text {
                    text_settings: settings,
                }
            }
            WatermarkType::Image => {
                let path = self.image_path.as_deref().ok_or_else(|| {
                    ExportError::validation("An image watermark requires an image file")
                })?;
                check_watermark_image(path)?;
                WatermarkContent::Image {
                    image_path: path.to_path_buf(),
                }
            }
        };

        Ok(Some(ResolvedWatermark {
            position: self.position,
            scale: self.scale,
            opacity: self.opacity.clamp(0.0, 1.0),
            content,
        }))
    }
}

fn check_watermark_image(path: &Path) -> ExportResult<()> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .is_some_and(|ext| WATERMARK_IMAGE_EXTENSIONS.contains(&ext.as_str()));
    if !supported {
        return Err(ExportError::validation(format!(
            "Unsupported watermark image format: {}",
            path.display()
        )));
    }
    if !path.is_file() {
        return Err(ExportError::validation(format!(
            "Watermark image not found: {}",
            path.display()
        )));
    }
    Ok(())
}

/// What gets drawn. Flattened into the job description next to the placement fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "watermarkType")]
pub enum WatermarkContent {
    Text {
        #[serde(rename = "textSettings")]
        text_settings: TextWatermarkSettings,
    },
    Image {
        #[serde(rename = "imagePath")]
        image_path: PathBuf,
    },
}

/// A fully-resolved, enabled watermark, as embedded in a job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedWatermark {
    pub position: WatermarkPosition,
    pub scale: f32,
    pub opacity: f32,
    #[serde(flatten)]
    pub content: WatermarkContent,
}
