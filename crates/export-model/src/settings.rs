//! Export settings.

use std::fmt;
use std::str::FromStr;

use lumen_common::config::ExportDefaults;
use lumen_common::error::{ExportError, ExportResult};
use lumen_naming::template::FilenameTemplate;
use serde::{Deserialize, Serialize};

use crate::watermark::{ResolvedWatermark, WatermarkSpec};

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Jpeg,
    Png,
    Tiff,
}

impl ExportFormat {
    /// File extension written by the engine.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Png => "png",
            ExportFormat::Tiff => "tiff",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Png => "png",
            ExportFormat::Tiff => "tiff",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "png" => Ok(ExportFormat::Png),
            "tiff" | "tif" => Ok(ExportFormat::Tiff),
            _ => Err(ExportError::validation(format!(
                "Unknown format: {s}. Use: jpeg, png, tiff"
            ))),
        }
    }
}

/// Which dimension the resize value constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeMode {
    LongEdge,
    ShortEdge,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeOptions {
    pub mode: ResizeMode,
    /// Target size in pixels for the constrained dimension.
    pub value: u32,
    /// Keep the source size when it is already smaller than the target.
    pub dont_enlarge: bool,
}

impl ResizeOptions {
    /// Output dimensions for a `width` x `height` source, aspect ratio preserved.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width == 0 || height == 0 || self.value == 0 {
            return (width, height);
        }
        let reference = match self.mode {
            ResizeMode::LongEdge => width.max(height),
            ResizeMode::ShortEdge => width.min(height),
            ResizeMode::Width => width,
            ResizeMode::Height => height,
        };
        let factor = self.value as f64 / reference as f64;
        if self.dont_enlarge && factor > 1.0 {
            return (width, height);
        }
        let scale = |v: u32| ((v as f64 * factor).round() as u32).max(1);
        (scale(width), scale(height))
    }
}

/// Export options as chosen in the export panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    pub format: ExportFormat,
    /// 1-100, only meaningful for JPEG.
    pub jpeg_quality: u8,
    /// `None` exports at source resolution.
    pub resize: Option<ResizeOptions>,
    pub keep_metadata: bool,
    /// Only meaningful when `keep_metadata` is set.
    pub strip_gps: bool,
    pub filename_template: String,
    /// Kept even when disabled so re-enabling restores the previous spec.
    pub watermark: Option<WatermarkSpec>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        let defaults = ExportDefaults::default();
        Self {
            format: ExportFormat::Jpeg,
            jpeg_quality: defaults.jpeg_quality,
            resize: None,
            keep_metadata: defaults.keep_metadata,
            strip_gps: defaults.strip_gps,
            filename_template: defaults.filename_template,
            watermark: None,
        }
    }
}

impl ExportSettings {
    /// Settings seeded from the configured defaults.
    pub fn from_defaults(defaults: &ExportDefaults) -> ExportResult<Self> {
        Ok(Self {
            format: defaults.format.parse()?,
            jpeg_quality: defaults.jpeg_quality,
            resize: None,
            keep_metadata: defaults.keep_metadata,
            strip_gps: defaults.strip_gps,
            filename_template: defaults.filename_template.clone(),
            watermark: None,
        })
    }

    pub fn template(&self) -> FilenameTemplate {
        FilenameTemplate::new(self.filename_template.clone())
    }

    /// Validate and reduce to the form embedded in a job description.
    ///
    /// Quality is only checked for JPEG; for other formats it is inert and clamped.
    pub fn normalized(&self) -> ExportResult<NormalizedExportSettings> {
        if self.format == ExportFormat::Jpeg && !(1..=100).contains(&self.jpeg_quality) {
            return Err(ExportError::validation(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }
        if let Some(resize) = &self.resize {
            if resize.value == 0 {
                return Err(ExportError::validation("Resize value must be at least 1 pixel"));
            }
        }
        self.template()
            .validate()
            .map_err(|e| ExportError::validation(format!("Malformed filename template: {e}")))?;

        let watermark = match &self.watermark {
            Some(spec) => spec.normalize_for_submission()?,
            None => None,
        };

        Ok(NormalizedExportSettings {
            format: self.format,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
            resize: self.resize,
            keep_metadata: self.keep_metadata,
            strip_gps: self.keep_metadata && self.strip_gps,
            filename_template: self.filename_template.clone(),
            watermark,
        })
    }
}

/// Validated settings as submitted to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedExportSettings {
    pub format: ExportFormat,
    pub jpeg_quality: u8,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub resize: Option<ResizeOptions>,
    pub keep_metadata: bool,
    /// Always `false` when `keep_metadata` is `false`.
    pub strip_gps: bool,
    /// The pattern the engine resolves; `_{sequence}` already appended for batches.
    pub filename_template: String,
    /// Absent, not disabled, when no watermark is drawn.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub watermark: Option<ResolvedWatermark>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watermark::WatermarkType;

    #[test]
    fn test_format_parsing_and_extension() {
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!("tif".parse::<ExportFormat>().unwrap().extension(), "tiff");
        assert!("webp".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn test_resize_long_edge() {
        let resize = ResizeOptions {
            mode: ResizeMode::LongEdge,
            value: 2048,
            dont_enlarge: true,
        };
        assert_eq!(resize.target_dimensions(6000, 4000), (2048, 1365));
        assert_eq!(resize.target_dimensions(4000, 6000), (1365, 2048));
        assert_eq!(resize.target_dimensions(1024, 768), (1024, 768));
    }

    #[test]
    fn test_resize_enlarges_when_allowed() {
        let resize = ResizeOptions {
            mode: ResizeMode::Width,
            value: 2000,
            dont_enlarge: false,
        };
        assert_eq!(resize.target_dimensions(1000, 500), (2000, 1000));

        let short = ResizeOptions {
            mode: ResizeMode::ShortEdge,
            value: 100,
            dont_enlarge: false,
        };
        assert_eq!(short.target_dimensions(400, 200), (200, 100));
    }

    #[test]
    fn test_strip_gps_is_inert_without_metadata() {
        let settings = ExportSettings {
            keep_metadata: false,
            strip_gps: true,
            ..ExportSettings::default()
        };
        assert!(!settings.normalized().unwrap().strip_gps);

        let kept = ExportSettings {
            keep_metadata: true,
            strip_gps: true,
            ..ExportSettings::default()
        };
        assert!(kept.normalized().unwrap().strip_gps);
    }

    #[test]
    fn test_quality_out_of_range_is_rejected() {
        let settings = ExportSettings {
            jpeg_quality: 0,
            ..ExportSettings::default()
        };
        assert!(matches!(
            settings.normalized(),
            Err(ExportError::Validation { .. })
        ));
    }

    #[test]
    fn test_quality_is_inert_for_lossless_formats() {
        for format in [ExportFormat::Png, ExportFormat::Tiff] {
            let settings = ExportSettings {
                format,
                jpeg_quality: 0,
                ..ExportSettings::default()
            };
            let normalized = settings.normalized().unwrap();
            assert_eq!(normalized.format, format);
            assert_eq!(normalized.jpeg_quality, 1);
        }
    }

    #[test]
    fn test_disabled_watermark_is_absent_from_wire() {
        let settings = ExportSettings {
            watermark: Some(WatermarkSpec::default_spec()),
            ..ExportSettings::default()
        };
        let normalized = settings.normalized().unwrap();
        assert!(normalized.watermark.is_none());

        let value = serde_json::to_value(&normalized).unwrap();
        assert!(value.get("watermark").is_none());
        assert!(value.get("resize").is_none());
    }

    #[test]
    fn test_invalid_image_watermark_fails_normalization() {
        let settings = ExportSettings {
            watermark: Some(WatermarkSpec {
                enabled: true,
                watermark_type: WatermarkType::Image,
                image_path: None,
                ..WatermarkSpec::default_spec()
            }),
            ..ExportSettings::default()
        };
        assert!(matches!(
            settings.normalized(),
            Err(ExportError::Validation { .. })
        ));
    }

    #[test]
    fn test_from_defaults_rejects_unknown_format() {
        let defaults = ExportDefaults {
            format: "gif".to_string(),
            ..ExportDefaults::default()
        };
        assert!(ExportSettings::from_defaults(&defaults).is_err());
    }
}
