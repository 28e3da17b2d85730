pub mod config;
pub mod export;
pub mod names;
pub mod plan;
pub mod watermark;

use std::path::{Path, PathBuf};

use clap::Args;
use lumen_common::config::ExportDefaults;
use lumen_export_engine::ExportContext;
use lumen_export_model::{
    AdjustmentField, ExportFormat, ExportSettings, PartialAdjustments, ResizeMode,
    ResizeOptions, WatermarkSpec,
};
use serde::de::DeserializeOwned;

/// Export options shared by `plan` and `export`.
#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output format: jpeg, png, tiff
    #[arg(long)]
    pub format: Option<String>,

    /// JPEG quality (1-100)
    #[arg(long)]
    pub quality: Option<u8>,

    /// Filename template, e.g. "{original_filename}_{YYYY}{MM}{DD}"
    #[arg(short, long)]
    pub template: Option<String>,

    /// Limit the long edge to this many pixels
    #[arg(long)]
    pub long_edge: Option<u32>,

    /// Upscale images smaller than --long-edge
    #[arg(long, requires = "long_edge")]
    pub enlarge: bool,

    /// Drop all metadata from exported files
    #[arg(long)]
    pub strip_metadata: bool,

    /// Keep GPS location when metadata is kept
    #[arg(long)]
    pub keep_gps: bool,

    /// Watermark spec (JSON)
    #[arg(long)]
    pub watermark: Option<PathBuf>,

    /// Adjustments for a single-image export (JSON)
    #[arg(long)]
    pub adjustments: Option<PathBuf>,

    /// Set one adjustment on top of --adjustments, e.g. hsl.reds.saturation=-20
    #[arg(long = "adjust", value_name = "FIELD=VALUE")]
    pub adjust: Vec<String>,

    /// Export into a directory even for one image
    #[arg(long)]
    pub batch: bool,
}

impl ExportArgs {
    /// Settings from the configured defaults with command-line overrides applied.
    pub fn settings(&self, defaults: &ExportDefaults) -> anyhow::Result<ExportSettings> {
        let mut settings = ExportSettings::from_defaults(defaults)?;
        if let Some(format) = &self.format {
            settings.format = format.parse::<ExportFormat>()?;
        }
        if let Some(quality) = self.quality {
            settings.jpeg_quality = quality;
        }
        if let Some(template) = &self.template {
            settings.filename_template = template.clone();
        }
        settings.resize = self.long_edge.map(|value| ResizeOptions {
            mode: ResizeMode::LongEdge,
            value,
            dont_enlarge: !self.enlarge,
        });
        if self.strip_metadata {
            settings.keep_metadata = false;
        }
        if self.keep_gps {
            settings.strip_gps = false;
        }
        if let Some(path) = &self.watermark {
            settings.watermark = Some(read_json::<WatermarkSpec>(path)?);
        }
        Ok(settings)
    }

    pub fn adjustments(&self) -> anyhow::Result<PartialAdjustments> {
        let mut adjustments = match &self.adjustments {
            Some(path) => read_json(path)?,
            None => PartialAdjustments::default(),
        };
        for entry in &self.adjust {
            let (field, value) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("Invalid adjustment {entry}, expected FIELD=VALUE")
            })?;
            let field: AdjustmentField = field.trim().parse()?;
            let value: f64 = value
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid value in {entry}: {e}"))?;
            adjustments = adjustments.merge_field(field, value);
        }
        Ok(adjustments)
    }

    pub fn context(&self) -> ExportContext {
        if self.batch {
            ExportContext::Library
        } else {
            ExportContext::Editor
        }
    }
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", path.display()))?;
    serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse {}: {e}", path.display()))
}

/// Parse `WIDTHxHEIGHT`.
pub fn parse_size(value: &str) -> anyhow::Result<(u32, u32)> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| anyhow::anyhow!("Invalid size {value}, expected WIDTHxHEIGHT"))?;
    let parse = |part: &str| {
        part.trim()
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("Invalid size {value}: {e}"))
    };
    Ok((parse(width)?, parse(height)?))
}
