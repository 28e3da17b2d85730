//! Show the file names a template produces.

use std::path::PathBuf;

use lumen_common::clock::{ExportClock, SystemClock};
use lumen_common::config::AppConfig;
use lumen_export_model::ExportFormat;
use lumen_naming::template::{original_stem, FilenameTemplate};

pub fn run(
    images: Vec<PathBuf>,
    template: Option<String>,
    format: Option<String>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let template = FilenameTemplate::new(
        template.unwrap_or_else(|| config.export.filename_template.clone()),
    );
    template
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid template {}: {e}", template.as_str()))?;
    let format: ExportFormat = format
        .as_deref()
        .unwrap_or(&config.export.format)
        .parse()?;

    println!("Template: {}", template.effective_for(images.len()));
    let stems: Vec<String> = images.iter().map(|image| original_stem(image)).collect();
    let names = template.resolve_batch(&stems, SystemClock.now());
    for (image, name) in images.iter().zip(names) {
        println!("  {} -> {name}.{}", image.display(), format.extension());
    }
    Ok(())
}
