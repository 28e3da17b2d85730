//! Show a normalized watermark and where it lands.

use std::path::{Path, PathBuf};

use lumen_export_model::{WatermarkContent, WatermarkSpec};
use lumen_naming::placeholder::{substitute_placeholders, ImageMetadata};

use super::{parse_size, read_json};

pub fn run(
    spec: Option<PathBuf>,
    metadata: Option<PathBuf>,
    canvas: Option<String>,
    mark: Option<String>,
) -> anyhow::Result<()> {
    let spec = load_spec(spec.as_deref())?;

    let Some(resolved) = spec.normalize_for_submission()? else {
        println!("Watermark disabled: exports carry no watermark.");
        return Ok(());
    };
    println!("{}", serde_json::to_string_pretty(&resolved)?);

    if let WatermarkContent::Text { text_settings } = &resolved.content {
        let metadata: ImageMetadata = match &metadata {
            Some(path) => read_json(path)?,
            None => ImageMetadata::default(),
        };
        println!(
            "Text: {}",
            substitute_placeholders(&text_settings.text, &metadata)
        );
        println!(
            "Font: {} {}pt",
            text_settings.font_family,
            text_settings.scaled_font_size(resolved.scale)
        );
        println!("Color: {}", text_settings.effective_color(resolved.opacity));
        if text_settings.shadow {
            println!(
                "Shadow: {} offset {},{}",
                text_settings.effective_shadow_color(resolved.opacity),
                text_settings.shadow_offset_x,
                text_settings.shadow_offset_y
            );
        }
    }

    if let (Some(canvas), Some(mark)) = (canvas, mark) {
        let (x, y) = resolved
            .position
            .place(parse_size(&canvas)?, parse_size(&mark)?);
        println!("Origin: {x},{y}");
    }
    Ok(())
}

/// The spec from `path`, or the default text watermark switched on.
fn load_spec(path: Option<&Path>) -> anyhow::Result<WatermarkSpec> {
    match path {
        Some(path) => read_json(path),
        None => Ok(WatermarkSpec {
            enabled: true,
            ..WatermarkSpec::default_spec()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_spec_is_shown_enabled() {
        let spec = load_spec(None).unwrap();
        assert!(spec.enabled);
        let resolved = spec.normalize_for_submission().unwrap();
        assert!(matches!(
            resolved.map(|watermark| watermark.content),
            Some(WatermarkContent::Text { .. })
        ));
    }

    #[test]
    fn test_spec_file_is_used_as_is() {
        let path = std::env::temp_dir().join("lumen_cli_watermark_spec_test.json");
        std::fs::write(&path, r#"{"enabled":false}"#).unwrap();
        let spec = load_spec(Some(&path)).unwrap();
        assert!(!spec.enabled);
        assert!(spec.normalize_for_submission().unwrap().is_none());
        std::fs::remove_file(&path).ok();
    }
}
