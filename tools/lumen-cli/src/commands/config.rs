//! Show or save the effective configuration.

use std::path::Path;

use lumen_common::config::AppConfig;

pub fn run(config: &AppConfig, path: Option<&Path>, save: bool) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if !save {
        return Ok(());
    }

    let written = match path {
        Some(path) => {
            config.save_to(path)?;
            path.to_path_buf()
        }
        None => config.save()?,
    };
    tracing::info!(path = %written.display(), "Configuration saved");
    println!("Saved to {}", written.display());
    Ok(())
}
