//! Export images through the processing engine.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use lumen_common::clock::SystemClock;
use lumen_common::config::AppConfig;
use lumen_common::error::ExportError;
use lumen_export_engine::{
    ExportJobController, PresetPicker, ProcessEngine, SubmitOutcome, SubmitRequest,
};

use super::ExportArgs;

pub async fn run(
    images: Vec<PathBuf>,
    output: PathBuf,
    options: ExportArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let settings = options.settings(&config.export)?;
    let adjustments = options.adjustments()?;

    let engine = Arc::new(ProcessEngine::from_config(&config.engine));
    let picker = Arc::new(PresetPicker::new(Some(output.clone()), None));
    let controller = ExportJobController::new(engine, picker, Arc::new(SystemClock));
    controller.select(images.clone());

    println!("Exporting {} image(s)", images.len());
    println!("  Output: {}", output.display());
    println!("  Format: {}", settings.format);
    println!("  Template: {}", settings.filename_template);

    let outcome = controller
        .submit(SubmitRequest {
            targets: images,
            adjustments,
            settings,
            context: options.context(),
        })
        .await?;
    if outcome == SubmitOutcome::DestinationCancelled {
        println!("No destination chosen, nothing exported.");
        return Ok(());
    }

    let mut rx = controller.subscribe();
    let mut cancel_requested = false;
    loop {
        let state = rx.borrow_and_update().clone();
        if !state.is_exporting() {
            break;
        }
        print!(
            "\r  Progress: {}/{} images  ",
            state.progress.current, state.progress.total
        );
        std::io::stdout().flush().ok();

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c(), if !cancel_requested => {
                cancel_requested = true;
                println!("\n  Cancelling...");
                controller.cancel().await;
            }
        }
    }

    match controller.state().outcome() {
        Some(Ok(())) => {
            println!("\nExport complete: {}", output.display());
            Ok(())
        }
        Some(Err(ExportError::Cancelled)) => {
            println!("\nExport cancelled");
            Ok(())
        }
        Some(Err(err)) => Err(anyhow::anyhow!("Export failed: {err}")),
        None => Ok(()),
    }
}
