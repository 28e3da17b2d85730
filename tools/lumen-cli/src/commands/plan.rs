//! Print the job description an export would submit.

use std::path::PathBuf;

use lumen_common::clock::{ExportClock, SystemClock};
use lumen_common::config::AppConfig;
use lumen_export_engine::{export_mode, plan_job, suggested_file_name, JobPlan};
use lumen_export_model::{Destination, ExportMode};

use super::ExportArgs;

pub fn run(
    images: Vec<PathBuf>,
    output: PathBuf,
    options: ExportArgs,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let settings = options.settings(&config.export)?.normalized()?;
    let adjustments = options.adjustments()?;
    let created_at = SystemClock.now();

    let destination = match export_mode(options.context(), images.len()) {
        ExportMode::Single => match images.first().filter(|_| output.is_dir()) {
            Some(image) => {
                Destination::File(output.join(suggested_file_name(image, &settings, created_at)))
            }
            None => Destination::File(output),
        },
        ExportMode::Batch => Destination::Directory(output),
    };
    tracing::debug!(mode = ?destination.mode(), "Planning export");

    let job = plan_job(JobPlan {
        job_id: 0,
        targets: &images,
        adjustments: &adjustments,
        settings,
        destination,
        created_at,
    })?;

    println!("{}", serde_json::to_string_pretty(&job)?);
    Ok(())
}
