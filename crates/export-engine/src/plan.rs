//! Building job descriptions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use lumen_common::error::{ExportError, ExportResult};
use lumen_export_model::{
    Destination, ExportJob, ExportMode, NormalizedExportSettings, PartialAdjustments,
    PlannedOutput,
};
use lumen_naming::template::{original_stem, FilenameTemplate, RenderContext};
use serde::{Deserialize, Serialize};

/// Where the export was started from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportContext {
    /// The single-image editor.
    #[default]
    Editor,
    /// Library or filmstrip; always exports to a directory.
    Library,
}

/// Single mode only for one target exported from the editor.
pub fn export_mode(context: ExportContext, target_count: usize) -> ExportMode {
    if target_count > 1 || context != ExportContext::Editor {
        ExportMode::Batch
    } else {
        ExportMode::Single
    }
}

/// File name offered in the single-file save dialog.
pub fn suggested_file_name(
    target: &Path,
    settings: &NormalizedExportSettings,
    created_at: NaiveDateTime,
) -> String {
    let stem = original_stem(target);
    let name = FilenameTemplate::new(settings.filename_template.clone()).resolve(&RenderContext {
        original_filename: &stem,
        sequence: 1,
        total: 1,
        timestamp: created_at,
    });
    format!("{name}.{}", settings.format.extension())
}

/// Everything needed to describe one submission.
#[derive(Debug, Clone)]
pub struct JobPlan<'a> {
    pub job_id: u64,
    pub targets: &'a [PathBuf],
    /// Inline adjustments for the single-mode target.
    pub adjustments: &'a PartialAdjustments,
    pub settings: NormalizedExportSettings,
    pub destination: Destination,
    pub created_at: NaiveDateTime,
}

/// Build the frozen job description for a submission.
///
/// Batch jobs get the effective template (with `_{sequence}` forced when needed) and one
/// distinct output name per target. Single jobs write exactly the chosen file and carry
/// the target's resolved adjustments inline.
pub fn plan_job(plan: JobPlan<'_>) -> ExportResult<ExportJob> {
    let JobPlan {
        job_id,
        targets,
        adjustments,
        mut settings,
        destination,
        created_at,
    } = plan;

    if targets.is_empty() {
        return Err(ExportError::NoTargets);
    }

    let mut per_image_adjustments = BTreeMap::new();
    let outputs = match &destination {
        Destination::File(path) => {
            if targets.len() != 1 {
                return Err(ExportError::validation(format!(
                    "A single-file destination takes exactly one image, got {}",
                    targets.len()
                )));
            }
            per_image_adjustments.insert(targets[0].clone(), adjustments.resolve());
            vec![PlannedOutput {
                target: targets[0].clone(),
                output: path.clone(),
            }]
        }
        Destination::Directory(dir) => {
            let template = FilenameTemplate::new(settings.filename_template.clone());
            settings.filename_template = template.effective_for(targets.len()).into_owned();

            let stems: Vec<String> = targets.iter().map(|t| original_stem(t)).collect();
            let extension = settings.format.extension();
            template
                .resolve_batch(&stems, created_at)
                .into_iter()
                .zip(targets)
                .map(|(name, target)| PlannedOutput {
                    target: target.clone(),
                    output: dir.join(format!("{name}.{extension}")),
                })
                .collect()
        }
    };

    Ok(ExportJob {
        job_id,
        targets: targets.to_vec(),
        settings,
        per_image_adjustments,
        destination,
        outputs,
        created_at,
    })
}
