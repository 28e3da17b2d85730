//! Job descriptions.
//!
//! An [`ExportJob`] is the frozen snapshot handed to the engine at submission time. It owns
//! its own copy of the targets, so later selection changes cannot reach it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::adjustments::ColorAdjustments;
use crate::settings::NormalizedExportSettings;

/// Whether a job writes one file or a directory of files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportMode {
    Single,
    Batch,
}

/// Where a job writes its output. Exactly one form is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Destination {
    File(PathBuf),
    Directory(PathBuf),
}

impl Destination {
    pub fn mode(&self) -> ExportMode {
        match self {
            Destination::File(_) => ExportMode::Single,
            Destination::Directory(_) => ExportMode::Batch,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Destination::File(path) | Destination::Directory(path) => path,
        }
    }
}

/// One target and the file it will be written to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedOutput {
    pub target: PathBuf,
    pub output: PathBuf,
}

/// Complete description of one export submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportJob {
    pub job_id: u64,
    /// Submission order; batch sequence numbers follow it.
    pub targets: Vec<PathBuf>,
    pub settings: NormalizedExportSettings,
    /// Only populated in single mode. In batch mode the engine reads each image's stored edits.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub per_image_adjustments: BTreeMap<PathBuf, ColorAdjustments>,
    pub destination: Destination,
    pub outputs: Vec<PlannedOutput>,
    /// Wall-clock time used for `{YYYY}`..`{mm}` tokens.
    pub created_at: NaiveDateTime,
}

impl ExportJob {
    pub fn mode(&self) -> ExportMode {
        self.destination.mode()
    }

    pub fn total(&self) -> usize {
        self.targets.len()
    }

    /// Adjustments submitted inline for `target`, if any.
    pub fn adjustments_for(&self, target: &Path) -> Option<&ColorAdjustments> {
        self.per_image_adjustments.get(target)
    }
}
