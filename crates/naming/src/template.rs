//! Filename templates.
//!
//! A template such as `{original_filename}_{YYYY}{MM}{DD}` is resolved once per
//! exported image. Recognised tokens:
//!
//! | Token                 | Value                                          |
//! |-----------------------|------------------------------------------------|
//! | `{original_filename}` | source file name without extension             |
//! | `{sequence}`          | 1-based position in the batch, zero-padded     |
//! | `{YYYY}` `{MM}` `{DD}`| export date                                    |
//! | `{hh}` `{mm}`         | export time (24h)                              |
//!
//! Unknown tokens are copied through unchanged.

use std::borrow::Cow;
use std::path::Path;

use chrono::NaiveDateTime;
use lumen_common::clock::TimestampParts;

use crate::sanitize::sanitize_filename;
use crate::tokens::{contains_token, render_tokens, scan_tokens, TokenError};

/// Name of the batch sequence token.
pub const SEQUENCE: &str = "sequence";

/// Per-image values a template is resolved against.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Source file name without extension.
    pub original_filename: &'a str,
    /// 1-based index of this image within the job.
    pub sequence: usize,
    /// Number of images in the job.
    pub total: usize,
    /// Export wall-clock time, shared by every image of a job.
    pub timestamp: NaiveDateTime,
}

/// A user-supplied filename pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameTemplate {
    raw: String,
}

impl FilenameTemplate {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether the template already numbers its files.
    pub fn has_sequence(&self) -> bool {
        contains_token(&self.raw, SEQUENCE)
    }

    /// Reject unterminated or empty tokens.
    pub fn validate(&self) -> Result<(), TokenError> {
        scan_tokens(&self.raw).map(|_| ())
    }

    /// The pattern actually used for a job of `total` images.
    ///
    /// Jobs with more than one image always number their files: `_{sequence}` is
    /// appended when the template lacks it, so resolved names are pairwise distinct.
    pub fn effective_for(&self, total: usize) -> Cow<'_, str> {
        if total > 1 && !self.has_sequence() {
            Cow::Owned(format!("{}_{{{SEQUENCE}}}", self.raw))
        } else {
            Cow::Borrowed(&self.raw)
        }
    }

    /// Resolve the output file name (without extension) for one image.
    pub fn resolve(&self, ctx: &RenderContext<'_>) -> String {
        let pattern = self.effective_for(ctx.total);
        let time = TimestampParts::from_datetime(&ctx.timestamp);
        let width = digits(ctx.total.max(ctx.sequence));

        let rendered = render_tokens(&pattern, |name| match name {
            "original_filename" => Some(ctx.original_filename.to_string()),
            SEQUENCE => Some(format!("{:0width$}", ctx.sequence, width = width)),
            "YYYY" => Some(time.year.clone()),
            "MM" => Some(time.month.clone()),
            "DD" => Some(time.day.clone()),
            "hh" => Some(time.hour.clone()),
            "mm" => Some(time.minute.clone()),
            _ => None,
        });

        sanitize_filename(&rendered, ctx.original_filename)
    }

    /// Resolve names for a whole job, in submission order.
    pub fn resolve_batch<S: AsRef<str>>(
        &self,
        originals: &[S],
        timestamp: NaiveDateTime,
    ) -> Vec<String> {
        let total = originals.len();
        originals
            .iter()
            .enumerate()
            .map(|(index, original)| {
                self.resolve(&RenderContext {
                    original_filename: original.as_ref(),
                    sequence: index + 1,
                    total,
                    timestamp,
                })
            })
            .collect()
    }
}

impl Default for FilenameTemplate {
    fn default() -> Self {
        Self::new("{original_filename}_edited")
    }
}

/// File name of `path` without its extension, as used by `{original_filename}`.
pub fn original_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn digits(mut n: usize) -> usize {
    let mut count = 1;
    while n >= 10 {
        n /= 10;
        count += 1;
    }
    count
}
