//! Lumen Export Model
//!
//! Defines the data contracts exchanged with the processing engine:
//! - **Adjustments:** partial and complete color corrections for one image
//! - **Watermark:** the editable watermark spec and its resolved, submittable form
//! - **Settings:** output format, resize, metadata and naming options
//! - **Job:** the frozen description of one export submission
//!
//! Editable values are "partial" and may omit fields; everything that crosses the
//! engine boundary is "complete", produced by an explicit resolve step.

pub mod adjustments;
pub mod color;
pub mod job;
pub mod settings;
pub mod watermark;

pub use adjustments::*;
pub use color::*;
pub use job::*;
pub use settings::*;
pub use watermark::*;
