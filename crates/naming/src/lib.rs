//! Lumen Naming
//!
//! String-level transformations applied before a job reaches the engine:
//! - **Tokens:** scanning `{name}` tokens out of user-supplied text
//! - **Templates:** resolving output filenames from a pattern and a per-image context
//! - **Placeholders:** substituting image metadata into watermark text
//! - **Sanitize:** keeping resolved names inside the destination directory
//!
//! Nothing here touches the filesystem.

pub mod placeholder;
pub mod sanitize;
pub mod template;
pub mod tokens;

pub use placeholder::*;
pub use sanitize::*;
pub use template::*;
pub use tokens::*;
