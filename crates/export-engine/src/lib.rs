//! Lumen Export Engine
//!
//! Turns an export request from the interactive surface into a job for the external
//! processing engine and tracks it to a terminal state.
//!
//! # Job Lifecycle
//!
//! ```text
//!             submit                 engine: completed
//!   Idle ─────────────► Exporting ─────────────────────► Success
//!    ▲                   │  │  │    engine: failed
//!    │ destination       │  │  └──────────────────────► Error
//!    │ cancelled         │  │       engine: cancelled
//!    └───────────────────┘  └─────────────────────────► Cancelled
//!
//!   Success / Error / Cancelled ──(selection change)──► Idle
//! ```
//!
//! Previews and white-balance sampling talk to the same engine but never touch the job
//! state.

pub mod controller;
pub mod engine;
pub mod picker;
pub mod plan;
pub mod preview;
pub mod process;
pub mod state;
pub mod white_balance;

pub use controller::*;
pub use engine::*;
pub use picker::*;
pub use plan::*;
pub use preview::*;
pub use process::ProcessEngine;
pub use state::*;
pub use white_balance::*;
