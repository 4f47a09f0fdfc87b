// src/output/mod.rs
//! Output handling with clear separation of planning and execution.
//!
//! Exports build an [`OutputPlan`] with pure functions and hand it to
//! [`deliver`], the only place that touches the filesystem or stdout.
//! Import runs end with a summary rendered by [`render_summary`].

mod paths;
mod summary;
mod types;
mod writer;

pub use paths::{asset_filename, get_relative_path, image_extension, sanitize_filename};
pub use summary::{render_summary, summary_text, SummaryFormat};
pub use types::{
    CompletedOperation, DeliveryStats, DeliveryTarget, FailedOperation, OutputPlan, OutputReport,
};
pub use writer::{deliver, deliver_all};
