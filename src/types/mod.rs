// src/types/mod.rs
//! Validated values shared by the model, the API layer and the parsers.

use thiserror::Error;

mod colors;
mod domain_types;
mod ids;
mod rich_text;

pub use colors::*;
pub use domain_types::*;
pub use ids::*;
pub use rich_text::*;

/// Rejected input to one of the validated constructors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid color or admonition tag: {0}")]
    InvalidColor(String),

    #[error("Invalid link target {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{value} is outside {min}..={max}")]
    OutOfBounds { value: u32, min: u32, max: u32 },

    #[error("Invalid access token: {reason}")]
    InvalidAccessToken { reason: String },

    #[error("Unusable path {path}: {reason}")]
    InvalidFilePath { path: String, reason: String },
}
