// src/parsing/mod.rs
//! Markdown to block conversion.
//!
//! A file is first split into segments ([`split_segments`]); Markdown
//! segments are then parsed into [`BlockNode`](crate::model::BlockNode)
//! trees, with table cell content kept aside for a later fill.

mod images;
mod markdown;
mod segments;
pub mod table;

pub use images::{resolve_images, ImageOptions, ImageResolution};
pub use markdown::{convert, convert_with_table_data, ConvertedDocument};
pub use segments::{split_segments, Segment, SegmentKind};
