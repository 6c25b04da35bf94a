//! Errors reported for malformed grid input.

use thiserror::Error;

use crate::{ItemId, px::Px};

/// Input the grid refuses to lay out.
///
/// Degenerate but legal geometry (a viewport or container that has not been
/// measured yet) is not an error; it produces an empty live set instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeedError {
    /// The same id appears twice in one post list.
    #[error("duplicate item {id} at feed positions {first} and {second}")]
    DuplicateItem {
        /// The repeated id.
        id: ItemId,
        /// Position of the first occurrence.
        first: usize,
        /// Position of the repeated occurrence.
        second: usize,
    },
    /// An aspect ratio that is zero, negative or not finite.
    #[error("item {id} has invalid aspect ratio {aspect_ratio}")]
    InvalidAspectRatio {
        /// Offending item.
        id: ItemId,
        /// The rejected ratio.
        aspect_ratio: f32,
    },
    /// A host measurement that is negative or not finite.
    #[error("{field} must be a finite, non-negative length, got {value}")]
    NegativeDimension {
        /// Name of the rejected input field.
        field: &'static str,
        /// The rejected value.
        value: Px,
    },
    /// A position that is NaN or infinite. Negative positions are overscroll
    /// and are accepted.
    #[error("{field} must be finite, got {value}")]
    NonFiniteOffset {
        /// Name of the rejected input field.
        field: &'static str,
        /// The rejected value.
        value: Px,
    },
    /// A padding value that is not an absolute pixel length.
    #[error("{edge} padding {value} is not an absolute pixel length")]
    UnsupportedPadding {
        /// `"top"` or `"bottom"`.
        edge: &'static str,
        /// Human readable form of the rejected value.
        value: String,
    },
}
