//! Tunables for a [`FeedGrid`](crate::FeedGrid).
//!
//! ## Usage
//!
//! Start from [`FeedGridArgs::default`] and override what the host needs
//! with the generated setters.
//!
//! ```
//! use feed_grid::{FeedGridArgs, PaddingValue, VerticalPadding, px::Px};
//!
//! let args = FeedGridArgs::default()
//!     .item_gutter(Px(12.0))
//!     .padding(VerticalPadding::new(PaddingValue::Fixed(Px(56.0)), PaddingValue::Fixed(Px(80.0))))
//!     .max_free_keys_per_kind(Some(6));
//! assert_eq!(args.quantum, 4);
//! ```
use std::fmt;

use derive_setters::Setters;

use crate::{error::FeedError, px::Px};

/// Default horizontal gutter: left margin, middle gutter and right margin.
pub const DEFAULT_COLUMN_GUTTER: Px = Px(8.0);
/// Default vertical gap between stacked tiles in one column.
pub const DEFAULT_ITEM_GUTTER: Px = Px(8.0);
/// Default number of window bands per viewport height.
pub const DEFAULT_QUANTUM: u32 = 4;

/// A vertical padding value as supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PaddingValue {
    /// Absolute length in logical pixels.
    Fixed(Px),
    /// Fraction of the container, in percent. Not supported by the layout.
    Percent(f32),
}

impl PaddingValue {
    /// Resolves the value to an absolute length.
    ///
    /// Only finite, non-negative [`PaddingValue::Fixed`] values resolve.
    pub fn resolve(self, edge: &'static str) -> Result<Px, FeedError> {
        match self {
            PaddingValue::Fixed(px) if px.is_valid_extent() => Ok(px),
            other => Err(FeedError::UnsupportedPadding {
                edge,
                value: other.to_string(),
            }),
        }
    }
}

impl Default for PaddingValue {
    fn default() -> Self {
        PaddingValue::Fixed(Px::ZERO)
    }
}

impl From<Px> for PaddingValue {
    fn from(value: Px) -> Self {
        PaddingValue::Fixed(value)
    }
}

impl fmt::Display for PaddingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaddingValue::Fixed(px) => write!(f, "{px}"),
            PaddingValue::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

/// Content offsets above the first row and below the last row.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VerticalPadding {
    /// Space between the canvas top and the first tiles.
    pub top: PaddingValue,
    /// Space between the tallest column and the canvas bottom.
    pub bottom: PaddingValue,
}

impl VerticalPadding {
    /// Creates a padding pair.
    pub const fn new(top: PaddingValue, bottom: PaddingValue) -> Self {
        Self { top, bottom }
    }

    /// Absolute padding on both edges.
    pub const fn fixed(top: Px, bottom: Px) -> Self {
        Self {
            top: PaddingValue::Fixed(top),
            bottom: PaddingValue::Fixed(bottom),
        }
    }
}

/// Configuration of one feed grid instance.
#[derive(Debug, Clone, PartialEq, Setters)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FeedGridArgs {
    /// Horizontal gutter used three times across the container.
    pub column_gutter: Px,
    /// Vertical gap between tiles stacked in the same column.
    pub item_gutter: Px,
    /// Vertical content offsets.
    pub padding: VerticalPadding,
    /// Window bands per viewport height. Recycling only runs when the scroll
    /// offset crosses a band boundary.
    pub quantum: u32,
    /// How far above the band the live range starts, in viewport heights.
    pub look_behind: f32,
    /// How far below the band the live range ends, in viewport heights.
    pub look_ahead: f32,
    /// Offsets at or below this value count as "at the top" when a
    /// scroll-to-top animation settles.
    pub settle_epsilon: Px,
    /// Frozen frames after which a scroll-to-top that never settles is
    /// abandoned. `None` waits forever.
    pub max_frozen_frames: Option<u32>,
    /// Upper bound for free keys kept per media kind. `None` keeps every
    /// minted key.
    pub max_free_keys_per_kind: Option<usize>,
}

impl Default for FeedGridArgs {
    fn default() -> Self {
        Self {
            column_gutter: DEFAULT_COLUMN_GUTTER,
            item_gutter: DEFAULT_ITEM_GUTTER,
            padding: VerticalPadding::default(),
            quantum: DEFAULT_QUANTUM,
            look_behind: 0.5,
            look_ahead: 1.25,
            settle_epsilon: Px(0.5),
            max_frozen_frames: Some(120),
            max_free_keys_per_kind: None,
        }
    }
}
