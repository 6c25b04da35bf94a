//! Quantized viewport windowing.
//!
//! Recomputing the live set on every scrolled pixel would make the key pool
//! and the host renderer churn. The scroll offset is therefore snapped to
//! bands of `viewport_height / quantum` pixels, and the live set is only
//! recomputed when the band changes.
//!
//! ```
//! use feed_grid::{px::Px, window::Window};
//!
//! let window = Window::default();
//! let vh = Px(800.0);
//! assert_eq!(window.band(Px(150.0), Px::ZERO, vh).index, 0);
//! assert_eq!(window.band(Px(210.0), Px::ZERO, vh).index, 1);
//!
//! let live = window.live_range(window.band(Px(1600.0), Px::ZERO, vh), vh);
//! assert_eq!((live.start, live.end), (Px(1200.0), Px(2600.0)));
//! ```
use crate::{
    FeedGridArgs,
    args::DEFAULT_QUANTUM,
    px::{Px, PxSpan},
};

/// A quantized scroll position.
///
/// `index` counts bands of `1 / quantum` viewport heights below the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Band {
    /// Band number, zero at the top of the feed.
    pub index: i64,
    /// Bands per viewport height.
    pub quantum: u32,
}

impl Band {
    /// The band of an unscrolled feed.
    pub const fn top(quantum: u32) -> Self {
        Self { index: 0, quantum }
    }

    /// Position of the band in viewport heights.
    pub fn viewports(&self) -> f32 {
        self.index as f32 / self.quantum.max(1) as f32
    }
}

/// Band quantization and live-range margins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// Bands per viewport height.
    pub quantum: u32,
    /// Viewport heights kept live above the band.
    pub look_behind: f32,
    /// Viewport heights kept live below the band.
    pub look_ahead: f32,
}

impl Default for Window {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            look_behind: 0.5,
            look_ahead: 1.25,
        }
    }
}

impl Window {
    /// Reads the window settings from grid arguments.
    pub fn from_args(args: &FeedGridArgs) -> Self {
        Self {
            quantum: args.quantum,
            look_behind: args.look_behind,
            look_ahead: args.look_ahead,
        }
    }

    /// Band containing `scroll_offset`.
    ///
    /// The header is scrolled past before the feed moves, and overscroll above
    /// the top is clamped. An unmeasured viewport (zero height) always reports
    /// the top band.
    pub fn band(&self, scroll_offset: Px, header_height: Px, viewport_height: Px) -> Band {
        let quantum = self.quantum.max(1);
        if !(viewport_height.raw() > 0.0) || !viewport_height.is_finite() {
            return Band::top(quantum);
        }
        let scrolled = (scroll_offset - header_height).positive();
        let steps = (scrolled.raw() as f64 * quantum as f64 / viewport_height.raw() as f64).floor();
        Band {
            index: steps as i64,
            quantum,
        }
    }

    /// Canvas range whose items should be live for `band`.
    ///
    /// Empty when the viewport has not been measured yet.
    pub fn live_range(&self, band: Band, viewport_height: Px) -> PxSpan {
        if !(viewport_height.raw() > 0.0) || !viewport_height.is_finite() {
            return PxSpan::EMPTY;
        }
        let position = band.viewports();
        let start = (viewport_height * (position - self.look_behind)).positive();
        let end = viewport_height * (position + self.look_ahead);
        PxSpan::new(start, end)
    }
}
