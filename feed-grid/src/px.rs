//! Logical pixel coordinate system used by the feed grid.
//!
//! Every geometric value the engine produces or consumes is expressed in
//! logical pixels: the same unit the host scroll container reports its
//! offsets and viewport size in. Values are fractional because tile heights
//! derive from aspect ratios (`height = width / aspect_ratio`).
//!
//! # Key Types
//!
//! - [`Px`] - A single logical pixel value
//! - [`PxRect`] - An axis aligned rectangle in canvas space
//! - [`PxSpan`] - A closed-open vertical range in canvas space
//!
//! # Coordinate System
//!
//! - Origin (0, 0) at the top-left corner of the scrollable canvas
//! - X-axis increases to the right
//! - Y-axis increases downward
//! - Negative scroll offsets are allowed (overscroll), negative layout values
//!   are not
//!
//! # Example
//!
//! ```
//! use feed_grid::px::{Px, PxRect};
//!
//! let tile = PxRect::new(Px(8.0), Px(8.0), Px(138.0), Px(69.0));
//! assert_eq!(tile.bottom(), Px(77.0));
//! assert_eq!(tile.right(), Px(146.0));
//! ```

use std::{
    fmt,
    ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign},
};

/// A logical pixel value.
///
/// `Px` wraps an `f32`. Arithmetic with other `Px` values and with `f32`
/// scalars is provided through the standard operator traits.
///
/// # Examples
///
/// ```
/// use feed_grid::px::Px;
///
/// let column = Px(138.0);
/// let gutter = Px(8.0);
/// assert_eq!(column + gutter, Px(146.0));
/// assert_eq!(column / 2.0, Px(69.0));
/// assert_eq!(Px(-4.0).max(Px::ZERO), Px::ZERO);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Px(pub f32);

impl Px {
    /// A constant representing zero pixels.
    pub const ZERO: Self = Self(0.0);

    /// Creates a new `Px` from an `f32`.
    pub const fn new(value: f32) -> Self {
        Px(value)
    }

    /// Returns the raw `f32` value.
    pub fn raw(self) -> f32 {
        self.0
    }

    /// Returns the larger of two values.
    ///
    /// `NaN` never wins: if either side is `NaN` the other side is returned.
    pub fn max(self, other: Self) -> Self {
        Px(self.0.max(other.0))
    }

    /// Returns the smaller of two values.
    pub fn min(self, other: Self) -> Self {
        Px(self.0.min(other.0))
    }

    /// Returns `true` when the value is neither infinite nor `NaN`.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Returns `true` when the value is finite and not negative.
    pub fn is_valid_extent(self) -> bool {
        self.0.is_finite() && self.0 >= 0.0
    }

    /// Clamps negative values to zero.
    pub fn positive(self) -> Self {
        self.max(Px::ZERO)
    }
}

impl fmt::Display for Px {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px", self.0)
    }
}

impl From<f32> for Px {
    fn from(value: f32) -> Self {
        Px(value)
    }
}

impl From<Px> for f32 {
    fn from(value: Px) -> Self {
        value.0
    }
}

impl Add for Px {
    type Output = Px;

    fn add(self, rhs: Self) -> Self::Output {
        Px(self.0 + rhs.0)
    }
}

impl Sub for Px {
    type Output = Px;

    fn sub(self, rhs: Self) -> Self::Output {
        Px(self.0 - rhs.0)
    }
}

impl Mul<f32> for Px {
    type Output = Px;

    fn mul(self, rhs: f32) -> Self::Output {
        Px(self.0 * rhs)
    }
}

impl Div<f32> for Px {
    type Output = Px;

    fn div(self, rhs: f32) -> Self::Output {
        Px(self.0 / rhs)
    }
}

impl Neg for Px {
    type Output = Px;

    fn neg(self) -> Self::Output {
        Px(-self.0)
    }
}

impl AddAssign for Px {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Px {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

/// A vertical range `[start, end)` in canvas space.
///
/// An empty span (`end <= start`) intersects nothing, including zero-height
/// rectangles sitting exactly on its bounds.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PxSpan {
    /// Inclusive upper edge.
    pub start: Px,
    /// Exclusive lower edge.
    pub end: Px,
}

impl PxSpan {
    /// A span covering nothing.
    pub const EMPTY: Self = Self {
        start: Px::ZERO,
        end: Px::ZERO,
    };

    /// Creates a new span.
    pub const fn new(start: Px, end: Px) -> Self {
        Self { start, end }
    }

    /// Returns `true` when the span covers no pixels.
    pub fn is_empty(&self) -> bool {
        !(self.end > self.start)
    }

    /// Length of the span, zero when empty.
    pub fn len(&self) -> Px {
        (self.end - self.start).positive()
    }

    /// Checks whether `[top, bottom)` shares at least one pixel row with the
    /// span.
    pub fn overlaps(&self, top: Px, bottom: Px) -> bool {
        !self.is_empty() && top < self.end && bottom > self.start
    }
}

/// An axis aligned rectangle in canvas space.
///
/// # Examples
///
/// ```
/// use feed_grid::px::{Px, PxRect, PxSpan};
///
/// let tile = PxRect::new(Px(8.0), Px(100.0), Px(138.0), Px(138.0));
/// assert!(tile.intersects_span(&PxSpan::new(Px(0.0), Px(120.0))));
/// assert!(!tile.intersects_span(&PxSpan::new(Px(238.0), Px(400.0))));
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PxRect {
    /// Distance from the left edge of the canvas.
    pub left: Px,
    /// Distance from the top edge of the canvas.
    pub top: Px,
    /// Horizontal extent.
    pub width: Px,
    /// Vertical extent.
    pub height: Px,
}

impl PxRect {
    /// A zero rectangle at the origin.
    pub const ZERO: Self = Self {
        left: Px::ZERO,
        top: Px::ZERO,
        width: Px::ZERO,
        height: Px::ZERO,
    };

    /// Creates a new rectangle.
    pub const fn new(left: Px, top: Px, width: Px, height: Px) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// The y-coordinate of the lower edge.
    pub fn bottom(&self) -> Px {
        self.top + self.height
    }

    /// The x-coordinate of the right edge.
    pub fn right(&self) -> Px {
        self.left + self.width
    }

    /// Checks whether the rectangle has a non-empty vertical overlap with
    /// `span`.
    pub fn intersects_span(&self, span: &PxSpan) -> bool {
        span.overlaps(self.top, self.bottom())
    }

    /// Checks if two rectangles do not overlap.
    ///
    /// Rectangles that only touch along an edge are orthogonal.
    pub fn is_orthogonal(&self, other: &Self) -> bool {
        let x_overlap = self.left < other.right() && other.left < self.right();
        let y_overlap = self.top < other.bottom() && other.top < self.bottom();
        !x_overlap || !y_overlap
    }
}
