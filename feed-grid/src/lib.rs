//! feed-grid lays out, windows and recycles the tiles of a two-column media
//! feed.
//!
//! # Pipeline
//!
//! Every [`FeedGrid::recompute`] call runs three stages in order:
//!
//! 1. [`masonry`] places each post into one of two columns and sizes the
//!    scrollable canvas.
//! 2. [`window`] snaps the scroll offset to a band and derives the pixel range
//!    whose items should be mounted.
//! 3. [`key_pool`] hands each mounted item a [`RenderKey`], reusing the keys
//!    of items that just left so the host can recycle its surfaces.
//!
//! While a scroll-to-top animation runs, stages 2 and 3 are skipped by the
//! [`scroll_to_top`] controller and the live set captured at its start is
//! returned unchanged.
//!
//! # Example
//!
//! ```
//! use feed_grid::{FeedFrame, FeedGrid, Post, px::Px};
//!
//! let posts = vec![Post::image(1, 1.0), Post::video(2, 0.75), Post::image(3, 1.5)];
//! let mut grid = FeedGrid::default();
//!
//! let plan = grid.recompute(&FeedFrame::new(&posts, Px(360.0), Px(640.0)))?;
//! for assignment in &plan.live_assignments {
//!     println!("{} -> {:?} at {:?}", assignment.item_id, assignment.render_key, assignment.rect);
//! }
//! # Ok::<(), feed_grid::FeedError>(())
//! ```
//!
//! # Logging
//!
//! The crate logs through [`tracing`] and never installs a subscriber.
//! Reconciliation counters are emitted at `debug`, per-frame windowing at
//! `trace`, and rejected paddings or stuck animations at `warn`.

pub mod args;
pub mod error;
pub mod grid;
pub mod key_pool;
pub mod masonry;
pub mod post;
pub mod px;
pub mod renderer;
pub mod scroll_to_top;
pub mod window;

pub use args::{FeedGridArgs, PaddingValue, VerticalPadding};
pub use error::FeedError;
pub use grid::{FeedFrame, FeedGrid, LiveAssignment, Placeholder, RenderPlan};
pub use key_pool::{PoolState, PoolStats, RenderKey};
pub use post::{FeedItem, ItemId, MediaKind, Post};
pub use renderer::ItemRenderer;
pub use scroll_to_top::{ScrollCommand, ScrollPhase};
pub use window::Band;
