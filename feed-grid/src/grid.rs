//! The recomputation pipeline.
//!
//! ## Usage
//!
//! Keep one [`FeedGrid`] per mounted feed and call [`FeedGrid::recompute`]
//! whenever the post list, the container size or the scroll offset changes.
//! Every call runs layout, windowing and key reconciliation in that order
//! and returns a complete [`RenderPlan`].
//!
//! ```
//! use feed_grid::{FeedFrame, FeedGrid, FeedGridArgs, Post, px::Px};
//!
//! let posts: Vec<Post> = (0..40u64).map(|id| Post::image(id, 1.0)).collect();
//! let mut grid = FeedGrid::new(FeedGridArgs::default());
//!
//! let plan = grid
//!     .recompute(&FeedFrame::new(&posts, Px(300.0), Px(800.0)))
//!     .unwrap();
//! assert_eq!(plan.placeholders.len(), 40);
//! assert!(!plan.live_assignments.is_empty());
//! assert!(plan.live_assignments.len() < 40);
//! ```
use tracing::trace;

use crate::{
    FeedGridArgs, ItemId, MediaKind,
    error::FeedError,
    key_pool::{self, LiveItem, PoolState, PoolStats, RenderKey},
    masonry::{MasonryCache, MasonryLayout, Placement},
    post::FeedItem,
    px::{Px, PxRect, PxSpan},
    scroll_to_top::{Poll, ScrollCommand, ScrollPhase, ScrollToTop},
    window::{Band, Window},
};

/// Host signals for one recomputation.
#[derive(Debug, Clone, Copy)]
pub struct FeedFrame<'a, P> {
    /// The feed, in display order.
    pub posts: &'a [P],
    /// Width available to the grid.
    pub container_width: Px,
    /// Current scroll offset of the scroll container.
    pub scroll_offset: Px,
    /// Height of the scroll container's viewport. Zero until measured.
    pub viewport_height: Px,
    /// Height of the content scrolled past before the grid starts.
    pub header_height: Px,
    /// Whether the host asked to scroll back to the top this frame.
    pub scroll_to_top_requested: bool,
}

impl<'a, P> FeedFrame<'a, P> {
    /// A frame at the top of the feed with no header.
    pub fn new(posts: &'a [P], container_width: Px, viewport_height: Px) -> Self {
        Self {
            posts,
            container_width,
            scroll_offset: Px::ZERO,
            viewport_height,
            header_height: Px::ZERO,
            scroll_to_top_requested: false,
        }
    }

    /// Sets the scroll offset.
    pub fn scroll_offset(mut self, scroll_offset: Px) -> Self {
        self.scroll_offset = scroll_offset;
        self
    }

    /// Sets the header height.
    pub fn header_height(mut self, header_height: Px) -> Self {
        self.header_height = header_height;
        self
    }

    /// Marks the frame as carrying a scroll-to-top request.
    pub fn request_scroll_to_top(mut self) -> Self {
        self.scroll_to_top_requested = true;
        self
    }
}

/// Shape of an item that is not necessarily mounted.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placeholder {
    /// The item the placeholder stands for.
    pub item_id: ItemId,
    /// Media kind, so the host can tint images and videos differently.
    pub kind: MediaKind,
    /// Final rectangle of the item.
    pub rect: PxRect,
}

impl From<&Placement> for Placeholder {
    fn from(placement: &Placement) -> Self {
        Self {
            item_id: placement.item_id,
            kind: placement.kind,
            rect: placement.rect,
        }
    }
}

/// A live item with the surface it should be painted on.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LiveAssignment {
    /// The live item.
    pub item_id: ItemId,
    /// Surface to paint it on.
    pub render_key: RenderKey,
    /// Media kind of both the item and the surface.
    pub kind: MediaKind,
    /// Where to paint it.
    pub rect: PxRect,
}

/// Everything the host needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RenderPlan {
    /// Height of the scrollable area.
    pub canvas_height: Px,
    /// One placeholder per post, in feed order. Always complete so the
    /// scrollable area never changes size while items mount.
    pub placeholders: Vec<Placeholder>,
    /// Items to mount, in feed order.
    pub live_assignments: Vec<LiveAssignment>,
    /// Command for the scroll host, issued once when a scroll-to-top starts.
    pub scroll_command: Option<ScrollCommand>,
    /// Band the scroll offset fell into.
    pub band: Band,
    /// Whether the live set was windowed or frozen.
    pub phase: ScrollPhase,
    /// Non-fatal input problems, such as unsupported paddings.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub warnings: Vec<FeedError>,
    /// Key pool activity for this frame. All zero on frozen frames.
    pub pool_stats: PoolStats,
}

impl RenderPlan {
    /// Assignment of `item_id`, if it is live.
    pub fn assignment(&self, item_id: ItemId) -> Option<&LiveAssignment> {
        self.live_assignments
            .iter()
            .find(|assignment| assignment.item_id == item_id)
    }

    /// Ids of the live items, in feed order.
    pub fn live_ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.live_assignments.iter().map(|assignment| assignment.item_id)
    }
}

/// One mounted feed: layout cache, key pool and scroll-to-top controller.
///
/// Grids never share state; mounting two feeds means creating two grids.
#[derive(Debug)]
pub struct FeedGrid {
    args: FeedGridArgs,
    window: Window,
    layout: MasonryCache,
    pool: PoolState,
    scroll_to_top: ScrollToTop<Vec<LiveAssignment>>,
}

impl Default for FeedGrid {
    fn default() -> Self {
        Self::new(FeedGridArgs::default())
    }
}

impl FeedGrid {
    /// Creates a grid with an empty key pool.
    pub fn new(args: FeedGridArgs) -> Self {
        Self {
            window: Window::from_args(&args),
            scroll_to_top: ScrollToTop::from_args(&args),
            layout: MasonryCache::new(),
            pool: PoolState::new(),
            args,
        }
    }

    /// Current configuration.
    pub fn args(&self) -> &FeedGridArgs {
        &self.args
    }

    /// Replaces the configuration.
    ///
    /// Takes effect on the next [`recompute`](Self::recompute). Keys already
    /// handed out stay valid.
    pub fn set_args(&mut self, args: FeedGridArgs) {
        self.window = Window::from_args(&args);
        self.scroll_to_top
            .set_limits(args.settle_epsilon, args.max_frozen_frames);
        self.args = args;
    }

    /// Current scroll-to-top phase.
    pub fn phase(&self) -> ScrollPhase {
        self.scroll_to_top.phase()
    }

    /// Key pool after the last reconciliation.
    pub fn pool(&self) -> &PoolState {
        &self.pool
    }

    /// Layout of the last successful recomputation.
    pub fn layout(&self) -> Option<&MasonryLayout> {
        self.layout.current()
    }

    /// Forgets every key, the cached layout and a running scroll-to-top.
    pub fn reset(&mut self) {
        self.layout.clear();
        self.pool = PoolState::new();
        self.scroll_to_top.reset();
    }

    /// Runs layout, windowing and key reconciliation for `frame`.
    ///
    /// Fails without touching the key pool when the frame is malformed.
    /// While a scroll-to-top animation runs, windowing and reconciliation are
    /// skipped and the live set captured at its start is returned with
    /// rectangles taken from the current layout.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(posts = frame.posts.len(), offset = %frame.scroll_offset)
    )]
    pub fn recompute<P: FeedItem>(
        &mut self,
        frame: &FeedFrame<'_, P>,
    ) -> Result<RenderPlan, FeedError> {
        check_extent("viewport_height", frame.viewport_height)?;
        check_extent("header_height", frame.header_height)?;
        if !frame.scroll_offset.is_finite() {
            return Err(FeedError::NonFiniteOffset {
                field: "scroll_offset",
                value: frame.scroll_offset,
            });
        }

        let layout = self
            .layout
            .update(frame.posts, frame.container_width, &self.args)?;
        let band = self
            .window
            .band(frame.scroll_offset, frame.header_height, frame.viewport_height);

        let mut plan = RenderPlan {
            canvas_height: layout.canvas_height(),
            placeholders: layout.placements().iter().map(Placeholder::from).collect(),
            live_assignments: Vec::new(),
            scroll_command: None,
            band,
            phase: ScrollPhase::Idle,
            warnings: layout.warnings().to_vec(),
            pool_stats: PoolStats::default(),
        };

        let entering = match self
            .scroll_to_top
            .poll(frame.scroll_offset, frame.scroll_to_top_requested)
        {
            Poll::Frozen(snapshot) => {
                trace!(band = band.index, "Live set frozen");
                plan.live_assignments = snapshot
                    .into_iter()
                    .filter_map(|assignment| {
                        layout.rect_of(assignment.item_id).map(|rect| LiveAssignment {
                            rect,
                            ..assignment
                        })
                    })
                    .collect();
                plan.phase = ScrollPhase::ScrollingToTop;
                return Ok(plan);
            }
            Poll::Enter => true,
            Poll::Live | Poll::Exited(_) => false,
        };

        // Zero-width tiles are never worth a surface.
        let span = if layout.column_width() > Px::ZERO {
            self.window.live_range(band, frame.viewport_height)
        } else {
            PxSpan::EMPTY
        };
        let positions = layout.positions_in(&span);
        let live: Vec<LiveItem> = positions
            .iter()
            .map(|&position| LiveItem::from(&layout.placements()[position]))
            .collect();
        trace!(
            band = band.index,
            start = %span.start,
            end = %span.end,
            live = live.len(),
            "Windowed live set"
        );

        let reconciliation = key_pool::reconcile(
            &live,
            std::mem::take(&mut self.pool),
            self.args.max_free_keys_per_kind,
        );
        self.pool = reconciliation.state;
        plan.pool_stats = reconciliation.stats;
        plan.live_assignments = positions
            .iter()
            .zip(reconciliation.assignments)
            .map(|(&position, assignment)| LiveAssignment {
                item_id: assignment.item_id,
                render_key: assignment.key,
                kind: assignment.kind,
                rect: layout.placements()[position].rect,
            })
            .collect();

        if entering {
            plan.scroll_command = Some(
                self.scroll_to_top
                    .enter(plan.live_assignments.clone(), frame.scroll_offset),
            );
            plan.phase = ScrollPhase::ScrollingToTop;
        }
        Ok(plan)
    }
}

fn check_extent(field: &'static str, value: Px) -> Result<(), FeedError> {
    if value.is_valid_extent() {
        Ok(())
    } else {
        Err(FeedError::NegativeDimension { field, value })
    }
}
