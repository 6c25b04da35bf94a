//! Two-column masonry placement.
//!
//! ## Usage
//!
//! Turn an ordered post list into per-item rectangles and a canvas height.
//!
//! Items alternate between the two columns by feed position: even positions
//! go to the left column, odd positions to the right one. Column heights are
//! not balanced. Each tile is as wide as its column and as tall as its aspect
//! ratio dictates; tiles in the same column are separated by the item gutter.
//!
//! ```
//! use feed_grid::{FeedGridArgs, Post, masonry, px::Px};
//!
//! let posts = [Post::image(1, 1.0), Post::video(2, 2.0), Post::image(3, 1.0)];
//! let layout = masonry::layout(&posts, Px(300.0), &FeedGridArgs::default()).unwrap();
//! assert_eq!(layout.column_width(), Px(138.0));
//! // Left column: 138 + 8 + 138.
//! assert_eq!(layout.canvas_height(), Px(284.0));
//! ```
use rustc_hash::FxHashMap as HashMap;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::{
    FeedGridArgs, ItemId, MediaKind,
    args::{PaddingValue, VerticalPadding},
    error::FeedError,
    post::FeedItem,
    px::{Px, PxRect, PxSpan},
};

/// One of the two masonry columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Column {
    /// Receives even feed positions.
    Left,
    /// Receives odd feed positions.
    Right,
}

impl Column {
    /// Column for a feed position.
    pub const fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Column::Left
        } else {
            Column::Right
        }
    }

    const fn index(self) -> usize {
        match self {
            Column::Left => 0,
            Column::Right => 1,
        }
    }
}

/// Where one item sits on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    /// The placed item.
    pub item_id: ItemId,
    /// Its surface kind, carried along for the key pool.
    pub kind: MediaKind,
    /// Column the item was assigned to.
    pub column: Column,
    /// Canvas rectangle, padding included.
    pub rect: PxRect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Geometry {
    container_width: Px,
    column_gutter: Px,
    item_gutter: Px,
    padding: VerticalPadding,
}

impl Geometry {
    fn new(container_width: Px, args: &FeedGridArgs) -> Self {
        Self {
            container_width,
            column_gutter: args.column_gutter,
            item_gutter: args.item_gutter,
            padding: args.padding,
        }
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone)]
pub struct MasonryLayout {
    geometry: Geometry,
    column_width: Px,
    padding_top: Px,
    padding_bottom: Px,
    placements: Vec<Placement>,
    aspect_ratios: Vec<f32>,
    columns: [Vec<usize>; 2],
    cursors: [Px; 2],
    index: HashMap<ItemId, usize>,
    canvas_height: Px,
    warnings: Vec<FeedError>,
}

/// Lays out `items` in a container of `container_width`.
///
/// Pure function of its inputs. Fails on duplicate ids, invalid aspect
/// ratios and invalid container widths. Unsupported paddings fall back to
/// zero and are listed in [`MasonryLayout::warnings`].
#[tracing::instrument(level = "trace", skip_all, fields(items = items.len()))]
pub fn layout<P: FeedItem>(
    items: &[P],
    container_width: Px,
    args: &FeedGridArgs,
) -> Result<MasonryLayout, FeedError> {
    if !container_width.is_valid_extent() {
        return Err(FeedError::NegativeDimension {
            field: "container_width",
            value: container_width,
        });
    }
    let mut layout = MasonryLayout::empty(Geometry::new(container_width, args));
    layout.append(items)?;
    Ok(layout)
}

impl MasonryLayout {
    fn empty(geometry: Geometry) -> Self {
        let mut warnings = Vec::new();
        let padding_top = resolve_padding(geometry.padding.top, "top", &mut warnings);
        let padding_bottom = resolve_padding(geometry.padding.bottom, "bottom", &mut warnings);
        let gutter = geometry.column_gutter.positive();
        let column_width = ((geometry.container_width - gutter * 3.0) / 2.0).positive();

        Self {
            geometry,
            column_width,
            padding_top,
            padding_bottom,
            placements: Vec::new(),
            aspect_ratios: Vec::new(),
            columns: [Vec::new(), Vec::new()],
            cursors: [Px::ZERO; 2],
            index: HashMap::default(),
            canvas_height: padding_top + padding_bottom,
            warnings,
        }
    }

    /// Places `items` after the ones already laid out.
    ///
    /// On error the layout is left unchanged.
    fn append<P: FeedItem>(&mut self, items: &[P]) -> Result<(), FeedError> {
        let base = self.placements.len();
        let mut seen: HashMap<ItemId, usize> = HashMap::default();
        for (offset, item) in items.iter().enumerate() {
            let position = base + offset;
            let id = item.id();
            let first = self.index.get(&id).or_else(|| seen.get(&id)).copied();
            if let Some(first) = first {
                return Err(FeedError::DuplicateItem {
                    id,
                    first,
                    second: position,
                });
            }
            let aspect_ratio = item.aspect_ratio();
            if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
                return Err(FeedError::InvalidAspectRatio { id, aspect_ratio });
            }
            seen.insert(id, position);
        }

        let gutter = self.geometry.column_gutter.positive();
        // Zero-width tiles collapse to nothing, gutters included.
        let item_gutter = if self.column_width > Px::ZERO {
            self.geometry.item_gutter.positive()
        } else {
            Px::ZERO
        };
        self.placements.reserve(items.len());
        self.aspect_ratios.reserve(items.len());
        for (offset, item) in items.iter().enumerate() {
            let position = base + offset;
            let column = Column::for_position(position);
            let lane = column.index();
            let left = match column {
                Column::Left => gutter,
                Column::Right => gutter * 2.0 + self.column_width,
            };
            let height = self.column_width / item.aspect_ratio();
            let top = self.padding_top + self.cursors[lane];
            self.placements.push(Placement {
                item_id: item.id(),
                kind: item.media_kind(),
                column,
                rect: PxRect::new(left, top, self.column_width, height),
            });
            self.aspect_ratios.push(item.aspect_ratio());
            self.columns[lane].push(position);
            self.index.insert(item.id(), position);
            self.cursors[lane] += height + item_gutter;
        }

        let content = self
            .columns
            .iter()
            .zip(self.cursors.iter())
            .map(|(members, cursor)| {
                if members.is_empty() {
                    Px::ZERO
                } else {
                    (*cursor - item_gutter).positive()
                }
            })
            .fold(Px::ZERO, Px::max);
        self.canvas_height = self.padding_top + self.padding_bottom + content;
        Ok(())
    }

    /// Total scrollable height, paddings included.
    pub fn canvas_height(&self) -> Px {
        self.canvas_height
    }

    /// Width shared by every tile.
    pub fn column_width(&self) -> Px {
        self.column_width
    }

    /// Placements in feed order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of placed items.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Returns `true` when no item was placed.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Rectangle of the item with `id`, if it was placed.
    pub fn rect_of(&self, id: ItemId) -> Option<PxRect> {
        self.index.get(&id).map(|&position| self.placements[position].rect)
    }

    /// Feed positions of the items placed in `column`, top to bottom.
    pub fn column(&self, column: Column) -> &[usize] {
        &self.columns[column.index()]
    }

    /// Non-fatal problems found while resolving the input.
    pub fn warnings(&self) -> &[FeedError] {
        &self.warnings
    }

    /// Feed positions of every item whose rectangle overlaps `span`, in feed
    /// order.
    ///
    /// Columns are stacked top to bottom, so each column is searched with a
    /// binary search instead of a scan.
    pub fn positions_in(&self, span: &PxSpan) -> SmallVec<[usize; 16]> {
        if span.is_empty() {
            return SmallVec::new();
        }
        let mut positions = SmallVec::new();
        for members in &self.columns {
            let first = members
                .partition_point(|&position| self.placements[position].rect.bottom() <= span.start);
            positions.extend(
                members[first..]
                    .iter()
                    .copied()
                    .take_while(|&position| self.placements[position].rect.top < span.end)
                    .filter(|&position| self.placements[position].rect.intersects_span(span)),
            );
        }
        positions.sort_unstable();
        positions
    }
}

fn resolve_padding(
    value: PaddingValue,
    edge: &'static str,
    warnings: &mut Vec<FeedError>,
) -> Px {
    match value.resolve(edge) {
        Ok(px) => px,
        Err(err) => {
            warn!("{err}; falling back to 0");
            warnings.push(err);
            Px::ZERO
        }
    }
}

/// Keeps the last layout and extends it when the post list only grew.
///
/// Pagination appends to the feed, so most recomputations after the first
/// one either see the same list or the same list with a new tail.
#[derive(Debug, Default)]
pub struct MasonryCache {
    layout: Option<MasonryLayout>,
}

impl MasonryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a layout for `items`, reusing the cached one where possible.
    ///
    /// The cached layout is kept when the geometry is unchanged and every
    /// previously placed item reappears at the same position with the same
    /// id, media kind and aspect ratio. Anything else is laid out from
    /// scratch.
    pub fn update<P: FeedItem>(
        &mut self,
        items: &[P],
        container_width: Px,
        args: &FeedGridArgs,
    ) -> Result<&MasonryLayout, FeedError> {
        let geometry = Geometry::new(container_width, args);
        let next = match self.layout.take() {
            Some(mut cached) if cached.geometry == geometry && extends_prefix(&cached, items) => {
                let tail = &items[cached.len()..];
                if !tail.is_empty() {
                    debug!(
                        placed = cached.len(),
                        appended = tail.len(),
                        "Extending cached masonry layout"
                    );
                    if let Err(err) = cached.append(tail) {
                        self.layout = Some(cached);
                        return Err(err);
                    }
                }
                cached
            }
            previous => match layout(items, container_width, args) {
                Ok(fresh) => fresh,
                Err(err) => {
                    self.layout = previous;
                    return Err(err);
                }
            },
        };
        Ok(&*self.layout.insert(next))
    }

    /// The most recent layout, if any.
    pub fn current(&self) -> Option<&MasonryLayout> {
        self.layout.as_ref()
    }

    /// Drops the cached layout.
    pub fn clear(&mut self) {
        self.layout = None;
    }
}

fn extends_prefix<P: FeedItem>(cached: &MasonryLayout, items: &[P]) -> bool {
    let placed = cached.placements();
    items.len() >= placed.len()
        && placed
            .iter()
            .zip(&cached.aspect_ratios)
            .zip(items)
            .all(|((placement, &aspect_ratio), item)| {
                item.id() == placement.item_id
                    && item.media_kind() == placement.kind
                    && item.aspect_ratio() == aspect_ratio
            })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Post;

    fn alternating(count: u64, aspect_ratio: f32) -> Vec<Post> {
        (0..count)
            .map(|id| {
                if id % 2 == 0 {
                    Post::image(id, aspect_ratio)
                } else {
                    Post::video(id, aspect_ratio)
                }
            })
            .collect()
    }

    #[test]
    fn test_six_square_posts_form_two_columns_of_three() {
        let args = FeedGridArgs::default().padding(VerticalPadding::fixed(Px(20.0), Px(40.0)));
        let posts = alternating(6, 1.0);
        let layout = layout(&posts, Px(300.0), &args).unwrap();

        let width = layout.column_width();
        assert_eq!(width, Px(138.0));
        assert_eq!(layout.column(Column::Left), &[0, 2, 4]);
        assert_eq!(layout.column(Column::Right), &[1, 3, 5]);
        // Three stacked tiles with two gutters between them.
        let expected = Px(20.0) + Px(40.0) + width * 3.0 + Px(8.0) * 2.0;
        assert_eq!(layout.canvas_height(), expected);
    }

    #[test]
    fn test_columns_are_assigned_by_parity_not_height() {
        // A very tall first item does not push the third item to the right.
        let posts = vec![
            Post::image(1, 0.1),
            Post::image(2, 1.0),
            Post::image(3, 1.0),
        ];
        let layout = layout(&posts, Px(300.0), &FeedGridArgs::default()).unwrap();
        assert_eq!(layout.placements()[2].column, Column::Left);
        assert_eq!(layout.placements()[2].rect.left, Px(8.0));
        assert_eq!(layout.placements()[1].rect.left, Px(154.0));
    }

    #[test]
    fn test_layout_is_deterministic() {
        let posts = alternating(11, 0.8);
        let args = FeedGridArgs::default();
        let a = layout(&posts, Px(412.0), &args).unwrap();
        let b = layout(&posts, Px(412.0), &args).unwrap();
        assert_eq!(a.placements(), b.placements());
        assert_eq!(a.canvas_height(), b.canvas_height());
    }

    #[test]
    fn test_same_column_tiles_never_overlap() {
        let posts: Vec<Post> = (0..40u64)
            .map(|id| Post::image(id, 0.5 + (id % 5) as f32 * 0.4))
            .collect();
        let layout = layout(&posts, Px(390.0), &FeedGridArgs::default()).unwrap();
        for column in [Column::Left, Column::Right] {
            let members = layout.column(column);
            for pair in members.windows(2) {
                let upper = layout.placements()[pair[0]].rect;
                let lower = layout.placements()[pair[1]].rect;
                assert!(upper.bottom() <= lower.top);
                assert!(upper.is_orthogonal(&lower));
            }
        }
    }

    #[test]
    fn test_canvas_grows_monotonically_on_append() {
        let posts: Vec<Post> = (0..30u64)
            .map(|id| Post::video(id, 0.6 + (id % 3) as f32))
            .collect();
        let args = FeedGridArgs::default();
        let mut previous = Px::ZERO;
        for len in 0..=posts.len() {
            let height = layout(&posts[..len], Px(360.0), &args).unwrap().canvas_height();
            assert!(height >= previous, "{height} < {previous} at {len}");
            previous = height;
        }
    }

    #[test]
    fn test_height_follows_aspect_ratio() {
        let posts = [Post::image(1, 2.0), Post::image(2, 0.5)];
        let layout = layout(&posts, Px(300.0), &FeedGridArgs::default()).unwrap();
        assert_eq!(layout.rect_of(ItemId(1)).unwrap().height, Px(69.0));
        assert_eq!(layout.rect_of(ItemId(2)).unwrap().height, Px(276.0));
        assert_eq!(layout.rect_of(ItemId(9)), None);
    }

    #[test]
    fn test_percentage_padding_falls_back_to_zero_and_is_reported() {
        let args = FeedGridArgs::default().padding(VerticalPadding::new(
            PaddingValue::Percent(5.0),
            PaddingValue::Fixed(Px(10.0)),
        ));
        let posts = [Post::image(1, 1.0)];
        let layout = layout(&posts, Px(300.0), &args).unwrap();
        assert_eq!(layout.placements()[0].rect.top, Px::ZERO);
        assert_eq!(layout.canvas_height(), Px(148.0));
        assert_eq!(layout.warnings().len(), 1);
        assert!(matches!(
            layout.warnings()[0],
            FeedError::UnsupportedPadding { edge: "top", .. }
        ));
    }

    #[test]
    fn test_zero_width_container_yields_zero_size_tiles() {
        let posts = alternating(4, 1.0);
        let layout = layout(&posts, Px::ZERO, &FeedGridArgs::default()).unwrap();
        assert_eq!(layout.column_width(), Px::ZERO);
        for placement in layout.placements() {
            assert_eq!(placement.rect.width, Px::ZERO);
            assert_eq!(placement.rect.height, Px::ZERO);
            assert_eq!(placement.rect.top, Px::ZERO);
        }
        assert_eq!(layout.canvas_height(), Px::ZERO);
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let args = FeedGridArgs::default();
        let duplicate = [Post::image(1, 1.0), Post::image(2, 1.0), Post::video(1, 1.0)];
        assert_eq!(
            layout(&duplicate, Px(300.0), &args).unwrap_err(),
            FeedError::DuplicateItem {
                id: ItemId(1),
                first: 0,
                second: 2,
            }
        );

        let flat = [Post::image(1, 0.0)];
        assert!(matches!(
            layout(&flat, Px(300.0), &args),
            Err(FeedError::InvalidAspectRatio { .. })
        ));

        let posts = [Post::image(1, 1.0)];
        assert!(matches!(
            layout(&posts, Px(-1.0), &args),
            Err(FeedError::NegativeDimension { field: "container_width", .. })
        ));
    }

    #[test]
    fn test_positions_in_matches_linear_scan() {
        let posts: Vec<Post> = (0..60u64)
            .map(|id| Post::image(id, 0.4 + (id % 7) as f32 * 0.3))
            .collect();
        let layout = layout(&posts, Px(375.0), &FeedGridArgs::default()).unwrap();
        for start in (0..4000).step_by(137) {
            let span = PxSpan::new(Px(start as f32), Px(start as f32 + 900.0));
            let expected: Vec<usize> = layout
                .placements()
                .iter()
                .enumerate()
                .filter(|(_, placement)| placement.rect.intersects_span(&span))
                .map(|(position, _)| position)
                .collect();
            assert_eq!(layout.positions_in(&span).as_slice(), expected.as_slice());
        }
        assert!(layout.positions_in(&PxSpan::EMPTY).is_empty());
    }

    #[test]
    fn test_cache_extension_matches_full_layout() {
        let posts = alternating(25, 0.75);
        let args = FeedGridArgs::default().item_gutter(Px(6.0));
        let mut cache = MasonryCache::new();
        cache.update(&posts[..10], Px(360.0), &args).unwrap();
        cache.update(&posts[..18], Px(360.0), &args).unwrap();
        let extended = cache.update(&posts, Px(360.0), &args).unwrap().clone();

        let full = layout(&posts, Px(360.0), &args).unwrap();
        assert_eq!(extended.placements(), full.placements());
        assert_eq!(extended.canvas_height(), full.canvas_height());
    }

    #[test]
    fn test_cache_relayouts_on_width_or_prefix_change() {
        let posts = alternating(8, 1.0);
        let args = FeedGridArgs::default();
        let mut cache = MasonryCache::new();
        cache.update(&posts, Px(300.0), &args).unwrap();

        let rotated = cache.update(&posts, Px(600.0), &args).unwrap();
        assert_eq!(rotated.column_width(), Px(288.0));

        let replaced = alternating(3, 2.0);
        let relaid = cache.update(&replaced, Px(600.0), &args).unwrap();
        assert_eq!(relaid.len(), 3);
        assert_eq!(relaid.rect_of(ItemId(0)).unwrap().height, Px(144.0));
    }

    #[test]
    fn test_cache_relayouts_when_a_middle_item_changes() {
        let args = FeedGridArgs::default();
        let mut posts = alternating(6, 1.0);
        let mut cache = MasonryCache::new();
        cache.update(&posts, Px(300.0), &args).unwrap();

        posts[2].aspect_ratio = 0.25;
        let relaid = cache.update(&posts, Px(300.0), &args).unwrap().clone();
        let full = layout(&posts, Px(300.0), &args).unwrap();
        assert_eq!(relaid.placements(), full.placements());
        assert_eq!(relaid.canvas_height(), full.canvas_height());

        posts[3] = Post::image(3, 1.0);
        let relaid = cache.update(&posts, Px(300.0), &args).unwrap();
        assert_eq!(relaid.placements()[3].kind, MediaKind::Image);
        assert_eq!(
            relaid.placements(),
            layout(&posts, Px(300.0), &args).unwrap().placements()
        );
    }

    #[test]
    fn test_cache_rejects_duplicate_in_appended_tail() {
        let posts = alternating(4, 1.0);
        let args = FeedGridArgs::default();
        let mut cache = MasonryCache::new();
        cache.update(&posts, Px(300.0), &args).unwrap();

        let mut grown = posts.clone();
        grown.push(Post::image(2, 1.0));
        assert!(matches!(
            cache.update(&grown, Px(300.0), &args),
            Err(FeedError::DuplicateItem { id: ItemId(2), first: 2, second: 4 })
        ));
        assert_eq!(cache.current().map(MasonryLayout::len), Some(4));
    }
}
