//! A headless feed session.
//!
//! Paginates a synthetic feed, scrolls through it frame by frame, jumps back
//! to the top and reports how many surfaces a renderer keyed by render key
//! would have allocated.

use feed_grid::{
    FeedError, FeedFrame, FeedGrid, FeedGridArgs, ItemId, ItemRenderer, LiveAssignment,
    MediaKind, Placeholder, Post, RenderKey, RenderPlan, ScrollCommand, VerticalPadding, px::Px,
};
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, info};

const ASPECT_RATIOS: [f32; 5] = [1.0, 0.8, 1.25, 0.5625, 1.5];

/// Append-only post source that hands out fixed-size pages.
pub struct SyntheticFeed {
    page_size: usize,
    posts: Vec<Post>,
}

impl SyntheticFeed {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size,
            posts: Vec::new(),
        }
    }

    /// Appends the next page.
    pub fn load_next_page(&mut self) {
        let start = self.posts.len();
        for n in start..start + self.page_size {
            let id = ItemId::from_key(&format!("post-{n}"));
            let kind = if n % 3 == 2 {
                MediaKind::Video
            } else {
                MediaKind::Image
            };
            self.posts
                .push(Post::new(id, kind, ASPECT_RATIOS[n % ASPECT_RATIOS.len()]));
        }
        info!(posts = self.posts.len(), "Loaded page");
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }
}

/// Renderer that only tracks which item each surface shows.
#[derive(Default)]
pub struct SurfaceLog {
    surfaces: HashMap<RenderKey, ItemId>,
    placeholders: usize,
    allocations: usize,
    handoffs: usize,
}

impl SurfaceLog {
    /// Surfaces created so far.
    pub fn allocations(&self) -> usize {
        self.allocations
    }

    /// Times a surface switched to a different item.
    pub fn handoffs(&self) -> usize {
        self.handoffs
    }
}

impl ItemRenderer for SurfaceLog {
    fn placeholder(&mut self, _placeholder: &Placeholder) {
        self.placeholders += 1;
    }

    fn render(&mut self, assignment: &LiveAssignment) {
        match self
            .surfaces
            .insert(assignment.render_key, assignment.item_id)
        {
            None => {
                self.allocations += 1;
                debug!(key = ?assignment.render_key, kind = %assignment.kind, "Allocated surface");
            }
            Some(previous) if previous != assignment.item_id => {
                self.handoffs += 1;
                debug!(
                    key = ?assignment.render_key,
                    from = %previous,
                    to = %assignment.item_id,
                    "Surface handed over"
                );
            }
            Some(_) => {}
        }
    }
}

/// Scroll container stand-in with a smoothed programmatic scroll.
struct ScrollHost {
    offset: Px,
    target: Option<Px>,
    smoothing: f32,
}

impl ScrollHost {
    fn new() -> Self {
        Self {
            offset: Px::ZERO,
            target: None,
            smoothing: 0.8,
        }
    }

    fn scroll_by(&mut self, delta: Px, max_offset: Px) {
        self.target = None;
        self.offset = (self.offset + delta).min(max_offset).positive();
    }

    fn execute(&mut self, command: ScrollCommand) {
        match command {
            ScrollCommand::AnimateToTop => self.target = Some(Px::ZERO),
        }
    }

    /// Advances a running animation by one 60 fps frame.
    fn tick(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let diff = target - self.offset;
        if diff.raw().abs() < 1.0 {
            self.offset = target;
            self.target = None;
            return true;
        }
        self.offset += diff * (1.0 - self.smoothing);
        true
    }
}

/// A grid wired to a feed, a scroll host and a surface log.
pub struct Session {
    grid: FeedGrid,
    feed: SyntheticFeed,
    host: ScrollHost,
    surfaces: SurfaceLog,
    container_width: Px,
    viewport_height: Px,
    header_height: Px,
    canvas_height: Px,
    frames: usize,
}

impl Session {
    pub fn new(args: FeedGridArgs, container_width: Px, viewport_height: Px) -> Self {
        let mut feed = SyntheticFeed::new(24);
        feed.load_next_page();
        Self {
            grid: FeedGrid::new(args),
            feed,
            host: ScrollHost::new(),
            surfaces: SurfaceLog::default(),
            container_width,
            viewport_height,
            header_height: Px(96.0),
            canvas_height: Px::ZERO,
            frames: 0,
        }
    }

    pub fn surfaces(&self) -> &SurfaceLog {
        &self.surfaces
    }

    pub fn grid(&self) -> &FeedGrid {
        &self.grid
    }

    /// Recomputes and dispatches one frame.
    pub fn frame(&mut self, request_scroll_to_top: bool) -> Result<RenderPlan, FeedError> {
        let mut frame = FeedFrame::new(
            self.feed.posts(),
            self.container_width,
            self.viewport_height,
        )
        .scroll_offset(self.host.offset)
        .header_height(self.header_height);
        if request_scroll_to_top {
            frame = frame.request_scroll_to_top();
        }

        let plan = self.grid.recompute(&frame)?;
        self.frames += 1;
        self.canvas_height = plan.canvas_height;
        plan.dispatch(&mut self.surfaces);
        if let Some(command) = plan.scroll_command {
            self.host.execute(command);
        }
        Ok(plan)
    }

    /// Scrolls by `delta`, loading a page when the end comes close.
    pub fn scroll_by(&mut self, delta: Px) -> Result<RenderPlan, FeedError> {
        let content_bottom = self.header_height + self.canvas_height;
        if self.host.offset + self.viewport_height * 2.0 > content_bottom {
            self.feed.load_next_page();
        }
        let max_offset = (content_bottom - self.viewport_height).positive();
        self.host.scroll_by(delta, max_offset);
        self.frame(false)
    }

    /// Requests a scroll to the top and runs frames until the host stops.
    pub fn scroll_to_top(&mut self) -> Result<RenderPlan, FeedError> {
        let mut plan = self.frame(true)?;
        while self.host.tick() {
            plan = self.frame(false)?;
        }
        Ok(plan)
    }
}

/// Scripted session: scroll far down, jump back up, scroll a bit again.
pub fn run() -> Result<RenderPlan, FeedError> {
    let args = FeedGridArgs::default().padding(VerticalPadding::fixed(Px(12.0), Px(72.0)));
    let mut session = Session::new(args, Px(390.0), Px(844.0));
    session.frame(false)?;

    for _ in 0..120 {
        session.scroll_by(Px(96.0))?;
    }
    info!(
        frames = session.frames,
        keys = session.grid().pool().total_keys(),
        allocations = session.surfaces().allocations(),
        handoffs = session.surfaces().handoffs(),
        "Scrolled down"
    );

    let top = session.scroll_to_top()?;
    info!(frames = session.frames, phase = ?top.phase, "Back at the top");

    let mut plan = top;
    for _ in 0..10 {
        plan = session.scroll_by(Px(64.0))?;
    }
    info!(
        frames = session.frames,
        posts = plan.placeholders.len(),
        live = plan.live_assignments.len(),
        keys = session.grid().pool().total_keys(),
        allocations = session.surfaces().allocations(),
        handoffs = session.surfaces().handoffs(),
        placeholders_painted = session.surfaces().placeholders,
        "Session finished"
    );
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use feed_grid::ScrollPhase;

    use super::*;

    #[test]
    fn test_session_recycles_surfaces() {
        let plan = run().unwrap();
        assert_eq!(plan.phase, ScrollPhase::Idle);
        assert!(plan.placeholders.len() > 24);
    }

    #[test]
    fn test_scroll_to_top_lands_at_zero() {
        let mut session = Session::new(FeedGridArgs::default(), Px(390.0), Px(844.0));
        for _ in 0..40 {
            session.scroll_by(Px(120.0)).unwrap();
        }
        let plan = session.scroll_to_top().unwrap();
        assert_eq!(session.host.offset, Px::ZERO);
        assert_eq!(plan.phase, ScrollPhase::Idle);
        assert_eq!(plan.band.index, 0);
        assert!(session.surfaces().allocations() == session.grid().pool().total_keys());
    }
}
