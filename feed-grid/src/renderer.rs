//! Hand a [`RenderPlan`] to the host's item renderer.
//!
//! The renderer should key its heavyweight surfaces by
//! [`RenderKey`](crate::key_pool::RenderKey), not by item id. That is what
//! lets a decoder or image view move from an item scrolling out to the item
//! scrolling in instead of being rebuilt.

use crate::grid::{LiveAssignment, Placeholder, RenderPlan};

/// Host-side painter for feed items.
pub trait ItemRenderer {
    /// Paints the placeholder of an item. Called for every post, live or not,
    /// before any live item.
    fn placeholder(&mut self, _placeholder: &Placeholder) {}

    /// Paints a live item on the surface identified by its render key.
    fn render(&mut self, assignment: &LiveAssignment);
}

impl<R: ItemRenderer + ?Sized> ItemRenderer for &mut R {
    fn placeholder(&mut self, placeholder: &Placeholder) {
        (**self).placeholder(placeholder);
    }

    fn render(&mut self, assignment: &LiveAssignment) {
        (**self).render(assignment);
    }
}

impl RenderPlan {
    /// Pushes every placeholder, then every live assignment, to `renderer`.
    ///
    /// The scroll command is not dispatched; it belongs to the scroll host.
    pub fn dispatch<R: ItemRenderer + ?Sized>(&self, renderer: &mut R) {
        for placeholder in &self.placeholders {
            renderer.placeholder(placeholder);
        }
        for assignment in &self.live_assignments {
            renderer.render(assignment);
        }
    }
}

#[cfg(test)]
mod tests {
    use rustc_hash::FxHashMap as HashMap;

    use super::*;
    use crate::{FeedFrame, FeedGrid, ItemId, Post, key_pool::RenderKey, px::Px};

    /// Counts surface allocations the way a host keyed by render key would.
    #[derive(Default)]
    struct SurfaceRecorder {
        placeholders: usize,
        surfaces: HashMap<RenderKey, ItemId>,
        allocations: usize,
        rendered: Vec<ItemId>,
    }

    impl ItemRenderer for SurfaceRecorder {
        fn placeholder(&mut self, _placeholder: &Placeholder) {
            self.placeholders += 1;
        }

        fn render(&mut self, assignment: &LiveAssignment) {
            if self
                .surfaces
                .insert(assignment.render_key, assignment.item_id)
                .is_none()
            {
                self.allocations += 1;
            }
            self.rendered.push(assignment.item_id);
        }
    }

    #[test]
    fn test_dispatch_visits_placeholders_then_live_items() {
        let posts: Vec<Post> = (0..12u64).map(|id| Post::video(id, 1.0)).collect();
        let mut grid = FeedGrid::default();
        let plan = grid
            .recompute(&FeedFrame::new(&posts, Px(300.0), Px(800.0)))
            .unwrap();

        let mut recorder = SurfaceRecorder::default();
        plan.dispatch(&mut recorder);
        assert_eq!(recorder.placeholders, 12);
        assert_eq!(recorder.rendered, plan.live_ids().collect::<Vec<_>>());
    }

    #[test]
    fn test_scrolling_a_long_feed_allocates_few_surfaces() {
        let posts: Vec<Post> = (0..300u64)
            .map(|id| {
                if id % 4 == 0 {
                    Post::video(id, 0.8)
                } else {
                    Post::image(id, 1.2)
                }
            })
            .collect();
        let mut grid = FeedGrid::default();
        let mut recorder = SurfaceRecorder::default();
        let mut rendered = 0;
        for offset in (0..15_000).step_by(40) {
            let frame =
                FeedFrame::new(&posts, Px(360.0), Px(780.0)).scroll_offset(Px(offset as f32));
            let plan = grid.recompute(&frame).unwrap();
            rendered += plan.live_assignments.len();
            plan.dispatch(&mut recorder);
        }
        assert_eq!(recorder.allocations, grid.pool().total_keys());
        assert!(recorder.allocations * 10 < rendered);
    }
}
