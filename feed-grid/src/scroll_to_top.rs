//! Freeze recycling while the feed animates back to the top.
//!
//! A scroll-to-top animation sweeps through every band between the current
//! offset and zero within a few hundred milliseconds. Windowing each of those
//! frames would swap content under the user's eyes and churn the key pool for
//! nothing, so the controller hands back the live set captured when the
//! request arrived until the animation is over.
//!
//! The animation is over when any of the following happens:
//!
//! - the reported offset is within `settle_epsilon` of zero (or below it,
//!   on an overshooting bounce);
//! - the offset grows again by more than `settle_epsilon`, meaning the user
//!   grabbed the list;
//! - `max_frozen_frames` frames passed without either of the above.
use tracing::{debug, warn};

use crate::{FeedGridArgs, px::Px};

/// Whether windowing currently runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollPhase {
    /// Normal windowing and recycling.
    #[default]
    Idle,
    /// The live set is frozen until the animation to the top ends.
    ScrollingToTop,
}

/// Instruction for the scroll host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollCommand {
    /// Animate the scroll offset to zero.
    AnimateToTop,
}

/// Why a scroll-to-top animation stopped freezing the live set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exit {
    /// The offset reached the top.
    Settled,
    /// The offset moved away from the top again.
    Cancelled,
    /// The frozen frame budget ran out.
    TimedOut,
}

/// What the caller should do this frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Poll<S> {
    /// Window normally.
    Live,
    /// A request arrived. Window normally, then hand the result to
    /// [`ScrollToTop::enter`].
    Enter,
    /// Reuse the snapshot taken on entry.
    Frozen(S),
    /// The animation ended this frame. Window normally.
    Exited(Exit),
}

#[derive(Debug, Clone)]
enum State<S> {
    Idle,
    ScrollingToTop {
        snapshot: S,
        last_offset: Px,
        frozen_frames: u32,
    },
}

/// Scroll-to-top state machine, generic over the snapshot it freezes.
#[derive(Debug, Clone)]
pub struct ScrollToTop<S> {
    state: State<S>,
    settle_epsilon: Px,
    max_frozen_frames: Option<u32>,
}

impl<S> Default for ScrollToTop<S> {
    fn default() -> Self {
        Self::from_args(&FeedGridArgs::default())
    }
}

impl<S> ScrollToTop<S> {
    /// Creates an idle controller.
    pub fn new(settle_epsilon: Px, max_frozen_frames: Option<u32>) -> Self {
        Self {
            state: State::Idle,
            settle_epsilon: settle_epsilon.positive(),
            max_frozen_frames,
        }
    }

    /// Creates an idle controller with the limits from `args`.
    pub fn from_args(args: &FeedGridArgs) -> Self {
        Self::new(args.settle_epsilon, args.max_frozen_frames)
    }

    /// Replaces the limits without touching a running animation.
    pub fn set_limits(&mut self, settle_epsilon: Px, max_frozen_frames: Option<u32>) {
        self.settle_epsilon = settle_epsilon.positive();
        self.max_frozen_frames = max_frozen_frames;
    }

    /// Current phase.
    pub fn phase(&self) -> ScrollPhase {
        match self.state {
            State::Idle => ScrollPhase::Idle,
            State::ScrollingToTop { .. } => ScrollPhase::ScrollingToTop,
        }
    }

    /// Snapshot frozen by the running animation.
    pub fn snapshot(&self) -> Option<&S> {
        match &self.state {
            State::Idle => None,
            State::ScrollingToTop { snapshot, .. } => Some(snapshot),
        }
    }

    /// Starts freezing `snapshot` and returns the command for the scroll host.
    pub fn enter(&mut self, snapshot: S, offset: Px) -> ScrollCommand {
        debug!(%offset, "Scroll-to-top started");
        self.state = State::ScrollingToTop {
            snapshot,
            last_offset: offset,
            frozen_frames: 0,
        };
        ScrollCommand::AnimateToTop
    }

    /// Drops a running animation without waiting for it to end.
    pub fn reset(&mut self) {
        self.state = State::Idle;
    }
}

impl<S: Clone> ScrollToTop<S> {
    /// Feeds one reported scroll offset to the state machine.
    ///
    /// A request that arrives while an animation is already running is
    /// ignored, as is a request made while already at the top.
    pub fn poll(&mut self, offset: Px, requested: bool) -> Poll<S> {
        let epsilon = self.settle_epsilon;
        let max_frozen_frames = self.max_frozen_frames;

        let State::ScrollingToTop {
            snapshot,
            last_offset,
            frozen_frames,
        } = &mut self.state
        else {
            if !requested {
                return Poll::Live;
            }
            if offset <= epsilon {
                debug!(%offset, "Scroll-to-top requested while already at the top");
                return Poll::Live;
            }
            return Poll::Enter;
        };

        let exit = if offset <= epsilon {
            Some(Exit::Settled)
        } else if offset - *last_offset > epsilon {
            Some(Exit::Cancelled)
        } else if max_frozen_frames.is_some_and(|max| *frozen_frames >= max) {
            Some(Exit::TimedOut)
        } else {
            None
        };

        if let Some(exit) = exit {
            let frames = *frozen_frames;
            self.state = State::Idle;
            match exit {
                Exit::Settled => debug!(frames, "Scroll-to-top settled"),
                Exit::Cancelled => {
                    debug!(frames, %offset, "Scroll-to-top cancelled by user scroll")
                }
                Exit::TimedOut => warn!(
                    frames,
                    %offset,
                    "Scroll-to-top never reached the top; resuming windowing"
                ),
            }
            return Poll::Exited(exit);
        }

        *last_offset = offset;
        *frozen_frames += 1;
        Poll::Frozen(snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(offset: f32) -> ScrollToTop<Vec<u32>> {
        let mut controller = ScrollToTop::default();
        assert_eq!(controller.poll(Px(offset), true), Poll::Enter);
        assert_eq!(
            controller.enter(vec![7, 8], Px(offset)),
            ScrollCommand::AnimateToTop
        );
        controller
    }

    #[test]
    fn test_idle_without_request() {
        let mut controller: ScrollToTop<Vec<u32>> = ScrollToTop::default();
        assert_eq!(controller.poll(Px(900.0), false), Poll::Live);
        assert_eq!(controller.phase(), ScrollPhase::Idle);
    }

    #[test]
    fn test_frozen_until_top() {
        let mut controller = started(3000.0);
        assert_eq!(controller.phase(), ScrollPhase::ScrollingToTop);
        for offset in [2400.0, 1500.0, 700.0, 90.0, 3.0] {
            assert_eq!(controller.poll(Px(offset), false), Poll::Frozen(vec![7, 8]));
        }
        assert_eq!(controller.poll(Px::ZERO, false), Poll::Exited(Exit::Settled));
        assert_eq!(controller.phase(), ScrollPhase::Idle);
        assert_eq!(controller.poll(Px::ZERO, false), Poll::Live);
    }

    #[test]
    fn test_overshoot_and_near_zero_settle() {
        let mut controller = started(1200.0);
        assert_eq!(controller.poll(Px(-6.0), false), Poll::Exited(Exit::Settled));

        let mut controller = started(1200.0);
        assert_eq!(controller.poll(Px(0.3), false), Poll::Exited(Exit::Settled));
    }

    #[test]
    fn test_user_scroll_cancels() {
        let mut controller = started(2000.0);
        assert!(matches!(controller.poll(Px(1200.0), false), Poll::Frozen(_)));
        assert_eq!(
            controller.poll(Px(1260.0), false),
            Poll::Exited(Exit::Cancelled)
        );
        assert!(controller.snapshot().is_none());
    }

    #[test]
    fn test_stuck_animation_times_out() {
        let mut controller: ScrollToTop<Vec<u32>> = ScrollToTop::new(Px(0.5), Some(3));
        assert_eq!(controller.poll(Px(500.0), true), Poll::Enter);
        controller.enter(Vec::new(), Px(500.0));
        for _ in 0..3 {
            assert!(matches!(controller.poll(Px(40.0), false), Poll::Frozen(_)));
        }
        assert_eq!(controller.poll(Px(40.0), false), Poll::Exited(Exit::TimedOut));
    }

    #[test]
    fn test_without_frame_budget_waits_forever() {
        let mut controller: ScrollToTop<Vec<u32>> = ScrollToTop::new(Px(0.5), None);
        controller.enter(Vec::new(), Px(500.0));
        for _ in 0..1_000 {
            assert!(matches!(controller.poll(Px(40.0), false), Poll::Frozen(_)));
        }
    }

    #[test]
    fn test_repeated_request_is_ignored() {
        let mut controller = started(800.0);
        assert_eq!(controller.poll(Px(600.0), true), Poll::Frozen(vec![7, 8]));
    }

    #[test]
    fn test_request_at_top_does_nothing() {
        let mut controller: ScrollToTop<Vec<u32>> = ScrollToTop::default();
        assert_eq!(controller.poll(Px::ZERO, true), Poll::Live);
        assert_eq!(controller.phase(), ScrollPhase::Idle);
    }
}
