//! Scroll offsets, animated scrolls and group paging.

use std::time::{Duration, Instant};

/// Content offset of the grid.
///
/// `y` scrolls the grid along its main axis, `x` scrolls the single section orthogonally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollOffset {
    pub x: f32,
    pub y: f32,
}

impl ScrollOffset {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn clamp(self, max: ScrollOffset) -> Self {
        Self {
            x: self.x.clamp(0.0, max.x.max(0.0)),
            y: self.y.clamp(0.0, max.y.max(0.0)),
        }
    }

    fn lerp(self, to: ScrollOffset, t: f32) -> Self {
        Self {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
        }
    }
}

/// Where a scrolled-to item ends up in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollPosition {
    /// Item center on the viewport center, on both axes.
    #[default]
    CenteredBoth,
    /// Item leading edge on the section's leading inset.
    Leading,
}

/// An in-flight animated scroll.
#[derive(Debug, Clone, Copy)]
pub struct ScrollAnimation {
    from: ScrollOffset,
    to: ScrollOffset,
    duration: Duration,
    started: Option<Instant>,
}

impl ScrollAnimation {
    pub fn new(from: ScrollOffset, to: ScrollOffset, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            started: None,
        }
    }

    pub fn target(&self) -> ScrollOffset {
        self.to
    }

    /// Offset at `now` and whether the animation has finished.
    ///
    /// The first sample starts the clock, so an animation created long before its first frame
    /// still plays in full.
    pub fn sample(&mut self, now: Instant) -> (ScrollOffset, bool) {
        let started = *self.started.get_or_insert(now);

        if self.duration.is_zero() {
            return (self.to, true);
        }

        let elapsed = now.saturating_duration_since(started);
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0);

        if t >= 1.0 {
            (self.to, true)
        } else {
            (self.from.lerp(self.to, ease_out_cubic(t)), false)
        }
    }
}

fn ease_out_cubic(t: f32) -> f32 {
    1.0 - (1.0 - t).powi(3)
}

/// Velocity (units per second) above which a released drag advances a page even if it did
/// not cross the halfway point.
pub const PAGING_FLICK_VELOCITY: f32 = 300.0;

/// Page a group-paging gesture settles on.
///
/// `start_page` is the page under the leading inset when the gesture began. The result moves
/// at most one page away from it and never leaves `0..page_count`.
pub fn settle_page(
    start_page: usize,
    offset_x: f32,
    velocity_x: f32,
    page_width: f32,
    page_count: usize,
) -> usize {
    if page_count == 0 || page_width <= 0.0 {
        return 0;
    }

    let last = page_count - 1;
    let position = offset_x / page_width;

    let proposed = if velocity_x > PAGING_FLICK_VELOCITY {
        position.floor() as isize + 1
    } else if velocity_x < -PAGING_FLICK_VELOCITY {
        position.ceil() as isize - 1
    } else {
        position.round() as isize
    };

    let start = start_page.min(last) as isize;
    let page = proposed.clamp(start - 1, start + 1).clamp(0, last as isize);
    page as usize
}
