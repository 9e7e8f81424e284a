//! Pointer gesture tracking for the image strip, kept free of widget plumbing.

use std::time::{Duration, Instant};

use cosmic::iced::{Point, mouse::ScrollDelta};

/// Movement below this distance still counts as a tap.
pub const DRAG_THRESHOLD: f32 = 4.0;

/// Pixels scrolled per wheel line.
pub const WHEEL_LINE: f32 = 40.0;

/// A release this long after the last movement carries no velocity.
const VELOCITY_STALE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEnd {
    Tap(Point),
    /// Horizontal release velocity in content units per second.
    Fling { velocity_x: f32 },
}

/// A primary-button drag in progress.
#[derive(Debug, Clone, Copy)]
pub struct Drag {
    origin: Point,
    last: Point,
    last_time: Instant,
    velocity_x: f32,
    moved: bool,
}

impl Drag {
    pub fn begin(at: Point, now: Instant) -> Self {
        Self {
            origin: at,
            last: at,
            last_time: now,
            velocity_x: 0.0,
            moved: false,
        }
    }

    pub fn moved(&self) -> bool {
        self.moved
    }

    /// Content delta for a pointer move to `at`, once past the tap threshold.
    ///
    /// Dragging left scrolls the content forward, so the delta is the pointer delta negated.
    pub fn move_to(&mut self, at: Point, now: Instant) -> Option<(f32, f32)> {
        if !self.moved {
            if self.origin.distance(at) < DRAG_THRESHOLD {
                return None;
            }
            self.moved = true;
        }

        let dx = self.last.x - at.x;
        let dy = self.last.y - at.y;

        let dt = now.saturating_duration_since(self.last_time).as_secs_f32();
        if dt > 0.0 {
            self.velocity_x = dx / dt;
        }

        self.last = at;
        self.last_time = now;

        Some((dx, dy))
    }

    pub fn finish(self, at: Point, now: Instant) -> GestureEnd {
        if !self.moved {
            return GestureEnd::Tap(at);
        }

        let velocity_x = if now.saturating_duration_since(self.last_time) > VELOCITY_STALE {
            0.0
        } else {
            self.velocity_x
        };

        GestureEnd::Fling { velocity_x }
    }
}

/// Horizontal content delta for a wheel event. A plain vertical wheel scrolls the strip too.
pub fn wheel_delta(delta: ScrollDelta) -> f32 {
    let (x, y) = match delta {
        ScrollDelta::Lines { x, y } => (x * WHEEL_LINE, y * WHEEL_LINE),
        ScrollDelta::Pixels { x, y } => (x, y),
    };

    if x.abs() >= y.abs() { -x } else { -y }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_small_movement_is_a_tap() {
        let start = Instant::now();
        let mut drag = Drag::begin(Point::new(10.0, 10.0), start);

        assert_eq!(drag.move_to(Point::new(12.0, 11.0), start), None);
        assert!(!drag.moved());
        assert_eq!(
            drag.finish(Point::new(12.0, 11.0), start),
            GestureEnd::Tap(Point::new(12.0, 11.0))
        );
    }

    #[test]
    fn test_drag_scrolls_against_pointer() {
        let start = Instant::now();
        let mut drag = Drag::begin(Point::new(100.0, 10.0), start);

        let delta = drag.move_to(Point::new(80.0, 10.0), start + Duration::from_millis(10));
        assert_eq!(delta, Some((20.0, 0.0)));

        let delta = drag.move_to(Point::new(70.0, 12.0), start + Duration::from_millis(20));
        assert_eq!(delta, Some((10.0, -2.0)));
        assert!(drag.moved());
    }

    #[test]
    fn test_release_velocity() {
        let start = Instant::now();
        let mut drag = Drag::begin(Point::new(100.0, 0.0), start);
        drag.move_to(Point::new(90.0, 0.0), start + Duration::from_millis(10));

        match drag.finish(Point::new(90.0, 0.0), start + Duration::from_millis(20)) {
            GestureEnd::Fling { velocity_x } => assert!((velocity_x - 1000.0).abs() < 1.0),
            other => panic!("expected fling, got {other:?}"),
        }

        // Holding still before letting go
        assert_eq!(
            drag.finish(Point::new(90.0, 0.0), start + Duration::from_millis(500)),
            GestureEnd::Fling { velocity_x: 0.0 }
        );
    }

    #[test]
    fn test_wheel_maps_to_horizontal() {
        assert_eq!(wheel_delta(ScrollDelta::Lines { x: 0.0, y: -1.0 }), WHEEL_LINE);
        assert_eq!(wheel_delta(ScrollDelta::Pixels { x: 12.0, y: 3.0 }), -12.0);
        assert_eq!(wheel_delta(ScrollDelta::Pixels { x: 0.0, y: 0.0 }), 0.0);
    }
}
