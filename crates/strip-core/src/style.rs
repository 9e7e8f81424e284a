use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::dimension::ItemSize;
use crate::geometry::Insets;

/// How the section scrolls relative to the grid's main (vertical) axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ScrollBehavior {
    /// Free orthogonal scrolling, no snapping.
    Continuous,
    /// Orthogonal scrolling that settles on group boundaries.
    #[default]
    GroupPaging,
}

/// Visual constants of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStyle {
    /// Used when no delegate is bound or its size cannot be resolved.
    pub default_group_size: ItemSize,
    /// Trailing content inset of every group, i.e. the gap between pages.
    pub group_trailing_inset: f32,
    pub section_insets: Insets,
    pub corner_radius: f32,
    pub scroll_behavior: ScrollBehavior,
    #[serde(with = "millis")]
    pub scroll_animation: Duration,
}

impl GridStyle {
    pub const DEFAULT_GROUP_EDGE: f32 = 50.0;
    pub const GROUP_TRAILING_INSET: f32 = 8.0;
    pub const CORNER_RADIUS: f32 = 16.0;

    pub fn with_default_group_size(mut self, size: ItemSize) -> Self {
        self.default_group_size = size;
        self
    }

    pub fn with_section_insets(mut self, insets: Insets) -> Self {
        self.section_insets = insets;
        self
    }

    pub fn with_group_trailing_inset(mut self, inset: f32) -> Self {
        self.group_trailing_inset = inset;
        self
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn with_scroll_behavior(mut self, behavior: ScrollBehavior) -> Self {
        self.scroll_behavior = behavior;
        self
    }

    pub fn with_scroll_animation(mut self, duration: Duration) -> Self {
        self.scroll_animation = duration;
        self
    }
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            default_group_size: ItemSize::absolute(
                Self::DEFAULT_GROUP_EDGE,
                Self::DEFAULT_GROUP_EDGE,
            ),
            group_trailing_inset: Self::GROUP_TRAILING_INSET,
            section_insets: Insets::new(24.0, 16.0, 10.0, 0.0),
            corner_radius: Self::CORNER_RADIUS,
            scroll_behavior: ScrollBehavior::GroupPaging,
            scroll_animation: Duration::from_millis(300),
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
