//! Section layout: one section holding a row of single-item groups.
//!
//! The section is computed with taffy as a non-wrapping flex row padded by the section
//! insets. Every group is a fixed-size flex container padded on its trailing edge, and its
//! only item fills the remaining content box.

use std::ops::Range;

use taffy::{
    AlignItems, AvailableSpace, Display, FlexDirection, FlexWrap, LengthPercentage, NodeId, Style,
    TaffyError, TaffyTree,
};
use thiserror::Error;

use crate::dimension::ItemSize;
use crate::geometry::{Point, Rect, Size};
use crate::scroll::{ScrollOffset, ScrollPosition};
use crate::style::GridStyle;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Group size resolves to {width}x{height}")]
    NonPositiveSize { width: f32, height: f32 },

    #[error("Layout engine failed: {0}")]
    Engine(#[from] TaffyError),
}

pub type LayoutResult<T> = Result<T, LayoutError>;

/// Frames of every item of the section, in content coordinates.
#[derive(Debug, Clone, Default)]
pub struct SectionLayout {
    bounds: Size,
    group_size: Size,
    section_size: Size,
    group_frames: Vec<Rect>,
    item_frames: Vec<Rect>,
}

impl SectionLayout {
    /// Lays out `item_count` groups inside a grid of `bounds`.
    ///
    /// `requested` is the delegate's group size; it falls back to the style's default group
    /// size when absent or unresolvable.
    pub fn build(
        style: &GridStyle,
        requested: Option<ItemSize>,
        item_count: usize,
        bounds: Size,
    ) -> LayoutResult<Self> {
        let group_size = resolve_group_size(style, requested, bounds);

        let mut taffy: TaffyTree<()> = TaffyTree::new();
        taffy.disable_rounding();

        let insets = style.section_insets;
        let section_style = Style {
            display: Display::Flex,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            align_items: Some(AlignItems::FlexStart),
            padding: taffy::Rect {
                left: LengthPercentage::length(insets.leading),
                right: LengthPercentage::length(insets.trailing),
                top: LengthPercentage::length(insets.top),
                bottom: LengthPercentage::length(insets.bottom),
            },
            ..Default::default()
        };

        let group_style = Style {
            display: Display::Flex,
            flex_shrink: 0.0,
            size: taffy::Size {
                width: taffy::Dimension::length(group_size.width),
                height: taffy::Dimension::length(group_size.height),
            },
            padding: taffy::Rect {
                left: LengthPercentage::length(0.0),
                right: LengthPercentage::length(style.group_trailing_inset),
                top: LengthPercentage::length(0.0),
                bottom: LengthPercentage::length(0.0),
            },
            ..Default::default()
        };

        let item_style = Style {
            size: taffy::Size {
                width: taffy::Dimension::percent(1.0),
                height: taffy::Dimension::percent(1.0),
            },
            ..Default::default()
        };

        let mut nodes: Vec<(NodeId, NodeId)> = Vec::with_capacity(item_count);
        for _ in 0..item_count {
            let item = taffy.new_leaf(item_style.clone())?;
            let group = taffy.new_with_children(group_style.clone(), &[item])?;
            nodes.push((group, item));
        }

        let groups: Vec<NodeId> = nodes.iter().map(|(group, _)| *group).collect();
        let section = taffy.new_with_children(section_style, &groups)?;

        taffy.compute_layout(
            section,
            taffy::Size {
                width: AvailableSpace::MaxContent,
                height: AvailableSpace::MaxContent,
            },
        )?;

        let mut group_frames = Vec::with_capacity(item_count);
        let mut item_frames = Vec::with_capacity(item_count);
        for (group, item) in nodes {
            let group_layout = taffy.layout(group)?;
            let item_layout = taffy.layout(item)?;

            let group_frame = Rect::new(
                group_layout.location.x,
                group_layout.location.y,
                group_layout.size.width,
                group_layout.size.height,
            );
            item_frames.push(Rect::new(
                group_frame.x + item_layout.location.x,
                group_frame.y + item_layout.location.y,
                item_layout.size.width,
                item_layout.size.height,
            ));
            group_frames.push(group_frame);
        }

        let section_layout = taffy.layout(section)?;
        // An empty section still reserves one group's height
        let section_size = Size::new(
            section_layout.size.width,
            section_layout
                .size
                .height
                .max(insets.vertical() + group_size.height),
        );

        Ok(Self {
            bounds,
            group_size,
            section_size,
            group_frames,
            item_frames,
        })
    }

    pub fn item_count(&self) -> usize {
        self.item_frames.len()
    }

    pub fn group_size(&self) -> Size {
        self.group_size
    }

    /// Scrollable extent of the section on both axes.
    pub fn section_size(&self) -> Size {
        self.section_size
    }

    /// Content size of the grid itself: the section scrolls horizontally inside its own
    /// band, so the grid is as wide as its bounds.
    pub fn content_size(&self) -> Size {
        Size::new(self.bounds.width, self.section_size.height)
    }

    pub fn item_frame(&self, index: usize) -> Option<Rect> {
        self.item_frames.get(index).copied()
    }

    pub fn group_frame(&self, index: usize) -> Option<Rect> {
        self.group_frames.get(index).copied()
    }

    pub fn max_offset(&self) -> ScrollOffset {
        ScrollOffset::new(
            (self.section_size.width - self.bounds.width).max(0.0),
            (self.section_size.height - self.bounds.height).max(0.0),
        )
    }

    /// Indices whose item frame intersects `viewport` (content coordinates).
    pub fn visible_range(&self, viewport: Rect) -> Range<usize> {
        if viewport.is_empty() {
            return 0..0;
        }

        let start = self
            .item_frames
            .partition_point(|frame| frame.max_x() <= viewport.x);
        let end = self
            .item_frames
            .partition_point(|frame| frame.x < viewport.max_x());

        let range = start..end.max(start);
        let band_visible = self.item_frames[range.clone()]
            .iter()
            .any(|frame| frame.intersects(&viewport));

        if band_visible { range } else { 0..0 }
    }

    /// Item under `point` (content coordinates); group spacing and insets hit nothing.
    pub fn item_at(&self, point: Point) -> Option<usize> {
        let candidate = self
            .item_frames
            .partition_point(|frame| frame.max_x() <= point.x);

        self.item_frames
            .get(candidate)
            .filter(|frame| frame.contains(point))
            .map(|_| candidate)
    }

    /// Offset that shows item `index` at `position`, clamped to the scrollable range.
    pub fn offset_for_item(&self, index: usize, position: ScrollPosition) -> Option<ScrollOffset> {
        let frame = self.item_frame(index)?;

        let offset = match position {
            ScrollPosition::CenteredBoth => {
                let center = frame.center();
                ScrollOffset::new(
                    center.x - self.bounds.width / 2.0,
                    center.y - self.bounds.height / 2.0,
                )
            }
            ScrollPosition::Leading => ScrollOffset::new(
                self.group_frames[index].x - self.group_frames[0].x,
                0.0,
            ),
        };

        Some(offset.clamp(self.max_offset()))
    }

    /// Page width used by group paging: the stride between laid out groups.
    pub fn page_width(&self) -> f32 {
        self.group_frames
            .first()
            .map_or(self.group_size.width, |frame| frame.width)
    }

    /// Page whose leading edge is closest to `offset_x`.
    pub fn page_at(&self, offset_x: f32) -> usize {
        let width = self.page_width();
        if width <= 0.0 || self.item_count() == 0 {
            return 0;
        }
        ((offset_x / width).round().max(0.0) as usize).min(self.item_count() - 1)
    }

    /// Horizontal offset that aligns `page` with the leading inset.
    pub fn page_offset(&self, page: usize) -> f32 {
        (page as f32 * self.page_width()).clamp(0.0, self.max_offset().x)
    }
}

fn resolve_group_size(style: &GridStyle, requested: Option<ItemSize>, bounds: Size) -> Size {
    let content = crate::geometry::Rect::from_size(bounds)
        .inset(style.section_insets)
        .size();

    if let Some(size) = requested {
        match size.resolve(bounds, content) {
            // The item must keep some width next to the trailing inset
            Ok(resolved) if resolved.width > style.group_trailing_inset => return resolved,
            Ok(resolved) => tracing::warn!(
                width = resolved.width,
                inset = style.group_trailing_inset,
                "Delegate item size narrower than the group inset, using default"
            ),
            Err(e) => tracing::warn!("Delegate item size rejected, using default: {e}"),
        }
    }

    style
        .default_group_size
        .resolve(bounds, content)
        .unwrap_or(Size::new(
            GridStyle::DEFAULT_GROUP_EDGE,
            GridStyle::DEFAULT_GROUP_EDGE,
        ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dimension::Dimension;

    fn layout(count: usize, size: Option<ItemSize>, bounds: Size) -> SectionLayout {
        SectionLayout::build(&GridStyle::default(), size, count, bounds).unwrap()
    }

    #[test]
    fn test_default_group_size_without_delegate_size() {
        let layout = layout(3, None, Size::new(375.0, 200.0));
        assert_eq!(layout.group_size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn test_groups_follow_section_insets_and_trailing_inset() {
        let layout = layout(3, Some(ItemSize::absolute(100.0, 80.0)), Size::new(375.0, 200.0));

        assert_eq!(layout.group_frame(0), Some(Rect::new(16.0, 24.0, 100.0, 80.0)));
        assert_eq!(layout.group_frame(1), Some(Rect::new(116.0, 24.0, 100.0, 80.0)));

        // Item fills its group minus the 8-unit trailing inset
        assert_eq!(layout.item_frame(0), Some(Rect::new(16.0, 24.0, 92.0, 80.0)));
        assert_eq!(layout.item_frame(2), Some(Rect::new(216.0, 24.0, 92.0, 80.0)));

        // leading 16 + 3 groups + trailing 0, top 24 + group + bottom 10
        assert_eq!(layout.section_size(), Size::new(316.0, 114.0));
    }

    #[test]
    fn test_fractional_group_size() {
        let size = ItemSize::new(
            Dimension::FractionalContainer(0.8),
            Dimension::FractionalContent(1.0),
        );
        let layout = layout(2, Some(size), Size::new(400.0, 234.0));
        // 234 - 24 - 10
        assert_eq!(layout.group_size(), Size::new(320.0, 200.0));
    }

    #[test]
    fn test_unresolvable_size_falls_back_to_default() {
        let size = ItemSize::new(Dimension::FractionalContainer(0.5), Dimension::Absolute(40.0));
        let layout = layout(1, Some(size), Size::ZERO);
        assert_eq!(layout.group_size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn test_group_narrower_than_inset_falls_back_to_default() {
        let narrow = layout(3, Some(ItemSize::absolute(6.0, 40.0)), Size::new(40.0, 200.0));
        assert_eq!(narrow.group_size(), Size::new(50.0, 50.0));
        assert_eq!(narrow.item_frame(0).unwrap().width, 42.0);
        assert_eq!(narrow.page_width(), narrow.group_frame(1).unwrap().x - 16.0);

        // Exactly the inset leaves nothing for the item either
        let flush = layout(3, Some(ItemSize::absolute(8.0, 40.0)), Size::new(40.0, 200.0));
        assert_eq!(flush.group_size(), Size::new(50.0, 50.0));
    }

    #[test]
    fn test_visible_range_is_virtualized() {
        let layout = layout(100, Some(ItemSize::absolute(100.0, 80.0)), Size::new(250.0, 200.0));

        let viewport = Rect::new(0.0, 0.0, 250.0, 200.0);
        assert_eq!(layout.visible_range(viewport), 0..3);

        let scrolled = Rect::new(1000.0, 0.0, 250.0, 200.0);
        // Item 9 spans 916..1008, item 12 starts at 1216
        assert_eq!(layout.visible_range(scrolled), 9..13);
    }

    #[test]
    fn test_visible_range_needs_vertical_overlap() {
        let layout = layout(5, Some(ItemSize::absolute(100.0, 80.0)), Size::new(250.0, 200.0));
        assert_eq!(layout.visible_range(Rect::new(0.0, 120.0, 250.0, 50.0)), 0..0);
        assert_eq!(layout.visible_range(Rect::ZERO), 0..0);
    }

    #[test]
    fn test_item_at_skips_spacing() {
        let layout = layout(3, Some(ItemSize::absolute(100.0, 80.0)), Size::new(375.0, 200.0));
        assert_eq!(layout.item_at(Point::new(20.0, 30.0)), Some(0));
        assert_eq!(layout.item_at(Point::new(120.0, 30.0)), Some(1));
        // Trailing inset of group 0
        assert_eq!(layout.item_at(Point::new(110.0, 30.0)), None);
        // Leading and top section insets
        assert_eq!(layout.item_at(Point::new(5.0, 30.0)), None);
        assert_eq!(layout.item_at(Point::new(20.0, 5.0)), None);
        // Past the last item
        assert_eq!(layout.item_at(Point::new(400.0, 30.0)), None);
    }

    #[test]
    fn test_centered_offset_is_clamped() {
        let layout = layout(10, Some(ItemSize::absolute(100.0, 80.0)), Size::new(250.0, 100.0));

        // Item 5: x 516..608, center 562 -> 562 - 125
        let offset = layout.offset_for_item(5, ScrollPosition::CenteredBoth).unwrap();
        assert_eq!(offset.x, 437.0);
        // Center y 64 - 50 = 14, section height 114 - 100 = 14 max
        assert_eq!(offset.y, 14.0);

        let first = layout.offset_for_item(0, ScrollPosition::CenteredBoth).unwrap();
        assert_eq!(first.x, 0.0);

        let last = layout.offset_for_item(9, ScrollPosition::CenteredBoth).unwrap();
        assert_eq!(last.x, layout.max_offset().x);

        assert!(layout.offset_for_item(10, ScrollPosition::CenteredBoth).is_none());
    }

    #[test]
    fn test_pages() {
        let layout = layout(10, Some(ItemSize::absolute(100.0, 80.0)), Size::new(250.0, 200.0));
        assert_eq!(layout.page_width(), 100.0);
        assert_eq!(layout.page_at(0.0), 0);
        assert_eq!(layout.page_at(149.0), 1);
        assert_eq!(layout.page_at(5000.0), 9);
        assert_eq!(layout.page_offset(3), 300.0);
        // max offset: 1016 - 250
        assert_eq!(layout.page_offset(9), 766.0);
    }

    #[test]
    fn test_empty_section() {
        let layout = layout(0, None, Size::new(300.0, 200.0));
        assert_eq!(layout.item_count(), 0);
        assert_eq!(layout.visible_range(Rect::new(0.0, 0.0, 300.0, 200.0)), 0..0);
        assert_eq!(layout.item_at(Point::new(20.0, 30.0)), None);
        assert_eq!(layout.section_size().height, 84.0);
    }
}
