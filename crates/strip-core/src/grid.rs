//! The grid container: binds a delegate to a paged, virtualized row of image cells.

use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::time::Instant;

use crate::cell::{GridCell, ImageCell};
use crate::deferred::{Deferred, DeferredQueue};
use crate::delegate::GridDelegate;
use crate::geometry::{Point, Rect, Size};
use crate::layout::SectionLayout;
use crate::reuse::{CellFactory, ReusePool, image_cell_factory};
use crate::scroll::{ScrollAnimation, ScrollOffset, ScrollPosition, settle_page};
use crate::style::{GridStyle, ScrollBehavior};

/// The grid always lays out exactly one section.
pub const SECTION_COUNT: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridState {
    #[default]
    Unconfigured,
    Configured,
}

#[derive(Debug, Default)]
pub struct ImageGrid {
    style: GridStyle,
    state: GridState,
    delegate: Option<Weak<dyn GridDelegate>>,
    pool: ReusePool,
    layout: SectionLayout,
    bounds: Rect,
    offset: ScrollOffset,
    animation: Option<ScrollAnimation>,
    drag_start_page: Option<usize>,
    item_count: usize,
    visible: BTreeMap<usize, GridCell>,
    deferred: DeferredQueue,
}

impl ImageGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_style(style: GridStyle) -> Self {
        Self {
            style,
            ..Self::default()
        }
    }

    /// Binds `delegate`, replacing any previous one, and performs the initial reload.
    ///
    /// With a `selected_index`, a scroll centering that item is queued for the next UI pass
    /// (see [`run_deferred`](Self::run_deferred)). Calling this again re-runs the whole setup.
    pub fn configure(
        &mut self,
        delegate: Option<Weak<dyn GridDelegate>>,
        selected_index: Option<usize>,
    ) -> &mut Self {
        self.delegate = delegate;
        self.pool
            .register(ImageCell::REUSE_IDENTIFIER, image_cell_factory);
        self.state = GridState::Configured;

        tracing::debug!(
            has_delegate = self.delegate().is_some(),
            ?selected_index,
            "Configuring image grid"
        );

        self.reload_data();

        if let Some(index) = selected_index {
            self.deferred.push(Deferred::ScrollToItem {
                index,
                position: ScrollPosition::CenteredBoth,
                animated: true,
            });
        }

        self
    }

    /// Swaps the visual constants and re-renders with them. A running animation is dropped.
    pub fn set_style(&mut self, style: GridStyle) {
        if style == self.style {
            return;
        }

        self.style = style;
        self.animation = None;
        self.reload_data();
    }

    /// Re-queries the item count and re-renders every visible cell.
    pub fn reload_data(&mut self) {
        let delegate = self.delegate();
        self.item_count = delegate.as_ref().map_or(0, |d| d.number_of_items());
        self.rebuild_layout(delegate.as_deref());

        let stale = std::mem::take(&mut self.visible);
        for (_, cell) in stale {
            self.pool.enqueue(ImageCell::REUSE_IDENTIFIER, cell);
        }

        self.offset = self.offset.clamp(self.layout.max_offset());
        self.refresh_visible(delegate.as_deref());

        tracing::debug!(
            items = self.item_count,
            visible = self.visible.len(),
            "Reloaded image grid"
        );
    }

    /// [`reload_data`](Self::reload_data), then `completion`.
    ///
    /// `completion` runs as soon as the model holds the new cells; the toolkit draws them on
    /// its next frame, which may be later.
    pub fn reload_data_with(&mut self, completion: impl FnOnce()) {
        self.reload_data();
        completion();
    }

    pub fn number_of_sections(&self) -> usize {
        SECTION_COUNT
    }

    /// Item count as of the last reload.
    pub fn number_of_items(&self) -> usize {
        self.item_count
    }

    /// A cell for `index` from the reuse pool, its image slot overwritten from the delegate.
    ///
    /// Falls back to [`GridCell::Placeholder`] when no image cell can be dequeued.
    pub fn cell_for_item(&mut self, index: usize) -> GridCell {
        let delegate = self.delegate();
        self.make_cell(index, delegate.as_deref())
    }

    /// Forwards a selection to the delegate; dropped when out of range or unbound.
    pub fn select_item(&self, index: usize) {
        if index >= self.item_count {
            tracing::debug!(index, count = self.item_count, "Ignoring out-of-range selection");
            return;
        }

        match self.delegate() {
            Some(delegate) => delegate.did_select_model(index),
            None => tracing::debug!(index, "Selection dropped, no delegate"),
        }
    }

    /// Item under `point`, in viewport coordinates.
    pub fn item_at(&self, point: Point) -> Option<usize> {
        if !Rect::from_size(self.bounds.size()).contains(point) {
            return None;
        }

        self.layout
            .item_at(Point::new(point.x + self.offset.x, point.y + self.offset.y))
            .filter(|index| *index < self.item_count)
    }

    /// Selects whatever is under `point` and returns its index.
    pub fn tap(&self, point: Point) -> Option<usize> {
        let index = self.item_at(point)?;
        self.select_item(index);
        Some(index)
    }

    /// Places the grid in its parent. Nothing renders while the bounds are empty.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if bounds == self.bounds {
            return;
        }

        self.bounds = bounds;
        let delegate = self.delegate();
        self.rebuild_layout(delegate.as_deref());
        self.offset = self.offset.clamp(self.layout.max_offset());
        if let Some(animation) = self.animation.as_mut() {
            let target = animation.target().clamp(self.layout.max_offset());
            *animation = ScrollAnimation::new(self.offset, target, self.style.scroll_animation);
        }
        self.refresh_visible(delegate.as_deref());
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Runs the work queued for the next UI pass.
    pub fn run_deferred(&mut self) {
        for task in self.deferred.take() {
            match task {
                Deferred::ScrollToItem {
                    index,
                    position,
                    animated,
                } => {
                    if self.bounds.is_empty() {
                        tracing::debug!(index, "Grid not laid out yet, skipping initial scroll");
                        continue;
                    }
                    self.scroll_to_item(index, position, animated);
                }
            }
        }
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    pub fn scroll_to_item(&mut self, index: usize, position: ScrollPosition, animated: bool) {
        if index >= self.item_count {
            tracing::warn!(
                index,
                count = self.item_count,
                "Scroll target out of range, ignoring"
            );
            return;
        }

        let Some(target) = self.layout.offset_for_item(index, position) else {
            return;
        };

        if animated && !self.style.scroll_animation.is_zero() {
            self.animation = Some(ScrollAnimation::new(
                self.offset,
                target,
                self.style.scroll_animation,
            ));
        } else {
            self.set_content_offset(target);
        }
    }

    pub fn content_offset(&self) -> ScrollOffset {
        self.offset
    }

    /// Jumps to `offset`, cancelling any running animation.
    pub fn set_content_offset(&mut self, offset: ScrollOffset) {
        self.animation = None;
        self.apply_offset(offset);
    }

    /// Scrolls by a drag or wheel delta. The first delta of a gesture remembers the page it
    /// started on for [`end_scrolling`](Self::end_scrolling).
    pub fn scroll_by(&mut self, dx: f32, dy: f32) {
        self.animation = None;
        if self.drag_start_page.is_none() {
            self.drag_start_page = Some(self.layout.page_at(self.offset.x));
        }
        self.apply_offset(ScrollOffset::new(self.offset.x + dx, self.offset.y + dy));
    }

    /// Ends a scroll gesture; with group paging the section settles on a group boundary.
    pub fn end_scrolling(&mut self, velocity_x: f32) {
        let start_page = self.drag_start_page.take();

        if self.style.scroll_behavior != ScrollBehavior::GroupPaging || self.item_count == 0 {
            return;
        }

        let start = start_page.unwrap_or_else(|| self.layout.page_at(self.offset.x));
        let page = settle_page(
            start,
            self.offset.x,
            velocity_x,
            self.layout.page_width(),
            self.item_count,
        );
        let target = ScrollOffset::new(self.layout.page_offset(page), self.offset.y);

        if self.style.scroll_animation.is_zero() {
            self.set_content_offset(target);
        } else {
            self.animation = Some(ScrollAnimation::new(
                self.offset,
                target,
                self.style.scroll_animation,
            ));
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Steps the running animation to `now`; returns whether it is still running.
    pub fn advance_animation(&mut self, now: Instant) -> bool {
        let Some(animation) = self.animation.as_mut() else {
            return false;
        };

        let (offset, done) = animation.sample(now);
        if done {
            self.animation = None;
        }
        self.apply_offset(offset);

        !done
    }

    /// Jumps straight to the end of the running animation.
    pub fn finish_animation(&mut self) {
        if let Some(animation) = self.animation.take() {
            self.apply_offset(animation.target());
        }
    }

    /// Visible cells with their frames in viewport coordinates.
    pub fn visible_cells(&self) -> impl Iterator<Item = (usize, &GridCell, Rect)> + '_ {
        self.visible.iter().filter_map(|(index, cell)| {
            let frame = self.layout.item_frame(*index)?;
            Some((
                *index,
                cell,
                frame.translate(-self.offset.x, -self.offset.y),
            ))
        })
    }

    pub fn visible_indices(&self) -> Vec<usize> {
        self.visible.keys().copied().collect()
    }

    pub fn item_frame(&self, index: usize) -> Option<Rect> {
        self.layout.item_frame(index)
    }

    pub fn content_size(&self) -> Size {
        self.layout.content_size()
    }

    pub fn layout(&self) -> &SectionLayout {
        &self.layout
    }

    pub fn style(&self) -> &GridStyle {
        &self.style
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn is_configured(&self) -> bool {
        self.state == GridState::Configured
    }

    /// Overrides the factory of a reuse identifier.
    pub fn register_cell(&mut self, identifier: &'static str, factory: CellFactory) {
        self.pool.register(identifier, factory);
    }

    pub fn pool(&self) -> &ReusePool {
        &self.pool
    }

    fn delegate(&self) -> Option<Rc<dyn GridDelegate>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    fn rebuild_layout(&mut self, delegate: Option<&dyn GridDelegate>) {
        let requested = delegate.map(|d| d.size_for_item());

        self.layout = match SectionLayout::build(
            &self.style,
            requested,
            self.item_count,
            self.bounds.size(),
        ) {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!("Failed to lay out image grid: {e}");
                SectionLayout::default()
            }
        };
    }

    fn apply_offset(&mut self, offset: ScrollOffset) {
        self.offset = offset.clamp(self.layout.max_offset());
        let delegate = self.delegate();
        self.refresh_visible(delegate.as_deref());
    }

    /// Recycles cells that left the viewport and dequeues cells for those that entered it.
    fn refresh_visible(&mut self, delegate: Option<&dyn GridDelegate>) {
        let viewport = Rect::new(
            self.offset.x,
            self.offset.y,
            self.bounds.width,
            self.bounds.height,
        );
        let range = self.layout.visible_range(viewport);
        let range = range.start.min(self.item_count)..range.end.min(self.item_count);

        let gone: Vec<usize> = self
            .visible
            .keys()
            .copied()
            .filter(|index| !range.contains(index))
            .collect();
        for index in gone {
            if let Some(cell) = self.visible.remove(&index) {
                self.pool.enqueue(ImageCell::REUSE_IDENTIFIER, cell);
            }
        }

        for index in range {
            if !self.visible.contains_key(&index) {
                let cell = self.make_cell(index, delegate);
                self.visible.insert(index, cell);
            }
        }
    }

    fn make_cell(&mut self, index: usize, delegate: Option<&dyn GridDelegate>) -> GridCell {
        match self.pool.dequeue_image_cell(ImageCell::REUSE_IDENTIFIER) {
            Ok(mut cell) => {
                cell.set_corner_radius(self.style.corner_radius);
                cell.set_image(delegate.and_then(|d| d.image_for_item(index)));
                GridCell::Image(cell)
            }
            Err(e) => {
                tracing::warn!(index, "Substituting placeholder cell: {e}");
                GridCell::Placeholder
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delegate::downgrade;
    use crate::dimension::ItemSize;
    use crate::image::GridImage;
    use image::RgbaImage;
    use std::cell::RefCell;

    struct Counter {
        count: usize,
        queried: RefCell<Vec<usize>>,
    }

    impl GridDelegate for Counter {
        fn did_select_model(&self, _index: usize) {}

        fn number_of_items(&self) -> usize {
            self.count
        }

        fn size_for_item(&self) -> ItemSize {
            ItemSize::absolute(100.0, 80.0)
        }

        fn image_for_item(&self, index: usize) -> Option<GridImage> {
            self.queried.borrow_mut().push(index);
            Some(GridImage::new(RgbaImage::new(2, 2)))
        }
    }

    fn counter(count: usize) -> Rc<Counter> {
        Rc::new(Counter {
            count,
            queried: RefCell::new(Vec::new()),
        })
    }

    #[test]
    fn test_unconfigured_grid_is_empty() {
        let mut grid = ImageGrid::new();
        grid.set_bounds(Rect::new(0.0, 0.0, 300.0, 200.0));
        assert_eq!(grid.state(), GridState::Unconfigured);
        assert_eq!(grid.number_of_items(), 0);
        assert_eq!(grid.visible_cells().count(), 0);
    }

    #[test]
    fn test_set_bounds_renders_visible_cells() {
        let owner = counter(10);
        let mut grid = ImageGrid::new();
        grid.configure(Some(downgrade(&owner)), None);
        // No bounds yet: nothing is visible
        assert!(grid.visible_indices().is_empty());

        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));
        assert_eq!(grid.visible_indices(), vec![0, 1, 2]);
        assert_eq!(*owner.queried.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_scrolling_recycles_cells() {
        let owner = counter(50);
        let mut grid = ImageGrid::with_style(
            GridStyle::default().with_scroll_behavior(ScrollBehavior::Continuous),
        );
        grid.configure(Some(downgrade(&owner)), None);
        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));
        let created = grid.pool().created_count();

        grid.scroll_by(1000.0, 0.0);
        grid.end_scrolling(0.0);

        assert_eq!(grid.visible_indices(), vec![9, 10, 11, 12]);
        // Three cells went back to the pool and came out again, one was new
        assert_eq!(grid.pool().created_count(), created + 1);
    }

    #[test]
    fn test_visible_frames_are_viewport_relative() {
        let owner = counter(10);
        let mut grid = ImageGrid::with_style(
            GridStyle::default().with_scroll_behavior(ScrollBehavior::Continuous),
        );
        grid.configure(Some(downgrade(&owner)), None);
        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));
        grid.set_content_offset(ScrollOffset::new(100.0, 0.0));

        let (index, _, frame) = grid.visible_cells().next().unwrap();
        assert_eq!(index, 0);
        assert_eq!(frame, Rect::new(-84.0, 24.0, 92.0, 80.0));
    }

    #[test]
    fn test_group_paging_settles_on_boundary() {
        let owner = counter(10);
        let mut grid = ImageGrid::with_style(
            GridStyle::default().with_scroll_animation(std::time::Duration::ZERO),
        );
        grid.configure(Some(downgrade(&owner)), None);
        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));

        grid.scroll_by(70.0, 0.0);
        grid.end_scrolling(0.0);
        assert_eq!(grid.content_offset().x, 100.0);

        grid.scroll_by(20.0, 0.0);
        grid.end_scrolling(0.0);
        assert_eq!(grid.content_offset().x, 100.0);

        grid.scroll_by(10.0, 0.0);
        grid.end_scrolling(900.0);
        assert_eq!(grid.content_offset().x, 200.0);
    }

    #[test]
    fn test_bounds_change_keeps_offset_in_range() {
        let owner = counter(10);
        let mut grid = ImageGrid::new();
        grid.configure(Some(downgrade(&owner)), None);
        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));
        grid.set_content_offset(ScrollOffset::new(700.0, 0.0));

        grid.set_bounds(Rect::new(0.0, 0.0, 600.0, 200.0));
        // 1016 - 600
        assert_eq!(grid.content_offset().x, 416.0);
    }

    #[test]
    fn test_set_style_rerenders_cells() {
        let owner = counter(4);
        let mut grid = ImageGrid::new();
        grid.configure(Some(downgrade(&owner)), None);
        grid.set_bounds(Rect::new(0.0, 0.0, 250.0, 200.0));

        grid.set_style(GridStyle::default().with_corner_radius(6.0));
        assert!(grid.visible_cells().all(|(_, cell, _)| {
            cell.as_image().map(|c| c.corner_radius()) == Some(6.0)
        }));
    }
}
