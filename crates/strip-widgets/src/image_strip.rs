//! ImageStrip - draws an `ImageGrid` and turns pointer input into messages
//!
//! The grid model stays with the application: the widget only reads it while drawing and
//! publishes what the user did. Cell rasters are cached per image and size in the widget
//! tree so unchanged cells are not uploaded again every frame.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use cosmic::{
    Element, Renderer,
    iced::{
        Color, Length, Point, Rectangle, Size,
        advanced::{
            Clipboard, Layout, Shell, Widget,
            image::Renderer as ImageRenderer,
            layout::{Limits, Node},
            overlay,
            renderer::{self as iced_renderer, Quad, Renderer as QuadRenderer},
            widget::{Operation, Tree, tree},
        },
        event::{Event, Status},
        mouse::{self, Button, Cursor},
    },
    widget::image::Handle,
};
use strip_core::{GridCell, ImageGrid};

use crate::gesture::{Drag, GestureEnd, wheel_delta};

const CELL_BACKGROUND: Color = Color::from_rgba(0.5, 0.5, 0.5, 0.15);
const CELL_HOVER: Color = Color::from_rgba(1.0, 1.0, 1.0, 0.1);
const PLACEHOLDER: Color = Color::from_rgba(0.5, 0.5, 0.5, 0.3);

/// (image id, width, height, corner radius bits)
type RasterKey = (u64, u32, u32, u32);

#[derive(Default)]
struct State {
    rasters: RefCell<HashMap<RasterKey, Handle>>,
    drag: Option<Drag>,
}

impl State {
    fn raster(&self, cell: &GridCell, width: u32, height: u32) -> Option<(RasterKey, Handle)> {
        let cell = cell.as_image()?;
        let image = cell.image()?;
        let key = (image.id(), width, height, cell.corner_radius().to_bits());

        if let Some(handle) = self.rasters.borrow().get(&key) {
            return Some((key, handle.clone()));
        }

        match cell.render(width, height) {
            Ok(raster) => {
                let handle = Handle::from_rgba(width, height, raster.into_raw());
                self.rasters.borrow_mut().insert(key, handle.clone());
                Some((key, handle))
            }
            Err(e) => {
                tracing::warn!(image = image.id(), "Failed to rasterize cell: {e}");
                None
            }
        }
    }
}

pub struct ImageStrip<'a, M> {
    grid: &'a ImageGrid,
    width: Length,
    height: Length,
    on_tap: Option<Box<dyn Fn(strip_core::Point) -> M + 'a>>,
    on_scroll: Option<Box<dyn Fn(f32, f32) -> M + 'a>>,
    on_scroll_end: Option<Box<dyn Fn(f32) -> M + 'a>>,
    on_wheel: Option<Box<dyn Fn(f32) -> M + 'a>>,
    on_bounds: Option<Box<dyn Fn(strip_core::Rect) -> M + 'a>>,
}

impl<'a, M: Clone + 'static> ImageStrip<'a, M> {
    pub fn new(grid: &'a ImageGrid) -> Self {
        Self {
            grid,
            width: Length::Fill,
            height: Length::Fill,
            on_tap: None,
            on_scroll: None,
            on_scroll_end: None,
            on_wheel: None,
            on_bounds: None,
        }
    }

    pub fn width(mut self, width: impl Into<Length>) -> Self {
        self.width = width.into();
        self
    }

    pub fn height(mut self, height: impl Into<Length>) -> Self {
        self.height = height.into();
        self
    }

    /// Callback for a tap, with the point in grid viewport coordinates
    pub fn on_tap<F>(mut self, f: F) -> Self
    where
        F: Fn(strip_core::Point) -> M + 'a,
    {
        self.on_tap = Some(Box::new(f));
        self
    }

    /// Callback for drag deltas, in content units
    pub fn on_scroll<F>(mut self, f: F) -> Self
    where
        F: Fn(f32, f32) -> M + 'a,
    {
        self.on_scroll = Some(Box::new(f));
        self
    }

    /// Callback when a drag is released, with the horizontal velocity
    pub fn on_scroll_end<F>(mut self, f: F) -> Self
    where
        F: Fn(f32) -> M + 'a,
    {
        self.on_scroll_end = Some(Box::new(f));
        self
    }

    /// Callback for wheel scrolling, as a horizontal content delta.
    ///
    /// Wheels have no release, so the host decides when the gesture is over.
    pub fn on_wheel<F>(mut self, f: F) -> Self
    where
        F: Fn(f32) -> M + 'a,
    {
        self.on_wheel = Some(Box::new(f));
        self
    }

    /// Callback when the widget's bounds differ from the grid's
    pub fn on_bounds<F>(mut self, f: F) -> Self
    where
        F: Fn(strip_core::Rect) -> M + 'a,
    {
        self.on_bounds = Some(Box::new(f));
        self
    }

    fn local_point(position: Point, bounds: Rectangle) -> strip_core::Point {
        strip_core::Point::new(position.x - bounds.x, position.y - bounds.y)
    }

    fn item_at_position(&self, position: Point, bounds: Rectangle) -> Option<usize> {
        if !bounds.contains(position) {
            return None;
        }
        self.grid.item_at(Self::local_point(position, bounds))
    }
}

/// Constructor function
pub fn image_strip<M: Clone + 'static>(grid: &ImageGrid) -> ImageStrip<'_, M> {
    ImageStrip::new(grid)
}

fn to_rect(bounds: Rectangle) -> strip_core::Rect {
    strip_core::Rect::new(bounds.x, bounds.y, bounds.width, bounds.height)
}

impl<'a, M: Clone + 'static> Widget<M, cosmic::Theme, Renderer> for ImageStrip<'a, M> {
    fn tag(&self) -> tree::Tag {
        tree::Tag::of::<State>()
    }

    fn state(&self) -> tree::State {
        tree::State::new(State::default())
    }

    fn children(&self) -> Vec<Tree> {
        Vec::new()
    }

    fn diff(&mut self, _tree: &mut Tree) {}

    fn size(&self) -> Size<Length> {
        Size::new(self.width, self.height)
    }

    fn layout(&self, _tree: &mut Tree, _renderer: &Renderer, limits: &Limits) -> Node {
        let limits = limits.width(self.width).height(self.height);
        let content = self.grid.content_size();

        Node::new(limits.resolve(
            self.width,
            self.height,
            Size::new(content.width, content.height),
        ))
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        _theme: &cosmic::Theme,
        _style: &iced_renderer::Style,
        layout: Layout<'_>,
        cursor: Cursor,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_ref::<State>();
        let bounds = layout.bounds();
        let radius = self.grid.style().corner_radius;

        let hovered_index = match state.drag {
            Some(drag) if drag.moved() => None,
            _ => cursor
                .position()
                .and_then(|pos| self.item_at_position(pos, bounds)),
        };

        let mut used = HashSet::new();

        renderer.with_layer(bounds, |renderer| {
            for (index, cell, frame) in self.grid.visible_cells() {
                let cell_bounds = Rectangle::new(
                    Point::new(bounds.x + frame.x, bounds.y + frame.y),
                    Size::new(frame.width, frame.height),
                );

                let background = if hovered_index == Some(index) {
                    CELL_HOVER
                } else {
                    CELL_BACKGROUND
                };

                renderer.fill_quad(
                    Quad {
                        bounds: cell_bounds,
                        border: cosmic::iced::Border {
                            radius: radius.into(),
                            width: 0.0,
                            color: Color::TRANSPARENT,
                        },
                        shadow: Default::default(),
                    },
                    background,
                );

                if cell.is_placeholder() {
                    let inset = cell_bounds.width.min(cell_bounds.height) / 4.0;
                    renderer.fill_quad(
                        Quad {
                            bounds: cell_bounds.shrink(inset),
                            border: cosmic::iced::Border::default(),
                            shadow: Default::default(),
                        },
                        PLACEHOLDER,
                    );
                    continue;
                }

                let width = frame.width.round() as u32;
                let height = frame.height.round() as u32;
                if width == 0 || height == 0 {
                    continue;
                }

                if let Some((key, handle)) = state.raster(cell, width, height) {
                    used.insert(key);
                    renderer.draw_image(
                        handle.into(),
                        cosmic::iced::widget::image::FilterMethod::Linear,
                        cell_bounds,
                        cosmic::iced::Radians(0.0),
                        1.0,
                        [radius; 4],
                    );
                }
            }
        });

        // Only keep rasters of cells still on screen
        state.rasters.borrow_mut().retain(|key, _| used.contains(key));
    }

    fn on_event(
        &mut self,
        tree: &mut Tree,
        event: Event,
        layout: Layout<'_>,
        cursor: Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, M>,
        _viewport: &Rectangle,
    ) -> Status {
        let state = tree.state.downcast_mut::<State>();
        let bounds = layout.bounds();

        // Keep the grid placed where the widget was laid out
        if let Some(ref on_bounds) = self.on_bounds {
            let current = to_rect(bounds);
            if current != self.grid.bounds() {
                shell.publish(on_bounds(current));
            }
        }

        match event {
            Event::Mouse(mouse::Event::ButtonPressed(Button::Left)) => {
                if let Some(position) = cursor.position()
                    && bounds.contains(position)
                {
                    state.drag = Some(Drag::begin(position, Instant::now()));
                    return Status::Captured;
                }
            }

            Event::Mouse(mouse::Event::CursorMoved { position }) => {
                if let Some(drag) = state.drag.as_mut() {
                    if let Some((dx, dy)) = drag.move_to(position, Instant::now())
                        && let Some(ref on_scroll) = self.on_scroll
                    {
                        shell.publish(on_scroll(dx, dy));
                    }
                    return Status::Captured;
                }
            }

            Event::Mouse(mouse::Event::ButtonReleased(Button::Left)) => {
                if let Some(drag) = state.drag.take() {
                    let position = cursor.position().unwrap_or(bounds.center());
                    match drag.finish(position, Instant::now()) {
                        GestureEnd::Tap(at) => {
                            if bounds.contains(at)
                                && let Some(ref on_tap) = self.on_tap
                            {
                                shell.publish(on_tap(Self::local_point(at, bounds)));
                            }
                        }
                        GestureEnd::Fling { velocity_x } => {
                            if let Some(ref on_scroll_end) = self.on_scroll_end {
                                shell.publish(on_scroll_end(velocity_x));
                            }
                        }
                    }
                    return Status::Captured;
                }
            }

            Event::Mouse(mouse::Event::WheelScrolled { delta }) => {
                if cursor.is_over(bounds) {
                    let dx = wheel_delta(delta);
                    if dx != 0.0
                        && let Some(ref on_wheel) = self.on_wheel
                    {
                        shell.publish(on_wheel(dx));
                        return Status::Captured;
                    }
                }
            }

            _ => {}
        }

        Status::Ignored
    }

    fn mouse_interaction(
        &self,
        tree: &Tree,
        layout: Layout<'_>,
        cursor: Cursor,
        _viewport: &Rectangle,
        _renderer: &Renderer,
    ) -> mouse::Interaction {
        let state = tree.state.downcast_ref::<State>();
        if state.drag.is_some_and(|drag| drag.moved()) {
            return mouse::Interaction::Grabbing;
        }

        let bounds = layout.bounds();
        if let Some(position) = cursor.position()
            && self.item_at_position(position, bounds).is_some()
        {
            return mouse::Interaction::Pointer;
        }

        mouse::Interaction::default()
    }

    fn operate(
        &self,
        _tree: &mut Tree,
        _layout: Layout<'_>,
        _renderer: &Renderer,
        _operation: &mut dyn Operation,
    ) {
    }

    fn overlay<'b>(
        &'b mut self,
        _tree: &'b mut Tree,
        _layout: Layout<'_>,
        _renderer: &Renderer,
        _translation: cosmic::iced::Vector,
    ) -> Option<overlay::Element<'b, M, cosmic::Theme, Renderer>> {
        None
    }
}

impl<'a, M: Clone + 'static> From<ImageStrip<'a, M>> for Element<'a, M> {
    fn from(strip: ImageStrip<'a, M>) -> Self {
        Element::new(strip)
    }
}
