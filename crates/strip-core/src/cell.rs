//! Grid cells.

use image::RgbaImage;

use crate::image::{GridImage, ImageResult, clip_rounded_corners, resize_aspect_fill};
use crate::style::GridStyle;

/// A reusable cell showing exactly one image, aspect-filled and clipped to rounded bounds.
#[derive(Debug, Clone)]
pub struct ImageCell {
    image: Option<GridImage>,
    corner_radius: f32,
    clips_to_bounds: bool,
}

impl ImageCell {
    pub const REUSE_IDENTIFIER: &'static str = "ImageCell";

    pub fn new() -> Self {
        Self {
            image: None,
            corner_radius: GridStyle::CORNER_RADIUS,
            clips_to_bounds: true,
        }
    }

    pub fn with_corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn image(&self) -> Option<&GridImage> {
        self.image.as_ref()
    }

    /// Replaces the slot; `None` shows a blank cell.
    pub fn set_image(&mut self, image: Option<GridImage>) {
        self.image = image;
    }

    pub fn prepare_for_reuse(&mut self) {
        self.image = None;
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn set_corner_radius(&mut self, radius: f32) {
        self.corner_radius = radius;
    }

    pub fn clips_to_bounds(&self) -> bool {
        self.clips_to_bounds
    }

    /// Rasterizes the cell at `width`x`height`.
    ///
    /// An empty slot yields a fully transparent raster.
    pub fn render(&self, width: u32, height: u32) -> ImageResult<RgbaImage> {
        let Some(source) = &self.image else {
            return Ok(RgbaImage::new(width, height));
        };

        let mut raster = resize_aspect_fill(source.pixels(), width, height)?;

        if self.clips_to_bounds {
            clip_rounded_corners(&mut raster, self.corner_radius);
        }

        Ok(raster)
    }
}

impl Default for ImageCell {
    fn default() -> Self {
        Self::new()
    }
}

/// What the reuse pool hands back for an index.
#[derive(Debug, Clone)]
pub enum GridCell {
    Image(ImageCell),
    /// Stand-in used when no image cell could be dequeued.
    Placeholder,
}

impl GridCell {
    pub fn reuse_identifier(&self) -> &'static str {
        match self {
            GridCell::Image(_) => ImageCell::REUSE_IDENTIFIER,
            GridCell::Placeholder => "Placeholder",
        }
    }

    pub fn as_image(&self) -> Option<&ImageCell> {
        match self {
            GridCell::Image(cell) => Some(cell),
            GridCell::Placeholder => None,
        }
    }

    pub fn image(&self) -> Option<&GridImage> {
        self.as_image().and_then(ImageCell::image)
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, GridCell::Placeholder)
    }
}
