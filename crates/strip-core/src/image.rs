use fast_image_resize::images::Image;
use fast_image_resize::{PixelType, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageProcessingError {
    #[error("Failed to load image: {0}")]
    LoadError(#[from] image::ImageError),

    #[error("Failed to resize image: {0}")]
    ResizeError(String),

    #[error("Invalid image dimensions")]
    InvalidDimensions,
}

pub type ImageResult<T> = Result<T, ImageProcessingError>;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Decoded image handed to the grid by its delegate.
///
/// Cloning is cheap; every distinct image gets its own id so renderers can cache whatever
/// they derive from it.
#[derive(Clone)]
pub struct GridImage {
    id: u64,
    pixels: Arc<RgbaImage>,
}

impl GridImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            pixels: Arc::new(pixels),
        }
    }

    pub fn from_dynamic(image: &DynamicImage) -> Self {
        Self::new(image.to_rgba8())
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl PartialEq for GridImage {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Debug for GridImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridImage")
            .field("id", &self.id)
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

/// Source region kept by an aspect-fill: the largest centered region with the destination's
/// aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropRegion {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CropRegion {
    pub fn aspect_fill(src_width: u32, src_height: u32, dst_width: u32, dst_height: u32) -> Self {
        let (src_w, src_h) = (src_width as f64, src_height as f64);
        let (dst_w, dst_h) = (dst_width as f64, dst_height as f64);

        if src_w <= 0.0 || src_h <= 0.0 || dst_w <= 0.0 || dst_h <= 0.0 {
            return Self {
                left: 0.0,
                top: 0.0,
                width: src_w,
                height: src_h,
            };
        }

        let scale = (dst_w / src_w).max(dst_h / src_h);
        let width = dst_w / scale;
        let height = dst_h / scale;

        Self {
            left: (src_w - width) / 2.0,
            top: (src_h - height) / 2.0,
            width,
            height,
        }
    }
}

pub fn load_image_from_path<P: AsRef<Path>>(path: P) -> ImageResult<DynamicImage> {
    let img = image::open(path)?;
    Ok(img)
}

/// Scales `image` so it covers `width`x`height`, cropping the overflow evenly on both sides.
pub fn resize_aspect_fill(image: &RgbaImage, width: u32, height: u32) -> ImageResult<RgbaImage> {
    if width == 0 || height == 0 || image.width() == 0 || image.height() == 0 {
        return Err(ImageProcessingError::InvalidDimensions);
    }

    let crop = CropRegion::aspect_fill(image.width(), image.height(), width, height);

    let src_image = Image::from_vec_u8(
        image.width(),
        image.height(),
        image.as_raw().clone(),
        PixelType::U8x4,
    )
    .map_err(|e| ImageProcessingError::ResizeError(e.to_string()))?;

    let mut dst_image = Image::new(width, height, PixelType::U8x4);

    let options = ResizeOptions::new().crop(crop.left, crop.top, crop.width, crop.height);
    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .map_err(|e| ImageProcessingError::ResizeError(e.to_string()))?;

    RgbaImage::from_raw(width, height, dst_image.into_vec())
        .ok_or(ImageProcessingError::InvalidDimensions)
}

/// Coverage mask of a rounded rectangle filling `width`x`height`.
pub fn rounded_mask(width: u32, height: u32, radius: u32) -> GrayImage {
    let radius = radius.min(width / 2).min(height / 2);
    if radius == 0 {
        return GrayImage::from_pixel(width, height, Luma([255]));
    }

    let mut mask = GrayImage::new(width, height);
    let opaque = Luma([255u8]);
    let r = radius as i32;
    let (w, h) = (width as i32, height as i32);

    if width > 2 * radius {
        draw_filled_rect_mut(
            &mut mask,
            imageproc::rect::Rect::at(r, 0).of_size(width - 2 * radius, height),
            opaque,
        );
    }
    if height > 2 * radius {
        draw_filled_rect_mut(
            &mut mask,
            imageproc::rect::Rect::at(0, r).of_size(width, height - 2 * radius),
            opaque,
        );
    }

    for center in [(r, r), (w - 1 - r, r), (r, h - 1 - r), (w - 1 - r, h - 1 - r)] {
        draw_filled_circle_mut(&mut mask, center, r, opaque);
    }

    mask
}

/// Makes everything outside the rounded corners transparent.
pub fn clip_rounded_corners(image: &mut RgbaImage, radius: f32) {
    if radius <= 0.0 {
        return;
    }

    let mask = rounded_mask(image.width(), image.height(), radius.round() as u32);
    for (pixel, coverage) in image.pixels_mut().zip(mask.pixels()) {
        let alpha = pixel.0[3] as u16 * coverage.0[0] as u16 / 255;
        pixel.0[3] = alpha as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_crop_region_landscape_into_square() {
        let crop = CropRegion::aspect_fill(400, 200, 100, 100);
        assert_eq!(crop.width, 200.0);
        assert_eq!(crop.height, 200.0);
        assert_eq!(crop.left, 100.0);
        assert_eq!(crop.top, 0.0);
    }

    #[test]
    fn test_crop_region_portrait_into_wide_cell() {
        let crop = CropRegion::aspect_fill(200, 400, 200, 100);
        assert_eq!(crop.width, 200.0);
        assert_eq!(crop.height, 100.0);
        assert_eq!(crop.left, 0.0);
        assert_eq!(crop.top, 150.0);
    }

    #[test]
    fn test_resize_aspect_fill_covers_destination() {
        // Left half red, right half blue; a square crop keeps the middle
        let mut source = RgbaImage::from_pixel(40, 10, Rgba([255, 0, 0, 255]));
        for x in 20..40 {
            for y in 0..10 {
                source.put_pixel(x, y, Rgba([0, 0, 255, 255]));
            }
        }

        let filled = resize_aspect_fill(&source, 20, 20).unwrap();
        assert_eq!(filled.dimensions(), (20, 20));
        let left = filled.get_pixel(1, 10).0;
        let right = filled.get_pixel(18, 10).0;
        assert!(left[0] > 200 && left[2] < 50, "left stays red: {left:?}");
        assert!(right[2] > 200 && right[0] < 50, "right stays blue: {right:?}");
    }

    #[test]
    fn test_resize_rejects_empty_destination() {
        let source = RgbaImage::new(4, 4);
        assert!(matches!(
            resize_aspect_fill(&source, 0, 10),
            Err(ImageProcessingError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_rounded_mask_corners() {
        let mask = rounded_mask(64, 64, 16);
        assert_eq!(mask.get_pixel(0, 0).0[0], 0);
        assert_eq!(mask.get_pixel(63, 63).0[0], 0);
        assert_eq!(mask.get_pixel(32, 32).0[0], 255);
        assert_eq!(mask.get_pixel(0, 32).0[0], 255);
        assert_eq!(mask.get_pixel(32, 0).0[0], 255);
    }

    #[test]
    fn test_clip_rounded_corners_keeps_center() {
        let mut image = RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255]));
        clip_rounded_corners(&mut image, 16.0);
        assert_eq!(image.get_pixel(0, 0).0[3], 0);
        assert_eq!(image.get_pixel(32, 32).0, [10, 20, 30, 255]);
    }

    #[test]
    fn test_grid_images_have_distinct_ids() {
        let a = GridImage::new(RgbaImage::new(2, 2));
        let b = GridImage::new(RgbaImage::new(2, 2));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone(), a);
        assert_eq!(a.width(), 2);
    }
}
