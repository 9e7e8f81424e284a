pub mod gesture;
pub mod image_strip;

pub use image_strip::{ImageStrip, image_strip};
