//! Size descriptors handed out by the delegate.

use serde::{Deserialize, Serialize};

use crate::geometry::Size;
use crate::layout::{LayoutError, LayoutResult};

/// One axis of an [`ItemSize`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Dimension {
    /// Fraction of the grid's visible bounds on the same axis.
    FractionalContainer(f32),
    /// Fraction of the section content area (bounds minus section insets) on the same axis.
    FractionalContent(f32),
    /// Logical units.
    Absolute(f32),
}

impl Dimension {
    pub fn resolve(self, container: f32, content: f32) -> f32 {
        match self {
            Dimension::FractionalContainer(fraction) => container * fraction,
            Dimension::FractionalContent(fraction) => content * fraction,
            Dimension::Absolute(value) => value,
        }
    }
}

/// Width and height of a layout group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemSize {
    pub width: Dimension,
    pub height: Dimension,
}

impl ItemSize {
    pub fn new(width: Dimension, height: Dimension) -> Self {
        Self { width, height }
    }

    pub fn absolute(width: f32, height: f32) -> Self {
        Self::new(Dimension::Absolute(width), Dimension::Absolute(height))
    }

    /// Resolve against the grid bounds and the section content area.
    ///
    /// Fails when either side comes out non-positive or non-finite, which would make the
    /// group impossible to page through.
    pub fn resolve(&self, container: Size, content: Size) -> LayoutResult<Size> {
        let width = self.width.resolve(container.width, content.width);
        let height = self.height.resolve(container.height, content.height);

        if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
            return Err(LayoutError::NonPositiveSize { width, height });
        }

        Ok(Size::new(width, height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_ignores_container() {
        let size = ItemSize::absolute(120.0, 80.0);
        let resolved = size.resolve(Size::ZERO, Size::ZERO).unwrap();
        assert_eq!(resolved, Size::new(120.0, 80.0));
    }

    #[test]
    fn test_fractions_use_their_reference() {
        let size = ItemSize::new(
            Dimension::FractionalContainer(0.5),
            Dimension::FractionalContent(1.0),
        );
        let resolved = size
            .resolve(Size::new(400.0, 300.0), Size::new(384.0, 266.0))
            .unwrap();
        assert_eq!(resolved.width, 200.0);
        assert_eq!(resolved.height, 266.0);
    }

    #[test]
    fn test_unresolvable_sizes_are_rejected() {
        let size = ItemSize::new(
            Dimension::FractionalContainer(0.8),
            Dimension::Absolute(100.0),
        );
        // Zero-width container gives a zero-width group
        assert!(size.resolve(Size::ZERO, Size::ZERO).is_err());

        let negative = ItemSize::absolute(-10.0, 10.0);
        assert!(negative.resolve(Size::ZERO, Size::ZERO).is_err());
    }
}
