//! Toolkit-independent model of the photostrip image grid.
//!
//! An [`ImageGrid`] shows a single section of image cells that scrolls orthogonally to the
//! grid and pages group by group. Its content comes from a [`GridDelegate`] owned elsewhere.

pub mod cell;
pub mod deferred;
pub mod delegate;
pub mod dimension;
pub mod geometry;
pub mod grid;
pub mod image;
pub mod layout;
pub mod reuse;
pub mod scroll;
pub mod style;

pub use cell::{GridCell, ImageCell};
pub use delegate::{GridDelegate, downgrade};
pub use dimension::{Dimension, ItemSize};
pub use geometry::{Insets, Point, Rect, Size};
pub use grid::{GridState, ImageGrid, SECTION_COUNT};
pub use crate::image::{GridImage, ImageProcessingError, ImageResult};
pub use layout::{LayoutError, LayoutResult, SectionLayout};
pub use reuse::{DequeueError, ReusePool};
pub use scroll::{ScrollOffset, ScrollPosition};
pub use style::{GridStyle, ScrollBehavior};
