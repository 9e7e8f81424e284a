//! Cell recycling keyed by reuse identifier.

use std::collections::HashMap;
use thiserror::Error;

use crate::cell::{GridCell, ImageCell};

pub type CellFactory = fn() -> GridCell;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DequeueError {
    #[error("No cell registered for reuse identifier {0:?}")]
    Unregistered(String),

    #[error("Cell dequeued for {0:?} is not an image cell")]
    TypeMismatch(String),
}

pub fn image_cell_factory() -> GridCell {
    GridCell::Image(ImageCell::new())
}

/// Idle cells waiting to be handed out again, per reuse identifier.
#[derive(Debug, Default)]
pub struct ReusePool {
    factories: HashMap<&'static str, CellFactory>,
    idle: HashMap<&'static str, Vec<GridCell>>,
    created: usize,
}

impl ReusePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the factory for `identifier`, discarding its idle cells.
    pub fn register(&mut self, identifier: &'static str, factory: CellFactory) {
        self.factories.insert(identifier, factory);
        self.idle.remove(identifier);
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.factories.contains_key(identifier)
    }

    /// An idle cell for `identifier`, or a fresh one from its factory.
    pub fn dequeue(&mut self, identifier: &str) -> Result<GridCell, DequeueError> {
        if let Some(cell) = self.idle.get_mut(identifier).and_then(Vec::pop) {
            return Ok(cell);
        }

        let factory = self
            .factories
            .get(identifier)
            .ok_or_else(|| DequeueError::Unregistered(identifier.to_string()))?;

        self.created += 1;
        Ok(factory())
    }

    pub fn dequeue_image_cell(&mut self, identifier: &str) -> Result<ImageCell, DequeueError> {
        match self.dequeue(identifier)? {
            GridCell::Image(cell) => Ok(cell),
            GridCell::Placeholder => Err(DequeueError::TypeMismatch(identifier.to_string())),
        }
    }

    /// Returns `cell` to the pool after clearing its content. Placeholders are dropped.
    pub fn enqueue(&mut self, identifier: &'static str, cell: GridCell) {
        match cell {
            GridCell::Image(mut cell) => {
                cell.prepare_for_reuse();
                self.idle
                    .entry(identifier)
                    .or_default()
                    .push(GridCell::Image(cell));
            }
            GridCell::Placeholder => {}
        }
    }

    pub fn idle_count(&self, identifier: &str) -> usize {
        self.idle.get(identifier).map_or(0, Vec::len)
    }

    /// Cells built by factories so far.
    pub fn created_count(&self) -> usize {
        self.created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::GridImage;
    use image::RgbaImage;

    #[test]
    fn test_unregistered_identifier() {
        let mut pool = ReusePool::new();
        assert_eq!(
            pool.dequeue("missing").unwrap_err(),
            DequeueError::Unregistered("missing".to_string())
        );
    }

    #[test]
    fn test_dequeue_reuses_idle_cells() {
        let mut pool = ReusePool::new();
        pool.register(ImageCell::REUSE_IDENTIFIER, image_cell_factory);

        let cell = pool.dequeue(ImageCell::REUSE_IDENTIFIER).unwrap();
        assert_eq!(pool.created_count(), 1);

        pool.enqueue(ImageCell::REUSE_IDENTIFIER, cell);
        assert_eq!(pool.idle_count(ImageCell::REUSE_IDENTIFIER), 1);

        let _again = pool.dequeue(ImageCell::REUSE_IDENTIFIER).unwrap();
        assert_eq!(pool.created_count(), 1);
        assert_eq!(pool.idle_count(ImageCell::REUSE_IDENTIFIER), 0);
    }

    #[test]
    fn test_enqueue_clears_image() {
        let mut pool = ReusePool::new();
        pool.register(ImageCell::REUSE_IDENTIFIER, image_cell_factory);

        let mut cell = pool.dequeue_image_cell(ImageCell::REUSE_IDENTIFIER).unwrap();
        cell.set_image(Some(GridImage::new(RgbaImage::new(4, 4))));
        pool.enqueue(ImageCell::REUSE_IDENTIFIER, GridCell::Image(cell));

        let reused = pool.dequeue_image_cell(ImageCell::REUSE_IDENTIFIER).unwrap();
        assert!(reused.image().is_none());
    }

    #[test]
    fn test_type_mismatch() {
        let mut pool = ReusePool::new();
        pool.register(ImageCell::REUSE_IDENTIFIER, || GridCell::Placeholder);

        assert_eq!(
            pool.dequeue_image_cell(ImageCell::REUSE_IDENTIFIER).unwrap_err(),
            DequeueError::TypeMismatch(ImageCell::REUSE_IDENTIFIER.to_string())
        );
    }

    #[test]
    fn test_register_discards_idle_cells() {
        let mut pool = ReusePool::new();
        pool.register(ImageCell::REUSE_IDENTIFIER, image_cell_factory);
        pool.enqueue(ImageCell::REUSE_IDENTIFIER, image_cell_factory());
        assert_eq!(pool.idle_count(ImageCell::REUSE_IDENTIFIER), 1);

        pool.register(ImageCell::REUSE_IDENTIFIER, image_cell_factory);
        assert_eq!(pool.idle_count(ImageCell::REUSE_IDENTIFIER), 0);
    }
}
