//! The strip's data source: a folder of images and their decoded thumbnails.

use lru::LruCache;
use std::cell::{Cell, RefCell};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use strip_core::image::load_image_from_path;
use strip_core::{Dimension, GridDelegate, GridImage, ImageProcessingError, ItemSize};
use thiserror::Error;

/// Longest edge of a decoded thumbnail, in pixels.
pub const THUMBNAIL_EDGE: u32 = 512;

/// Decoded thumbnails kept in memory.
pub const THUMBNAIL_CAPACITY: usize = 100;

/// Images decoded ahead of the visible ones, on each side.
pub const PREFETCH: usize = 4;

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error(transparent)]
    Image(#[from] ImageProcessingError),

    #[error("Decoder task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Load {
    Waiting,
    Pending,
    Done,
    Failed,
}

#[derive(Debug)]
struct Entry {
    path: PathBuf,
    load: Load,
}

/// Owns the images shown in the strip and receives its selections.
pub struct Gallery {
    entries: RefCell<Vec<Entry>>,
    thumbnails: RefCell<LruCache<PathBuf, GridImage>>,
    item_width_fraction: Cell<f32>,
    selected: Cell<Option<usize>>,
}

impl Gallery {
    pub fn new(item_width_fraction: f32, capacity: usize) -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            thumbnails: RefCell::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            item_width_fraction: Cell::new(item_width_fraction),
            selected: Cell::new(None),
        }
    }

    /// Replaces the folder contents. Thumbnails still cached for a path are reused.
    pub fn set_paths(&self, paths: Vec<PathBuf>) {
        let entries = paths
            .into_iter()
            .map(|path| Entry {
                path,
                load: Load::Waiting,
            })
            .collect();

        *self.entries.borrow_mut() = entries;
        self.selected.set(None);
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn path(&self, index: usize) -> Option<PathBuf> {
        self.entries.borrow().get(index).map(|e| e.path.clone())
    }

    pub fn position(&self, path: &Path) -> Option<usize> {
        self.entries.borrow().iter().position(|e| e.path == path)
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected.get()
    }

    pub fn set_item_width_fraction(&self, fraction: f32) {
        self.item_width_fraction.set(fraction);
    }

    /// Claims up to `limit` images that need decoding, marking them pending.
    ///
    /// `visible` come first, then the neighbours within [`PREFETCH`]. Images further away
    /// wait until they scroll into view.
    pub fn claim_pending(&self, visible: &[usize], limit: usize) -> Vec<(usize, PathBuf)> {
        let mut entries = self.entries.borrow_mut();
        let thumbnails = self.thumbnails.borrow();
        let mut claimed = Vec::new();

        for index in load_order(visible, entries.len()) {
            if claimed.len() >= limit {
                break;
            }
            let Some(entry) = entries.get_mut(index) else {
                continue;
            };
            if entry.load != Load::Waiting {
                continue;
            }
            if thumbnails.contains(&entry.path) {
                entry.load = Load::Done;
                continue;
            }
            entry.load = Load::Pending;
            claimed.push((index, entry.path.clone()));
        }

        claimed
    }

    /// Stores a decoded image. Ignored when the folder changed in the meantime.
    pub fn set_image(&self, index: usize, path: &Path, image: GridImage) -> bool {
        let mut entries = self.entries.borrow_mut();
        match entries.get_mut(index) {
            Some(entry) if entry.path == path => {
                entry.load = Load::Done;
                self.thumbnails.borrow_mut().put(entry.path.clone(), image);
                true
            }
            _ => false,
        }
    }

    pub fn mark_failed(&self, index: usize, path: &Path) {
        if let Some(entry) = self.entries.borrow_mut().get_mut(index)
            && entry.path == path
        {
            entry.load = Load::Failed;
        }
    }

    /// Thumbnails currently being decoded.
    pub fn in_flight(&self) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.load == Load::Pending)
            .count()
    }

    pub fn cached(&self) -> usize {
        self.thumbnails.borrow().len()
    }
}

/// Visible indices, then alternating neighbours after and before them.
fn load_order(visible: &[usize], len: usize) -> Vec<usize> {
    let (Some(first), Some(last)) = (visible.iter().min(), visible.iter().max()) else {
        return (0..len.min(PREFETCH)).collect();
    };

    let mut order: Vec<usize> = visible.iter().copied().filter(|i| *i < len).collect();
    for step in 1..=PREFETCH {
        if last + step < len {
            order.push(last + step);
        }
        if let Some(before) = first.checked_sub(step) {
            order.push(before);
        }
    }
    order
}

impl GridDelegate for Gallery {
    fn did_select_model(&self, index: usize) {
        self.selected.set(Some(index));
        match self.path(index) {
            Some(path) => tracing::info!(index, path = %path.display(), "Selected image"),
            None => tracing::info!(index, "Selected image"),
        }
    }

    fn number_of_items(&self) -> usize {
        self.len()
    }

    fn size_for_item(&self) -> ItemSize {
        ItemSize::new(
            Dimension::FractionalContainer(self.item_width_fraction.get()),
            Dimension::FractionalContent(1.0),
        )
    }

    fn image_for_item(&self, index: usize) -> Option<GridImage> {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.get_mut(index)?;

        match self.thumbnails.borrow_mut().get(&entry.path) {
            Some(image) => {
                entry.load = Load::Done;
                Some(image.clone())
            }
            None => {
                if entry.load == Load::Done {
                    tracing::debug!(index, "Thumbnail evicted, queueing reload");
                    entry.load = Load::Waiting;
                }
                None
            }
        }
    }
}

/// Decodes `path` off the UI thread and shrinks it to thumbnail size.
pub async fn load_thumbnail(path: PathBuf, edge: u32) -> Result<GridImage, ThumbnailError> {
    let image = tokio::task::spawn_blocking(move || {
        let decoded = load_image_from_path(&path)?;
        Ok::<_, ImageProcessingError>(GridImage::from_dynamic(&decoded.thumbnail(edge, edge)))
    })
    .await??;

    Ok(image)
}
