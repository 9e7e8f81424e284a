//! The data and event contract between the grid and its owner.

use std::rc::{Rc, Weak};

use crate::dimension::ItemSize;
use crate::image::GridImage;

/// Supplies the grid's content and receives its selection events.
///
/// Every method is called on the UI thread. The grid never keeps the delegate alive: it
/// holds a [`Weak`] reference, so an owner that also owns the grid does not form a cycle.
pub trait GridDelegate {
    /// The item at `index` was tapped.
    fn did_select_model(&self, index: usize);

    /// Queried on every reload.
    fn number_of_items(&self) -> usize;

    /// Queried every time the layout is built.
    fn size_for_item(&self) -> ItemSize;

    /// Queried for every cell that becomes visible; `None` renders a blank cell.
    fn image_for_item(&self, index: usize) -> Option<GridImage>;
}

/// Non-owning delegate handle as expected by [`ImageGrid::configure`](crate::ImageGrid::configure).
pub fn downgrade<D: GridDelegate + 'static>(delegate: &Rc<D>) -> Weak<dyn GridDelegate> {
    let weak: Weak<D> = Rc::downgrade(delegate);
    weak
}
