//! Drag-and-drop plumbing: the transfer payload, drop-zone hit testing, and
//! the controller that tracks one drag gesture at a time.

mod controller;
mod drop_target;
mod transfer;

pub use controller::DragController;
pub use drop_target::{DropZone, classify};
pub use transfer::{PanelTransfer, TransferSlot};
