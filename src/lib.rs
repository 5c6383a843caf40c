//! Dockable grid layout core.
//!
//! A renderer-agnostic docking model: a grid of splits whose leaves are
//! tabbed groups of panels, plus floating and popout surfaces, drag-and-drop
//! redocking, and JSON persistence of the whole arrangement. The embedding
//! application supplies a [`ComponentFactory`] that materializes panel
//! content; everything else lives here.
//!
//! The entry point is [`DockEngine`].

pub mod common;
pub mod dnd;
pub mod dock;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod model;
pub mod view;

pub use crate::common::config::DockSettings;
pub use crate::dnd::{DragController, DropZone, PanelTransfer};
pub use crate::dock::engine::{AddPanelOptions, DockEngine, PanelPosition, RestorePolicy};
pub use crate::dock::events::DockEvent;
pub use crate::dock::serialization::SerializedDock;
pub use crate::error::{DockError, Result};
pub use crate::geometry::{Point, Rect, Size};
pub use crate::layout::{Direction, Orientation};
pub use crate::model::group::{Group, GroupLocation};
pub use crate::model::panel::{Panel, Patch};
pub use crate::view::{ComponentFactory, PanelView, Params, ViewConstraints};
