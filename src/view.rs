//! The rendering boundary.
//!
//! The core never renders anything. It materializes panel content through a
//! [`ComponentFactory`] supplied by the embedding application and talks to
//! the result only through the [`PanelView`] contract.

use serde_json::{Map, Value};

pub type Params = Map<String, Value>;

/// Size constraints a view imposes on the leaf that holds it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewConstraints {
    pub minimum_width: f64,
    pub maximum_width: f64,
    pub minimum_height: f64,
    pub maximum_height: f64,
}

impl Default for ViewConstraints {
    fn default() -> Self {
        ViewConstraints {
            minimum_width: 0.0,
            maximum_width: f64::INFINITY,
            minimum_height: 0.0,
            maximum_height: f64::INFINITY,
        }
    }
}

impl ViewConstraints {
    /// Axis projection: (minimum, maximum) along the horizontal axis.
    pub fn horizontal(&self) -> (f64, f64) { (self.minimum_width, self.maximum_width) }

    /// Axis projection: (minimum, maximum) along the vertical axis.
    pub fn vertical(&self) -> (f64, f64) { (self.minimum_height, self.maximum_height) }
}

/// Content/tab renderer handle for one panel. Opaque to the core.
pub trait PanelView {
    fn init(&mut self, _params: &Params) {}

    fn update(&mut self, _params: &Params) {}

    fn set_title(&mut self, _title: &str) {}

    fn layout(&mut self, _width: f64, _height: f64) {}

    fn constraints(&self) -> ViewConstraints { ViewConstraints::default() }

    fn dispose(&mut self) {}
}

/// Materializes panel views by component name.
pub trait ComponentFactory {
    fn create_panel(&mut self, id: &str, component: &str) -> Box<dyn PanelView>;
}

/// A view that renders nothing. Default factory output and test stand-in.
#[derive(Default)]
pub struct NullView;

impl PanelView for NullView {}

#[derive(Default)]
pub struct NullFactory;

impl ComponentFactory for NullFactory {
    fn create_panel(&mut self, _id: &str, _component: &str) -> Box<dyn PanelView> {
        Box::new(NullView)
    }
}
