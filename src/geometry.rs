use serde::{Deserialize, Serialize};

use crate::layout::Orientation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self { Point { x, y } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self { Size { width, height } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn zero() -> Self { Rect::default() }

    pub fn min_x(&self) -> f64 { self.origin.x }

    pub fn min_y(&self) -> f64 { self.origin.y }

    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x < self.max_x() && p.y >= self.min_y() && p.y < self.max_y()
    }

    /// Extent along the given axis.
    pub fn extent(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.size.width,
            Orientation::Vertical => self.size.height,
        }
    }

    /// Extent across the given axis.
    pub fn cross_extent(&self, orientation: Orientation) -> f64 {
        self.extent(orientation.perpendicular())
    }

    /// The shorter of width and height. Drop-zone edge bands scale with this.
    pub fn shorter_side(&self) -> f64 { self.size.width.min(self.size.height) }

    /// Slice of this rect starting `offset` into the axis, `len` long.
    pub fn segment(&self, orientation: Orientation, offset: f64, len: f64) -> Rect {
        match orientation {
            Orientation::Horizontal => {
                Rect::new(self.origin.x + offset, self.origin.y, len, self.size.height)
            }
            Orientation::Vertical => {
                Rect::new(self.origin.x, self.origin.y + offset, self.size.width, len)
            }
        }
    }
}
