//! Plain geometry types shared by the layout engine and the renderer seam.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Self { x, y } }
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self { Self { width, height } }

    /// Rounds each dimension up to the next whole unit.
    pub fn ceil(self) -> Self { Self::new(self.width.ceil(), self.height.ceil()) }
}

impl Rect {
    pub const fn new(origin: Point, size: Size) -> Self { Self { origin, size } }

    pub fn from_corners(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self::new(Point::new(x1, y1), Size::new(x2 - x1, y2 - y1))
    }

    pub fn min_x(&self) -> f64 { self.origin.x }

    pub fn min_y(&self) -> f64 { self.origin.y }

    pub fn max_x(&self) -> f64 { self.origin.x + self.size.width }

    pub fn max_y(&self) -> f64 { self.origin.y + self.size.height }

    pub fn width(&self) -> f64 { self.size.width }

    pub fn height(&self) -> f64 { self.size.height }

    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.min_x() && pt.x <= self.max_x() && pt.y >= self.min_y() && pt.y <= self.max_y()
    }

    /// Shrinks the rect by `amount` on every side, never below zero size.
    pub fn inset(&self, amount: f64) -> Self {
        Self::new(
            Point::new(self.origin.x + amount, self.origin.y + amount),
            Size::new(
                (self.size.width - 2.0 * amount).max(0.0),
                (self.size.height - 2.0 * amount).max(0.0),
            ),
        )
    }

    /// A rect of `size` centered inside `self`, snapped to whole units.
    pub fn centered(&self, size: Size) -> Self {
        let x = self.origin.x + ((self.size.width - size.width) / 2.0).floor();
        let y = self.origin.y + ((self.size.height - size.height) / 2.0).floor();
        Self::new(Point::new(x, y), size)
    }
}
