use nalgebra::{self as na, vector};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{util::Quadrant, P2, V2};

/// Represents an axis-aligned rectangle defined by two points: the start and the end.
/// It is used as the area of every tree branch.
///
/// The y axis grows downward, so `start.y` is the top edge and `end.y` the bottom edge.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect {
    start: P2,
    center: P2,
    end: P2,
}

impl Rect {
    /// Create a new rect with a start and end point
    pub fn new(start: P2, end: P2) -> Self {
        Self {
            start,
            center: na::center(&start, &end),
            end,
        }
    }

    /// Create a rect from its four edges
    pub fn from_edges(top: f64, bottom: f64, left: f64, right: f64) -> Self {
        Self::new(na::point![left, top], na::point![right, bottom])
    }

    /// Get the start point of the rect
    pub fn start(&self) -> P2 {
        self.start
    }

    /// Get the end point of the rect
    pub fn end(&self) -> P2 {
        self.end
    }

    /// Midpoint used to classify points into quadrants
    pub fn center(&self) -> P2 {
        self.center
    }

    /// Get the top edge of the rect
    pub fn top(&self) -> f64 {
        self.start.y
    }

    /// Get the bottom edge of the rect
    pub fn bottom(&self) -> f64 {
        self.end.y
    }

    /// Get the left edge of the rect
    pub fn left(&self) -> f64 {
        self.start.x
    }

    /// Get the right edge of the rect
    pub fn right(&self) -> f64 {
        self.end.x
    }

    /// Get the horizontal extent of the rect
    pub fn width(&self) -> f64 {
        self.end.x - self.start.x
    }

    /// Get the vertical extent of the rect
    pub fn height(&self) -> f64 {
        self.end.y - self.start.y
    }

    /// Half of the extent along each axis
    pub fn half_size(&self) -> V2 {
        self.center - self.start
    }

    /// Check if a point exists within the rect
    pub fn contains(&self, point: &P2) -> bool {
        *point >= self.start && *point <= self.end
    }

    /// Move a point onto the closest position inside the rect
    pub fn clamp(&self, point: &P2) -> P2 {
        na::point![
            point.x.clamp(self.start.x, self.end.x),
            point.y.clamp(self.start.y, self.end.y)
        ]
    }

    /// Quarter the rect to produce four smaller rects, ordered like [`Quadrant::ALL`]
    pub fn quarter(&self) -> [Self; 4] {
        Quadrant::ALL.map(|q| self.quadrant_rect(q))
    }

    /// The sub-rect covered by one quadrant
    pub fn quadrant_rect(&self, quadrant: Quadrant) -> Self {
        let &Rect { start, center, end } = self;
        let diff = center - start;
        let diff_x = vector![diff.x, 0.];
        let diff_y = vector![0., diff.y];

        match quadrant {
            Quadrant::NorthWest => Rect::new(start, center),
            Quadrant::NorthEast => Rect::new(start + diff_x, center + diff_x),
            Quadrant::SouthWest => Rect::new(start + diff_y, center + diff_y),
            Quadrant::SouthEast => Rect::new(center, end),
        }
    }
}
