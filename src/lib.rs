//! A Barnes-Hut quadtree for approximating vertex repulsion in force-directed
//! graph layouts.
//!
//! A [`BarnesHutTree`] is rebuilt every physics frame: each vertex is inserted
//! once, after which every [`Branch`] carries the total mass and center of
//! mass of the particles beneath it. The force walk then treats distant
//! branches as single point masses.
//!
//! ```
//! use bhtree::{BarnesHutTree, Rect, TreeConfig};
//! use nalgebra::point;
//!
//! let area = Rect::new(point![0.0, 0.0], point![100.0, 100.0]);
//! let mut vertices = vec![
//!     (point![10.0, 10.0], 1.0),
//!     (point![90.0, 90.0], 1.0),
//!     (point![10.0, 90.0], 1.0),
//! ];
//!
//! let tree = BarnesHutTree::build(area, TreeConfig::default(), &mut vertices).unwrap();
//! assert_eq!(tree.root().mass(), 3.0);
//!
//! let push = tree.repulsion(point![10.0, 10.0], 1.0, 0.5, 1.0);
//! assert!(push.x < 0.0 && push.y < 0.0);
//! ```

use nalgebra::{Point2, Vector2};

mod config;
mod error;
mod force;
mod quadtree;
mod shapes;
mod util;

pub use config::TreeConfig;
pub use error::{TreeError, TreeResult};
pub use force::Approximation;
pub use quadtree::{BarnesHutTree, Branch, BranchId, Particle, Slot};
pub use shapes::Rect;
pub use util::{determine_quadrant, Quadrant};

pub type P2 = Point2<f64>;
pub type V2 = Vector2<f64>;

/// A simulation vertex that can be mirrored into the tree as a particle
pub trait Vertex {
    /// Current position of the vertex
    fn coordinates(&self) -> P2;
    /// Mass used for aggregation and repulsion
    fn mass(&self) -> f64;
    /// Move the vertex, used when the tree has to separate coincident vertices
    fn set_coordinates(&mut self, coordinates: P2);
}

impl Vertex for (P2, f64) {
    fn coordinates(&self) -> P2 {
        self.0
    }

    fn mass(&self) -> f64 {
        self.1
    }

    fn set_coordinates(&mut self, coordinates: P2) {
        self.0 = coordinates;
    }
}
