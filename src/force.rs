use nalgebra as na;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    quadtree::{BarnesHutTree, Slot},
    P2, V2,
};

/// A single point mass standing in for either one particle or a whole
/// branch that is far enough away
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Approximation {
    position: P2,
    mass: f64,
}

impl Approximation {
    /// Get the position of the point mass
    pub fn position(&self) -> P2 {
        self.position
    }

    /// Get the mass of the point mass
    pub fn mass(&self) -> f64 {
        self.mass
    }
}

impl BarnesHutTree {
    /// Collect the point masses acting on `position`.
    ///
    /// A branch is summarized by its center of mass when its larger side divided
    /// by the distance to that center is below `theta`; otherwise its quadrants
    /// are visited. Particles sitting exactly at `position` are left out.
    pub fn approximations(&self, position: P2, theta: f64) -> Vec<Approximation> {
        let mut results = Vec::new();
        let mut stack = vec![self.root_id()];

        while let Some(id) = stack.pop() {
            let branch = self.branch(id);
            let center = branch.coordinates();
            let size = branch.area().width().max(branch.area().height());

            if branch.mass() != 0.0 && size < theta * na::distance(&position, &center) {
                results.push(Approximation {
                    position: center,
                    mass: branch.mass(),
                });
                continue;
            }

            for slot in branch.slots() {
                match slot {
                    Slot::Empty => (),
                    Slot::Particle(particle) => {
                        if particle.position() != position {
                            results.push(Approximation {
                                position: particle.position(),
                                mass: particle.mass(),
                            });
                        }
                    }
                    Slot::Branch(child) => stack.push(*child),
                }
            }
        }

        results
    }

    /// Repulsive force on a vertex of `mass` at `position`.
    ///
    /// Each approximation pushes the vertex away with magnitude
    /// `strength * |m1 * m2| / d²`, where `d` never drops below
    /// [`min_distance`](BarnesHutTree::min_distance).
    pub fn repulsion(&self, position: P2, mass: f64, theta: f64, strength: f64) -> V2 {
        let min_distance = self.min_distance();
        self.approximations(position, theta)
            .iter()
            .fold(V2::zeros(), |force, other| {
                let direction = other.position - position;
                let Some(unit) = direction.try_normalize(0.0) else {
                    return force;
                };
                let distance = direction.norm().max(min_distance);
                force - unit * (strength * (mass * other.mass).abs() / (distance * distance))
            })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::point;

    use crate::{util::tests::make_rect, TreeConfig};

    use super::*;

    fn build(vertices: &mut [(P2, f64)], min_distance: f64) -> BarnesHutTree {
        let config = TreeConfig::default()
            .with_seed(11)
            .with_min_distance(min_distance);
        BarnesHutTree::build(make_rect(0.0, 0.0, 100.0, 100.0), config, vertices).unwrap()
    }

    fn brute_force(vertices: &[(P2, f64)], position: P2, mass: f64, strength: f64) -> V2 {
        vertices
            .iter()
            .filter(|v| v.0 != position)
            .fold(V2::zeros(), |force, v| {
                let direction = v.0 - position;
                let distance = direction.norm();
                force - direction / distance * (strength * mass * v.1 / (distance * distance))
            })
    }

    #[test]
    fn empty_tree_exerts_no_force() {
        let tree = build(&mut [], 0.01);
        assert!(tree.approximations(point![10.0, 10.0], 0.5).is_empty());
        assert_eq!(tree.repulsion(point![10.0, 10.0], 1.0, 0.5, 1.0), V2::zeros());
    }

    #[test]
    fn single_neighbour_pushes_away() {
        let mut vertices = [(point![60.0, 20.0], 2.0)];
        let tree = build(&mut vertices, 0.01);
        let force = tree.repulsion(point![50.0, 20.0], 3.0, 0.5, 10.0);
        assert_relative_eq!(force, V2::new(-10.0 * 6.0 / 100.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn symmetric_neighbours_cancel() {
        let mut vertices = [(point![25.0, 50.0], 1.0), (point![75.0, 50.0], 1.0)];
        let tree = build(&mut vertices, 0.01);
        let force = tree.repulsion(point![50.0, 50.0], 1.0, 0.5, 1.0);
        assert_relative_eq!(force, V2::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn querying_vertex_is_excluded() {
        let mut vertices = [(point![10.0, 10.0], 1.0), (point![90.0, 10.0], 1.0)];
        let tree = build(&mut vertices, 0.01);
        let found = tree.approximations(point![10.0, 10.0], 0.0);
        assert_eq!(found.len(), 1, "Only the other vertex should act on the query");
        assert_eq!(found[0].position(), point![90.0, 10.0]);
    }

    #[test]
    fn distant_cluster_is_summarized() {
        let mut vertices = [
            (point![80.0, 80.0], 1.0),
            (point![85.0, 85.0], 1.0),
            (point![90.0, 80.0], 1.0),
            (point![95.0, 95.0], 1.0),
        ];
        let tree = build(&mut vertices, 0.01);

        let coarse = tree.approximations(point![5.0, 5.0], 1.0);
        assert_eq!(coarse.len(), 1, "Whole tree should collapse into one mass");
        assert_eq!(coarse[0].mass(), 4.0);
        assert_relative_eq!(coarse[0].position(), point![87.5, 85.0], epsilon = 1e-12);

        let exact = tree.approximations(point![5.0, 5.0], 0.0);
        assert_eq!(exact.len(), 4, "Theta of zero should visit every particle");
    }

    #[test]
    fn zero_theta_matches_direct_summation() {
        let mut vertices = (0..40)
            .map(|i| {
                let i = i as f64;
                (point![(i * 37.0) % 97.0 + 1.0, (i * 53.0) % 89.0 + 3.0], 1.0 + i % 3.0)
            })
            .collect::<Vec<_>>();
        let tree = build(&mut vertices, 1e-9);

        for at in [point![50.0, 50.0], point![2.0, 98.0], vertices[7].0] {
            assert_relative_eq!(
                tree.repulsion(at, 1.5, 0.0, 2.0),
                brute_force(&vertices, at, 1.5, 2.0),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn approximation_stays_close_to_direct_summation() {
        let mut vertices = (0..200)
            .map(|i| {
                let i = i as f64;
                (point![(i * 7.3) % 100.0, (i * 13.7) % 100.0], 1.0)
            })
            .collect::<Vec<_>>();
        let tree = build(&mut vertices, 1e-9);

        let outside = point![-50.0, 50.0];
        assert!(tree.approximations(outside, 0.3).len() < vertices.len());
        let approximate = tree.repulsion(outside, 1.0, 0.3, 1.0);
        let exact = brute_force(&vertices, outside, 1.0, 1.0);
        assert!(
            (approximate - exact).norm() < 0.05 * exact.norm(),
            "Approximation {approximate} should be within 5% of {exact}"
        );
    }

    #[test]
    fn min_distance_caps_close_range_force() {
        let mut vertices = [(point![10.0, 10.0], 1.0), (point![10.000001, 10.0], 1.0)];
        let tree = build(&mut vertices, 0.1);
        let force = tree.repulsion(point![10.0, 10.0], 1.0, 0.5, 1.0);
        assert_relative_eq!(force, V2::new(-100.0, 0.0), epsilon = 1e-9);
    }
}
