use std::collections::VecDeque;

use log::{debug, trace, warn};
use rand::{rngs::StdRng, Rng, SeedableRng};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::TreeConfig,
    error::{TreeError, TreeResult},
    shapes::Rect,
    util::{determine_quadrant, Quadrant},
    Vertex, P2, V2,
};

/// Index of a branch inside the tree's arena
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BranchId(usize);

impl BranchId {
    const ROOT: BranchId = BranchId(0);

    fn index(self) -> usize {
        self.0
    }
}

/// A point mass mirrored from a simulation vertex
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Particle {
    position: P2,
    mass: f64,
    vertex: usize,
}

impl Particle {
    /// Create a particle for the vertex at index `vertex`
    pub fn new(position: P2, mass: f64, vertex: usize) -> Self {
        Self {
            position,
            mass,
            vertex,
        }
    }

    /// Get the position of the particle
    pub fn position(&self) -> P2 {
        self.position
    }

    /// Get the mass of the particle
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Index of the vertex this particle was built from
    pub fn vertex(&self) -> usize {
        self.vertex
    }

    /// Fold another particle into this one, keeping the combined center of mass
    fn merge(&mut self, other: &Particle) {
        let mass = self.mass + other.mass;
        if mass != 0.0 {
            self.position = P2::from(
                (self.position.coords * self.mass + other.position.coords * other.mass) / mass,
            );
        }
        self.mass = mass;
    }
}

/// Content of one quadrant of a branch
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Slot {
    Empty,
    Particle(Particle),
    Branch(BranchId),
}

impl Slot {
    /// Check if nothing occupies the slot
    pub fn is_empty(&self) -> bool {
        matches!(self, Slot::Empty)
    }

    /// Get the particle if the slot holds one directly
    pub fn particle(&self) -> Option<&Particle> {
        match self {
            Slot::Particle(particle) => Some(particle),
            _ => None,
        }
    }

    /// Get the id of the branch if the slot holds one
    pub fn branch(&self) -> Option<BranchId> {
        match self {
            Slot::Branch(id) => Some(*id),
            _ => None,
        }
    }
}

/// A node of the tree covering a rectangular area.
///
/// The aggregate is kept as a running mass-weighted coordinate sum; use
/// [`Branch::coordinates`] for the actual center of mass.
#[derive(Clone, Debug)]
pub struct Branch {
    area: Rect,
    mass: f64,
    moment: V2,
    depth: usize,
    parent: Option<BranchId>,
    slots: [Slot; 4],
}

impl Branch {
    fn new(area: Rect, depth: usize, parent: Option<BranchId>) -> Self {
        Self {
            area,
            mass: 0.0,
            moment: V2::zeros(),
            depth,
            parent,
            slots: [Slot::Empty; 4],
        }
    }

    /// Add a particle to the aggregate of this branch
    fn absorb(&mut self, particle: &Particle) {
        self.mass += particle.mass;
        self.moment += particle.position.coords * particle.mass;
    }

    /// Get the area covered by the branch
    pub fn area(&self) -> &Rect {
        &self.area
    }

    /// Total mass of all particles beneath this branch
    pub fn mass(&self) -> f64 {
        self.mass
    }

    /// Sum of `mass * position` over all particles beneath this branch
    pub fn moment(&self) -> V2 {
        self.moment
    }

    /// Center of mass of the branch, or the center of its area while it holds no mass
    pub fn coordinates(&self) -> P2 {
        if self.mass == 0.0 {
            self.area.center()
        } else {
            P2::from(self.moment / self.mass)
        }
    }

    /// Distance from the root, which has depth 0
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Get the content of one quadrant
    pub fn slot(&self, quadrant: Quadrant) -> &Slot {
        &self.slots[quadrant.index()]
    }

    /// Get all four slots, ordered like [`Quadrant::ALL`]
    pub fn slots(&self) -> &[Slot; 4] {
        &self.slots
    }
}

/// A Barnes-Hut quadtree built fresh for each force pass.
///
/// Branches live in an arena and refer to their children by [`BranchId`].
/// The root always exists and covers the area given at construction.
#[derive(Debug)]
pub struct BarnesHutTree {
    branches: Vec<Branch>,
    config: TreeConfig,
    rng: StdRng,
    len: usize,
}

impl BarnesHutTree {
    /// Create a new empty tree
    ///
    /// ## Arguments
    /// - `area`: The area covered by the root branch
    /// - `config`: Force walk cutoff, jitter and depth settings
    pub fn new(area: Rect, config: TreeConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        Self {
            branches: vec![Branch::new(area, 0, None)],
            config,
            rng,
            len: 0,
        }
    }

    /// Create a new empty tree with the given force walk cutoff and default settings otherwise
    pub fn with_min_distance(area: Rect, min_distance: f64) -> Self {
        Self::new(area, TreeConfig::default().with_min_distance(min_distance))
    }

    /// Create a tree and insert every vertex in order
    pub fn build<V: Vertex>(
        area: Rect,
        config: TreeConfig,
        vertices: &mut [V],
    ) -> TreeResult<Self> {
        let mut tree = Self::new(area, config);
        tree.branches.try_reserve(vertices.len())?;
        for index in 0..vertices.len() {
            tree.insert(vertices, index)?;
        }
        Ok(tree)
    }

    /// Insert `vertices[index]` into the tree.
    ///
    /// Coincident vertices are separated by moving the one already in the tree
    /// by a small random offset, which is written back through
    /// [`Vertex::set_coordinates`]. This is why the whole vertex slice is passed,
    /// and every insert into one tree must receive the same slice.
    ///
    /// **Returns** `Ok(false)` if the vertex was skipped because its position
    /// or mass is not finite or it lies outside the tree's area, in which case
    /// the tree is left untouched.
    pub fn insert<V: Vertex>(&mut self, vertices: &mut [V], index: usize) -> TreeResult<bool> {
        let len = vertices.len();
        let vertex = vertices
            .get(index)
            .ok_or(TreeError::VertexOutOfRange { index, len })?;
        let particle = Particle::new(vertex.coordinates(), vertex.mass(), index);

        if determine_quadrant(self.area(), &particle.position).is_none()
            || !particle.mass.is_finite()
        {
            warn!(
                "skipping vertex {index}: position {} and mass {} must be finite",
                particle.position, particle.mass
            );
            return Ok(false);
        }

        if !self.area().contains(&particle.position) {
            warn!(
                "skipping vertex {index}: position {} lies outside the tree area",
                particle.position
            );
            return Ok(false);
        }

        self.branches[BranchId::ROOT.index()].absorb(&particle);

        // Every entry has already been absorbed by the branch it resumes at
        let mut pending: VecDeque<(Particle, BranchId)> = VecDeque::new();
        let mut in_hand = Some((particle, BranchId::ROOT));

        while let Some((particle, current)) = in_hand.take().or_else(|| pending.pop_front()) {
            let branch = &self.branches[current.index()];
            let Some(quadrant) = determine_quadrant(&branch.area, &particle.position) else {
                unreachable!("particle {particle:?} lost its finite position during insertion");
            };
            let depth = branch.depth;
            let slot = branch.slots[quadrant.index()];

            match slot {
                Slot::Empty => {
                    self.branches[current.index()].slots[quadrant.index()] =
                        Slot::Particle(particle);
                }
                Slot::Branch(child) => {
                    self.branches[child.index()].absorb(&particle);
                    in_hand = Some((particle, child));
                }
                Slot::Particle(mut resident) if depth >= self.config.max_depth => {
                    debug!(
                        "merging vertex {} into vertex {} at depth limit {depth}",
                        particle.vertex, resident.vertex
                    );
                    resident.merge(&particle);
                    self.branches[current.index()].slots[quadrant.index()] =
                        Slot::Particle(resident);
                }
                Slot::Particle(resident) => {
                    let (child, resident) =
                        self.split(vertices, current, quadrant, resident, &particle)?;
                    pending.try_reserve(1)?;
                    pending.push_back((resident, child));
                    in_hand = Some((particle, child));
                }
            }
        }

        self.len += 1;
        Ok(true)
    }

    /// Replace the particle in `parent`'s `quadrant` with a new branch holding
    /// both the resident and the incoming particle in its aggregate.
    ///
    /// **Returns** the new branch and the resident, which still has to be placed in it
    fn split<V: Vertex>(
        &mut self,
        vertices: &mut [V],
        parent: BranchId,
        quadrant: Quadrant,
        mut resident: Particle,
        incoming: &Particle,
    ) -> TreeResult<(BranchId, Particle)> {
        let parent_branch = &self.branches[parent.index()];
        let area = parent_branch.area.quadrant_rect(quadrant);
        let depth = parent_branch.depth + 1;

        if resident.position == incoming.position {
            let moved = self.jitter(&area, &resident.position);
            debug!(
                "vertex {} coincides with vertex {} at {}, moving it to {moved}",
                resident.vertex, incoming.vertex, resident.position
            );
            self.shift(parent, (moved - resident.position) * resident.mass);
            resident.position = moved;
            debug_assert!(
                resident.vertex < vertices.len(),
                "vertex {} was inserted from a different slice",
                resident.vertex
            );
            if let Some(vertex) = vertices.get_mut(resident.vertex) {
                vertex.set_coordinates(moved);
            }
        }

        let mut branch = Branch::new(area, depth, Some(parent));
        branch.absorb(&resident);
        branch.absorb(incoming);

        self.branches.try_reserve(1)?;
        let child = BranchId(self.branches.len());
        self.branches.push(branch);

        let old = std::mem::replace(
            &mut self.branches[parent.index()].slots[quadrant.index()],
            Slot::Branch(child),
        );
        debug_assert!(matches!(old, Slot::Particle(_)), "only particle slots are split");
        trace!(
            "split {quadrant:?} of branch {} into branch {}",
            parent.index(),
            child.index()
        );

        Ok((child, resident))
    }

    /// Random offset of up to `jitter_fraction` of the half size of `area`,
    /// clamped so the point stays inside `area`
    fn jitter(&mut self, area: &Rect, position: &P2) -> P2 {
        let half = area.half_size() * self.config.jitter_fraction;
        let dx: f64 = self.rng.random_range(-1.0..=1.0);
        let dy: f64 = self.rng.random_range(-1.0..=1.0);
        area.clamp(&(*position + V2::new(dx * half.x, dy * half.y)))
    }

    /// Move the weighted coordinate sum of `from` and all its ancestors
    fn shift(&mut self, from: BranchId, delta: V2) {
        let mut current = Some(from);
        while let Some(id) = current {
            let branch = &mut self.branches[id.index()];
            branch.moment += delta;
            current = branch.parent;
        }
    }

    /// Get the root branch
    pub fn root(&self) -> &Branch {
        &self.branches[BranchId::ROOT.index()]
    }

    /// Get the id of the root branch, the starting point of every walk
    pub fn root_id(&self) -> BranchId {
        BranchId::ROOT
    }

    /// Get a branch by id
    ///
    /// Ids are only meaningful for the tree that produced them.
    pub fn branch(&self, id: BranchId) -> &Branch {
        &self.branches[id.index()]
    }

    /// Get the area covered by the tree
    pub fn area(&self) -> &Rect {
        &self.root().area
    }

    /// Get the settings the tree was created with
    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Cutoff distance used by the force walk
    pub fn min_distance(&self) -> f64 {
        self.config.min_distance
    }

    /// Number of vertices inserted
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no vertex has been inserted yet
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of branches, including the root
    pub fn branch_count(&self) -> usize {
        self.branches.len()
    }

    /// Iterate over the particles stored in the leaves of the tree
    pub fn particles(&self) -> impl Iterator<Item = &Particle> + '_ {
        self.branches
            .iter()
            .flat_map(|branch| branch.slots.iter())
            .filter_map(Slot::particle)
    }
}
