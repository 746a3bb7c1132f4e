use std::any::Any;
use std::collections::HashSet;

use crate::bodies::{MotionState, RigidBody};
use crate::collision::collision_pair::{flatten_pairs, CollisionPair};
use crate::core::{BodyHandle, BodyStorage, Storage};
use crate::error::PhysicsError;
use crate::math::{Aabb, Vector2};
use crate::shapes::ShapeKind;
use crate::Result;

/// Trait for broad-phase collision detection algorithms.
///
/// Pairs are returned flat as `[a0, b0, a1, b1, ...]`. A body never pairs with
/// itself and each unordered pair appears at most once.
pub trait BroadPhase: Send + Sync {
    /// Returns the type name used in serialized worlds
    fn name(&self) -> &'static str;

    /// Gets all potential collision pairs
    fn get_collision_pairs(&mut self, bodies: &BodyStorage<RigidBody>) -> Result<Vec<BodyHandle>>;

    /// Called by the world after a body was added
    fn on_body_added(&mut self, _body: BodyHandle) {}

    /// Called by the world after a body was removed
    fn on_body_removed(&mut self, _body: BodyHandle) {}

    /// Returns self as Any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Clones the broad-phase into a box
    fn clone_box(&self) -> Box<dyn BroadPhase>;
}

/// Returns false for pairs that can never produce a useful contact:
/// static-static, static-kinematic and kinematic-kinematic.
pub fn can_collide(a: &RigidBody, b: &RigidBody) -> bool {
    !matches!(
        (a.motion_state, b.motion_state),
        (MotionState::Static, MotionState::Static)
            | (MotionState::Static, MotionState::Kinematic)
            | (MotionState::Kinematic, MotionState::Static)
            | (MotionState::Kinematic, MotionState::Kinematic)
    )
}

/// Checks whether the bounding circles of two bodies overlap
pub fn bounding_radius_check(a: &RigidBody, b: &RigidBody) -> bool {
    let r = a.bounding_radius + b.bounding_radius;
    if !r.is_finite() {
        return true;
    }
    a.position.distance_squared(&b.position) <= r * r
}

fn accept(a: &RigidBody, b: &RigidBody) -> bool {
    can_collide(a, b) && bounding_radius_check(a, b)
}

/// Tests every pair of bodies
#[derive(Debug, Clone, Default)]
pub struct NaiveBroadPhase;

impl NaiveBroadPhase {
    /// Creates a new naive broad-phase
    pub fn new() -> Self {
        Self
    }
}

impl BroadPhase for NaiveBroadPhase {
    fn name(&self) -> &'static str {
        "NaiveBroadphase"
    }

    fn get_collision_pairs(&mut self, bodies: &BodyStorage<RigidBody>) -> Result<Vec<BodyHandle>> {
        let items = bodies.as_slice();
        let mut pairs = Vec::new();

        for i in 0..items.len() {
            for j in (i + 1)..items.len() {
                if accept(&items[i], &items[j]) {
                    if let (Some(a), Some(b)) = (bodies.handle_at(i), bodies.handle_at(j)) {
                        pairs.push(a);
                        pairs.push(b);
                    }
                }
            }
        }

        Ok(pairs)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn BroadPhase> {
        Box::new(self.clone())
    }
}

/// One-dimensional sweep and prune.
///
/// Bodies are sorted along `axis_index` by the lower end of their bounding
/// circle; the sweep for a body stops at the first body starting past its end.
#[derive(Debug, Clone, Default)]
pub struct SapBroadPhase {
    axis_list: Vec<BodyHandle>,

    /// 0 sweeps along x, 1 along y
    pub axis_index: usize,
}

impl SapBroadPhase {
    /// Creates a sweep and prune broad-phase along the x axis
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep axis, builder style
    pub fn with_axis(mut self, axis_index: usize) -> Self {
        self.axis_index = axis_index.min(1);
        self
    }

    /// Returns the bodies currently tracked, in sweep order after the last query
    pub fn get_axis_list(&self) -> &[BodyHandle] {
        &self.axis_list
    }
}

impl BroadPhase for SapBroadPhase {
    fn name(&self) -> &'static str {
        "SAPBroadphase"
    }

    fn get_collision_pairs(&mut self, bodies: &BodyStorage<RigidBody>) -> Result<Vec<BodyHandle>> {
        let axis = self.axis_index.min(1);
        self.axis_list.retain(|h| bodies.contains(*h));

        let lower = |h: &BodyHandle| {
            bodies
                .get(*h)
                .map(|b| b.position.axis(axis) - b.bounding_radius)
                .unwrap_or(f32::INFINITY)
        };
        self.axis_list.sort_by(|a, b| lower(a).total_cmp(&lower(b)));

        let mut pairs = Vec::new();
        for (i, &handle_i) in self.axis_list.iter().enumerate() {
            let Some(bi) = bodies.get(handle_i) else { continue };
            let end_i = bi.position.axis(axis) + bi.bounding_radius;

            for &handle_j in &self.axis_list[i + 1..] {
                let Some(bj) = bodies.get(handle_j) else { continue };
                let start_j = bj.position.axis(axis) - bj.bounding_radius;
                if !(start_j < end_i) {
                    break;
                }
                if accept(bi, bj) {
                    pairs.push(CollisionPair::new(handle_i, handle_j));
                }
            }
        }

        Ok(flatten_pairs(pairs))
    }

    fn on_body_added(&mut self, body: BodyHandle) {
        if !self.axis_list.contains(&body) {
            self.axis_list.push(body);
        }
    }

    fn on_body_removed(&mut self, body: BodyHandle) {
        self.axis_list.retain(|h| *h != body);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn BroadPhase> {
        Box::new(self.clone())
    }
}

/// Uniform grid over a fixed rectangle.
///
/// Only circles and planes can be binned. Bodies outside the rectangle are
/// clamped into the border bins.
#[derive(Debug, Clone)]
pub struct GridBroadPhase {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
    pub nx: usize,
    pub ny: usize,
}

impl GridBroadPhase {
    /// Creates a grid of `nx × ny` bins over the given rectangle
    pub fn new(xmin: f32, xmax: f32, ymin: f32, ymax: f32, nx: usize, ny: usize) -> Result<Self> {
        if nx == 0 || ny == 0 || !(xmax > xmin) || !(ymax > ymin) {
            return Err(PhysicsError::InvalidParameter(format!(
                "grid needs positive bin counts and a non-empty area, got {}x{} over [{}, {}]x[{}, {}]",
                nx, ny, xmin, xmax, ymin, ymax
            )));
        }
        Ok(Self { xmin, xmax, ymin, ymax, nx, ny })
    }

    /// Total number of bins
    pub fn num_bins(&self) -> usize {
        self.nx * self.ny
    }

    fn column(&self, x: f32) -> usize {
        let t = ((x - self.xmin) * self.nx as f32 / (self.xmax - self.xmin)).floor();
        clamp_cell(t, self.nx)
    }

    fn row(&self, y: f32) -> usize {
        let t = ((y - self.ymin) * self.ny as f32 / (self.ymax - self.ymin)).floor();
        clamp_cell(t, self.ny)
    }

    /// Returns the bin containing a point, clamped into the grid
    pub fn bin_index(&self, x: f32, y: f32) -> usize {
        self.column(x) * self.ny + self.row(y)
    }

    fn bin_bounds(&self, ix: usize, iy: usize) -> Aabb {
        let w = (self.xmax - self.xmin) / self.nx as f32;
        let h = (self.ymax - self.ymin) / self.ny as f32;
        let min = Vector2::new(self.xmin + ix as f32 * w, self.ymin + iy as f32 * h);
        Aabb::new(min, min + Vector2::new(w, h))
    }

    fn bin_body(&self, body: &RigidBody, bins: &mut [Vec<usize>], index: usize) -> Result<()> {
        for (k, body_shape) in body.shapes.iter().enumerate() {
            let Some((position, angle)) = body.get_shape_transform(k) else { continue };

            match body_shape.shape.kind() {
                ShapeKind::Circle { radius } => {
                    let r = *radius;
                    for ix in self.column(position.x - r)..=self.column(position.x + r) {
                        for iy in self.row(position.y - r)..=self.row(position.y + r) {
                            push_unique(&mut bins[ix * self.ny + iy], index);
                        }
                    }
                }
                ShapeKind::Plane => {
                    let normal = Vector2::unit_y().rotate(angle);
                    for ix in 0..self.nx {
                        for iy in 0..self.ny {
                            let touches = self
                                .bin_bounds(ix, iy)
                                .corners()
                                .iter()
                                .any(|c| (*c - position).dot(&normal) <= 0.0);
                            if touches {
                                push_unique(&mut bins[ix * self.ny + iy], index);
                            }
                        }
                    }
                }
                _ => {
                    return Err(PhysicsError::UnsupportedShape {
                        context: "GridBroadPhase",
                        shape: body_shape.shape.shape_type().name(),
                    });
                }
            }
        }
        Ok(())
    }
}

fn clamp_cell(t: f32, count: usize) -> usize {
    if t.is_nan() || t <= 0.0 {
        0
    } else {
        (t as usize).min(count - 1)
    }
}

fn push_unique(bin: &mut Vec<usize>, index: usize) {
    if bin.last() != Some(&index) {
        bin.push(index);
    }
}

impl BroadPhase for GridBroadPhase {
    fn name(&self) -> &'static str {
        "GridBroadphase"
    }

    fn get_collision_pairs(&mut self, bodies: &BodyStorage<RigidBody>) -> Result<Vec<BodyHandle>> {
        let items = bodies.as_slice();
        let mut bins: Vec<Vec<usize>> = vec![Vec::new(); self.num_bins()];

        for (index, body) in items.iter().enumerate() {
            self.bin_body(body, &mut bins, index)?;
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for bin in &bins {
            for (k, &i) in bin.iter().enumerate() {
                for &j in &bin[k + 1..] {
                    if !accept(&items[i], &items[j]) {
                        continue;
                    }
                    let (Some(a), Some(b)) = (bodies.handle_at(i), bodies.handle_at(j)) else { continue };
                    let pair = CollisionPair::new(a, b);
                    if seen.insert(pair) {
                        pairs.push(pair);
                    }
                }
            }
        }

        Ok(flatten_pairs(pairs))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn BroadPhase> {
        Box::new(self.clone())
    }
}

/// A quadtree node holding body indices with their boxes
#[derive(Debug, Clone)]
struct QuadNode {
    bounds: Aabb,
    depth: usize,
    children: Vec<(usize, Aabb)>,
    stuck_children: Vec<(usize, Aabb)>,
    nodes: Vec<QuadNode>,
}

impl QuadNode {
    fn new(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            children: Vec::new(),
            stuck_children: Vec::new(),
            nodes: Vec::new(),
        }
    }

    fn insert(&mut self, item: (usize, Aabb), max_depth: usize, max_children: usize) {
        if !self.nodes.is_empty() {
            match self.nodes.iter_mut().find(|n| n.bounds.contains_aabb(&item.1)) {
                Some(node) => node.insert(item, max_depth, max_children),
                None => self.stuck_children.push(item),
            }
            return;
        }

        self.children.push(item);

        if self.children.len() > max_children && self.depth < max_depth {
            self.subdivide();
            for child in std::mem::take(&mut self.children) {
                self.insert(child, max_depth, max_children);
            }
        }
    }

    fn subdivide(&mut self) {
        self.nodes = self
            .bounds
            .quadrants()
            .into_iter()
            .map(|b| QuadNode::new(b, self.depth + 1))
            .collect();
    }

    fn retrieve(&self, query: &Aabb, out: &mut Vec<usize>) {
        out.extend(self.stuck_children.iter().map(|(i, _)| *i));
        out.extend(self.children.iter().map(|(i, _)| *i));
        for node in &self.nodes {
            if node.bounds.intersects(query) {
                node.retrieve(query, out);
            }
        }
    }
}

/// Quadtree broad-phase rebuilt on every query.
///
/// Boxes that straddle quadrant borders stay on the node as stuck children and
/// every overlapping node is visited on retrieval, so no pair is missed.
#[derive(Debug, Clone)]
pub struct QuadTreeBroadPhase {
    /// Region covered by the root node
    pub bounds: Aabb,

    /// Maximum subdivision depth
    pub max_depth: usize,

    /// Children a leaf may hold before it splits
    pub max_children: usize,
}

impl QuadTreeBroadPhase {
    /// Creates a quadtree over the given bounds with depth 4 and 4 children per leaf
    pub fn new(bounds: Aabb) -> Self {
        Self {
            bounds,
            max_depth: 4,
            max_children: 4,
        }
    }

    /// Sets the subdivision limits, builder style
    pub fn with_limits(mut self, max_depth: usize, max_children: usize) -> Self {
        self.max_depth = max_depth;
        self.max_children = max_children.max(1);
        self
    }
}

impl Default for QuadTreeBroadPhase {
    fn default() -> Self {
        Self::new(Aabb::new(Vector2::new(-1000.0, -1000.0), Vector2::new(1000.0, 1000.0)))
    }
}

impl BroadPhase for QuadTreeBroadPhase {
    fn name(&self) -> &'static str {
        "QuadTreeBroadphase"
    }

    fn get_collision_pairs(&mut self, bodies: &BodyStorage<RigidBody>) -> Result<Vec<BodyHandle>> {
        let items = bodies.as_slice();
        let boxes: Vec<Aabb> = items.iter().map(RigidBody::get_aabb).collect();

        let mut root = QuadNode::new(self.bounds, 0);
        for (i, aabb) in boxes.iter().enumerate() {
            root.insert((i, *aabb), self.max_depth, self.max_children);
        }

        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        let mut candidates = Vec::new();

        for (i, aabb) in boxes.iter().enumerate() {
            candidates.clear();
            root.retrieve(aabb, &mut candidates);
            candidates.sort_unstable();
            candidates.dedup();

            for &j in candidates.iter().filter(|&&j| j > i) {
                if !accept(&items[i], &items[j]) {
                    continue;
                }
                let (Some(a), Some(b)) = (bodies.handle_at(i), bodies.handle_at(j)) else { continue };
                let pair = CollisionPair::new(a, b);
                if seen.insert(pair) {
                    pairs.push(pair);
                }
            }
        }

        Ok(flatten_pairs(pairs))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn BroadPhase> {
        Box::new(self.clone())
    }
}
