//! Geometric contact routines for every pair of built-in shapes.
//!
//! Each routine takes its two shapes in a fixed order and reports contacts
//! with the normal pointing out of the first shape. The narrow-phase calls a
//! routine with swapped arguments for the mirrored shape pair and flips the
//! result, so every routine exists once.

use crate::collision::ShapeContext;
use crate::math::{Vector2, EPSILON};
use crate::shapes::{ConvexData, ShapeKind};

/// A single contact between two placed shapes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactPoint {
    /// Unit normal pointing out of the first shape
    pub normal: Vector2,

    /// Deepest point on the surface of the first shape, world space
    pub point_a: Vector2,

    /// Deepest point on the surface of the second shape, world space
    pub point_b: Vector2,
}

impl ContactPoint {
    /// The same contact seen from the second shape
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            point_a: self.point_b,
            point_b: self.point_a,
        }
    }

    /// Overlap along the normal, positive when penetrating
    pub fn depth(&self) -> f32 {
        (self.point_a - self.point_b).dot(&self.normal)
    }
}

/// The contact routines referenced by the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactRoutine {
    NoContact,
    CircleCircle,
    CircleParticle,
    CirclePlane,
    CircleConvex,
    CircleLine,
    CircleCapsule,
    ParticlePlane,
    ParticleConvex,
    ParticleCapsule,
    PlaneConvex,
    PlaneLine,
    PlaneCapsule,
    ConvexConvex,
    ConvexLine,
    ConvexCapsule,
    LineLine,
    LineCapsule,
    CapsuleCapsule,
}

impl ContactRoutine {
    /// Runs the routine, appending contacts with normals out of `a`
    pub fn run(self, a: &ShapeContext, b: &ShapeContext, out: &mut Vec<ContactPoint>) {
        let start = out.len();
        match self {
            ContactRoutine::NoContact => {}
            ContactRoutine::CircleCircle => {
                disc_disc(a.position, radius(a), b.position, radius(b), out);
            }
            ContactRoutine::CircleParticle => {
                disc_disc(a.position, radius(a), b.position, 0.0, out);
            }
            ContactRoutine::CirclePlane | ContactRoutine::ParticlePlane => {
                plane_disc(b, a.position, radius(a), out);
                flip_from(out, start);
            }
            ContactRoutine::CircleConvex | ContactRoutine::ParticleConvex => {
                if let Some(polygon) = WorldPolygon::from_context(b) {
                    polygon_disc(&polygon, a.position, radius(a), out);
                    flip_from(out, start);
                }
            }
            ContactRoutine::CircleLine | ContactRoutine::CircleCapsule | ContactRoutine::ParticleCapsule => {
                segment_disc(&Segment::from_context(b), a.position, radius(a), out);
                flip_from(out, start);
            }
            ContactRoutine::PlaneConvex => {
                if let Some(polygon) = WorldPolygon::from_context(b) {
                    for &vertex in &polygon.vertices {
                        plane_disc(a, vertex, 0.0, out);
                    }
                }
            }
            ContactRoutine::PlaneLine | ContactRoutine::PlaneCapsule => {
                let segment = Segment::from_context(b);
                plane_disc(a, segment.p0, segment.radius, out);
                plane_disc(a, segment.p1, segment.radius, out);
            }
            ContactRoutine::ConvexConvex => {
                if let (Some(pa), Some(pb)) = (WorldPolygon::from_context(a), WorldPolygon::from_context(b)) {
                    polygon_polygon(&pa, &pb, out);
                }
            }
            ContactRoutine::ConvexLine => {
                if let Some(polygon) = WorldPolygon::from_context(a) {
                    let segment = Segment::from_context(b);
                    polygon_polygon(&polygon, &WorldPolygon::from_segment(segment.p0, segment.p1), out);
                }
            }
            ContactRoutine::ConvexCapsule => {
                if let Some(polygon) = WorldPolygon::from_context(a) {
                    convex_capsule(&polygon, b, out);
                }
            }
            ContactRoutine::LineLine | ContactRoutine::LineCapsule | ContactRoutine::CapsuleCapsule => {
                segment_segment(&Segment::from_context(a), &Segment::from_context(b), out);
            }
        }
    }
}

fn flip_from(out: &mut [ContactPoint], start: usize) {
    for contact in &mut out[start..] {
        *contact = contact.flipped();
    }
}

fn radius(context: &ShapeContext) -> f32 {
    match context.shape.kind() {
        ShapeKind::Circle { radius } | ShapeKind::Capsule { radius, .. } => *radius,
        _ => 0.0,
    }
}

/// Outward normal of the plane's solid half-space surface
fn plane_normal(angle: f32) -> Vector2 {
    Vector2::unit_y().rotate(angle)
}

/// A line or capsule core in world space
#[derive(Debug, Clone, Copy)]
struct Segment {
    p0: Vector2,
    p1: Vector2,
    normal: Vector2,
    radius: f32,
}

impl Segment {
    fn from_context(context: &ShapeContext) -> Self {
        let length = match context.shape.kind() {
            ShapeKind::Line { length } | ShapeKind::Capsule { length, .. } => *length,
            _ => 0.0,
        };
        let half = Vector2::from_angle(context.angle) * (length * 0.5);
        Self {
            p0: context.position - half,
            p1: context.position + half,
            normal: plane_normal(context.angle),
            radius: radius(context),
        }
    }

    fn midpoint(&self) -> Vector2 {
        (self.p0 + self.p1) * 0.5
    }

    fn closest_point(&self, point: Vector2) -> Vector2 {
        let edge = self.p1 - self.p0;
        let length_squared = edge.length_squared();
        if length_squared < EPSILON * EPSILON {
            return self.p0;
        }
        let t = ((point - self.p0).dot(&edge) / length_squared).clamp(0.0, 1.0);
        self.p0 + edge * t
    }
}

/// A convex polygon in world space with outward edge normals
#[derive(Debug, Clone)]
struct WorldPolygon {
    vertices: Vec<Vector2>,
    normals: Vec<Vector2>,
}

impl WorldPolygon {
    fn from_context(context: &ShapeContext) -> Option<Self> {
        context
            .shape
            .polygon()
            .map(|data| Self::from_convex(data, context.position, context.angle))
    }

    fn from_convex(data: &ConvexData, position: Vector2, angle: f32) -> Self {
        Self {
            vertices: data.get_vertices().iter().map(|v| v.to_global_frame(&position, angle)).collect(),
            normals: data.get_normals().iter().map(|n| n.rotate(angle)).collect(),
        }
    }

    /// A segment as a two-sided polygon
    fn from_segment(p0: Vector2, p1: Vector2) -> Self {
        let edge = p1 - p0;
        let mut normal = Vector2::new(edge.y, -edge.x).normalize();
        if normal.is_zero() {
            normal = -Vector2::unit_y();
        }
        Self {
            vertices: vec![p0, p1],
            normals: vec![normal, -normal],
        }
    }

    fn len(&self) -> usize {
        self.vertices.len()
    }
}

fn disc_disc(ca: Vector2, ra: f32, cb: Vector2, rb: f32, out: &mut Vec<ContactPoint>) {
    let d = cb - ca;
    let distance = d.length();
    if distance > ra + rb {
        return;
    }
    let normal = if distance > EPSILON { d / distance } else { Vector2::unit_y() };
    out.push(ContactPoint {
        normal,
        point_a: ca + normal * ra,
        point_b: cb - normal * rb,
    });
}

/// Plane first; a disc of radius `r` (zero for points) second
fn plane_disc(plane: &ShapeContext, center: Vector2, r: f32, out: &mut Vec<ContactPoint>) {
    let normal = plane_normal(plane.angle);
    let d = (center - plane.position).dot(&normal);
    if d > r {
        return;
    }
    out.push(ContactPoint {
        normal,
        point_a: center - normal * d,
        point_b: center - normal * r,
    });
}

/// Segment (with its radius) first; a disc second
fn segment_disc(segment: &Segment, center: Vector2, r: f32, out: &mut Vec<ContactPoint>) {
    let closest = segment.closest_point(center);
    let d = center - closest;
    let distance = d.length();
    if distance > segment.radius + r {
        return;
    }
    let normal = if distance > EPSILON { d / distance } else { segment.normal };
    out.push(ContactPoint {
        normal,
        point_a: closest + normal * segment.radius,
        point_b: center - normal * r,
    });
}

/// Polygon first; a disc second
fn polygon_disc(polygon: &WorldPolygon, center: Vector2, r: f32, out: &mut Vec<ContactPoint>) {
    let count = polygon.len();
    let mut separation = f32::NEG_INFINITY;
    let mut face = 0;

    for i in 0..count {
        let s = polygon.normals[i].dot(&(center - polygon.vertices[i]));
        if s > r {
            return;
        }
        if s > separation {
            separation = s;
            face = i;
        }
    }

    let v1 = polygon.vertices[face];
    let v2 = polygon.vertices[(face + 1) % count];

    // Centre inside the polygon
    if separation < EPSILON {
        let normal = polygon.normals[face];
        out.push(ContactPoint {
            normal,
            point_a: center - normal * separation,
            point_b: center - normal * r,
        });
        return;
    }

    let u1 = (center - v1).dot(&(v2 - v1));
    let u2 = (center - v2).dot(&(v1 - v2));

    let (normal, point_a) = if u1 <= 0.0 {
        if center.distance_squared(&v1) > r * r {
            return;
        }
        ((center - v1).normalize(), v1)
    } else if u2 <= 0.0 {
        if center.distance_squared(&v2) > r * r {
            return;
        }
        ((center - v2).normalize(), v2)
    } else {
        let normal = polygon.normals[face];
        let s = (center - v1).dot(&normal);
        if s > r {
            return;
        }
        (normal, center - normal * s)
    };

    out.push(ContactPoint {
        normal,
        point_a,
        point_b: center - normal * r,
    });
}

/// Largest separation of `b` along the edge normals of `a`
fn find_max_separation(a: &WorldPolygon, b: &WorldPolygon) -> (usize, f32) {
    let mut best = (0, f32::NEG_INFINITY);
    for (i, (normal, vertex)) in a.normals.iter().zip(&a.vertices).enumerate() {
        let s = b
            .vertices
            .iter()
            .map(|v| normal.dot(&(*v - *vertex)))
            .fold(f32::INFINITY, f32::min);
        if s > best.1 {
            best = (i, s);
        }
    }
    best
}

/// Keeps the part of a segment on the negative side of a plane
fn clip_segment(points: [Vector2; 2], normal: Vector2, offset: f32) -> Option<[Vector2; 2]> {
    let d0 = normal.dot(&points[0]) - offset;
    let d1 = normal.dot(&points[1]) - offset;

    let mut kept = [Vector2::zero(); 2];
    let mut count = 0;

    if d0 <= 0.0 {
        kept[count] = points[0];
        count += 1;
    }
    if d1 <= 0.0 {
        kept[count] = points[1];
        count += 1;
    }
    if d0 * d1 < 0.0 && count < 2 {
        let t = d0 / (d0 - d1);
        kept[count] = points[0] + (points[1] - points[0]) * t;
        count += 1;
    }

    (count == 2).then_some(kept)
}

/// Separating axis test with reference and incident edge clipping
fn polygon_polygon(a: &WorldPolygon, b: &WorldPolygon, out: &mut Vec<ContactPoint>) {
    let (edge_a, separation_a) = find_max_separation(a, b);
    if separation_a > 0.0 {
        return;
    }
    let (edge_b, separation_b) = find_max_separation(b, a);
    if separation_b > 0.0 {
        return;
    }

    let (reference, incident, edge, flip) = if separation_b > 0.98 * separation_a + 0.001 {
        (b, a, edge_b, true)
    } else {
        (a, b, edge_a, false)
    };

    let reference_normal = reference.normals[edge];
    let incident_face = incident
        .normals
        .iter()
        .enumerate()
        .min_by(|(_, n1), (_, n2)| reference_normal.dot(n1).total_cmp(&reference_normal.dot(n2)))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let incident_edge = [
        incident.vertices[incident_face],
        incident.vertices[(incident_face + 1) % incident.len()],
    ];

    let v11 = reference.vertices[edge];
    let v12 = reference.vertices[(edge + 1) % reference.len()];
    let tangent = (v12 - v11).normalize();
    let normal = Vector2::new(tangent.y, -tangent.x);

    let front_offset = normal.dot(&v11);
    let side_offset_1 = -tangent.dot(&v11);
    let side_offset_2 = tangent.dot(&v12);

    let Some(clipped) = clip_segment(incident_edge, -tangent, side_offset_1) else { return };
    let Some(clipped) = clip_segment(clipped, tangent, side_offset_2) else { return };

    for point in clipped {
        let separation = normal.dot(&point) - front_offset;
        if separation > 0.0 {
            continue;
        }
        let on_reference = point - normal * separation;
        out.push(if flip {
            ContactPoint { normal: -normal, point_a: point, point_b: on_reference }
        } else {
            ContactPoint { normal, point_a: on_reference, point_b: point }
        });
    }
}

/// End discs plus the middle rectangle of the capsule
fn convex_capsule(polygon: &WorldPolygon, capsule: &ShapeContext, out: &mut Vec<ContactPoint>) {
    let segment = Segment::from_context(capsule);
    polygon_disc(polygon, segment.p0, segment.radius, out);
    polygon_disc(polygon, segment.p1, segment.radius, out);

    let length = segment.p0.distance(&segment.p1);
    if length <= EPSILON {
        return;
    }
    if let Ok(middle) = ConvexData::rectangle(length, 2.0 * segment.radius) {
        let middle = WorldPolygon::from_convex(&middle, capsule.position, capsule.angle);
        polygon_polygon(polygon, &middle, out);
    }
}

fn segment_intersection(a: &Segment, b: &Segment) -> Option<Vector2> {
    let r = a.p1 - a.p0;
    let s = b.p1 - b.p0;
    let denominator = r.cross(&s);
    if denominator.abs() < EPSILON {
        return None;
    }
    let q = b.p0 - a.p0;
    let t = q.cross(&s) / denominator;
    let u = q.cross(&r) / denominator;
    ((0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)).then(|| a.p0 + r * t)
}

/// Two swept segments; parallel overlaps give two contacts
fn segment_segment(a: &Segment, b: &Segment, out: &mut Vec<ContactPoint>) {
    let total = a.radius + b.radius;
    let fallback = {
        let toward = b.midpoint() - a.midpoint();
        if a.normal.dot(&toward) < 0.0 { -a.normal } else { a.normal }
    };

    let mut candidates: Vec<ContactPoint> = Vec::with_capacity(4);

    for end in [a.p0, a.p1] {
        let closest = b.closest_point(end);
        let d = closest - end;
        let distance = d.length();
        if distance <= total {
            let normal = if distance > EPSILON { d / distance } else { fallback };
            candidates.push(ContactPoint {
                normal,
                point_a: end + normal * a.radius,
                point_b: closest - normal * b.radius,
            });
        }
    }
    for end in [b.p0, b.p1] {
        let closest = a.closest_point(end);
        let d = end - closest;
        let distance = d.length();
        if distance <= total {
            let normal = if distance > EPSILON { d / distance } else { fallback };
            candidates.push(ContactPoint {
                normal,
                point_a: closest + normal * a.radius,
                point_b: end - normal * b.radius,
            });
        }
    }

    if candidates.is_empty() {
        if let Some(crossing) = segment_intersection(a, b) {
            out.push(ContactPoint {
                normal: fallback,
                point_a: crossing + fallback * a.radius,
                point_b: crossing - fallback * b.radius,
            });
        }
        return;
    }

    candidates.sort_by(|c1, c2| c2.depth().total_cmp(&c1.depth()));
    let deepest = candidates[0];
    out.push(deepest);
    if let Some(second) = candidates[1..]
        .iter()
        .find(|c| c.point_b.distance_squared(&deepest.point_b) > EPSILON)
    {
        out.push(*second);
    }
}
