use crate::math::{Vector2, EPSILON};
use crate::error::PhysicsError;
use crate::Result;

/// Derived geometry of a convex polygon in shape-local space.
///
/// Vertices are kept in counter-clockwise order. Triangles fan out from the
/// first vertex and drive the area, centroid and inertia computations.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvexData {
    /// Polygon vertices, counter-clockwise
    vertices: Vec<Vector2>,

    /// Outward unit normal of edge `i -> i+1`
    normals: Vec<Vector2>,

    /// Fan triangulation as vertex index triples
    triangles: Vec<[usize; 3]>,

    /// Area-weighted centroid of the triangulation
    center_of_mass: Vector2,

    /// Polygon area
    area: f32,

    /// Largest vertex distance from the local origin
    bounding_radius: f32,
}

impl ConvexData {
    /// Builds polygon data from a vertex list.
    ///
    /// Clockwise input is reversed. Fails with `InvalidGeometry` for fewer than
    /// three vertices, non-finite coordinates, or a polygon with no area.
    pub fn new(mut vertices: Vec<Vector2>) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(PhysicsError::InvalidGeometry(
                format!("convex polygon needs at least 3 vertices, got {}", vertices.len())
            ));
        }
        if vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidGeometry("convex polygon has non-finite vertex".into()));
        }

        if signed_area(&vertices) < 0.0 {
            vertices.reverse();
        }

        let mut data = Self {
            vertices,
            normals: Vec::new(),
            triangles: Vec::new(),
            center_of_mass: Vector2::zero(),
            area: 0.0,
            bounding_radius: 0.0,
        };
        data.update_triangles();
        data.update_area();
        if data.area <= EPSILON {
            return Err(PhysicsError::InvalidGeometry("convex polygon has zero area".into()));
        }
        data.update_normals();
        data.update_center_of_mass();
        data.update_bounding_radius();

        Ok(data)
    }

    /// Builds an axis-aligned rectangle centered on the origin
    pub fn rectangle(width: f32, height: f32) -> Result<Self> {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(vec![
            Vector2::new(-hw, -hh),
            Vector2::new(hw, -hh),
            Vector2::new(hw, hh),
            Vector2::new(-hw, hh),
        ])
    }

    /// Returns the vertices, counter-clockwise
    pub fn get_vertices(&self) -> &[Vector2] {
        &self.vertices
    }

    /// Returns the outward edge normals
    pub fn get_normals(&self) -> &[Vector2] {
        &self.normals
    }

    /// Returns the fan triangulation
    pub fn get_triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    /// Returns the area-weighted centroid
    pub fn get_center_of_mass(&self) -> Vector2 {
        self.center_of_mass
    }

    /// Returns the polygon area
    pub fn get_area(&self) -> f32 {
        self.area
    }

    /// Returns the bounding radius around the local origin
    pub fn get_bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    /// Moment of inertia about the local origin for the given mass.
    ///
    /// Each triangle contributes its inertia about its own centroid plus the
    /// parallel-axis term `m_t |c_t|²`.
    pub fn moment_of_inertia(&self, mass: f32) -> f32 {
        if self.area <= 0.0 {
            return 0.0;
        }

        let mut inertia = 0.0;
        for tri in &self.triangles {
            let (a, b, c) = (self.vertices[tri[0]], self.vertices[tri[1]], self.vertices[tri[2]]);
            let tri_area = triangle_area(a, b, c);
            let centroid = (a + b + c) / 3.0;
            let m = mass * tri_area / self.area;

            let spread = (a - centroid).length_squared()
                + (b - centroid).length_squared()
                + (c - centroid).length_squared();

            inertia += m / 12.0 * spread + m * centroid.length_squared();
        }
        inertia
    }

    fn update_triangles(&mut self) {
        self.triangles = (1..self.vertices.len() - 1)
            .map(|i| [0, i, i + 1])
            .collect();
    }

    fn update_area(&mut self) {
        self.area = self.triangles
            .iter()
            .map(|t| triangle_area(self.vertices[t[0]], self.vertices[t[1]], self.vertices[t[2]]))
            .sum();
    }

    fn update_normals(&mut self) {
        let n = self.vertices.len();
        self.normals = (0..n)
            .map(|i| {
                let edge = self.vertices[(i + 1) % n] - self.vertices[i];
                Vector2::new(edge.y, -edge.x).normalize()
            })
            .collect();
    }

    fn update_center_of_mass(&mut self) {
        let mut weighted = Vector2::zero();
        for t in &self.triangles {
            let (a, b, c) = (self.vertices[t[0]], self.vertices[t[1]], self.vertices[t[2]]);
            weighted += (a + b + c) / 3.0 * triangle_area(a, b, c);
        }
        self.center_of_mass = weighted / self.area;
    }

    fn update_bounding_radius(&mut self) {
        self.bounding_radius = self.vertices
            .iter()
            .map(|v| v.length())
            .fold(0.0, f32::max);
    }
}

/// Signed polygon area, positive for counter-clockwise winding
pub fn signed_area(vertices: &[Vector2]) -> f32 {
    let n = vertices.len();
    (0..n)
        .map(|i| vertices[i].cross(&vertices[(i + 1) % n]))
        .sum::<f32>() * 0.5
}

#[inline]
fn triangle_area(a: Vector2, b: Vector2, c: Vector2) -> f32 {
    ((b - a).cross(&(c - a)) * 0.5).abs()
}
