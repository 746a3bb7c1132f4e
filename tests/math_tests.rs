use phys2d_engine::math::{Vector2, Matrix2, Aabb};
use std::f32::consts::{FRAC_PI_2, PI};
use approx::assert_relative_eq;

#[test]
fn test_vector2_operations() {
    let v1 = Vector2::new(1.0, 2.0);
    let v2 = Vector2::new(4.0, 5.0);

    // Addition
    let sum = v1 + v2;
    assert_eq!(sum.x, 5.0);
    assert_eq!(sum.y, 7.0);

    // Subtraction
    let diff = v2 - v1;
    assert_eq!(diff.x, 3.0);
    assert_eq!(diff.y, 3.0);

    // Scalar multiplication
    let scaled = v1 * 2.0;
    assert_eq!(scaled, Vector2::new(2.0, 4.0));

    // Dot and cross product
    assert_eq!(v1.dot(&v2), 14.0);
    assert_eq!(v1.cross(&v2), 1.0 * 5.0 - 2.0 * 4.0);

    // Length
    assert_relative_eq!(v1.length(), 5.0f32.sqrt());
    assert_relative_eq!(v1.normalize().length(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_vector2_degenerate_normalize() {
    // A zero vector must not turn into NaN
    let n = Vector2::zero().normalize();
    assert!(n.is_finite());
    assert!(n.is_zero());
}

#[test]
fn test_vector2_scalar_cross() {
    let v = Vector2::new(2.0, 3.0);

    // w × v is v rotated by +90 degrees and scaled by w
    let a = Vector2::cross_zv(2.0, &v);
    assert_eq!(a, Vector2::new(-6.0, 4.0));

    // v × w is the opposite
    let b = Vector2::cross_vz(&v, 2.0);
    assert_eq!(b, Vector2::new(6.0, -4.0));
}

#[test]
fn test_vector2_rotation_and_frames() {
    let v = Vector2::unit_x();
    let rotated = v.rotate(FRAC_PI_2);
    assert_relative_eq!(rotated.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(rotated.y, 1.0, epsilon = 1e-6);

    // Local -> world -> local returns the original point
    let position = Vector2::new(3.0, -1.0);
    let angle = 0.7;
    let local = Vector2::new(0.5, 2.0);
    let world = local.to_global_frame(&position, angle);
    let back = world.to_local_frame(&position, angle);
    assert_relative_eq!(back.x, local.x, epsilon = 1e-5);
    assert_relative_eq!(back.y, local.y, epsilon = 1e-5);

    assert_relative_eq!(Vector2::from_angle(PI).angle().abs(), PI, epsilon = 1e-5);
}

#[test]
fn test_matrix2_operations() {
    let rotation = Matrix2::from_angle(FRAC_PI_2);
    let v = rotation.multiply_vector(Vector2::unit_x());
    assert_relative_eq!(v.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(v.y, 1.0, epsilon = 1e-6);

    // Rotation matrices are orthonormal
    let product = rotation.multiply_matrix(&rotation.transpose());
    let w = product.multiply_vector(Vector2::new(2.0, -3.0));
    assert_relative_eq!(w.x, 2.0, epsilon = 1e-5);
    assert_relative_eq!(w.y, -3.0, epsilon = 1e-5);
    assert_relative_eq!(rotation.determinant(), 1.0, epsilon = 1e-6);
}

#[test]
fn test_matrix2_inverse() {
    let m = Matrix2::new([[2.0, 1.0], [1.0, 3.0]]);
    let inverse = m.inverse().unwrap();
    let v = Vector2::new(1.0, -2.0);
    let back = inverse.multiply_vector(m.multiply_vector(v));
    assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
    assert_relative_eq!(back.y, v.y, epsilon = 1e-5);

    // Singular matrices have no inverse
    let singular = Matrix2::new([[1.0, 2.0], [2.0, 4.0]]);
    assert!(singular.inverse().is_none());
}

#[test]
fn test_nalgebra_interop() {
    let v = Vector2::new(1.5, -2.5);
    let na = v.to_nalgebra();
    assert_eq!(Vector2::from_nalgebra(&na), v);

    let m = Matrix2::from_angle(0.3);
    let back = Matrix2::from_nalgebra(&m.to_nalgebra());
    assert_eq!(back, m);
}

#[test]
fn test_aabb_operations() {
    let a = Aabb::new(Vector2::new(0.0, 0.0), Vector2::new(2.0, 2.0));
    let b = Aabb::from_center_half_extents(Vector2::new(2.5, 1.0), Vector2::new(1.0, 1.0));
    let c = Aabb::from_circle(Vector2::new(10.0, 10.0), 1.0);

    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
    assert!(a.contains_point(Vector2::new(1.0, 1.0)));
    assert!(!a.contains_point(Vector2::new(3.0, 1.0)));

    let union = a.union(&b);
    assert_eq!(union.min, Vector2::new(0.0, 0.0));
    assert_eq!(union.max, Vector2::new(3.5, 2.0));
    assert!(union.contains_aabb(&a));

    assert_eq!(a.center(), Vector2::new(1.0, 1.0));
    assert_eq!(a.extents(), Vector2::new(2.0, 2.0));

    // Quadrants tile the box
    let area: f32 = a.quadrants().iter().map(|q| q.extents().x * q.extents().y).sum();
    assert_relative_eq!(area, 4.0);
}
