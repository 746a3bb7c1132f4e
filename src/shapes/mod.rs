mod shape;
mod convex;

pub use self::shape::{Shape, ShapeKind, ShapeType};
pub use self::convex::{ConvexData, signed_area};
