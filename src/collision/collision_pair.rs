use crate::core::BodyHandle;

/// An unordered pair of bodies that could potentially collide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    /// The body with the smaller handle
    pub body_a: BodyHandle,

    /// The body with the larger handle
    pub body_b: BodyHandle,
}

impl CollisionPair {
    /// Creates a new collision pair
    pub fn new(body_a: BodyHandle, body_b: BodyHandle) -> Self {
        // Always sort the handles to ensure consistent ordering
        if body_a.0 <= body_b.0 {
            Self { body_a, body_b }
        } else {
            Self { body_a: body_b, body_b: body_a }
        }
    }

    /// Checks if this collision pair contains the specified body
    pub fn contains(&self, body: BodyHandle) -> bool {
        self.body_a == body || self.body_b == body
    }

    /// Returns the other body in the pair
    pub fn other(&self, body: BodyHandle) -> Option<BodyHandle> {
        if self.body_a == body {
            Some(self.body_b)
        } else if self.body_b == body {
            Some(self.body_a)
        } else {
            None
        }
    }
}

/// Flattens pairs into the `[a0, b0, a1, b1, ...]` layout the world consumes
pub fn flatten_pairs<I: IntoIterator<Item = CollisionPair>>(pairs: I) -> Vec<BodyHandle> {
    pairs.into_iter().flat_map(|p| [p.body_a, p.body_b]).collect()
}
