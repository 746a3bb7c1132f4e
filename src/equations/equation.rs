use crate::core::BodyHandle;
use crate::equations::SolverBody;
use crate::math::Vector2;

/// Default stiffness of a new equation
pub const DEFAULT_STIFFNESS: f32 = 1.0e6;

/// Default relaxation (number of steps to stabilize) of a new equation
pub const DEFAULT_RELAXATION: f32 = 4.0;

/// Default force bound of a generic equation
pub const DEFAULT_MAX_FORCE: f32 = 1.0e6;

/// Geometry of a contact row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactData {
    /// Lever arm from the centre of body A to its contact point
    pub ri: Vector2,

    /// Lever arm from the centre of body B to its contact point
    pub rj: Vector2,

    /// Contact normal, pointing out of body A
    pub ni: Vector2,

    /// Coefficient of restitution
    pub restitution: f32,

    /// True if the shapes did not touch during the previous step
    pub first_impact: bool,

    /// Shape id on body A
    pub shape_a: u32,

    /// Shape id on body B
    pub shape_b: u32,
}

impl ContactData {
    /// Creates contact data without shape identity, used by joint limits
    pub fn new(ri: Vector2, rj: Vector2, ni: Vector2) -> Self {
        Self { ri, rj, ni, restitution: 0.0, first_impact: false, shape_a: 0, shape_b: 0 }
    }
}

/// Geometry of a friction row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrictionData {
    /// Lever arm from the centre of body A to the contact point
    pub ri: Vector2,

    /// Lever arm from the centre of body B to the contact point
    pub rj: Vector2,

    /// Tangent direction
    pub t: Vector2,

    /// Friction coefficient the slip force was derived from
    pub friction_coefficient: f32,

    /// Shape id on body A
    pub shape_a: u32,

    /// Shape id on body B
    pub shape_b: u32,
}

/// The kind of constraint row, with its kind-specific data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EquationKind {
    /// Jacobian supplied by a constraint, along with its position error
    Generic { position_error: f32 },

    /// Non-penetration along a contact normal
    Contact(ContactData),

    /// Tangential friction at a contact
    Friction(FrictionData),

    /// Keeps `angle_b - angle_a` at `angle`
    RotationalLock { angle: f32 },

    /// Drives `ratio * w_b - w_a` towards `-relative_velocity`
    RotationalVelocity { ratio: f32 },
}

/// One scalar constraint row between two bodies.
///
/// The Jacobian `g` is laid out as `[vA.x, vA.y, wA, vB.x, vB.y, wB]`. The
/// SPOOK parameters `a`, `b` and `eps` are derived from `stiffness` and
/// `relaxation` for the cached `timestep`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Equation {
    pub body_a: BodyHandle,
    pub body_b: BodyHandle,
    pub g: [f32; 6],
    pub min_force: f32,
    pub max_force: f32,
    pub stiffness: f32,
    pub relaxation: f32,
    pub a: f32,
    pub b: f32,
    pub eps: f32,

    /// Timestep the SPOOK parameters were computed for
    pub timestep: f32,

    /// Last solved force (impulse divided by the timestep)
    pub multiplier: f32,

    /// Velocity offset added to `G W`, used by motors and moving surfaces
    pub relative_velocity: f32,

    pub enabled: bool,
    pub kind: EquationKind,
}

impl Equation {
    /// Creates a generic equation with the given force bounds
    pub fn new(body_a: BodyHandle, body_b: BodyHandle, min_force: f32, max_force: f32) -> Self {
        Self {
            body_a,
            body_b,
            g: [0.0; 6],
            min_force,
            max_force,
            stiffness: DEFAULT_STIFFNESS,
            relaxation: DEFAULT_RELAXATION,
            a: 0.0,
            b: 0.0,
            eps: 0.0,
            timestep: -1.0,
            multiplier: 0.0,
            relative_velocity: 0.0,
            enabled: true,
            kind: EquationKind::Generic { position_error: 0.0 },
        }
    }

    /// Creates a push-only contact row
    pub fn contact(body_a: BodyHandle, body_b: BodyHandle, data: ContactData) -> Self {
        let mut eq = Self::new(body_a, body_b, 0.0, f32::MAX);
        eq.kind = EquationKind::Contact(data);
        eq.update_jacobian();
        eq
    }

    /// Creates a friction row bounded by `±slip_force`
    pub fn friction(body_a: BodyHandle, body_b: BodyHandle, data: FrictionData, slip_force: f32) -> Self {
        let mut eq = Self::new(body_a, body_b, -slip_force, slip_force);
        eq.kind = EquationKind::Friction(data);
        eq.update_jacobian();
        eq
    }

    /// Creates a rotational lock row
    pub fn rotational_lock(body_a: BodyHandle, body_b: BodyHandle, angle: f32) -> Self {
        let mut eq = Self::new(body_a, body_b, -f32::MAX, f32::MAX);
        eq.kind = EquationKind::RotationalLock { angle };
        eq.update_jacobian();
        eq
    }

    /// Creates a rotational velocity row
    pub fn rotational_velocity(body_a: BodyHandle, body_b: BodyHandle, ratio: f32) -> Self {
        let mut eq = Self::new(body_a, body_b, -f32::MAX, f32::MAX);
        eq.kind = EquationKind::RotationalVelocity { ratio };
        eq.update_jacobian();
        eq
    }

    /// Sets the stiffness and relaxation; the SPOOK parameters refresh on the next solve
    pub fn set_stiffness(&mut self, stiffness: f32, relaxation: f32) {
        self.stiffness = stiffness;
        self.relaxation = relaxation;
        self.timestep = -1.0;
    }

    /// Sets symmetric force bounds
    pub fn set_max_force(&mut self, max_force: f32) {
        self.min_force = -max_force;
        self.max_force = max_force;
    }

    /// Returns the contact data of a contact row
    pub fn contact_data(&self) -> Option<&ContactData> {
        match &self.kind {
            EquationKind::Contact(data) => Some(data),
            _ => None,
        }
    }

    /// Returns the friction data of a friction row
    pub fn friction_data(&self) -> Option<&FrictionData> {
        match &self.kind {
            EquationKind::Friction(data) => Some(data),
            _ => None,
        }
    }

    /// Recomputes `a`, `b` and `eps` for the timestep `h`
    pub fn update_spook_params(&mut self, h: f32) {
        let k = self.stiffness;
        let d = self.relaxation;
        self.a = 4.0 / (h * (1.0 + 4.0 * d));
        self.b = (4.0 * d) / (1.0 + 4.0 * d);
        self.eps = 4.0 / (h * h * k * (1.0 + 4.0 * d));
        self.timestep = h;
    }

    /// Refreshes the Jacobian from the kind-specific geometry
    pub fn update_jacobian(&mut self) {
        match self.kind {
            EquationKind::Contact(ContactData { ri, rj, ni, .. }) => {
                self.g = [-ni.x, -ni.y, -ri.cross(&ni), ni.x, ni.y, rj.cross(&ni)];
            }
            EquationKind::Friction(FrictionData { ri, rj, t, .. }) => {
                self.g = [-t.x, -t.y, -ri.cross(&t), t.x, t.y, rj.cross(&t)];
            }
            EquationKind::RotationalLock { .. } => {
                self.g = [0.0, 0.0, 1.0, 0.0, 0.0, -1.0];
            }
            EquationKind::RotationalVelocity { ratio } => {
                self.g = [0.0, 0.0, -1.0, 0.0, 0.0, ratio];
            }
            EquationKind::Generic { .. } => {}
        }
    }

    /// Constraint position error
    pub fn compute_gq(&self, bi: &SolverBody, bj: &SolverBody) -> f32 {
        match self.kind {
            EquationKind::Contact(ContactData { ri, rj, ni, .. }) => {
                let penetration = bj.position + rj - bi.position - ri;
                ni.dot(&penetration)
            }
            EquationKind::RotationalLock { angle } => (bi.angle + angle - bj.angle).sin(),
            EquationKind::Generic { position_error } => position_error,
            EquationKind::Friction(_) | EquationKind::RotationalVelocity { .. } => 0.0,
        }
    }

    /// Right hand side of the impulse equation: `-Gq a - GW b - h GiMf`
    pub fn compute_b(&self, a: f32, b: f32, h: f32, bi: &SolverBody, bj: &SolverBody) -> f32 {
        let gimf = self.compute_gimf(bi, bj);

        if let EquationKind::Contact(data) = &self.kind {
            if data.first_impact && data.restitution != 0.0 {
                // Position error is ignored so the bounce is not amplified by stabilization
                return -(1.0 + data.restitution) * self.compute_gw(bi, bj) - h * gimf;
            }
        }

        let gq = self.compute_gq(bi, bj);
        let gw = self.compute_gw(bi, bj);
        -gq * a - gw * b - h * gimf
    }

    /// Multiplies the Jacobian with a pair of velocity-like vectors
    #[inline]
    pub fn gmult(&self, vi: Vector2, wi: f32, vj: Vector2, wj: f32) -> f32 {
        let g = &self.g;
        g[0] * vi.x + g[1] * vi.y + g[2] * wi + g[3] * vj.x + g[4] * vj.y + g[5] * wj
    }

    /// Constraint velocity `G W` plus the relative velocity offset
    pub fn compute_gw(&self, bi: &SolverBody, bj: &SolverBody) -> f32 {
        self.gmult(bi.velocity, bi.angular_velocity, bj.velocity, bj.angular_velocity) + self.relative_velocity
    }

    /// Constraint velocity of the solver accumulators only
    pub fn compute_gwlambda(&self, bi: &SolverBody, bj: &SolverBody) -> f32 {
        self.gmult(bi.vlambda, bi.wlambda, bj.vlambda, bj.wlambda)
    }

    /// Constraint-space response to the accumulated forces, `G M^-1 f`
    pub fn compute_gimf(&self, bi: &SolverBody, bj: &SolverBody) -> f32 {
        self.gmult(
            bi.force * bi.inv_mass,
            bi.angular_force * bi.inv_inertia,
            bj.force * bj.inv_mass,
            bj.angular_force * bj.inv_inertia,
        )
    }

    /// Effective inverse mass `G M^-1 G^T`
    pub fn compute_gimgt(&self, bi: &SolverBody, bj: &SolverBody) -> f32 {
        let g = &self.g;
        bi.inv_mass * (g[0] * g[0] + g[1] * g[1])
            + g[2] * g[2] * bi.inv_inertia
            + bj.inv_mass * (g[3] * g[3] + g[4] * g[4])
            + g[5] * g[5] * bj.inv_inertia
    }

    /// Inverse of `G M^-1 G^T + eps`, zero when the denominator is degenerate
    pub fn compute_inv_c(&self, eps: f32, bi: &SolverBody, bj: &SolverBody) -> f32 {
        let denominator = self.compute_gimgt(bi, bj) + eps;
        if denominator > 0.0 && denominator.is_finite() {
            1.0 / denominator
        } else {
            0.0
        }
    }

    /// Applies a scalar impulse to both bodies' velocity accumulators
    pub fn add_to_wlambda(&self, delta: f32, bi: &mut SolverBody, bj: &mut SolverBody) {
        let g = &self.g;
        bi.vlambda += Vector2::new(g[0], g[1]) * (bi.inv_mass * delta);
        bi.wlambda += bi.inv_inertia * g[2] * delta;
        bj.vlambda += Vector2::new(g[3], g[4]) * (bj.inv_mass * delta);
        bj.wlambda += bj.inv_inertia * g[5] * delta;
    }
}
