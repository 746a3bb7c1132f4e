use crate::bodies::{RigidBody, MotionState};
use crate::integration::Integrator;

/// Symplectic Euler integrator (semi-implicit Euler).
///
/// Velocities are updated from the accumulated forces first and positions are
/// advanced with the new velocities. Kinematic bodies move with their current
/// velocity and static bodies are left untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymplecticEulerIntegrator;

impl SymplecticEulerIntegrator {
    /// Creates a new Symplectic Euler integrator
    pub fn new() -> Self {
        Self
    }
}

impl Integrator for SymplecticEulerIntegrator {
    fn integrate(&self, body: &mut RigidBody, dt: f32) {
        match body.motion_state {
            MotionState::Static => {}
            MotionState::Kinematic => {
                body.angle += body.angular_velocity * dt;
                body.position += body.velocity * dt;
            }
            MotionState::Dynamic => {
                if body.mass <= 0.0 {
                    return;
                }

                // Angular step
                body.angular_velocity += body.angular_force * body.inv_inertia * dt;
                body.angle += body.angular_velocity * dt;

                // Linear step
                body.velocity += body.force * (body.inv_mass * dt);
                body.position += body.velocity * dt;
            }
        }
    }

    fn name(&self) -> &str {
        "SymplecticEuler"
    }
}
