use std::any::Any;

use crate::core::storage::pair_mut;
use crate::equations::{Equation, EquationKind, SolverBodySet};
use crate::solver::Solver;

/// Projected Gauss-Seidel solver.
///
/// Each sweep visits the equations in insertion order, clamps the running
/// impulse of every row into its force bounds and spreads the change into the
/// bodies' velocity accumulators. Non-convergence is not an error: the solver
/// stops after `iterations` sweeps with its best estimate.
#[derive(Debug, Clone)]
pub struct GsSolver {
    equations: Vec<Equation>,

    /// Maximum number of sweeps per solve
    pub iterations: usize,

    /// Stop when the squared sum of absolute impulse changes drops to `tolerance²`
    pub tolerance: f32,

    /// Friction rows are skipped during this many initial sweeps
    pub skip_friction_iterations: usize,

    /// Number of sweeps the last solve used
    used_iterations: usize,
}

impl GsSolver {
    /// Creates a solver with 10 iterations and zero tolerance
    pub fn new() -> Self {
        Self {
            equations: Vec::new(),
            iterations: 10,
            tolerance: 0.0,
            skip_friction_iterations: 0,
            used_iterations: 0,
        }
    }

    /// Creates a solver with the given iteration budget and tolerance
    pub fn with_iterations(iterations: usize, tolerance: f32) -> Self {
        Self {
            iterations,
            tolerance,
            ..Self::new()
        }
    }

    /// Returns the number of sweeps the last solve used
    pub fn get_used_iterations(&self) -> usize {
        self.used_iterations
    }
}

impl Default for GsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for GsSolver {
    fn name(&self) -> &'static str {
        "GSSolver"
    }

    fn add_equation(&mut self, equation: Equation) {
        if equation.enabled {
            self.equations.push(equation);
        }
    }

    fn get_equations(&self) -> &[Equation] {
        &self.equations
    }

    fn remove_all_equations(&mut self) -> Vec<Equation> {
        std::mem::take(&mut self.equations)
    }

    fn solve(&mut self, h: f32, bodies: &mut SolverBodySet) {
        self.used_iterations = 0;
        let count = self.equations.len();
        if count == 0 {
            return;
        }

        let indices: Vec<Option<(usize, usize)>> = self.equations
            .iter()
            .map(|eq| Some((bodies.index_of(eq.body_a)?, bodies.index_of(eq.body_b)?)))
            .collect();

        // Things that do not change during iteration are computed once
        let mut rhs = vec![0.0; count];
        let mut inv_c = vec![0.0; count];
        let mut lambda = vec![0.0; count];
        {
            let slice = bodies.as_slice();
            for (j, eq) in self.equations.iter_mut().enumerate() {
                let Some((ia, ib)) = indices[j] else { continue };
                eq.update_jacobian();
                if eq.timestep != h {
                    eq.update_spook_params(h);
                }
                rhs[j] = eq.compute_b(eq.a, eq.b, h, &slice[ia], &slice[ib]);
                inv_c[j] = eq.compute_inv_c(eq.eps, &slice[ia], &slice[ib]);
            }
        }

        for body in bodies.as_mut_slice() {
            body.reset_constraint_velocity();
        }

        let tolerance_squared = self.tolerance * self.tolerance;
        let slice = bodies.as_mut_slice();

        for iteration in 0..self.iterations {
            let mut delta_total = 0.0;

            for (j, eq) in self.equations.iter().enumerate() {
                let Some((ia, ib)) = indices[j] else { continue };
                if !eq.enabled {
                    continue;
                }
                if iteration < self.skip_friction_iterations && matches!(eq.kind, EquationKind::Friction(_)) {
                    continue;
                }
                let Some((bi, bj)) = pair_mut(slice, ia, ib) else { continue };

                let gw_lambda = eq.compute_gwlambda(bi, bj);
                let mut delta = inv_c[j] * (rhs[j] - gw_lambda - eq.eps * lambda[j]);

                let next = lambda[j] + delta;
                if next < eq.min_force * h {
                    delta = eq.min_force * h - lambda[j];
                } else if next > eq.max_force * h {
                    delta = eq.max_force * h - lambda[j];
                }

                lambda[j] += delta;
                delta_total += delta.abs();
                eq.add_to_wlambda(delta, bi, bj);
            }

            self.used_iterations = iteration + 1;
            if delta_total * delta_total <= tolerance_squared {
                break;
            }
        }

        for (eq, l) in self.equations.iter_mut().zip(&lambda) {
            eq.multiplier = l / h;
        }

        for body in bodies.as_mut_slice() {
            body.add_constraint_velocity();
        }

        tracing::trace!(equations = count, iterations = self.used_iterations, "gauss-seidel solve");
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_solver(&self) -> Box<dyn Solver> {
        Box::new(Self {
            equations: Vec::new(),
            ..self.clone()
        })
    }
}
