mod gs_solver;
mod island_solver;

pub use self::gs_solver::GsSolver;
pub use self::island_solver::{IslandSolver, Island};

use crate::equations::{Equation, SolverBodySet};
use std::any::Any;

/// Trait for constraint solvers.
///
/// Equations are added before each solve and removed afterwards; removing
/// hands them back with their `multiplier` filled in.
pub trait Solver: Send + Sync + 'static {
    /// Returns the name of the solver
    fn name(&self) -> &'static str;

    /// Adds an equation to be solved
    fn add_equation(&mut self, equation: Equation);

    /// Adds several equations, keeping their order
    fn add_equations(&mut self, equations: &[Equation]) {
        for equation in equations {
            self.add_equation(*equation);
        }
    }

    /// Returns the equations currently held
    fn get_equations(&self) -> &[Equation];

    /// Removes every equation and returns them in insertion order
    fn remove_all_equations(&mut self) -> Vec<Equation>;

    /// Solves the held equations for timestep `h`, updating the body velocities
    fn solve(&mut self, h: f32, bodies: &mut SolverBodySet);

    /// Returns a dynamic reference to any for downcasting
    fn as_any(&self) -> &dyn Any;

    /// Clones the solver configuration into a new box, without equations
    fn clone_solver(&self) -> Box<dyn Solver>;
}
