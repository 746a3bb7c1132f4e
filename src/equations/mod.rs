mod equation;
mod solver_body;

pub use self::equation::{
    Equation, EquationKind, ContactData, FrictionData,
    DEFAULT_STIFFNESS, DEFAULT_RELAXATION, DEFAULT_MAX_FORCE,
};
pub use self::solver_body::{SolverBody, SolverBodySet};
