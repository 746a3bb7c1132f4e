use std::any::Any;
use std::collections::VecDeque;

use crate::equations::{Equation, SolverBody, SolverBodySet};
use crate::solver::{GsSolver, Solver};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A connected group of bodies and the equations between them.
///
/// Indices refer to the solver body set and equation list of one solve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Island {
    /// Non-static bodies of the island
    pub bodies: Vec<usize>,

    /// Equations of the island, in global insertion order
    pub equations: Vec<usize>,
}

/// What one island solve hands back to the island solver
struct IslandResult {
    equations: Vec<(usize, Equation)>,
    bodies: Vec<SolverBody>,
}

/// Splits the equation graph into islands and solves each one with a subsolver.
///
/// Static bodies never start a traversal and do not connect islands, so two
/// stacks resting on the same ground are solved independently. Because each
/// island keeps its equations in global order, the result matches solving the
/// whole system with the subsolver at once.
pub struct IslandSolver {
    equations: Vec<Equation>,
    subsolver: Box<dyn Solver>,
    islands: Vec<Island>,
}

impl IslandSolver {
    /// Creates an island solver using the given subsolver
    pub fn new(subsolver: Box<dyn Solver>) -> Self {
        Self {
            equations: Vec::new(),
            subsolver,
            islands: Vec::new(),
        }
    }

    /// Returns the number of islands found by the last solve
    pub fn num_islands(&self) -> usize {
        self.islands.len()
    }

    /// Returns the islands found by the last solve
    pub fn get_islands(&self) -> &[Island] {
        &self.islands
    }

    /// Returns the subsolver
    pub fn get_subsolver(&self) -> &dyn Solver {
        self.subsolver.as_ref()
    }

    /// Partitions bodies and equations into islands with a breadth-first search
    pub fn split(equations: &[Equation], bodies: &SolverBodySet) -> Vec<Island> {
        let body_slice = bodies.as_slice();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); body_slice.len()];
        let mut ends: Vec<Option<(usize, usize)>> = Vec::with_capacity(equations.len());

        for (k, eq) in equations.iter().enumerate() {
            let pair = match (bodies.index_of(eq.body_a), bodies.index_of(eq.body_b)) {
                (Some(a), Some(b)) if eq.enabled => Some((a, b)),
                _ => None,
            };
            if let Some((a, b)) = pair {
                adjacency[a].push(k);
                adjacency[b].push(k);
            }
            ends.push(pair);
        }

        let mut visited = vec![false; body_slice.len()];
        let mut equation_seen = vec![false; equations.len()];
        let mut islands = Vec::new();
        let mut queue = VecDeque::new();

        for root in 0..body_slice.len() {
            if visited[root] || body_slice[root].motion_state.is_static() {
                continue;
            }

            let mut island = Island::default();
            visited[root] = true;
            queue.push_back(root);

            while let Some(node) = queue.pop_front() {
                island.bodies.push(node);

                for &k in &adjacency[node] {
                    if !equation_seen[k] {
                        equation_seen[k] = true;
                        island.equations.push(k);
                    }

                    let Some((a, b)) = ends[k] else { continue };
                    let other = if a == node { b } else { a };
                    if !visited[other] && !body_slice[other].motion_state.is_static() {
                        visited[other] = true;
                        queue.push_back(other);
                    }
                }
            }

            island.equations.sort_unstable();
            islands.push(island);
        }

        islands
    }

    fn solve_island(&self, h: f32, island: &Island, bodies: &SolverBodySet) -> IslandResult {
        let mut subsolver = self.subsolver.clone_solver();
        let mut island_bodies = SolverBodySet::new();
        let body_slice = bodies.as_slice();

        for &i in &island.bodies {
            island_bodies.push(body_slice[i]);
        }
        for &k in &island.equations {
            let eq = &self.equations[k];
            for handle in [eq.body_a, eq.body_b] {
                if let Some(body) = bodies.get(handle) {
                    island_bodies.push(*body);
                }
            }
            subsolver.add_equation(*eq);
        }

        subsolver.solve(h, &mut island_bodies);

        IslandResult {
            equations: island.equations.iter().copied().zip(subsolver.remove_all_equations()).collect(),
            bodies: island_bodies
                .as_slice()
                .iter()
                .filter(|b| !b.motion_state.is_static())
                .copied()
                .collect(),
        }
    }
}

impl Default for IslandSolver {
    fn default() -> Self {
        Self::new(Box::new(GsSolver::new()))
    }
}

impl Solver for IslandSolver {
    fn name(&self) -> &'static str {
        "IslandSolver"
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
        let islands = Self::split(&self.equations, bodies);
        let active: Vec<&Island> = islands.iter().filter(|island| !island.equations.is_empty()).collect();
        let this: &Self = self;
        let snapshot: &SolverBodySet = bodies;

        #[cfg(feature = "parallel")]
        let results: Vec<IslandResult> = active
            .par_iter()
            .map(|island| this.solve_island(h, island, snapshot))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<IslandResult> = active
            .iter()
            .map(|island| this.solve_island(h, island, snapshot))
            .collect();

        for result in results {
            for (k, eq) in result.equations {
                self.equations[k] = eq;
            }
            for body in result.bodies {
                if let Some(i) = bodies.index_of(body.handle) {
                    bodies.as_mut_slice()[i] = body;
                }
            }
        }

        tracing::trace!(islands = islands.len(), equations = self.equations.len(), "island solve");
        self.islands = islands;
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_solver(&self) -> Box<dyn Solver> {
        Box::new(Self::new(self.subsolver.clone_solver()))
    }
}
