/// The solver-as-oracle boundary.
mod solver;

/// Bundled exact 0/1 branch-and-bound backend.
mod branch_bound;

/// Secondary structures and Pareto dominance.
mod structure;

/// Decision variables, constraints and objectives of the integer program.
mod model;

/// Epsilon-constraint walk along the Pareto frontier.
mod walker;

pub use solver::*;
pub use branch_bound::*;
pub use structure::*;
pub use model::*;
pub use walker::*;
