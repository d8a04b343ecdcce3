pub mod classify;
pub mod formula;
mod model;
mod session;
mod solver;

#[cfg(test)]
mod brute_force;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SatResult {
    Satisfiable,
    Unsatisfiable,
}

/// What unit propagation alone can tell about the current assumptions.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Probe {
    /// Propagation assigned every variable without a conflict.
    Satisfiable,
    /// No conflict yet, but variables are left open.
    Unknown,
    Unsatisfiable,
}

pub use classify::{Classification, Classifier, ClassifierConfig, ClassifyError};
pub use formula::dimacs::DimacsError;
pub use formula::{Clause, Formula, Literal, Variable};
pub use model::Model;
pub use session::{Session, SessionError};
pub use solver::Solver;
