use crate::formula::dimacs::{self, DimacsError};
use crate::formula::Literal;
use crate::model::Model;
use crate::solver::Solver;
use crate::{Probe, SatResult};
use log::debug;

/// A clause database plus an assumption stack, driven through signed-integer literals.
///
/// Assumptions pushed with [`Session::assume`] are *pending* until the next [`Session::test`] or
/// [`Session::solve`]. `test` turns them into a checkpoint that stays in force until the matching
/// [`Session::untest`]; `solve` uses them once and drops them.
#[derive(Default)]
pub struct Session {
    solver: Solver,
    assumptions: Vec<Literal>,
    // assumptions.len() right after each open test consumed its batch
    checkpoints: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    Literal(DimacsError),
    /// Clauses can't change while a test is open.
    TestInProgress,
}

impl From<DimacsError> for SessionError {
    fn from(e: DimacsError) -> Self {
        Self::Literal(e)
    }
}

impl Session {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_clauses<'a>(clauses: impl IntoIterator<Item = &'a [i32]>) -> Result<Self, SessionError> {
        let mut session = Self::new();
        for clause in clauses {
            session.add_clause(clause)?;
        }
        Ok(session)
    }

    /// Literals up to the first `0`; an empty clause makes the session unsatisfiable for good.
    pub fn add_clause(&mut self, literals: &[i32]) -> Result<(), SessionError> {
        if !self.checkpoints.is_empty() {
            return Err(SessionError::TestInProgress);
        }
        let clause = dimacs::clause(literals)?;
        debug!("add clause {}", clause);
        self.solver.add_clause(clause);
        Ok(())
    }

    pub fn assume(&mut self, literals: &[i32]) -> Result<(), SessionError> {
        let literals = literals
            .iter()
            .map(|&l| dimacs::literal(l))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("assume {:?}", literals);
        self.assumptions.extend(literals);
        Ok(())
    }

    /// Checkpoints the pending assumptions and propagates everything assumed so far.
    pub fn test(&mut self) -> Probe {
        self.checkpoints.push(self.assumptions.len());
        let probe = self.solver.probe(&self.assumptions);
        debug!(
            "test #{} under {} assumptions: {:?}",
            self.checkpoints.len(),
            self.assumptions.len(),
            probe
        );
        probe
    }

    /// Drops the most recent checkpoint and everything assumed since it was opened. Without an open
    /// checkpoint, only pending assumptions go. It only leaves the session untouched when there is
    /// neither an open checkpoint nor a pending assumption.
    pub fn untest(&mut self) {
        self.checkpoints.pop();
        let restore = self.committed();
        debug!("untest: {} -> {} assumptions", self.assumptions.len(), restore);
        self.assumptions.truncate(restore);
    }

    /// Solves under every checkpointed and pending assumption plus `extra`. Pending assumptions are
    /// used up.
    pub fn solve(&mut self, extra: &[i32]) -> Result<SatResult, SessionError> {
        self.assume(extra)?;
        let result = self.solver.solve(&self.assumptions);
        debug!("solve under {} assumptions: {:?}", self.assumptions.len(), result);
        self.assumptions.truncate(self.committed());
        Ok(result)
    }

    /// `None` without a model, for `0`, or for a variable the model doesn't cover.
    pub fn value(&self, literal: i32) -> Option<bool> {
        let literal = dimacs::parse_literal(literal)?;
        self.model()?.value(&literal)
    }

    /// The model of the last solve, unless it came back unsatisfiable or a clause was added since.
    pub fn model(&self) -> Option<&Model> {
        self.solver.model()
    }

    /// Assumptions held by open checkpoints.
    fn committed(&self) -> usize {
        self.checkpoints.last().copied().unwrap_or(0)
    }
}
