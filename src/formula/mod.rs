pub mod dimacs;

use std::fmt::Debug;
use std::fmt::{self, Display, Formatter};

/// A variable, densely indexed from 0. The signed-integer interface in [`dimacs`] numbers them from 1.
#[derive(Clone, Copy, PartialOrd, Ord, PartialEq, Eq, Hash, Debug)]
pub struct Variable(pub usize);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Literal {
    Positive(Variable),
    Negative(Variable),
}

impl Literal {
    pub fn variable(&self) -> &Variable {
        match self {
            Literal::Positive(v) => v,
            Literal::Negative(v) => v,
        }
    }

    pub fn is_positive(&self) -> bool {
        match self {
            Literal::Positive(_) => true,
            Literal::Negative(_) => false,
        }
    }

    pub fn idx(&self) -> usize {
        self.variable().0
    }

    pub fn negated(&self) -> Self {
        match self {
            Literal::Positive(v) => Literal::Negative(*v),
            Literal::Negative(v) => Literal::Positive(*v),
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        match self {
            Literal::Positive(Variable(x)) => write!(f, "{}", x),
            Literal::Negative(Variable(x)) => write!(f, "!{}", x),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Clause {
    literals: Vec<Literal>,
}

impl Clause {
    pub fn new(disjuncts: impl IntoIterator<Item = Literal>) -> Self {
        Self {
            literals: disjuncts.into_iter().collect(),
        }
    }

    pub fn literals(&self) -> impl Iterator<Item = &Literal> {
        self.literals.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    /// One past the highest variable index mentioned, or 0 for the empty clause.
    pub(crate) fn variable_bound(&self) -> usize {
        self.literals.iter().map(|l| l.idx() + 1).max().unwrap_or(0)
    }
}

impl Display for Clause {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        if self.literals.len() != 1 {
            f.write_str("(")?;
        }
        let mut first_literal = true;
        for literal in &self.literals {
            if first_literal {
                first_literal = false;
            } else {
                f.write_str(" | ")?;
            }
            write!(f, "{}", literal)?;
        }
        if self.literals.len() != 1 {
            f.write_str(")")?;
        }
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct Formula {
    clauses: Vec<Clause>,
}

impl Formula {
    pub fn new(conjuncts: impl IntoIterator<Item = Clause>) -> Self {
        Self {
            clauses: conjuncts.into_iter().collect(),
        }
    }

    /// Variables are dense from 0, so this is one past the highest index mentioned.
    pub fn num_variables(&self) -> usize {
        self.clauses.iter().map(Clause::variable_bound).max().unwrap_or(0)
    }

    pub fn clauses(&self) -> impl Iterator<Item = &Clause> {
        self.clauses.iter()
    }

    pub(crate) fn into_clauses(self) -> Vec<Clause> {
        self.clauses
    }
}

impl Debug for Formula {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        let mut first_clause = true;
        for clause in &self.clauses {
            if first_clause {
                first_clause = false;
            } else {
                f.write_str(" & ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn p(x: usize) -> Literal {
    Literal::Positive(Variable(x))
}

#[cfg(test)]
pub(crate) fn n(x: usize) -> Literal {
    Literal::Negative(Variable(x))
}

#[cfg(test)]
const MAX_STRATEGY_VARIABLES: usize = 8;

#[cfg(test)]
fn literal_strategy(num_variables: usize) -> impl proptest::strategy::Strategy<Value = Literal> {
    use proptest::prelude::*;

    (0..num_variables, any::<bool>()).prop_map(|(x, positive)| if positive { p(x) } else { n(x) })
}

/// Random 3-SAT-ish formulas small enough for the brute-force reference.
#[cfg(test)]
pub(crate) fn formula_3sat_strategy() -> impl proptest::strategy::Strategy<Value = Formula> {
    use proptest::collection::vec;
    use proptest::prelude::*;

    (1..=MAX_STRATEGY_VARIABLES).prop_flat_map(|num_variables| {
        let clause = vec(literal_strategy(num_variables), 1..=3).prop_map(|literals| Clause::new(literals));
        vec(clause, 1..=4 * num_variables).prop_map(|clauses| Formula::new(clauses))
    })
}

/// Assumption lists over the same variable range as [`formula_3sat_strategy`].
#[cfg(test)]
pub(crate) fn assumptions_strategy() -> impl proptest::strategy::Strategy<Value = Vec<Literal>> {
    proptest::collection::vec(literal_strategy(MAX_STRATEGY_VARIABLES), 0..=3)
}
