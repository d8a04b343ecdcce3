use crate::formula::dimacs::to_dimacs;
use crate::formula::{Clause, Literal, Variable};
use std::fmt::{self, Display, Formatter};

/// A complete assignment, one value per variable.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Model {
    values: Vec<bool>,
}

impl Model {
    pub(crate) fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// `None` if the literal's variable is beyond the model.
    pub fn value(&self, literal: &Literal) -> Option<bool> {
        self.values
            .get(literal.idx())
            .map(|&v| v == literal.is_positive())
    }

    pub fn satisfies(&self, clause: &Clause) -> bool {
        clause.literals().any(|l| self.value(l) == Some(true))
    }

    /// The true literal of every variable, in variable order.
    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values.iter().enumerate().map(|(i, &v)| {
            if v {
                Literal::Positive(Variable(i))
            } else {
                Literal::Negative(Variable(i))
            }
        })
    }

    /// Position `i - 1` holds `i` or `-i`.
    pub fn to_dimacs(&self) -> Vec<i32> {
        self.literals().map(|l| to_dimacs(&l)).collect()
    }
}

impl Display for Model {
    fn fmt(&self, f: &mut Formatter) -> Result<(), fmt::Error> {
        f.write_str("v")?;
        for l in self.to_dimacs() {
            write!(f, " {}", l)?;
        }
        f.write_str(" 0")
    }
}
