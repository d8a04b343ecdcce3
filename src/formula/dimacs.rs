//! The signed-integer literal convention: `i` is variable `i` true, `-i` is it false, variables count
//! from 1 and `0` terminates a clause.

use crate::formula::{Clause, Literal, Variable};

/// `None` for the terminator.
pub fn parse_literal(l: i32) -> Option<Literal> {
    let idx = l.unsigned_abs() as usize;
    if l > 0 {
        Some(Literal::Positive(Variable(idx - 1)))
    } else if l < 0 {
        Some(Literal::Negative(Variable(idx - 1)))
    } else {
        None
    }
}

/// Largest variable accepted from input. The solver keeps per-variable tables up to the largest
/// variable it has seen.
pub const MAX_VARIABLE: u32 = 1 << 20;

/// Like [`parse_literal`] but for places where a terminator makes no sense.
pub fn literal(l: i32) -> Result<Literal, DimacsError> {
    if l.unsigned_abs() > MAX_VARIABLE {
        return Err(DimacsError::VariableOutOfRange(l));
    }
    parse_literal(l).ok_or(DimacsError::ZeroLiteral)
}

/// Reads literals up to the first `0` (or the end of the slice); anything after the terminator is
/// ignored.
pub fn clause(literals: &[i32]) -> Result<Clause, DimacsError> {
    let literals = literals
        .iter()
        .take_while(|&&l| l != 0)
        .map(|&l| literal(l))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Clause::new(literals))
}

pub fn to_dimacs(literal: &Literal) -> i32 {
    let x = (literal.idx() + 1) as i32;
    if literal.is_positive() {
        x
    } else {
        -x
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DimacsError {
    ZeroLiteral,
    /// The literal names a variable above [`MAX_VARIABLE`].
    VariableOutOfRange(i32),
}
