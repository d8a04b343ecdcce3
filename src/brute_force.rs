use crate::formula::{Formula, Literal};
use crate::SatResult;

// Simple brute-force reference for the property tests
pub(crate) fn solve_brute_force(f: &Formula, assumptions: &[Literal]) -> SatResult {
    let num_variables = assumptions
        .iter()
        .map(|l| l.idx() + 1)
        .chain(std::iter::once(f.num_variables()))
        .max()
        .unwrap_or(0);
    assert!(num_variables <= 15); // just for safety

    fn assignment_for(assignment: u32, x: usize) -> bool {
        assignment & (1 << x) == 0
    }

    'search: for assignment in 0..2u32.pow(num_variables as u32) {
        for literal in assumptions {
            if assignment_for(assignment, literal.idx()) != literal.is_positive() {
                continue 'search;
            }
        }
        'clauses: for clause in f.clauses() {
            for literal in clause.literals() {
                if assignment_for(assignment, literal.idx()) == literal.is_positive() {
                    // this clause is satisfied, let's go to the next one
                    continue 'clauses;
                }
            }
            // if we got here, this clause was not satisfied, so this assignment is bogus
            continue 'search;
        }
        // if we got here, every clause was satisfied, so we're done and satisfiable
        return SatResult::Satisfiable;
    }
    // no assignment is valid
    SatResult::Unsatisfiable
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::{n, p, Clause};

    #[test]
    fn brute_force_bcp() {
        let c1 = Clause::new(vec![p(0), p(1)]);
        let c2 = Clause::new(vec![n(0)]);
        let f = Formula::new(vec![c1, c2]);

        assert_eq!(solve_brute_force(&f, &[]), SatResult::Satisfiable);
        assert_eq!(solve_brute_force(&f, &[n(1)]), SatResult::Unsatisfiable);
    }

    #[test]
    fn brute_force_unsat() {
        let c1 = Clause::new(vec![p(0), p(1)]);
        let c2 = Clause::new(vec![n(0)]);
        let c3 = Clause::new(vec![n(1)]);
        let f = Formula::new(vec![c1, c2, c3]);

        assert_eq!(solve_brute_force(&f, &[]), SatResult::Unsatisfiable);
    }

    #[test]
    fn brute_force_assumptions_only() {
        let f = Formula::new(vec![]);
        assert_eq!(solve_brute_force(&f, &[]), SatResult::Satisfiable);
        assert_eq!(solve_brute_force(&f, &[p(2), n(2)]), SatResult::Unsatisfiable);
    }
}
