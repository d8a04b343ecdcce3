use crate::formula::{Clause, Formula, Literal, Variable};
use crate::model::Model;
use crate::{Probe, SatResult};
use log::trace;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Assignment {
    True,
    False,
    Undecided,
}

/// An incremental CDCL solver. Clauses may be added between calls, and every call can carry its own
/// assumptions. Learned clauses only ever follow from the clause database, so they stay valid
/// whatever the next call assumes.
pub struct Solver {
    clauses: Vec<Clause>,
    // positive minus negative occurrences in added clauses, per variable; picks the decision phase
    polarity: Vec<isize>,
    state: SolverState,
    // the clause database alone is unsatisfiable
    unsat: bool,
    model: Option<Model>,
}

#[derive(Debug)]
struct SolverState {
    variables: Vec<VariableState>,
    trail: Vec<Variable>,
    decision_level: DecisionLevel,
}

#[derive(Debug, Clone)]
struct VariableState {
    assignment: Assignment,
    reason: Option<ClauseIdx>,
    decision_level: DecisionLevel,
}

impl VariableState {
    fn literal(&self, v: Variable) -> Literal {
        match self.assignment {
            Assignment::Undecided => panic!("cannot get literal for unassigned variable"),
            Assignment::True => Literal::Positive(v),
            Assignment::False => Literal::Negative(v),
        }
    }
    fn clear(&mut self) {
        self.assignment = Assignment::Undecided;
        self.reason = None;
        self.decision_level = DecisionLevel(0);
    }
}

impl Default for VariableState {
    fn default() -> Self {
        VariableState {
            assignment: Assignment::Undecided,
            reason: None,
            decision_level: DecisionLevel(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ClauseIdx(usize);

impl SolverState {
    fn new() -> Self {
        Self {
            variables: vec![],
            trail: vec![],
            decision_level: DecisionLevel(0),
        }
    }

    fn assignment_for(&self, literal: &Literal) -> Assignment {
        match self.variables[literal.idx()].assignment {
            Assignment::True => {
                if literal.is_positive() {
                    Assignment::True
                } else {
                    Assignment::False
                }
            }
            Assignment::False => {
                if literal.is_positive() {
                    Assignment::False
                } else {
                    Assignment::True
                }
            }
            Assignment::Undecided => Assignment::Undecided,
        }
    }

    fn assign(&mut self, literal: &Literal, reason: Option<ClauseIdx>) {
        assert_eq!(self.assignment_for(literal), Assignment::Undecided);
        assert!(reason.is_some() || self.decision_level > DecisionLevel(0));

        trace!(
            "{} {} at level {}",
            match reason {
                Some(c) => format!("implied({})", c.0),
                None => "decision".to_string(),
            },
            literal,
            self.decision_level.0
        );

        self.trail.push(*literal.variable());
        let var = &mut self.variables[literal.idx()];
        var.assignment = if literal.is_positive() {
            Assignment::True
        } else {
            Assignment::False
        };
        var.reason = reason;
        var.decision_level = self.decision_level;
    }

    fn is_complete(&self) -> bool {
        self.trail.len() == self.variables.len()
    }

    fn model(&self) -> Model {
        debug_assert!(self.is_complete());
        Model::new(
            self.variables
                .iter()
                .map(|v| v.assignment == Assignment::True)
                .collect(),
        )
    }
}

#[derive(PartialEq, Eq, Clone, Debug)]
enum BcpResult {
    Conflict(ClauseIdx),
    NoConflict,
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Debug)]
struct DecisionLevel(usize);

impl DecisionLevel {
    fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug)]
struct Backtrack {
    level: DecisionLevel,
    // The index of the first decision to drop during the backtrack
    decision_index: usize,
}

impl Default for Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver {
    pub fn new() -> Self {
        Self {
            clauses: vec![],
            polarity: vec![],
            state: SolverState::new(),
            unsat: false,
            model: None,
        }
    }

    pub fn from_formula(formula: Formula) -> Self {
        let mut solver = Self::new();
        for clause in formula.into_clauses() {
            solver.add_clause(clause);
        }
        solver
    }

    pub fn num_variables(&self) -> usize {
        self.state.variables.len()
    }

    /// Only valid between calls, when nothing above the root level is assigned.
    pub fn add_clause(&mut self, clause: Clause) {
        debug_assert_eq!(self.state.decision_level, DecisionLevel(0));
        self.model = None;
        self.reserve_variables(clause.variable_bound());
        for literal in clause.literals() {
            self.polarity[literal.idx()] += if literal.is_positive() { 1 } else { -1 };
        }
        if clause.is_empty() {
            trace!("empty clause added, formula is unsatisfiable");
            self.unsat = true;
        }
        self.clauses.push(clause);
    }

    fn reserve_variables(&mut self, num_variables: usize) {
        if num_variables > self.state.variables.len() {
            self.state.variables.resize(num_variables, Default::default());
            self.polarity.resize(num_variables, 0);
        }
    }

    /// The model of the last satisfiable [`Solver::solve`] call.
    pub fn model(&self) -> Option<&Model> {
        self.model.as_ref()
    }

    pub fn solve(&mut self, assumptions: &[Literal]) -> SatResult {
        self.model = None;
        for a in assumptions {
            self.reserve_variables(a.idx() + 1);
        }
        let result = self.search(assumptions);
        if result == SatResult::Satisfiable {
            self.model = Some(self.state.model());
        }
        self.backtrack_to_root();
        trace!("solve under {:?}: {:?}", assumptions, result);
        result
    }

    /// Unit propagation under the assumptions, without any search. Leaves no assignments above the
    /// root level behind.
    pub fn probe(&mut self, assumptions: &[Literal]) -> Probe {
        for a in assumptions {
            self.reserve_variables(a.idx() + 1);
        }
        let result = self.propagate_assumptions(assumptions);
        self.backtrack_to_root();
        trace!("probe under {:?}: {:?}", assumptions, result);
        result
    }

    fn propagate_assumptions(&mut self, assumptions: &[Literal]) -> Probe {
        if self.unsat {
            return Probe::Unsatisfiable;
        }
        if let BcpResult::Conflict(_) = self.bcp() {
            self.unsat = true;
            return Probe::Unsatisfiable;
        }
        for assumption in assumptions {
            match self.state.assignment_for(assumption) {
                Assignment::True => continue,
                Assignment::False => return Probe::Unsatisfiable,
                Assignment::Undecided => {
                    self.state.decision_level = self.state.decision_level.next();
                    self.state.assign(assumption, None);
                    if let BcpResult::Conflict(_) = self.bcp() {
                        return Probe::Unsatisfiable;
                    }
                }
            }
        }
        if self.state.is_complete() {
            Probe::Satisfiable
        } else {
            Probe::Unknown
        }
    }

    // Assumption i is decided at level i + 1. An assumption that already holds still gets its
    // (empty) level, so the correspondence survives backtracking.
    fn search(&mut self, assumptions: &[Literal]) -> SatResult {
        if self.unsat {
            return SatResult::Unsatisfiable;
        }
        if let BcpResult::Conflict(_) = self.bcp() {
            self.unsat = true;
            return SatResult::Unsatisfiable;
        }
        loop {
            let level = self.state.decision_level.0;
            let decision = if level < assumptions.len() {
                let assumption = &assumptions[level];
                match self.state.assignment_for(assumption) {
                    Assignment::True => {
                        self.state.decision_level = self.state.decision_level.next();
                        continue;
                    }
                    Assignment::False => {
                        trace!("assumption {} is falsified", assumption);
                        return SatResult::Unsatisfiable;
                    }
                    Assignment::Undecided => Some(*assumption),
                }
            } else {
                self.decide()
            };

            match decision {
                None => break SatResult::Satisfiable,
                Some(literal) => {
                    self.state.decision_level = self.state.decision_level.next();
                    self.state.assign(&literal, None);
                    while let BcpResult::Conflict(reason) = self.bcp() {
                        match self.analyze_conflict(reason) {
                            None => {
                                self.unsat = true;
                                return SatResult::Unsatisfiable;
                            }
                            Some(backtrack) => self.backtrack(backtrack),
                        }
                    }
                }
            }
        }
    }

    fn bcp(&mut self) -> BcpResult {
        let mut did_work = true;
        while did_work {
            did_work = false;
            'clauses: for (idx, clause) in self.clauses.iter().enumerate() {
                let mut last_literal = None;
                'literals: for literal in clause.literals() {
                    match self.state.assignment_for(literal) {
                        // true => this clause is satisfied
                        Assignment::True => continue 'clauses,
                        // false => need to look at more literals, but we can't change the assignment
                        Assignment::False => continue 'literals,
                        // undecided => we'll be assigning this literal if it's the only undecided one
                        Assignment::Undecided => {
                            if last_literal.is_none() {
                                last_literal = Some(literal);
                            } else {
                                // Second undecided literal, can't resolve this clause
                                continue 'clauses;
                            }
                        }
                    }
                }
                // if last_literal is none, every literal was false => we have a conflict
                // otherwise we can apply unit resolution and continue
                match last_literal {
                    Some(literal) => self.state.assign(literal, Some(ClauseIdx(idx))),
                    None => return BcpResult::Conflict(ClauseIdx(idx)),
                }
                did_work = true;
            }
        }
        BcpResult::NoConflict
    }

    // Lowest unassigned variable, in the phase it mostly occurs with (ties go negative). Always
    // completing a decision this way is fine since conflict analysis will learn the opposite phase
    // when needed.
    fn decide(&self) -> Option<Literal> {
        self.state
            .variables
            .iter()
            .position(|state| state.assignment == Assignment::Undecided)
            .map(|i| {
                if self.polarity[i] > 0 {
                    Literal::Positive(Variable(i))
                } else {
                    Literal::Negative(Variable(i))
                }
            })
    }

    // First-UIP learning. Returns None when the conflict is at the root level, i.e. the clause
    // database itself is unsatisfiable.
    fn analyze_conflict(&mut self, reason: ClauseIdx) -> Option<Backtrack> {
        if self.state.decision_level == DecisionLevel(0) {
            return None;
        }

        let mut reason = &self.clauses[reason.0];
        let mut conflict_clause = vec![];
        let mut seen = vec![false; self.state.variables.len()];
        let mut frontier = 0;
        let mut trail_end = self.state.trail.len() - 1;
        let first_uip = loop {
            for l in reason.literals() {
                if seen[l.idx()] {
                    continue;
                }
                seen[l.idx()] = true;

                let var = &self.state.variables[l.idx()];
                if var.decision_level < self.state.decision_level {
                    conflict_clause.push(*l);
                } else {
                    debug_assert_eq!(var.decision_level, self.state.decision_level);
                    frontier += 1;
                }
            }

            // walk the trail back to the next variable in the frontier
            let uip = loop {
                let v = self.state.trail[trail_end];
                let old_end = trail_end;
                trail_end = trail_end.saturating_sub(1);
                if seen[v.0] {
                    break v;
                }
                debug_assert_ne!(old_end, 0);
            };

            debug_assert_eq!(self.state.variables[uip.0].decision_level, self.state.decision_level);

            frontier -= 1;
            if frontier == 0 {
                break self.state.variables[uip.0].literal(uip);
            } else {
                let clause_idx = self.state.variables[uip.0]
                    .reason
                    .expect("uip should be an implied variable");
                reason = &self.clauses[clause_idx.0];
            }
        };
        conflict_clause.push(first_uip.negated());
        let max_decision_level = self.state.variables[first_uip.idx()].decision_level;

        let decision_level = conflict_clause
            .iter()
            .map(|l| self.state.variables[l.idx()].decision_level)
            .filter(|l| *l < max_decision_level)
            .max()
            .unwrap_or(DecisionLevel(0));
        let decision_index = self
            .state
            .trail
            .iter()
            .position(|v| self.state.variables[v.0].decision_level > decision_level)
            .unwrap_or_else(|| self.state.trail.len());

        let conflict_clause = Clause::new(conflict_clause);
        trace!(
            "conflict clause {}, backtrack to level {}",
            conflict_clause,
            decision_level.0
        );
        self.clauses.push(conflict_clause);

        Some(Backtrack {
            level: decision_level,
            decision_index,
        })
    }

    fn backtrack(&mut self, backtrack: Backtrack) {
        trace!(
            "backtrack: dropping to {} from {}",
            backtrack.decision_index,
            self.state.trail.len()
        );
        assert!(backtrack.decision_index <= self.state.trail.len());
        let dropped = self.state.trail.split_off(backtrack.decision_index);
        for variable in &dropped {
            self.state.variables[variable.0].clear();
        }
        self.state.decision_level = backtrack.level;
    }

    // Root-level assignments follow from the clauses alone, so they are kept for later calls.
    fn backtrack_to_root(&mut self) {
        let decision_index = self
            .state
            .trail
            .iter()
            .position(|v| self.state.variables[v.0].decision_level > DecisionLevel(0))
            .unwrap_or_else(|| self.state.trail.len());
        self.backtrack(Backtrack {
            level: DecisionLevel(0),
            decision_index,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brute_force::solve_brute_force;
    use crate::formula::{assumptions_strategy, formula_3sat_strategy, n, p};
    use proptest::prelude::*;
    use test_env_log::test;

    fn solver_for(clauses: Vec<Clause>) -> Solver {
        Solver::from_formula(Formula::new(clauses))
    }

    #[test]
    fn solve_bcp_sat() {
        let c1 = Clause::new(vec![p(0), p(1)]);
        let c2 = Clause::new(vec![n(0)]);
        let mut solver = solver_for(vec![c1, c2]);

        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
        assert_eq!(solver.model().unwrap().to_dimacs(), vec![-1, 2]);
    }

    #[test]
    fn solve_bcp_unsat() {
        let c1 = Clause::new(vec![p(0), p(1)]);
        let c2 = Clause::new(vec![n(0)]);
        let c3 = Clause::new(vec![n(1)]);
        let mut solver = solver_for(vec![c1, c2, c3]);

        assert_eq!(solver.solve(&[]), SatResult::Unsatisfiable);
        assert!(solver.model().is_none());
    }

    #[test]
    fn solve_conflict_sat() {
        let c1 = Clause::new(vec![p(0), p(1), p(2)]);
        let c2 = Clause::new(vec![n(0), n(1), p(2)]);
        let c3 = Clause::new(vec![n(1), n(2)]);
        let mut solver = solver_for(vec![c1, c2, c3]);

        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
    }

    #[test]
    fn solve_simple() {
        // (!0 | !0 | !0) & (!0 | !1 | !1) & (!1 | 2 | 3) & (!1 | 3 | 3)
        let c1 = Clause::new(vec![n(0), n(0), n(0)]);
        let c2 = Clause::new(vec![n(0), n(1), n(1)]);
        let c3 = Clause::new(vec![n(1), p(2), p(3)]);
        let c4 = Clause::new(vec![n(1), p(3), n(3)]);
        let mut solver = solver_for(vec![c1, c2, c3, c4]);

        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
    }

    #[test]
    fn empty_clause_is_unsat() {
        let mut solver = solver_for(vec![Clause::new(vec![p(0)]), Clause::new(vec![])]);
        assert_eq!(solver.solve(&[]), SatResult::Unsatisfiable);
        assert_eq!(solver.probe(&[]), Probe::Unsatisfiable);
    }

    #[test]
    fn assumptions_do_not_persist() {
        let mut solver = solver_for(vec![Clause::new(vec![p(0), p(1)])]);

        assert_eq!(solver.solve(&[n(0), n(1)]), SatResult::Unsatisfiable);
        assert_eq!(solver.solve(&[n(0)]), SatResult::Satisfiable);
        assert_eq!(solver.model().unwrap().to_dimacs(), vec![-1, 2]);
        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
    }

    #[test]
    fn assumption_on_fresh_variable() {
        let mut solver = solver_for(vec![Clause::new(vec![n(0), p(1)])]);

        assert_eq!(solver.solve(&[p(4)]), SatResult::Satisfiable);
        assert_eq!(solver.num_variables(), 5);
        assert_eq!(solver.model().unwrap().to_dimacs(), vec![-1, 2, -3, -4, 5]);
    }

    #[test]
    fn contradictory_assumptions() {
        let mut solver = solver_for(vec![Clause::new(vec![p(0), p(1)])]);

        assert_eq!(solver.solve(&[p(2), n(2)]), SatResult::Unsatisfiable);
        assert_eq!(solver.probe(&[p(2), n(2)]), Probe::Unsatisfiable);
        assert_eq!(solver.solve(&[p(2)]), SatResult::Satisfiable);
    }

    #[test]
    fn probe_only_propagates() {
        // 0 -> 1, 1 -> 2, and (!0 | !2 | 3) & (!0 | !2 | !3) makes 0 unsat, but only through search
        let mut solver = solver_for(vec![
            Clause::new(vec![n(0), p(1)]),
            Clause::new(vec![n(1), p(2)]),
            Clause::new(vec![n(0), n(2), p(3), p(4)]),
            Clause::new(vec![n(0), n(2), n(3), p(4)]),
            Clause::new(vec![n(0), n(2), p(3), n(4)]),
            Clause::new(vec![n(0), n(2), n(3), n(4)]),
        ]);

        assert_eq!(solver.probe(&[p(0)]), Probe::Unknown);
        assert_eq!(solver.solve(&[p(0)]), SatResult::Unsatisfiable);
        // learned clauses make the next probe see it
        assert_eq!(solver.probe(&[p(0)]), Probe::Unsatisfiable);
        assert_eq!(solver.probe(&[p(0), p(2), p(3)]), Probe::Unsatisfiable);
        assert_eq!(solver.probe(&[n(0), n(1), n(2), n(3), n(4)]), Probe::Satisfiable);
        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
    }

    #[test]
    fn incremental_clauses() {
        let mut solver = solver_for(vec![Clause::new(vec![p(0), p(1)])]);
        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);

        solver.add_clause(Clause::new(vec![n(0)]));
        assert_eq!(solver.solve(&[]), SatResult::Satisfiable);
        assert_eq!(solver.model().unwrap().to_dimacs(), vec![-1, 2]);

        solver.add_clause(Clause::new(vec![n(1)]));
        assert_eq!(solver.solve(&[]), SatResult::Unsatisfiable);
        assert_eq!(solver.solve(&[p(0)]), SatResult::Unsatisfiable);
    }

    proptest! {
        #[test]
        fn proptest_solve(f in formula_3sat_strategy(), assumptions in assumptions_strategy()) {
            let brute_force = solve_brute_force(&f, &assumptions);
            let mut solver = Solver::from_formula(f.clone());
            let result = solver.solve(&assumptions);
            log::trace!("result = {:?}", result);
            prop_assert_eq!(&result, &brute_force);

            if result == SatResult::Satisfiable {
                let model = solver.model().unwrap();
                prop_assert!(f.clauses().all(|c| model.satisfies(c)));
                prop_assert!(assumptions.iter().all(|a| model.value(a) == Some(true)));
            }

            // a probe may only claim what the full answer agrees with
            match solver.probe(&assumptions) {
                Probe::Unsatisfiable => prop_assert_eq!(&brute_force, &SatResult::Unsatisfiable),
                Probe::Satisfiable => prop_assert_eq!(&brute_force, &SatResult::Satisfiable),
                Probe::Unknown => {}
            }

            // the same solver answers again after assumptions are dropped
            prop_assert_eq!(solver.solve(&[]), solve_brute_force(&f, &[]));
        }
    }
}
