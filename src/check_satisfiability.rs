/*!

  Evaluates the irredundant clauses under the solver's current assignment, falling back to the
  saved phases for unassigned variables. This is the ground truth the walk phase's exported
  minimum is checked against: after a walk, applying the saved phases must leave exactly
  `minimum` clauses unsatisfied.

*/

use crate::{
  literal::{format_literals, Literal},
  log::log_at_level,
  solver::Solver,
  Value,
};

/// The truth value of `literal`: the assignment if defined, otherwise the saved phase of its
/// variable (negated for negative literals).
fn literal_value(solver: &Solver, literal: Literal) -> Value {
  let value = solver.values[literal.as_index()];
  if !value.is_undefined() {
    return value;
  }
  let phase = solver.phases.saved[literal.var() as usize];
  if literal.sign() {
    !phase
  } else {
    phase
  }
}

fn satisfied(solver: &Solver, literals: &[Literal]) -> bool {
  literals.iter().any(|&literal| literal_value(solver, literal).is_true())
}

/// Counts the irredundant clauses, binary and large, that the assignment-else-saved-phase
/// valuation leaves unsatisfied.
pub fn unsatisfied_clauses(solver: &Solver) -> u32 {
  let mut unsatisfied = 0u32;

  for pair in solver.binaries.iter() {
    if !satisfied(solver, &pair.lits) {
      log_at_level(3, format!("unsatisfied binary: {}", format_literals(&pair.lits)).as_str());
      unsatisfied += 1;
    }
  }

  for reference in solver.arena.references() {
    if solver.arena.is_garbage(reference) || solver.arena.is_redundant(reference) {
      continue;
    }
    let literals = solver.arena.literals(reference);
    if !satisfied(solver, literals) {
      log_at_level(3, format!("unsatisfied clause: {}", format_literals(literals)).as_str());
      unsatisfied += 1;
    }
  }

  unsatisfied
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::lifted_bool::LiftedBool;

  fn lit(v: u32, sign: bool) -> Literal {
    Literal::new(v, sign)
  }

  #[test]
  fn saved_phases_decide_unassigned_variables() {
    let mut solver = Solver::new(3);
    solver.add_clause(&[lit(0, false), lit(1, false)]).unwrap();
    solver.add_clause(&[lit(0, true), lit(1, true), lit(2, true)]).unwrap();

    solver.phases.saved[0] = LiftedBool::False;
    solver.phases.saved[1] = LiftedBool::False;
    solver.phases.saved[2] = LiftedBool::False;

    // (0 or 1) is falsified, (-0 or -1 or -2) is satisfied.
    assert_eq!(unsatisfied_clauses(&solver), 1);

    solver.phases.saved[0] = LiftedBool::True;
    assert_eq!(unsatisfied_clauses(&solver), 0);
  }

  #[test]
  fn assigned_values_override_saved_phases() {
    let mut solver = Solver::new(2);
    solver.add_clause(&[lit(0, false), lit(1, false)]).unwrap();

    solver.phases.saved[0] = LiftedBool::True;
    solver.phases.saved[1] = LiftedBool::False;
    // Variable 0 is root-fixed to false; the saved phase must not resurrect it.
    solver.values[lit(0, false).as_index()] = LiftedBool::False;
    solver.values[lit(0, true).as_index()] = LiftedBool::True;

    assert_eq!(unsatisfied_clauses(&solver), 1);
  }

  #[test]
  fn garbage_and_redundant_clauses_are_ignored() {
    let mut solver = Solver::new(3);
    solver.add_clause(&[lit(0, false), lit(1, false), lit(2, false)]).unwrap();
    let reference = solver.last_irredundant;
    solver.phases.saved[0] = LiftedBool::False;
    solver.phases.saved[1] = LiftedBool::False;
    solver.phases.saved[2] = LiftedBool::False;

    assert_eq!(unsatisfied_clauses(&solver), 1);
    solver.mark_clause_as_garbage(reference);
    assert_eq!(unsatisfied_clauses(&solver), 0);
  }
}
