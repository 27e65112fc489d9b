/*!

  The per-round configuration snapshot the walker works from, taken once at setup so option
  changes mid-round can not skew the walk.

*/

use crate::{solver::Solver, LiftedBool, Value};

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub(crate) struct WalkConfig {
  /// Phase for variables never phased before.
  pub initial_phase: Value,
  /// Import target phases instead of falling straight through to saved ones.
  pub use_target: bool,
  /// Trail growth bound, `VARS/4 + 1`.
  pub trail_limit: u32,
}

impl WalkConfig {
  pub fn from_solver(solver: &Solver) -> Self {
    WalkConfig {
      initial_phase: LiftedBool::from(solver.options().initial_phase()),
      use_target: solver.is_stable() && !solver.options().warmup(),
      trail_limit: solver.num_vars() / 4 + 1,
    }
  }
}
