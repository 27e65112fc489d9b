/*!

  The host solver surface the walk phase runs against: variables and their activity flags, the
  three-valued assignment, phase memory, the clause arena with its irredundant boundary, binary
  clauses, watch lists, options, statistics counters, the random seed and the resource limit.

  `walk` is the entry point of the whole phase. It gates on the 31-bit reference limit, flips
  the solver into simplification mode for the duration, and otherwise confines its side effects
  to phase memory, garbage flags on satisfied clauses, and statistics.

*/

use crate::{
  clause::{ClauseArena, ClauseReference, INVALID_REF},
  config::Options,
  data_structures::Statistics,
  errors::Error,
  lifted_bool::LiftedBool,
  literal::Literal,
  local_search::{Walker, MAX_WALK_REF},
  log::{phase_report, very_verbose},
  log_assert,
  resource_limit::ResourceLimit,
  watched::Watches,
  UIntSet,
  ValueVector,
};

/// Typed statistics counters; folded into the crate-level `Statistics` map for reporting.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct Counts {
  pub walks              : u64,
  pub walk_steps         : u64,
  pub flipped            : u64,
  pub walk_decisions     : u64,
  pub walk_improved      : u64,
  pub search_ticks       : u64,
  pub clauses_binary     : u64,
  pub clauses_irredundant: u64,
}

impl Counts {
  /// Number of irredundant clauses, binary and large together.
  pub fn binary_and_irredundant(&self) -> u64 {
    self.clauses_binary + self.clauses_irredundant
  }

  pub fn collect_statistics(&self, statistics: &mut Statistics) {
    statistics.insert("walk-rounds", self.walks.into());
    statistics.insert("walk-steps", self.walk_steps.into());
    statistics.insert("walk-flipped", self.flipped.into());
    statistics.insert("walk-decisions", self.walk_decisions.into());
    statistics.insert("walk-improved", self.walk_improved.into());
    statistics.insert("search-ticks", self.search_ticks.into());
  }
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum SearchMode {
  Search,
  Simplify,
}

/// Per-variable phase memory. `saved` is the long-term memory the walker exports improved
/// assignments into; `target` is the stable-mode rephasing target.
#[derive(Clone, Debug, Default)]
pub struct Phases {
  pub saved : ValueVector,
  pub target: ValueVector,
}

/// One irredundant binary clause, stored out of line from the arena.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct LitPair {
  pub lits: [Literal; 2],
}

pub struct Solver {
  variable_count: u32,

  pub(crate) active  : UIntSet,
  pub(crate) values  : ValueVector, // literal indexed
  pub(crate) phases  : Phases,      // variable indexed
  pub(crate) stable  : bool,
  pub(crate) binaries: Vec<LitPair>,
  pub(crate) arena   : ClauseArena,
  pub(crate) last_irredundant: ClauseReference,
  pub(crate) watches : Watches,
  pub(crate) options : Options,
  pub(crate) counts  : Counts,
  pub(crate) random  : u64,
  pub(crate) limit   : ResourceLimit,

  mode: SearchMode,
}

impl Solver {
  pub fn new(variable_count: u32) -> Self {
    let literal_count = 2 * variable_count as usize;
    let mut active = UIntSet::new();
    for variable in 0..variable_count {
      active.insert(variable as usize);
    }
    Solver {
      variable_count,
      active,
      values: vec![LiftedBool::Undefined; literal_count],
      phases: Phases {
        saved : vec![LiftedBool::Undefined; variable_count as usize],
        target: vec![LiftedBool::Undefined; variable_count as usize],
      },
      stable: false,
      binaries: Vec::new(),
      arena: ClauseArena::new(),
      last_irredundant: INVALID_REF,
      watches: Watches::new(literal_count),
      options: Options::default(),
      counts: Counts::default(),
      random: 0,
      limit: ResourceLimit::new(),
      mode: SearchMode::Search,
    }
  }

  // region accessors

  pub fn num_vars(&self) -> u32 {
    self.variable_count
  }

  pub fn num_lits(&self) -> u32 {
    2 * self.variable_count
  }

  pub fn is_active(&self, variable: u32) -> bool {
    self.active.contains(variable as usize)
  }

  pub fn counts(&self) -> &Counts {
    &self.counts
  }

  pub fn options(&self) -> &Options {
    &self.options
  }

  pub fn options_mut(&mut self) -> &mut Options {
    &mut self.options
  }

  pub fn limit_mut(&mut self) -> &mut ResourceLimit {
    &mut self.limit
  }

  pub fn phases(&self) -> &Phases {
    &self.phases
  }

  pub fn mode(&self) -> SearchMode {
    self.mode
  }

  pub fn is_stable(&self) -> bool {
    self.stable
  }

  pub fn set_stable(&mut self, stable: bool) {
    self.stable = stable;
  }

  pub fn set_random_seed(&mut self, seed: u64) {
    self.random = seed;
  }

  pub fn collect_statistics(&self, statistics: &mut Statistics) {
    self.counts.collect_statistics(statistics);
  }

  // endregion accessors

  // region clause ingestion

  /// Adds one irredundant clause. Unit clauses fix their variable at the root and deactivate
  /// it; binary clauses go to the binary store; everything longer goes to the arena.
  pub fn add_clause(&mut self, literals: &[Literal]) -> Result<(), Error> {
    for literal in literals {
      if literal.var() >= self.variable_count {
        return Err(Error::LiteralOutOfRange(literal.index()));
      }
    }
    match literals.len() {
      0 => Err(Error::EmptyClause),
      1 => {
        let literal = literals[0];
        self.values[literal.as_index()] = LiftedBool::True;
        self.values[(!literal).as_index()] = LiftedBool::False;
        self.active.remove(literal.var() as usize);
        Ok(())
      }
      2 => {
        self.binaries.push(LitPair {
          lits: [literals[0], literals[1]],
        });
        self.counts.clauses_binary += 1;
        Ok(())
      }
      _ => {
        let reference = self.arena.push_clause(literals, false);
        self.last_irredundant = reference;
        self.counts.clauses_irredundant += 1;
        Ok(())
      }
    }
  }

  /// Permanently removes a clause; the arena keeps its words but every consumer skips it.
  pub fn mark_clause_as_garbage(&mut self, reference: ClauseReference) {
    log_assert!(!self.arena.is_garbage(reference));
    self.arena.mark_garbage(reference);
    self.counts.clauses_irredundant -= 1;
  }

  // endregion clause ingestion

  // region dense mode

  /// Reshapes the watch lists for walking: afterwards every list is empty and ready to hold
  /// bare counter references only.
  fn enter_dense_mode(&mut self) {
    self.watches.clear_all();
  }

  fn resume_sparse_mode(&mut self) {
    self.watches.clear_all();
  }

  // endregion dense mode

  /// Minimal warm-up collaborator: refreshes undefined target phases from the saved ones so a
  /// warmed-up stable round starts from remembered phases.
  fn warmup(&mut self) {
    let mut refreshed = 0u32;
    for variable in 0..self.variable_count as usize {
      if !self.active.contains(variable) {
        continue;
      }
      if self.phases.target[variable].is_undefined() {
        self.phases.target[variable] = self.phases.saved[variable];
        refreshed += 1;
      }
    }
    very_verbose(format!("warm-up refreshed {} target phases", refreshed).as_str());
  }

  fn stop_search_and_start_simplifier(&mut self) {
    log_assert!(self.mode == SearchMode::Search);
    self.mode = SearchMode::Simplify;
  }

  fn stop_simplifier_and_resume_search(&mut self) {
    log_assert!(self.mode == SearchMode::Simplify);
    self.mode = SearchMode::Search;
  }

  // region walking

  /// Whether the walk phase can run at all: both the arena offset of the last irredundant
  /// clause and the irredundant clause count must fit into a 31-bit counter reference.
  pub fn walking_possible(&self) -> bool {
    let last_irredundant = if self.last_irredundant == INVALID_REF {
      self.arena.end()
    } else {
      self.last_irredundant
    };

    if last_irredundant > MAX_WALK_REF {
      very_verbose(
        format!(
          "can not walk since last irredundant clause reference {} too large",
          last_irredundant
        )
        .as_str(),
      );
      return false;
    }

    let clauses = self.counts.binary_and_irredundant();
    if clauses > MAX_WALK_REF as u64 {
      very_verbose(format!("can not walk due to way too many irredundant clauses {}", clauses).as_str());
      return false;
    }

    true
  }

  /// Runs one walking phase. Side effects are confined to phase memory, garbage flags on
  /// satisfied clauses, and statistics counters.
  pub fn walk(&mut self) {
    let walks = self.counts.walks;

    let last_irredundant = if self.last_irredundant == INVALID_REF {
      self.arena.end()
    } else {
      self.last_irredundant
    };
    if last_irredundant > MAX_WALK_REF {
      phase_report(
        walks,
        format!(":skip last irredundant clause reference {} too large", last_irredundant).as_str(),
      );
      return;
    }

    let clauses = self.counts.binary_and_irredundant();
    if clauses > MAX_WALK_REF as u64 {
      phase_report(walks, format!(":skip way too many irredundant clauses {}", clauses).as_str());
      return;
    }

    if self.options.warmup() {
      self.warmup();
    }

    self.stop_search_and_start_simplifier();
    self.walking_phase();
    self.stop_simplifier_and_resume_search();
  }

  fn walking_phase(&mut self) {
    self.counts.walks += 1;
    self.enter_dense_mode();

    let mut walker = Walker::new(self);
    walker.init_limit(self);
    walker.local_search_round(self);
    walker.save_final_minimum(self);

    #[cfg(feature = "debug")]
    let expected = walker.minimum();

    walker.release(self);
    self.resume_sparse_mode();

    #[cfg(feature = "debug")]
    log_assert!(crate::check_satisfiability::unsatisfied_clauses(self) == expected);
  }

  // endregion walking
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::literal::Literal;

  fn lit(v: u32, sign: bool) -> Literal {
    Literal::new(v, sign)
  }

  #[test]
  fn clause_ingestion_routes_by_size() {
    let mut solver = Solver::new(4);
    solver.add_clause(&[lit(0, false)]).unwrap();
    solver.add_clause(&[lit(1, false), lit(2, true)]).unwrap();
    solver.add_clause(&[lit(1, false), lit(2, false), lit(3, false)]).unwrap();

    assert!(!solver.is_active(0));
    assert!(solver.values[lit(0, false).as_index()].is_true());
    assert_eq!(solver.counts().clauses_binary, 1);
    assert_eq!(solver.counts().clauses_irredundant, 1);
    assert_eq!(solver.last_irredundant, 0);
  }

  #[test]
  fn empty_and_out_of_range_clauses_are_rejected() {
    let mut solver = Solver::new(2);
    assert!(matches!(solver.add_clause(&[]), Err(Error::EmptyClause)));
    assert!(matches!(
      solver.add_clause(&[lit(5, false)]),
      Err(Error::LiteralOutOfRange(_))
    ));
  }

  #[test]
  fn garbage_marking_updates_the_irredundant_count() {
    let mut solver = Solver::new(3);
    solver.add_clause(&[lit(0, false), lit(1, false), lit(2, false)]).unwrap();
    let reference = solver.last_irredundant;
    solver.mark_clause_as_garbage(reference);
    assert!(solver.arena.is_garbage(reference));
    assert_eq!(solver.counts().clauses_irredundant, 0);
  }

  #[test]
  fn too_many_clauses_refuse_to_walk_without_touching_phases() {
    let mut solver = Solver::new(2);
    solver.add_clause(&[lit(0, false), lit(1, false), lit(0, true)]).unwrap();

    solver.counts.clauses_binary = 1u64 << 31;
    assert!(!solver.walking_possible());

    let phases_before = solver.phases.saved.clone();
    let walks_before = solver.counts.walks;
    solver.walk();
    assert_eq!(solver.phases.saved, phases_before);
    assert_eq!(solver.counts.walks, walks_before);
    assert_eq!(solver.mode(), SearchMode::Search);
  }

  #[test]
  fn statistics_fold_into_the_report_map() {
    let mut solver = Solver::new(1);
    solver.counts.walks = 3;
    let mut statistics = Statistics::new();
    solver.collect_statistics(&mut statistics);
    assert_eq!(statistics["walk-rounds"], 3u64.into());
  }
}
