/*!

The walker: ProbSAT-style stochastic local search over the irredundant clauses.

One walker is built per walk round. It takes over the host's assignment vector for the
duration, keeps a counter of true literals per connected clause, and repeatedly picks an
unsatisfied clause, draws one of its literals with probability proportional to a precomputed
break-count score, and flips it. The best assignment ever seen is tracked through a bounded
trail of flipped literals and exported into the host's saved phases at the end of the round.

*/

use std::mem;

use crate::{
  clause::INVALID_REF,
  data_structures::RandomGenerator,
  lifted_bool::LiftedBool,
  literal::Literal,
  log::{phase_report, very_verbose},
  log_assert,
  resource_limit::effort_limit,
  solver::Solver,
  ValueVector,
};

use super::{
  config::WalkConfig,
  counters::{CounterTable, TaggedRef},
  score_table::{break_multiplier, ScoreTable},
  INVALID_BEST, MAX_WALK_REF,
};

fn percent(part: u64, total: u64) -> f64 {
  if total == 0 {
    0.0
  } else {
    100.0 * part as f64 / total as f64
  }
}

fn average(sum: f64, count: f64) -> f64 {
  if count == 0.0 {
    0.0
  } else {
    sum / count
  }
}

pub struct Walker {
  clauses: u32,

  best   : u32,
  current: u32,
  initial: u32,
  minimum: u32,

  random: RandomGenerator,

  counters: CounterTable,
  refs    : Vec<TaggedRef>,
  /// The host's pre-walk assignment, restored on release. Also consulted during setup to cull
  /// clauses the outer solver already satisfied.
  saved: ValueVector,
  table: ScoreTable,

  scores: Vec<f64>,
  trail : Vec<Literal>,

  config: WalkConfig,

  /// Literal occurrences accumulated during setup, then the average clause size.
  size: f64,

  limit  : u64,
  flipped: u64,
  start  : u64,
}

impl Walker {
  // region setup

  /// Builds the walker: swaps in a fresh assignment, imports decision phases, connects the
  /// binary and large irredundant clauses, and derives the score table from the average
  /// clause size.
  pub fn new(solver: &mut Solver) -> Walker {
    let clauses_total = solver.counts.binary_and_irredundant();
    log_assert!(clauses_total <= MAX_WALK_REF as u64);
    let clauses = clauses_total as u32;

    let fresh = vec![LiftedBool::Undefined; solver.num_lits() as usize];
    let saved = mem::replace(&mut solver.values, fresh);

    let mut walker = Walker {
      clauses,
      best: 0,
      current: 0,
      initial: 0,
      minimum: 0,
      random: RandomGenerator::with_seed(solver.random ^ solver.counts.walks),
      counters: CounterTable::with_clause_capacity(clauses as usize),
      refs: Vec::with_capacity(clauses as usize),
      saved,
      table: ScoreTable::default(),
      scores: Vec::new(),
      trail: Vec::new(),
      config: WalkConfig::from_solver(solver),
      size: 0.0,
      limit: u64::MAX,
      flipped: 0,
      start: 0,
    };

    walker.import_decision_phases(solver);
    walker.connect_binary_counters(solver);
    walker.connect_large_counters(solver);

    walker.current = walker.counters.unsat_len();
    walker.initial = walker.current;

    let walks = solver.counts.walks;
    phase_report(
      walks,
      format!(
        ":init {} unsatisfied irredundant clauses {:.0}% out of {}",
        walker.initial,
        percent(walker.initial as u64, clauses as u64),
        clauses
      )
      .as_str(),
    );

    walker.size = average(walker.size, clauses as f64);
    phase_report(walks, format!(":init average clause size {:.2}", walker.size).as_str());

    walker.minimum = walker.current;
    walker.init_score_table(solver);

    very_verbose(format!("initial minimum of {} unsatisfied clauses", walker.minimum).as_str());

    #[cfg(feature = "debug")]
    walker.check_counters(solver);

    walker
  }

  /// Copies the host's decision phases into the walker's fresh assignment: the target phase in
  /// stable mode without warm-up, else the saved phase, else the configured initial phase. The
  /// chosen phase is written back so a never-phased variable is remembered.
  fn import_decision_phases(&mut self, solver: &mut Solver) {
    solver.counts.walk_decisions += 1;

    let mut imported = 0u64;
    let mut overwritten = 0u64;

    for idx in 0..solver.num_vars() {
      if !solver.is_active(idx) {
        continue;
      }
      let mut value = LiftedBool::Undefined;
      if self.config.use_target {
        value = solver.phases.target[idx as usize];
      }
      if value.is_undefined() {
        value = solver.phases.saved[idx as usize];
      }
      if value.is_undefined() {
        value = self.config.initial_phase;
      }
      log_assert!(!value.is_undefined());

      if solver.phases.saved[idx as usize] != value {
        overwritten += 1;
      }
      solver.phases.saved[idx as usize] = value;

      let lit = Literal::new(idx, false);
      solver.values[lit.as_index()] = value;
      solver.values[(!lit).as_index()] = !value;
      imported += 1;
    }

    phase_report(
      solver.counts.walks,
      format!(
        ":import {} decision phases ({} overwritten)",
        imported, overwritten
      )
      .as_str(),
    );
  }

  /// Connects the binary clauses whose variables both carry a walker value. Pairs with an
  /// eliminated side are trivially satisfied or deferred to the outer solver.
  fn connect_binary_counters(&mut self, solver: &mut Solver) {
    let mut unsat = 0u32;

    for binary_ref in 0..solver.binaries.len() {
      let pair = solver.binaries[binary_ref];
      let [first, second] = pair.lits;
      let first_value = solver.values[first.as_index()];
      let second_value = solver.values[second.as_index()];
      if first_value.is_undefined() || second_value.is_undefined() {
        continue;
      }

      let count = first_value.is_true() as u32 + second_value.is_true() as u32;
      let counter_ref = self.counters.push_counter(count);
      log_assert!(counter_ref < self.clauses);
      self.refs.push(TaggedRef::Binary(binary_ref as u32));
      solver.watches.push_large_watch(first, counter_ref);
      solver.watches.push_large_watch(second, counter_ref);

      if count == 0 {
        self.counters.push_unsat(counter_ref);
        unsat += 1;
      }
    }

    let connected = self.counters.len();
    phase_report(
      solver.counts.walks,
      format!(
        ":init {} unsatisfied binary clauses {:.0}% out of {}",
        unsat,
        percent(unsat as u64, connected as u64),
        connected
      )
      .as_str(),
    );
    self.size += 2.0 * connected as f64;
  }

  /// Connects the non-garbage irredundant arena clauses up to the last-irredundant boundary.
  /// A clause the pre-walk assignment already satisfies is marked garbage and skipped for
  /// good; a literal without a walker value must have been falsified by the outer solver.
  fn connect_large_counters(&mut self, solver: &mut Solver) {
    let last_irredundant = if solver.last_irredundant == INVALID_REF {
      solver.arena.end()
    } else {
      solver.last_irredundant
    };

    let mut unsat = 0u32;
    let mut large = 0u32;

    let mut reference = 0;
    while reference < solver.arena.end() {
      if reference > last_irredundant {
        break;
      }
      let next = solver.arena.next_reference(reference);
      if solver.arena.is_garbage(reference) || solver.arena.is_redundant(reference) {
        reference = next;
        continue;
      }

      let satisfied_by_saved = solver
        .arena
        .literals(reference)
        .iter()
        .any(|lit| self.saved[lit.as_index()].is_true());
      if satisfied_by_saved {
        solver.mark_clause_as_garbage(reference);
        reference = next;
        continue;
      }

      log_assert!(reference <= MAX_WALK_REF);
      let counter_ref = self.counters.next_ref();
      log_assert!(counter_ref < self.clauses);

      let mut count = 0u32;
      let mut size = 0u32;
      for i in 0..solver.arena.size(reference) as usize {
        let lit = solver.arena.literals(reference)[i];
        let value = solver.values[lit.as_index()];
        if value.is_undefined() {
          log_assert!(self.saved[lit.as_index()].is_false());
          continue;
        }
        solver.watches.push_large_watch(lit, counter_ref);
        size += 1;
        if value.is_true() {
          count += 1;
        }
      }

      // Every literal eliminated by the outer solver: not a clause the walker can work on.
      if size == 0 {
        reference = next;
        continue;
      }

      large += 1;
      let pushed = self.counters.push_counter(count);
      log_assert!(pushed == counter_ref);
      self.refs.push(TaggedRef::Clause(reference));

      if count == 0 {
        self.counters.push_unsat(counter_ref);
        unsat += 1;
      }
      self.size += size as f64;
      reference = next;
    }

    phase_report(
      solver.counts.walks,
      format!(
        ":init {} unsatisfied large clauses {:.0}% out of {}",
        unsat,
        percent(unsat as u64, large as u64),
        large
      )
      .as_str(),
    );
  }

  fn init_score_table(&mut self, solver: &Solver) {
    let walks = solver.counts.walks;
    let cb = break_multiplier(walks, self.size);
    let base = 1.0 / cb;
    self.table = ScoreTable::new(cb);

    phase_report(walks, format!(":cb {:.2} with inverse {:.2} as base", cb, base).as_str());
    phase_report(
      walks,
      format!(
        ":table size {} and epsilon {:e}",
        self.table.exponents(),
        self.table.epsilon()
      )
      .as_str(),
    );
  }

  /// Computes the step budget for this round from the host's effort-limit policy.
  pub fn init_limit(&mut self, solver: &Solver) {
    self.limit = effort_limit(
      solver.counts.walk_steps,
      solver.counts.search_ticks,
      solver.options().walk_effort(),
      solver.options().walk_min_effort(),
    );
    self.flipped = 0;
    self.start = solver.counts.walk_steps;
  }

  // endregion setup

  // region flipping

  /// The literal list of the clause a counter counts.
  fn clause_literals<'s>(refs: &[TaggedRef], solver: &'s Solver, counter_ref: u32) -> &'s [Literal] {
    match refs[counter_ref as usize] {
      TaggedRef::Binary(binary_ref) => &solver.binaries[binary_ref as usize].lits,
      TaggedRef::Clause(reference) => solver.arena.literals(reference),
    }
  }

  /// Number of connected clauses this literal alone satisfies, i.e. the clauses that would
  /// become unsatisfied were it flipped. The second tuple element is the traversal cost.
  fn break_value(&self, solver: &Solver, lit: Literal) -> (u32, u64) {
    log_assert!(solver.values[lit.as_index()].is_false());
    let watches = solver.watches.watch_list(!lit);
    let mut steps = 1u64;
    let mut breaks = 0u32;
    for &counter_ref in watches {
      steps += 1;
      log_assert!(counter_ref < self.clauses);
      breaks += (self.counters.count(counter_ref) == 1) as u32;
    }
    (breaks, steps)
  }

  /// Draws one literal of one unsatisfied clause. The clause is taken round-robin from the
  /// unsat stack; the literal is drawn with probability proportional to its break score. Both
  /// passes visit the literals in stored order, and rounding that pushes the threshold up to
  /// the score sum falls back to the last literal carrying a value.
  fn pick_literal(&mut self, solver: &mut Solver) -> Literal {
    log_assert!(self.current == self.counters.unsat_len());
    log_assert!(self.current > 0);
    let pos = (self.flipped % self.current as u64) as u32;
    self.flipped += 1;
    let counter_ref = self.counters.unsat_at(pos);

    log_assert!(self.scores.is_empty());
    let mut steps = 0u64;
    let mut sum = 0.0f64;
    let mut picked_lit = Literal::default();

    let lits = Self::clause_literals(&self.refs, &*solver, counter_ref);
    for &lit in lits {
      if solver.values[lit.as_index()].is_undefined() {
        continue;
      }
      picked_lit = lit;
      let (breaks, break_steps) = self.break_value(&*solver, lit);
      steps += break_steps;
      let score = self.table.scale_score(breaks);
      log_assert!(score > 0.0);
      self.scores.push(score);
      sum += score;
    }
    log_assert!(picked_lit != Literal::default());
    log_assert!(sum > 0.0);

    let random = self.random.pick_double();
    log_assert!(0.0 <= random && random < 1.0);
    let threshold = sum * random;
    // `threshold == sum` is possible through rounding; the scan below then never triggers and
    // the last literal assigned above is kept.

    let mut index = 0usize;
    let mut partial = 0.0f64;
    for &lit in lits {
      if solver.values[lit.as_index()].is_undefined() {
        continue;
      }
      let score = self.scores[index];
      index += 1;
      partial += score;
      if threshold < partial {
        picked_lit = lit;
        break;
      }
    }

    self.scores.clear();
    solver.counts.walk_steps += steps;
    picked_lit
  }

  /// Walks the flipped literal's watch list and pops every counter that regains a true
  /// literal off the unsat stack. Must run before `break_clauses` so no counter transiently
  /// hits zero while another is being swapped into its slot.
  fn make_clauses(&mut self, solver: &mut Solver, flipped: Literal) {
    log_assert!(solver.values[flipped.as_index()].is_true());
    let mut steps = 1u64;
    for &counter_ref in solver.watches.watch_list(flipped) {
      steps += 1;
      log_assert!(counter_ref < self.clauses);
      if self.counters.add_true_literal(counter_ref) {
        steps += 1;
      }
    }
    solver.counts.walk_steps += steps;
  }

  /// Walks the negated literal's watch list and pushes every counter whose last true literal
  /// this flip took away.
  fn break_clauses(&mut self, solver: &mut Solver, flipped: Literal) {
    let not_flipped = !flipped;
    log_assert!(solver.values[not_flipped.as_index()].is_false());
    let mut steps = 1u64;
    for &counter_ref in solver.watches.watch_list(not_flipped) {
      steps += 1;
      log_assert!(counter_ref < self.clauses);
      self.counters.remove_true_literal(counter_ref);
    }
    solver.counts.walk_steps += steps;
  }

  fn flip_literal(&mut self, solver: &mut Solver, flip: Literal) {
    let value = solver.values[flip.as_index()];
    log_assert!(value.is_false());
    solver.values[flip.as_index()] = !value;
    solver.values[(!flip).as_index()] = value;
    self.make_clauses(solver, flip);
    self.break_clauses(solver, flip);
    self.current = self.counters.unsat_len();
  }

  // endregion flipping

  // region best tracking

  /// Saves the values of the first `best` flipped literals into the saved phases. With `keep`
  /// the flushed prefix is dropped and the rest of the trail shifts down; without it the
  /// trail is about to be released and stays as is.
  fn save_walker_trail(&mut self, solver: &mut Solver, keep: bool) {
    log_assert!(self.best != INVALID_BEST);
    let best = self.best as usize;
    log_assert!(best <= self.trail.len());

    for &lit in &self.trail[..best] {
      let value = LiftedBool::from_sign(lit.sign());
      solver.phases.saved[lit.var() as usize] = value;
    }

    if !keep {
      return;
    }

    let kept = self.trail.len() - best;
    self.trail.drain(..best);
    log_assert!(self.trail.len() == kept);
    self.best = 0;
  }

  /// The trail was invalidated, so the best assignment is the current one: copy it wholesale
  /// into the saved phases and restart the trail bookkeeping.
  fn save_all_values(&mut self, solver: &mut Solver) {
    log_assert!(self.best == INVALID_BEST);
    log_assert!(self.trail.is_empty());
    very_verbose("copying all values as saved phases since trail is invalid");

    for idx in 0..solver.num_vars() {
      let lit = Literal::new(idx, false);
      let value = solver.values[lit.as_index()];
      if !value.is_undefined() {
        solver.phases.saved[idx as usize] = value;
      }
    }
    self.best = 0;
  }

  fn push_flipped(&mut self, solver: &mut Solver, flipped: Literal) {
    if self.best == INVALID_BEST {
      log_assert!(self.trail.is_empty());
      return;
    }

    let size_trail = self.trail.len() as u32;
    log_assert!(self.best <= size_trail);
    let limit = self.config.trail_limit;
    log_assert!(limit < INVALID_BEST);

    if size_trail < limit {
      self.trail.push(flipped);
    } else if self.best > 0 {
      self.save_walker_trail(solver, true);
      self.trail.push(flipped);
    } else {
      self.trail.clear();
      self.best = INVALID_BEST;
    }
  }

  fn update_best(&mut self, solver: &mut Solver) {
    log_assert!(self.current < self.minimum);
    self.minimum = self.current;
    very_verbose(
      format!(
        "new minimum of {} unsatisfied clauses after {} flipped literals",
        self.minimum, self.flipped
      )
      .as_str(),
    );
    if self.best == INVALID_BEST {
      self.save_all_values(solver);
    } else {
      self.best = self.trail.len() as u32;
    }
  }

  // endregion best tracking

  // region driving

  fn local_search_step(&mut self, solver: &mut Solver) {
    log_assert!(self.current > 0);
    solver.counts.flipped += 1;
    let lit = self.pick_literal(solver);
    self.flip_literal(solver, lit);
    self.push_flipped(solver, lit);
    if self.current < self.minimum {
      self.update_best(solver);
    }
  }

  /// Flips literals while clauses stay unsatisfied, the step budget lasts, and the host does
  /// not ask for termination. An in-flight step always completes.
  pub fn local_search_round(&mut self, solver: &mut Solver) {
    let before = self.minimum;

    while self.minimum > 0 && self.limit > solver.counts.walk_steps {
      if solver.limit.is_canceled() {
        break;
      }
      self.local_search_step(solver);
    }

    let steps = solver.counts.walk_steps - self.start;
    very_verbose(format!("walking ends with {} unsatisfied clauses", self.current).as_str());
    very_verbose(
      format!(
        "flipping {} literals took {} steps ({:.2} per flipped)",
        self.flipped,
        steps,
        average(steps as f64, self.flipped as f64)
      )
      .as_str(),
    );
    phase_report(
      solver.counts.walks,
      format!(
        ":done {} minimum {} after {} flips",
        if self.minimum < before { "new" } else { "unchanged" },
        self.minimum,
        self.flipped
      )
      .as_str(),
    );
  }

  /// Exports the best assignment seen this round. Without improvement the phases stay
  /// untouched; a best marker of zero or an invalidated trail means the phases already hold
  /// the best assignment; otherwise the trail prefix up to the marker is replayed into them.
  pub fn save_final_minimum(&mut self, solver: &mut Solver) {
    log_assert!(self.minimum <= self.initial);
    let walks = solver.counts.walks;

    if self.minimum == self.initial {
      phase_report(walks, ":export no improvement thus keeping saved phases");
      return;
    }

    phase_report(
      walks,
      format!(
        ":export saving improved assignment of {} unsatisfied clauses",
        self.minimum
      )
      .as_str(),
    );

    if self.best != 0 && self.best != INVALID_BEST {
      self.save_walker_trail(solver, false);
    }

    solver.counts.walk_improved += 1;
  }

  pub fn minimum(&self) -> u32 {
    self.minimum
  }

  /// Tears the walker down and hands the host its pre-walk assignment back. Every exit path
  /// of the walking phase funnels through here, budget and termination exits included.
  pub fn release(self, solver: &mut Solver) {
    solver.values = self.saved;
  }

  // endregion driving

  /// Recomputes every counter from its clause and checks it against the incremental state.
  #[cfg(any(test, feature = "debug"))]
  fn check_counters(&self, solver: &Solver) {
    self.counters.check_unsat_invariant();
    for counter_ref in 0..self.counters.len() {
      let lits = Self::clause_literals(&self.refs, solver, counter_ref);
      let expected = lits
        .iter()
        .filter(|lit| solver.values[lit.as_index()].is_true())
        .count() as u32;
      log_assert!(self.counters.count(counter_ref) == expected);
    }
    log_assert!(self.minimum <= self.initial);
  }
}
