/*!

  An aggregate type describing limits on the resources a solver phase is allowed to use. The
  whole walk runs on the calling thread between outer solver phases, so cancellation is a plain
  flag polled at step boundaries rather than anything atomic.

*/

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default)]
pub struct ResourceLimit {
  cancel : u32,
  suspend: bool,
  count  : u64,
  /// The min element of `self.limits`.
  limit : u64,
  /// A non-increasing sequence consisting of previous values of `self.limit`.
  limits: Vec<u64>,
}

impl ResourceLimit {
  pub fn new() -> Self {
    ResourceLimit {
      limit: u64::MAX,
      ..Self::default()
    }
  }

  /// The smallest of the existing limit and `count + delta_limit` becomes the new limit, and
  /// the old limit is pushed onto `limits`. A delta of `0` means "unlimited".
  pub fn push(&mut self, delta_limit: u64) {
    let new_limit = match delta_limit {
      0 => u64::MAX,
      _ => self.count.saturating_add(delta_limit),
    };

    self.limits.push(self.limit);
    self.limit = u64::min(new_limit, self.limit);
    self.cancel = 0;
  }

  pub fn pop(&mut self) {
    if self.count > self.limit {
      self.count = self.limit;
    }
    self.limit = self.limits.pop().unwrap_or(u64::MAX);
    self.cancel = 0;
  }

  /// Increments the `count` by `n` and returns `not_canceled()`.
  pub fn inc_by(&mut self, n: u64) -> bool {
    self.count += n;
    self.not_canceled()
  }

  /// Increments the `count` by 1 and returns `not_canceled()`.
  pub fn inc(&mut self) -> bool {
    self.inc_by(1)
  }

  pub fn count(&self) -> u64 {
    self.count
  }

  pub fn suspended(&self) -> bool {
    self.suspend
  }

  pub fn not_canceled(&self) -> bool {
    (self.cancel == 0 && self.count <= self.limit) || self.suspend
  }

  pub fn is_canceled(&self) -> bool {
    !self.not_canceled()
  }

  pub fn cancel(&mut self) {
    self.cancel += 1;
  }

  pub fn reset_cancel(&mut self) {
    self.cancel = 0;
  }
}

/// The effort-limit policy for a phase whose step counter starts at `start`: a fixed floor, or
/// a per-mille share of the search effort spent so far, whichever is larger.
pub fn effort_limit(start: u64, search_ticks: u64, effort_per_mille: u64, min_effort: u64) -> u64 {
  let budget = u64::max(min_effort, search_ticks.saturating_mul(effort_per_mille) / 1000);
  start.saturating_add(budget)
}


#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn counting_past_the_limit_cancels() {
    let mut limit = ResourceLimit::new();
    limit.push(3);
    assert!(limit.inc());
    assert!(limit.inc());
    assert!(limit.inc());
    assert!(!limit.inc());
    assert!(limit.is_canceled());
  }

  #[test]
  fn explicit_cancel_wins_even_under_budget() {
    let mut limit = ResourceLimit::new();
    limit.push(100);
    limit.cancel();
    assert!(limit.is_canceled());
    limit.reset_cancel();
    assert!(limit.not_canceled());
  }

  #[test]
  fn pop_restores_the_previous_limit() {
    let mut limit = ResourceLimit::new();
    limit.push(0);
    limit.push(2);
    limit.inc_by(2);
    assert!(!limit.inc());
    limit.pop();
    assert!(limit.not_canceled());
  }

  #[test]
  fn effort_limit_takes_the_larger_of_floor_and_share() {
    assert_eq!(effort_limit(10, 0, 50, 1000), 1010);
    assert_eq!(effort_limit(10, 1_000_000, 50, 1000), 50_010);
  }
}
