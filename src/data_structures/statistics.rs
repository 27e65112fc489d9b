/*!

  This `Statistics` map is the only crate-level statistics container. The solver keeps its own
  typed counter struct and folds it into this map for reporting.

*/

use std::collections::HashMap;
use std::fmt::{Display, Formatter};


pub type Statistics = HashMap<&'static str, Statistic>;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Statistic {
  Integer(u64),
  Float(f64),
}

impl From<f64> for Statistic {
  fn from(r: f64) -> Self {
    Statistic::Float(r)
  }
}

impl From<u64> for Statistic {
  fn from(n: u64) -> Self {
    Statistic::Integer(n)
  }
}

impl From<u32> for Statistic {
  fn from(n: u32) -> Self {
    Statistic::Integer(n as u64)
  }
}

impl Display for Statistic {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Statistic::Integer(n) => write!(f, "{}", n),
      Statistic::Float(r)   => write!(f, "{}", r),
    }
  }
}
