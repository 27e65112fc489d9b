
mod check_satisfiability;
mod clause;
mod config;
mod data_structures;
mod errors;
mod lifted_bool;
mod literal;
pub(crate) mod log;
mod local_search;
mod parameters;
mod resource_limit;
mod solver;
mod watched;


// Re-exported items
pub use check_satisfiability::unsatisfied_clauses;
pub use clause::{ClauseArena, ClauseReference, ClauseView};
pub use config::Options;
pub use data_structures::{RandomGenerator, Statistic, Statistics};
pub use errors::Error;
pub use lifted_bool::LiftedBool;
pub use literal::{Literal, LiteralVector};
pub use local_search::Walker;
pub use log::set_verbosity;
pub use parameters::{deserialize_parameters, Parameters};
pub use resource_limit::ResourceLimit;
pub use solver::{Counts, Phases, SearchMode, Solver};


/// Reported on fatal assertion violations in debug mode.
const WSAT_FULL_VERSION: &str = "0.1.0";

/// A bool variable $x_j$ has corresponding literals $x_j$ and $\overline{x}_j$. We represent
/// $x_j$ by $2 j$ and $\overline{x}_j$ by $2 j + 1$. Variables are `u32` so that literal codes
/// fit into single arena words.
pub type BoolVariable                 = u32;
pub const NULL_BOOL_VAR: BoolVariable = BoolVariable::MAX >> 1;
pub type UIntSet                      = bit_set::BitSet;

/// A three-valued assignment cell; `Undefined` means eliminated or fixed by the outer solver.
pub type Value       = LiftedBool;
pub type ValueVector = Vec<Value>;
