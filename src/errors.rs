
use thiserror::Error as DeriveError;
use user_error::UFE;

#[derive(Clone, Eq, PartialEq, Debug, Hash, DeriveError)]
pub enum Error {
  #[error("The empty clause was added; the formula is trivially unsatisfiable.")]
  EmptyClause,

  #[error("Literal {0} references a variable beyond the declared count.")]
  LiteralOutOfRange(u32),

  #[error("Module has no parameters file or file not found.")]
  DeserializeParameters,

  #[error("Unknown parameter `{0}`.")]
  UnknownParameter(String),

  #[error("Parameter `{0}` has a value of the wrong type.")]
  ParameterType(String),
}

// The trait bound `Error: std::error::Error` is derived using `thiserror::Error`.
impl UFE for Error { /* User Facing Error - nothing to implement. */ }
