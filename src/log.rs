/*!

  Handles emitting debug, assert, verbose, and phase-report messages.

*/

pub use assertions::*;
pub use verbosity::*;

pub(crate) mod assertions {
  use crate::WSAT_FULL_VERSION;

  /// Prints assertion violation to `stderr`.
  pub fn notify_assertion_violation(code: &str, file: &str, line: u32) {
    eprintln!(
      "ASSERTION VIOLATION\n\
      File: {}\n\
      Line: {}\n\
      {}",
      file,
      line,
      code,
    );

    #[cfg(feature = "debug")]
    eprintln!("wsat {}", WSAT_FULL_VERSION);
  }

  /// A logged assert that includes source location on failure. Compiled only with the `debug`
  /// feature; release builds without it omit the check entirely.
  #[macro_export]
  macro_rules! log_assert {
    ($cond:expr) => {{
      #[cfg(feature = "debug")]
      {
        if !($cond) {
          $crate::log::assertions::notify_assertion_violation(stringify!($cond), file!(), line!());
          panic!("assertion violated");
        }
      }
    }};
  }

  /// A logged assert that includes source location on failure.
  /// Unlike `log_assert`, `verify` is not guarded by a feature flag.
  #[macro_export]
  macro_rules! verify {
    ($cond:expr) => {{
      if !($cond) {
        $crate::log::assertions::notify_assertion_violation(
          format!("Failed to verify: {}", stringify!($cond)).as_str(),
          file!(),
          line!(),
        );
        panic!("verification failed");
      }
    }};
  }
}

// Global control over verbose messaging.
pub(crate) mod verbosity {
  use std::sync::atomic::{AtomicI32, Ordering};

  static VERBOSITY: AtomicI32 = AtomicI32::new(0);

  pub fn set_verbosity(new_value: i32) {
    VERBOSITY.store(new_value, Ordering::Relaxed);
  }

  fn verbosity_is_at_least(level: i32) -> bool {
    VERBOSITY.load(Ordering::Relaxed) >= level
  }

  pub fn log_at_level(level: i32, msg: &str) {
    if verbosity_is_at_least(level) {
      println!("{}", msg);
    }
  }

  /// One walk phase report line, tagged with the walk round it belongs to.
  pub fn phase_report(round: u64, msg: &str) {
    log_at_level(1, format!("(sat.walk :round {} {})", round, msg).as_str());
  }

  pub fn very_verbose(msg: &str) {
    log_at_level(2, format!("(sat.walk {})", msg).as_str());
  }
}
