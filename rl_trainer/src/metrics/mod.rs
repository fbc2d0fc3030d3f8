//! Evaluation reporting.
//!
//! ## Reporters
//!
//! - [`ConsoleReporter`]: Fixed-width table on stdout (or any writer)
//! - [`CsvReporter`]: CSV file with one row per evaluation
//! - [`MultiReporter`]: Combine multiple reporters
//! - [`NullReporter`]: Discard everything

pub mod reporter;

pub use reporter::{ConsoleReporter, CsvReporter, EvalReporter, EvalSnapshot, MultiReporter, NullReporter};
