//! Training runners.
//!
//! - [`Trainer`]: single-process collect/update/evaluate loop for one agent
//!   against one environment, with best-policy checkpointing and a stop file.

pub mod trainer;

#[cfg(test)]
pub mod tests;

pub use trainer::{TerminationReason, Trainer, TrainerPhase, TrainingSummary, STOP_SENTINEL};
