//! Best-policy checkpointing.
//!
//! The evaluator owns a [`Checkpointer`] and calls it only when the mean
//! evaluation return improves, so the file on disk always holds the best
//! policy seen so far.
//!
//! ## Example
//!
//! ```rust,ignore
//! use rl_trainer::checkpoint::Checkpointer;
//!
//! let mut checkpointer = Checkpointer::new("./AgentDQN/CartPole_0")?;
//!
//! // On improvement:
//! checkpointer.save_best(&policy, total_steps, mean_return)?;
//!
//! // Deploy or resume:
//! let policy = checkpointer.load_best(policy_template, &device)?;
//! ```

pub mod checkpointer;

pub use checkpointer::{CheckpointInfo, Checkpointer, BEST_POLICY_FILE};
