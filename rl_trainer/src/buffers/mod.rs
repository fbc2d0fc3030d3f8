//! Experience buffer implementations.
//!
//! Different policy families require different buffer semantics:
//! - `SequentialBuffer`: on-policy, read whole once per update, then reset
//! - `CircularBuffer`: off-policy, uniformly sampled from a long history
//! - `ReplayStore`: the variant a training run owns, picked from the agent's family

pub mod circular_buffer;
pub mod replay_store;
pub mod sequential_buffer;

pub use circular_buffer::{CircularBuffer, ReplayBatch};
pub use replay_store::ReplayStore;
pub use sequential_buffer::{RolloutBatch, RolloutTensors, SequentialBuffer};

#[cfg(test)]
mod tests;
