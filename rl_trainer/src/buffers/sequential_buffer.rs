//! Host-resident buffer for on-policy updates.
//!
//! Key characteristics:
//! - Flat `Vec<f32>` storage, allocated once at construction
//! - Read whole through [`OnPolicyBuffer::drain_all`] once per update
//! - Reset between updates so the same allocation is reused
//!
//! Writing more than `capacity` transitions without a reset wraps the cursor
//! and silently overwrites the oldest rows of the current rollout. Size the
//! buffer for the longest rollout the agent collects.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::core::experience_buffer::{BufferConfig, ExperienceBuffer, OnPolicyBuffer, RingCursor};
use crate::core::transition::Transition;
use crate::error::BufferError;

/// Every valid transition of a [`SequentialBuffer`], split per field.
///
/// Rows keep write order: row `i` of every projection is the `i`-th append.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutBatch {
    /// Rewards `[len]`
    pub rewards: Vec<f32>,
    /// Discount masks `[len]`
    pub masks: Vec<f32>,
    /// Packed actions `[len * action_dim]`
    pub actions: Vec<f32>,
    /// Auxiliary values `[len * aux_dim]`
    pub aux: Vec<f32>,
    /// States `[len * state_dim]`
    pub states: Vec<f32>,
    pub state_dim: usize,
    pub action_dim: usize,
    pub aux_dim: usize,
}

impl RolloutBatch {
    /// Number of transitions.
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Check if batch is empty.
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// State row `i`.
    pub fn state(&self, i: usize) -> &[f32] {
        &self.states[i * self.state_dim..(i + 1) * self.state_dim]
    }

    /// Packed action row `i`.
    pub fn action(&self, i: usize) -> &[f32] {
        &self.actions[i * self.action_dim..(i + 1) * self.action_dim]
    }

    /// Move the projections onto `device`.
    pub fn to_tensors<B: Backend>(&self, device: &B::Device) -> RolloutTensors<B> {
        let n = self.len();
        let rewards = Tensor::<B, 1>::from_floats(self.rewards.as_slice(), device).reshape([n, 1]);
        let masks = Tensor::<B, 1>::from_floats(self.masks.as_slice(), device).reshape([n, 1]);
        let actions = Tensor::<B, 1>::from_floats(self.actions.as_slice(), device)
            .reshape([n, self.action_dim]);
        let aux = (self.aux_dim > 0).then(|| {
            Tensor::<B, 1>::from_floats(self.aux.as_slice(), device).reshape([n, self.aux_dim])
        });
        let states = Tensor::<B, 1>::from_floats(self.states.as_slice(), device)
            .reshape([n, self.state_dim]);

        RolloutTensors {
            rewards,
            masks,
            actions,
            aux,
            states,
        }
    }
}

/// Device copy of a [`RolloutBatch`].
#[derive(Debug, Clone)]
pub struct RolloutTensors<B: Backend> {
    /// `[len, 1]`
    pub rewards: Tensor<B, 2>,
    /// `[len, 1]`
    pub masks: Tensor<B, 2>,
    /// `[len, action_dim]`
    pub actions: Tensor<B, 2>,
    /// `[len, aux_dim]`, absent when the buffer stores no auxiliary values
    pub aux: Option<Tensor<B, 2>>,
    /// `[len, state_dim]`
    pub states: Tensor<B, 2>,
}

/// Single-pass, host-resident experience buffer.
#[derive(Debug, Clone)]
pub struct SequentialBuffer {
    config: BufferConfig,
    cursor: RingCursor,
    states: Vec<f32>,
    others: Vec<f32>,
}

impl SequentialBuffer {
    /// Allocate storage for `config.capacity` transitions.
    pub fn new(config: BufferConfig) -> Result<Self, BufferError> {
        config.validate()?;
        let cursor = RingCursor::new(config.capacity)?;
        Ok(Self {
            states: vec![0.0; config.capacity * config.state_dim],
            others: vec![0.0; config.capacity * config.other_dim()],
            cursor,
            config,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Stored state row at `slot`, whether or not it is currently valid.
    pub fn state_at(&self, slot: usize) -> &[f32] {
        let dim = self.config.state_dim;
        &self.states[slot * dim..(slot + 1) * dim]
    }

    /// Stored packed "other" row at `slot`.
    pub fn other_at(&self, slot: usize) -> &[f32] {
        let dim = self.config.other_dim();
        &self.others[slot * dim..(slot + 1) * dim]
    }
}

impl ExperienceBuffer for SequentialBuffer {
    fn append(&mut self, transition: &Transition) {
        let state_dim = self.config.state_dim;
        let other_dim = self.config.other_dim();
        assert_eq!(transition.state.len(), state_dim, "state dimension mismatch");
        assert!(
            transition.other_len() <= other_dim,
            "transition packs {} values into a {}-wide row",
            transition.other_len(),
            other_dim
        );

        let slot = self.cursor.advance();
        self.states[slot * state_dim..(slot + 1) * state_dim].copy_from_slice(&transition.state);
        transition.write_other(&mut self.others[slot * other_dim..(slot + 1) * other_dim]);
    }

    fn cursor(&self) -> &RingCursor {
        &self.cursor
    }

    fn recompute_valid_length(&mut self) {
        self.cursor.recompute_valid_length();
    }

    fn reset(&mut self) {
        self.cursor.reset();
    }
}

impl OnPolicyBuffer for SequentialBuffer {
    type Batch = RolloutBatch;

    fn drain_all(&self) -> RolloutBatch {
        let n = self.cursor.valid_length();
        let BufferConfig {
            state_dim,
            action_dim,
            aux_dim,
            ..
        } = self.config;
        let other_dim = self.config.other_dim();

        let mut batch = RolloutBatch {
            rewards: Vec::with_capacity(n),
            masks: Vec::with_capacity(n),
            actions: Vec::with_capacity(n * action_dim),
            aux: Vec::with_capacity(n * aux_dim),
            states: self.states[..n * state_dim].to_vec(),
            state_dim,
            action_dim,
            aux_dim,
        };

        for row in self.others[..n * other_dim].chunks_exact(other_dim) {
            batch.rewards.push(row[0]);
            batch.masks.push(row[1]);
            batch.actions.extend_from_slice(&row[2..2 + action_dim]);
            batch.aux.extend_from_slice(&row[2 + action_dim..]);
        }

        batch
    }
}
