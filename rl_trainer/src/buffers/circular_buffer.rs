//! Device-resident ring buffer for off-policy updates.
//!
//! Key differences from [`SequentialBuffer`](super::SequentialBuffer):
//! - **Tensor storage** on the training device instead of host vectors
//! - **Unbounded overwrite**: the oldest transitions are evicted once full
//! - **Uniform sampling with replacement** instead of whole-buffer reads
//!
//! Appends are staged on the host and uploaded in contiguous runs when the
//! caller draws a batch boundary with
//! [`recompute_valid_length`](ExperienceBuffer::recompute_valid_length). Reads
//! therefore see exactly the writes made before the last recompute.
//!
//! # Next-state lookahead
//!
//! [`sample`](OffPolicyBuffer::sample) pairs slot `i` with the state in slot
//! `i + 1` and only draws `i` from `[0, valid_length - 1)`. The last valid slot
//! is never drawn because its successor has not been written yet. Once the
//! ring has wrapped, the slot just before the write cursor is still drawable
//! and its successor holds the oldest surviving transition, which belongs to
//! an earlier rollout. That pairing is left as is; the mask of a terminal
//! transition zeroes its bootstrap term, so only non-terminal transitions at
//! that single slot are affected.

use burn::tensor::backend::Backend;
use burn::tensor::{Int, Tensor};

use crate::core::experience_buffer::{BufferConfig, ExperienceBuffer, OffPolicyBuffer, RingCursor};
use crate::core::transition::Transition;
use crate::error::BufferError;

/// Uniformly sampled batch from a [`CircularBuffer`].
#[derive(Debug, Clone)]
pub struct ReplayBatch<B: Backend> {
    /// `[batch, 1]`
    pub rewards: Tensor<B, 2>,
    /// `[batch, 1]`
    pub masks: Tensor<B, 2>,
    /// `[batch, action_dim]`
    pub actions: Tensor<B, 2>,
    /// `[batch, state_dim]`
    pub states: Tensor<B, 2>,
    /// State stored one slot after each sampled index, `[batch, state_dim]`
    pub next_states: Tensor<B, 2>,
    /// Sampled slot indices, in batch order.
    pub indices: Vec<usize>,
}

impl<B: Backend> ReplayBatch<B> {
    /// Number of sampled transitions.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Check if batch is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// A host-side write waiting for upload.
#[derive(Debug, Clone)]
struct StagedRow {
    slot: usize,
    state: Vec<f32>,
    other: Vec<f32>,
}

/// Ring buffer with tensor storage and uniform replacement sampling.
#[derive(Debug)]
pub struct CircularBuffer<B: Backend> {
    config: BufferConfig,
    cursor: RingCursor,
    states: Tensor<B, 2>,
    others: Tensor<B, 2>,
    staged: Vec<StagedRow>,
    device: B::Device,
    rng: fastrand::Rng,
}

impl<B: Backend> CircularBuffer<B> {
    /// Allocate zeroed storage for `config.capacity` transitions on `device`.
    pub fn new(config: BufferConfig, device: &B::Device) -> Result<Self, BufferError> {
        Self::with_rng(config, device, fastrand::Rng::new())
    }

    /// Same as [`new`](Self::new) with a seeded sampler.
    pub fn with_seed(config: BufferConfig, device: &B::Device, seed: u64) -> Result<Self, BufferError> {
        Self::with_rng(config, device, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: BufferConfig, device: &B::Device, rng: fastrand::Rng) -> Result<Self, BufferError> {
        config.validate()?;
        let cursor = RingCursor::new(config.capacity)?;
        Ok(Self {
            states: Tensor::zeros([config.capacity, config.state_dim], device),
            others: Tensor::zeros([config.capacity, config.other_dim()], device),
            staged: Vec::new(),
            device: device.clone(),
            cursor,
            config,
            rng,
        })
    }

    /// Get the configuration.
    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Device holding the storage.
    pub fn device(&self) -> &B::Device {
        &self.device
    }

    /// Number of appends not yet uploaded.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Read back the state stored at `slot` as of the last recompute.
    pub fn state_at(&self, slot: usize) -> Result<Vec<f32>, BufferError> {
        let dim = self.config.state_dim;
        read_row(self.states.clone().slice([slot..slot + 1, 0..dim]))
    }

    /// Read back the packed "other" row stored at `slot` as of the last recompute.
    pub fn other_at(&self, slot: usize) -> Result<Vec<f32>, BufferError> {
        let dim = self.config.other_dim();
        read_row(self.others.clone().slice([slot..slot + 1, 0..dim]))
    }

    /// Upload staged rows, one `slice_assign` per contiguous run of slots.
    fn flush(&mut self) {
        if self.staged.is_empty() {
            return;
        }
        let state_dim = self.config.state_dim;
        let other_dim = self.config.other_dim();
        let staged = std::mem::take(&mut self.staged);

        let mut run_start = 0;
        for i in 1..=staged.len() {
            let run_ends = i == staged.len() || staged[i].slot != staged[i - 1].slot + 1;
            if !run_ends {
                continue;
            }
            let run = &staged[run_start..i];
            let first = run[0].slot;
            let rows = run.len();

            let states: Vec<f32> = run.iter().flat_map(|r| r.state.iter().copied()).collect();
            let others: Vec<f32> = run.iter().flat_map(|r| r.other.iter().copied()).collect();
            let states = Tensor::<B, 1>::from_floats(states.as_slice(), &self.device)
                .reshape([rows, state_dim]);
            let others = Tensor::<B, 1>::from_floats(others.as_slice(), &self.device)
                .reshape([rows, other_dim]);

            self.states = self
                .states
                .clone()
                .slice_assign([first..first + rows, 0..state_dim], states);
            self.others = self
                .others
                .clone()
                .slice_assign([first..first + rows, 0..other_dim], others);

            run_start = i;
        }
    }
}

fn read_row<B: Backend>(row: Tensor<B, 2>) -> Result<Vec<f32>, BufferError> {
    row.into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| BufferError::Readback(format!("{:?}", e)))
}

impl<B: Backend> ExperienceBuffer for CircularBuffer<B> {
    fn append(&mut self, transition: &Transition) {
        let other_dim = self.config.other_dim();
        assert_eq!(
            transition.state.len(),
            self.config.state_dim,
            "state dimension mismatch"
        );
        assert!(
            transition.other_len() <= other_dim,
            "transition packs {} values into a {}-wide row",
            transition.other_len(),
            other_dim
        );

        let mut other = vec![0.0; other_dim];
        transition.write_other(&mut other);
        let slot = self.cursor.advance();
        self.staged.push(StagedRow {
            slot,
            state: transition.state.clone(),
            other,
        });
    }

    fn cursor(&self) -> &RingCursor {
        &self.cursor
    }

    fn recompute_valid_length(&mut self) {
        self.flush();
        self.cursor.recompute_valid_length();
    }

    fn reset(&mut self) {
        self.staged.clear();
        self.cursor.reset();
    }
}

impl<B: Backend> OffPolicyBuffer for CircularBuffer<B> {
    type Batch = ReplayBatch<B>;

    fn sample(&mut self, batch_size: usize) -> Option<ReplayBatch<B>> {
        let valid = self.cursor.valid_length();
        if valid < 2 || batch_size == 0 {
            return None;
        }

        // Uniform random sampling with replacement, excluding the last valid slot
        let indices: Vec<usize> = (0..batch_size).map(|_| self.rng.usize(..valid - 1)).collect();
        let flat: Vec<i32> = indices.iter().map(|&i| i as i32).collect();
        let index_tensor = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device);

        let action_dim = self.config.action_dim;
        let others = self.others.clone().select(0, index_tensor.clone());
        let states = self.states.clone().select(0, index_tensor.clone());
        let next_states = self.states.clone().select(0, index_tensor.add_scalar(1));

        Some(ReplayBatch {
            rewards: others.clone().slice([0..batch_size, 0..1]),
            masks: others.clone().slice([0..batch_size, 1..2]),
            actions: others.slice([0..batch_size, 2..2 + action_dim]),
            states,
            next_states,
            indices,
        })
    }
}
