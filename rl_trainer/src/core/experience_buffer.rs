//! Experience buffer traits shared by the two storage variants.
//!
//! - **SequentialBuffer**: on-policy, host-resident, consumed whole once per update
//! - **CircularBuffer**: off-policy, device-resident ring, sampled uniformly
//!
//! Both keep the same bookkeeping in a [`RingCursor`]: writes advance the
//! cursor, and the sampleable length is only refreshed when the caller asks
//! for it through [`ExperienceBuffer::recompute_valid_length`].

use crate::core::transition::Transition;
use crate::error::BufferError;

/// Write position and valid-length bookkeeping for a fixed-capacity ring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RingCursor {
    capacity: usize,
    write_cursor: usize,
    valid_length: usize,
    is_full: bool,
}

impl RingCursor {
    /// Create a cursor for `capacity` slots.
    pub fn new(capacity: usize) -> Result<Self, BufferError> {
        if capacity == 0 {
            return Err(BufferError::InvalidCapacity(capacity));
        }
        Ok(Self {
            capacity,
            write_cursor: 0,
            valid_length: 0,
            is_full: false,
        })
    }

    /// Claim the slot for the next write and advance.
    ///
    /// Returns the slot index to write into.
    pub fn advance(&mut self) -> usize {
        let slot = self.write_cursor;
        self.write_cursor += 1;
        if self.write_cursor >= self.capacity {
            self.is_full = true;
            self.write_cursor = 0;
        }
        slot
    }

    /// Refresh the sampleable length from the write position.
    pub fn recompute_valid_length(&mut self) {
        self.valid_length = if self.is_full {
            self.capacity
        } else {
            self.write_cursor
        };
    }

    /// Forget all writes. Storage owned by the caller is left untouched.
    pub fn reset(&mut self) {
        self.write_cursor = 0;
        self.valid_length = 0;
        self.is_full = false;
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn valid_length(&self) -> usize {
        self.valid_length
    }

    pub fn is_full(&self) -> bool {
        self.is_full
    }
}

/// Capability shared by every experience buffer.
///
/// Callers must call [`recompute_valid_length`](Self::recompute_valid_length)
/// before reading; appends alone never change what a read returns.
pub trait ExperienceBuffer {
    /// Write a transition at the cursor, overwriting whatever was there.
    ///
    /// # Panics
    ///
    /// Panics if the transition does not match the buffer's dimensions.
    fn append(&mut self, transition: &Transition);

    /// Bookkeeping for this buffer.
    fn cursor(&self) -> &RingCursor;

    /// Make every write so far visible to reads.
    fn recompute_valid_length(&mut self);

    /// Zero the cursor and lengths, keeping the allocation.
    fn reset(&mut self);

    /// Append several transitions in order.
    fn append_all<'a, I>(&mut self, transitions: I)
    where
        I: IntoIterator<Item = &'a Transition>,
        Self: Sized,
    {
        for transition in transitions {
            self.append(transition);
        }
    }

    fn capacity(&self) -> usize {
        self.cursor().capacity()
    }

    fn write_cursor(&self) -> usize {
        self.cursor().write_cursor()
    }

    fn valid_length(&self) -> usize {
        self.cursor().valid_length()
    }

    fn is_full(&self) -> bool {
        self.cursor().is_full()
    }

    /// Check if no transition is visible to reads.
    fn is_empty(&self) -> bool {
        self.valid_length() == 0
    }

    /// Get buffer utilization as fraction (0.0 to 1.0).
    fn utilization(&self) -> f32 {
        self.valid_length() as f32 / self.capacity() as f32
    }
}

/// On-policy buffers are read whole, once per update.
pub trait OnPolicyBuffer: ExperienceBuffer {
    /// The batch type holding every valid transition.
    type Batch;

    /// Every valid transition, split into per-field projections.
    ///
    /// Does not clear the buffer; call [`ExperienceBuffer::reset`] afterwards.
    fn drain_all(&self) -> Self::Batch;
}

/// Off-policy buffers are sampled uniformly with replacement.
pub trait OffPolicyBuffer: ExperienceBuffer {
    /// The sampled batch type.
    type Batch;

    /// Sample `batch_size` transitions together with their next states.
    ///
    /// Returns `None` when fewer than two transitions are valid.
    fn sample(&mut self, batch_size: usize) -> Option<Self::Batch>;
}

/// Dimensions and capacity for a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferConfig {
    /// Maximum number of transitions held.
    pub capacity: usize,
    /// Length of a state vector.
    pub state_dim: usize,
    /// Packed action width: 1 for discrete actions, else the action dimension.
    pub action_dim: usize,
    /// Width of the auxiliary vector (0 for off-policy buffers).
    pub aux_dim: usize,
}

impl BufferConfig {
    /// Create a config without auxiliary values.
    pub fn new(capacity: usize, state_dim: usize, action_dim: usize) -> Self {
        Self {
            capacity,
            state_dim,
            action_dim,
            aux_dim: 0,
        }
    }

    /// Set the auxiliary width.
    pub fn with_aux_dim(mut self, aux_dim: usize) -> Self {
        self.aux_dim = aux_dim;
        self
    }

    /// Packed action width for an environment's action space.
    pub fn packed_action_dim(action_dim: usize, if_discrete: bool) -> usize {
        if if_discrete {
            1
        } else {
            action_dim
        }
    }

    /// Width of the packed `[reward, mask, action..., aux...]` row.
    pub fn other_dim(&self) -> usize {
        2 + self.action_dim + self.aux_dim
    }

    /// Check capacity and dimensions.
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.capacity == 0 {
            return Err(BufferError::InvalidCapacity(self.capacity));
        }
        if self.state_dim == 0 {
            return Err(BufferError::InvalidDimension {
                field: "state_dim",
                value: self.state_dim,
            });
        }
        if self.action_dim == 0 {
            return Err(BufferError::InvalidDimension {
                field: "action_dim",
                value: self.action_dim,
            });
        }
        Ok(())
    }
}
