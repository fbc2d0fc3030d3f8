//! The buffer a training run owns, chosen once from the agent's policy family.

use burn::tensor::backend::Backend;

use crate::agent::PolicyFamily;
use crate::core::experience_buffer::{BufferConfig, ExperienceBuffer, RingCursor};
use crate::core::transition::Transition;
use crate::error::BufferError;

use super::circular_buffer::CircularBuffer;
use super::sequential_buffer::SequentialBuffer;

/// Buffer variant owned by the trainer and lent to the agent.
#[derive(Debug)]
pub enum ReplayStore<B: Backend> {
    /// On-policy: read whole once per update, then reset.
    Sequential(SequentialBuffer),
    /// Off-policy: sampled uniformly from a long history.
    Circular(CircularBuffer<B>),
}

impl<B: Backend> ReplayStore<B> {
    /// Build the variant matching `family`.
    ///
    /// `seed` drives the circular variant's sampler.
    pub fn for_family(
        family: PolicyFamily,
        config: BufferConfig,
        device: &B::Device,
        seed: u64,
    ) -> Result<Self, BufferError> {
        match family {
            PolicyFamily::OnPolicy => Ok(Self::Sequential(SequentialBuffer::new(config)?)),
            PolicyFamily::OffPolicy => Ok(Self::Circular(CircularBuffer::with_seed(
                config, device, seed,
            )?)),
        }
    }

    /// The family this variant serves.
    pub fn family(&self) -> PolicyFamily {
        match self {
            Self::Sequential(_) => PolicyFamily::OnPolicy,
            Self::Circular(_) => PolicyFamily::OffPolicy,
        }
    }

    pub fn as_sequential(&self) -> Option<&SequentialBuffer> {
        match self {
            Self::Sequential(buffer) => Some(buffer),
            Self::Circular(_) => None,
        }
    }

    pub fn as_sequential_mut(&mut self) -> Option<&mut SequentialBuffer> {
        match self {
            Self::Sequential(buffer) => Some(buffer),
            Self::Circular(_) => None,
        }
    }

    pub fn as_circular(&self) -> Option<&CircularBuffer<B>> {
        match self {
            Self::Circular(buffer) => Some(buffer),
            Self::Sequential(_) => None,
        }
    }

    pub fn as_circular_mut(&mut self) -> Option<&mut CircularBuffer<B>> {
        match self {
            Self::Circular(buffer) => Some(buffer),
            Self::Sequential(_) => None,
        }
    }
}

impl<B: Backend> ExperienceBuffer for ReplayStore<B> {
    fn append(&mut self, transition: &Transition) {
        match self {
            Self::Sequential(buffer) => buffer.append(transition),
            Self::Circular(buffer) => buffer.append(transition),
        }
    }

    fn cursor(&self) -> &RingCursor {
        match self {
            Self::Sequential(buffer) => buffer.cursor(),
            Self::Circular(buffer) => buffer.cursor(),
        }
    }

    fn recompute_valid_length(&mut self) {
        match self {
            Self::Sequential(buffer) => buffer.recompute_valid_length(),
            Self::Circular(buffer) => buffer.recompute_valid_length(),
        }
    }

    fn reset(&mut self) {
        match self {
            Self::Sequential(buffer) => buffer.reset(),
            Self::Circular(buffer) => buffer.reset(),
        }
    }
}
