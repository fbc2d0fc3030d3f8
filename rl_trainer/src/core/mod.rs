//! Core types: transitions, buffer capabilities and scoped inference.

pub mod experience_buffer;
pub mod inference;
pub mod transition;

pub use experience_buffer::{
    BufferConfig, ExperienceBuffer, OffPolicyBuffer, OnPolicyBuffer, RingCursor,
};
pub use inference::{inference_active, with_inference, InferenceScope};
pub use transition::{Action, Transition};
