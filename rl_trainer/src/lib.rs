//! # rl_trainer: Experience Buffers and a Train/Evaluate Loop
//!
//! Single-process reinforcement learning plumbing built on Burn: storage for
//! collected experience, and the control loop that alternates collection,
//! policy updates and evaluation until a stop condition holds.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          Trainer                             │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐  collect   ┌─────────────┐  update  ┌────────┐ │
//! │  │   Env    │ ─────────► │ ReplayStore │ ───────► │ Agent  │ │
//! │  └──────────┘ (inference)│ Sequential /│          └───┬────┘ │
//! │       ▲                  │  Circular   │              │      │
//! │       │                  └─────────────┘              │      │
//! │  ┌────┴─────┐   inference copy of the actor           │      │
//! │  │Evaluator │ ◄───────────────────────────────────────┘      │
//! │  │ + best   │ ──► actor.bin on strict improvement            │
//! │  └──────────┘                                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! On-policy agents get a [`SequentialBuffer`] that is refilled every cycle;
//! off-policy agents get a device-resident [`CircularBuffer`] that is first
//! prefilled by the random [`Explorer`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use rl_trainer::{TrainConfig, Trainer};
//!
//! let config = TrainConfig::from_toml_file("train.toml")?;
//! let mut trainer = Trainer::new(config, env, device, |shape| MyAgent::new(shape, &device))?;
//! let summary = trainer.train()?;
//! ```

pub mod agent;
pub mod buffers;
pub mod checkpoint;
pub mod config;
pub mod core;
pub mod environment;
pub mod error;
pub mod evaluation;
pub mod explorer;
pub mod metrics;
pub mod runners;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use crate::core::transition::{Action, Transition};
pub use crate::core::experience_buffer::{
    BufferConfig, ExperienceBuffer, OffPolicyBuffer, OnPolicyBuffer, RingCursor,
};
pub use crate::core::inference::{inference_active, with_inference, InferenceScope};

pub use buffers::{
    CircularBuffer, ReplayBatch, ReplayStore, RolloutBatch, RolloutTensors, SequentialBuffer,
};

pub use agent::{deterministic_action, Agent, AgentShape, Policy, PolicyFamily, UpdateStats};
pub use environment::{check_action, EnvSpec, Environment, Step};
pub use explorer::Explorer;

pub use config::TrainConfig;
pub use error::{BufferError, CheckpointError, ConfigError, EnvError, TrainError};

pub use checkpoint::{CheckpointInfo, Checkpointer, BEST_POLICY_FILE};
pub use evaluation::{EpisodeRunner, EvaluationRecord, Evaluator, EvaluatorConfig};
pub use metrics::{ConsoleReporter, CsvReporter, EvalReporter, EvalSnapshot, MultiReporter, NullReporter};

pub use runners::{TerminationReason, Trainer, TrainerPhase, TrainingSummary, STOP_SENTINEL};
