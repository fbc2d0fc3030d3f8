//! Environment abstraction consumed by the training loop.
//!
//! Implementations wrap any single-instance environment (a simulator, a
//! game, a gym bridge) behind one blocking `reset`/`step` interface. The
//! trainer clones the environment once to get an independent copy for
//! evaluation, so evaluation episodes never disturb the rollout in progress.

use crate::core::transition::Action;
use crate::error::EnvError;

/// Static description of an environment.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvSpec {
    /// Human-readable name, also used to name the working directory.
    pub name: String,
    /// Length of a state vector.
    pub state_dim: usize,
    /// Number of discrete actions, or the continuous action dimension.
    pub action_dim: usize,
    /// Whether actions are discrete indices.
    pub if_discrete: bool,
    /// Mean evaluation return above which the task counts as solved.
    pub target_reward: f32,
    /// Episode step limit, if the environment declares one.
    pub max_step: Option<usize>,
}

impl EnvSpec {
    /// Create a spec without a step limit.
    pub fn new(
        name: impl Into<String>,
        state_dim: usize,
        action_dim: usize,
        if_discrete: bool,
        target_reward: f32,
    ) -> Self {
        Self {
            name: name.into(),
            state_dim,
            action_dim,
            if_discrete,
            target_reward,
            max_step: None,
        }
    }

    /// Set the episode step limit.
    pub fn with_max_step(mut self, max_step: usize) -> Self {
        self.max_step = Some(max_step);
        self
    }
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Observation after the step
    pub next_state: Vec<f32>,
    /// Reward received
    pub reward: f32,
    /// Episode ended due to goal/failure
    pub terminal: bool,
    /// Episode ended due to time limit
    pub truncated: bool,
}

impl Step {
    /// Create a new step result.
    pub fn new(next_state: Vec<f32>, reward: f32, terminal: bool, truncated: bool) -> Self {
        Self {
            next_state,
            reward,
            terminal,
            truncated,
        }
    }

    /// Get done flag (terminal OR truncated).
    pub fn done(&self) -> bool {
        self.terminal || self.truncated
    }
}

/// A single environment instance.
///
/// Stepping after a terminal step without a reset is implementation-defined;
/// every caller in this crate resets first.
pub trait Environment {
    /// Start a new episode and return its initial state.
    fn reset(&mut self) -> Result<Vec<f32>, EnvError>;

    /// Apply `action` and advance one step.
    fn step(&mut self, action: &Action) -> Result<Step, EnvError>;

    /// Static description of this environment.
    fn spec(&self) -> &EnvSpec;

    /// Return of the last finished episode when the environment tracks it
    /// itself (e.g. wrappers that rescale rewards). `None` means callers sum
    /// step rewards instead.
    fn episode_return(&self) -> Option<f32> {
        None
    }
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        (**self).step(action)
    }

    fn spec(&self) -> &EnvSpec {
        (**self).spec()
    }

    fn episode_return(&self) -> Option<f32> {
        (**self).episode_return()
    }
}

/// Check that `action` fits the action space described by `spec`.
pub fn check_action(spec: &EnvSpec, action: &Action) -> Result<(), EnvError> {
    match (action, spec.if_discrete) {
        (Action::Discrete(a), true) if (*a as usize) < spec.action_dim => Ok(()),
        (Action::Discrete(a), true) => Err(EnvError::InvalidAction(format!(
            "index {} out of range for {} actions",
            a, spec.action_dim
        ))),
        (Action::Continuous(a), false) if a.len() == spec.action_dim => Ok(()),
        (Action::Continuous(a), false) => Err(EnvError::InvalidAction(format!(
            "expected {} components, got {}",
            spec.action_dim,
            a.len()
        ))),
        (Action::Discrete(_), false) => Err(EnvError::InvalidAction(
            "discrete action for a continuous environment".into(),
        )),
        (Action::Continuous(_), true) => Err(EnvError::InvalidAction(
            "continuous action for a discrete environment".into(),
        )),
    }
}
