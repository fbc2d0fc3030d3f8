//! Single-episode rollouts with a frozen policy.

use burn::tensor::backend::Backend;

use crate::agent::{deterministic_action, Policy};
use crate::environment::Environment;
use crate::error::TrainError;

/// Step limit used when the environment declares none.
pub const DEFAULT_MAX_STEP: usize = 1024;

/// Runs one episode at a time with deterministic actions.
#[derive(Debug, Clone)]
pub struct EpisodeRunner<B: Backend> {
    device: B::Device,
    default_max_step: usize,
}

impl<B: Backend> EpisodeRunner<B> {
    /// Create a runner that evaluates on `device`.
    pub fn new(device: B::Device) -> Self {
        Self {
            device,
            default_max_step: DEFAULT_MAX_STEP,
        }
    }

    /// Set the limit used for environments without their own `max_step`.
    pub fn with_default_max_step(mut self, max_step: usize) -> Self {
        self.default_max_step = max_step;
        self
    }

    /// Step limit applied to `env`.
    pub fn max_step_for<E: Environment + ?Sized>(&self, env: &E) -> usize {
        env.spec().max_step.unwrap_or(self.default_max_step)
    }

    /// Run one episode up to the environment's step limit.
    pub fn run_episode<E, P>(&self, env: &mut E, policy: &P) -> Result<f32, TrainError>
    where
        E: Environment + ?Sized,
        P: Policy<B>,
    {
        let max_steps = self.max_step_for(env);
        self.run_episode_with_limit(env, policy, max_steps)
    }

    /// Reset `env`, then step it with `policy` until the episode ends or
    /// `max_steps` steps were taken.
    ///
    /// Returns the sum of rewards, or the environment's own episode return
    /// when it reports one.
    pub fn run_episode_with_limit<E, P>(
        &self,
        env: &mut E,
        policy: &P,
        max_steps: usize,
    ) -> Result<f32, TrainError>
    where
        E: Environment + ?Sized,
        P: Policy<B>,
    {
        let if_discrete = env.spec().if_discrete;
        let mut state = env.reset()?;
        let mut episode_return = 0.0;

        for _ in 0..max_steps {
            let action = deterministic_action::<B, P>(policy, &state, if_discrete, &self.device)?;
            let step = env.step(&action)?;
            episode_return += step.reward;
            if step.done() {
                break;
            }
            state = step.next_state;
        }

        Ok(env.episode_return().unwrap_or(episode_return))
    }
}
