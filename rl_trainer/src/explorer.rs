//! Random-policy prefill for off-policy buffers.
//!
//! Before the first update, an off-policy agent has nothing to sample. The
//! [`Explorer`] steps the environment with uniformly random actions and writes
//! exactly the requested number of transitions, resetting the environment at
//! every episode end without restarting the count.

use crate::core::experience_buffer::ExperienceBuffer;
use crate::core::transition::{Action, Transition};
use crate::environment::Environment;
use crate::error::EnvError;

/// Uniformly random action source.
#[derive(Debug, Clone)]
pub struct Explorer {
    rng: fastrand::Rng,
}

impl Explorer {
    /// Create an explorer with a seeded RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Draw one action for an environment with `action_dim` actions.
    ///
    /// Discrete: index in `0..action_dim`. Continuous: each component in `[-1, 1)`.
    pub fn random_action(&mut self, action_dim: usize, if_discrete: bool) -> Action {
        if if_discrete {
            Action::Discrete(self.rng.u32(0..action_dim as u32))
        } else {
            Action::Continuous(
                (0..action_dim)
                    .map(|_| self.rng.f32() * 2.0 - 1.0)
                    .collect(),
            )
        }
    }

    /// Fill `buffer` with `target_steps` random transitions.
    ///
    /// Returns `target_steps`. The environment is left mid-episode; callers
    /// that continue stepping it should reset it first.
    pub fn run<E, Buf>(
        &mut self,
        env: &mut E,
        buffer: &mut Buf,
        target_steps: usize,
        reward_scale: f32,
        gamma: f32,
    ) -> Result<usize, EnvError>
    where
        E: Environment + ?Sized,
        Buf: ExperienceBuffer + ?Sized,
    {
        let (action_dim, if_discrete) = {
            let spec = env.spec();
            (spec.action_dim, spec.if_discrete)
        };

        let mut state = env.reset()?;
        let mut steps = 0;
        let mut episodes = 0;

        while steps < target_steps {
            let action = self.random_action(action_dim, if_discrete);
            let step = env.step(&action)?;
            steps += 1;

            let done = step.done();
            buffer.append(&Transition::from_step(
                state,
                action,
                step.reward * reward_scale,
                done,
                gamma,
            ));

            state = if done {
                episodes += 1;
                env.reset()?
            } else {
                step.next_state
            };
        }

        log::debug!("Random exploration finished: {} steps, {} episodes", steps, episodes);
        Ok(steps)
    }
}
