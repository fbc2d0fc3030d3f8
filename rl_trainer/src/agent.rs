//! Agent and policy contracts consumed by the training loop.
//!
//! The learning algorithm itself (networks, losses, optimizers) lives outside
//! this crate. The trainer only needs to know:
//! - which [`PolicyFamily`] the agent belongs to, to pick its buffer
//! - how to get an inference copy of the actor ([`Agent::actor`])
//! - how to ask for a rollout ([`Agent::collect`]) and an update ([`Agent::update`])

use burn::module::{AutodiffModule, Module};
use burn::nn::Linear;
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::Tensor;

use crate::buffers::ReplayStore;
use crate::core::transition::Action;
use crate::environment::Environment;
use crate::error::TrainError;

/// How an agent consumes experience.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyFamily {
    /// Consumes each rollout once, then discards it.
    OnPolicy,
    /// Samples uniformly from a long replay history.
    OffPolicy,
}

impl PolicyFamily {
    pub fn is_off_policy(&self) -> bool {
        matches!(self, PolicyFamily::OffPolicy)
    }
}

/// A network mapping a batch of states to action outputs.
///
/// Discrete policies return one score per action; continuous policies return
/// the action itself.
pub trait Policy<B: Backend>: Module<B> {
    /// `[batch, state_dim] -> [batch, action_dim]`
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2>;
}

impl<B: Backend> Policy<B> for Linear<B> {
    fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        Linear::forward(self, states)
    }
}

/// Network and space sizes handed to an agent factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentShape {
    /// Hidden layer width.
    pub net_dim: usize,
    pub state_dim: usize,
    /// Number of discrete actions, or the continuous action dimension.
    pub action_dim: usize,
    pub if_discrete: bool,
}

/// Diagnostics returned by a policy update.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct UpdateStats {
    /// Actor objective (e.g. policy loss or Q estimate).
    pub actor_objective: f32,
    /// Critic objective (e.g. value loss).
    pub critic_objective: f32,
}

impl UpdateStats {
    pub fn new(actor_objective: f32, critic_objective: f32) -> Self {
        Self {
            actor_objective,
            critic_objective,
        }
    }
}

/// A learning algorithm driven by the trainer.
///
/// # Type Parameters
///
/// - `B`: Autodiff backend the actor trains on
pub trait Agent<B: AutodiffBackend> {
    /// Trainable actor.
    type Actor: AutodiffModule<B, InnerModule = Self::InferencePolicy>;
    /// Gradient-free copy of the actor used for rollouts and evaluation.
    type InferencePolicy: Policy<B::InnerBackend>;

    /// Algorithm name, used to name the working directory.
    fn name(&self) -> &str;

    /// Which buffer variant this agent consumes.
    fn family(&self) -> PolicyFamily;

    /// The actor being trained.
    fn actor(&self) -> &Self::Actor;

    /// State the next rollout starts from.
    fn current_state(&self) -> &[f32];

    /// Set the state the next rollout starts from.
    fn set_current_state(&mut self, state: Vec<f32>);

    /// Step `env` with `policy` for up to `max_steps` steps, appending every
    /// transition to `buffer`. Rewards are multiplied by `reward_scale` and
    /// masks are `gamma` or 0 at episode end.
    ///
    /// Returns the number of steps taken.
    fn collect<E: Environment>(
        &mut self,
        policy: &Self::InferencePolicy,
        env: &mut E,
        buffer: &mut ReplayStore<B>,
        max_steps: usize,
        reward_scale: f32,
        gamma: f32,
    ) -> Result<usize, TrainError>;

    /// Update the actor (and any critic) from `buffer`.
    ///
    /// The buffer's valid length has been recomputed by the caller.
    fn update(
        &mut self,
        buffer: &mut ReplayStore<B>,
        max_steps: usize,
        batch_size: usize,
        repeat_times: usize,
    ) -> Result<UpdateStats, TrainError>;

    /// Hard-copy online networks into their targets.
    ///
    /// Returns `false` when the agent keeps no target networks.
    fn sync_target(&mut self) -> bool {
        false
    }
}

/// Deterministic action for one state: argmax for discrete policies, the raw
/// output otherwise.
pub fn deterministic_action<B, P>(
    policy: &P,
    state: &[f32],
    if_discrete: bool,
    device: &B::Device,
) -> Result<Action, TrainError>
where
    B: Backend,
    P: Policy<B>,
{
    let input = Tensor::<B, 1>::from_floats(state, device).reshape([1, state.len()]);
    let output = policy.forward(input);

    if if_discrete {
        let index = output
            .argmax(1)
            .into_data()
            .convert::<i64>()
            .to_vec::<i64>()
            .map_err(|e| TrainError::Agent(format!("{:?}", e)))?;
        let index = index
            .first()
            .copied()
            .ok_or_else(|| TrainError::Agent("policy produced no action".into()))?;
        Ok(Action::Discrete(index as u32))
    } else {
        let values = output
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| TrainError::Agent(format!("{:?}", e)))?;
        Ok(Action::Continuous(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixed_linear, InnerBackend};

    #[test]
    fn test_family_flags() {
        assert!(PolicyFamily::OffPolicy.is_off_policy());
        assert!(!PolicyFamily::OnPolicy.is_off_policy());
    }

    #[test]
    fn test_deterministic_action_argmax() {
        let device = Default::default();
        let policy = fixed_linear::<InnerBackend>(&[1.0, 0.0, 0.0, 1.0], 2, 2, &device);

        let action =
            deterministic_action::<InnerBackend, _>(&policy, &[0.2, 0.7], true, &device).unwrap();
        assert_eq!(action, Action::Discrete(1));

        let action =
            deterministic_action::<InnerBackend, _>(&policy, &[3.0, -1.0], true, &device).unwrap();
        assert_eq!(action, Action::Discrete(0));
    }

    #[test]
    fn test_deterministic_action_continuous() {
        let device = Default::default();
        let policy = fixed_linear::<InnerBackend>(&[2.0, 0.0, 0.0, -1.0], 2, 2, &device);

        let action =
            deterministic_action::<InnerBackend, _>(&policy, &[0.5, 0.25], false, &device).unwrap();
        assert_eq!(action, Action::Continuous(vec![1.0, -0.25]));
    }
}
