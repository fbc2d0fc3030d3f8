//! Shared fixtures for unit tests: backends, fixed policies, toy
//! environments and a toy agent.

use burn::backend::{Autodiff, NdArray};
use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::agent::{deterministic_action, Agent, AgentShape, PolicyFamily, UpdateStats};
use crate::buffers::ReplayStore;
use crate::core::experience_buffer::{ExperienceBuffer, OffPolicyBuffer, OnPolicyBuffer};
use crate::core::inference::inference_active;
use crate::core::transition::{Action, Transition};
use crate::environment::{EnvSpec, Environment, Step};
use crate::error::{EnvError, TrainError};

pub type TestBackend = Autodiff<NdArray<f32>>;
pub type InnerBackend = NdArray<f32>;

/// Bias-free linear layer with the given row-major `[d_input, d_output]` weights.
pub fn fixed_linear<B: Backend>(
    weights: &[f32],
    d_input: usize,
    d_output: usize,
    device: &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output)
        .with_bias(false)
        .init(device);
    linear.weight = Param::from_tensor(
        Tensor::<B, 1>::from_floats(weights, device).reshape([d_input, d_output]),
    );
    linear
}

// =============================================================================
// ENVIRONMENTS
// =============================================================================

/// One-step episodes whose rewards follow a script, one entry per episode.
#[derive(Debug, Clone)]
pub struct ScriptedEnv {
    spec: EnvSpec,
    returns: Vec<f32>,
    episode: usize,
}

impl ScriptedEnv {
    pub fn new(returns: Vec<f32>, target_reward: f32) -> Self {
        Self {
            spec: EnvSpec::new("Scripted", 2, 2, true, target_reward),
            returns,
            episode: 0,
        }
    }
}

impl Environment for ScriptedEnv {
    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        self.episode += 1;
        Ok(vec![1.0, 0.0])
    }

    fn step(&mut self, _action: &Action) -> Result<Step, EnvError> {
        let index = (self.episode.max(1) - 1) % self.returns.len();
        Ok(Step::new(vec![0.0, 1.0], self.returns[index], true, false))
    }

    fn spec(&self) -> &EnvSpec {
        &self.spec
    }
}

/// Fixed-length episodes paying 1.0 per step; discrete or continuous.
#[derive(Debug, Clone)]
pub struct ChainEnv {
    spec: EnvSpec,
    episode_len: usize,
    t: usize,
    pub resets: usize,
    pub steps: usize,
}

impl ChainEnv {
    pub fn discrete(episode_len: usize, target_reward: f32) -> Self {
        Self::with_spec(EnvSpec::new("Chain", 2, 2, true, target_reward), episode_len)
    }

    pub fn continuous(episode_len: usize, target_reward: f32) -> Self {
        Self::with_spec(EnvSpec::new("ChainCont", 2, 2, false, target_reward), episode_len)
    }

    fn with_spec(spec: EnvSpec, episode_len: usize) -> Self {
        Self {
            spec: spec.with_max_step(episode_len * 4),
            episode_len,
            t: 0,
            resets: 0,
            steps: 0,
        }
    }

    fn observe(&self) -> Vec<f32> {
        vec![self.t as f32 / self.episode_len as f32, 1.0]
    }
}

impl Environment for ChainEnv {
    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        self.resets += 1;
        self.t = 0;
        Ok(self.observe())
    }

    fn step(&mut self, action: &Action) -> Result<Step, EnvError> {
        crate::environment::check_action(&self.spec, action)?;
        self.t += 1;
        self.steps += 1;
        let terminal = self.t >= self.episode_len;
        Ok(Step::new(self.observe(), 1.0, terminal, false))
    }

    fn spec(&self) -> &EnvSpec {
        &self.spec
    }
}

/// Environment whose steps always fail.
#[derive(Debug, Clone)]
pub struct BrokenEnv {
    spec: EnvSpec,
}

impl BrokenEnv {
    pub fn new() -> Self {
        Self {
            spec: EnvSpec::new("Broken", 2, 2, true, 1.0),
        }
    }
}

impl Environment for BrokenEnv {
    fn reset(&mut self) -> Result<Vec<f32>, EnvError> {
        Ok(vec![0.0, 0.0])
    }

    fn step(&mut self, _action: &Action) -> Result<Step, EnvError> {
        Err(EnvError::Step("simulator crashed".into()))
    }

    fn spec(&self) -> &EnvSpec {
        &self.spec
    }
}

// =============================================================================
// AGENT
// =============================================================================

/// Agent with a fixed linear actor that records what the trainer asked of it.
#[derive(Debug)]
pub struct ToyAgent {
    family: PolicyFamily,
    shape: AgentShape,
    actor: Linear<TestBackend>,
    state: Vec<f32>,
    pub collects: usize,
    pub updates: usize,
    pub syncs: usize,
    /// Batch sizes seen by on-policy updates (drained) or off-policy updates (sampled).
    pub consumed: Vec<usize>,
}

impl ToyAgent {
    pub fn new(family: PolicyFamily, shape: AgentShape) -> Self {
        let device = Default::default();
        let weights: Vec<f32> = (0..shape.state_dim * shape.action_dim)
            .map(|i| if i % (shape.action_dim + 1) == 0 { 1.0 } else { 0.0 })
            .collect();
        Self {
            family,
            actor: fixed_linear(&weights, shape.state_dim, shape.action_dim, &device),
            shape,
            state: Vec::new(),
            collects: 0,
            updates: 0,
            syncs: 0,
            consumed: Vec::new(),
        }
    }
}

impl Agent<TestBackend> for ToyAgent {
    type Actor = Linear<TestBackend>;
    type InferencePolicy = Linear<InnerBackend>;

    fn name(&self) -> &str {
        match self.family {
            PolicyFamily::OnPolicy => "ToyOnPolicy",
            PolicyFamily::OffPolicy => "ToyOffPolicy",
        }
    }

    fn family(&self) -> PolicyFamily {
        self.family
    }

    fn actor(&self) -> &Self::Actor {
        &self.actor
    }

    fn current_state(&self) -> &[f32] {
        &self.state
    }

    fn set_current_state(&mut self, state: Vec<f32>) {
        self.state = state;
    }

    fn collect<E: Environment>(
        &mut self,
        policy: &Self::InferencePolicy,
        env: &mut E,
        buffer: &mut ReplayStore<TestBackend>,
        max_steps: usize,
        reward_scale: f32,
        gamma: f32,
    ) -> Result<usize, TrainError> {
        assert!(inference_active(), "rollouts must run in inference mode");
        self.collects += 1;
        let device = Default::default();

        for _ in 0..max_steps {
            let action = deterministic_action::<InnerBackend, _>(
                policy,
                &self.state,
                self.shape.if_discrete,
                &device,
            )?;
            let step = env.step(&action)?;
            let done = step.done();
            let transition = Transition::from_step(
                std::mem::take(&mut self.state),
                action,
                step.reward * reward_scale,
                done,
                gamma,
            );
            let transition = match self.family {
                PolicyFamily::OnPolicy => {
                    let aux = vec![0.0; transition.action.packed_len()];
                    transition.with_aux(aux)
                }
                PolicyFamily::OffPolicy => transition,
            };
            buffer.append(&transition);
            self.state = if done { env.reset()? } else { step.next_state };
        }
        Ok(max_steps)
    }

    fn update(
        &mut self,
        buffer: &mut ReplayStore<TestBackend>,
        _max_steps: usize,
        batch_size: usize,
        repeat_times: usize,
    ) -> Result<UpdateStats, TrainError> {
        assert!(!inference_active(), "updates must run with gradients enabled");
        self.updates += 1;
        let consumed = match buffer {
            ReplayStore::Sequential(buffer) => buffer.drain_all().len(),
            ReplayStore::Circular(buffer) => (0..repeat_times)
                .filter_map(|_| buffer.sample(batch_size))
                .map(|batch| batch.len())
                .sum(),
        };
        self.consumed.push(consumed);
        Ok(UpdateStats::new(self.updates as f32, consumed as f32))
    }

    fn sync_target(&mut self) -> bool {
        match self.family {
            PolicyFamily::OnPolicy => false,
            PolicyFamily::OffPolicy => {
                self.syncs += 1;
                true
            }
        }
    }
}
