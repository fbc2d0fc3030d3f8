//! Single-process train/evaluate control loop.
//!
//! ```text
//! INIT -> PREFILL (off-policy only) -> { COLLECT -> RECOMPUTE_LENGTH -> UPDATE_POLICY -> EVALUATE }* -> TERMINATED
//! ```
//!
//! The loop checks its termination conditions before every cycle:
//! - early break is enabled and the evaluator reports the task solved
//! - total training steps exceed `break_step`
//! - a file named [`STOP_SENTINEL`] exists in the working directory
//!
//! Rollouts and evaluation run on the inference copy of the actor inside an
//! [`InferenceScope`]; updates run outside of it.
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = TrainConfig::new().with_max_step(512).with_break_step(200_000);
//! let mut trainer = Trainer::new(config, env, device, |shape| MyAgent::new(shape, &device))?;
//! let summary = trainer.train()?;
//! println!("{:?} after {} steps", summary.termination, summary.total_steps);
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use burn::tensor::backend::AutodiffBackend;
use burn::tensor::Tensor;

use crate::agent::{Agent, AgentShape, Policy, PolicyFamily, UpdateStats};
use crate::buffers::ReplayStore;
use crate::config::TrainConfig;
use crate::core::experience_buffer::{BufferConfig, ExperienceBuffer};
use crate::core::inference::InferenceScope;
use crate::environment::Environment;
use crate::error::{ConfigError, TrainError};
use crate::evaluation::{EvaluationRecord, Evaluator, EvaluatorConfig};
use crate::explorer::Explorer;
use crate::metrics::{ConsoleReporter, EvalReporter};

/// Name of the file whose presence in the working directory stops training.
pub const STOP_SENTINEL: &str = "stop";

/// Where the control loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainerPhase {
    Init,
    Prefill,
    Collect,
    RecomputeLength,
    UpdatePolicy,
    Evaluate,
    Terminated,
}

/// Why training stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// Early break was enabled and the best evaluation beat the target.
    Solved,
    /// Total training steps exceeded `break_step`.
    StepBudget,
    /// The stop sentinel file appeared in the working directory.
    StopSentinel,
}

/// Outcome of [`Trainer::train`].
#[derive(Debug, Clone)]
pub struct TrainingSummary {
    /// Training steps including the random prefill.
    pub total_steps: usize,
    /// Completed collect/update/evaluate cycles.
    pub iterations: usize,
    pub termination: TerminationReason,
    /// Best mean evaluation return (`-inf` if never evaluated).
    pub best_return: f32,
    /// Time until the target return was first exceeded.
    pub solved_after: Option<Duration>,
    pub history: Vec<EvaluationRecord>,
}

/// Drives an agent against an environment until a termination condition holds.
pub struct Trainer<B, A, E>
where
    B: AutodiffBackend,
    A: Agent<B>,
    E: Environment + Clone,
{
    config: TrainConfig,
    cwd: PathBuf,
    agent: A,
    env: E,
    eval_env: E,
    buffer: ReplayStore<B>,
    evaluator: Evaluator<B::InnerBackend>,
    phase: TrainerPhase,
    total_steps: usize,
    iterations: usize,
}

impl<B, A, E> Trainer<B, A, E>
where
    B: AutodiffBackend,
    A: Agent<B>,
    E: Environment + Clone,
{
    /// Build a trainer that reports to the console.
    ///
    /// See [`with_reporter`](Self::with_reporter).
    pub fn new<F>(
        config: TrainConfig,
        env: E,
        device: B::Device,
        agent_factory: F,
    ) -> Result<Self, TrainError>
    where
        F: FnOnce(AgentShape) -> A,
    {
        let reporter = Box::new(ConsoleReporter::new(config.agent_id.clone()));
        Self::with_reporter(config, env, device, agent_factory, reporter)
    }

    /// Build a trainer.
    ///
    /// Validates `config`, builds the agent from the environment's shape and
    /// checks its actor against the action space, then prepares the working
    /// directory, the buffer matching the agent's policy family and the
    /// evaluator.
    pub fn with_reporter<F>(
        config: TrainConfig,
        env: E,
        device: B::Device,
        agent_factory: F,
        reporter: Box<dyn EvalReporter>,
    ) -> Result<Self, TrainError>
    where
        F: FnOnce(AgentShape) -> A,
    {
        config.validate()?;
        let spec = env.spec().clone();
        let agent = agent_factory(AgentShape {
            net_dim: config.net_dim,
            state_dim: spec.state_dim,
            action_dim: spec.action_dim,
            if_discrete: spec.if_discrete,
        });

        let width = actor_output_width::<B, A>(&agent, spec.state_dim, &device);
        if width != spec.action_dim {
            return Err(ConfigError::DimensionMismatch {
                field: "action_dim",
                expected: spec.action_dim,
                actual: width,
            }
            .into());
        }

        let cwd = config.init_before_training(agent.name(), &spec.name)?;

        let action_dim = BufferConfig::packed_action_dim(spec.action_dim, spec.if_discrete);
        let mut buffer_config = BufferConfig::new(config.max_memo, spec.state_dim, action_dim);
        if agent.family() == PolicyFamily::OnPolicy {
            buffer_config = buffer_config.with_aux_dim(action_dim);
        }
        let buffer = ReplayStore::for_family(agent.family(), buffer_config, &device, config.random_seed)?;

        let evaluator_config = EvaluatorConfig::new()
            .with_agent_id(config.agent_id.clone())
            .with_eval_times(config.eval_times)
            .with_show_gap(Duration::from_secs(config.show_gap_secs));
        let evaluator = Evaluator::new(evaluator_config, &cwd, device, reporter)?;

        log::info!(
            "Training {} ({:?}) on {}: state_dim {}, action_dim {}, buffer {}",
            agent.name(),
            agent.family(),
            spec.name,
            spec.state_dim,
            spec.action_dim,
            config.max_memo
        );

        Ok(Self {
            config,
            cwd,
            agent,
            eval_env: env.clone(),
            env,
            buffer,
            evaluator,
            phase: TrainerPhase::Init,
            total_steps: 0,
            iterations: 0,
        })
    }

    /// Run until a termination condition holds.
    pub fn train(&mut self) -> Result<TrainingSummary, TrainError> {
        self.phase = TrainerPhase::Init;
        let state = self.env.reset()?;
        self.agent.set_current_state(state);

        if self.agent.family().is_off_policy() {
            self.prefill()?;
        }

        let termination = loop {
            if let Some(reason) = self.termination() {
                break reason;
            }
            self.iteration()?;
        };

        self.phase = TrainerPhase::Terminated;
        self.evaluator.flush();
        log::info!(
            "Training stopped ({:?}) after {} iterations, {} steps, best return {:.2}",
            termination,
            self.iterations,
            self.total_steps,
            self.evaluator.r_max()
        );

        Ok(TrainingSummary {
            total_steps: self.total_steps,
            iterations: self.iterations,
            termination,
            best_return: self.evaluator.r_max(),
            solved_after: self.evaluator.solved_after(),
            history: self.evaluator.history().to_vec(),
        })
    }

    /// Random prefill, one update and a target sync.
    fn prefill(&mut self) -> Result<(), TrainError> {
        self.phase = TrainerPhase::Prefill;
        let mut explorer = Explorer::new(self.config.random_seed);
        let steps = explorer.run(
            &mut self.env,
            &mut self.buffer,
            self.config.max_step,
            self.config.reward_scale,
            self.config.gamma,
        )?;
        self.total_steps += steps;

        self.buffer.recompute_valid_length();
        self.agent.update(
            &mut self.buffer,
            self.config.max_step,
            self.config.batch_size,
            self.config.repeat_times,
        )?;
        let synced = self.agent.sync_target();

        // The explorer leaves the environment mid-episode.
        let state = self.env.reset()?;
        self.agent.set_current_state(state);

        log::info!(
            "Prefilled {} random steps (target synced: {})",
            steps,
            synced
        );
        Ok(())
    }

    /// One collect/recompute/update/evaluate cycle.
    fn iteration(&mut self) -> Result<(), TrainError> {
        self.phase = TrainerPhase::Collect;
        if self.agent.family() == PolicyFamily::OnPolicy {
            self.buffer.reset();
        }
        let steps = {
            let scope = InferenceScope::enter::<B, A::Actor>(self.agent.actor());
            self.agent.collect(
                scope.model(),
                &mut self.env,
                &mut self.buffer,
                self.config.max_step,
                self.config.reward_scale,
                self.config.gamma,
            )?
        };
        self.total_steps += steps;

        self.phase = TrainerPhase::RecomputeLength;
        self.buffer.recompute_valid_length();

        self.phase = TrainerPhase::UpdatePolicy;
        let stats: UpdateStats = self.agent.update(
            &mut self.buffer,
            self.config.max_step,
            self.config.batch_size,
            self.config.repeat_times,
        )?;

        self.phase = TrainerPhase::Evaluate;
        let improved = {
            let scope = InferenceScope::enter::<B, A::Actor>(self.agent.actor());
            self.evaluator
                .evaluate_and_save(&mut self.eval_env, scope.model(), steps, stats)?
        };

        self.iterations += 1;
        log::debug!(
            "Iteration {}: {} steps collected, total {}, improved {}",
            self.iterations,
            steps,
            self.total_steps,
            improved
        );
        Ok(())
    }

    fn termination(&self) -> Option<TerminationReason> {
        if self.config.if_break_early && self.evaluator.is_solved() {
            Some(TerminationReason::Solved)
        } else if self.total_steps > self.config.break_step {
            Some(TerminationReason::StepBudget)
        } else if self.stop_requested() {
            Some(TerminationReason::StopSentinel)
        } else {
            None
        }
    }

    /// Whether the stop sentinel exists in the working directory.
    pub fn stop_requested(&self) -> bool {
        self.cwd.join(STOP_SENTINEL).exists()
    }

    pub fn phase(&self) -> TrainerPhase {
        self.phase
    }

    /// Working directory of this run.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    pub fn buffer(&self) -> &ReplayStore<B> {
        &self.buffer
    }

    pub fn evaluator(&self) -> &Evaluator<B::InnerBackend> {
        &self.evaluator
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn config(&self) -> &TrainConfig {
        &self.config
    }

    /// Consume the trainer, returning the trained agent.
    pub fn into_agent(self) -> A {
        self.agent
    }
}

/// Width of the actor's output for a single zero state.
fn actor_output_width<B, A>(agent: &A, state_dim: usize, device: &B::Device) -> usize
where
    B: AutodiffBackend,
    A: Agent<B>,
{
    let scope = InferenceScope::enter::<B, A::Actor>(agent.actor());
    let probe = Tensor::<B::InnerBackend, 2>::zeros([1, state_dim], device);
    let [_, width] = scope.model().forward(probe).dims();
    width
}
