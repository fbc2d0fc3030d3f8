//! Periodic policy evaluation with best-policy checkpointing.
//!
//! Each call to [`Evaluator::evaluate_and_save`]:
//! 1. runs `eval_times` episodes and takes the mean and population std-dev
//! 2. appends an [`EvaluationRecord`] to the history
//! 3. saves the policy if the mean strictly beats every earlier mean
//! 4. records the time-to-solve the first time the best mean exceeds the target
//! 5. reports progress at most once per `show_gap`

use std::path::Path;
use std::time::{Duration, Instant};

use burn::tensor::backend::Backend;

use crate::agent::{Policy, UpdateStats};
use crate::checkpoint::Checkpointer;
use crate::environment::Environment;
use crate::error::{ConfigError, TrainError};
use crate::metrics::{EvalReporter, EvalSnapshot};

use super::episode_runner::EpisodeRunner;

/// Configuration for the [`Evaluator`].
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluatorConfig {
    /// Run identifier shown in reports.
    pub agent_id: String,
    /// Episodes per evaluation.
    pub eval_times: usize,
    /// Minimum time between progress reports.
    pub show_gap: Duration,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            agent_id: "0".to_string(),
            eval_times: 8,
            show_gap: Duration::from_secs(256),
        }
    }
}

impl EvaluatorConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_eval_times(mut self, eval_times: usize) -> Self {
        self.eval_times = eval_times;
        self
    }

    pub fn with_show_gap(mut self, show_gap: Duration) -> Self {
        self.show_gap = show_gap;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.eval_times == 0 {
            return Err(ConfigError::InvalidCount {
                field: "eval_times",
                value: self.eval_times,
            });
        }
        Ok(())
    }
}

/// One evaluation result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationRecord {
    /// Cumulative training steps at evaluation time.
    pub total_steps: usize,
    /// Mean episode return.
    pub r_avg: f32,
    /// Population std-dev of episode returns.
    pub r_std: f32,
    pub actor_objective: f32,
    pub critic_objective: f32,
}

/// Scores the current policy and keeps the best one on disk.
pub struct Evaluator<B: Backend> {
    config: EvaluatorConfig,
    runner: EpisodeRunner<B>,
    checkpointer: Checkpointer,
    reporter: Box<dyn EvalReporter>,
    history: Vec<EvaluationRecord>,
    r_max: f32,
    total_steps: usize,
    start_time: Instant,
    print_time: Instant,
    used_time: Option<Duration>,
}

impl<B: Backend> Evaluator<B> {
    /// Create an evaluator saving into `cwd`.
    ///
    /// Emits the report header immediately.
    pub fn new(
        config: EvaluatorConfig,
        cwd: impl AsRef<Path>,
        device: B::Device,
        mut reporter: Box<dyn EvalReporter>,
    ) -> Result<Self, TrainError> {
        config.validate()?;
        let checkpointer = Checkpointer::new(cwd)?;
        reporter.header();

        let now = Instant::now();
        Ok(Self {
            config,
            runner: EpisodeRunner::new(device),
            checkpointer,
            reporter,
            history: Vec::new(),
            r_max: f32::NEG_INFINITY,
            total_steps: 0,
            start_time: now,
            print_time: now,
            used_time: None,
        })
    }

    /// Replace the episode runner (e.g. to change its default step limit).
    pub fn with_runner(mut self, runner: EpisodeRunner<B>) -> Self {
        self.runner = runner;
        self
    }

    /// Evaluate `policy` on `env`, checkpointing it on improvement.
    ///
    /// `steps` is the number of training steps since the previous call.
    /// Returns whether the mean return improved on the best so far.
    pub fn evaluate_and_save<E, P>(
        &mut self,
        env: &mut E,
        policy: &P,
        steps: usize,
        stats: UpdateStats,
    ) -> Result<bool, TrainError>
    where
        E: Environment + ?Sized,
        P: Policy<B>,
    {
        let returns = (0..self.config.eval_times)
            .map(|_| self.runner.run_episode(env, policy))
            .collect::<Result<Vec<f32>, TrainError>>()?;
        let (r_avg, r_std) = mean_std(&returns);

        self.total_steps += steps;
        self.history.push(EvaluationRecord {
            total_steps: self.total_steps,
            r_avg,
            r_std,
            actor_objective: stats.actor_objective,
            critic_objective: stats.critic_objective,
        });

        let improved = r_avg > self.r_max;
        if improved {
            self.r_max = r_avg;
        }

        let snapshot = EvalSnapshot {
            total_steps: self.total_steps,
            r_max: self.r_max,
            r_avg,
            r_std,
            actor_objective: stats.actor_objective,
            critic_objective: stats.critic_objective,
        };
        self.reporter.record(&snapshot);

        let target_reward = env.spec().target_reward;
        if self.used_time.is_none() && self.r_max > target_reward {
            let used_time = self.start_time.elapsed();
            self.used_time = Some(used_time);
            self.reporter.solved(&snapshot, target_reward, used_time);
            log::info!(
                "Solved: best return {:.2} > target {:.2} after {} steps ({}s)",
                self.r_max,
                target_reward,
                self.total_steps,
                used_time.as_secs()
            );
        }

        if self.print_time.elapsed() >= self.config.show_gap {
            self.print_time = Instant::now();
            self.reporter.progress(&snapshot);
        }

        if improved {
            self.checkpointer
                .save_best::<B, P>(policy, self.total_steps, r_avg)?;
            self.reporter.saved(&snapshot);
        }

        Ok(improved)
    }

    /// Whether the best return has exceeded the target.
    pub fn is_solved(&self) -> bool {
        self.used_time.is_some()
    }

    /// Time from construction until the target was first exceeded.
    pub fn solved_after(&self) -> Option<Duration> {
        self.used_time
    }

    /// Best mean return so far (`-inf` before the first evaluation).
    pub fn r_max(&self) -> f32 {
        self.r_max
    }

    /// Training steps accumulated across calls.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    pub fn history(&self) -> &[EvaluationRecord] {
        &self.history
    }

    pub fn checkpointer(&self) -> &Checkpointer {
        &self.checkpointer
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Flush the reporter.
    pub fn flush(&mut self) {
        self.reporter.flush();
    }
}

/// Mean and population standard deviation.
fn mean_std(values: &[f32]) -> (f32, f32) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;
    (mean, variance.sqrt())
}
