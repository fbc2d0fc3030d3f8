//! Training run configuration.
//!
//! [`TrainConfig`] holds every knob of the control loop. It can be built in
//! code with the `with_*` methods or loaded from a TOML file where any
//! missing key falls back to its default:
//!
//! ```toml
//! agent_id = "1"
//! max_memo = 131072
//! batch_size = 256
//! gamma = 0.98
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    // ========================================================================
    // Run Identity
    // ========================================================================
    /// Working directory. If None, derived from the agent and environment names.
    pub cwd: Option<PathBuf>,

    /// Run identifier, used in the derived working directory and in reports.
    pub agent_id: String,

    // ========================================================================
    // Training Settings
    // ========================================================================
    /// Hidden layer width handed to the agent factory.
    pub net_dim: usize,

    /// Replay buffer capacity.
    pub max_memo: usize,

    /// Steps per rollout (and the random prefill length for off-policy agents).
    pub max_step: usize,

    /// Transitions per sampled batch.
    pub batch_size: usize,

    /// Update passes per iteration.
    pub repeat_times: usize,

    /// Multiplier applied to every reward before it is stored.
    pub reward_scale: f32,

    /// Discount factor for future rewards.
    pub gamma: f32,

    // ========================================================================
    // Termination
    // ========================================================================
    /// Stop once total training steps exceed this.
    pub break_step: usize,

    /// Stop as soon as the evaluator reports the task solved.
    pub if_break_early: bool,

    /// Delete the working directory's previous contents before training.
    pub remove_history: bool,

    // ========================================================================
    // Evaluation
    // ========================================================================
    /// Minimum seconds between progress reports.
    pub show_gap_secs: u64,

    /// Episodes per evaluation.
    pub eval_times: usize,

    /// Seed for the explorer and replay sampling.
    pub random_seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            cwd: None,
            agent_id: "0".to_string(),

            net_dim: 1 << 8,
            max_memo: 1 << 17,
            max_step: 1 << 10,
            batch_size: 1 << 7,
            repeat_times: 1,
            reward_scale: 1.0,
            gamma: 0.99,

            break_step: 1 << 20,
            if_break_early: true,
            remove_history: true,

            show_gap_secs: 1 << 8,
            eval_times: 1 << 3,
            random_seed: 0,
        }
    }
}

impl TrainConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file. Missing keys take their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn with_net_dim(mut self, net_dim: usize) -> Self {
        self.net_dim = net_dim;
        self
    }

    pub fn with_max_memo(mut self, max_memo: usize) -> Self {
        self.max_memo = max_memo;
        self
    }

    pub fn with_max_step(mut self, max_step: usize) -> Self {
        self.max_step = max_step;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_repeat_times(mut self, repeat_times: usize) -> Self {
        self.repeat_times = repeat_times;
        self
    }

    pub fn with_reward_scale(mut self, reward_scale: f32) -> Self {
        self.reward_scale = reward_scale;
        self
    }

    pub fn with_gamma(mut self, gamma: f32) -> Self {
        self.gamma = gamma;
        self
    }

    pub fn with_break_step(mut self, break_step: usize) -> Self {
        self.break_step = break_step;
        self
    }

    pub fn with_break_early(mut self, if_break_early: bool) -> Self {
        self.if_break_early = if_break_early;
        self
    }

    pub fn with_remove_history(mut self, remove_history: bool) -> Self {
        self.remove_history = remove_history;
        self
    }

    pub fn with_show_gap_secs(mut self, show_gap_secs: u64) -> Self {
        self.show_gap_secs = show_gap_secs;
        self
    }

    pub fn with_eval_times(mut self, eval_times: usize) -> Self {
        self.eval_times = eval_times;
        self
    }

    pub fn with_random_seed(mut self, random_seed: u64) -> Self {
        self.random_seed = random_seed;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let counts = [
            ("net_dim", self.net_dim),
            ("max_memo", self.max_memo),
            ("max_step", self.max_step),
            ("batch_size", self.batch_size),
            ("repeat_times", self.repeat_times),
            ("eval_times", self.eval_times),
        ];
        for (field, value) in counts {
            if value == 0 {
                return Err(ConfigError::InvalidCount { field, value });
            }
        }

        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(ConfigError::OutOfRange {
                field: "gamma",
                value: self.gamma as f64,
                min: 0.0,
                max: 1.0,
            });
        }
        if !self.reward_scale.is_finite() {
            return Err(ConfigError::OutOfRange {
                field: "reward_scale",
                value: self.reward_scale as f64,
                min: f32::MIN as f64,
                max: f32::MAX as f64,
            });
        }
        Ok(())
    }

    /// Working directory for a run of `agent_name` on `env_name`.
    pub fn resolve_cwd(&self, agent_name: &str, env_name: &str) -> PathBuf {
        self.cwd.clone().unwrap_or_else(|| {
            PathBuf::from(format!("./{}/{}_{}", agent_name, env_name, self.agent_id))
        })
    }

    /// Validate, then prepare the working directory.
    ///
    /// Removes the directory's previous contents when `remove_history` is set
    /// and creates it. Returns the resolved path.
    pub fn init_before_training(
        &self,
        agent_name: &str,
        env_name: &str,
    ) -> Result<PathBuf, ConfigError> {
        self.validate()?;
        let cwd = self.resolve_cwd(agent_name, env_name);
        log::info!("Agent id: {}, cwd: {}", self.agent_id, cwd.display());

        if self.remove_history && cwd.exists() {
            fs::remove_dir_all(&cwd)?;
            log::info!("Removed history in {}", cwd.display());
        }
        fs::create_dir_all(&cwd)?;
        Ok(cwd)
    }
}
