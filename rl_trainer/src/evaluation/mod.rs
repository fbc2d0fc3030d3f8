//! Policy evaluation: single episodes and the periodic evaluator.

pub mod episode_runner;
pub mod evaluator;

pub use episode_runner::{EpisodeRunner, DEFAULT_MAX_STEP};
pub use evaluator::{EvaluationRecord, Evaluator, EvaluatorConfig};
