//! Evaluation reporters.
//!
//! The evaluator decides *when* something is worth reporting (rate limiting,
//! improvements, convergence); reporters decide *how* it is shown.

use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::path::Path;
use std::time::{Duration, Instant};

/// Values reported after an evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvalSnapshot {
    /// Cumulative training steps.
    pub total_steps: usize,
    /// Best mean return so far.
    pub r_max: f32,
    /// Mean return of this evaluation.
    pub r_avg: f32,
    /// Population std-dev of this evaluation's returns.
    pub r_std: f32,
    pub actor_objective: f32,
    pub critic_objective: f32,
}

/// Reporter trait for different output backends.
pub trait EvalReporter {
    /// Called once when the evaluator is created.
    fn header(&mut self) {}

    /// Called after every evaluation.
    fn record(&mut self, _snapshot: &EvalSnapshot) {}

    /// Called at most once per show gap.
    fn progress(&mut self, _snapshot: &EvalSnapshot) {}

    /// Called when the best policy was saved.
    fn saved(&mut self, _snapshot: &EvalSnapshot) {}

    /// Called once, the first time the best return exceeds the target.
    fn solved(&mut self, _snapshot: &EvalSnapshot, _target_reward: f32, _used_time: Duration) {}

    /// Flush any buffered output.
    fn flush(&mut self) {}
}

impl<R: EvalReporter + ?Sized> EvalReporter for Box<R> {
    fn header(&mut self) {
        (**self).header()
    }

    fn record(&mut self, snapshot: &EvalSnapshot) {
        (**self).record(snapshot)
    }

    fn progress(&mut self, snapshot: &EvalSnapshot) {
        (**self).progress(snapshot)
    }

    fn saved(&mut self, snapshot: &EvalSnapshot) {
        (**self).saved(snapshot)
    }

    fn solved(&mut self, snapshot: &EvalSnapshot, target_reward: f32, used_time: Duration) {
        (**self).solved(snapshot, target_reward, used_time)
    }

    fn flush(&mut self) {
        (**self).flush()
    }
}

/// Reporter that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl EvalReporter for NullReporter {}

/// Fixed-width console table.
///
/// ```text
/// ID      Step      MaxR |    avgR      stdR       objA      objC
/// 0     1.02e3     12.00 |   12.00      0.00       0.53      1.20
/// ```
pub struct ConsoleReporter<W: Write = Stdout> {
    agent_id: String,
    out: W,
}

impl ConsoleReporter<Stdout> {
    /// Create a console reporter writing to stdout.
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self::with_writer(agent_id, io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    /// Create a console reporter writing to `out`.
    pub fn with_writer(agent_id: impl Into<String>, out: W) -> Self {
        Self {
            agent_id: agent_id.into(),
            out,
        }
    }

    /// Get the underlying writer.
    pub fn writer(&self) -> &W {
        &self.out
    }
}

impl<W: Write> EvalReporter for ConsoleReporter<W> {
    fn header(&mut self) {
        let _ = writeln!(
            self.out,
            "{:>2}  {:>8}  {:>8} |{:>8}  {:>8}   {:>8}  {:>8}",
            "ID", "Step", "MaxR", "avgR", "stdR", "objA", "objC"
        );
    }

    fn progress(&mut self, s: &EvalSnapshot) {
        let _ = writeln!(
            self.out,
            "{:<2}  {:>8.2e}  {:>8.2} |{:>8.2}  {:>8.2}   {:>8.2}  {:>8.2}",
            self.agent_id,
            s.total_steps as f64,
            s.r_max,
            s.r_avg,
            s.r_std,
            s.actor_objective,
            s.critic_objective
        );
    }

    fn saved(&mut self, s: &EvalSnapshot) {
        let _ = writeln!(
            self.out,
            "{:<2}  {:>8.2e}  {:>8.2} |",
            self.agent_id, s.total_steps as f64, s.r_max
        );
    }

    fn solved(&mut self, s: &EvalSnapshot, target_reward: f32, used_time: Duration) {
        let _ = writeln!(
            self.out,
            "{:>2}  {:>8}  {:>8} |{:>8}  {:>8}   {:>8}  ########\n\
             {:<2}  {:>8.2e}  {:>8.2} |{:>8.2}  {:>8.2}   {:>8}  ########",
            "ID",
            "Step",
            "TargetR",
            "avgR",
            "stdR",
            "UsedTime",
            self.agent_id,
            s.total_steps as f64,
            target_reward,
            s.r_avg,
            s.r_std,
            used_time.as_secs()
        );
    }

    fn flush(&mut self) {
        let _ = self.out.flush();
    }
}

/// CSV file reporter, one row per evaluation.
pub struct CsvReporter {
    writer: BufWriter<File>,
    start_time: Instant,
}

impl CsvReporter {
    /// Create a new CSV reporter.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the CSV file
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "total_steps,r_max,r_avg,r_std,actor_objective,critic_objective,elapsed_secs"
        )?;

        Ok(Self {
            writer,
            start_time: Instant::now(),
        })
    }
}

impl EvalReporter for CsvReporter {
    fn record(&mut self, s: &EvalSnapshot) {
        let _ = writeln!(
            self.writer,
            "{},{:.4},{:.4},{:.4},{:.6},{:.6},{:.2}",
            s.total_steps,
            s.r_max,
            s.r_avg,
            s.r_std,
            s.actor_objective,
            s.critic_objective,
            self.start_time.elapsed().as_secs_f32()
        );
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }
}

impl Drop for CsvReporter {
    fn drop(&mut self) {
        self.flush();
    }
}

/// Multi-reporter that fans out to several backends.
#[derive(Default)]
pub struct MultiReporter {
    reporters: Vec<Box<dyn EvalReporter>>,
}

impl MultiReporter {
    /// Create a new multi-reporter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a reporter.
    pub fn add<R: EvalReporter + 'static>(mut self, reporter: R) -> Self {
        self.reporters.push(Box::new(reporter));
        self
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }
}

impl EvalReporter for MultiReporter {
    fn header(&mut self) {
        for reporter in &mut self.reporters {
            reporter.header();
        }
    }

    fn record(&mut self, snapshot: &EvalSnapshot) {
        for reporter in &mut self.reporters {
            reporter.record(snapshot);
        }
    }

    fn progress(&mut self, snapshot: &EvalSnapshot) {
        for reporter in &mut self.reporters {
            reporter.progress(snapshot);
        }
    }

    fn saved(&mut self, snapshot: &EvalSnapshot) {
        for reporter in &mut self.reporters {
            reporter.saved(snapshot);
        }
    }

    fn solved(&mut self, snapshot: &EvalSnapshot, target_reward: f32, used_time: Duration) {
        for reporter in &mut self.reporters {
            reporter.solved(snapshot, target_reward, used_time);
        }
    }

    fn flush(&mut self) {
        for reporter in &mut self.reporters {
            reporter.flush();
        }
    }
}
