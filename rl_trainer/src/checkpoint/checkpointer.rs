//! Fixed-path policy checkpointing.
//!
//! Every save overwrites the same file under the working directory; there is
//! no history of older checkpoints.

use std::fs;
use std::path::{Path, PathBuf};

use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;

use crate::error::CheckpointError;

/// File name of the best policy under the working directory.
pub const BEST_POLICY_FILE: &str = "actor.bin";

/// Checkpoint metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointInfo {
    /// Path to the checkpoint file.
    pub path: PathBuf,
    /// Cumulative training steps when it was saved.
    pub step: usize,
    /// Mean evaluation return that triggered the save.
    pub metric: f32,
}

/// Writes and reads the best policy at a fixed path.
#[derive(Debug)]
pub struct Checkpointer {
    best_path: PathBuf,
    last_saved: Option<CheckpointInfo>,
    saves: usize,
}

impl Checkpointer {
    /// Create a checkpointer writing into `dir`.
    ///
    /// Creates the directory if it doesn't exist.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CheckpointError> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        Ok(Self {
            best_path: dir.join(BEST_POLICY_FILE),
            last_saved: None,
            saves: 0,
        })
    }

    /// Path of the best-policy file.
    pub fn best_path(&self) -> &Path {
        &self.best_path
    }

    /// Metadata of the last save made by this checkpointer.
    pub fn last_saved(&self) -> Option<&CheckpointInfo> {
        self.last_saved.as_ref()
    }

    /// Number of saves made by this checkpointer.
    pub fn saves(&self) -> usize {
        self.saves
    }

    /// Overwrite the best-policy file with `policy`.
    pub fn save_best<B: Backend, M: Module<B>>(
        &mut self,
        policy: &M,
        step: usize,
        metric: f32,
    ) -> Result<&CheckpointInfo, CheckpointError> {
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        policy
            .clone()
            .save_file(&self.best_path, &recorder)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))?;

        self.saves += 1;
        log::debug!(
            "Saved best policy to {} (step {}, return {:.2})",
            self.best_path.display(),
            step,
            metric
        );

        let info = self.last_saved.insert(CheckpointInfo {
            path: self.best_path.clone(),
            step,
            metric,
        });
        Ok(&*info)
    }

    /// Load the best policy into `template`.
    ///
    /// The template is typically a freshly initialized policy of the same
    /// architecture.
    pub fn load_best<B: Backend, M: Module<B>>(
        &self,
        template: M,
        device: &B::Device,
    ) -> Result<M, CheckpointError> {
        if !self.best_path.exists() {
            return Err(CheckpointError::NoCheckpoint(self.best_path.clone()));
        }
        let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
        template
            .load_file(&self.best_path, &recorder, device)
            .map_err(|e| CheckpointError::Recorder(e.to_string()))
    }
}
