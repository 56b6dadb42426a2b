use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::Result;

/// Mean evaluation returns of a run, in the order they were measured
///
/// The first entry is the untrained baseline, the last one the final policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationHistory {
    pub run_id: String,
    pub evaluations: Vec<f32>,
}

impl EvaluationHistory {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            evaluations: Vec::new(),
        }
    }

    pub fn push(&mut self, mean_return: f32) {
        self.evaluations.push(mean_return);
    }

    /// `{dir}/{run_id}.json`
    pub fn path_in(&self, dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join(format!("{}.json", self.run_id))
    }

    /// Overwrite the history file in `dir`, returning its path
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        fs::create_dir_all(dir.as_ref())?;
        let path = self.path_in(dir);
        fs::write(&path, serde_json::to_vec_pretty(self)?)?;
        Ok(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
