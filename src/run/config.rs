use burn::config::Config;
use std::path::PathBuf;

use crate::{
    algo::td3::TD3TrainingConfig,
    error::{Result as Td3Result, Td3Error},
};

/// Every knob of a training run, fixed at process start
#[derive(Config, Debug)]
pub struct RunConfig {
    /// Environment identifier, part of the run id
    pub env_name: String,
    /// Hyperparameters forwarded to every `TD3Agent::train` call
    pub training: TD3TrainingConfig,
    #[config(default = 0)]
    pub seed: u64,
    /// Steps of uniformly random actions before the actor takes over
    #[config(default = 1000)]
    pub start_timesteps: usize,
    /// Environment steps between evaluations
    #[config(default = 500)]
    pub eval_freq: usize,
    /// Total environment steps of the run
    #[config(default = 50000)]
    pub max_timesteps: usize,
    /// Std of the Gaussian exploration noise added to actor actions
    #[config(default = 0.1)]
    pub expl_noise: f32,
    /// Greedy episodes per evaluation
    #[config(default = 10)]
    pub eval_episodes: usize,
    /// Write actor/critic checkpoints at every evaluation
    #[config(default = true)]
    pub save_models: bool,
    #[config(default = 1000000)]
    pub replay_capacity: usize,
    /// Where evaluation histories and run configs are written
    #[config(default = "String::from(\"./results\")")]
    pub results_dir: String,
    /// Where checkpoints are written
    #[config(default = "String::from(\"./models\")")]
    pub models_dir: String,
}

impl RunConfig {
    /// Identifier shared by checkpoints and results: `TD3_{env}_{seed}`
    pub fn run_id(&self) -> String {
        format!("TD3_{}_{}", self.env_name, self.seed)
    }

    pub fn results_dir(&self) -> PathBuf {
        PathBuf::from(&self.results_dir)
    }

    pub fn models_dir(&self) -> PathBuf {
        PathBuf::from(&self.models_dir)
    }

    pub fn validate(&self) -> Td3Result<()> {
        if self.eval_freq == 0 {
            return Err(Td3Error::invalid("eval_freq must be positive"));
        }
        if self.eval_episodes == 0 {
            return Err(Td3Error::invalid("eval_episodes must be positive"));
        }
        if self.replay_capacity == 0 {
            return Err(Td3Error::invalid("replay_capacity must be positive"));
        }
        if !self.expl_noise.is_finite() || self.expl_noise < 0.0 {
            return Err(Td3Error::invalid(format!(
                "expl_noise {} must be a non-negative number",
                self.expl_noise
            )));
        }
        self.training.validate()
    }
}
