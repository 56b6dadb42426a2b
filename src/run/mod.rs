//! Experiment driver: run configuration, evaluation and the training loop

pub mod config;
pub mod evaluate;
pub mod history;
pub mod trainer;

pub use config::RunConfig;
pub use evaluate::evaluate_policy;
pub use history::EvaluationHistory;
pub use trainer::{corrected_done, exploration_action, RunCounters, TrainOutcome, Trainer};
