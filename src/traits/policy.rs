//! Policy and training-metrics types shared by the agent and the driver

use crate::error::Result;

/// Summary of one `train` call
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingMetrics {
    /// Mean joint critic loss (MSE(Q1, y) + MSE(Q2, y)) over the call
    pub critic_loss: f32,

    /// Mean actor loss -Q1(s, π(s)) over the delayed updates, 0 if none ran
    pub actor_loss: f32,

    /// Gradient steps applied to the live critics
    pub critic_updates: usize,

    /// Gradient steps applied to the live actor
    pub actor_updates: usize,

    /// Polyak averaging passes over the target networks
    pub target_updates: usize,
}

/// Something that maps an observation to an action greedily.
///
/// The evaluation routine only needs this, so it can never reach the
/// replay buffer or trigger an update.
pub trait Policy {
    fn select_action(&self, state: &[f32]) -> Result<Vec<f32>>;
}
