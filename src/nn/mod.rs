//! Function approximators for the TD3 agent

pub mod actor;
pub mod critic;
pub mod mlp;

pub use actor::{Actor, ActorConfig};
pub use critic::{CriticConfig, TwinCritic};
pub use mlp::{MLPConfig, MLP};
