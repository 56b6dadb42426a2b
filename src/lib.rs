//! TD3 reinforcement learning on top of [burn].
//!
//! The crate is organised bottom-up:
//!
//! - [`env`]: the [`Environment`](env::Environment) contract and box action spaces
//! - [`memory`]: the fixed-capacity experience replay buffer
//! - [`nn`]: actor and twin critic networks
//! - [`algo::td3`]: the TD3 agent (twin critics, delayed policy updates, target smoothing)
//! - [`run`]: the experiment driver with periodic evaluation and checkpointing
//! - [`gym`]: a simulated type 1 diabetic patient and the classic pendulum

pub mod algo;
pub mod env;
pub mod error;
pub mod memory;
pub mod nn;
pub mod run;
pub mod traits;

#[cfg(feature = "gym")]
pub mod gym;

pub use error::{Result, Td3Error};
