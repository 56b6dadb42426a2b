//! Built-in environments

pub mod glucose;
pub mod pendulum;

pub use glucose::{GlucoseEnv, PatientParams};
pub use pendulum::Pendulum;
