pub mod policy;
pub mod to_tensor;

pub use policy::{Policy, TrainingMetrics};
pub use to_tensor::{column, ToTensor};
