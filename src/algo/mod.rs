/// Twin Delayed Deep Deterministic Policy Gradient
pub mod td3;
