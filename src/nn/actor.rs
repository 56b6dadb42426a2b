use burn::{module::Module, prelude::*, tensor::backend::Backend};

use super::{MLPConfig, MLP};

/// Configuration for the deterministic policy network
#[derive(Config, Debug)]
pub struct ActorConfig {
    pub state_dim: usize,
    pub action_dim: usize,
    /// Largest absolute action component the actor may emit
    pub max_action: f32,
    #[config(default = "vec![400, 300]")]
    pub hidden_layers: Vec<usize>,
}

impl ActorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Actor<B> {
        Actor {
            mlp: MLPConfig::new(self.state_dim, self.hidden_layers.clone(), self.action_dim)
                .init(device),
            max_action: self.max_action,
        }
    }
}

/// Deterministic policy π(s): tanh output scaled to [-max_action, max_action].
#[derive(Module, Debug)]
pub struct Actor<B: Backend> {
    mlp: MLP<B>,
    max_action: f32,
}

impl<B: Backend> Actor<B> {
    pub fn forward(&self, state: Tensor<B, 2>) -> Tensor<B, 2> {
        self.mlp.forward_tanh(state).mul_scalar(self.max_action)
    }

    pub fn max_action(&self) -> f32 {
        self.max_action
    }

    pub fn state_dim(&self) -> usize {
        self.mlp.input_dim()
    }

    pub fn action_dim(&self) -> usize {
        self.mlp.output_dim()
    }

    /// Soft update: θ′ ← τθ + (1 − τ)θ′
    pub fn soft_update(&mut self, other: &Self, tau: f32) {
        self.mlp.soft_update(&other.mlp, tau);
    }
}
