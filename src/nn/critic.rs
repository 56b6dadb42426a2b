use burn::{module::Module, prelude::*, tensor::backend::Backend};

use super::{MLPConfig, MLP};

/// Configuration for the twin Q-value network
#[derive(Config, Debug)]
pub struct CriticConfig {
    pub state_dim: usize,
    pub action_dim: usize,
    #[config(default = "vec![400, 300]")]
    pub hidden_layers: Vec<usize>,
}

impl CriticConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> TwinCritic<B> {
        let config = MLPConfig::new(
            self.state_dim + self.action_dim,
            self.hidden_layers.clone(),
            1,
        );
        TwinCritic {
            q1: config.init(device),
            q2: config.init(device),
        }
    }
}

/// Two independent Q-value pathways sharing only their input `cat(s, a)`.
#[derive(Module, Debug)]
pub struct TwinCritic<B: Backend> {
    q1: MLP<B>,
    q2: MLP<B>,
}

impl<B: Backend> TwinCritic<B> {
    /// Returns `(Q1(s, a), Q2(s, a))`, each shaped `[batch, 1]`.
    pub fn forward(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let input = Tensor::cat(vec![state, action], 1);
        (self.q1.forward(input.clone()), self.q2.forward(input))
    }

    /// First pathway only; the second network is never evaluated.
    pub fn q1(&self, state: Tensor<B, 2>, action: Tensor<B, 2>) -> Tensor<B, 2> {
        self.q1.forward(Tensor::cat(vec![state, action], 1))
    }

    /// Width of the concatenated `(state, action)` input.
    pub fn input_dim(&self) -> usize {
        self.q1.input_dim()
    }

    /// Soft update of both pathways: θ′ ← τθ + (1 − τ)θ′
    pub fn soft_update(&mut self, other: &Self, tau: f32) {
        self.q1.soft_update(&other.q1, tau);
        self.q2.soft_update(&other.q2, tau);
    }
}
