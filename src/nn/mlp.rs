/// Multi-Layer Perceptron (MLP) - feedforward building block
///
/// Used as the body of both the actor and each critic pathway.

use burn::{
    module::{Module, Param},
    nn::{Linear, LinearConfig},
    prelude::*,
    tensor::{activation::relu, backend::Backend},
};

/// Configuration for Multi-Layer Perceptron
#[derive(Config, Debug)]
pub struct MLPConfig {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer dimensions (e.g., [400, 300] for two hidden layers)
    pub hidden_layers: Vec<usize>,
    /// Output dimension
    pub output_dim: usize,
}

/// Multi-Layer Perceptron implementation
///
/// Hidden layers use ReLU activation, the output layer is linear unless
/// `forward_tanh` is used.
#[derive(Module, Debug)]
pub struct MLP<B: Backend> {
    layers: Vec<Linear<B>>,
}

impl MLPConfig {
    /// Initialize the MLP with the given configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> MLP<B> {
        let mut dims = Vec::with_capacity(self.hidden_layers.len() + 2);
        dims.push(self.input_dim);
        dims.extend_from_slice(&self.hidden_layers);
        dims.push(self.output_dim);

        let layers = dims
            .windows(2)
            .map(|pair| LinearConfig::new(pair[0], pair[1]).init(device))
            .collect();

        MLP { layers }
    }
}

impl<B: Backend> MLP<B> {
    /// Forward pass with ReLU on hidden layers and a linear output.
    ///
    /// The last dimension is treated as the feature dimension, so this works
    /// for single examples `[features]` as well as batches `[batch, features]`.
    pub fn forward<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        let (last, hidden) = self
            .layers
            .split_last()
            .expect("MLPConfig::init always creates at least one layer");

        let mut x = input;
        for layer in hidden {
            x = relu(layer.forward(x));
        }
        last.forward(x)
    }

    /// Forward pass with tanh output activation, bounded in [-1, 1].
    pub fn forward_tanh<const D: usize>(&self, input: Tensor<B, D>) -> Tensor<B, D> {
        self.forward(input).tanh()
    }

    /// Number of input features the first layer expects.
    pub fn input_dim(&self) -> usize {
        self.layers[0].weight.val().dims()[0]
    }

    /// Number of outputs of the last layer.
    pub fn output_dim(&self) -> usize {
        self.layers[self.layers.len() - 1].weight.val().dims()[1]
    }

    /// Soft update: θ′ ← τθ + (1 − τ)θ′
    ///
    /// Updates `self` (target) toward `other` (live network) by factor `tau`,
    /// elementwise over every weight and bias.
    pub fn soft_update(&mut self, other: &Self, tau: f32) {
        for (target_layer, live_layer) in self.layers.iter_mut().zip(other.layers.iter()) {
            soft_update_linear_inplace(target_layer, live_layer, tau);
        }
    }
}

fn soft_update_tensor_inplace<B: Backend, const D: usize>(
    this: &mut Param<Tensor<B, D>>,
    that: &Param<Tensor<B, D>>,
    tau: f32,
) {
    // detach so the autodiff graph does not grow with every update
    *this = this
        .clone()
        .map(|tensor| tensor.detach() * (1.0 - tau) + that.val().detach() * tau);
}

fn soft_update_linear_inplace<B: Backend>(this: &mut Linear<B>, that: &Linear<B>, tau: f32) {
    soft_update_tensor_inplace(&mut this.weight, &that.weight, tau);

    if let (Some(b1), Some(b2)) = (&mut this.bias, &that.bias) {
        soft_update_tensor_inplace(b1, b2, tau);
    }
}
