use burn::{
    prelude::*,
    tensor::{backend::Backend, BasicOps, TensorData},
};

/// A trait for converting host-side values to tensors
///
/// Implemented for batches of fixed-width rows (states, actions) moved from
/// the replay buffer to the networks.
pub trait ToTensor<B: Backend, const D: usize, K: BasicOps<B>> {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, D, K>;
}

/// Batch of rows `[batch, width]`; every row must have the width of the first.
impl<B: Backend> ToTensor<B, 2, Float> for &[Vec<f32>] {
    fn to_tensor(self, device: &B::Device) -> Tensor<B, 2> {
        let batch_size = self.len();
        let width = self.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(batch_size * width);
        for row in self {
            flat.extend_from_slice(row);
        }

        let data = TensorData::new(flat, [batch_size, width]).convert::<B::FloatElem>();
        Tensor::from_data(data, device)
    }
}

/// Column vector `[batch, 1]`, the layout of Q-values.
pub fn column<B: Backend>(values: &[f32], device: &B::Device) -> Tensor<B, 2> {
    let data = TensorData::new(values.to_vec(), [values.len(), 1]).convert::<B::FloatElem>();
    Tensor::from_data(data, device)
}
