use ndarray::{Array1, Array2, ArrayView2};

use crate::error::Result;

/// Gradients of the loss with respect to one layer's parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LayerGradients {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Trait defining the interface for neural network layers
pub trait Layer {
    /// Forward propagation for a batch of inputs, caching what the backward pass needs
    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Forward propagation that leaves the cache untouched
    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Backward propagation for a batch of output errors.
    ///
    /// Returns the error with respect to the layer input and the parameter gradients.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, LayerGradients)>;

    /// Get mutable reference to weights
    fn weights_mut(&mut self) -> &mut Array2<f32>;

    /// Get mutable reference to biases
    fn biases_mut(&mut self) -> &mut Array1<f32>;

    /// Get reference to weights
    fn weights(&self) -> &Array2<f32>;

    /// Get reference to biases
    fn biases(&self) -> &Array1<f32>;

    /// Get the output size of the layer
    fn output_size(&self) -> usize;

    /// Get the input size of the layer
    fn input_size(&self) -> usize;
}
