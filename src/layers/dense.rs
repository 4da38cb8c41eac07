use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::Rng;

use super::initialization::WeightInit;
use super::traits::{Layer as LayerTrait, LayerGradients};
use crate::activations::Activation;
use crate::error::{DqnError, Result};

/// A fully connected (dense) layer computing `act(x W + b)`
#[derive(Clone, Debug)]
pub struct DenseLayer {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
    pub activation: Activation,
    pre_activation_output: Option<Array2<f32>>,
    inputs: Option<Array2<f32>>,
}

impl DenseLayer {
    /// Create a new dense layer with weights drawn from `init`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        let weights = init.initialize_weights((input_size, output_size), rng);
        let biases = init.initialize_biases(input_size, output_size, rng);
        DenseLayer {
            weights,
            biases,
            activation,
            pre_activation_output: None,
            inputs: None,
        }
    }

    pub fn with_weights(mut self, weights: Array2<f32>) -> Self {
        assert_eq!(weights.dim(), self.weights.dim());
        self.weights = weights;
        self
    }

    pub fn with_biases(mut self, biases: Array1<f32>) -> Self {
        assert_eq!(biases.dim(), self.biases.dim());
        self.biases = biases;
        self
    }

    fn affine(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        inputs.dot(&self.weights) + &self.biases.view().insert_axis(Axis(0))
    }
}

impl LayerTrait for DenseLayer {
    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.inputs = Some(inputs.to_owned());
        self.pre_activation_output = Some(outputs.clone());
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut outputs = self.affine(inputs);
        self.activation.apply_batch(&mut outputs);
        outputs
    }

    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Result<(Array2<f32>, LayerGradients)> {
        let (pre_activation_output, inputs) = match (&self.pre_activation_output, &self.inputs) {
            (Some(pre), Some(inputs)) => (pre, inputs),
            _ => return Err(DqnError::MissingForwardPass),
        };
        if output_errors.dim() != pre_activation_output.dim() {
            return Err(DqnError::shape_mismatch(
                format!("{:?}", pre_activation_output.dim()),
                format!("{:?}", output_errors.dim()),
            ));
        }

        let activation_deriv = self.activation.derivative_batch(pre_activation_output.view());
        let adjusted_error = &output_errors * &activation_deriv;
        let gradients = LayerGradients {
            weights: inputs.t().dot(&adjusted_error),
            biases: adjusted_error.sum_axis(Axis(0)),
        };
        let input_error = adjusted_error.dot(&self.weights.t());

        Ok((input_error, gradients))
    }

    fn weights_mut(&mut self) -> &mut Array2<f32> {
        &mut self.weights
    }

    fn biases_mut(&mut self) -> &mut Array1<f32> {
        &mut self.biases
    }

    fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    fn biases(&self) -> &Array1<f32> {
        &self.biases
    }

    fn output_size(&self) -> usize {
        self.weights.shape()[1]
    }

    fn input_size(&self) -> usize {
        self.weights.shape()[0]
    }
}
