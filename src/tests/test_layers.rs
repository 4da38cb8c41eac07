use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::activations::Activation;
use crate::error::DqnError;
use crate::layers::{DenseLayer, LayerTrait, WeightInit};

fn rng() -> StdRng {
    StdRng::seed_from_u64(3)
}

#[test]
fn test_dense_layer_creation() {
    let layer = DenseLayer::new(4, 3, Activation::Relu, WeightInit::default(), &mut rng());
    assert_eq!(layer.input_size(), 4);
    assert_eq!(layer.output_size(), 3);
    assert_eq!(layer.weights.dim(), (4, 3));
    assert_eq!(layer.biases.len(), 3);
}

#[test]
fn test_fan_in_uniform_bounds() {
    let layer = DenseLayer::new(16, 8, Activation::Tanh, WeightInit::FanInUniform, &mut rng());
    let bound = 0.25;
    assert!(layer.weights.iter().all(|w| w.abs() <= bound));
    assert!(layer.biases.iter().all(|b| b.abs() <= bound));
    assert!(layer.biases.iter().any(|&b| b != 0.0));
}

#[test]
fn test_xavier_has_zero_biases() {
    let layer = DenseLayer::new(6, 4, Activation::Tanh, WeightInit::XavierUniform, &mut rng());
    let limit = (6.0f32 / 10.0).sqrt();
    assert!(layer.weights.iter().all(|w| w.abs() <= limit));
    assert!(layer.biases.iter().all(|&b| b == 0.0));
}

#[test]
fn test_same_seed_same_weights() {
    let a = DenseLayer::new(5, 5, Activation::Relu, WeightInit::default(), &mut rng());
    let b = DenseLayer::new(5, 5, Activation::Relu, WeightInit::default(), &mut rng());
    assert_eq!(a.weights, b.weights);
    assert_eq!(a.biases, b.biases);
}

#[test]
fn test_forward_batch_computes_affine_then_activation() {
    let mut layer = DenseLayer::new(2, 2, Activation::Relu, WeightInit::Uniform { min: 0.0, max: 0.0 }, &mut rng())
        .with_weights(array![[1.0, -1.0], [2.0, 0.5]])
        .with_biases(array![0.5, -3.0]);
    let inputs = array![[1.0, 1.0], [0.0, -1.0]];
    let outputs = layer.forward_batch(inputs.view());
    // row 0: [1 + 2 + 0.5, -1 + 0.5 - 3] -> relu -> [3.5, 0]
    // row 1: [-2 + 0.5, -0.5 - 3] -> relu -> [0, 0]
    assert_eq!(outputs, array![[3.5, 0.0], [0.0, 0.0]]);
    assert_eq!(layer.predict_batch(inputs.view()), outputs);
}

#[test]
fn test_backward_requires_forward() {
    let layer = DenseLayer::new(2, 2, Activation::Identity, WeightInit::default(), &mut rng());
    let result = layer.backward_batch(Array2::zeros((1, 2)).view());
    assert!(matches!(result, Err(DqnError::MissingForwardPass)));
}

#[test]
fn test_backward_gradients_for_identity_layer() {
    let mut layer = DenseLayer::new(2, 1, Activation::Identity, WeightInit::Uniform { min: 0.0, max: 0.0 }, &mut rng())
        .with_weights(array![[2.0], [3.0]]);
    let inputs = array![[1.0, 2.0], [3.0, 4.0]];
    layer.forward_batch(inputs.view());

    let output_errors = array![[1.0], [0.5]];
    let (input_error, grads) = layer.backward_batch(output_errors.view()).unwrap();

    // dW = X^T e, db = sum(e), dX = e W^T
    assert_eq!(grads.weights, array![[2.5], [4.0]]);
    assert_eq!(grads.biases, array![1.5]);
    assert_eq!(input_error, array![[2.0, 3.0], [1.0, 1.5]]);
}

#[test]
fn test_backward_rejects_wrong_error_shape() {
    let mut layer = DenseLayer::new(2, 3, Activation::Tanh, WeightInit::default(), &mut rng());
    layer.forward_batch(array![[0.1, 0.2]].view());
    let result = layer.backward_batch(Array2::zeros((1, 2)).view());
    assert!(matches!(result, Err(DqnError::ShapeMismatch { .. })));
}
