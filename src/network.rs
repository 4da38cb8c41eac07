use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use crate::activations::Activation;
use crate::context::Context;
use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, LayerGradients, LayerTrait, WeightInit};

/// Weights and biases of one dense layer, detached from any forward-pass cache.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LayerParameters {
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Snapshot of every parameter of a [`ValueNetwork`]; the unit written to and
/// read from checkpoint files.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParameterSet {
    pub layers: Vec<LayerParameters>,
}

impl ParameterSet {
    /// `(weight shape, bias length)` per layer
    pub fn shapes(&self) -> Vec<((usize, usize), usize)> {
        self.layers
            .iter()
            .map(|layer| (layer.weights.dim(), layer.biases.len()))
            .collect()
    }
}

/// A feed-forward network mapping an observation to one value estimate per
/// discrete action.
///
/// The architecture is `input -> L x (hidden, activation) -> output`, with an
/// identity activation on the output layer. The online and target networks of
/// an agent are two independent instances of the same architecture.
///
/// # Example
///
/// ```rust
/// use copa_dqn::activations::Activation;
/// use copa_dqn::context::Context;
/// use copa_dqn::network::ValueNetwork;
/// use ndarray::array;
///
/// let mut ctx = Context::new(7);
/// let network = ValueNetwork::new(&mut ctx, 3, 2, 16, 4, Activation::Tanh).unwrap();
/// let values = network.forward(array![0.1, 0.2, 0.3].view()).unwrap();
/// assert_eq!(values.len(), 4);
/// ```
#[derive(Clone, Debug)]
pub struct ValueNetwork {
    layers: Vec<DenseLayer>,
}

impl ValueNetwork {
    /// Build a network with `hidden_layers` hidden layers of width `hidden_size`,
    /// drawing the initial parameters from the context's generator.
    pub fn new(
        ctx: &mut Context,
        input_size: usize,
        hidden_layers: usize,
        hidden_size: usize,
        output_size: usize,
        activation: Activation,
    ) -> Result<Self> {
        if hidden_layers == 0 {
            return Err(DqnError::invalid_parameter("hidden_layers", "must be at least 1"));
        }
        let mut layer_sizes = Vec::with_capacity(hidden_layers + 2);
        layer_sizes.push(input_size);
        layer_sizes.extend(std::iter::repeat(hidden_size).take(hidden_layers));
        layer_sizes.push(output_size);
        Self::from_layer_sizes(ctx, &layer_sizes, activation, WeightInit::default())
    }

    /// Build a network from explicit layer widths, including input and output.
    /// Every layer but the last uses `activation`.
    pub fn from_layer_sizes(
        ctx: &mut Context,
        layer_sizes: &[usize],
        activation: Activation,
        init: WeightInit,
    ) -> Result<Self> {
        if layer_sizes.len() < 2 {
            return Err(DqnError::invalid_parameter(
                "layer_sizes".to_string(),
                format!("need input and output sizes, got {:?}", layer_sizes),
            ));
        }
        if layer_sizes.iter().any(|&size| size == 0) {
            return Err(DqnError::invalid_parameter(
                "layer_sizes".to_string(),
                format!("all sizes must be positive, got {:?}", layer_sizes),
            ));
        }

        let last = layer_sizes.len() - 2;
        let layers = layer_sizes
            .windows(2)
            .enumerate()
            .map(|(i, window)| {
                let layer_activation = if i == last { Activation::Identity } else { activation };
                DenseLayer::new(window[0], window[1], layer_activation, init, ctx.rng())
            })
            .collect();

        Ok(ValueNetwork { layers })
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_size()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_size()
    }

    /// Widths of every layer boundary, input first
    pub fn layer_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![self.input_size()];
        sizes.extend(self.layers.iter().map(|layer| layer.output_size()));
        sizes
    }

    /// Value estimates for a single observation.
    pub fn forward(&self, observation: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = observation.insert_axis(Axis(0));
        let output = self.predict_batch(batch)?;
        Ok(output.index_axis_move(Axis(0), 0))
    }

    /// Value estimates for a batch of observations, one row each, without
    /// touching the backward-pass cache.
    pub fn predict_batch(&self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(observations)?;
        let mut current = self.layers[0].predict_batch(observations);
        for layer in &self.layers[1..] {
            current = layer.predict_batch(current.view());
        }
        Ok(current)
    }

    /// Batch forward pass that records the activations needed by
    /// [`backward_batch`](Self::backward_batch).
    pub fn forward_batch(&mut self, observations: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(observations)?;
        let (first, rest) = self.layers.split_at_mut(1);
        let mut current = first[0].forward_batch(observations);
        for layer in rest {
            current = layer.forward_batch(current.view());
        }
        Ok(current)
    }

    /// Back-propagate the loss gradient with respect to the network output
    /// through the activations cached by the last `forward_batch`.
    pub fn backward_batch(&self, output_gradients: ArrayView2<f32>) -> Result<Vec<LayerGradients>> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_gradients.to_owned();
        for layer in self.layers.iter().rev() {
            let (input_error, layer_gradients) = layer.backward_batch(current_error.view())?;
            gradients.push(layer_gradients);
            current_error = input_error;
        }
        gradients.reverse();
        Ok(gradients)
    }

    /// The layers holding the trainable parameters
    pub fn parameters(&self) -> &[DenseLayer] {
        &self.layers
    }

    /// Mutable binding point for an [`Optimizer`](crate::optimizer::Optimizer)
    pub fn parameters_mut(&mut self) -> &mut [DenseLayer] {
        &mut self.layers
    }

    pub fn parameter_set(&self) -> ParameterSet {
        ParameterSet {
            layers: self
                .layers
                .iter()
                .map(|layer| LayerParameters {
                    weights: layer.weights.clone(),
                    biases: layer.biases.clone(),
                })
                .collect(),
        }
    }

    /// Overwrite every parameter from `parameters`, which must match this
    /// network's shapes exactly.
    pub fn set_parameters(&mut self, parameters: &ParameterSet) -> Result<()> {
        let expected = self.parameter_shapes();
        let actual = parameters.shapes();
        if expected != actual {
            return Err(DqnError::shape_mismatch(format!("{:?}", expected), format!("{:?}", actual)));
        }
        for (layer, source) in self.layers.iter_mut().zip(&parameters.layers) {
            layer.weights.assign(&source.weights);
            layer.biases.assign(&source.biases);
        }
        Ok(())
    }

    /// Wholesale copy of `other`'s parameters into this network.
    pub fn load_parameters_from(&mut self, other: &ValueNetwork) -> Result<()> {
        if self.parameter_shapes() != other.parameter_shapes() {
            return Err(DqnError::shape_mismatch(
                format!("{:?}", self.layer_sizes()),
                format!("{:?}", other.layer_sizes()),
            ));
        }
        for (layer, source) in self.layers.iter_mut().zip(&other.layers) {
            layer.weights.assign(&source.weights);
            layer.biases.assign(&source.biases);
        }
        Ok(())
    }

    /// Serialize the parameters to `path` with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = fs::File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), &self.parameter_set())?;
        Ok(())
    }

    /// Restore parameters written by [`save`](Self::save). Fails with a shape
    /// mismatch if the file describes a different architecture.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let file = fs::File::open(path)?;
        let parameters: ParameterSet = bincode::deserialize_from(BufReader::new(file))?;
        self.set_parameters(&parameters)
    }

    fn parameter_shapes(&self) -> Vec<((usize, usize), usize)> {
        self.layers
            .iter()
            .map(|layer| (layer.weights.dim(), layer.biases.len()))
            .collect()
    }

    fn check_input(&self, observations: ArrayView2<f32>) -> Result<()> {
        let width = observations.ncols();
        if width != self.input_size() {
            return Err(DqnError::shape_mismatch(
                format!("observation of size {}", self.input_size()),
                format!("observation of size {}", width),
            ));
        }
        Ok(())
    }
}
