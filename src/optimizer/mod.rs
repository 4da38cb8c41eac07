//! Gradient-step optimizers over a network's dense layers.
//!
//! An optimizer is bound to one network: stateful optimizers such as
//! [`Adam`] keep per-layer moment estimates that only make sense for the
//! parameters they were first applied to.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{DqnError, Result};
use crate::layers::{DenseLayer, LayerGradients};

pub trait Optimizer {
    /// Apply one gradient step to `layers`, `gradients[i]` belonging to `layers[i]`.
    fn apply_gradients(
        &mut self,
        layers: &mut [DenseLayer],
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) -> Result<()>;
}

/// Optimizer selection as it appears in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerKind {
    Sgd,
    #[default]
    Adam,
}

impl OptimizerKind {
    pub fn build(self) -> OptimizerWrapper {
        match self {
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
        }
    }
}

#[derive(Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl Optimizer for OptimizerWrapper {
    fn apply_gradients(
        &mut self,
        layers: &mut [DenseLayer],
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) -> Result<()> {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.apply_gradients(layers, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.apply_gradients(layers, gradients, learning_rate),
        }
    }
}

fn check_gradients(layers: &[DenseLayer], gradients: &[LayerGradients]) -> Result<()> {
    if layers.len() != gradients.len() {
        return Err(DqnError::shape_mismatch(
            format!("{} layer gradients", layers.len()),
            format!("{} layer gradients", gradients.len()),
        ));
    }
    for (layer, grad) in layers.iter().zip(gradients) {
        if layer.weights.dim() != grad.weights.dim() || layer.biases.dim() != grad.biases.dim() {
            return Err(DqnError::shape_mismatch(
                format!("{:?}/{:?}", layer.weights.dim(), layer.biases.dim()),
                format!("{:?}/{:?}", grad.weights.dim(), grad.biases.dim()),
            ));
        }
    }
    Ok(())
}

/// Plain stochastic gradient descent
#[derive(Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn apply_gradients(
        &mut self,
        layers: &mut [DenseLayer],
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) -> Result<()> {
        check_gradients(layers, gradients)?;
        for (layer, grad) in layers.iter_mut().zip(gradients) {
            layer.weights.zip_mut_with(&grad.weights, |w, &g| *w -= learning_rate * g);
            layer.biases.zip_mut_with(&grad.biases, |b, &g| *b -= learning_rate * g);
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
struct Moments {
    m_weights: Array2<f32>,
    v_weights: Array2<f32>,
    m_biases: Array1<f32>,
    v_biases: Array1<f32>,
}

impl Moments {
    fn zeros_like(layer: &DenseLayer) -> Self {
        Moments {
            m_weights: Array2::zeros(layer.weights.dim()),
            v_weights: Array2::zeros(layer.weights.dim()),
            m_biases: Array1::zeros(layer.biases.dim()),
            v_biases: Array1::zeros(layer.biases.dim()),
        }
    }
}

/// Adam with bias-corrected first and second moment estimates
#[derive(Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    moments: Vec<Moments>,
    /// Number of steps applied so far
    pub t: i32,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            moments: Vec::new(),
            t: 0,
        }
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-8)
    }
}

impl Optimizer for Adam {
    fn apply_gradients(
        &mut self,
        layers: &mut [DenseLayer],
        gradients: &[LayerGradients],
        learning_rate: f32,
    ) -> Result<()> {
        check_gradients(layers, gradients)?;
        if self.moments.is_empty() {
            self.moments = layers.iter().map(Moments::zeros_like).collect();
        } else if self.moments.len() != layers.len()
            || self
                .moments
                .iter()
                .zip(layers.iter())
                .any(|(state, layer)| state.m_weights.dim() != layer.weights.dim())
        {
            return Err(DqnError::shape_mismatch(
                "layers Adam was first applied to".to_string(),
                "a different architecture".to_string(),
            ));
        }

        self.t += 1;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let bias1 = 1.0 - beta1.powi(self.t);
        let bias2 = 1.0 - beta2.powi(self.t);

        for ((layer, grad), state) in layers.iter_mut().zip(gradients).zip(self.moments.iter_mut()) {
            state.m_weights.zip_mut_with(&grad.weights, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
            state.v_weights.zip_mut_with(&grad.weights, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);
            state.m_biases.zip_mut_with(&grad.biases, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
            state.v_biases.zip_mut_with(&grad.biases, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

            ndarray::Zip::from(&mut layer.weights)
                .and(&state.m_weights)
                .and(&state.v_weights)
                .for_each(|w, &m, &v| *w -= learning_rate * (m / bias1) / ((v / bias2).sqrt() + eps));
            ndarray::Zip::from(&mut layer.biases)
                .and(&state.m_biases)
                .and(&state.v_biases)
                .for_each(|b, &m, &v| *b -= learning_rate * (m / bias1) / ((v / bias2).sqrt() + eps));
        }
        Ok(())
    }
}
