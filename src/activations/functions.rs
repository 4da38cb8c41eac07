use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DqnError;

const LEAKY_RELU_SLOPE: f32 = 0.01;
const SELU_ALPHA: f32 = 1.673_263_2;
const SELU_SCALE: f32 = 1.050_701;

/// The closed set of activation functions a network layer can use.
///
/// Configuration files name them in snake case (`tanh`, `leaky_relu`, ...).
/// The name is resolved once, when the network is built.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    #[default]
    Tanh,
    Relu,
    LeakyRelu,
    Sigmoid,
    Selu,
    Softplus,
    Identity,
}

impl Activation {
    pub const ALL: [Activation; 7] = [
        Activation::Tanh,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Sigmoid,
        Activation::Selu,
        Activation::Softplus,
        Activation::Identity,
    ];

    /// Configuration key of this activation.
    pub fn name(&self) -> &'static str {
        match self {
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Sigmoid => "sigmoid",
            Activation::Selu => "selu",
            Activation::Softplus => "softplus",
            Activation::Identity => "identity",
        }
    }

    /// Evaluate the activation at a single point.
    #[inline]
    pub fn value(&self, v: f32) -> f32 {
        match self {
            Activation::Tanh => v.tanh(),
            Activation::Relu => v.max(0.0),
            Activation::LeakyRelu => {
                if v > 0.0 {
                    v
                } else {
                    LEAKY_RELU_SLOPE * v
                }
            }
            Activation::Sigmoid => sigmoid(v),
            Activation::Selu => {
                if v > 0.0 {
                    SELU_SCALE * v
                } else {
                    SELU_SCALE * SELU_ALPHA * (v.exp() - 1.0)
                }
            }
            // ln(1 + e^v), written to stay finite for large v
            Activation::Softplus => v.max(0.0) + (-v.abs()).exp().ln_1p(),
            Activation::Identity => v,
        }
    }

    /// Derivative with respect to the pre-activation input `v`.
    #[inline]
    pub fn gradient(&self, v: f32) -> f32 {
        match self {
            Activation::Tanh => {
                let t = v.tanh();
                1.0 - t * t
            }
            Activation::Relu => {
                if v > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyRelu => {
                if v > 0.0 {
                    1.0
                } else {
                    LEAKY_RELU_SLOPE
                }
            }
            Activation::Sigmoid => {
                let s = sigmoid(v);
                s * (1.0 - s)
            }
            Activation::Selu => {
                if v > 0.0 {
                    SELU_SCALE
                } else {
                    SELU_SCALE * SELU_ALPHA * v.exp()
                }
            }
            Activation::Softplus => sigmoid(v),
            Activation::Identity => 1.0,
        }
    }

    /// Apply the activation function to an input array in-place.
    pub fn apply(&self, input: &mut Array1<f32>) {
        if *self != Activation::Identity {
            input.mapv_inplace(|v| self.value(v));
        }
    }

    /// Apply the activation function to a batch of input arrays in-place.
    pub fn apply_batch(&self, inputs: &mut Array2<f32>) {
        if *self != Activation::Identity {
            inputs.mapv_inplace(|v| self.value(v));
        }
    }

    /// Compute the derivative of the activation function for an input array.
    pub fn derivative(&self, input: &Array1<f32>) -> Array1<f32> {
        input.mapv(|v| self.gradient(v))
    }

    /// Compute the derivative of the activation function for a batch of pre-activations.
    pub fn derivative_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        match self {
            Activation::Identity => Array2::ones(inputs.dim()),
            _ => inputs.mapv(|v| self.gradient(v)),
        }
    }
}

#[inline]
fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Activation {
    type Err = DqnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .iter()
            .copied()
            .find(|activation| activation.name() == s)
            .ok_or_else(|| {
                DqnError::invalid_parameter("activation".to_string(), format!("unknown activation '{}'", s))
            })
    }
}
