//! # Activation Functions Module
//!
//! Element-wise non-linearities used by the value network layers.
//!
//! ## Available Activations
//!
//! - **Tanh**: hyperbolic tangent, the default for hidden layers
//! - **ReLU**: `max(0, x)`
//! - **LeakyReLU**: ReLU with a 0.01 negative slope
//! - **Sigmoid**: `1 / (1 + e^(-x))`
//! - **SELU**: scaled exponential linear unit
//! - **Softplus**: `ln(1 + e^x)`
//! - **Identity**: no transformation, used by the output layer
//!
//! ## Usage Example
//!
//! ```rust
//! use copa_dqn::activations::Activation;
//! use ndarray::array;
//!
//! let relu: Activation = "relu".parse().unwrap();
//! let mut data = array![1.0, -0.5, 0.0, 2.0];
//! relu.apply(&mut data);
//! assert_eq!(data, array![1.0, 0.0, 0.0, 2.0]);
//! ```

pub mod functions;

pub use functions::Activation;
