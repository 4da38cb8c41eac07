use ndarray::{Array1, Array2};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::Uniform;
use serde::{Deserialize, Serialize};

/// Weight initialization strategies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum WeightInit {
    /// `U(-1/sqrt(fan_in), 1/sqrt(fan_in))` for weights and biases
    #[default]
    FanInUniform,

    /// Xavier/Glorot uniform initialization, zero biases
    XavierUniform,

    /// Uniform distribution with custom range, zero biases.
    /// `min` must not exceed `max`.
    Uniform { min: f32, max: f32 },
}

impl WeightInit {
    /// Initialize a `(fan_in, fan_out)` weight matrix
    pub fn initialize_weights<R: Rng + ?Sized>(&self, shape: (usize, usize), rng: &mut R) -> Array2<f32> {
        let (fan_in, fan_out) = shape;

        match self {
            WeightInit::FanInUniform => {
                let bound = fan_in_bound(fan_in);
                Array2::random_using(shape, Uniform::new_inclusive(-bound, bound), rng)
            }

            WeightInit::XavierUniform => {
                let limit = (6.0 / (fan_in + fan_out).max(1) as f32).sqrt();
                Array2::random_using(shape, Uniform::new_inclusive(-limit, limit), rng)
            }

            WeightInit::Uniform { min, max } => {
                Array2::random_using(shape, Uniform::new_inclusive(*min, *max), rng)
            }
        }
    }

    /// Initialize the biases of a layer with `fan_in` inputs
    pub fn initialize_biases<R: Rng + ?Sized>(&self, fan_in: usize, size: usize, rng: &mut R) -> Array1<f32> {
        match self {
            WeightInit::FanInUniform => {
                let bound = fan_in_bound(fan_in);
                Array1::random_using(size, Uniform::new_inclusive(-bound, bound), rng)
            }
            WeightInit::XavierUniform | WeightInit::Uniform { .. } => Array1::zeros(size),
        }
    }
}

fn fan_in_bound(fan_in: usize) -> f32 {
    1.0 / (fan_in.max(1) as f32).sqrt()
}
