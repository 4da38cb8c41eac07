use ndarray::ArrayView1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::environment::{Action, ActionSpace};
use crate::error::{DqnError, Result};

/// Epsilon-greedy action selection with multiplicative decay towards a floor.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    epsilon: f32,
    decay_rate: f32,
    eps_min: f32,
}

impl EpsilonGreedy {
    pub fn new(eps_start: f32, decay_rate: f32, eps_min: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&eps_min) || !(eps_min..=1.0).contains(&eps_start) {
            return Err(DqnError::invalid_parameter(
                "eps".to_string(),
                format!("need 0 <= eps_min <= eps <= 1, got eps={} eps_min={}", eps_start, eps_min),
            ));
        }
        if !(0.0..1.0).contains(&decay_rate) {
            return Err(DqnError::invalid_parameter(
                "eps_decay".to_string(),
                format!("must lie in [0, 1), got {}", decay_rate),
            ));
        }
        Ok(EpsilonGreedy {
            epsilon: eps_start,
            decay_rate,
            eps_min,
        })
    }

    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    pub fn eps_min(&self) -> f32 {
        self.eps_min
    }

    pub fn decay_rate(&self) -> f32 {
        self.decay_rate
    }

    /// Restore a previously reached epsilon, clamped to `[eps_min, 1]`.
    pub fn set_epsilon(&mut self, epsilon: f32) {
        self.epsilon = epsilon.clamp(self.eps_min, 1.0);
    }

    /// Random action with probability epsilon, greedy action from `values` otherwise.
    pub fn select_action<R: Rng + ?Sized>(
        &self,
        values: ArrayView1<f32>,
        action_space: &ActionSpace,
        rng: &mut R,
    ) -> Result<Action> {
        if rng.gen::<f32>() < self.epsilon {
            action_space.sample(rng)
        } else {
            greedy_action(values)
        }
    }

    /// One step of the schedule, applied after each completed learning step.
    pub fn decay(&mut self) {
        self.epsilon = if self.epsilon > self.eps_min {
            (self.epsilon * (1.0 - self.decay_rate)).max(self.eps_min)
        } else {
            self.eps_min
        };
    }
}

/// Index of the largest value; ties go to the first maximal index.
pub fn greedy_action(values: ArrayView1<f32>) -> Result<Action> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            return Err(DqnError::Numerical(format!("NaN value estimate for action {}", i)));
        }
        match best {
            Some((_, best_value)) if v <= best_value => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i).ok_or(DqnError::EmptyActionSpace)
}
