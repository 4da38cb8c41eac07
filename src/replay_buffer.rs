use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::Rng;

use crate::error::{DqnError, Result};

/// One `(observation, action, reward, next_observation, done)` tuple.
#[derive(Clone, Debug, PartialEq)]
pub struct Transition {
    pub observation: Array1<f32>,
    pub action: usize,
    pub reward: f32,
    pub next_observation: Array1<f32>,
    pub done: bool,
}

/// A sampled minibatch. Row `i` of every field comes from buffer slot `indices[i]`.
#[derive(Clone, Debug)]
pub struct Batch {
    pub indices: Vec<usize>,
    pub observations: Array2<f32>,
    pub actions: Vec<usize>,
    pub rewards: Array1<f32>,
    pub next_observations: Array2<f32>,
    pub dones: Vec<bool>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Fixed-capacity ring of transitions stored as parallel arrays.
///
/// The `n`-th stored transition (counting from zero) lands in slot `n % capacity`,
/// so once the ring is full the oldest slot is overwritten first.
#[derive(Clone, Debug)]
pub struct ReplayBuffer {
    observations: Array2<f32>,
    next_observations: Array2<f32>,
    actions: Vec<usize>,
    rewards: Vec<f32>,
    dones: Vec<bool>,
    capacity: usize,
    counter: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize, observation_dim: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(DqnError::invalid_parameter("capacity", "must be greater than 0"));
        }
        Ok(ReplayBuffer {
            observations: Array2::zeros((capacity, observation_dim)),
            next_observations: Array2::zeros((capacity, observation_dim)),
            actions: vec![0; capacity],
            rewards: vec![0.0; capacity],
            dones: vec![false; capacity],
            capacity,
            counter: 0,
        })
    }

    /// Write a transition into the next ring slot.
    ///
    /// # Panics
    ///
    /// Panics if either observation does not have the buffer's dimensionality.
    pub fn store(&mut self, transition: &Transition) {
        self.store_parts(
            transition.observation.view(),
            transition.action,
            transition.reward,
            transition.next_observation.view(),
            transition.done,
        );
    }

    /// [`store`](Self::store) without building a [`Transition`] first.
    pub fn store_parts(
        &mut self,
        observation: ArrayView1<f32>,
        action: usize,
        reward: f32,
        next_observation: ArrayView1<f32>,
        done: bool,
    ) {
        assert_eq!(observation.len(), self.observation_dim(), "observation size");
        assert_eq!(next_observation.len(), self.observation_dim(), "next observation size");

        let slot = self.counter % self.capacity;
        self.observations.row_mut(slot).assign(&observation);
        self.next_observations.row_mut(slot).assign(&next_observation);
        self.actions[slot] = action;
        self.rewards[slot] = reward;
        self.dones[slot] = done;
        self.counter += 1;
    }

    /// Draw `batch_size` distinct valid slots uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Result<Batch> {
        let available = self.len();
        if batch_size > available {
            return Err(DqnError::InsufficientBuffer {
                available,
                requested: batch_size,
            });
        }

        let indices = index::sample(rng, available, batch_size).into_vec();
        let dim = self.observation_dim();
        let mut observations = Array2::zeros((batch_size, dim));
        let mut next_observations = Array2::zeros((batch_size, dim));
        let mut actions = Vec::with_capacity(batch_size);
        let mut rewards = Array1::zeros(batch_size);
        let mut dones = Vec::with_capacity(batch_size);

        for (row, &slot) in indices.iter().enumerate() {
            observations.row_mut(row).assign(&self.observations.row(slot));
            next_observations.row_mut(row).assign(&self.next_observations.row(slot));
            actions.push(self.actions[slot]);
            rewards[row] = self.rewards[slot];
            dones.push(self.dones[slot]);
        }

        Ok(Batch {
            indices,
            observations,
            actions,
            rewards,
            next_observations,
            dones,
        })
    }

    /// Read back the transition held in `slot`, if that slot has been written.
    pub fn get(&self, slot: usize) -> Option<Transition> {
        if slot >= self.len() {
            return None;
        }
        Some(Transition {
            observation: self.observations.row(slot).to_owned(),
            action: self.actions[slot],
            reward: self.rewards[slot],
            next_observation: self.next_observations.row(slot).to_owned(),
            done: self.dones[slot],
        })
    }

    /// Number of valid slots, `min(total_stored, capacity)`
    pub fn len(&self) -> usize {
        self.counter.min(self.capacity)
    }

    pub fn is_empty(&self) -> bool {
        self.counter == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of `store` calls since construction
    pub fn total_stored(&self) -> usize {
        self.counter
    }

    pub fn observation_dim(&self) -> usize {
        self.observations.ncols()
    }
}
