//! # Reinforcement Learning Agents Module
//!
//! The deep Q-learning agent and the interface the training loop drives.
//!
//! ## Core Concepts
//!
//! - **Experience Replay**: transitions go into a fixed-size ring and learning
//!   draws uniform minibatches from it
//! - **Target Network**: a stale copy of the online network, hard-synced every
//!   `replace_target_network_steps` learning steps, supplies the regression targets
//! - **Exploration**: epsilon-greedy with multiplicative decay per learning step
//! - **Warmup**: learning is skipped until the buffer holds one full batch
//!
//! ## Checkpoints
//!
//! [`DqnAgent::save_checkpoint`] writes `online.bin`, `target.bin` and
//! `state.json` into a directory. Loading checks that the stored layer shapes
//! match the constructed agent.

pub mod checkpoint;
pub mod traits;

mod dqn;
pub use checkpoint::{Checkpoint, TrainingState};
pub use dqn::{DqnAgent, Phase};
pub use traits::{Agent, LearnOutcome};
