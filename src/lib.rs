//! # copa-dqn - Deep Q-Network training core
//!
//! Trains a DQN agent that picks discrete actions against a network-simulator
//! environment behind a step/reset interface. The crate contains the
//! experience replay ring, the epsilon-greedy policy, the target network
//! synchronization and the Q-learning update, together with the small
//! feed-forward network they operate on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use copa_dqn::agent::DqnAgent;
//! use copa_dqn::config::Config;
//! use copa_dqn::context::Context;
//! use copa_dqn::environment::CorridorEnv;
//! use copa_dqn::trainer::Trainer;
//!
//! let config = Config::default();
//! let mut env = CorridorEnv::new(10, 200).unwrap();
//! let mut ctx = Context::new(config.agent.seed);
//! let mut agent = DqnAgent::from_env(&mut ctx, &config.agent, &env).unwrap();
//!
//! let record = Trainer::new(config.trainer.clone()).train(&mut agent, &mut env).unwrap();
//! println!("best average score: {:?}", record.best_avg_score);
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Closed set of layer activations
//! - [`agent`] - The DQN agent, its learning step and checkpoints
//! - [`config`] - YAML configuration
//! - [`context`] - Explicit device and seeded randomness
//! - [`environment`] - The environment boundary and a demo environment
//! - [`error`] - Error types and result handling
//! - [`exploration`] - Epsilon-greedy action selection
//! - [`layers`] - Dense layers and weight initialization
//! - [`network`] - The value network
//! - [`optimizer`] - SGD and Adam
//! - [`replay_buffer`] - Fixed-capacity transition ring
//! - [`trainer`] - Episode loop and training records

pub mod activations;
pub mod agent;
pub mod config;
pub mod context;
pub mod environment;
pub mod error;
pub mod exploration;
pub mod layers;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod trainer;

#[cfg(test)]
mod tests;
