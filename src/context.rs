//! Explicit compute context.
//!
//! Networks and agents receive a [`Context`] from the training entrypoint
//! instead of consulting process-wide device state. The context owns the
//! seeded generator that initializes weights and seeds every component that
//! needs its own randomness.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;

/// Device the dense kernels run on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Device {
    /// ndarray kernels on the host CPU
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
        }
    }
}

pub struct Context {
    device: Device,
    seed: u64,
    rng: StdRng,
}

impl Context {
    /// Create a CPU context whose randomness derives from `seed`.
    pub fn new(seed: u64) -> Self {
        Self::with_device(Device::Cpu, seed)
    }

    pub fn with_device(device: Device, seed: u64) -> Self {
        info!("Using device {} with seed {}", device, seed);
        Context {
            device,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Generator used for parameter initialization.
    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Derive an independent generator for a component such as the agent's
    /// sampler. Successive forks from the same context differ, but the whole
    /// sequence is reproducible from the seed.
    pub fn fork_rng(&mut self) -> StdRng {
        // StdRng as a source for from_rng cannot fail
        StdRng::from_rng(&mut self.rng).unwrap_or_else(|_| StdRng::seed_from_u64(self.seed))
    }
}
