//! On-disk layout of an agent checkpoint.
//!
//! A checkpoint is a directory holding the online and target parameter sets
//! as two independent bincode artifacts, plus a small JSON record of the
//! training counters.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Paths of the artifacts inside a checkpoint directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    dir: PathBuf,
}

impl Checkpoint {
    pub const ONLINE_FILE: &'static str = "online.bin";
    pub const TARGET_FILE: &'static str = "target.bin";
    pub const STATE_FILE: &'static str = "state.json";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Checkpoint {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn online_path(&self) -> PathBuf {
        self.dir.join(Self::ONLINE_FILE)
    }

    pub fn target_path(&self) -> PathBuf {
        self.dir.join(Self::TARGET_FILE)
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(Self::STATE_FILE)
    }
}

/// Counters that let a resumed run continue its exploration schedule and
/// target sync cadence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingState {
    pub epsilon: f32,
    pub learning_iterations: usize,
    pub layer_sizes: Vec<usize>,
}

impl TrainingState {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}
