//! YAML run configuration for a simulation universe.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How long to equilibrate and how to bin the measurement sweeps.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct UniverseConfig {
    /// Unmeasured sweeps each simulation performs before the first bin
    pub equilibrium_sweeps: usize,
    /// Number of bins to record
    pub bins: usize,
    /// Sweeps advanced per bin
    pub measurement_sweeps_per_bin: usize,
    /// Seed for the per-simulation random streams; drawn from entropy if absent
    pub seed: Option<u64>,
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            equilibrium_sweeps: 500_000,
            bins: 100,
            measurement_sweeps_per_bin: 10_000,
            seed: None,
        }
    }
}

impl UniverseConfig {
    pub fn with_equilibrium_sweeps(mut self, n: usize) -> Self {
        self.equilibrium_sweeps = n;
        self
    }

    pub fn with_bins(mut self, n: usize) -> Self {
        self.bins = n;
        self
    }

    pub fn with_measurement_sweeps_per_bin(mut self, n: usize) -> Self {
        self.measurement_sweeps_per_bin = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Read a [`UniverseConfig`] from a YAML file. Missing keys take their defaults.
pub fn read_universe_config(filename: &str) -> Result<UniverseConfig> {
    let file = std::fs::File::open(filename)?;
    let reader = std::io::BufReader::new(file);
    let config: UniverseConfig = serde_yaml::from_reader(reader)?;
    debug!("read {:?} from {}", config, filename);
    Ok(config)
}

// example of yaml file
// equilibrium_sweeps: 500000
// bins: 100
// measurement_sweeps_per_bin: 10000
// seed: 42
