use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{symmetric, NoiseInjector, DEFAULT_DROPOUT};
use crate::scan::Scan;

/// Uniform jitter: m/z by up to `±mz·ppm_noise`, intensity by up to
/// `±i·intensity_noise`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniformNoise {
    /// Relative m/z jitter (5e-6 = 5 ppm)
    pub ppm_noise: f64,
    /// Relative intensity jitter
    pub intensity_noise: f64,
    /// Fragment peak dropout probability
    pub dropout: f64,
}

impl Default for UniformNoise {
    fn default() -> Self {
        Self {
            ppm_noise: 5e-6,
            intensity_noise: 0.05,
            dropout: DEFAULT_DROPOUT,
        }
    }
}

impl NoiseInjector for UniformNoise {
    fn perturb(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        for mz in &mut scan.mz {
            *mz += symmetric(rng, *mz * self.ppm_noise);
        }
        for i in &mut scan.intensity {
            *i += symmetric(rng, *i * self.intensity_noise);
        }
    }

    fn dropout(&self) -> f64 {
        self.dropout
    }
}
