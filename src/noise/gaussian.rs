use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{normal, NoiseInjector, DEFAULT_DROPOUT};
use crate::scan::Scan;

/// Normally distributed noise.
///
/// m/z error ~ N(ppm_offset·1e-6·mz, ppm_var·1e-6·mz); intensity error
/// ~ N(0, i·variance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianNoise {
    /// Systematic calibration offset in ppm
    pub ppm_offset: f64,
    /// m/z standard deviation in ppm
    pub ppm_var: f64,
    /// Relative intensity standard deviation
    pub variance: f64,
    /// Fragment peak dropout probability
    pub dropout: f64,
}

impl Default for GaussianNoise {
    fn default() -> Self {
        Self {
            ppm_offset: 0.0,
            ppm_var: 1.0,
            variance: 0.02,
            dropout: DEFAULT_DROPOUT,
        }
    }
}

impl NoiseInjector for GaussianNoise {
    fn perturb(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        for mz in &mut scan.mz {
            let scale = *mz * 1e-6;
            *mz += normal(rng, self.ppm_offset * scale, self.ppm_var * scale);
        }
        for i in &mut scan.intensity {
            *i += normal(rng, 0.0, *i * self.variance);
        }
    }

    fn dropout(&self) -> f64 {
        self.dropout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_offset_shifts_mean() {
        let model = GaussianNoise {
            ppm_offset: 10.0,
            ppm_var: 1.0,
            variance: 0.0,
            dropout: 0.0,
        };
        let n = 2000;
        let mut scan = Scan::new_survey(1, 0.0).with_peaks(vec![1000.0; n], vec![1.0; n]);
        model.inject(&mut scan, &mut StdRng::seed_from_u64(5));
        let mean_error = scan.mz.iter().map(|mz| mz - 1000.0).sum::<f64>() / n as f64;
        // 10 ppm of 1000 = 0.01
        assert!((mean_error - 0.01).abs() < 0.0005, "mean error {}", mean_error);
        assert!(scan.intensity.iter().all(|i| *i == 1.0));
    }

    #[test]
    fn test_intensity_spread_scales_with_variance() {
        let model = GaussianNoise {
            ppm_var: 0.0,
            variance: 0.1,
            ..GaussianNoise::default()
        };
        let n = 4000;
        let mut scan = Scan::new_survey(1, 0.0).with_peaks(vec![500.0; n], vec![1000.0; n]);
        model.inject(&mut scan, &mut StdRng::seed_from_u64(8));
        let mean = scan.intensity.iter().sum::<f64>() / n as f64;
        let var = scan.intensity.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / n as f64;
        let sd = var.sqrt();
        assert!((mean - 1000.0).abs() < 10.0);
        assert!((sd - 100.0).abs() < 10.0, "sd {}", sd);
    }
}
