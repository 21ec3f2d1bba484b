//! Instrument-realistic noise after the JAMSS simulator.
//!
//! Both error terms shrink with normalised intensity `n = i / max(i)`:
//!
//! - m/z standard deviation (ppm): `mz_m · n^(-mz_y)`
//! - relative intensity standard deviation: `intensity_m · (1 − e^(−intensity_c · n)) + intensity_d`
//!
//! Survey scans additionally receive a random number of white-noise peaks.

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{normal, NoiseInjector, DEFAULT_DROPOUT};
use crate::scan::Scan;

/// Normalised intensities are floored here before the power law
const MIN_NORMALISED_INTENSITY: f64 = 1e-3;

/// Intensity-dependent noise with spurious survey peaks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JamssNoise {
    /// m/z error scale in ppm at full intensity
    pub mz_m: f64,
    /// m/z error exponent
    pub mz_y: f64,
    /// Intensity error amplitude (negative: error decreases with intensity)
    pub intensity_m: f64,
    /// Intensity error decay rate
    pub intensity_c: f64,
    /// Intensity error floor at zero intensity
    pub intensity_d: f64,
    /// Fewest white-noise peaks per survey scan
    pub white_noise_min_peaks: usize,
    /// Most white-noise peaks per survey scan
    pub white_noise_max_peaks: usize,
    /// Upper m/z bound of white-noise peaks (lower bound is 0)
    pub white_noise_max_mz: f64,
    /// Smallest total white-noise intensity as a fraction of the TIC
    pub white_noise_min_fraction: f64,
    /// Largest total white-noise intensity as a fraction of the TIC
    pub white_noise_max_fraction: f64,
    /// Fragment peak dropout probability
    pub dropout: f64,
}

impl Default for JamssNoise {
    fn default() -> Self {
        Self {
            mz_m: 1.0,
            mz_y: 0.3,
            intensity_m: -0.2,
            intensity_c: 5.0,
            intensity_d: 0.25,
            white_noise_min_peaks: 100,
            white_noise_max_peaks: 500,
            white_noise_max_mz: 1200.0,
            white_noise_min_fraction: 0.5,
            white_noise_max_fraction: 0.75,
            dropout: DEFAULT_DROPOUT,
        }
    }
}

impl JamssNoise {
    /// m/z standard deviation in ppm at normalised intensity `n`
    pub fn mz_sigma_ppm(&self, n: f64) -> f64 {
        self.mz_m * n.max(MIN_NORMALISED_INTENSITY).powf(-self.mz_y)
    }

    /// Relative intensity standard deviation at normalised intensity `n`
    pub fn intensity_sigma(&self, n: f64) -> f64 {
        (self.intensity_m * (1.0 - (-self.intensity_c * n).exp()) + self.intensity_d).max(0.0)
    }

    fn uniform_between(rng: &mut dyn RngCore, low: f64, high: f64) -> f64 {
        if high > low {
            rng.gen_range(low..high)
        } else {
            low
        }
    }
}

impl NoiseInjector for JamssNoise {
    fn perturb(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        let max_intensity = scan.intensity.iter().copied().fold(0.0_f64, f64::max);
        if max_intensity <= 0.0 {
            return;
        }
        for (mz, i) in scan.mz.iter_mut().zip(scan.intensity.iter_mut()) {
            let n = *i / max_intensity;
            let sigma_mz = self.mz_sigma_ppm(n) * 1e-6 * *mz;
            *mz += normal(rng, 0.0, sigma_mz);
            *i += normal(rng, 0.0, self.intensity_sigma(n) * *i);
        }
    }

    fn survey_extras(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        let tic = scan.total_ion_current();
        if tic <= 0.0 {
            return;
        }
        let count = if self.white_noise_max_peaks > self.white_noise_min_peaks {
            rng.gen_range(self.white_noise_min_peaks..=self.white_noise_max_peaks)
        } else {
            self.white_noise_min_peaks
        };
        if count == 0 {
            return;
        }
        let fraction = Self::uniform_between(
            rng,
            self.white_noise_min_fraction,
            self.white_noise_max_fraction,
        );
        let budget = tic * fraction;

        let weights: Vec<f64> = (0..count).map(|_| rng.gen::<f64>()).collect();
        let weight_sum: f64 = weights.iter().sum();
        if weight_sum <= 0.0 {
            return;
        }
        for w in weights {
            let mz = Self::uniform_between(rng, 0.0, self.white_noise_max_mz);
            scan.push(mz, budget * w / weight_sum);
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

    fn quiet() -> JamssNoise {
        JamssNoise {
            mz_m: 0.0,
            intensity_m: 0.0,
            intensity_d: 0.0,
            ..JamssNoise::default()
        }
    }

    #[test]
    fn test_sigma_decreases_with_intensity() {
        let model = JamssNoise::default();
        assert!(model.mz_sigma_ppm(0.01) > model.mz_sigma_ppm(0.5));
        assert!(model.mz_sigma_ppm(0.5) > model.mz_sigma_ppm(1.0));
        assert!(model.intensity_sigma(0.01) > model.intensity_sigma(0.5));
        assert!(model.intensity_sigma(0.5) > model.intensity_sigma(1.0));
        assert!(model.intensity_sigma(1.0) >= 0.0);
    }

    #[test]
    fn test_white_noise_peaks_added_to_survey() {
        let model = quiet();
        let mut scan = Scan::new_survey(1, 0.0).with_peaks(vec![500.0, 600.0], vec![1e5, 1e5]);
        model.inject(&mut scan, &mut StdRng::seed_from_u64(21));

        let added = scan.len() - 2;
        assert!((100..=500).contains(&added), "added {}", added);
        assert!(scan.mz.windows(2).all(|w| w[0] <= w[1]));

        let noise_total = scan.total_ion_current() - 2e5;
        assert!(noise_total >= 0.5 * 2e5 - 1e-6);
        assert!(noise_total <= 0.75 * 2e5 + 1e-6);
        // original peaks remain untouched by the quiet model
        assert!(scan.mz.iter().zip(&scan.intensity).any(|(m, i)| *m == 500.0 && *i == 1e5));
    }

    #[test]
    fn test_white_noise_range() {
        let model = quiet();
        let mut scan = Scan::new_survey(1, 0.0).with_peaks(vec![1500.0], vec![1e6]);
        model.inject(&mut scan, &mut StdRng::seed_from_u64(4));
        assert!(scan.mz.iter().filter(|mz| **mz != 1500.0).all(|mz| *mz >= 0.0 && *mz < 1200.0));
    }

    #[test]
    fn test_no_white_noise_on_fragments() {
        let model = JamssNoise {
            dropout: 0.0,
            ..quiet()
        };
        let precursor = crate::scan::Precursor {
            mz: 400.0,
            intensity: 1.0,
            charge: 1,
            scan_id: 1,
        };
        let mut scan = Scan::new_fragment(2, 0.0, precursor).with_peaks(vec![150.0], vec![10.0]);
        model.inject(&mut scan, &mut StdRng::seed_from_u64(4));
        assert_eq!(scan.len(), 1);
    }
}
