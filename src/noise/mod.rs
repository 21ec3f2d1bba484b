//! # Noise Injection
//!
//! Perturbs simulated spectra so they resemble instrument output.
//!
//! Every injector follows the same pipeline, implemented once in
//! [`NoiseInjector::inject`]:
//!
//! 1. perturb m/z and intensity values (variant-specific law)
//! 2. survey scans: variant-specific extras (spurious peaks)
//! 3. fragment scans: random dropout of peaks
//! 4. clamp intensities to `>= 0` and restore m/z order
//!
//! Empty spectra are returned untouched. All randomness is drawn from the
//! caller's RNG so seeded runs are reproducible.

mod gaussian;
mod jamss;
mod uniform;

pub use gaussian::GaussianNoise;
pub use jamss::JamssNoise;
pub use uniform::UniformNoise;

use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::scan::Scan;

/// Default per-peak dropout probability for fragment scans
pub const DEFAULT_DROPOUT: f64 = 0.1;

/// A noise law applied to scans in place
pub trait NoiseInjector: Send + Sync {
    /// Perturb m/z and intensity values of a non-empty scan
    fn perturb(&self, scan: &mut Scan, rng: &mut dyn RngCore);

    /// Extra survey-level distortions; none by default
    fn survey_extras(&self, _scan: &mut Scan, _rng: &mut dyn RngCore) {}

    /// Per-peak dropout probability applied to fragment scans
    fn dropout(&self) -> f64;

    /// Full pipeline for one scan
    fn inject(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        if scan.is_empty() {
            return;
        }
        self.perturb(scan, rng);
        if scan.is_survey() {
            self.survey_extras(scan, rng);
        } else {
            apply_dropout(scan, self.dropout(), rng);
        }
        clamp_non_negative(scan);
        scan.sort_by_mz();
    }
}

/// Remove each peak independently with probability `dropout`
pub fn apply_dropout(scan: &mut Scan, dropout: f64, rng: &mut dyn RngCore) {
    if dropout <= 0.0 {
        return;
    }
    scan.retain(|_, _| rng.gen::<f64>() >= dropout);
}

/// Replace negative or non-finite intensities with zero
pub fn clamp_non_negative(scan: &mut Scan) {
    for i in &mut scan.intensity {
        if !i.is_finite() || *i < 0.0 {
            *i = 0.0;
        }
    }
}

/// Uniform sample in `[-half_width, half_width)`
#[inline]
pub(crate) fn symmetric(rng: &mut dyn RngCore, half_width: f64) -> f64 {
    (rng.gen::<f64>() * 2.0 - 1.0) * half_width
}

/// Standard normal sample scaled by `sigma` around `mean`
#[inline]
pub(crate) fn normal(rng: &mut dyn RngCore, mean: f64, sigma: f64) -> f64 {
    let z: f64 = rng.sample(rand_distr::StandardNormal);
    mean + z * sigma
}

/// Per-call adjustments of a configured model
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NoiseOverrides {
    /// Replace the fragment dropout probability
    pub dropout: Option<f64>,
    /// Multiply the intensity noise magnitude
    pub intensity_scale: Option<f64>,
}

/// Noise model selected by configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum NoiseModel {
    /// No perturbation at all
    None,
    /// Uniform m/z and intensity jitter
    Uniform(UniformNoise),
    /// Normally distributed m/z and intensity noise
    Gaussian(GaussianNoise),
    /// Intensity-dependent noise plus spurious peaks
    Jamss(JamssNoise),
}

impl Default for NoiseModel {
    fn default() -> Self {
        NoiseModel::Uniform(UniformNoise::default())
    }
}

impl NoiseModel {
    /// Short model name
    pub fn name(&self) -> &'static str {
        match self {
            NoiseModel::None => "none",
            NoiseModel::Uniform(_) => "uniform",
            NoiseModel::Gaussian(_) => "gaussian",
            NoiseModel::Jamss(_) => "jamss",
        }
    }

    /// Copy of this model with `overrides` applied
    pub fn with_overrides(&self, overrides: &NoiseOverrides) -> NoiseModel {
        let scale = overrides.intensity_scale.unwrap_or(1.0);
        match self {
            NoiseModel::None => NoiseModel::None,
            NoiseModel::Uniform(m) => NoiseModel::Uniform(UniformNoise {
                intensity_noise: m.intensity_noise * scale,
                dropout: overrides.dropout.unwrap_or(m.dropout),
                ..*m
            }),
            NoiseModel::Gaussian(m) => NoiseModel::Gaussian(GaussianNoise {
                variance: m.variance * scale,
                dropout: overrides.dropout.unwrap_or(m.dropout),
                ..*m
            }),
            NoiseModel::Jamss(m) => NoiseModel::Jamss(JamssNoise {
                intensity_m: m.intensity_m * scale,
                intensity_d: m.intensity_d * scale,
                dropout: overrides.dropout.unwrap_or(m.dropout),
                ..*m
            }),
        }
    }

    /// Inject noise with one-off parameter overrides
    pub fn inject_with(&self, scan: &mut Scan, rng: &mut dyn RngCore, overrides: &NoiseOverrides) {
        self.with_overrides(overrides).inject(scan, rng);
    }
}

impl NoiseInjector for NoiseModel {
    fn perturb(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        match self {
            NoiseModel::None => {}
            NoiseModel::Uniform(m) => m.perturb(scan, rng),
            NoiseModel::Gaussian(m) => m.perturb(scan, rng),
            NoiseModel::Jamss(m) => m.perturb(scan, rng),
        }
    }

    fn survey_extras(&self, scan: &mut Scan, rng: &mut dyn RngCore) {
        if let NoiseModel::Jamss(m) = self {
            m.survey_extras(scan, rng);
        }
    }

    fn dropout(&self) -> f64 {
        match self {
            NoiseModel::None => 0.0,
            NoiseModel::Uniform(m) => m.dropout,
            NoiseModel::Gaussian(m) => m.dropout,
            NoiseModel::Jamss(m) => m.dropout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Precursor;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn survey() -> Scan {
        Scan::new_survey(1, 0.0).with_peaks(
            vec![100.0, 200.0, 300.0, 400.0],
            vec![1e3, 5e4, 2e5, 10.0],
        )
    }

    fn fragment(n: usize) -> Scan {
        let precursor = Precursor {
            mz: 500.0,
            intensity: 1e5,
            charge: 2,
            scan_id: 1,
        };
        let mz = (0..n).map(|i| 100.0 + i as f64).collect();
        let intensity = vec![1e4; n];
        Scan::new_fragment(2, 0.03, precursor).with_peaks(mz, intensity)
    }

    fn all_models() -> Vec<NoiseModel> {
        vec![
            NoiseModel::None,
            NoiseModel::Uniform(UniformNoise::default()),
            NoiseModel::Gaussian(GaussianNoise::default()),
            NoiseModel::Jamss(JamssNoise::default()),
        ]
    }

    #[test]
    fn test_empty_scan_untouched() {
        let mut rng = StdRng::seed_from_u64(7);
        for model in all_models() {
            let mut scan = Scan::new_survey(1, 0.0);
            model.inject(&mut scan, &mut rng);
            assert!(scan.is_empty(), "{}", model.name());
        }
    }

    #[test]
    fn test_none_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut scan = survey();
        NoiseModel::None.inject(&mut scan, &mut rng);
        assert_eq!(scan, survey());
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        for model in all_models() {
            let mut a = survey();
            let mut b = survey();
            model.inject(&mut a, &mut StdRng::seed_from_u64(42));
            model.inject(&mut b, &mut StdRng::seed_from_u64(42));
            assert_eq!(a, b, "{}", model.name());
        }
    }

    #[test]
    fn test_dropout_only_on_fragments() {
        let model = NoiseModel::Uniform(UniformNoise {
            dropout: 1.0,
            ..UniformNoise::default()
        });
        let mut rng = StdRng::seed_from_u64(1);
        let mut frag = fragment(20);
        model.inject(&mut frag, &mut rng);
        assert!(frag.is_empty());

        let mut scan = survey();
        model.inject(&mut scan, &mut rng);
        assert_eq!(scan.len(), 4);
    }

    #[test]
    fn test_dropout_rate_is_roughly_respected() {
        let model = NoiseModel::Gaussian(GaussianNoise::default());
        let mut rng = StdRng::seed_from_u64(3);
        let mut frag = fragment(5000);
        model.inject(&mut frag, &mut rng);
        let kept = frag.len() as f64 / 5000.0;
        assert!((kept - 0.9).abs() < 0.03, "kept fraction {}", kept);
    }

    #[test]
    fn test_overrides() {
        let model = NoiseModel::Uniform(UniformNoise::default());
        let overrides = NoiseOverrides {
            dropout: Some(0.0),
            intensity_scale: Some(0.0),
        };
        let adjusted = model.with_overrides(&overrides);
        assert_eq!(adjusted.dropout(), 0.0);

        let mut frag = fragment(50);
        model.inject_with(&mut frag, &mut StdRng::seed_from_u64(9), &overrides);
        assert_eq!(frag.len(), 50);
        assert!(frag.intensity.iter().all(|i| *i == 1e4));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let model: NoiseModel = toml::from_str(
            r#"
            model = "gaussian"
            variance = 0.1
            "#,
        )
        .unwrap();
        match model {
            NoiseModel::Gaussian(g) => {
                assert_eq!(g.variance, 0.1);
                assert_eq!(g.dropout, DEFAULT_DROPOUT);
            }
            other => panic!("unexpected model {:?}", other),
        }
    }

    proptest! {
        #[test]
        fn prop_intensities_never_negative(
            seed in any::<u64>(),
            intensities in prop::collection::vec(0.0f64..1e7, 1..50),
            model_index in 0usize..4,
        ) {
            let model = all_models().swap_remove(model_index);
            let mz: Vec<f64> = (0..intensities.len()).map(|i| 150.0 + 3.0 * i as f64).collect();
            let mut rng = StdRng::seed_from_u64(seed);
            for mut scan in [
                Scan::new_survey(1, 0.0).with_peaks(mz.clone(), intensities.clone()),
                fragment(intensities.len()),
            ] {
                model.inject(&mut scan, &mut rng);
                prop_assert!(scan.intensity.iter().all(|i| *i >= 0.0 && i.is_finite()));
                prop_assert!(scan.mz.windows(2).all(|w| w[0] <= w[1]));
                prop_assert_eq!(scan.mz.len(), scan.intensity.len());
            }
        }
    }
}
