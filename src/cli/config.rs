//! TOML configuration file support.
//!
//! Every simulation setting can live in one file; command line flags take
//! precedence over it:
//!
//! ```toml
//! # smiter.toml
//! seed = 42
//!
//! [run]
//! gradient_length = 1800
//! ms_rt_diff = 0.03
//! max_ms2_spectra = 5
//!
//! [noise]
//! model = "gaussian"
//! variance = 0.1
//!
//! [fragmentor]
//! kind = "peptide"
//! policy = "permissive"
//!
//! [output]
//! write_molecule_table = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use smiter::fragmentation::FragmentorConfig;
use smiter::noise::NoiseModel;
use smiter::params::{RunSettings, TimeUnit};

/// Root configuration structure for smiter.toml files.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RNG seed for noise sampling
    pub seed: Option<u64>,

    /// Run parameters; missing fields take the documented defaults.
    pub run: RunSettings,

    /// Noise model; uniform jitter when absent.
    pub noise: Option<NoiseModel>,

    pub fragmentor: FragmentorConfig,

    pub output: OutputConfig,
}

/// Settings for the written files.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Write `<stem>.molecules.csv` next to the mzML (default true).
    pub write_molecule_table: Option<bool>,

    /// Time unit of scan start times; overrides `[run] time_unit`.
    pub time_unit: Option<TimeUnit>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smiter::fragmentation::{FragmentorKind, MissingFragmentPolicy};

    #[test]
    fn test_parse_config() {
        let toml = r#"
            seed = 42

            [run]
            gradient_length = 1800
            max_ms2_spectra = 5
            dynamic_exclusion = 12.5

            [noise]
            model = "gaussian"
            variance = 0.1

            [fragmentor]
            kind = "peptide"
            policy = "permissive"

            [output]
            write_molecule_table = false
            time_unit = "minute"
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.run.gradient_length, Some(1800.0));
        assert_eq!(config.run.max_ms2_spectra, Some(5));
        assert_eq!(config.run.dynamic_exclusion, Some(12.5));
        assert_eq!(config.noise.as_ref().map(NoiseModel::name), Some("gaussian"));
        assert_eq!(config.fragmentor.kind, FragmentorKind::Peptide);
        assert_eq!(config.fragmentor.policy, MissingFragmentPolicy::Permissive);
        assert_eq!(config.output.write_molecule_table, Some(false));
        assert_eq!(config.output.time_unit, Some(TimeUnit::Minute));
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [run]
            ms_rt_diff = 0.5
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.run.ms_rt_diff, Some(0.5));
        assert_eq!(config.run.gradient_length, None);
        assert!(config.noise.is_none());
        assert_eq!(config.fragmentor.kind, FragmentorKind::Nucleoside);
    }

    #[test]
    fn test_static_fragmentor_peaks() {
        let toml = r#"
            [fragmentor]
            kind = "static"
            peaks = [[200.0, 100.0], [300.5, 50.0]]
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.fragmentor.peaks, vec![(200.0, 100.0), (300.5, 50.0)]);
    }

    #[test]
    fn test_unknown_run_field_rejected() {
        let toml = r#"
            [run]
            gradient = 10
        "#;
        assert!(Config::from_str(toml).is_err());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.seed, None);
        assert_eq!(config.run.gradient_length, None);
    }
}
