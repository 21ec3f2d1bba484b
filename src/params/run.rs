use std::fmt;

use serde::{Deserialize, Serialize};

use super::ParamsError;

/// Default time between consecutive scans
pub const DEFAULT_MS_RT_DIFF: f64 = 0.03;
/// Default lowest reported peak intensity
pub const DEFAULT_MIN_INTENSITY: f64 = 100.0;
/// Default intensity ceiling
pub const DEFAULT_MAX_INTENSITY: f64 = 1e10;
/// Default precursor isolation tolerance in m/z
pub const DEFAULT_ISOLATION_WINDOW_WIDTH: f64 = 0.5;
/// Default number of fragment scans per survey scan
pub const DEFAULT_MAX_MS2_SPECTRA: usize = 10;
/// Default dynamic exclusion duration
pub const DEFAULT_DYNAMIC_EXCLUSION: f64 = 30.0;
/// Default lower m/z reporting bound
pub const DEFAULT_MZ_LOWER_LIMIT: f64 = 0.0;
/// Default upper m/z reporting bound
pub const DEFAULT_MZ_UPPER_LIMIT: f64 = 2000.0;
/// Default fraction of fragment intensity surviving collisional dissociation
pub const DEFAULT_FRAGMENT_YIELD: f64 = 0.5;

/// Unit of the simulated time axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Second,
    Minute,
}

impl TimeUnit {
    /// Unit ontology accession
    pub fn accession(&self) -> &'static str {
        match self {
            TimeUnit::Second => "UO:0000010",
            TimeUnit::Minute => "UO:0000031",
        }
    }

    /// Unit ontology name
    pub fn name(&self) -> &'static str {
        match self {
            TimeUnit::Second => "second",
            TimeUnit::Minute => "minute",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Run parameters as provided by the user, every field optional.
///
/// Turn into [`RunParameters`] with [`RunSettings::validate`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    pub gradient_length: Option<f64>,
    pub ms_rt_diff: Option<f64>,
    pub min_intensity: Option<f64>,
    pub max_intensity: Option<f64>,
    pub isolation_window_width: Option<f64>,
    pub max_ms2_spectra: Option<usize>,
    pub dynamic_exclusion: Option<f64>,
    pub mz_lower_limit: Option<f64>,
    pub mz_upper_limit: Option<f64>,
    pub fragment_yield: Option<f64>,
    pub time_unit: Option<TimeUnit>,
}

impl RunSettings {
    /// Settings with only the gradient length set
    pub fn with_gradient(gradient_length: f64) -> Self {
        Self {
            gradient_length: Some(gradient_length),
            ..Self::default()
        }
    }

    /// Fill unset fields from `fallback`; values already set here win.
    pub fn or(self, fallback: RunSettings) -> RunSettings {
        RunSettings {
            gradient_length: self.gradient_length.or(fallback.gradient_length),
            ms_rt_diff: self.ms_rt_diff.or(fallback.ms_rt_diff),
            min_intensity: self.min_intensity.or(fallback.min_intensity),
            max_intensity: self.max_intensity.or(fallback.max_intensity),
            isolation_window_width: self
                .isolation_window_width
                .or(fallback.isolation_window_width),
            max_ms2_spectra: self.max_ms2_spectra.or(fallback.max_ms2_spectra),
            dynamic_exclusion: self.dynamic_exclusion.or(fallback.dynamic_exclusion),
            mz_lower_limit: self.mz_lower_limit.or(fallback.mz_lower_limit),
            mz_upper_limit: self.mz_upper_limit.or(fallback.mz_upper_limit),
            fragment_yield: self.fragment_yield.or(fallback.fragment_yield),
            time_unit: self.time_unit.or(fallback.time_unit),
        }
    }

    /// Merge with defaults and check every value.
    pub fn validate(&self) -> Result<RunParameters, ParamsError> {
        let gradient_length = self.gradient_length.ok_or_else(|| ParamsError::MissingField {
            owner: "run parameters".to_string(),
            field: "gradient_length",
        })?;
        let params = RunParameters {
            gradient_length,
            ms_rt_diff: self.ms_rt_diff.unwrap_or(DEFAULT_MS_RT_DIFF),
            min_intensity: self.min_intensity.unwrap_or(DEFAULT_MIN_INTENSITY),
            max_intensity: self.max_intensity.unwrap_or(DEFAULT_MAX_INTENSITY),
            isolation_window_width: self
                .isolation_window_width
                .unwrap_or(DEFAULT_ISOLATION_WINDOW_WIDTH),
            max_ms2_spectra: self.max_ms2_spectra.unwrap_or(DEFAULT_MAX_MS2_SPECTRA),
            dynamic_exclusion: self.dynamic_exclusion.unwrap_or(DEFAULT_DYNAMIC_EXCLUSION),
            mz_lower_limit: self.mz_lower_limit.unwrap_or(DEFAULT_MZ_LOWER_LIMIT),
            mz_upper_limit: self.mz_upper_limit.unwrap_or(DEFAULT_MZ_UPPER_LIMIT),
            fragment_yield: self.fragment_yield.unwrap_or(DEFAULT_FRAGMENT_YIELD),
            time_unit: self.time_unit.unwrap_or_default(),
        };
        params.check()?;
        Ok(params)
    }
}

/// Validated run parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunParameters {
    /// Total simulated time
    pub gradient_length: f64,
    /// Time between consecutive scans
    pub ms_rt_diff: f64,
    /// Peaks below this intensity are not reported
    pub min_intensity: f64,
    /// Peaks above this intensity are clipped
    pub max_intensity: f64,
    /// m/z tolerance for co-isolation around a selected precursor
    pub isolation_window_width: f64,
    /// Fragment scans per survey scan
    pub max_ms2_spectra: usize,
    /// Time before a fragmented molecule may be selected again
    pub dynamic_exclusion: f64,
    pub mz_lower_limit: f64,
    pub mz_upper_limit: f64,
    /// Multiplier applied to fragment intensities after noise
    pub fragment_yield: f64,
    pub time_unit: TimeUnit,
}

impl RunParameters {
    fn check(&self) -> Result<(), ParamsError> {
        fn invalid(field: &'static str, value: f64, reason: &'static str) -> ParamsError {
            ParamsError::InvalidRunParameter {
                field,
                value,
                reason,
            }
        }

        if !self.gradient_length.is_finite() || self.gradient_length < 0.0 {
            return Err(invalid(
                "gradient_length",
                self.gradient_length,
                "must be finite and non-negative",
            ));
        }
        if !self.ms_rt_diff.is_finite() || self.ms_rt_diff <= 0.0 {
            return Err(invalid("ms_rt_diff", self.ms_rt_diff, "must be positive"));
        }
        if self.min_intensity.is_nan() || self.min_intensity < 0.0 {
            return Err(invalid(
                "min_intensity",
                self.min_intensity,
                "must be non-negative",
            ));
        }
        if self.max_intensity.is_nan() || self.max_intensity < self.min_intensity {
            return Err(invalid(
                "max_intensity",
                self.max_intensity,
                "must not be below min_intensity",
            ));
        }
        if self.isolation_window_width.is_nan() || self.isolation_window_width < 0.0 {
            return Err(invalid(
                "isolation_window_width",
                self.isolation_window_width,
                "must be non-negative",
            ));
        }
        if self.dynamic_exclusion.is_nan() || self.dynamic_exclusion < 0.0 {
            return Err(invalid(
                "dynamic_exclusion",
                self.dynamic_exclusion,
                "must be non-negative",
            ));
        }
        if self.mz_lower_limit.is_nan()
            || self.mz_upper_limit.is_nan()
            || self.mz_lower_limit >= self.mz_upper_limit
        {
            return Err(invalid(
                "mz_upper_limit",
                self.mz_upper_limit,
                "must be above mz_lower_limit",
            ));
        }
        if !(0.0..=1.0).contains(&self.fragment_yield) {
            return Err(invalid(
                "fragment_yield",
                self.fragment_yield,
                "must be within [0, 1]",
            ));
        }
        Ok(())
    }

    /// Simulation time of the `n`-th scan
    #[inline]
    pub fn time_of(&self, n: u64) -> f64 {
        n as f64 * self.ms_rt_diff
    }

    /// Whether `mz` lies inside the reporting bounds
    #[inline]
    pub fn mz_in_range(&self, mz: f64) -> bool {
        mz >= self.mz_lower_limit && mz <= self.mz_upper_limit
    }
}

impl fmt::Display for RunParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gradient {} {}s, step {}, intensity [{}, {}], isolation ±{} m/z, top {}, exclusion {}, m/z [{}, {}], fragment yield {}",
            self.gradient_length,
            self.time_unit,
            self.ms_rt_diff,
            self.min_intensity,
            self.max_intensity,
            self.isolation_window_width,
            self.max_ms2_spectra,
            self.dynamic_exclusion,
            self.mz_lower_limit,
            self.mz_upper_limit,
            self.fragment_yield
        )
    }
}
