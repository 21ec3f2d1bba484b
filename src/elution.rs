//! # Elution Model
//!
//! Maps a retention time onto a dimensionless abundance factor for a molecule
//! eluting inside the window `[start, start + width)`.
//!
//! Four shapes are supported:
//!
//! | name         | parameters (default)                 | value at `t`                                   |
//! |--------------|--------------------------------------|------------------------------------------------|
//! | `gauss`      | `sigma` (`width / 10`, else 1)       | normal density centred at `start + 0.5 width`   |
//! | `gamma`      | `a` (5), `scale` (0.33)              | gamma density evaluated at absolute `t`         |
//! | `gauss_tail` | `sigma` (2), `slope` (0.12)          | unnormalised kernel, sigma growing with `t`     |
//! | `flat`       | none                                 | `1.0`                                          |
//!
//! All functions are pure: the same arguments always produce the same value.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, Gamma, Normal};

/// Default gamma shape parameter
pub const DEFAULT_GAMMA_A: f64 = 5.0;
/// Default gamma scale parameter
pub const DEFAULT_GAMMA_SCALE: f64 = 0.33;
/// Gaussian sigma used when the window is too narrow to derive one
pub const DEFAULT_GAUSS_SIGMA: f64 = 1.0;
/// Default base sigma of the tailing Gaussian
pub const DEFAULT_TAIL_SIGMA: f64 = 2.0;
/// Default growth of the tailing Gaussian's sigma per time unit
pub const DEFAULT_TAIL_SLOPE: f64 = 0.12;
/// Position of the tailing Gaussian's apex as a fraction of the window
pub const TAIL_APEX_FRACTION: f64 = 0.3;

/// Errors raised while resolving an elution shape
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShapeError {
    #[error("Unknown elution shape: {0:?}")]
    UnknownShape(String),

    #[error("Unknown parameter {key:?} for elution shape {shape}")]
    UnknownParameter { shape: &'static str, key: String },

    #[error("Invalid value {value} for parameter {key:?} of elution shape {shape}")]
    InvalidParameter {
        shape: &'static str,
        key: String,
        value: f64,
    },
}

/// A resolved elution shape with all parameters filled in
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "peak_function", rename_all = "snake_case")]
pub enum ElutionShape {
    /// Normal density centred in the window
    Gauss { sigma: f64 },
    /// Gamma density evaluated at absolute time
    Gamma { a: f64, scale: f64 },
    /// Gaussian kernel whose sigma widens with elapsed time
    GaussTail { sigma: f64, slope: f64 },
    /// Constant abundance
    Flat,
}

impl Default for ElutionShape {
    fn default() -> Self {
        ElutionShape::Flat
    }
}

impl ElutionShape {
    /// Resolve a shape name plus raw parameter map into a validated shape.
    ///
    /// `None`, `"none"`, `"null"`, `"flat"` and the empty string all select
    /// the flat shape. Missing parameters fall back to the documented defaults;
    /// `gauss` needs the window width for its default sigma.
    pub fn resolve(
        name: Option<&str>,
        params: &BTreeMap<String, f64>,
        window_width: f64,
    ) -> Result<Self, ShapeError> {
        let name = name.map(str::trim).unwrap_or("");
        match name.to_ascii_lowercase().as_str() {
            "gauss" | "gaussian" => {
                let shape = "gauss";
                check_keys(shape, params, &["sigma"])?;
                let sigma = params.get("sigma").copied().unwrap_or_else(|| {
                    let derived = window_width / 10.0;
                    if derived.is_finite() && derived > 0.0 {
                        derived
                    } else {
                        DEFAULT_GAUSS_SIGMA
                    }
                });
                positive(shape, "sigma", sigma)?;
                Ok(ElutionShape::Gauss { sigma })
            }
            "gamma" => {
                let shape = "gamma";
                check_keys(shape, params, &["a", "scale"])?;
                let a = params.get("a").copied().unwrap_or(DEFAULT_GAMMA_A);
                let scale = params
                    .get("scale")
                    .copied()
                    .unwrap_or(DEFAULT_GAMMA_SCALE);
                positive(shape, "a", a)?;
                positive(shape, "scale", scale)?;
                Ok(ElutionShape::Gamma { a, scale })
            }
            "gauss_tail" => {
                let shape = "gauss_tail";
                check_keys(shape, params, &["sigma", "slope"])?;
                let sigma = params.get("sigma").copied().unwrap_or(DEFAULT_TAIL_SIGMA);
                let slope = params.get("slope").copied().unwrap_or(DEFAULT_TAIL_SLOPE);
                positive(shape, "sigma", sigma)?;
                if !slope.is_finite() || slope < 0.0 {
                    return Err(ShapeError::InvalidParameter {
                        shape,
                        key: "slope".to_string(),
                        value: slope,
                    });
                }
                Ok(ElutionShape::GaussTail { sigma, slope })
            }
            "" | "none" | "null" | "flat" => {
                check_keys("flat", params, &[])?;
                Ok(ElutionShape::Flat)
            }
            other => Err(ShapeError::UnknownShape(other.to_string())),
        }
    }

    /// Canonical shape name
    pub fn name(&self) -> &'static str {
        match self {
            ElutionShape::Gauss { .. } => "gauss",
            ElutionShape::Gamma { .. } => "gamma",
            ElutionShape::GaussTail { .. } => "gauss_tail",
            ElutionShape::Flat => "flat",
        }
    }

    /// Resolved parameters as a name → value map
    pub fn params(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        match *self {
            ElutionShape::Gauss { sigma } => {
                map.insert("sigma".to_string(), sigma);
            }
            ElutionShape::Gamma { a, scale } => {
                map.insert("a".to_string(), a);
                map.insert("scale".to_string(), scale);
            }
            ElutionShape::GaussTail { sigma, slope } => {
                map.insert("sigma".to_string(), sigma);
                map.insert("slope".to_string(), slope);
            }
            ElutionShape::Flat => {}
        }
        map
    }

    /// Abundance factor at time `t` for a window starting at `window_start`
    /// and lasting `window_width`. Always finite and `>= 0`.
    pub fn scale(&self, t: f64, window_start: f64, window_width: f64) -> f64 {
        let value = match *self {
            ElutionShape::Gauss { sigma } => {
                let mu = window_start + 0.5 * window_width;
                Normal::new(mu, sigma).map_or(0.0, |n| n.pdf(t))
            }
            // Evaluated at absolute t, not at t - window_start.
            ElutionShape::Gamma { a, scale } => {
                if t <= 0.0 {
                    0.0
                } else {
                    Gamma::new(a, 1.0 / scale).map_or(0.0, |g| g.pdf(t))
                }
            }
            ElutionShape::GaussTail { sigma, slope } => {
                let mu = window_start + TAIL_APEX_FRACTION * window_width;
                let sigma_t = slope * (t - window_start) + sigma;
                if sigma_t <= 0.0 {
                    0.0
                } else {
                    let z = (t - mu) / sigma_t;
                    (-0.5 * z * z).exp()
                }
            }
            ElutionShape::Flat => 1.0,
        };
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }
}

impl fmt::Display for ElutionShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        let params = self.params();
        if !params.is_empty() {
            write!(f, "(")?;
            for (i, (k, v)) in params.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}={}", k, v)?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// String-keyed entry point: resolve `shape_name` with `params` and evaluate it.
pub fn scale(
    shape_name: Option<&str>,
    t: f64,
    params: &BTreeMap<String, f64>,
    window_start: f64,
    window_width: f64,
) -> Result<f64, ShapeError> {
    let shape = ElutionShape::resolve(shape_name, params, window_width)?;
    Ok(shape.scale(t, window_start, window_width))
}

fn check_keys(
    shape: &'static str,
    params: &BTreeMap<String, f64>,
    allowed: &[&str],
) -> Result<(), ShapeError> {
    match params.keys().find(|k| !allowed.contains(&k.as_str())) {
        Some(key) => Err(ShapeError::UnknownParameter {
            shape,
            key: key.clone(),
        }),
        None => Ok(()),
    }
}

fn positive(shape: &'static str, key: &str, value: f64) -> Result<(), ShapeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ShapeError::InvalidParameter {
            shape,
            key: key.to_string(),
            value,
        })
    }
}
