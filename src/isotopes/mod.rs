//! # Isotope Envelopes
//!
//! Turns chemical formulas into charged isotope envelopes (m/z plus relative
//! abundance) and caches them for the duration of a run.
//!
//! The [`EnvelopeSource`] trait is the boundary to whatever computes isotope
//! patterns. [`NaturalAbundance`] is the built-in source; it understands the
//! notations described in [`composition`].
//!
//! ```rust
//! use smiter::isotopes::{EnvelopeSource, NaturalAbundance};
//!
//! let envelope = NaturalAbundance::default()
//!     .envelope("+C(10)H(12)N(4)O(5)", 1)
//!     .unwrap();
//! assert_eq!(envelope.abundance[envelope.highest_peak().unwrap()], 1.0);
//! ```

pub mod composition;
pub mod distribution;
pub mod elements;

mod cache;

pub use cache::{CachedEnvelope, EnvelopeCache, EnvelopeRequest, SkippedFormula};
pub use composition::{Composition, CompositionError};
pub use distribution::{isotope_pattern, IsotopePattern, PatternSettings};
pub use elements::{PROTON, WATER};

/// Convert a neutral mass to m/z at `charge` (protonated)
#[inline]
pub fn mz_from_mass(mass: f64, charge: u8) -> f64 {
    let z = f64::from(charge.max(1));
    (mass + z * PROTON) / z
}

/// Isotope envelope of one molecule at one charge state
#[derive(Debug, Clone, PartialEq)]
pub struct IsotopeEnvelope {
    /// Peak positions, ascending
    pub mz: Vec<f64>,
    /// Relative abundances in `[0, 1]`, most abundant peak = 1.0
    pub abundance: Vec<f64>,
    /// Charge state
    pub charge: u8,
}

impl IsotopeEnvelope {
    /// Number of peaks
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// True if the envelope has no peaks
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Index of the most abundant peak; ties resolve to the lightest
    pub fn highest_peak(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, a) in self.abundance.iter().enumerate() {
            match best {
                Some(b) if self.abundance[b] >= *a => {}
                _ => best = Some(i),
            }
        }
        best
    }
}

/// Source of isotope envelopes for formulas
pub trait EnvelopeSource: Send + Sync {
    /// Envelope of `formula` at `charge`
    fn envelope(&self, formula: &str, charge: u8) -> Result<IsotopeEnvelope, CompositionError>;

    /// Neutral monoisotopic mass of `formula`
    fn monoisotopic_mass(&self, formula: &str) -> Result<f64, CompositionError>;
}

/// Natural-abundance envelopes from the built-in element tables
#[derive(Debug, Clone, Copy, Default)]
pub struct NaturalAbundance {
    pub settings: PatternSettings,
}

impl NaturalAbundance {
    /// Source with custom truncation settings
    pub fn with_settings(settings: PatternSettings) -> Self {
        Self { settings }
    }
}

impl EnvelopeSource for NaturalAbundance {
    fn envelope(&self, formula: &str, charge: u8) -> Result<IsotopeEnvelope, CompositionError> {
        let composition = Composition::parse(formula)?;
        let pattern = isotope_pattern(&composition, &self.settings);
        Ok(IsotopeEnvelope {
            mz: pattern
                .masses
                .iter()
                .map(|m| mz_from_mass(*m, charge))
                .collect(),
            abundance: pattern.abundances,
            charge: charge.max(1),
        })
    }

    fn monoisotopic_mass(&self, formula: &str) -> Result<f64, CompositionError> {
        Composition::parse(formula).map(|c| c.monoisotopic_mass())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mz_from_mass() {
        assert!((mz_from_mass(100.0, 1) - 101.00727646677).abs() < 1e-12);
        assert!((mz_from_mass(100.0, 2) - 51.00727646677).abs() < 1e-12);
    }

    #[test]
    fn test_natural_abundance_envelope() {
        let source = NaturalAbundance::default();
        let env = source.envelope("+C(5)H(5)N(5)", 1).unwrap();
        assert_eq!(env.highest_peak(), Some(0));
        assert!((env.mz[0] - 136.0617716478).abs() < 1e-6);
        assert!(env.mz.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_charge_two_halves_spacing() {
        let source = NaturalAbundance::default();
        let env = source.envelope("C10H12N4O5", 2).unwrap();
        let spacing = env.mz[1] - env.mz[0];
        assert!((spacing - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_highest_peak_empty() {
        let env = IsotopeEnvelope {
            mz: vec![],
            abundance: vec![],
            charge: 1,
        };
        assert_eq!(env.highest_peak(), None);
    }

    #[test]
    fn test_bad_formula_is_an_error() {
        let source = NaturalAbundance::default();
        assert!(source.envelope("+Zz(3)", 1).is_err());
    }
}
