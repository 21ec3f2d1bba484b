//! Isotope fine structure aggregated to nominal mass offsets.
//!
//! Each element contributes a small polynomial over nominal offsets; the
//! molecular pattern is the product of `element^count` polynomials, computed
//! by repeated squaring. Bins keep an abundance-weighted mass sum so the
//! reported mass of each aggregated peak is its centroid.

use super::composition::Composition;
use super::elements::element;

/// Truncation and pruning of computed patterns
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternSettings {
    /// Maximum number of nominal offsets kept
    pub max_peaks: usize,
    /// Peaks below this fraction of the most abundant peak are dropped
    pub min_relative_abundance: f64,
}

impl Default for PatternSettings {
    fn default() -> Self {
        Self {
            max_peaks: 12,
            min_relative_abundance: 1e-4,
        }
    }
}

/// Neutral-mass isotope pattern, abundances relative to the most abundant peak
#[derive(Debug, Clone, PartialEq)]
pub struct IsotopePattern {
    pub masses: Vec<f64>,
    pub abundances: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    abundance: f64,
    /// Sum of abundance * mass
    weighted_mass: f64,
}

type Polynomial = Vec<Bin>;

fn convolve(a: &[Bin], b: &[Bin], max_len: usize) -> Polynomial {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let len = (a.len() + b.len() - 1).min(max_len);
    let mut out = vec![Bin::default(); len];
    for (i, x) in a.iter().enumerate() {
        if i >= len {
            break;
        }
        for (j, y) in b.iter().enumerate() {
            let k = i + j;
            if k >= len {
                break;
            }
            out[k].abundance += x.abundance * y.abundance;
            out[k].weighted_mass += x.weighted_mass * y.abundance + y.weighted_mass * x.abundance;
        }
    }
    out
}

fn power(base: &[Bin], mut exponent: u32, max_len: usize) -> Polynomial {
    let mut result = vec![Bin {
        abundance: 1.0,
        weighted_mass: 0.0,
    }];
    let mut base = base.to_vec();
    while exponent > 0 {
        if exponent & 1 == 1 {
            result = convolve(&result, &base, max_len);
        }
        exponent >>= 1;
        if exponent > 0 {
            base = convolve(&base, &base, max_len);
        }
    }
    result
}

fn element_polynomial(symbol: &str) -> Option<Polynomial> {
    let element = element(symbol)?;
    let len = element.isotopes.last().map_or(1, |i| i.offset + 1);
    let mut poly = vec![Bin::default(); len];
    for isotope in element.isotopes {
        poly[isotope.offset] = Bin {
            abundance: isotope.abundance,
            weighted_mass: isotope.abundance * isotope.mass,
        };
    }
    Some(poly)
}

/// Compute the natural-abundance pattern of `composition`.
pub fn isotope_pattern(composition: &Composition, settings: &PatternSettings) -> IsotopePattern {
    let max_len = settings.max_peaks.max(1);
    let mut pattern = vec![Bin {
        abundance: 1.0,
        weighted_mass: 0.0,
    }];
    for (symbol, count) in composition.iter() {
        if let Some(poly) = element_polynomial(symbol) {
            let contribution = power(&poly, count, max_len);
            pattern = convolve(&pattern, &contribution, max_len);
        }
    }

    let max_abundance = pattern
        .iter()
        .map(|b| b.abundance)
        .fold(0.0_f64, f64::max);
    let mut masses = Vec::with_capacity(pattern.len());
    let mut abundances = Vec::with_capacity(pattern.len());
    if max_abundance > 0.0 {
        for bin in &pattern {
            let relative = bin.abundance / max_abundance;
            if bin.abundance > 0.0 && relative >= settings.min_relative_abundance {
                masses.push(bin.weighted_mass / bin.abundance);
                abundances.push(relative);
            }
        }
    }
    IsotopePattern { masses, abundances }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(formula: &str) -> IsotopePattern {
        isotope_pattern(
            &Composition::parse(formula).unwrap(),
            &PatternSettings::default(),
        )
    }

    #[test]
    fn test_monoisotopic_peak_first_for_small_organics() {
        let p = pattern("+C(10)H(12)N(4)O(5)");
        assert_eq!(p.abundances[0], 1.0);
        assert!((p.masses[0] - 268.08077).abs() < 1e-4);
        // M+1 roughly 10 carbons * 1.08 %
        assert!(p.abundances[1] > 0.10 && p.abundances[1] < 0.14);
        assert!(p.masses[1] > p.masses[0] + 0.99 && p.masses[1] < p.masses[0] + 1.01);
    }

    #[test]
    fn test_chlorine_pattern() {
        let p = pattern("+Cl(1)");
        assert_eq!(p.masses.len(), 2);
        assert!((p.abundances[1] - 0.2424 / 0.7576).abs() < 1e-9);
    }

    #[test]
    fn test_large_molecule_apex_moves_up() {
        // around 100 carbons the M+1 peak outweighs the monoisotopic peak
        let p = pattern("C150H250N40O45");
        let apex = p
            .abundances
            .iter()
            .position(|a| *a == 1.0)
            .unwrap();
        assert!(apex >= 1);
    }

    #[test]
    fn test_truncation() {
        let settings = PatternSettings {
            max_peaks: 2,
            min_relative_abundance: 0.0,
        };
        let p = isotope_pattern(&Composition::parse("C50H80O20").unwrap(), &settings);
        assert_eq!(p.masses.len(), 2);
    }

    #[test]
    fn test_empty_composition() {
        let p = isotope_pattern(&Composition::new(), &PatternSettings::default());
        assert_eq!(p.abundances, vec![1.0]);
        assert_eq!(p.masses, vec![0.0]);
    }
}
