//! b/y ion ladders for linear peptides.

use super::{FragmentPeaks, Fragmentor, MissingFragmentPolicy};
use crate::isotopes::{Composition, PROTON, WATER};

/// Intensity assigned to every ladder ion
pub const ION_INTENSITY: f64 = 100.0;

/// Computes singly (or multiply) charged b and y ions from the molecule name,
/// which is read as the amino-acid sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeptideFragmentor {
    max_charge: u8,
    policy: MissingFragmentPolicy,
}

impl Default for PeptideFragmentor {
    fn default() -> Self {
        Self::new(1, MissingFragmentPolicy::default())
    }
}

impl PeptideFragmentor {
    pub fn new(max_charge: u8, policy: MissingFragmentPolicy) -> Self {
        Self {
            max_charge: max_charge.max(1),
            policy,
        }
    }

    /// Neutral residue masses of `sequence`, `None` for unknown residues
    fn residue_masses(sequence: &str) -> Option<Vec<f64>> {
        let mut masses = Vec::with_capacity(sequence.len());
        for residue in sequence.chars() {
            let comp = Composition::residues(residue.encode_utf8(&mut [0u8; 4])).ok()?;
            masses.push(comp.monoisotopic_mass());
        }
        Some(masses)
    }

    /// `(b ions, y ions)` at charge 1, each of length `n - 1`
    pub fn ion_series(sequence: &str) -> Option<(Vec<f64>, Vec<f64>)> {
        let masses = Self::residue_masses(sequence)?;
        if masses.len() < 2 {
            return Some((Vec::new(), Vec::new()));
        }
        let n = masses.len();
        let mut b = Vec::with_capacity(n - 1);
        let mut running = 0.0;
        for mass in &masses[..n - 1] {
            running += mass;
            b.push(running + PROTON);
        }
        let mut y = Vec::with_capacity(n - 1);
        let mut running = WATER;
        for mass in masses[1..].iter().rev() {
            running += mass;
            y.push(running + PROTON);
        }
        Some((b, y))
    }
}

impl Fragmentor for PeptideFragmentor {
    fn lookup(&self, name: &str) -> Option<FragmentPeaks> {
        let sequence = name.trim();
        if sequence.is_empty() {
            return None;
        }
        let (b, y) = Self::ion_series(sequence)?;
        let mut peaks = Vec::with_capacity((b.len() + y.len()) * usize::from(self.max_charge));
        for charge in 1..=self.max_charge {
            let z = f64::from(charge);
            for mz in b.iter().chain(y.iter()) {
                // singly protonated m/z -> m/z at charge z
                let neutral = mz - PROTON;
                peaks.push(((neutral + z * PROTON) / z, ION_INTENSITY));
            }
        }
        Some(peaks)
    }

    fn policy(&self) -> MissingFragmentPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ion_series_of_tripeptide() {
        let (b, y) = PeptideFragmentor::ion_series("GAS").unwrap();
        // b1 = G + H+, b2 = GA + H+
        assert!((b[0] - (57.02146 + PROTON)).abs() < 1e-4);
        assert!((b[1] - (57.02146 + 71.03711 + PROTON)).abs() < 1e-4);
        // y1 = S + H2O + H+
        assert!((y[0] - (87.03203 + WATER + PROTON)).abs() < 1e-4);
        assert_eq!(b.len(), 2);
        assert_eq!(y.len(), 2);
    }

    #[test]
    fn test_complementary_ions_sum_to_precursor() {
        let sequence = "PEPTIDEK";
        let (b, y) = PeptideFragmentor::ion_series(sequence).unwrap();
        let precursor = Composition::from_peptide(sequence).unwrap().monoisotopic_mass();
        let n = b.len();
        for i in 0..n {
            let total = b[i] + y[n - 1 - i] - 2.0 * PROTON;
            assert!((total - precursor).abs() < 1e-6);
        }
    }

    #[test]
    fn test_charge_two_ions() {
        let f = PeptideFragmentor::new(2, MissingFragmentPolicy::Strict);
        let peaks = f.fragment_one("GGG").unwrap();
        assert_eq!(peaks.len(), 8);
    }

    #[test]
    fn test_non_peptide_is_unknown() {
        let f = PeptideFragmentor::new(1, MissingFragmentPolicy::Strict);
        assert!(f.fragment_one("inosine").is_err());
        let lenient = PeptideFragmentor::default();
        assert!(lenient.fragment_one("inosine").unwrap().is_empty());
    }
}
