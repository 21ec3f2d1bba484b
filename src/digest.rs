//! # Proteome Digestion
//!
//! Turns a FASTA file into a randomized peptide molecule table: every
//! protein is cleaved C-terminal to K and R without missed cleavages, peptides
//! outside the length window are dropped and the rest are sampled with
//! probability `keep_fraction`. Elution windows, charges and abundances are
//! drawn at random; the result feeds straight into the simulator.

use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::isotopes::Composition;
use crate::params::{MoleculeDescriptor, MoleculeSet, ParamsError};

/// Errors raised while reading or digesting a proteome
#[derive(Debug, thiserror::Error)]
pub enum DigestError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid FASTA at line {line}: {message}")]
    InvalidFasta { line: usize, message: String },

    #[error("Invalid digest settings: {0}")]
    InvalidSettings(String),

    #[error(transparent)]
    Params(#[from] ParamsError),
}

/// One FASTA entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    /// Header up to the first whitespace, without `>`
    pub id: String,
    pub sequence: String,
}

/// Parse FASTA records; sequence lines are concatenated and upper-cased
pub fn read_fasta<R: BufRead>(source: R) -> Result<Vec<FastaRecord>, DigestError> {
    let mut records = Vec::new();
    let mut current: Option<FastaRecord> = None;

    for (idx, line) in source.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(record) = current.take() {
                records.push(record);
            }
            let id = header.split_whitespace().next().unwrap_or_default();
            current = Some(FastaRecord {
                id: id.to_string(),
                sequence: String::new(),
            });
        } else {
            let record = current.as_mut().ok_or_else(|| DigestError::InvalidFasta {
                line: idx + 1,
                message: "sequence before the first header".to_string(),
            })?;
            record
                .sequence
                .extend(line.chars().filter(|c| !c.is_whitespace()).map(|c| c.to_ascii_uppercase()));
        }
    }
    if let Some(record) = current {
        records.push(record);
    }
    Ok(records)
}

/// Read a FASTA file from disk
pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<Vec<FastaRecord>, DigestError> {
    let file = File::open(path.as_ref())?;
    read_fasta(BufReader::new(file))
}

/// Fully specific tryptic cleavage after every K and R
pub fn tryptic_peptides(sequence: &str) -> Vec<&str> {
    let mut peptides = Vec::new();
    let mut start = 0;
    for (idx, residue) in sequence.char_indices() {
        if residue == 'K' || residue == 'R' {
            let end = idx + residue.len_utf8();
            peptides.push(&sequence[start..end]);
            start = end;
        }
    }
    if start < sequence.len() {
        peptides.push(&sequence[start..]);
    }
    peptides
}

/// Sampling parameters of [`digest_proteome`]
#[derive(Debug, Clone, PartialEq)]
pub struct DigestSettings {
    pub min_length: usize,
    pub max_length: usize,
    /// Probability of keeping a peptide that passed the length filter
    pub keep_fraction: f64,
    /// Start times are drawn from `[0, gradient_length)`
    pub gradient_length: f64,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 30,
            keep_fraction: 0.4,
            gradient_length: 7200.0,
        }
    }
}

impl DigestSettings {
    fn check(&self) -> Result<(), DigestError> {
        if self.min_length == 0 || self.min_length > self.max_length {
            return Err(DigestError::InvalidSettings(format!(
                "length window {}..={} is empty",
                self.min_length, self.max_length
            )));
        }
        if !(0.0..=1.0).contains(&self.keep_fraction) {
            return Err(DigestError::InvalidSettings(format!(
                "keep_fraction {} outside [0, 1]",
                self.keep_fraction
            )));
        }
        if !self.gradient_length.is_finite() || self.gradient_length <= 0.0 {
            return Err(DigestError::InvalidSettings(format!(
                "gradient_length {} must be positive",
                self.gradient_length
            )));
        }
        Ok(())
    }
}

const CHARGES: [u8; 3] = [2, 3, 4];
const CHARGE_WEIGHTS: [f64; 3] = [0.6, 0.3, 0.1];
const TAIL_SIGMA: f64 = 2.0;

/// Digest `proteins` and draw a random molecule table from the peptides.
///
/// Peptides seen in more than one protein are kept once. Sequences with
/// residues outside the standard alphabet are skipped.
pub fn digest_proteome(
    proteins: &[FastaRecord],
    settings: &DigestSettings,
    rng: &mut dyn RngCore,
) -> Result<MoleculeSet, DigestError> {
    settings.check()?;
    let charges = WeightedIndex::new(CHARGE_WEIGHTS)
        .map_err(|e| DigestError::InvalidSettings(e.to_string()))?;

    let mut seen = HashSet::new();
    let mut descriptors = Vec::new();
    let mut candidates = 0usize;

    for protein in proteins {
        // abundance level shared by the peptides of one protein
        let level = rng.gen_range(1e4..1e6);
        for peptide in tryptic_peptides(&protein.sequence) {
            if peptide.len() < settings.min_length || peptide.len() > settings.max_length {
                continue;
            }
            candidates += 1;
            if !rng.gen_bool(settings.keep_fraction) {
                continue;
            }
            if !seen.insert(peptide) {
                continue;
            }
            let composition = match Composition::from_peptide(peptide) {
                Ok(c) => c,
                Err(e) => {
                    debug!("Skipping {} from {}: {}", peptide, protein.id, e);
                    continue;
                }
            };

            let charge = CHARGES[charges.sample(rng)];
            let width = rng.gen_range(0.3..0.5);
            let start = rng.gen_range(0.0..settings.gradient_length);
            let scaling = rng.gen_range(level..2.0 * level);

            let formula = format!("+{}", composition.hill_notation());
            let mut descriptor = MoleculeDescriptor::new(peptide, &formula, start, width);
            descriptor.charge = Some(charge);
            descriptor.peak_scaling_factor = Some(scaling);
            descriptor.peak_function = Some("gauss_tail".to_string());
            descriptor.peak_params = BTreeMap::from([("sigma".to_string(), TAIL_SIGMA)]);
            descriptors.push(descriptor);
        }
    }

    info!(
        "Digested {} proteins: kept {} of {} peptides in length window",
        proteins.len(),
        descriptors.len(),
        candidates
    );
    Ok(MoleculeSet::from_descriptors(&descriptors)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    const FASTA: &str = ">sp|P1|TEST first protein
MAGTEVLDNSAVKPEPTIDESEQVENCER
LLGAAVYSTTEAK
>sp|P2|TEST
SHORTK
";

    #[test]
    fn test_read_fasta() {
        let records = read_fasta(FASTA.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "sp|P1|TEST");
        assert_eq!(records[0].sequence, "MAGTEVLDNSAVKPEPTIDESEQVENCERLLGAAVYSTTEAK");
        assert_eq!(records[1].sequence, "SHORTK");
    }

    #[test]
    fn test_sequence_before_header() {
        let result = read_fasta("PEPTIDE\n>x\nK\n".as_bytes());
        assert!(matches!(result, Err(DigestError::InvalidFasta { line: 1, .. })));
    }

    #[test]
    fn test_tryptic_cleavage() {
        assert_eq!(tryptic_peptides("AKRPGKR"), vec!["AK", "R", "PGK", "R"]);
        assert_eq!(tryptic_peptides("PEPTIDE"), vec!["PEPTIDE"]);
        assert_eq!(tryptic_peptides("PEPK"), vec!["PEPK"]);
        assert!(tryptic_peptides("").is_empty());
    }

    #[test]
    fn test_keep_everything_in_window() {
        let records = read_fasta(FASTA.as_bytes()).unwrap();
        let settings = DigestSettings {
            keep_fraction: 1.0,
            gradient_length: 100.0,
            ..DigestSettings::default()
        };
        let set = digest_proteome(&records, &settings, &mut StdRng::seed_from_u64(3)).unwrap();
        // MAGTEVLDNSAVK (13), PEPTIDESEQVENCER (16), LLGAAVYSTTEAK (13); SHORTK is too short
        assert_eq!(set.names(), vec!["MAGTEVLDNSAVK", "PEPTIDESEQVENCER", "LLGAAVYSTTEAK"]);
        for molecule in set.iter() {
            assert!(molecule.start >= 0.0 && molecule.start < 100.0);
            assert!(molecule.width >= 0.3 && molecule.width < 0.5);
            assert!([2, 3, 4].contains(&molecule.charge));
            assert!(molecule.scaling_factor >= 1e4 && molecule.scaling_factor < 2e6);
            assert_eq!(molecule.shape.name(), "gauss_tail");
            assert!(molecule.formula.starts_with("+C"));
        }
    }

    #[test]
    fn test_keep_nothing() {
        let records = read_fasta(FASTA.as_bytes()).unwrap();
        let settings = DigestSettings {
            keep_fraction: 0.0,
            ..DigestSettings::default()
        };
        let set = digest_proteome(&records, &settings, &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn test_digest_is_seeded() {
        let records = read_fasta(FASTA.as_bytes()).unwrap();
        let settings = DigestSettings::default();
        let a = digest_proteome(&records, &settings, &mut StdRng::seed_from_u64(11)).unwrap();
        let b = digest_proteome(&records, &settings, &mut StdRng::seed_from_u64(11)).unwrap();
        assert_eq!(a.names(), b.names());
        let starts_a: Vec<f64> = a.iter().map(|m| m.start).collect();
        let starts_b: Vec<f64> = b.iter().map(|m| m.start).collect();
        assert_eq!(starts_a, starts_b);
    }

    #[test]
    fn test_rejects_bad_settings() {
        let settings = DigestSettings {
            keep_fraction: 1.5,
            ..DigestSettings::default()
        };
        assert!(matches!(
            digest_proteome(&[], &settings, &mut StdRng::seed_from_u64(1)),
            Err(DigestError::InvalidSettings(_))
        ));
    }
}
