//! Per-run envelope cache.
//!
//! Distinct `(formula, charge)` pairs are computed once; every trivial name
//! then receives its own copy so molecules sharing a formula stay
//! independently addressable.

use std::collections::HashMap;

use log::{debug, info, warn};

use super::{CompositionError, EnvelopeSource, IsotopeEnvelope};

/// One molecule's envelope request
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeRequest<'a> {
    pub name: &'a str,
    pub formula: &'a str,
    pub charge: u8,
}

/// A molecule that could not be resolved
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedFormula {
    pub name: String,
    pub formula: String,
    pub error: CompositionError,
}

/// Envelope plus the index of its most abundant peak
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEnvelope {
    pub envelope: IsotopeEnvelope,
    pub highest: usize,
}

impl CachedEnvelope {
    /// m/z of the most abundant peak
    pub fn highest_mz(&self) -> f64 {
        self.envelope.mz[self.highest]
    }
}

/// Read-only envelopes keyed by trivial name
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCache {
    by_name: HashMap<String, CachedEnvelope>,
    distinct: usize,
    skipped: Vec<SkippedFormula>,
}

impl EnvelopeCache {
    /// Compute envelopes for all requests.
    ///
    /// Formulas the source rejects are logged and recorded in
    /// [`EnvelopeCache::skipped`]; the remaining molecules are still cached.
    pub fn build<'a, I>(requests: I, source: &dyn EnvelopeSource) -> Self
    where
        I: IntoIterator<Item = EnvelopeRequest<'a>>,
    {
        let requests: Vec<EnvelopeRequest<'a>> = requests.into_iter().collect();

        let mut keys: Vec<(String, u8)> = requests
            .iter()
            .map(|r| (normalize_formula(r.formula), r.charge))
            .collect();
        keys.sort();
        keys.dedup();

        let computed = compute_all(&keys, source);
        let table: HashMap<(String, u8), Result<IsotopeEnvelope, CompositionError>> =
            keys.into_iter().zip(computed).collect();

        let mut by_name = HashMap::with_capacity(requests.len());
        let mut skipped = Vec::new();
        for request in &requests {
            let key = (normalize_formula(request.formula), request.charge);
            match table.get(&key) {
                Some(Ok(envelope)) => match envelope.highest_peak() {
                    Some(highest) => {
                        by_name.insert(
                            request.name.to_string(),
                            CachedEnvelope {
                                envelope: envelope.clone(),
                                highest,
                            },
                        );
                    }
                    None => {
                        warn!("Skipping {}: empty isotope envelope", request.name);
                        skipped.push(SkippedFormula {
                            name: request.name.to_string(),
                            formula: request.formula.to_string(),
                            error: CompositionError::Empty,
                        });
                    }
                },
                Some(Err(error)) => {
                    warn!("Skipping {}: {}", request.name, error);
                    skipped.push(SkippedFormula {
                        name: request.name.to_string(),
                        formula: request.formula.to_string(),
                        error: error.clone(),
                    });
                }
                None => {}
            }
        }

        let distinct = table.values().filter(|r| r.is_ok()).count();
        info!(
            "Isotope envelopes: {} molecules, {} distinct formula/charge pairs, {} skipped",
            by_name.len(),
            distinct,
            skipped.len()
        );

        Self {
            by_name,
            distinct,
            skipped,
        }
    }

    /// Envelope of a molecule
    pub fn get(&self, name: &str) -> Option<&CachedEnvelope> {
        self.by_name.get(name)
    }

    /// Whether a molecule has an envelope
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Number of cached molecules
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// True when nothing could be cached
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Number of distinct formula/charge computations performed successfully
    pub fn distinct_envelopes(&self) -> usize {
        self.distinct
    }

    /// Molecules whose formula could not be resolved
    pub fn skipped(&self) -> &[SkippedFormula] {
        &self.skipped
    }
}

/// Cache key for a formula. A leading `+` only matters for digit-free
/// element strings, which would otherwise read as peptide sequences.
fn normalize_formula(formula: &str) -> String {
    let trimmed = formula.trim();
    match trimmed.strip_prefix('+') {
        Some(rest) if rest.contains(|c: char| c.is_ascii_digit() || c == '(') => {
            rest.trim().to_string()
        }
        _ => trimmed.to_string(),
    }
}

#[cfg(not(feature = "parallel"))]
fn compute_all(
    keys: &[(String, u8)],
    source: &dyn EnvelopeSource,
) -> Vec<Result<IsotopeEnvelope, CompositionError>> {
    keys.iter()
        .map(|(formula, charge)| {
            debug!("Computing envelope for {} at charge {}", formula, charge);
            source.envelope(formula, *charge)
        })
        .collect()
}

#[cfg(feature = "parallel")]
fn compute_all(
    keys: &[(String, u8)],
    source: &dyn EnvelopeSource,
) -> Vec<Result<IsotopeEnvelope, CompositionError>> {
    use rayon::prelude::*;

    debug!("Computing {} envelopes in parallel", keys.len());
    keys.par_iter()
        .map(|(formula, charge)| source.envelope(formula, *charge))
        .collect()
}
