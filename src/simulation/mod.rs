//! # Scan Generation
//!
//! The [`ScanGenerator`] walks the gradient in fixed steps of `ms_rt_diff`.
//! Every step emits one scan; the simulated time is always
//! `scans_emitted · ms_rt_diff`, so it never drifts.
//!
//! ```text
//! t = 0 ─┬─ survey scan (all eluting molecules, merged, noisy)
//!        ├─ fragment scan for the most intense candidate
//!        ├─ fragment scan for the next candidate ...   (≤ max_ms2_spectra)
//!        └─ next survey scan
//! ```
//!
//! A candidate is skipped while it is dynamically excluded or once its
//! elution window has closed. Every molecule whose highest peak lies within
//! `isolation_window_width` of the candidate is fragmented together with it;
//! such chimeric scans are counted in [`ChimericStats`].
//!
//! Groups are handed to a [`ScanSink`] as soon as their round ends, so runs
//! can be written incrementally. [`ScanGenerator::generate`] collects them
//! into a [`SimulatedRun`] instead.

mod exclusion;
mod generator;
mod stats;


pub use exclusion::DynamicExclusion;
pub use generator::{ScanGenerator, ScanSink, SimulatedRun, SimulationReport};
pub use stats::{ChimericStats, MoleculeScans, SimulationSummary};

use crate::fragmentation::FragmentError;
use crate::isotopes::{EnvelopeCache, EnvelopeRequest, EnvelopeSource};
use crate::mzml::WriterError;
use crate::params::{MoleculeSet, ParamsError};

/// Errors that abort a simulation run
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// Invalid run or molecule parameters
    #[error("Configuration error: {0}")]
    Params(#[from] ParamsError),

    /// The fragmentor rejected a molecule
    #[error("Fragmentation error: {0}")]
    Fragment(#[from] FragmentError),

    /// The scan sink failed to write a group
    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),
}

/// Compute the envelope of every molecule at its charge state
pub fn build_envelope_cache(molecules: &MoleculeSet, source: &dyn EnvelopeSource) -> EnvelopeCache {
    EnvelopeCache::build(
        molecules.iter().map(|m| EnvelopeRequest {
            name: &m.name,
            formula: &m.formula,
            charge: m.charge,
        }),
        source,
    )
}
