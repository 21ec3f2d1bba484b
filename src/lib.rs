//! # SMITER - Synthetic mzML Generator
//!
//! `smiter` simulates liquid chromatography tandem mass spectrometry runs with
//! known ground truth. Given a table of molecules with elution windows it
//! produces the spectra a data-dependent acquisition instrument would record
//! and writes them as mzML, so identification and quantification tools can be
//! benchmarked against exactly known inputs.
//!
//! ## Key Features
//!
//! - **Elution profiles**: flat, Gaussian, gamma and exponentially tailed
//!   Gaussian peak shapes per molecule.
//!
//! - **Isotope envelopes**: natural-abundance patterns from sum formulas or
//!   peptide sequences, computed once per distinct formula.
//!
//! - **Data-dependent acquisition**: top-N precursor selection with dynamic
//!   exclusion and co-isolation of nearby precursors (chimeric spectra).
//!
//! - **Fragmentation**: modified nucleosides from a bundled knowledge base,
//!   peptide b/y ions, or lipid transitions from an external tool.
//!
//! - **Noise**: uniform, Gaussian and intensity-dependent instrument noise,
//!   reproducible from a seed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use smiter::prelude::*;
//!
//! let molecules = read_molecule_table("molecules.csv")?;
//! let params = RunSettings::with_gradient(60.0).validate()?;
//!
//! let source = NaturalAbundance::default();
//! let envelopes = build_envelope_cache(&molecules, &source);
//! let fragmentor = NucleosideFragmentor::builtin(&source)?;
//! let noise = NoiseModel::default();
//!
//! let generator = ScanGenerator::new(params, &molecules, &envelopes, &fragmentor, &noise);
//! let run = generator.generate(&mut StdRng::seed_from_u64(42))?;
//! write_mzml("simulated.mzML", &run, &params)?;
//! println!("{}", run.summary);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`params`]: run parameters, molecule descriptors and CSV tables
//! - [`elution`]: elution peak shapes
//! - [`interval_index`]: sweep over elution windows
//! - [`isotopes`]: formulas, isotope patterns and the envelope cache
//! - [`noise`]: noise injectors
//! - [`fragmentation`]: fragmentors per molecule class
//! - [`simulation`]: the time-stepped scan generator
//! - [`mzml`]: mzML writer and reader
//! - [`digest`]: FASTA digestion into peptide tables

#![deny(rustdoc::missing_crate_level_docs)]
// Allow some patterns common in scientific code
#![allow(clippy::too_many_arguments)]

pub mod chromatogram;
pub mod digest;
pub mod elution;
pub mod fragmentation;
pub mod interval_index;
pub mod isotopes;
pub mod mzml;
pub mod noise;
pub mod params;
pub mod scan;
pub mod simulation;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::chromatogram::{Chromatogram, ChromatogramKind, TIC_ID};
    pub use crate::elution::ElutionShape;
    pub use crate::fragmentation::{
        FragmentError, Fragmentor, FragmentorConfig, FragmentorKind, LipidFragmentor,
        MissingFragmentPolicy, NucleosideFragmentor, PeptideFragmentor, StaticFragmentor,
    };
    pub use crate::isotopes::{EnvelopeCache, EnvelopeSource, NaturalAbundance};
    pub use crate::mzml::{write_mzml, MzMLError, MzMLReader, MzMLWriter, WriterError};
    pub use crate::noise::{NoiseInjector, NoiseModel};
    pub use crate::params::{
        read_molecule_table, write_molecule_csv, Molecule, MoleculeDescriptor, MoleculeSet,
        ParamsError, RunParameters, RunSettings, TimeUnit,
    };
    pub use crate::scan::{Precursor, Scan, ScanGroup};
    pub use crate::simulation::{
        build_envelope_cache, ScanGenerator, ScanSink, SimulatedRun, SimulationError,
        SimulationSummary,
    };
}
