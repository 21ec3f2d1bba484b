//! # Run and Molecule Parameters
//!
//! User input is deserialized into permissive structs ([`RunSettings`],
//! [`MoleculeDescriptor`]) whose fields are all optional. Validation merges
//! them with the default tables below and fails fast with a [`ParamsError`]
//! before any simulation work starts.
//!
//! ## Run parameter defaults
//!
//! | field                    | default  |
//! |--------------------------|----------|
//! | `gradient_length`        | required |
//! | `ms_rt_diff`             | 0.03     |
//! | `min_intensity`          | 100      |
//! | `max_intensity`          | 1e10     |
//! | `isolation_window_width` | 0.5      |
//! | `max_ms2_spectra`        | 10       |
//! | `dynamic_exclusion`      | 30       |
//! | `mz_lower_limit`         | 0        |
//! | `mz_upper_limit`         | 2000     |
//! | `fragment_yield`         | 0.5      |
//! | `time_unit`              | second   |
//!
//! ## Molecule defaults
//!
//! `charge` 2, `peak_scaling_factor` 1e3, `ionization_efficiency` 1.0, flat
//! elution. `scan_start_time` and `peak_width` are required.

mod error;
mod molecule;
mod run;
pub mod table;

pub use error::ParamsError;
pub use molecule::{
    Molecule, MoleculeDescriptor, MoleculeSet, DEFAULT_CHARGE, DEFAULT_IONIZATION_EFFICIENCY,
    DEFAULT_SCALING_FACTOR,
};
pub use run::{
    RunParameters, RunSettings, TimeUnit, DEFAULT_DYNAMIC_EXCLUSION, DEFAULT_FRAGMENT_YIELD,
    DEFAULT_ISOLATION_WINDOW_WIDTH, DEFAULT_MAX_INTENSITY, DEFAULT_MAX_MS2_SPECTRA,
    DEFAULT_MIN_INTENSITY, DEFAULT_MS_RT_DIFF, DEFAULT_MZ_LOWER_LIMIT, DEFAULT_MZ_UPPER_LIMIT,
};
pub use table::{read_molecule_csv, read_molecule_table, write_molecule_csv};
