//! # SMITER
//!
//! Command-line front end of the synthetic mzML generator.
//!
//! ## Usage
//!
//! ```bash
//! # Simulate a run from a molecule table
//! smiter simulate molecules.csv run.mzML --seed 42
//!
//! # Build a peptide table from a proteome
//! smiter digest proteome.fasta peptides.csv --gradient-length 7200
//!
//! # Inspect or cut a written run
//! smiter info run.mzML
//! smiter filter run.mzML slice.mzML --start 100 --stop 200
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
