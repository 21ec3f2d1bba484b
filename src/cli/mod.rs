use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use smiter::fragmentation::{FragmentorKind, MissingFragmentPolicy};
use smiter::params::TimeUnit;

mod config;
mod digest;
mod filter;
mod info;
mod simulate;

pub use config::Config;

/// SMITER - Synthetic mzML generator for LC-MS/MS runs
#[derive(Parser)]
#[command(name = "smiter")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Fragmentor selection on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FragmentorArg {
    /// Modified nucleosides from the knowledge base
    Nucleoside,
    /// b/y ions of peptide sequences
    Peptide,
    /// Lipid transitions from an external tool
    Lipid,
}

impl From<FragmentorArg> for FragmentorKind {
    fn from(arg: FragmentorArg) -> Self {
        match arg {
            FragmentorArg::Nucleoside => FragmentorKind::Nucleoside,
            FragmentorArg::Peptide => FragmentorKind::Peptide,
            FragmentorArg::Lipid => FragmentorKind::Lipid,
        }
    }
}

/// Noise model selection on the command line
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum NoiseArg {
    None,
    Uniform,
    Gaussian,
    Jamss,
}

/// Time unit of scan start times
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TimeUnitArg {
    Second,
    Minute,
}

impl From<TimeUnitArg> for TimeUnit {
    fn from(arg: TimeUnitArg) -> Self {
        match arg {
            TimeUnitArg::Second => TimeUnit::Second,
            TimeUnitArg::Minute => TimeUnit::Minute,
        }
    }
}

/// Flags of the simulate command that override the config file
#[derive(Debug, clap::Args)]
pub struct SimulateArgs {
    /// Molecule table (CSV)
    #[arg(value_name = "MOLECULES")]
    pub molecules: PathBuf,

    /// Output mzML path
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Load settings from a TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Total simulated time (required here or in `[run]` of the config file)
    #[arg(short = 'g', long)]
    pub gradient_length: Option<f64>,

    /// Time between consecutive scans
    #[arg(long)]
    pub ms_rt_diff: Option<f64>,

    /// Fragment scans per survey scan
    #[arg(long)]
    pub max_ms2_spectra: Option<usize>,

    /// Dynamic exclusion duration
    #[arg(long)]
    pub dynamic_exclusion: Option<f64>,

    /// Precursor isolation tolerance in m/z
    #[arg(long)]
    pub isolation_window_width: Option<f64>,

    /// Fragmentor for the molecule class
    #[arg(short = 'f', long, value_enum)]
    pub fragmentor: Option<FragmentorArg>,

    /// Fail on molecules without fragment data
    #[arg(long)]
    pub strict: bool,

    /// Noise model
    #[arg(short = 'n', long, value_enum)]
    pub noise: Option<NoiseArg>,

    /// Time unit of scan start times
    #[arg(long, value_enum)]
    pub time_unit: Option<TimeUnitArg>,

    /// RNG seed for reproducible runs
    #[arg(short = 's', long)]
    pub seed: Option<u64>,

    /// Do not write the resolved molecule table next to the output
    #[arg(long)]
    pub no_molecule_table: bool,
}

impl SimulateArgs {
    fn policy(&self) -> Option<MissingFragmentPolicy> {
        self.strict.then_some(MissingFragmentPolicy::Strict)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate an LC-MS/MS run from a molecule table
    Simulate(SimulateArgs),

    /// Display information about an mzML file
    Info {
        /// Input mzML file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Copy a range of spectra into a new mzML file
    Filter {
        /// Input mzML file path
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Output mzML file path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// First scan id to keep
        #[arg(long, default_value_t = 1)]
        start: u64,

        /// First scan id past the range
        #[arg(long)]
        stop: Option<u64>,
    },

    /// Digest a FASTA file into a random peptide molecule table
    Digest {
        /// Input FASTA file
        #[arg(value_name = "FASTA")]
        fasta: PathBuf,

        /// Output molecule table (CSV)
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// Start times are drawn from [0, gradient length)
        #[arg(short = 'g', long, default_value_t = 7200.0)]
        gradient_length: f64,

        /// Probability of keeping a peptide
        #[arg(long, default_value_t = 0.4)]
        keep_fraction: f64,

        /// RNG seed for reproducible tables
        #[arg(short = 's', long)]
        seed: Option<u64>,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Simulate(args) => simulate::run(args),
        Commands::Info { file } => info::run(file),
        Commands::Filter {
            input,
            output,
            start,
            stop,
        } => filter::run(input, output, start, stop),
        Commands::Digest {
            fasta,
            output,
            gradient_length,
            keep_fraction,
            seed,
        } => digest::run(fasta, output, gradient_length, keep_fraction, seed),
    }
}
