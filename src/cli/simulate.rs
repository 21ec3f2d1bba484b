use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use smiter::isotopes::NaturalAbundance;
use smiter::mzml::MzMLWriter;
use smiter::noise::{GaussianNoise, JamssNoise, NoiseModel, UniformNoise};
use smiter::params::{read_molecule_table, write_molecule_csv, RunSettings};
use smiter::simulation::{build_envelope_cache, ScanGenerator, SimulationSummary};

use super::{Config, NoiseArg, SimulateArgs};

/// `<dir>/<stem>.molecules.csv` next to the mzML output
fn molecule_table_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "run".to_string());
    output.with_file_name(format!("{}.molecules.csv", stem))
}

fn noise_model(arg: NoiseArg) -> NoiseModel {
    match arg {
        NoiseArg::None => NoiseModel::None,
        NoiseArg::Uniform => NoiseModel::Uniform(UniformNoise::default()),
        NoiseArg::Gaussian => NoiseModel::Gaussian(GaussianNoise::default()),
        NoiseArg::Jamss => NoiseModel::Jamss(JamssNoise::default()),
    }
}

/// Simulate a run and write it as mzML
pub fn run(args: SimulateArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref())?;

    let molecules = read_molecule_table(&args.molecules)
        .with_context(|| format!("Failed to read molecule table: {}", args.molecules.display()))?;
    info!("Loaded {} molecules from {}", molecules.len(), args.molecules.display());

    let overrides = RunSettings {
        gradient_length: args.gradient_length,
        ms_rt_diff: args.ms_rt_diff,
        max_ms2_spectra: args.max_ms2_spectra,
        dynamic_exclusion: args.dynamic_exclusion,
        isolation_window_width: args.isolation_window_width,
        time_unit: args.time_unit.map(Into::into).or(config.output.time_unit),
        ..RunSettings::default()
    };
    let params = overrides
        .or(config.run.clone())
        .validate()
        .context("Invalid run parameters")?;

    let noise = match args.noise {
        Some(arg) => noise_model(arg),
        None => config.noise.clone().unwrap_or_default(),
    };
    let mut fragmentor_config = config.fragmentor.clone();
    if let Some(kind) = args.fragmentor {
        fragmentor_config.kind = kind.into();
    }
    if let Some(policy) = args.policy() {
        fragmentor_config.policy = policy;
    }

    let source = NaturalAbundance::default();
    let envelopes = build_envelope_cache(&molecules, &source);
    let fragmentor = fragmentor_config
        .build(&molecules.names(), &source)
        .context("Failed to set up fragmentor")?;

    let seed = args.seed.or(config.seed);
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let generator = ScanGenerator::new(params, &molecules, &envelopes, fragmentor.as_ref(), &noise);
    let mut writer = MzMLWriter::create(&args.output, &params)
        .with_context(|| format!("Failed to create output file: {}", args.output.display()))?;
    let report = generator
        .generate_into(&mut rng, &mut writer)
        .context("Simulation failed")?;
    writer.write_chromatogram(&report.tic)?;
    writer.finish().context("Failed to finish mzML output")?;

    let write_table = !args.no_molecule_table && config.output.write_molecule_table.unwrap_or(true);
    if write_table {
        let path = molecule_table_path(&args.output);
        let file = File::create(&path)
            .with_context(|| format!("Failed to create molecule table: {}", path.display()))?;
        write_molecule_csv(BufWriter::new(file), &molecules)?;
        info!("Wrote molecule table to {}", path.display());
    }

    print_summary(&args.output, &report.summary);
    Ok(())
}

fn print_summary(output: &Path, summary: &SimulationSummary) {
    #[cfg(feature = "colorized_output")]
    {
        use console::style;
        println!("{} {}", style("Wrote").green().bold(), output.display());
        println!("{}", summary);
    }

    #[cfg(not(feature = "colorized_output"))]
    {
        println!("Wrote {}", output.display());
        println!("{}", summary);
    }
}
