use anyhow::{Context, Result};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use smiter::digest::{digest_proteome, read_fasta_file, DigestSettings};
use smiter::params::write_molecule_csv;

/// Digest a FASTA file into a molecule table
pub fn run(
    fasta: PathBuf,
    output: PathBuf,
    gradient_length: f64,
    keep_fraction: f64,
    seed: Option<u64>,
) -> Result<()> {
    let proteins = read_fasta_file(&fasta)
        .with_context(|| format!("Failed to read FASTA file: {}", fasta.display()))?;
    info!("Read {} proteins from {}", proteins.len(), fasta.display());

    let settings = DigestSettings {
        keep_fraction,
        gradient_length,
        ..DigestSettings::default()
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let molecules = digest_proteome(&proteins, &settings, &mut rng)?;

    let file = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    write_molecule_csv(BufWriter::new(file), &molecules)?;

    println!(
        "Wrote {} peptides from {} proteins to {}",
        molecules.len(),
        proteins.len(),
        output.display()
    );
    Ok(())
}
