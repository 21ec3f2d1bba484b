//! Integration tests for molecule tables
//!
//! Tables are read from disk, written back as audit tables and produced by
//! the FASTA digest.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};

use rand::rngs::StdRng;
use rand::SeedableRng;
use smiter::digest::{digest_proteome, read_fasta, DigestSettings};
use smiter::elution::ElutionShape;
use smiter::prelude::*;
use tempfile::tempdir;

const TABLE: &str = "\
chemical_formula,trivial_name,charge,scan_start_time,peak_scaling_factor,peak_width,sigma
+C(10)H(12)N(4)O(5),inosine,1,0,1e6,30,
+C(10)H(13)N(5)O(4),adenosine,2,5,1e5,20,3
+C(9)H(12)N(2)O(6),uridine,1,12.5,2e5,10,
";

const PROTEOME: &str = "\
>sp|P00001|TEST1 first protein
MAGTEVLDNSAVKPEPTIDESEQVENCERLLGAAVYSTTEAK
GGSAVLQDTEMLPWAHKSHORTK
>sp|P00002|TEST2 second protein
MSTNPKPQRKTKRNTNRRPQDVKFPGGGQIVGGVYLLPRR
";

#[test]
fn test_read_table_from_disk() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("molecules.csv");
    fs::write(&path, TABLE).unwrap();

    let molecules = read_molecule_table(&path).unwrap();
    assert_eq!(molecules.len(), 3);
    assert_eq!(molecules.names(), vec!["inosine", "adenosine", "uridine"]);

    let uridine = molecules.by_name("uridine").unwrap();
    assert_eq!(uridine.start, 12.5);
    assert_eq!(uridine.end(), 22.5);
    assert!(matches!(uridine.shape, ElutionShape::GaussTail { .. }));
    assert_eq!(molecules.last_elution_end(), Some(30.0));
}

#[test]
fn test_missing_table_is_io_error() {
    let dir = tempdir().unwrap();
    let result = read_molecule_table(dir.path().join("absent.csv"));
    assert!(matches!(result, Err(ParamsError::Io(_))));
}

#[test]
fn test_audit_table_reads_back_identically() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("molecules.csv");
    let audit = dir.path().join("molecules.audit.csv");
    fs::write(&input, TABLE).unwrap();

    let molecules = read_molecule_table(&input).unwrap();
    let file = File::create(&audit).unwrap();
    write_molecule_csv(BufWriter::new(file), &molecules).unwrap();

    let reread = read_molecule_table(&audit).unwrap();
    assert_eq!(reread, molecules);
}

#[test]
fn test_digest_table_drives_simulation() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("peptides.csv");

    let proteins = read_fasta(BufReader::new(PROTEOME.as_bytes())).unwrap();
    assert_eq!(proteins.len(), 2);

    let settings = DigestSettings {
        keep_fraction: 1.0,
        gradient_length: 60.0,
        ..DigestSettings::default()
    };
    let peptides = digest_proteome(&proteins, &settings, &mut StdRng::seed_from_u64(42)).unwrap();
    assert!(!peptides.is_empty());
    for peptide in &peptides {
        assert!(peptide.start >= 0.0 && peptide.start <= 60.0);
        assert!((2..=4).contains(&peptide.charge));
    }

    let file = File::create(&path).unwrap();
    write_molecule_csv(BufWriter::new(file), &peptides).unwrap();
    let molecules = read_molecule_table(&path).unwrap();
    assert_eq!(molecules.len(), peptides.len());

    let params = RunSettings {
        ms_rt_diff: Some(0.1),
        ..RunSettings::with_gradient(60.0)
    }
    .validate()
    .unwrap();
    let envelopes = build_envelope_cache(&molecules, &NaturalAbundance::default());
    let fragmentor = PeptideFragmentor::new(1, MissingFragmentPolicy::Strict);
    let generator = ScanGenerator::new(params, &molecules, &envelopes, &fragmentor, &NoiseModel::None);
    let run = generator.generate(&mut StdRng::seed_from_u64(1)).unwrap();

    assert_eq!(run.summary.skipped_molecules, 0);
    assert_eq!(run.summary.molecules, molecules.len());
    assert!(run.summary.survey_scans > 0);
}
