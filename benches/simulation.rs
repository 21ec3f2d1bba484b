use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smiter::prelude::*;
use tempfile::TempDir;

const FORMULAS: [&str; 4] = [
    "+C(10)H(12)N(4)O(5)",
    "+C(10)H(13)N(5)O(4)",
    "+C(9)H(12)N(2)O(6)",
    "+C(10)H(13)N(5)O(5)",
];

/// Generate a synthetic molecule set spread over `gradient` seconds
fn generate_molecules(count: usize, gradient: f64) -> MoleculeSet {
    let mut rng = StdRng::seed_from_u64(1234);
    let descriptors: Vec<MoleculeDescriptor> = (0..count)
        .map(|i| {
            let start = rng.gen_range(0.0..gradient * 0.9);
            let width = rng.gen_range(5.0..30.0);
            let mut descriptor =
                MoleculeDescriptor::new(&format!("m{}", i), FORMULAS[i % FORMULAS.len()], start, width);
            descriptor.peak_scaling_factor = Some(rng.gen_range(1e4..1e6));
            descriptor.peak_function = Some("gauss".to_string());
            descriptor
        })
        .collect();
    MoleculeSet::from_descriptors(&descriptors).unwrap()
}

/// Benchmark the scan generator alone
fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("scan_generation");
    let gradient = 120.0;

    for num_molecules in [10, 100, 1000] {
        let molecules = generate_molecules(num_molecules, gradient);
        let envelopes = build_envelope_cache(&molecules, &NaturalAbundance::default());
        let fragmentor = StaticFragmentor::new(vec![(136.06, 1000.0), (137.05, 200.0)]);
        let noise = NoiseModel::default();
        let params = RunSettings::with_gradient(gradient).validate().unwrap();

        group.throughput(Throughput::Elements(num_molecules as u64));
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}molecules", num_molecules)),
            &num_molecules,
            |b, _| {
                b.iter(|| {
                    let generator =
                        ScanGenerator::new(params, &molecules, &envelopes, &fragmentor, &noise);
                    let run = generator.generate(&mut StdRng::seed_from_u64(42)).unwrap();
                    black_box(run.spectrum_count())
                });
            },
        );
    }
    group.finish();
}

/// Benchmark streaming a run straight into an mzML file
fn bench_generate_to_mzml(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_to_mzml");
    let gradient = 60.0;
    let molecules = generate_molecules(200, gradient);
    let envelopes = build_envelope_cache(&molecules, &NaturalAbundance::default());
    let fragmentor = StaticFragmentor::new(vec![(136.06, 1000.0)]);
    let noise = NoiseModel::default();
    let params = RunSettings::with_gradient(gradient).validate().unwrap();

    group.bench_function("200molecules_60s", |b| {
        b.iter_batched(
            || TempDir::new().unwrap(),
            |temp_dir| {
                let path = temp_dir.path().join("bench.mzML");
                let generator = ScanGenerator::new(params, &molecules, &envelopes, &fragmentor, &noise);
                let mut writer = MzMLWriter::create(&path, &params).unwrap();
                let report = generator
                    .generate_into(&mut StdRng::seed_from_u64(7), &mut writer)
                    .unwrap();
                writer.write_chromatogram(&report.tic).unwrap();
                writer.finish().unwrap();
                drop(temp_dir);
            },
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

/// Benchmark isotope envelope computation for distinct formulas
fn bench_envelope_cache(c: &mut Criterion) {
    let mut group = c.benchmark_group("envelope_cache");
    for num_molecules in [100, 1000] {
        let molecules = generate_molecules(num_molecules, 600.0);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}molecules", num_molecules)),
            &molecules,
            |b, molecules| {
                b.iter(|| {
                    let cache = build_envelope_cache(molecules, &NaturalAbundance::default());
                    black_box(cache)
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_generation,
    bench_generate_to_mzml,
    bench_envelope_cache
);
criterion_main!(benches);
