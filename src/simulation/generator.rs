use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};
use rand::RngCore;

use super::exclusion::DynamicExclusion;
use super::stats::{ChimericStats, MoleculeScans, SimulationSummary};
use super::SimulationError;
use crate::chromatogram::Chromatogram;
use crate::fragmentation::Fragmentor;
use crate::interval_index::IntervalIndex;
use crate::isotopes::EnvelopeCache;
use crate::noise::NoiseInjector;
use crate::params::{MoleculeSet, RunParameters};
use crate::scan::{Precursor, Scan, ScanGroup};

/// Coincident m/z values are merged at this resolution (6 decimals)
const MERGE_RESOLUTION: f64 = 1e6;

/// Receives each survey scan together with its fragment scans
pub trait ScanSink {
    fn accept(&mut self, group: ScanGroup) -> Result<(), SimulationError>;
}

impl ScanSink for Vec<ScanGroup> {
    fn accept(&mut self, group: ScanGroup) -> Result<(), SimulationError> {
        self.push(group);
        Ok(())
    }
}

/// Everything a run produces besides the scans themselves
#[derive(Debug, Clone, Default)]
pub struct SimulationReport {
    pub summary: SimulationSummary,
    /// Total ion current of the survey scans
    pub tic: Chromatogram,
    /// Scan ids per trivial name
    pub molecule_scans: BTreeMap<String, MoleculeScans>,
}

/// A fully materialized run
#[derive(Debug, Clone, Default)]
pub struct SimulatedRun {
    pub groups: Vec<ScanGroup>,
    pub summary: SimulationSummary,
    pub tic: Chromatogram,
    pub molecule_scans: BTreeMap<String, MoleculeScans>,
}

impl SimulatedRun {
    /// Survey plus fragment scans
    pub fn spectrum_count(&self) -> usize {
        self.groups.iter().map(ScanGroup::spectrum_count).sum()
    }

    /// All scans in acquisition order
    pub fn scans(&self) -> impl Iterator<Item = &Scan> {
        self.groups.iter().flat_map(ScanGroup::iter)
    }
}

/// A molecule seen in a survey scan
#[derive(Debug, Clone, Copy)]
struct Observed {
    key: usize,
    /// Most abundant envelope peak
    mz: f64,
    intensity: f64,
    /// Sum of the molecule's reported peaks
    total: f64,
    /// Abundance factor at survey time
    factor: f64,
}

/// Time-stepped data-dependent acquisition
pub struct ScanGenerator<'a> {
    params: RunParameters,
    molecules: &'a MoleculeSet,
    envelopes: &'a EnvelopeCache,
    fragmentor: &'a dyn Fragmentor,
    noise: &'a dyn NoiseInjector,
    index: IntervalIndex,
}

impl<'a> ScanGenerator<'a> {
    /// Molecules without an envelope in `envelopes` never elute.
    pub fn new(
        params: RunParameters,
        molecules: &'a MoleculeSet,
        envelopes: &'a EnvelopeCache,
        fragmentor: &'a dyn Fragmentor,
        noise: &'a dyn NoiseInjector,
    ) -> Self {
        let index = IntervalIndex::from_windows(
            molecules
                .iter()
                .enumerate()
                .filter(|(_, m)| envelopes.contains(&m.name))
                .map(|(key, m)| (key, m.start, m.width)),
        );
        Self {
            params,
            molecules,
            envelopes,
            fragmentor,
            noise,
            index,
        }
    }

    pub fn params(&self) -> &RunParameters {
        &self.params
    }

    /// Simulate the whole gradient and keep every scan in memory.
    pub fn generate(&self, rng: &mut dyn RngCore) -> Result<SimulatedRun, SimulationError> {
        let mut groups = Vec::new();
        let report = self.generate_into(rng, &mut groups)?;
        Ok(SimulatedRun {
            groups,
            summary: report.summary,
            tic: report.tic,
            molecule_scans: report.molecule_scans,
        })
    }

    /// Simulate the whole gradient, handing each scan group to `sink` as
    /// soon as its fragmentation round ends.
    pub fn generate_into(
        &self,
        rng: &mut dyn RngCore,
        sink: &mut dyn ScanSink,
    ) -> Result<SimulationReport, SimulationError> {
        let started = Instant::now();
        let params = &self.params;
        info!("Simulating run: {}", params);
        info!(
            "{} of {} molecules have elution windows",
            self.index.len(),
            self.molecules.len()
        );

        let mut sweep = self.index.sweep();
        let mut exclusion = DynamicExclusion::new(params.dynamic_exclusion);
        let mut chimeric = ChimericStats::default();
        let mut tic = Chromatogram::total_ion_current();
        let mut contributions = vec![MoleculeScans::default(); self.molecules.len()];
        let mut survey_scans = 0;
        let mut fragment_scans = 0;
        let mut last_retention_time = 0.0;

        // scans emitted so far; scan ids are 1-based
        let mut n: u64 = 0;
        while params.time_of(n) < params.gradient_length {
            let t = params.time_of(n);
            let survey_id = n + 1;
            let active = sweep.advance(t);
            let (survey, observed) = self.survey_scan(survey_id, t, &active, rng);
            for molecule in &observed {
                contributions[molecule.key].survey.push(survey_id);
            }
            tic.push_scan(&survey);
            survey_scans += 1;
            last_retention_time = t;
            n += 1;

            let mut group = ScanGroup::new(survey);
            if params.time_of(n) > params.gradient_length {
                sink.accept(group)?;
                break;
            }

            let mut ranked = observed.clone();
            ranked.sort_by(|a, b| {
                b.total
                    .partial_cmp(&a.total)
                    .unwrap_or(Ordering::Equal)
                    .then(a.key.cmp(&b.key))
            });

            let mut selected = 0;
            for candidate in &ranked {
                if selected >= params.max_ms2_spectra {
                    break;
                }
                let t = params.time_of(n);
                let molecule = self.molecules_by_key(candidate.key);
                if exclusion.is_excluded(candidate.key, t) {
                    debug!("{} excluded at {:.3}", molecule.name, t);
                    continue;
                }
                if !molecule.is_eluting(t) {
                    debug!("{} no longer eluting at {:.3}", molecule.name, t);
                    continue;
                }

                let members: Vec<usize> = active
                    .iter()
                    .copied()
                    .filter(|&key| {
                        self.monoisotopic_mz(key).is_some_and(|mz| {
                            (mz - candidate.mz).abs() <= params.isolation_window_width
                        })
                    })
                    .collect();
                chimeric.record(members.len());

                let fragment_id = n + 1;
                let precursor = Precursor {
                    mz: candidate.mz,
                    intensity: candidate.intensity,
                    charge: molecule.charge,
                    scan_id: survey_id,
                };
                let scan = self.fragment_scan(fragment_id, t, precursor, candidate, &members, rng)?;

                exclusion.record(candidate.key, t);
                for key in &members {
                    contributions[*key].fragment.push(fragment_id);
                }
                group.fragments.push(scan);
                fragment_scans += 1;
                selected += 1;
                last_retention_time = t;
                n += 1;

                if params.time_of(n) > params.gradient_length {
                    debug!("Gradient exhausted during fragmentation round");
                    break;
                }
            }
            sink.accept(group)?;
        }

        let molecule_scans = self
            .molecules
            .iter()
            .zip(contributions)
            .map(|(m, scans)| (m.name.clone(), scans))
            .collect();
        let summary = SimulationSummary {
            survey_scans,
            fragment_scans,
            molecules: self.index.len(),
            skipped_molecules: self.envelopes.skipped().len(),
            chimeric,
            last_retention_time,
            elapsed: started.elapsed(),
        };
        info!(
            "Generated {} survey and {} fragment scans in {:.2?}",
            summary.survey_scans, summary.fragment_scans, summary.elapsed
        );
        if summary.chimeric.total() > 0 {
            info!("Chimeric spectra: {}", summary.chimeric);
        }

        Ok(SimulationReport {
            summary,
            tic,
            molecule_scans,
        })
    }

    fn molecules_by_key(&self, key: usize) -> &crate::params::Molecule {
        // keys come from the index built over this set
        &self.molecules.as_slice()[key]
    }

    /// m/z of the most abundant envelope peak, ignoring reporting limits
    fn monoisotopic_mz(&self, key: usize) -> Option<f64> {
        self.envelopes
            .get(&self.molecules_by_key(key).name)
            .map(|cached| cached.highest_mz())
    }

    /// Merge the rescaled envelopes of all active molecules into one noisy
    /// survey scan.
    fn survey_scan(
        &self,
        id: u64,
        t: f64,
        active: &[usize],
        rng: &mut dyn RngCore,
    ) -> (Scan, Vec<Observed>) {
        let params = &self.params;
        let mut merged: BTreeMap<i64, (f64, f64)> = BTreeMap::new();
        let mut observed = Vec::with_capacity(active.len());

        for &key in active {
            let molecule = self.molecules_by_key(key);
            let Some(cached) = self.envelopes.get(&molecule.name) else {
                continue;
            };
            let factor = molecule.abundance_factor(t);
            let mut total = 0.0;
            let mut reported = false;

            let envelope = &cached.envelope;
            for (&mz, &abundance) in envelope.mz.iter().zip(&envelope.abundance) {
                let intensity = abundance * factor;
                if intensity < params.min_intensity || !params.mz_in_range(mz) {
                    continue;
                }
                let intensity = intensity.min(params.max_intensity);
                total += intensity;
                reported = true;
                let slot = merged
                    .entry((mz * MERGE_RESOLUTION).round() as i64)
                    .or_insert((mz, 0.0));
                slot.1 += intensity;
            }

            // Precursor is the most abundant peak, even outside the reporting limits
            if reported {
                let intensity = (envelope.abundance[cached.highest] * factor).min(params.max_intensity);
                observed.push(Observed {
                    key,
                    mz: cached.highest_mz(),
                    intensity,
                    total,
                    factor,
                });
            }
        }

        let (mz, intensity): (Vec<f64>, Vec<f64>) = merged.into_values().unzip();
        let mut scan = Scan::new_survey(id, t).with_peaks(mz, intensity);
        self.noise.inject(&mut scan, rng);
        (scan, observed)
    }

    /// Fragment the co-isolated molecules of one precursor selection.
    fn fragment_scan(
        &self,
        id: u64,
        t: f64,
        precursor: Precursor,
        candidate: &Observed,
        members: &[usize],
        rng: &mut dyn RngCore,
    ) -> Result<Scan, SimulationError> {
        let names: Vec<&str> = members
            .iter()
            .map(|key| self.molecules_by_key(*key).name.as_str())
            .collect();
        let peaks = self.fragmentor.fragment(&names)?;
        let (mz, intensity): (Vec<f64>, Vec<f64>) = peaks.into_iter().unzip();

        let mut scan = Scan::new_fragment(id, t, precursor).with_peaks(mz, intensity);
        scan.scale_intensities(candidate.factor);
        self.noise.inject(&mut scan, rng);
        scan.scale_intensities(self.params.fragment_yield);
        scan.sort_by_mz();
        Ok(scan)
    }
}
