//! Simulated spectra.
//!
//! A [`Scan`] is a survey (MS1) or fragment (MS2) spectrum stored as parallel
//! m/z and intensity arrays. Fragment scans carry a [`Precursor`] pointing back
//! at the survey scan they were selected from.

use std::cmp::Ordering;

/// Precursor information of a fragment scan
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Precursor {
    /// Selected ion m/z
    pub mz: f64,
    /// Selected ion intensity in the parent survey scan
    pub intensity: f64,
    /// Selected ion charge
    pub charge: u8,
    /// Identifier of the parent survey scan
    pub scan_id: u64,
}

/// Peak statistics of a scan
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScanStatistics {
    pub total_ion_current: f64,
    pub base_peak_mz: f64,
    pub base_peak_intensity: f64,
    pub lowest_mz: f64,
    pub highest_mz: f64,
}

/// A single spectrum
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    /// Monotonically increasing identifier, unique within a run
    pub id: u64,
    /// Retention time in run time units
    pub retention_time: f64,
    /// 1 for survey scans, 2 for fragment scans
    pub ms_level: u8,
    pub mz: Vec<f64>,
    pub intensity: Vec<f64>,
    /// Only set for fragment scans
    pub precursor: Option<Precursor>,
}

impl Scan {
    /// Create an empty survey scan
    pub fn new_survey(id: u64, retention_time: f64) -> Self {
        Self {
            id,
            retention_time,
            ms_level: 1,
            mz: Vec::new(),
            intensity: Vec::new(),
            precursor: None,
        }
    }

    /// Create an empty fragment scan
    pub fn new_fragment(id: u64, retention_time: f64, precursor: Precursor) -> Self {
        Self {
            id,
            retention_time,
            ms_level: 2,
            mz: Vec::new(),
            intensity: Vec::new(),
            precursor: Some(precursor),
        }
    }

    /// Builder-style peak assignment
    pub fn with_peaks(mut self, mz: Vec<f64>, intensity: Vec<f64>) -> Self {
        debug_assert_eq!(mz.len(), intensity.len());
        self.mz = mz;
        self.intensity = intensity;
        self
    }

    /// Append one peak
    #[inline]
    pub fn push(&mut self, mz: f64, intensity: f64) {
        self.mz.push(mz);
        self.intensity.push(intensity);
    }

    /// Number of peaks
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// True if the scan holds no peaks
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// Whether this is a survey scan
    pub fn is_survey(&self) -> bool {
        self.ms_level == 1
    }

    /// Sum of all intensities
    pub fn total_ion_current(&self) -> f64 {
        self.intensity.iter().sum()
    }

    /// `(m/z, intensity)` of the most intense peak; `(0, 0)` for empty scans
    pub fn base_peak(&self) -> (f64, f64) {
        let mut best: Option<(f64, f64)> = None;
        for (mz, intensity) in self.mz.iter().zip(&self.intensity) {
            match best {
                Some((_, i)) if i >= *intensity => {}
                _ => best = Some((*mz, *intensity)),
            }
        }
        best.unwrap_or((0.0, 0.0))
    }

    /// All statistics written alongside the spectrum
    pub fn statistics(&self) -> ScanStatistics {
        let (base_peak_mz, base_peak_intensity) = self.base_peak();
        let (lowest_mz, highest_mz) = if self.is_empty() {
            (0.0, 0.0)
        } else {
            self.mz
                .iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), mz| {
                    (lo.min(*mz), hi.max(*mz))
                })
        };
        ScanStatistics {
            total_ion_current: self.total_ion_current(),
            base_peak_mz,
            base_peak_intensity,
            lowest_mz,
            highest_mz,
        }
    }

    /// Sort peaks by ascending m/z, keeping intensities aligned
    pub fn sort_by_mz(&mut self) {
        if self.mz.windows(2).all(|w| w[0] <= w[1]) {
            return;
        }
        let mut order: Vec<usize> = (0..self.mz.len()).collect();
        order.sort_by(|a, b| {
            self.mz[*a]
                .partial_cmp(&self.mz[*b])
                .unwrap_or(Ordering::Equal)
        });
        self.mz = order.iter().map(|i| self.mz[*i]).collect();
        self.intensity = order.iter().map(|i| self.intensity[*i]).collect();
    }

    /// Keep only peaks for which `keep(mz, intensity)` holds
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(f64, f64) -> bool,
    {
        let mut write = 0;
        for read in 0..self.mz.len() {
            let (mz, intensity) = (self.mz[read], self.intensity[read]);
            if keep(mz, intensity) {
                self.mz[write] = mz;
                self.intensity[write] = intensity;
                write += 1;
            }
        }
        self.mz.truncate(write);
        self.intensity.truncate(write);
    }

    /// Multiply every intensity by `factor`
    pub fn scale_intensities(&mut self, factor: f64) {
        for i in &mut self.intensity {
            *i *= factor;
        }
    }
}

/// A survey scan followed by the fragment scans acquired after it
#[derive(Debug, Clone, PartialEq)]
pub struct ScanGroup {
    pub survey: Scan,
    pub fragments: Vec<Scan>,
}

impl ScanGroup {
    /// Group without fragment scans
    pub fn new(survey: Scan) -> Self {
        Self {
            survey,
            fragments: Vec::new(),
        }
    }

    /// Number of spectra in the group
    pub fn spectrum_count(&self) -> usize {
        1 + self.fragments.len()
    }

    /// Survey then fragments, in acquisition order
    pub fn iter(&self) -> impl Iterator<Item = &Scan> {
        std::iter::once(&self.survey).chain(self.fragments.iter())
    }
}
