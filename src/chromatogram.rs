//! Summary chromatograms written next to the spectra.

use crate::scan::Scan;

/// Id of the total ion current chromatogram
pub const TIC_ID: &str = "TIC";

/// Errors raised when assembling a chromatogram
#[derive(Debug, thiserror::Error)]
pub enum ChromatogramError {
    /// Time and intensity arrays differ in length
    #[error("Array length mismatch: time has {time_len} values, intensity has {intensity_len}")]
    ArrayLengthMismatch { time_len: usize, intensity_len: usize },
}

/// Kind of chromatogram
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChromatogramKind {
    /// Total ion current
    #[default]
    TotalIonCurrent,
}

/// A time → intensity trace
#[derive(Debug, Clone, PartialEq)]
pub struct Chromatogram {
    /// Unique chromatogram identifier
    pub id: String,
    pub kind: ChromatogramKind,
    /// Time values in run time units
    pub time_array: Vec<f64>,
    pub intensity_array: Vec<f64>,
}

impl Default for Chromatogram {
    fn default() -> Self {
        Self::total_ion_current()
    }
}

impl Chromatogram {
    /// Create a chromatogram from parallel arrays
    pub fn new(
        id: impl Into<String>,
        kind: ChromatogramKind,
        time_array: Vec<f64>,
        intensity_array: Vec<f64>,
    ) -> Result<Self, ChromatogramError> {
        if time_array.len() != intensity_array.len() {
            return Err(ChromatogramError::ArrayLengthMismatch {
                time_len: time_array.len(),
                intensity_len: intensity_array.len(),
            });
        }
        Ok(Self {
            id: id.into(),
            kind,
            time_array,
            intensity_array,
        })
    }

    /// Empty total ion current chromatogram
    pub fn total_ion_current() -> Self {
        Self {
            id: TIC_ID.to_string(),
            kind: ChromatogramKind::TotalIonCurrent,
            time_array: Vec::new(),
            intensity_array: Vec::new(),
        }
    }

    /// Append one point
    pub fn push(&mut self, time: f64, intensity: f64) {
        self.time_array.push(time);
        self.intensity_array.push(intensity);
    }

    /// Append the retention time and total ion current of `scan`
    pub fn push_scan(&mut self, scan: &Scan) {
        self.push(scan.retention_time, scan.total_ion_current());
    }

    /// Number of data points
    pub fn data_point_count(&self) -> usize {
        self.time_array.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_array.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch() {
        let result = Chromatogram::new(TIC_ID, ChromatogramKind::TotalIonCurrent, vec![0.0, 1.0], vec![1.0]);
        assert!(matches!(
            result,
            Err(ChromatogramError::ArrayLengthMismatch {
                time_len: 2,
                intensity_len: 1
            })
        ));
    }

    #[test]
    fn test_push_scan() {
        let mut tic = Chromatogram::total_ion_current();
        tic.push_scan(&Scan::new_survey(1, 0.5).with_peaks(vec![100.0, 200.0], vec![1.0, 2.0]));
        tic.push_scan(&Scan::new_survey(2, 1.0));
        assert_eq!(tic.time_array, vec![0.5, 1.0]);
        assert_eq!(tic.intensity_array, vec![3.0, 0.0]);
        assert_eq!(tic.data_point_count(), 2);
    }
}
