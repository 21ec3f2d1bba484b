//! PSI-MS controlled vocabulary terms used in simulated runs
//!
//! Reference: <https://github.com/HUPO-PSI/psi-ms-CV>

use std::fmt;

use crate::params::TimeUnit;

/// A controlled vocabulary term with its accession and name
#[derive(Debug, Clone, PartialEq)]
pub struct CvTerm {
    /// CV accession (e.g., "MS:1000511")
    pub accession: &'static str,
    pub name: &'static str,
    pub value: Option<String>,
    pub unit_accession: Option<&'static str>,
    pub unit_name: Option<&'static str>,
}

impl CvTerm {
    pub fn new(accession: &'static str, name: &'static str) -> Self {
        Self {
            accession,
            name,
            value: None,
            unit_accession: None,
            unit_name: None,
        }
    }

    pub fn with_value(mut self, value: impl ToString) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn with_unit(mut self, unit_accession: &'static str, unit_name: &'static str) -> Self {
        self.unit_accession = Some(unit_accession);
        self.unit_name = Some(unit_name);
        self
    }

    /// CV list reference derived from the accession prefix
    pub fn cv_ref(&self) -> &'static str {
        if self.accession.starts_with("UO:") {
            "UO"
        } else {
            "MS"
        }
    }

    /// CV list reference of the unit, if any
    pub fn unit_cv_ref(&self) -> Option<&'static str> {
        self.unit_accession
            .map(|a| if a.starts_with("UO:") { "UO" } else { "MS" })
    }
}

impl fmt::Display for CvTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "[{}: {}={}]", self.accession, self.name, v),
            None => write!(f, "[{}: {}]", self.accession, self.name),
        }
    }
}

/// Accessions the reader dispatches on
pub mod accessions {
    pub const MS_LEVEL: &str = "MS:1000511";
    pub const SCAN_START_TIME: &str = "MS:1000016";
    pub const SELECTED_ION_MZ: &str = "MS:1000744";
    pub const ISOLATION_WINDOW_LOWER_OFFSET: &str = "MS:1000828";
    pub const CHARGE_STATE: &str = "MS:1000041";
    pub const PEAK_INTENSITY: &str = "MS:1000042";
    pub const MZ_ARRAY: &str = "MS:1000514";
    pub const INTENSITY_ARRAY: &str = "MS:1000515";
    pub const TIME_ARRAY: &str = "MS:1000595";
    pub const TIC_CHROMATOGRAM: &str = "MS:1000235";
    pub const FLOAT_32: &str = "MS:1000521";
    pub const FLOAT_64: &str = "MS:1000523";
    pub const NO_COMPRESSION: &str = "MS:1000576";
    pub const ZLIB_COMPRESSION: &str = "MS:1000574";
    pub const MINUTE: &str = "UO:0000031";
}

pub mod ms_terms {
    use super::CvTerm;
    use crate::params::TimeUnit;

    pub fn ms1_spectrum() -> CvTerm {
        CvTerm::new("MS:1000579", "MS1 spectrum")
    }

    pub fn msn_spectrum() -> CvTerm {
        CvTerm::new("MS:1000580", "MSn spectrum")
    }

    pub fn ms_level(level: u8) -> CvTerm {
        CvTerm::new(super::accessions::MS_LEVEL, "ms level").with_value(level)
    }

    pub fn centroid_spectrum() -> CvTerm {
        CvTerm::new("MS:1000127", "centroid spectrum")
    }

    pub fn positive_scan() -> CvTerm {
        CvTerm::new("MS:1000130", "positive scan")
    }

    pub fn total_ion_current(tic: f64) -> CvTerm {
        CvTerm::new("MS:1000285", "total ion current").with_value(tic)
    }

    pub fn base_peak_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000504", "base peak m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn base_peak_intensity(intensity: f64) -> CvTerm {
        CvTerm::new("MS:1000505", "base peak intensity")
            .with_value(intensity)
            .with_unit("MS:1000131", "number of detector counts")
    }

    pub fn lowest_observed_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000528", "lowest observed m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn highest_observed_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000527", "highest observed m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn no_combination() -> CvTerm {
        CvTerm::new("MS:1000795", "no combination")
    }

    pub fn scan_start_time(time: f64, unit: TimeUnit) -> CvTerm {
        CvTerm::new(super::accessions::SCAN_START_TIME, "scan start time")
            .with_value(time)
            .with_unit(unit.accession(), unit.name())
    }

    pub fn isolation_window_target_mz(mz: f64) -> CvTerm {
        CvTerm::new("MS:1000827", "isolation window target m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn isolation_window_lower_offset(offset: f64) -> CvTerm {
        CvTerm::new(super::accessions::ISOLATION_WINDOW_LOWER_OFFSET, "isolation window lower offset")
            .with_value(offset)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn isolation_window_upper_offset(offset: f64) -> CvTerm {
        CvTerm::new("MS:1000829", "isolation window upper offset")
            .with_value(offset)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn selected_ion_mz(mz: f64) -> CvTerm {
        CvTerm::new(super::accessions::SELECTED_ION_MZ, "selected ion m/z")
            .with_value(mz)
            .with_unit("MS:1000040", "m/z")
    }

    pub fn charge_state(charge: u8) -> CvTerm {
        CvTerm::new(super::accessions::CHARGE_STATE, "charge state").with_value(charge)
    }

    pub fn peak_intensity(intensity: f64) -> CvTerm {
        CvTerm::new(super::accessions::PEAK_INTENSITY, "peak intensity")
            .with_value(intensity)
            .with_unit("MS:1000131", "number of detector counts")
    }

    pub fn cid() -> CvTerm {
        CvTerm::new("MS:1000133", "collision-induced dissociation")
    }

    pub fn tic_chromatogram() -> CvTerm {
        CvTerm::new(super::accessions::TIC_CHROMATOGRAM, "total ion current chromatogram")
    }

    pub fn float_64() -> CvTerm {
        CvTerm::new(super::accessions::FLOAT_64, "64-bit float")
    }

    pub fn zlib_compression() -> CvTerm {
        CvTerm::new(super::accessions::ZLIB_COMPRESSION, "zlib compression")
    }

    pub fn mz_array() -> CvTerm {
        CvTerm::new(super::accessions::MZ_ARRAY, "m/z array").with_unit("MS:1000040", "m/z")
    }

    pub fn intensity_array() -> CvTerm {
        CvTerm::new(super::accessions::INTENSITY_ARRAY, "intensity array")
            .with_unit("MS:1000131", "number of detector counts")
    }

    pub fn time_array(unit: TimeUnit) -> CvTerm {
        CvTerm::new(super::accessions::TIME_ARRAY, "time array").with_unit(unit.accession(), unit.name())
    }
}

/// Time unit named by a unit accession, seconds when absent or unknown
pub fn time_unit_from_accession(accession: Option<&str>) -> TimeUnit {
    match accession {
        Some(accessions::MINUTE) => TimeUnit::Minute,
        _ => TimeUnit::Second,
    }
}
