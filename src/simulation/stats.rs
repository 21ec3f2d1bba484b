use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Chimeric fragment scans bucketed by co-isolation group size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChimericStats {
    buckets: BTreeMap<usize, usize>,
}

impl ChimericStats {
    /// Count one fragment scan with `group_size` co-isolated molecules.
    /// Groups of one are not chimeric and are ignored.
    pub fn record(&mut self, group_size: usize) {
        if group_size > 1 {
            *self.buckets.entry(group_size).or_insert(0) += 1;
        }
    }

    /// Group size → number of fragment scans
    pub fn buckets(&self) -> &BTreeMap<usize, usize> {
        &self.buckets
    }

    /// Number of chimeric fragment scans
    pub fn total(&self) -> usize {
        self.buckets.values().sum()
    }

    /// Scans recorded for one group size
    pub fn count(&self, group_size: usize) -> usize {
        self.buckets.get(&group_size).copied().unwrap_or(0)
    }
}

impl fmt::Display for ChimericStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.buckets.is_empty() {
            return write!(f, "none");
        }
        for (i, (size, count)) in self.buckets.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}×{} precursors", count, size)?;
        }
        Ok(())
    }
}

/// Scans a molecule contributed to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoleculeScans {
    /// Survey scans with at least one reported peak of the molecule
    pub survey: Vec<u64>,
    /// Fragment scans whose isolation window contained the molecule
    pub fragment: Vec<u64>,
}

/// Outcome of one simulation run
#[derive(Debug, Clone, Default)]
pub struct SimulationSummary {
    pub survey_scans: usize,
    pub fragment_scans: usize,
    /// Molecules with a usable envelope
    pub molecules: usize,
    /// Molecules dropped because their formula could not be resolved
    pub skipped_molecules: usize,
    pub chimeric: ChimericStats,
    /// Retention time of the last emitted scan
    pub last_retention_time: f64,
    pub elapsed: Duration,
}

impl SimulationSummary {
    /// Survey plus fragment scans
    pub fn spectrum_count(&self) -> usize {
        self.survey_scans + self.fragment_scans
    }
}

impl fmt::Display for SimulationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Simulated {} spectra ({} survey, {} fragment) for {} molecules in {:.2?}",
            self.spectrum_count(),
            self.survey_scans,
            self.fragment_scans,
            self.molecules,
            self.elapsed
        )?;
        if self.skipped_molecules > 0 {
            writeln!(f, "Skipped molecules: {}", self.skipped_molecules)?;
        }
        writeln!(f, "Last retention time: {}", self.last_retention_time)?;
        write!(
            f,
            "Chimeric spectra: {} ({})",
            self.chimeric.total(),
            self.chimeric
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chimeric_buckets() {
        let mut stats = ChimericStats::default();
        stats.record(1);
        stats.record(2);
        stats.record(2);
        stats.record(3);
        assert_eq!(stats.total(), 3);
        assert_eq!(stats.count(2), 2);
        assert_eq!(stats.count(1), 0);
        assert_eq!(stats.to_string(), "2×2 precursors, 1×3 precursors");
    }

    #[test]
    fn test_summary_display() {
        let summary = SimulationSummary {
            survey_scans: 10,
            fragment_scans: 5,
            molecules: 2,
            ..SimulationSummary::default()
        };
        let text = summary.to_string();
        assert!(text.contains("15 spectra"));
        assert!(text.contains("Chimeric spectra: 0 (none)"));
    }
}
