use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use smiter::chromatogram::Chromatogram;
use smiter::mzml::{MzMLReader, MzMLWriter, WriterSettings};
use smiter::scan::{Scan, ScanGroup};

/// Regroup a spectrum stream into survey + fragments groups.
///
/// Fragment scans that precede the first survey scan have no parent in the
/// output and are dropped.
fn regroup<I>(scans: I) -> (Vec<ScanGroup>, usize)
where
    I: IntoIterator<Item = Scan>,
{
    let mut groups: Vec<ScanGroup> = Vec::new();
    let mut orphans = 0;
    for scan in scans {
        if scan.is_survey() {
            groups.push(ScanGroup::new(scan));
        } else if let Some(group) = groups.last_mut() {
            group.fragments.push(scan);
        } else {
            orphans += 1;
        }
    }
    (groups, orphans)
}

/// Copy spectra with ids in `[start, stop)` into a new mzML file
pub fn run(input: PathBuf, output: PathBuf, start: u64, stop: Option<u64>) -> Result<()> {
    if let Some(stop) = stop {
        if stop <= start {
            anyhow::bail!("Empty range: stop ({}) must be greater than start ({})", stop, start);
        }
    }

    let mut reader = MzMLReader::open(&input)
        .with_context(|| format!("Failed to open input file: {}", input.display()))?;

    let mut selected = Vec::new();
    for scan in reader.spectra() {
        let scan = scan.context("Failed to read spectrum")?;
        if scan.id < start {
            continue;
        }
        if stop.is_some_and(|stop| scan.id >= stop) {
            break;
        }
        selected.push(scan);
    }

    let (groups, orphans) = regroup(selected);
    if orphans > 0 {
        warn!("Skipped {} fragment scans without a survey scan in range", orphans);
    }

    let mut tic = Chromatogram::total_ion_current();
    for group in &groups {
        tic.push_scan(&group.survey);
    }

    let mut settings = WriterSettings {
        time_unit: reader.time_unit(),
        ..WriterSettings::default()
    };
    if let Some(width) = reader.isolation_window_width() {
        settings.isolation_window_width = width;
    }

    let file = File::create(&output)
        .with_context(|| format!("Failed to create output file: {}", output.display()))?;
    let mut writer = MzMLWriter::new(BufWriter::new(file), settings)?;
    for group in &groups {
        writer.write_group(group)?;
    }
    writer.write_chromatogram(&tic)?;
    let written = writer.spectrum_count();
    writer.finish().context("Failed to finish mzML output")?;

    info!("Filtered {} spectra into {}", written, output.display());
    println!("Wrote {} spectra to {}", written, output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use smiter::scan::Precursor;

    fn fragment(id: u64, parent: u64) -> Scan {
        Scan::new_fragment(
            id,
            0.0,
            Precursor {
                mz: 100.0,
                intensity: 1.0,
                charge: 1,
                scan_id: parent,
            },
        )
    }

    #[test]
    fn test_regroup_drops_leading_fragments() {
        let scans = vec![
            fragment(2, 1),
            Scan::new_survey(3, 0.0),
            fragment(4, 3),
            fragment(5, 3),
            Scan::new_survey(6, 0.0),
        ];
        let (groups, orphans) = regroup(scans);
        assert_eq!(orphans, 1);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].survey.id, 3);
        assert_eq!(groups[0].fragments.len(), 2);
        assert!(groups[1].fragments.is_empty());
    }
}
