use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

use smiter::mzml::MzMLReader;

/// Display information about an mzML file
pub fn run(file: PathBuf) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {}", file.display());
    }

    let mut reader = MzMLReader::open(&file).context("Failed to open file")?;
    let declared = reader.spectrum_count().context("Failed to read mzML header")?;

    let mut per_level: BTreeMap<u8, usize> = BTreeMap::new();
    let mut peaks = 0usize;
    let mut rt_range: Option<(f64, f64)> = None;
    let mut empty = 0usize;
    for scan in reader.spectra() {
        let scan = scan.context("Failed to read spectrum")?;
        *per_level.entry(scan.ms_level).or_insert(0) += 1;
        peaks += scan.len();
        if scan.is_empty() {
            empty += 1;
        }
        let rt = scan.retention_time;
        rt_range = Some(match rt_range {
            Some((lo, hi)) => (lo.min(rt), hi.max(rt)),
            None => (rt, rt),
        });
    }

    let mut chromatograms = Vec::new();
    while let Some(chromatogram) = reader
        .next_chromatogram()
        .context("Failed to read chromatogram")?
    {
        chromatograms.push(chromatogram);
    }

    let total: usize = per_level.values().sum();

    #[cfg(feature = "colorized_output")]
    {
        use console::style;
        println!("{}", style("mzML File Information").bold().cyan());
        println!("{}", style("=====================").cyan());
    }
    #[cfg(not(feature = "colorized_output"))]
    {
        println!("mzML File Information");
        println!("=====================");
    }
    println!("File: {}", file.display());
    println!();

    println!("Spectra:");
    println!(
        "  Total: {}{}",
        total,
        match declared {
            Some(n) if n != total => format!(" (declared {})", n),
            _ => String::new(),
        }
    );
    for (level, count) in &per_level {
        println!("  MS{}: {}", level, count);
    }
    println!("  Empty: {}", empty);
    println!("  Peaks: {}", peaks);
    if let Some((lo, hi)) = rt_range {
        println!("  Retention time: {:.3} - {:.3} {}", lo, hi, reader.time_unit());
    }
    println!();

    println!("Chromatograms: {}", chromatograms.len());
    for chromatogram in &chromatograms {
        println!(
            "  {} ({} points)",
            chromatogram.id,
            chromatogram.data_point_count()
        );
    }

    Ok(())
}
