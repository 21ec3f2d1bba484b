//! Molecule tables in CSV form.
//!
//! Input columns: `chemical_formula`, `trivial_name`, `charge`,
//! `scan_start_time`, `peak_scaling_factor`, `peak_width`, and optionally
//! `sigma`, `peak_function`, `peak_params` (`key=value;key=value`) and
//! `ionization_efficiency`. Rows without a `peak_function` use the tailing
//! Gaussian, with `sigma` as its base width.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{MoleculeDescriptor, MoleculeSet, ParamsError};

/// Shape used for table rows that do not name one
pub const TABLE_DEFAULT_SHAPE: &str = "gauss_tail";

#[derive(Debug, Deserialize)]
struct InputRow {
    chemical_formula: Option<String>,
    trivial_name: Option<String>,
    charge: Option<u8>,
    scan_start_time: Option<f64>,
    peak_scaling_factor: Option<f64>,
    peak_width: Option<f64>,
    sigma: Option<f64>,
    peak_function: Option<String>,
    peak_params: Option<String>,
    ionization_efficiency: Option<f64>,
}

#[derive(Debug, Serialize)]
struct AuditRow<'a> {
    trivial_name: &'a str,
    chemical_formula: &'a str,
    charge: u8,
    scan_start_time: f64,
    peak_width: f64,
    peak_scaling_factor: f64,
    peak_function: &'a str,
    peak_params: String,
    ionization_efficiency: f64,
}

/// Parse `key=value;key=value`
pub fn parse_peak_params(raw: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut params = BTreeMap::new();
    for item in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = item
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {:?}", item))?;
        let value: f64 = value
            .trim()
            .parse()
            .map_err(|_| format!("invalid number {:?} for {:?}", value.trim(), key.trim()))?;
        params.insert(key.trim().to_string(), value);
    }
    Ok(params)
}

/// Format parameters as `key=value;key=value`
pub fn format_peak_params(params: &BTreeMap<String, f64>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(";")
}

fn takes_sigma(shape: &str) -> bool {
    matches!(
        shape.trim().to_ascii_lowercase().as_str(),
        "gauss" | "gaussian" | "gauss_tail"
    )
}

/// Read raw descriptors from a CSV source
pub fn read_molecule_csv<R: Read>(source: R) -> Result<Vec<MoleculeDescriptor>, ParamsError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);
    let headers = reader.headers()?.clone();

    let mut descriptors = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map_or(0, |p| p.line());
        let row: InputRow = record.deserialize(Some(&headers))?;

        let mut peak_params = match row.peak_params.as_deref() {
            Some(raw) => parse_peak_params(raw)
                .map_err(|message| ParamsError::TableFormat { line, message })?,
            None => BTreeMap::new(),
        };
        let peak_function = row
            .peak_function
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| TABLE_DEFAULT_SHAPE.to_string());
        // The sigma column feeds the Gaussian shapes; peak_params wins on conflict
        if let Some(sigma) = row.sigma {
            if !takes_sigma(&peak_function) {
                return Err(ParamsError::TableFormat {
                    line,
                    message: format!("sigma column given for elution shape {:?}", peak_function),
                });
            }
            peak_params.entry("sigma".to_string()).or_insert(sigma);
        }

        descriptors.push(MoleculeDescriptor {
            trivial_name: row.trivial_name.unwrap_or_default(),
            chemical_formula: row.chemical_formula.unwrap_or_default(),
            charge: row.charge,
            scan_start_time: row.scan_start_time,
            peak_width: row.peak_width,
            peak_scaling_factor: row.peak_scaling_factor,
            peak_function: Some(peak_function),
            peak_params,
            ionization_efficiency: row.ionization_efficiency,
        });
    }
    Ok(descriptors)
}

/// Read and validate a molecule table from disk
pub fn read_molecule_table<P: AsRef<Path>>(path: P) -> Result<MoleculeSet, ParamsError> {
    let descriptors = read_molecule_csv(File::open(path.as_ref())?)?;
    MoleculeSet::from_descriptors(&descriptors)
}

/// Write the resolved molecules, one row each, with every default spelled out
pub fn write_molecule_csv<W: Write>(sink: W, molecules: &MoleculeSet) -> Result<(), ParamsError> {
    let mut writer = csv::Writer::from_writer(sink);
    for molecule in molecules {
        writer.serialize(AuditRow {
            trivial_name: &molecule.name,
            chemical_formula: &molecule.formula,
            charge: molecule.charge,
            scan_start_time: molecule.start,
            peak_width: molecule.width,
            peak_scaling_factor: molecule.scaling_factor,
            peak_function: molecule.shape.name(),
            peak_params: format_peak_params(&molecule.shape.params()),
            ionization_efficiency: molecule.ionization_efficiency,
        })?;
    }
    writer.flush()?;
    Ok(())
}
