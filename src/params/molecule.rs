use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::ParamsError;
use crate::elution::ElutionShape;

/// Default precursor charge
pub const DEFAULT_CHARGE: u8 = 2;
/// Default peak scaling factor
pub const DEFAULT_SCALING_FACTOR: f64 = 1e3;
/// Default ionization efficiency multiplier
pub const DEFAULT_IONIZATION_EFFICIENCY: f64 = 1.0;

/// Molecule description as provided by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MoleculeDescriptor {
    /// Unique key of the molecule
    pub trivial_name: String,
    /// Formula handed to the envelope source; may be shared between names
    pub chemical_formula: String,
    pub charge: Option<u8>,
    /// Start of the elution window (required)
    pub scan_start_time: Option<f64>,
    /// Width of the elution window (required)
    pub peak_width: Option<f64>,
    pub peak_scaling_factor: Option<f64>,
    /// Elution shape name, flat when absent
    pub peak_function: Option<String>,
    pub peak_params: BTreeMap<String, f64>,
    pub ionization_efficiency: Option<f64>,
}

impl MoleculeDescriptor {
    /// Descriptor with the required fields set
    pub fn new(name: &str, formula: &str, start: f64, width: f64) -> Self {
        Self {
            trivial_name: name.to_string(),
            chemical_formula: formula.to_string(),
            scan_start_time: Some(start),
            peak_width: Some(width),
            ..Self::default()
        }
    }

    fn missing(&self, field: &'static str) -> ParamsError {
        ParamsError::MissingField {
            owner: format!("molecule {:?}", self.trivial_name),
            field,
        }
    }

    fn invalid(&self, reason: impl Into<String>) -> ParamsError {
        ParamsError::InvalidMolecule {
            name: self.trivial_name.clone(),
            reason: reason.into(),
        }
    }

    /// Fill defaults and validate every field.
    pub fn resolve(&self) -> Result<Molecule, ParamsError> {
        if self.trivial_name.trim().is_empty() {
            return Err(self.missing("trivial_name"));
        }
        if self.chemical_formula.trim().is_empty() {
            return Err(self.missing("chemical_formula"));
        }
        let start = self
            .scan_start_time
            .ok_or_else(|| self.missing("scan_start_time"))?;
        let width = self.peak_width.ok_or_else(|| self.missing("peak_width"))?;
        if !start.is_finite() || start < 0.0 {
            return Err(self.invalid(format!("scan_start_time {} must be non-negative", start)));
        }
        if !width.is_finite() || width < 0.0 {
            return Err(self.invalid(format!("peak_width {} must be non-negative", width)));
        }

        let charge = self.charge.unwrap_or(DEFAULT_CHARGE);
        if charge == 0 {
            return Err(self.invalid("charge must be at least 1"));
        }
        let scaling_factor = self.peak_scaling_factor.unwrap_or(DEFAULT_SCALING_FACTOR);
        if !scaling_factor.is_finite() || scaling_factor < 0.0 {
            return Err(self.invalid(format!(
                "peak_scaling_factor {} must be non-negative",
                scaling_factor
            )));
        }
        let ionization_efficiency = self
            .ionization_efficiency
            .unwrap_or(DEFAULT_IONIZATION_EFFICIENCY);
        if !ionization_efficiency.is_finite() || ionization_efficiency < 0.0 {
            return Err(self.invalid(format!(
                "ionization_efficiency {} must be non-negative",
                ionization_efficiency
            )));
        }

        let shape = ElutionShape::resolve(self.peak_function.as_deref(), &self.peak_params, width)
            .map_err(|source| ParamsError::Shape {
                name: self.trivial_name.clone(),
                source,
            })?;

        Ok(Molecule {
            name: self.trivial_name.trim().to_string(),
            formula: self.chemical_formula.trim().to_string(),
            charge,
            start,
            width,
            scaling_factor,
            shape,
            ionization_efficiency,
        })
    }
}

/// A validated molecule with every default filled in
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    pub name: String,
    pub formula: String,
    pub charge: u8,
    /// Elution window start
    pub start: f64,
    /// Elution window width
    pub width: f64,
    pub scaling_factor: f64,
    pub shape: ElutionShape,
    pub ionization_efficiency: f64,
}

impl Molecule {
    /// End of the elution window (exclusive)
    pub fn end(&self) -> f64 {
        self.start + self.width
    }

    /// Whether `t` lies in `[start, end)`
    pub fn is_eluting(&self, t: f64) -> bool {
        t >= self.start && t < self.end()
    }

    /// Factor applied to relative envelope abundances at time `t`
    pub fn abundance_factor(&self, t: f64) -> f64 {
        self.shape.scale(t, self.start, self.width) * self.scaling_factor * self.ionization_efficiency
    }

    /// Fully specified descriptor, used for audit output
    pub fn to_descriptor(&self) -> MoleculeDescriptor {
        MoleculeDescriptor {
            trivial_name: self.name.clone(),
            chemical_formula: self.formula.clone(),
            charge: Some(self.charge),
            scan_start_time: Some(self.start),
            peak_width: Some(self.width),
            peak_scaling_factor: Some(self.scaling_factor),
            peak_function: Some(self.shape.name().to_string()),
            peak_params: self.shape.params(),
            ionization_efficiency: Some(self.ionization_efficiency),
        }
    }
}

/// Validated molecules in input order, addressable by trivial name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoleculeSet {
    molecules: Vec<Molecule>,
    by_name: HashMap<String, usize>,
}

impl MoleculeSet {
    /// Collect already validated molecules, rejecting duplicate names
    pub fn new(molecules: Vec<Molecule>) -> Result<Self, ParamsError> {
        let mut by_name = HashMap::with_capacity(molecules.len());
        for (idx, molecule) in molecules.iter().enumerate() {
            if by_name.insert(molecule.name.clone(), idx).is_some() {
                return Err(ParamsError::DuplicateName(molecule.name.clone()));
            }
        }
        Ok(Self { molecules, by_name })
    }

    /// Resolve every descriptor; the first invalid one aborts
    pub fn from_descriptors<'a, I>(descriptors: I) -> Result<Self, ParamsError>
    where
        I: IntoIterator<Item = &'a MoleculeDescriptor>,
    {
        let molecules = descriptors
            .into_iter()
            .map(MoleculeDescriptor::resolve)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(molecules)
    }

    /// Resolve a name → descriptor mapping. Descriptors without a trivial
    /// name take the map key.
    pub fn from_map(map: BTreeMap<String, MoleculeDescriptor>) -> Result<Self, ParamsError> {
        let descriptors: Vec<MoleculeDescriptor> = map
            .into_iter()
            .map(|(key, mut descriptor)| {
                if descriptor.trivial_name.trim().is_empty() {
                    descriptor.trivial_name = key;
                }
                descriptor
            })
            .collect();
        Self::from_descriptors(&descriptors)
    }

    pub fn len(&self) -> usize {
        self.molecules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.molecules.is_empty()
    }

    /// Molecule by position
    pub fn get(&self, idx: usize) -> Option<&Molecule> {
        self.molecules.get(idx)
    }

    /// Molecule by trivial name
    pub fn by_name(&self, name: &str) -> Option<&Molecule> {
        self.by_name.get(name).map(|idx| &self.molecules[*idx])
    }

    pub fn as_slice(&self) -> &[Molecule] {
        &self.molecules
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Molecule> {
        self.molecules.iter()
    }

    /// Trivial names in input order
    pub fn names(&self) -> Vec<&str> {
        self.molecules.iter().map(|m| m.name.as_str()).collect()
    }

    /// Latest end of any elution window
    pub fn last_elution_end(&self) -> Option<f64> {
        self.molecules.iter().map(Molecule::end).reduce(f64::max)
    }
}

impl<'a> IntoIterator for &'a MoleculeSet {
    type Item = &'a Molecule;
    type IntoIter = std::slice::Iter<'a, Molecule>;

    fn into_iter(self) -> Self::IntoIter {
        self.molecules.iter()
    }
}
