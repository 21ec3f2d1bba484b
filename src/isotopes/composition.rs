//! Elemental compositions and the formula notations accepted on input.
//!
//! Three notations are understood:
//!
//! - parenthesised counts, optionally prefixed with `+`: `+C(10)H(12)N(4)O(5)`
//! - Hill-style counts: `C10H12N4O5` or `+C10H12N4O5`
//! - bare amino-acid sequences: `ELVISLIVES` (residues plus one water)
//!
//! A string without `+`, digits or parentheses is read as a peptide sequence.

use std::collections::BTreeMap;
use std::fmt;

use super::elements::{element, residue_composition};

/// Errors raised when a formula cannot be interpreted
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompositionError {
    #[error("Empty chemical formula")]
    Empty,

    #[error("Unknown element {symbol:?} in formula {formula:?}")]
    UnknownElement { symbol: String, formula: String },

    #[error("Unknown amino acid {residue:?} in sequence {sequence:?}")]
    UnknownResidue { residue: char, sequence: String },

    #[error("Malformed formula {formula:?} at position {position}")]
    Malformed { formula: String, position: usize },
}

/// Element counts of a molecule
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    counts: BTreeMap<&'static str, u32>,
}

impl Composition {
    /// Empty composition
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse any supported notation
    pub fn parse(input: &str) -> Result<Self, CompositionError> {
        let trimmed = input.trim();
        let (forced_formula, body) = match trimmed.strip_prefix('+') {
            Some(rest) => (true, rest.trim()),
            None => (false, trimmed),
        };
        if body.is_empty() {
            return Err(CompositionError::Empty);
        }
        if body.contains('(') {
            parse_counted(body, true)
        } else if forced_formula || body.chars().any(|c| c.is_ascii_digit()) {
            parse_counted(body, false)
        } else {
            Self::from_peptide(body)
        }
    }

    /// Composition of a linear peptide: residues plus one water
    pub fn from_peptide(sequence: &str) -> Result<Self, CompositionError> {
        if sequence.is_empty() {
            return Err(CompositionError::Empty);
        }
        let mut comp = Self::residues(sequence)?;
        comp.add_element("H", 2);
        comp.add_element("O", 1);
        Ok(comp)
    }

    /// Summed residue compositions without terminal groups
    pub fn residues(sequence: &str) -> Result<Self, CompositionError> {
        let mut comp = Self::new();
        for residue in sequence.chars() {
            let parts = residue_composition(residue).ok_or_else(|| {
                CompositionError::UnknownResidue {
                    residue,
                    sequence: sequence.to_string(),
                }
            })?;
            for (symbol, count) in parts {
                comp.add_element(symbol, *count);
            }
        }
        Ok(comp)
    }

    fn add_element(&mut self, symbol: &'static str, count: u32) {
        if count > 0 {
            *self.counts.entry(symbol).or_insert(0) += count;
        }
    }

    /// Add another composition in place
    pub fn add(&mut self, other: &Composition) {
        for (symbol, count) in &other.counts {
            self.add_element(symbol, *count);
        }
    }

    /// Number of atoms of `symbol`
    pub fn count(&self, symbol: &str) -> u32 {
        self.counts.get(symbol).copied().unwrap_or(0)
    }

    /// `(symbol, count)` pairs in symbol order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        self.counts.iter().map(|(s, c)| (*s, *c))
    }

    /// True when no atoms are present
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of lightest-isotope masses
    pub fn monoisotopic_mass(&self) -> f64 {
        self.counts
            .iter()
            .filter_map(|(symbol, count)| {
                element(symbol).map(|e| e.monoisotopic_mass() * f64::from(*count))
            })
            .sum()
    }

    /// Hill notation: carbon, hydrogen, then the rest alphabetically
    pub fn hill_notation(&self) -> String {
        let mut out = String::new();
        let mut push = |symbol: &str, count: u32| {
            out.push_str(symbol);
            if count != 1 {
                out.push_str(&count.to_string());
            }
        };
        let has_carbon = self.count("C") > 0;
        if has_carbon {
            push("C", self.count("C"));
            if self.count("H") > 0 {
                push("H", self.count("H"));
            }
        }
        for (symbol, count) in &self.counts {
            if has_carbon && (*symbol == "C" || *symbol == "H") {
                continue;
            }
            push(symbol, *count);
        }
        out
    }
}

impl fmt::Display for Composition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hill_notation())
    }
}

fn parse_counted(body: &str, parenthesised: bool) -> Result<Composition, CompositionError> {
    let malformed = |position: usize| CompositionError::Malformed {
        formula: body.to_string(),
        position,
    };
    let chars: Vec<char> = body.chars().collect();
    let mut comp = Composition::new();
    let mut pos = 0;

    while pos < chars.len() {
        let c = chars[pos];
        if c.is_whitespace() {
            pos += 1;
            continue;
        }
        if !c.is_ascii_uppercase() {
            return Err(malformed(pos));
        }
        let mut symbol = c.to_string();
        pos += 1;
        while pos < chars.len() && chars[pos].is_ascii_lowercase() {
            symbol.push(chars[pos]);
            pos += 1;
        }

        let count = if parenthesised {
            if chars.get(pos) != Some(&'(') {
                return Err(malformed(pos));
            }
            pos += 1;
            let digits_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == digits_start || chars.get(pos) != Some(&')') {
                return Err(malformed(pos));
            }
            let digits: String = chars[digits_start..pos].iter().collect();
            pos += 1;
            digits.parse::<u32>().map_err(|_| malformed(digits_start))?
        } else {
            let digits_start = pos;
            while pos < chars.len() && chars[pos].is_ascii_digit() {
                pos += 1;
            }
            if pos == digits_start {
                1
            } else {
                let digits: String = chars[digits_start..pos].iter().collect();
                digits.parse::<u32>().map_err(|_| malformed(digits_start))?
            }
        };

        let element = element(&symbol).ok_or_else(|| CompositionError::UnknownElement {
            symbol: symbol.clone(),
            formula: body.to_string(),
        })?;
        comp.add_element(element.symbol, count);
    }

    if comp.is_empty() {
        return Err(CompositionError::Empty);
    }
    Ok(comp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parenthesised_formula() {
        let comp = Composition::parse("+C(10)H(12)N(4)O(5)").unwrap();
        assert_eq!(comp.count("C"), 10);
        assert_eq!(comp.count("H"), 12);
        assert_eq!(comp.count("N"), 4);
        assert_eq!(comp.count("O"), 5);
        assert_eq!(comp, Composition::parse("C(10)H(12)N(4)O(5)").unwrap());
    }

    #[test]
    fn test_hill_formula() {
        let comp = Composition::parse("C10H12N4O5").unwrap();
        assert_eq!(comp, Composition::parse("+C(10)H(12)N(4)O(5)").unwrap());
        assert_eq!(comp.hill_notation(), "C10H12N4O5");
    }

    #[test]
    fn test_implicit_count_and_two_letter_symbols() {
        let comp = Composition::parse("+CH3Cl").unwrap();
        assert_eq!(comp.count("C"), 1);
        assert_eq!(comp.count("H"), 3);
        assert_eq!(comp.count("Cl"), 1);
    }

    #[test]
    fn test_repeated_element_is_summed() {
        let comp = Composition::parse("C(2)H(6)C(1)").unwrap();
        assert_eq!(comp.count("C"), 3);
    }

    #[test]
    fn test_peptide_sequence() {
        // G + G + water = C4H8N2O3
        let comp = Composition::parse("GG").unwrap();
        assert_eq!(comp.hill_notation(), "C4H8N2O3");
        assert!((comp.monoisotopic_mass() - 132.0534).abs() < 1e-3);
    }

    #[test]
    fn test_inosine_mass() {
        let comp = Composition::parse("+C(10)H(12)N(4)O(5)").unwrap();
        assert!((comp.monoisotopic_mass() - 268.08077).abs() < 1e-4);
    }

    #[test]
    fn test_errors() {
        assert_eq!(Composition::parse("  "), Err(CompositionError::Empty));
        assert!(matches!(
            Composition::parse("+Xy(2)"),
            Err(CompositionError::UnknownElement { .. })
        ));
        assert!(matches!(
            Composition::parse("C(10"),
            Err(CompositionError::Malformed { .. })
        ));
        assert!(matches!(
            Composition::parse("PEPTIDEB"),
            Err(CompositionError::UnknownResidue { residue: 'B', .. })
        ));
    }
}
