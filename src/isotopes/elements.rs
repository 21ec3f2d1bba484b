//! Element and amino-acid tables.
//!
//! Isotope masses and natural abundances follow the IUPAC tables; each isotope
//! carries its nominal offset from the lightest isotope so patterns can be
//! convolved on an integer grid.

/// Mass of a proton in Da
pub const PROTON: f64 = 1.00727646677;

/// Monoisotopic mass of water in Da
pub const WATER: f64 = 18.0105646863;

/// One stable isotope of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isotope {
    /// Nominal mass difference to the lightest isotope
    pub offset: usize,
    /// Exact mass in Da
    pub mass: f64,
    /// Natural abundance (fraction)
    pub abundance: f64,
}

const fn iso(offset: usize, mass: f64, abundance: f64) -> Isotope {
    Isotope {
        offset,
        mass,
        abundance,
    }
}

/// A chemical element with its stable isotopes, lightest first
#[derive(Debug)]
pub struct Element {
    pub symbol: &'static str,
    pub isotopes: &'static [Isotope],
}

impl Element {
    /// Mass of the lightest isotope
    pub fn monoisotopic_mass(&self) -> f64 {
        self.isotopes[0].mass
    }
}

pub static ELEMENTS: &[Element] = &[
    Element {
        symbol: "H",
        isotopes: &[iso(0, 1.00782503223, 0.999885), iso(1, 2.01410177812, 0.000115)],
    },
    Element {
        symbol: "C",
        isotopes: &[iso(0, 12.0, 0.9893), iso(1, 13.00335483507, 0.0107)],
    },
    Element {
        symbol: "N",
        isotopes: &[iso(0, 14.00307400443, 0.99636), iso(1, 15.00010889888, 0.00364)],
    },
    Element {
        symbol: "O",
        isotopes: &[
            iso(0, 15.99491461957, 0.99757),
            iso(1, 16.99913175650, 0.00038),
            iso(2, 17.99915961286, 0.00205),
        ],
    },
    Element {
        symbol: "P",
        isotopes: &[iso(0, 30.97376199842, 1.0)],
    },
    Element {
        symbol: "S",
        isotopes: &[
            iso(0, 31.9720711744, 0.9499),
            iso(1, 32.9714589098, 0.0075),
            iso(2, 33.967867004, 0.0425),
            iso(4, 35.96708071, 0.0001),
        ],
    },
    Element {
        symbol: "F",
        isotopes: &[iso(0, 18.99840316273, 1.0)],
    },
    Element {
        symbol: "Cl",
        isotopes: &[iso(0, 34.968852682, 0.7576), iso(2, 36.965902602, 0.2424)],
    },
    Element {
        symbol: "Br",
        isotopes: &[iso(0, 78.9183376, 0.5069), iso(2, 80.9162897, 0.4931)],
    },
    Element {
        symbol: "I",
        isotopes: &[iso(0, 126.9044719, 1.0)],
    },
    Element {
        symbol: "Na",
        isotopes: &[iso(0, 22.9897692820, 1.0)],
    },
    Element {
        symbol: "K",
        isotopes: &[
            iso(0, 38.963706679, 0.932581),
            iso(1, 39.963998166, 0.000117),
            iso(2, 40.961825257, 0.067302),
        ],
    },
    Element {
        symbol: "Mg",
        isotopes: &[
            iso(0, 23.985041697, 0.7899),
            iso(1, 24.985836976, 0.1000),
            iso(2, 25.982592968, 0.1101),
        ],
    },
    Element {
        symbol: "Si",
        isotopes: &[
            iso(0, 27.97692653465, 0.92223),
            iso(1, 28.9764946649, 0.04685),
            iso(2, 29.973770136, 0.03092),
        ],
    },
    Element {
        symbol: "Fe",
        isotopes: &[
            iso(0, 53.9396090, 0.05845),
            iso(2, 55.9349363, 0.91754),
            iso(3, 56.9353928, 0.02119),
            iso(4, 57.9332744, 0.00282),
        ],
    },
    Element {
        symbol: "Se",
        isotopes: &[
            iso(0, 73.9224764, 0.0089),
            iso(2, 75.9192136, 0.0937),
            iso(3, 76.9199140, 0.0763),
            iso(4, 77.9173095, 0.2377),
            iso(6, 79.9165218, 0.4961),
            iso(8, 81.9166995, 0.0873),
        ],
    },
];

/// Look up an element by symbol
pub fn element(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Residue (amino acid minus water) compositions as `(symbol, count)` pairs
pub fn residue_composition(residue: char) -> Option<&'static [(&'static str, u32)]> {
    let comp: &'static [(&'static str, u32)] = match residue {
        'G' => &[("C", 2), ("H", 3), ("N", 1), ("O", 1)],
        'A' => &[("C", 3), ("H", 5), ("N", 1), ("O", 1)],
        'S' => &[("C", 3), ("H", 5), ("N", 1), ("O", 2)],
        'P' => &[("C", 5), ("H", 7), ("N", 1), ("O", 1)],
        'V' => &[("C", 5), ("H", 9), ("N", 1), ("O", 1)],
        'T' => &[("C", 4), ("H", 7), ("N", 1), ("O", 2)],
        'C' => &[("C", 3), ("H", 5), ("N", 1), ("O", 1), ("S", 1)],
        'L' | 'I' => &[("C", 6), ("H", 11), ("N", 1), ("O", 1)],
        'N' => &[("C", 4), ("H", 6), ("N", 2), ("O", 2)],
        'D' => &[("C", 4), ("H", 5), ("N", 1), ("O", 3)],
        'Q' => &[("C", 5), ("H", 8), ("N", 2), ("O", 2)],
        'K' => &[("C", 6), ("H", 12), ("N", 2), ("O", 1)],
        'E' => &[("C", 5), ("H", 7), ("N", 1), ("O", 3)],
        'M' => &[("C", 5), ("H", 9), ("N", 1), ("O", 1), ("S", 1)],
        'H' => &[("C", 6), ("H", 7), ("N", 3), ("O", 1)],
        'F' => &[("C", 9), ("H", 9), ("N", 1), ("O", 1)],
        'R' => &[("C", 6), ("H", 12), ("N", 4), ("O", 1)],
        'Y' => &[("C", 9), ("H", 9), ("N", 1), ("O", 2)],
        'W' => &[("C", 11), ("H", 10), ("N", 2), ("O", 1)],
        'U' => &[("C", 3), ("H", 5), ("N", 1), ("O", 1), ("Se", 1)],
        'O' => &[("C", 12), ("H", 19), ("N", 3), ("O", 2)],
        _ => return None,
    };
    Some(comp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abundances_sum_to_one() {
        for element in ELEMENTS {
            let total: f64 = element.isotopes.iter().map(|i| i.abundance).sum();
            assert!(
                (total - 1.0).abs() < 1e-3,
                "{} abundances sum to {}",
                element.symbol,
                total
            );
        }
    }

    #[test]
    fn test_offsets_are_increasing() {
        for element in ELEMENTS {
            assert_eq!(element.isotopes[0].offset, 0);
            for pair in element.isotopes.windows(2) {
                assert!(pair[0].offset < pair[1].offset, "{}", element.symbol);
            }
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(element("Cl").map(|e| e.isotopes.len()), Some(2));
        assert!(element("Xx").is_none());
        assert!(residue_composition('K').is_some());
        assert!(residue_composition('B').is_none());
    }
}
