//! Knowledge-base driven fragmentation of (modified) nucleosides.
//!
//! Each nucleoside maps to a list of fragment formulas, typically the base
//! after neutral loss of the ribose plus secondary losses. Fragments are
//! converted to singly protonated m/z once, at construction.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{FragmentError, FragmentPeaks, Fragmentor, MissingFragmentPolicy};
use crate::isotopes::{mz_from_mass, EnvelopeSource};

/// Intensity assigned to every knowledge-base fragment
pub const FRAGMENT_INTENSITY: f64 = 100.0;

static BUILTIN_KB: &str = include_str!("../../data/nucleoside_fragments.json");

/// One fragment of a knowledge-base entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseFragment {
    pub name: String,
    pub formula: String,
    /// Only observed with beam-type collisional dissociation
    #[serde(default)]
    pub hcd: bool,
}

/// Fragments and literature of one nucleoside
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseEntry {
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub fragments: Vec<KnowledgeBaseFragment>,
}

/// Nucleoside name → fragment formulas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase {
    pub entries: BTreeMap<String, KnowledgeBaseEntry>,
}

impl KnowledgeBase {
    /// Knowledge base shipped with the crate
    pub fn builtin() -> Result<Self, FragmentError> {
        Ok(serde_json::from_str(BUILTIN_KB)?)
    }

    /// Load a knowledge base from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, FragmentError> {
        let content = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Number of nucleosides
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lookup-table fragmentor for nucleosides
#[derive(Debug, Clone)]
pub struct NucleosideFragmentor {
    fragments: HashMap<String, Vec<f64>>,
    policy: MissingFragmentPolicy,
}

impl NucleosideFragmentor {
    /// Precompute fragment m/z values from `kb`.
    ///
    /// Fragment formulas `source` cannot interpret are logged and left out.
    pub fn new(
        kb: &KnowledgeBase,
        source: &dyn EnvelopeSource,
        include_hcd: bool,
        policy: MissingFragmentPolicy,
    ) -> Self {
        let mut fragments = HashMap::with_capacity(kb.len());
        for (name, entry) in &kb.entries {
            let mut mzs = Vec::with_capacity(entry.fragments.len());
            for fragment in &entry.fragments {
                if fragment.hcd && !include_hcd {
                    continue;
                }
                match source.monoisotopic_mass(&fragment.formula) {
                    Ok(mass) => mzs.push(mz_from_mass(mass, 1)),
                    Err(e) => warn!(
                        "Skipping fragment {:?} of {}: {}",
                        fragment.name, name, e
                    ),
                }
            }
            fragments.insert(name.clone(), mzs);
        }
        info!("Nucleoside fragmentor ready with {} entries", fragments.len());
        Self { fragments, policy }
    }

    /// Fragmentor over the built-in knowledge base
    pub fn builtin(source: &dyn EnvelopeSource) -> Result<Self, FragmentError> {
        Ok(Self::new(
            &KnowledgeBase::builtin()?,
            source,
            true,
            MissingFragmentPolicy::default(),
        ))
    }

    /// Change the missing-fragment policy
    pub fn with_policy(mut self, policy: MissingFragmentPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fragment m/z values of a nucleoside
    pub fn fragment_mzs(&self, name: &str) -> Option<&[f64]> {
        self.fragments.get(name).map(Vec::as_slice)
    }
}

impl Fragmentor for NucleosideFragmentor {
    fn lookup(&self, name: &str) -> Option<FragmentPeaks> {
        self.fragments
            .get(name)
            .map(|mzs| mzs.iter().map(|mz| (*mz, FRAGMENT_INTENSITY)).collect())
    }

    fn policy(&self) -> MissingFragmentPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isotopes::NaturalAbundance;

    fn builtin() -> NucleosideFragmentor {
        NucleosideFragmentor::builtin(&NaturalAbundance::default()).unwrap()
    }

    #[test]
    fn test_builtin_kb_loads() {
        let kb = KnowledgeBase::builtin().unwrap();
        assert_eq!(kb.len(), 59);
        assert!(kb.entries.contains_key("pseudouridine"));
    }

    #[test]
    fn test_adenosine_fragments() {
        let peaks = builtin().fragment_one("adenosine").unwrap();
        let mzs: Vec<f64> = peaks.iter().map(|(mz, _)| *mz).collect();
        assert_eq!(mzs.len(), 2);
        assert!((mzs[0] - 136.0617716478).abs() < 1e-6);
        assert!((mzs[1] - 119.03522254717).abs() < 1e-6);
        assert!(peaks.iter().all(|(_, i)| *i == FRAGMENT_INTENSITY));
    }

    #[test]
    fn test_inosine_fragment() {
        let peaks = builtin().fragment_one("inosine").unwrap();
        assert_eq!(peaks.len(), 1);
        assert!((peaks[0].0 - 137.0457872316).abs() < 1e-6);
    }

    #[test]
    fn test_chimeric_fragmentation_concatenates() {
        let peaks = builtin().fragment(&["adenosine", "inosine"]).unwrap();
        assert_eq!(peaks.len(), 3);
    }

    #[test]
    fn test_unknown_nucleoside() {
        let fragmentor = builtin();
        assert!(fragmentor.fragment_one("caffeine").unwrap().is_empty());
        let strict = fragmentor.with_policy(MissingFragmentPolicy::Strict);
        assert!(strict.fragment_one("caffeine").is_err());
    }

    #[test]
    fn test_hcd_filter() {
        let kb = KnowledgeBase::builtin().unwrap();
        let source = NaturalAbundance::default();
        let all = NucleosideFragmentor::new(&kb, &source, true, MissingFragmentPolicy::Strict);
        let cid = NucleosideFragmentor::new(&kb, &source, false, MissingFragmentPolicy::Strict);
        assert_eq!(all.fragment_mzs("uridine").map(|m| m.len()), Some(2));
        assert_eq!(cid.fragment_mzs("uridine").map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_custom_kb_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.json");
        std::fs::write(
            &path,
            r#"{"guanine": {"fragments": [{"name": "guanine -NH3", "formula": "C(5)H(2)N(4)O(1)"}, {"name": "broken", "formula": "Zq(1)"}]}}"#,
        )
        .unwrap();
        let kb = KnowledgeBase::from_file(&path).unwrap();
        let f = NucleosideFragmentor::new(&kb, &NaturalAbundance::default(), true, MissingFragmentPolicy::Strict);
        assert_eq!(f.fragment_one("guanine").unwrap().len(), 1);
    }
}
