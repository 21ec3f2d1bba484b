//! # Fragmentation
//!
//! A [`Fragmentor`] turns one or more molecule names into fragment
//! `(m/z, intensity)` pairs. Several names are fragmented together when a
//! precursor isolation window captures more than one species.
//!
//! | variant                 | source of fragments                          |
//! |-------------------------|----------------------------------------------|
//! | [`NucleosideFragmentor`]| knowledge base of fragment formulas          |
//! | [`PeptideFragmentor`]   | b/y ion ladders computed from the sequence   |
//! | [`LipidFragmentor`]     | external transition-list generator (CSV)     |
//! | [`StaticFragmentor`]    | fixed peak list, for tests and calibration   |
//!
//! Unknown molecules are handled according to [`MissingFragmentPolicy`].

mod lipid;
mod nucleoside;
mod peptide;

pub use lipid::{LipidFragmentor, LipidTool};
pub use nucleoside::{KnowledgeBase, KnowledgeBaseEntry, KnowledgeBaseFragment, NucleosideFragmentor};
pub use peptide::PeptideFragmentor;

use std::path::PathBuf;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::isotopes::{CompositionError, EnvelopeSource};

/// Fragment peaks as `(m/z, intensity)` pairs
pub type FragmentPeaks = Vec<(f64, f64)>;

/// Errors raised by fragmentors
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    #[error("No fragment data for {0:?}")]
    UnknownEntity(String),

    #[error("Invalid fragment knowledge base: {0}")]
    KnowledgeBase(#[from] serde_json::Error),

    #[error("Cannot compute fragment {fragment:?} of {name:?}: {source}")]
    Composition {
        name: String,
        fragment: String,
        #[source]
        source: CompositionError,
    },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Transition list tool {tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Transition list is missing column {0:?}")]
    MissingColumn(String),

    #[error("Invalid fragmentor configuration: {0}")]
    InvalidConfig(String),
}

/// What to do when a molecule has no fragment data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFragmentPolicy {
    /// Return an error
    Strict,
    /// Return no peaks
    #[default]
    Permissive,
}

/// Source of fragment spectra
pub trait Fragmentor: Send + Sync {
    /// Fragments of one molecule, `None` when the molecule is unknown
    fn lookup(&self, name: &str) -> Option<FragmentPeaks>;

    /// Policy for unknown molecules
    fn policy(&self) -> MissingFragmentPolicy;

    /// Fragments of one molecule, applying the missing-fragment policy
    fn fragment_one(&self, name: &str) -> Result<FragmentPeaks, FragmentError> {
        match self.lookup(name) {
            Some(peaks) => Ok(peaks),
            None => match self.policy() {
                MissingFragmentPolicy::Strict => Err(FragmentError::UnknownEntity(name.to_string())),
                MissingFragmentPolicy::Permissive => {
                    debug!("No fragments for {}, returning empty spectrum", name);
                    Ok(Vec::new())
                }
            },
        }
    }

    /// Concatenated fragments of all co-isolated molecules
    fn fragment(&self, names: &[&str]) -> Result<FragmentPeaks, FragmentError> {
        let mut peaks = Vec::new();
        for name in names {
            peaks.extend(self.fragment_one(name)?);
        }
        Ok(peaks)
    }
}

/// Same peaks for every molecule
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StaticFragmentor {
    pub peaks: FragmentPeaks,
}

impl StaticFragmentor {
    pub fn new(peaks: FragmentPeaks) -> Self {
        Self { peaks }
    }
}

impl Fragmentor for StaticFragmentor {
    fn lookup(&self, _name: &str) -> Option<FragmentPeaks> {
        Some(self.peaks.clone())
    }

    fn policy(&self) -> MissingFragmentPolicy {
        MissingFragmentPolicy::Permissive
    }
}

/// Fragmentor variant chosen in configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentorKind {
    #[default]
    Nucleoside,
    Peptide,
    Lipid,
    Static,
}

/// Serializable fragmentor settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FragmentorConfig {
    pub kind: FragmentorKind,
    pub policy: MissingFragmentPolicy,
    /// Nucleoside knowledge base JSON (built-in when absent)
    pub knowledge_base: Option<PathBuf>,
    /// Include fragments only observed with HCD (nucleoside)
    pub include_hcd: Option<bool>,
    /// Highest fragment charge (peptide)
    pub max_fragment_charge: Option<u8>,
    /// Transition-list generator executable (lipid)
    pub tool: Option<PathBuf>,
    /// Arguments placed before the subcommand (lipid)
    pub tool_args: Vec<String>,
    /// Fixed peaks (static)
    pub peaks: Vec<(f64, f64)>,
}

impl FragmentorConfig {
    /// Instantiate the configured fragmentor for `molecules`.
    pub fn build(
        &self,
        molecules: &[&str],
        source: &dyn EnvelopeSource,
    ) -> Result<Box<dyn Fragmentor>, FragmentError> {
        info!("Building {:?} fragmentor ({:?} policy)", self.kind, self.policy);
        let fragmentor: Box<dyn Fragmentor> = match self.kind {
            FragmentorKind::Nucleoside => {
                let kb = match &self.knowledge_base {
                    Some(path) => KnowledgeBase::from_file(path)?,
                    None => KnowledgeBase::builtin()?,
                };
                Box::new(NucleosideFragmentor::new(
                    &kb,
                    source,
                    self.include_hcd.unwrap_or(true),
                    self.policy,
                ))
            }
            FragmentorKind::Peptide => Box::new(PeptideFragmentor::new(
                self.max_fragment_charge.unwrap_or(1),
                self.policy,
            )),
            FragmentorKind::Lipid => {
                let program = self.tool.clone().ok_or_else(|| {
                    FragmentError::InvalidConfig("lipid fragmentor needs `tool`".to_string())
                })?;
                let tool = LipidTool {
                    program,
                    args: self.tool_args.clone(),
                };
                Box::new(LipidFragmentor::new(tool, molecules, self.policy)?)
            }
            FragmentorKind::Static => Box::new(StaticFragmentor::new(self.peaks.clone())),
        };
        Ok(fragmentor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isotopes::NaturalAbundance;

    struct OneEntry(MissingFragmentPolicy);

    impl Fragmentor for OneEntry {
        fn lookup(&self, name: &str) -> Option<FragmentPeaks> {
            (name == "known").then(|| vec![(100.0, 1.0)])
        }

        fn policy(&self) -> MissingFragmentPolicy {
            self.0
        }
    }

    #[test]
    fn test_policy_default_is_permissive() {
        assert_eq!(MissingFragmentPolicy::default(), MissingFragmentPolicy::Permissive);
    }

    #[test]
    fn test_strict_policy_raises() {
        let f = OneEntry(MissingFragmentPolicy::Strict);
        assert!(matches!(
            f.fragment_one("unknown"),
            Err(FragmentError::UnknownEntity(name)) if name == "unknown"
        ));
        assert!(f.fragment(&["known", "unknown"]).is_err());
    }

    #[test]
    fn test_permissive_policy_returns_empty() {
        let f = OneEntry(MissingFragmentPolicy::Permissive);
        assert!(f.fragment_one("unknown").unwrap().is_empty());
        assert_eq!(f.fragment(&["known", "unknown", "known"]).unwrap().len(), 2);
    }

    #[test]
    fn test_static_fragmentor() {
        let f = StaticFragmentor::new(vec![(200.0, 1e5)]);
        assert_eq!(f.fragment(&["a", "b"]).unwrap(), vec![(200.0, 1e5), (200.0, 1e5)]);
    }

    #[test]
    fn test_config_from_toml() {
        let config: FragmentorConfig = toml::from_str(
            r#"
            kind = "peptide"
            policy = "strict"
            max_fragment_charge = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.kind, FragmentorKind::Peptide);
        assert_eq!(config.policy, MissingFragmentPolicy::Strict);
        let f = config.build(&[], &NaturalAbundance::default()).unwrap();
        assert!(f.fragment_one("NOT A PEPTIDE").is_err());
    }

    #[test]
    fn test_lipid_config_requires_tool() {
        let config = FragmentorConfig {
            kind: FragmentorKind::Lipid,
            ..FragmentorConfig::default()
        };
        assert!(matches!(
            config.build(&["PC 34:1"], &NaturalAbundance::default()),
            Err(FragmentError::InvalidConfig(_))
        ));
    }
}
