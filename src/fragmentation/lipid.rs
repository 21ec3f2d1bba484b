//! Lipid fragmentation through an external transition-list generator.
//!
//! The generator is invoked once for all lipids of a run as
//! `<program> [args..] transitionlist <input> <output>`; the input lists one
//! lipid name per line and the output is a CSV transition list with at least
//! the `PrecursorName` and `ProductMz` columns.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use super::{FragmentError, FragmentPeaks, Fragmentor, MissingFragmentPolicy};

/// Intensity assigned to every product ion
pub const TRANSITION_INTENSITY: f64 = 100.0;

const PRECURSOR_COLUMN: &str = "PrecursorName";
const PRODUCT_MZ_COLUMN: &str = "ProductMz";

/// How to launch the transition-list generator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LipidTool {
    pub program: PathBuf,
    /// Leading arguments, e.g. the assembly when launched through a runtime
    pub args: Vec<String>,
}

/// Fragmentor backed by a precomputed transition list
#[derive(Debug, Clone)]
pub struct LipidFragmentor {
    transitions: HashMap<String, Vec<f64>>,
    policy: MissingFragmentPolicy,
}

impl LipidFragmentor {
    /// Run `tool` for `lipids` and cache the resulting product ions.
    pub fn new(
        tool: LipidTool,
        lipids: &[&str],
        policy: MissingFragmentPolicy,
    ) -> Result<Self, FragmentError> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("lipids.txt");
        let output = dir.path().join("transitions.csv");

        let mut listing = String::new();
        for lipid in lipids {
            listing.push_str(lipid);
            listing.push('\n');
        }
        fs::write(&input, listing)?;

        info!(
            "Running {} for {} lipids",
            tool.program.display(),
            lipids.len()
        );
        let result = Command::new(&tool.program)
            .args(&tool.args)
            .arg("transitionlist")
            .arg(&input)
            .arg(&output)
            .output()?;
        if !result.status.success() {
            return Err(FragmentError::ToolFailed {
                tool: tool.program.display().to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let transitions = parse_transition_list(&fs::read(&output)?)?;
        debug!("Transition list covers {} lipids", transitions.len());
        Ok(Self {
            transitions,
            policy,
        })
    }

    /// Build directly from a transition-list CSV
    pub fn from_transition_list(
        csv_bytes: &[u8],
        policy: MissingFragmentPolicy,
    ) -> Result<Self, FragmentError> {
        Ok(Self {
            transitions: parse_transition_list(csv_bytes)?,
            policy,
        })
    }
}

fn parse_transition_list(csv_bytes: &[u8]) -> Result<HashMap<String, Vec<f64>>, FragmentError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(csv_bytes);
    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| FragmentError::MissingColumn(name.to_string()))
    };
    let precursor_idx = column(PRECURSOR_COLUMN)?;
    let product_idx = column(PRODUCT_MZ_COLUMN)?;

    let mut transitions: HashMap<String, Vec<f64>> = HashMap::new();
    for record in reader.records() {
        let record = record?;
        let (Some(name), Some(mz)) = (record.get(precursor_idx), record.get(product_idx)) else {
            continue;
        };
        let Ok(mz) = mz.parse::<f64>() else {
            debug!("Ignoring unparseable product m/z {:?} for {}", mz, name);
            continue;
        };
        transitions.entry(name.to_string()).or_default().push(mz);
    }
    Ok(transitions)
}

impl Fragmentor for LipidFragmentor {
    fn lookup(&self, name: &str) -> Option<FragmentPeaks> {
        self.transitions
            .get(name)
            .map(|mzs| mzs.iter().map(|mz| (*mz, TRANSITION_INTENSITY)).collect())
    }

    fn policy(&self) -> MissingFragmentPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSITIONS: &str = "\
PrecursorName,PrecursorMz,ProductName,ProductMz,ProductCharge
PC 34:1,760.5851,HG(PC),184.0733,1
PC 34:1,760.5851,FA 16:0,478.3292,1
PE 36:2,744.5538,HG(PE),603.5347,1
";

    #[test]
    fn test_parse_transition_list() {
        let f = LipidFragmentor::from_transition_list(
            TRANSITIONS.as_bytes(),
            MissingFragmentPolicy::Strict,
        )
        .unwrap();
        let pc = f.fragment_one("PC 34:1").unwrap();
        assert_eq!(pc, vec![(184.0733, 100.0), (478.3292, 100.0)]);
        assert!(f.fragment_one("PS 40:6").is_err());
    }

    #[test]
    fn test_missing_column() {
        let err = LipidFragmentor::from_transition_list(
            b"Name,Mz\nPC 34:1,184.07\n",
            MissingFragmentPolicy::Strict,
        )
        .unwrap_err();
        assert!(matches!(err, FragmentError::MissingColumn(c) if c == "PrecursorName"));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_external_tool() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake_tool.sh");
        fs::write(
            &script,
            format!(
                "test \"$1\" = transitionlist || exit 3\ngrep -q 'PC 34:1' \"$2\" || exit 4\ncat > \"$3\" <<'EOF'\n{}EOF\n",
                TRANSITIONS
            ),
        )
        .unwrap();
        let tool = LipidTool {
            program: PathBuf::from("sh"),
            args: vec![script.display().to_string()],
        };
        let f = LipidFragmentor::new(tool, &["PC 34:1", "PE 36:2"], MissingFragmentPolicy::Strict)
            .unwrap();
        assert_eq!(f.fragment_one("PE 36:2").unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_tool_failure_is_reported() {
        let tool = LipidTool {
            program: PathBuf::from("sh"),
            args: vec!["-c".to_string(), "echo boom >&2; exit 1".to_string()],
        };
        let err = LipidFragmentor::new(tool, &["PC 34:1"], MissingFragmentPolicy::Strict).unwrap_err();
        match err {
            FragmentError::ToolFailed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected error {:?}", other),
        }
    }
}
