use crate::elution::ShapeError;

/// Configuration errors raised before any scan is generated
#[derive(Debug, thiserror::Error)]
pub enum ParamsError {
    /// A required field was not provided
    #[error("Missing required field {field:?} for {owner}")]
    MissingField { owner: String, field: &'static str },

    /// A run parameter is outside its valid range
    #[error("Invalid run parameter {field}: {value} ({reason})")]
    InvalidRunParameter {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    /// A molecule descriptor holds an invalid value
    #[error("Invalid molecule {name:?}: {reason}")]
    InvalidMolecule { name: String, reason: String },

    /// The elution shape of a molecule could not be resolved
    #[error("Invalid elution shape for {name:?}: {source}")]
    Shape {
        name: String,
        #[source]
        source: ShapeError,
    },

    /// Two molecules share a trivial name
    #[error("Duplicate trivial name {0:?}")]
    DuplicateName(String),

    /// Malformed value in a molecule table
    #[error("Molecule table line {line}: {message}")]
    TableFormat { line: u64, message: String },

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
