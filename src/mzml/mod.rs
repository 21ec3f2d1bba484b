//! # mzML Output
//!
//! Simulated runs are written as mzML 1.1, the XML-based HUPO-PSI standard
//! for mass spectrometry data, and can be read back for inspection.
//!
//! ## Document layout
//!
//! ```text
//! mzML
//! ├── cvList (MS, UO)
//! ├── fileDescription / softwareList / instrumentConfigurationList
//! ├── dataProcessingList
//! └── run
//!     ├── spectrumList count=N
//!     │   └── spectrum*  (MS1 survey, MSn fragment with precursorList)
//!     │       └── binaryDataArrayList (m/z, intensity: 64-bit, zlib, base64)
//!     └── chromatogramList
//!         └── chromatogram "TIC"
//! ```
//!
//! The writer is incremental: scan groups can be streamed into it straight
//! from the generator through [`crate::simulation::ScanSink`].

mod binary;
mod cv;
mod reader;
mod writer;

pub use binary::{BinaryDecodeError, BinaryEncoding, CompressionType};
pub use cv::{ms_terms, CvTerm};
pub use reader::{MzMLError, MzMLReader, SpectrumIterator};
pub use writer::{write_mzml, MzMLWriter, WriterError, WriterSettings};
