//! Pull-based mzML reader
//!
//! Reads spectra back into [`Scan`]s and chromatograms into [`Chromatogram`]s.
//! Only the terms the writer emits are interpreted; everything else is
//! skipped. Spectra must be consumed before chromatograms, which follow them
//! in the document.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::binary::{self, BinaryDecodeError, BinaryEncoding, CompressionType};
use super::cv::{accessions, time_unit_from_accession};
use crate::chromatogram::{Chromatogram, ChromatogramError, ChromatogramKind};
use crate::params::TimeUnit;
use crate::scan::{Precursor, Scan};

/// Errors that can occur during mzML parsing
#[derive(Debug, thiserror::Error)]
pub enum MzMLError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Binary decode error: {0}")]
    BinaryError(#[from] BinaryDecodeError),

    #[error("Invalid chromatogram: {0}")]
    Chromatogram(#[from] ChromatogramError),

    #[error("Invalid mzML structure: {0}")]
    InvalidStructure(String),

    #[error("UTF-8 encoding error: {0}")]
    Utf8Error(#[from] std::str::Utf8Error),
}

/// The parts of a cvParam the reader looks at
#[derive(Debug, Default)]
struct CvParam {
    accession: String,
    value: Option<String>,
    unit_accession: Option<String>,
}

impl CvParam {
    fn value_as_f64(&self) -> Option<f64> {
        self.value.as_ref()?.parse().ok()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum ArrayKind {
    #[default]
    Unknown,
    Mz,
    Intensity,
    Time,
}

#[derive(Debug, Default)]
struct BinaryArrayContext {
    encoding: BinaryEncoding,
    compression: CompressionType,
    kind: ArrayKind,
    base64_data: String,
}

impl BinaryArrayContext {
    fn apply(&mut self, cv: &CvParam) {
        if let Some(encoding) = BinaryEncoding::from_cv_accession(&cv.accession) {
            self.encoding = encoding;
        } else if let Some(compression) = CompressionType::from_cv_accession(&cv.accession) {
            self.compression = compression;
        } else {
            match cv.accession.as_str() {
                accessions::MZ_ARRAY => self.kind = ArrayKind::Mz,
                accessions::INTENSITY_ARRAY => self.kind = ArrayKind::Intensity,
                accessions::TIME_ARRAY => self.kind = ArrayKind::Time,
                _ => {}
            }
        }
    }

    fn decode(&self, expected_length: usize) -> Result<Vec<f64>, BinaryDecodeError> {
        binary::decode(
            &self.base64_data,
            self.encoding,
            self.compression,
            Some(expected_length),
        )
    }
}

/// Streaming reader for mzML files
pub struct MzMLReader<R: BufRead> {
    reader: Reader<R>,
    in_spectrum_list: bool,
    spectra_done: bool,
    spectrum_count: Option<usize>,
    chromatogram_count: Option<usize>,
    time_unit: Option<TimeUnit>,
    isolation_window_width: Option<f64>,
}

impl MzMLReader<BufReader<File>> {
    /// Open an mzML file for streaming
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MzMLError> {
        let file = File::open(path.as_ref())?;
        Ok(Self::new(BufReader::with_capacity(64 * 1024, file)))
    }
}

impl<R: BufRead> MzMLReader<R> {
    pub fn new(reader: R) -> Self {
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.config_mut().trim_text(true);
        Self {
            reader: xml_reader,
            in_spectrum_list: false,
            spectra_done: false,
            spectrum_count: None,
            chromatogram_count: None,
            time_unit: None,
            isolation_window_width: None,
        }
    }

    /// Declared `spectrumList` count; reads up to the list if necessary
    pub fn spectrum_count(&mut self) -> Result<Option<usize>, MzMLError> {
        self.seek_spectrum_list()?;
        Ok(self.spectrum_count)
    }

    /// Declared `chromatogramList` count, known once the list was reached
    pub fn chromatogram_count(&self) -> Option<usize> {
        self.chromatogram_count
    }

    /// Time unit of the last scan start time read
    pub fn time_unit(&self) -> TimeUnit {
        self.time_unit.unwrap_or_default()
    }

    /// Isolation window offset of the last precursor read
    pub fn isolation_window_width(&self) -> Option<f64> {
        self.isolation_window_width
    }

    fn seek_spectrum_list(&mut self) -> Result<(), MzMLError> {
        if self.in_spectrum_list || self.spectra_done {
            return Ok(());
        }
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"spectrumList" => {
                        self.in_spectrum_list = true;
                        self.spectrum_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                        break;
                    }
                    b"chromatogramList" => {
                        self.spectra_done = true;
                        self.chromatogram_count =
                            get_attribute(e, "count")?.and_then(|s| s.parse().ok());
                        break;
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    self.spectra_done = true;
                    break;
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
        Ok(())
    }

    /// Read the next spectrum from the stream
    pub fn next_spectrum(&mut self) -> Result<Option<Scan>, MzMLError> {
        self.seek_spectrum_list()?;
        if !self.in_spectrum_list {
            return Ok(None);
        }

        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    if e.name().as_ref() == b"spectrum" {
                        return self.parse_spectrum(&e).map(Some);
                    }
                }
                Ok(Event::End(ref e)) => {
                    if e.name().as_ref() == b"spectrumList" {
                        self.in_spectrum_list = false;
                        self.spectra_done = true;
                        return Ok(None);
                    }
                }
                Ok(Event::Eof) => {
                    self.spectra_done = true;
                    return Ok(None);
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Read the next chromatogram, skipping any unread spectra
    pub fn next_chromatogram(&mut self) -> Result<Option<Chromatogram>, MzMLError> {
        let mut buf = Vec::new();
        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"chromatogramList" => {
                        self.chromatogram_count =
                            get_attribute(&e, "count")?.and_then(|s| s.parse().ok());
                    }
                    b"chromatogram" => {
                        return self.parse_chromatogram(&e).map(Some);
                    }
                    _ => {}
                },
                Ok(Event::Eof) => return Ok(None),
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }
    }

    /// Iterate over all remaining spectra
    pub fn spectra(&mut self) -> SpectrumIterator<'_, R> {
        SpectrumIterator { reader: self }
    }

    fn parse_spectrum(&mut self, start: &BytesStart) -> Result<Scan, MzMLError> {
        let native_id = get_attribute(start, "id")?.unwrap_or_default();
        let id = scan_number(&native_id).ok_or_else(|| {
            MzMLError::InvalidStructure(format!("spectrum id without scan number: {}", native_id))
        })?;
        let length: usize = get_attribute(start, "defaultArrayLength")?
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let mut scan = Scan::new_survey(id, 0.0);
        let mut precursor: Option<Precursor> = None;
        let mut in_precursor = false;
        let mut in_scan = false;
        let mut current_array: Option<BinaryArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.name().as_ref() {
                    b"scan" => in_scan = true,
                    b"precursor" => {
                        in_precursor = true;
                        let parent = get_attribute(e, "spectrumRef")?
                            .as_deref()
                            .and_then(scan_number)
                            .unwrap_or(0);
                        precursor = Some(Precursor {
                            mz: 0.0,
                            intensity: 0.0,
                            charge: 0,
                            scan_id: parent,
                        });
                    }
                    b"binaryDataArray" => current_array = Some(BinaryArrayContext::default()),
                    _ => {}
                },
                Ok(Event::Empty(ref e)) if e.name().as_ref() == b"cvParam" => {
                    let cv = parse_cv_param(e)?;
                    if let Some(ctx) = current_array.as_mut() {
                        ctx.apply(&cv);
                    } else if in_precursor {
                        if let Some(p) = precursor.as_mut() {
                            self.apply_precursor_cv_param(p, &cv);
                        }
                    } else if in_scan {
                        if cv.accession == accessions::SCAN_START_TIME {
                            scan.retention_time = cv.value_as_f64().unwrap_or(0.0);
                            self.time_unit =
                                Some(time_unit_from_accession(cv.unit_accession.as_deref()));
                        }
                    } else if cv.accession == accessions::MS_LEVEL {
                        scan.ms_level = cv
                            .value
                            .as_deref()
                            .and_then(|v| v.parse().ok())
                            .unwrap_or(1);
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(ctx) = current_array.as_mut() {
                        ctx.base64_data = t.unescape()?.into_owned();
                    }
                }
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"spectrum" => break,
                    b"scan" => in_scan = false,
                    b"precursor" => in_precursor = false,
                    b"binaryDataArray" => {
                        if let Some(ctx) = current_array.take() {
                            let values = ctx.decode(length)?;
                            match ctx.kind {
                                ArrayKind::Mz => scan.mz = values,
                                ArrayKind::Intensity => scan.intensity = values,
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(
                        "Unexpected EOF in spectrum".to_string(),
                    ));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        if scan.mz.len() != scan.intensity.len() {
            return Err(MzMLError::InvalidStructure(format!(
                "spectrum {} has {} m/z and {} intensity values",
                id,
                scan.mz.len(),
                scan.intensity.len()
            )));
        }
        if scan.ms_level > 1 {
            scan.precursor = precursor;
        }
        Ok(scan)
    }

    fn apply_precursor_cv_param(&mut self, precursor: &mut Precursor, cv: &CvParam) {
        match cv.accession.as_str() {
            accessions::SELECTED_ION_MZ => precursor.mz = cv.value_as_f64().unwrap_or(0.0),
            accessions::PEAK_INTENSITY => precursor.intensity = cv.value_as_f64().unwrap_or(0.0),
            accessions::CHARGE_STATE => {
                precursor.charge = cv
                    .value
                    .as_deref()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0)
            }
            accessions::ISOLATION_WINDOW_LOWER_OFFSET => {
                self.isolation_window_width = cv.value_as_f64();
            }
            _ => {}
        }
    }

    fn parse_chromatogram(&mut self, start: &BytesStart) -> Result<Chromatogram, MzMLError> {
        let id = get_attribute(start, "id")?.unwrap_or_default();
        let length: usize = get_attribute(start, "defaultArrayLength")?
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);

        let mut time = Vec::new();
        let mut intensity = Vec::new();
        let mut current_array: Option<BinaryArrayContext> = None;
        let mut buf = Vec::new();

        loop {
            match self.reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    if e.name().as_ref() == b"binaryDataArray" {
                        current_array = Some(BinaryArrayContext::default());
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    if e.name().as_ref() == b"cvParam" {
                        let cv = parse_cv_param(e)?;
                        if let Some(ctx) = current_array.as_mut() {
                            ctx.apply(&cv);
                        }
                    }
                }
                Ok(Event::Text(ref t)) => {
                    if let Some(ctx) = current_array.as_mut() {
                        ctx.base64_data = t.unescape()?.into_owned();
                    }
                }
                Ok(Event::End(ref e)) => match e.name().as_ref() {
                    b"chromatogram" => break,
                    b"binaryDataArray" => {
                        if let Some(ctx) = current_array.take() {
                            let values = ctx.decode(length)?;
                            match ctx.kind {
                                ArrayKind::Time => time = values,
                                ArrayKind::Intensity => intensity = values,
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::Eof) => {
                    return Err(MzMLError::InvalidStructure(
                        "Unexpected EOF in chromatogram".to_string(),
                    ));
                }
                Err(e) => return Err(MzMLError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(Chromatogram::new(
            id,
            ChromatogramKind::TotalIonCurrent,
            time,
            intensity,
        )?)
    }
}

/// Iterator over spectra
pub struct SpectrumIterator<'a, R: BufRead> {
    reader: &'a mut MzMLReader<R>,
}

impl<R: BufRead> Iterator for SpectrumIterator<'_, R> {
    type Item = Result<Scan, MzMLError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_spectrum().transpose()
    }
}

/// Scan number from a native id such as `controllerType=0 controllerNumber=1 scan=12`
fn scan_number(native_id: &str) -> Option<u64> {
    native_id
        .split_whitespace()
        .find_map(|part| part.strip_prefix("scan="))
        .and_then(|n| n.parse().ok())
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, MzMLError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MzMLError::XmlError(quick_xml::Error::from(e)))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)?.to_string();
            return Ok(Some(value));
        }
    }
    Ok(None)
}

fn parse_cv_param(e: &BytesStart) -> Result<CvParam, MzMLError> {
    Ok(CvParam {
        accession: get_attribute(e, "accession")?.unwrap_or_default(),
        value: get_attribute(e, "value")?.filter(|v| !v.is_empty()),
        unit_accession: get_attribute(e, "unitAccession")?,
    })
}
