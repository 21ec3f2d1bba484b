//! Incremental mzML writer
//!
//! Spectra are serialized as they arrive into an anonymous temporary file, so
//! the `spectrumList` count is exact when the document is assembled in
//! [`MzMLWriter::finish`]. Chromatograms are kept in memory until then.

use std::fs::File;
use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use log::{debug, info};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::binary::encode_f64_zlib;
use super::cv::{ms_terms, CvTerm};
use crate::chromatogram::Chromatogram;
use crate::params::{RunParameters, TimeUnit};
use crate::scan::{Scan, ScanGroup};
use crate::simulation::{ScanSink, SimulatedRun, SimulationError};

const BUFFER_SIZE: usize = 64 * 1024;
const INSTRUMENT_CONFIGURATION: &str = "IC1";
const SOFTWARE_ID: &str = "smiter";
const DATA_PROCESSING_ID: &str = "smiter_processing";

/// Errors raised while writing an mzML document
#[derive(Debug, thiserror::Error)]
pub enum WriterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Writer already finished")]
    Finished,
}

/// Document-level settings of a written run
#[derive(Debug, Clone)]
pub struct WriterSettings {
    /// `run` element id
    pub run_id: String,
    pub time_unit: TimeUnit,
    /// Isolation window half width reported for every precursor
    pub isolation_window_width: f64,
}

impl Default for WriterSettings {
    fn default() -> Self {
        Self {
            run_id: format!("smiter_{}", uuid::Uuid::new_v4().simple()),
            time_unit: TimeUnit::default(),
            isolation_window_width: crate::params::DEFAULT_ISOLATION_WINDOW_WIDTH,
        }
    }
}

impl WriterSettings {
    pub fn from_params(params: &RunParameters) -> Self {
        Self {
            time_unit: params.time_unit,
            isolation_window_width: params.isolation_window_width,
            ..Self::default()
        }
    }
}

fn spectrum_native_id(scan_id: u64) -> String {
    format!("controllerType=0 controllerNumber=1 scan={}", scan_id)
}

/// Thin wrapper over a quick-xml writer with CV helpers
struct XmlHandle<W: Write> {
    handle: Writer<W>,
}

impl<W: Write> XmlHandle<W> {
    fn new(inner: W) -> Self {
        Self {
            handle: Writer::new_with_indent(inner, b' ', 2),
        }
    }

    fn start(&mut self, elt: BytesStart) -> Result<(), WriterError> {
        self.handle.write_event(Event::Start(elt))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<(), WriterError> {
        self.handle.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, elt: BytesStart) -> Result<(), WriterError> {
        self.handle.write_event(Event::Empty(elt))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), WriterError> {
        self.handle.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn cv_param(&mut self, term: &CvTerm) -> Result<(), WriterError> {
        let mut elt = BytesStart::new("cvParam");
        elt.push_attribute(("cvRef", term.cv_ref()));
        elt.push_attribute(("accession", term.accession));
        elt.push_attribute(("name", term.name));
        elt.push_attribute(("value", term.value.as_deref().unwrap_or("")));
        if let (Some(accession), Some(name)) = (term.unit_accession, term.unit_name) {
            elt.push_attribute(("unitCvRef", term.unit_cv_ref().unwrap_or("UO")));
            elt.push_attribute(("unitAccession", accession));
            elt.push_attribute(("unitName", name));
        }
        self.empty(elt)
    }

    fn binary_array(&mut self, values: &[f64], kind: CvTerm) -> Result<(), WriterError> {
        let encoded = encode_f64_zlib(values)?;
        let mut elt = BytesStart::new("binaryDataArray");
        elt.push_attribute(("encodedLength", encoded.len().to_string().as_str()));
        self.start(elt)?;
        self.cv_param(&ms_terms::float_64())?;
        self.cv_param(&ms_terms::zlib_compression())?;
        self.cv_param(&kind)?;
        self.start(BytesStart::new("binary"))?;
        self.text(&encoded)?;
        self.end("binary")?;
        self.end("binaryDataArray")
    }
}

/// Writes simulated scans as an mzML 1.1 document
pub struct MzMLWriter<W: Write> {
    output: Option<W>,
    spectra: XmlHandle<BufWriter<File>>,
    chromatograms: Vec<Chromatogram>,
    spectrum_count: usize,
    settings: WriterSettings,
}

impl MzMLWriter<BufWriter<File>> {
    /// Create `path` and write a run with the given parameters into it
    pub fn create<P: AsRef<Path>>(path: P, params: &RunParameters) -> Result<Self, WriterError> {
        let file = File::create(path.as_ref())?;
        info!("Writing mzML to {}", path.as_ref().display());
        Self::new(
            BufWriter::with_capacity(BUFFER_SIZE, file),
            WriterSettings::from_params(params),
        )
    }
}

impl<W: Write> MzMLWriter<W> {
    pub fn new(output: W, settings: WriterSettings) -> Result<Self, WriterError> {
        let buffer = tempfile::tempfile()?;
        Ok(Self {
            output: Some(output),
            spectra: XmlHandle::new(BufWriter::with_capacity(BUFFER_SIZE, buffer)),
            chromatograms: Vec::new(),
            spectrum_count: 0,
            settings,
        })
    }

    /// Spectra written so far
    pub fn spectrum_count(&self) -> usize {
        self.spectrum_count
    }

    pub fn settings(&self) -> &WriterSettings {
        &self.settings
    }

    /// Write a survey scan followed by its fragment scans
    pub fn write_group(&mut self, group: &ScanGroup) -> Result<(), WriterError> {
        for scan in group.iter() {
            self.write_scan(scan)?;
        }
        Ok(())
    }

    /// Write one spectrum
    pub fn write_scan(&mut self, scan: &Scan) -> Result<(), WriterError> {
        if self.output.is_none() {
            return Err(WriterError::Finished);
        }
        let index = self.spectrum_count;
        let time_unit = self.settings.time_unit;
        let isolation = self.settings.isolation_window_width;
        let stats = scan.statistics();
        let xml = &mut self.spectra;

        let mut spectrum = BytesStart::new("spectrum");
        spectrum.push_attribute(("index", index.to_string().as_str()));
        spectrum.push_attribute(("id", spectrum_native_id(scan.id).as_str()));
        spectrum.push_attribute(("defaultArrayLength", scan.len().to_string().as_str()));
        xml.start(spectrum)?;

        if scan.is_survey() {
            xml.cv_param(&ms_terms::ms1_spectrum())?;
        } else {
            xml.cv_param(&ms_terms::msn_spectrum())?;
        }
        xml.cv_param(&ms_terms::ms_level(scan.ms_level))?;
        xml.cv_param(&ms_terms::centroid_spectrum())?;
        xml.cv_param(&ms_terms::positive_scan())?;
        xml.cv_param(&ms_terms::total_ion_current(stats.total_ion_current))?;
        xml.cv_param(&ms_terms::base_peak_mz(stats.base_peak_mz))?;
        xml.cv_param(&ms_terms::base_peak_intensity(stats.base_peak_intensity))?;
        xml.cv_param(&ms_terms::lowest_observed_mz(stats.lowest_mz))?;
        xml.cv_param(&ms_terms::highest_observed_mz(stats.highest_mz))?;

        let mut scan_list = BytesStart::new("scanList");
        scan_list.push_attribute(("count", "1"));
        xml.start(scan_list)?;
        xml.cv_param(&ms_terms::no_combination())?;
        let mut scan_elt = BytesStart::new("scan");
        scan_elt.push_attribute(("instrumentConfigurationRef", INSTRUMENT_CONFIGURATION));
        xml.start(scan_elt)?;
        xml.cv_param(&ms_terms::scan_start_time(scan.retention_time, time_unit))?;
        xml.end("scan")?;
        xml.end("scanList")?;

        if let Some(precursor) = &scan.precursor {
            let mut list = BytesStart::new("precursorList");
            list.push_attribute(("count", "1"));
            xml.start(list)?;
            let mut elt = BytesStart::new("precursor");
            elt.push_attribute(("spectrumRef", spectrum_native_id(precursor.scan_id).as_str()));
            xml.start(elt)?;

            xml.start(BytesStart::new("isolationWindow"))?;
            xml.cv_param(&ms_terms::isolation_window_target_mz(precursor.mz))?;
            xml.cv_param(&ms_terms::isolation_window_lower_offset(isolation))?;
            xml.cv_param(&ms_terms::isolation_window_upper_offset(isolation))?;
            xml.end("isolationWindow")?;

            let mut ions = BytesStart::new("selectedIonList");
            ions.push_attribute(("count", "1"));
            xml.start(ions)?;
            xml.start(BytesStart::new("selectedIon"))?;
            xml.cv_param(&ms_terms::selected_ion_mz(precursor.mz))?;
            xml.cv_param(&ms_terms::charge_state(precursor.charge))?;
            xml.cv_param(&ms_terms::peak_intensity(precursor.intensity))?;
            xml.end("selectedIon")?;
            xml.end("selectedIonList")?;

            xml.start(BytesStart::new("activation"))?;
            xml.cv_param(&ms_terms::cid())?;
            xml.end("activation")?;

            xml.end("precursor")?;
            xml.end("precursorList")?;
        }

        let mut arrays = BytesStart::new("binaryDataArrayList");
        arrays.push_attribute(("count", "2"));
        xml.start(arrays)?;
        xml.binary_array(&scan.mz, ms_terms::mz_array())?;
        xml.binary_array(&scan.intensity, ms_terms::intensity_array())?;
        xml.end("binaryDataArrayList")?;
        xml.end("spectrum")?;

        self.spectrum_count += 1;
        Ok(())
    }

    /// Queue a chromatogram; chromatograms follow the spectra in the document
    pub fn write_chromatogram(&mut self, chromatogram: &Chromatogram) -> Result<(), WriterError> {
        if self.output.is_none() {
            return Err(WriterError::Finished);
        }
        self.chromatograms.push(chromatogram.clone());
        Ok(())
    }

    /// Assemble the document and hand back the output sink
    pub fn finish(self) -> Result<W, WriterError> {
        let MzMLWriter {
            output,
            spectra,
            chromatograms,
            spectrum_count,
            settings,
        } = self;
        let output = output.ok_or(WriterError::Finished)?;

        let mut buffer = spectra
            .handle
            .into_inner()
            .into_inner()
            .map_err(|e| e.into_error())?;
        buffer.seek(SeekFrom::Start(0))?;

        let mut xml = XmlHandle::new(output);
        Self::write_header(&mut xml, &settings)?;

        let mut run = BytesStart::new("run");
        run.push_attribute(("id", settings.run_id.as_str()));
        run.push_attribute(("defaultInstrumentConfigurationRef", INSTRUMENT_CONFIGURATION));
        let started = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        run.push_attribute(("startTimeStamp", started.as_str()));
        xml.start(run)?;

        let mut list = BytesStart::new("spectrumList");
        list.push_attribute(("count", spectrum_count.to_string().as_str()));
        list.push_attribute(("defaultDataProcessingRef", DATA_PROCESSING_ID));
        xml.start(list)?;
        io::copy(&mut buffer, xml.handle.get_mut())?;
        xml.end("spectrumList")?;

        if !chromatograms.is_empty() {
            let mut list = BytesStart::new("chromatogramList");
            list.push_attribute(("count", chromatograms.len().to_string().as_str()));
            list.push_attribute(("defaultDataProcessingRef", DATA_PROCESSING_ID));
            xml.start(list)?;
            for (index, chromatogram) in chromatograms.iter().enumerate() {
                Self::write_chromatogram_element(&mut xml, index, chromatogram, settings.time_unit)?;
            }
            xml.end("chromatogramList")?;
        }

        xml.end("run")?;
        xml.end("mzML")?;

        let mut output = xml.handle.into_inner();
        output.flush()?;
        debug!(
            "Finished mzML with {} spectra and {} chromatograms",
            spectrum_count,
            chromatograms.len()
        );
        Ok(output)
    }

    fn write_header(xml: &mut XmlHandle<W>, settings: &WriterSettings) -> Result<(), WriterError> {
        xml.handle
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut mzml = BytesStart::new("mzML");
        mzml.push_attribute(("xmlns", "http://psi.hupo.org/ms/mzml"));
        mzml.push_attribute(("version", "1.1.0"));
        mzml.push_attribute(("id", settings.run_id.as_str()));
        xml.start(mzml)?;

        let mut cv_list = BytesStart::new("cvList");
        cv_list.push_attribute(("count", "2"));
        xml.start(cv_list)?;
        let mut ms = BytesStart::new("cv");
        ms.push_attribute(("id", "MS"));
        ms.push_attribute(("fullName", "PSI-MS"));
        ms.push_attribute((
            "URI",
            "https://raw.githubusercontent.com/HUPO-PSI/psi-ms-CV/master/psi-ms.obo",
        ));
        xml.empty(ms)?;
        let mut uo = BytesStart::new("cv");
        uo.push_attribute(("id", "UO"));
        uo.push_attribute(("fullName", "UNIT-ONTOLOGY"));
        uo.push_attribute((
            "URI",
            "http://ontologies.berkeleybop.org/uo.obo",
        ));
        xml.empty(uo)?;
        xml.end("cvList")?;

        xml.start(BytesStart::new("fileDescription"))?;
        xml.start(BytesStart::new("fileContent"))?;
        xml.cv_param(&ms_terms::ms1_spectrum())?;
        xml.cv_param(&ms_terms::msn_spectrum())?;
        xml.end("fileContent")?;
        xml.end("fileDescription")?;

        let mut software_list = BytesStart::new("softwareList");
        software_list.push_attribute(("count", "1"));
        xml.start(software_list)?;
        let mut software = BytesStart::new("software");
        software.push_attribute(("id", SOFTWARE_ID));
        software.push_attribute(("version", env!("CARGO_PKG_VERSION")));
        xml.start(software)?;
        xml.cv_param(
            &CvTerm::new("MS:1000799", "custom unreleased software tool").with_value(SOFTWARE_ID),
        )?;
        xml.end("software")?;
        xml.end("softwareList")?;

        let mut configurations = BytesStart::new("instrumentConfigurationList");
        configurations.push_attribute(("count", "1"));
        xml.start(configurations)?;
        let mut configuration = BytesStart::new("instrumentConfiguration");
        configuration.push_attribute(("id", INSTRUMENT_CONFIGURATION));
        xml.start(configuration)?;
        xml.cv_param(&CvTerm::new("MS:1000031", "instrument model"))?;
        xml.end("instrumentConfiguration")?;
        xml.end("instrumentConfigurationList")?;

        let mut processing_list = BytesStart::new("dataProcessingList");
        processing_list.push_attribute(("count", "1"));
        xml.start(processing_list)?;
        let mut processing = BytesStart::new("dataProcessing");
        processing.push_attribute(("id", DATA_PROCESSING_ID));
        xml.start(processing)?;
        let mut method = BytesStart::new("processingMethod");
        method.push_attribute(("order", "0"));
        method.push_attribute(("softwareRef", SOFTWARE_ID));
        xml.start(method)?;
        xml.cv_param(&CvTerm::new("MS:1000544", "Conversion to mzML"))?;
        xml.end("processingMethod")?;
        xml.end("dataProcessing")?;
        xml.end("dataProcessingList")?;
        Ok(())
    }

    fn write_chromatogram_element(
        xml: &mut XmlHandle<W>,
        index: usize,
        chromatogram: &Chromatogram,
        time_unit: TimeUnit,
    ) -> Result<(), WriterError> {
        let mut elt = BytesStart::new("chromatogram");
        elt.push_attribute(("index", index.to_string().as_str()));
        elt.push_attribute(("id", chromatogram.id.as_str()));
        elt.push_attribute((
            "defaultArrayLength",
            chromatogram.data_point_count().to_string().as_str(),
        ));
        xml.start(elt)?;
        xml.cv_param(&ms_terms::tic_chromatogram())?;
        let mut arrays = BytesStart::new("binaryDataArrayList");
        arrays.push_attribute(("count", "2"));
        xml.start(arrays)?;
        xml.binary_array(&chromatogram.time_array, ms_terms::time_array(time_unit))?;
        xml.binary_array(&chromatogram.intensity_array, ms_terms::intensity_array())?;
        xml.end("binaryDataArrayList")?;
        xml.end("chromatogram")
    }
}

impl<W: Write> ScanSink for MzMLWriter<W> {
    fn accept(&mut self, group: ScanGroup) -> Result<(), SimulationError> {
        self.write_group(&group)?;
        Ok(())
    }
}

/// Write a fully simulated run, including its TIC, to `path`
pub fn write_mzml<P: AsRef<Path>>(
    path: P,
    run: &SimulatedRun,
    params: &RunParameters,
) -> Result<(), WriterError> {
    let mut writer = MzMLWriter::create(path, params)?;
    for group in &run.groups {
        writer.write_group(group)?;
    }
    writer.write_chromatogram(&run.tic)?;
    writer.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::Precursor;

    fn render(groups: &[ScanGroup], tic: Option<&Chromatogram>) -> String {
        let mut writer = MzMLWriter::new(Vec::new(), WriterSettings::default()).unwrap();
        for group in groups {
            writer.write_group(group).unwrap();
        }
        if let Some(tic) = tic {
            writer.write_chromatogram(tic).unwrap();
        }
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    fn sample_group() -> ScanGroup {
        let mut group = ScanGroup::new(
            Scan::new_survey(1, 0.0).with_peaks(vec![268.104, 269.107], vec![1e6, 1.2e5]),
        );
        group.fragments.push(
            Scan::new_fragment(
                2,
                0.03,
                Precursor {
                    mz: 268.104,
                    intensity: 1e6,
                    charge: 1,
                    scan_id: 1,
                },
            )
            .with_peaks(vec![136.062], vec![5e4]),
        );
        group
    }

    #[test]
    fn test_spectrum_list_count_is_exact() {
        let xml = render(&[sample_group(), ScanGroup::new(Scan::new_survey(3, 0.06))], None);
        assert!(xml.contains(r#"<spectrumList count="3""#));
        assert!(xml.contains(r#"id="controllerType=0 controllerNumber=1 scan=2""#));
        assert!(xml.contains(r#"spectrumRef="controllerType=0 controllerNumber=1 scan=1""#));
        assert!(!xml.contains("chromatogramList"));
    }

    #[test]
    fn test_precursor_terms() {
        let xml = render(&[sample_group()], None);
        assert!(xml.contains("MS:1000827"));
        assert!(xml.contains("MS:1000744"));
        assert!(xml.contains(r#"name="charge state" value="1""#));
        assert!(xml.contains("MS:1000133"));
    }

    #[test]
    fn test_empty_spectrum_reports_zero_base_peak() {
        let xml = render(&[ScanGroup::new(Scan::new_survey(1, 0.0))], None);
        assert!(xml.contains(r#"defaultArrayLength="0""#));
        assert!(xml.contains(r#"name="base peak m/z" value="0""#));
        assert!(xml.contains(r#"name="base peak intensity" value="0""#));
    }

    #[test]
    fn test_chromatogram_written_after_spectra() {
        let mut tic = Chromatogram::total_ion_current();
        tic.push(0.0, 1.12e6);
        let xml = render(&[sample_group()], Some(&tic));
        let spectra_end = xml.find("</spectrumList>").unwrap();
        let chromatograms = xml.find(r#"<chromatogramList count="1""#).unwrap();
        assert!(chromatograms > spectra_end);
        assert!(xml.contains("MS:1000235"));
    }

    #[test]
    fn test_finish_writes_header_from_settings() {
        let settings = WriterSettings {
            run_id: "run_42".to_string(),
            time_unit: TimeUnit::Minute,
            ..WriterSettings::default()
        };
        let mut writer = MzMLWriter::new(Vec::new(), settings).unwrap();
        writer.write_group(&sample_group()).unwrap();
        let mut tic = Chromatogram::total_ion_current();
        tic.push(0.5, 1.0);
        writer.write_chromatogram(&tic).unwrap();
        let xml = String::from_utf8(writer.finish().unwrap()).unwrap();

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<mzML xmlns="http://psi.hupo.org/ms/mzml" version="1.1.0" id="run_42">"#));
        assert!(xml.contains(r#"<run id="run_42""#));
        assert!(xml.contains(r#"unitName="minute""#));
        assert!(xml.trim_end().ends_with("</mzML>"));
    }

    #[test]
    fn test_writes_after_finish_are_rejected() {
        let mut writer = MzMLWriter::new(Vec::new(), WriterSettings::default()).unwrap();
        writer.output = None;
        assert!(matches!(
            writer.write_scan(&Scan::new_survey(1, 0.0)),
            Err(WriterError::Finished)
        ));
    }
}
