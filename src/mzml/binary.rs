//! Binary data array encoding and decoding for mzML
//!
//! mzML stores m/z and intensity arrays as base64-encoded, optionally
//! zlib-compressed, little-endian IEEE-754 floats. The writer always emits
//! 64-bit floats with zlib; the reader also accepts 32-bit floats and
//! uncompressed arrays.

use std::io::{Cursor, Read, Write};

use base64::prelude::*;
use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::cv::accessions;

/// Compression applied to a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionType {
    /// No compression
    #[default]
    None,
    /// zlib compression (MS:1000574)
    Zlib,
}

impl CompressionType {
    /// Map a compression CV accession
    pub fn from_cv_accession(accession: &str) -> Option<Self> {
        match accession {
            accessions::NO_COMPRESSION => Some(Self::None),
            accessions::ZLIB_COMPRESSION => Some(Self::Zlib),
            _ => None,
        }
    }
}

/// Float width of a binary array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryEncoding {
    /// 32-bit float (MS:1000521)
    Float32,
    /// 64-bit float (MS:1000523)
    #[default]
    Float64,
}

impl BinaryEncoding {
    /// Map an encoding CV accession
    pub fn from_cv_accession(accession: &str) -> Option<Self> {
        match accession {
            accessions::FLOAT_32 => Some(Self::Float32),
            accessions::FLOAT_64 => Some(Self::Float64),
            _ => None,
        }
    }

    /// Byte size of one value
    pub fn byte_size(&self) -> usize {
        match self {
            Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }
}

/// Errors that can occur while decoding a binary array
#[derive(Debug, thiserror::Error)]
pub enum BinaryDecodeError {
    #[error("Base64 decode error: {0}")]
    Base64Error(#[from] base64::DecodeError),

    #[error("Decompression error: {0}")]
    DecompressionError(#[from] std::io::Error),

    #[error("Invalid data length: expected multiple of {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Array length mismatch: declared {declared}, decoded {decoded}")]
    ArrayLengthMismatch { declared: usize, decoded: usize },
}

/// Encode `values` as zlib-compressed 64-bit little-endian floats in base64
pub fn encode_f64_zlib(values: &[f64]) -> std::io::Result<String> {
    let mut raw = Vec::with_capacity(values.len() * 8);
    for v in values {
        raw.extend_from_slice(&v.to_le_bytes());
    }
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;
    Ok(BASE64_STANDARD.encode(compressed))
}

/// Decode a base64 binary array into f64 values.
///
/// `expected_length` is the declared `defaultArrayLength`; a mismatch is an error.
pub fn decode(
    base64_data: &str,
    encoding: BinaryEncoding,
    compression: CompressionType,
    expected_length: Option<usize>,
) -> Result<Vec<f64>, BinaryDecodeError> {
    let trimmed = base64_data.trim();
    if trimmed.is_empty() {
        return match expected_length {
            Some(n) if n > 0 => Err(BinaryDecodeError::ArrayLengthMismatch {
                declared: n,
                decoded: 0,
            }),
            _ => Ok(Vec::new()),
        };
    }

    let bytes = BASE64_STANDARD.decode(trimmed)?;
    let raw = match compression {
        CompressionType::None => bytes,
        CompressionType::Zlib => {
            let mut decoder = ZlibDecoder::new(&bytes[..]);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            out
        }
    };

    let width = encoding.byte_size();
    if raw.len() % width != 0 {
        return Err(BinaryDecodeError::InvalidLength {
            expected: width,
            actual: raw.len(),
        });
    }

    let count = raw.len() / width;
    let mut cursor = Cursor::new(raw);
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let value = match encoding {
            BinaryEncoding::Float32 => cursor.read_f32::<LittleEndian>()? as f64,
            BinaryEncoding::Float64 => cursor.read_f64::<LittleEndian>()?,
        };
        values.push(value);
    }

    if let Some(declared) = expected_length {
        if declared != values.len() {
            return Err(BinaryDecodeError::ArrayLengthMismatch {
                declared,
                decoded: values.len(),
            });
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_float64_uncompressed() {
        // 100.0 = 0x4059000000000000, 200.0 = 0x4069000000000000
        let bytes: [u8; 16] = [
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x59, 0x40, //
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x69, 0x40,
        ];
        let data = BASE64_STANDARD.encode(bytes);
        let values = decode(&data, BinaryEncoding::Float64, CompressionType::None, Some(2)).unwrap();
        assert_eq!(values, vec![100.0, 200.0]);
    }

    #[test]
    fn test_decode_float32_uncompressed() {
        let bytes: [u8; 8] = [0x00, 0x00, 0xc8, 0x42, 0x00, 0x00, 0x48, 0x43];
        let data = BASE64_STANDARD.encode(bytes);
        let values = decode(&data, BinaryEncoding::Float32, CompressionType::None, None).unwrap();
        assert_eq!(values, vec![100.0, 200.0]);
    }

    #[test]
    fn test_zlib_encoding_is_lossless() {
        let values = vec![132.0768, 1.0e10, 0.0, 1e-3];
        let data = encode_f64_zlib(&values).unwrap();
        let decoded = decode(&data, BinaryEncoding::Float64, CompressionType::Zlib, Some(4)).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_empty_array() {
        let data = encode_f64_zlib(&[]).unwrap();
        let decoded = decode(&data, BinaryEncoding::Float64, CompressionType::Zlib, Some(0)).unwrap();
        assert!(decoded.is_empty());
        assert!(decode("", BinaryEncoding::Float64, CompressionType::None, None)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_declared_length_mismatch() {
        let data = encode_f64_zlib(&[1.0, 2.0]).unwrap();
        let result = decode(&data, BinaryEncoding::Float64, CompressionType::Zlib, Some(3));
        assert!(matches!(
            result,
            Err(BinaryDecodeError::ArrayLengthMismatch {
                declared: 3,
                decoded: 2
            })
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let data = BASE64_STANDARD.encode([0u8; 12]);
        let result = decode(&data, BinaryEncoding::Float64, CompressionType::None, None);
        assert!(matches!(result, Err(BinaryDecodeError::InvalidLength { expected: 8, actual: 12 })));
    }
}
