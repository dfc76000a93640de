use std::convert::{From, TryFrom};
use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Compression applied to a single record's content before it was hex-encoded.
#[derive(PartialEq, Eq, Debug, Clone, Copy, Default, Deserialize, Serialize)]
#[serde(into = "u32", try_from = "u32")]
pub enum Compression {
    #[default]
    None,
    Gzip,
}

impl From<Compression> for u32 {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => 0,
            Compression::Gzip => 1,
        }
    }
}

impl TryFrom<u32> for Compression {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(Compression::None),
            1 => Ok(Compression::Gzip),
            _ => Err(Error::InvalidInput(format!(
                "Compression type '{}' unknown",
                value
            ))),
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            other => Err(Error::InvalidInput(format!(
                "Compression type '{}' unknown",
                other
            ))),
        }
    }
}

impl Compression {
    /// Runs `content` through the algorithm and returns the result as lowercase hex text.
    pub fn encode(&self, content: &[u8]) -> Result<Vec<u8>> {
        let compressed = match self {
            Compression::None => content.to_owned(),
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(content)?;
                encoder.finish()?
            }
        };
        Ok(hex::encode(compressed).into_bytes())
    }

    /// Inverse of `encode`.
    pub fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>> {
        let raw = hex::decode(encoded)?;
        Ok(match self {
            Compression::None => raw,
            Compression::Gzip => {
                let mut decoder = GzDecoder::new(&raw[..]);
                let mut decompressed = Vec::new();
                decoder
                    .read_to_end(&mut decompressed)
                    .map_err(Error::Gzip)?;
                decompressed
            }
        })
    }
}

/// Formats that are already compressed and only grow when gzipped again.
const INCOMPRESSIBLE_MIME_TYPES: [&str; 7] = [
    "application/x-7z-compressed",
    "application/zip",
    "application/x-bzip2",
    "application/gzip",
    "image/png",
    "image/jpeg",
    "image/gif",
];

/// Sniffs the MIME type of `content`, `None` when the magic bytes are not recognised.
pub fn sniff_mime_type(content: &[u8]) -> Option<&'static str> {
    infer::get(content).map(|kind| kind.mime_type())
}

pub fn should_compress(content: &[u8]) -> bool {
    match sniff_mime_type(content) {
        Some(mime) => !INCOMPRESSIBLE_MIME_TYPES.contains(&mime),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    #[test]
    fn test_gzip_roundtrip() {
        let text = b"the same line again\n".repeat(64);
        let encoded = Compression::Gzip.encode(&text).unwrap();
        assert!(encoded.iter().all(|b| b.is_ascii_hexdigit()));
        // gzip of repeated text is far smaller, even after doubling for hex
        assert!(encoded.len() < text.len());
        assert_eq!(Compression::Gzip.decode(&encoded).unwrap(), text);
    }

    #[test]
    fn test_none_is_plain_hex() {
        assert_eq!(Compression::None.encode(b"hi").unwrap(), b"6869".to_vec());
        assert_eq!(Compression::None.decode(b"6869").unwrap(), b"hi".to_vec());
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            Compression::None.decode(b"zz"),
            Err(Error::Hex(_))
        ));
        // valid hex, not a gzip stream
        let err = Compression::Gzip.decode(b"00112233").unwrap_err();
        assert!(err.is_decode_failure());
    }

    #[test]
    fn test_should_compress() {
        assert!(should_compress(b"plain old text"));
        assert!(should_compress(b""));
        assert!(!should_compress(PNG_HEADER));
        assert!(!should_compress(&[0x1F, 0x8B, 0x08, 0x00]));
        assert_eq!(sniff_mime_type(PNG_HEADER), Some("image/png"));
    }

    #[test]
    fn test_compression_from_int_and_str() {
        assert_eq!(Compression::try_from(1u32).unwrap(), Compression::Gzip);
        assert!(Compression::try_from(7u32).is_err());
        assert_eq!("GZIP".parse::<Compression>().unwrap(), Compression::Gzip);
        assert_eq!(u32::from(Compression::None), 0);
    }
}
