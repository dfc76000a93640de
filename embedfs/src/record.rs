//! # File records
//!
//! A `FileRecord` is the stored representation of one embedded file or directory. Records hold
//! no read state: cursors live in `crate::fs::OpenFile`, which keeps its own `Arc` of the record
//! so reading never needs the store's lock.
//!
//! Directories are records with the directory type bit set and no content. There are no
//! child pointers; the tree shape is recomputed from the flat path map when listing.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::compression::Compression;
use crate::mode::FileMode;

/// Content Store: slash-separated relative path -> record.
pub type Files = BTreeMap<String, Arc<FileRecord>>;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FileRecord {
    pub filename: String,
    pub mode: FileMode,
    pub mod_time: DateTime<Utc>,
    #[serde(default)]
    pub compression: Compression,
    /// Raw bytes, or hex text once the owning store has been compressed.
    #[serde(default, with = "text_or_bytes")]
    pub content: Vec<u8>,
}

impl FileRecord {
    pub fn file(filename: &str, mode: FileMode, mod_time: DateTime<Utc>, content: Vec<u8>) -> Self {
        FileRecord {
            filename: filename.to_string(),
            mode,
            mod_time,
            compression: Compression::None,
            content,
        }
    }

    pub fn dir(filename: &str, mode: FileMode, mod_time: DateTime<Utc>) -> Self {
        FileRecord {
            filename: filename.to_string(),
            mode,
            mod_time,
            compression: Compression::None,
            content: Vec::new(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }

    /// Length of the stored content, whatever its encoding.
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn info(&self) -> FileInfo {
        FileInfo {
            name: self.filename.clone(),
            mode: self.mode,
            size: self.size(),
            mod_time: self.mod_time,
        }
    }
}

/// Metadata snapshot of a record (or of a host file in debug mode).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    name: String,
    mode: FileMode,
    size: u64,
    mod_time: DateTime<Utc>,
}

impl FileInfo {
    pub fn new(name: String, mode: FileMode, size: u64, mod_time: DateTime<Utc>) -> Self {
        FileInfo {
            name,
            mode,
            size,
            mod_time,
        }
    }

    pub(crate) fn from_host(name: String, metadata: &std::fs::Metadata) -> Self {
        let mod_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();
        FileInfo {
            name,
            mode: FileMode::from_metadata(metadata),
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            mod_time,
        }
    }

    /// Base name of the entry.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mode(&self) -> FileMode {
        self.mode
    }

    pub fn mod_time(&self) -> DateTime<Utc> {
        self.mod_time
    }

    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }
}

/// Content is written as a JSON string when it is valid UTF-8 (always the case once hex
/// encoded) and as a byte array otherwise. Both forms are accepted when reading.
mod text_or_bytes {
    use serde::de::{self, SeqAccess, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(content: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        match std::str::from_utf8(content) {
            Ok(text) => serializer.serialize_str(text),
            Err(_) => serializer.collect_seq(content),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        struct ContentVisitor;

        impl<'de> Visitor<'de> for ContentVisitor {
            type Value = Vec<u8>;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a string or an array of bytes")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Vec<u8>, E> {
                Ok(value.as_bytes().to_vec())
            }

            fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Vec<u8>, E> {
                Ok(value.to_vec())
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<u8>, A::Error> {
                let mut out = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    out.push(byte);
                }
                Ok(out)
            }
        }

        deserializer.deserialize_any(ContentVisitor)
    }
}

/// Directory that lists `path`: everything before the last `/`, or `"."` for top-level entries.
pub(crate) fn parent_dir(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some(("", _)) => "/",
        Some((parent, _)) => parent,
        None => ".",
    }
}
