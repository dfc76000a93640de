//! Virtual filesystem
//!
//! `FileSystem` serves a bundle's flat content store with POSIX-like semantics: `open` hands out
//! seekable `OpenFile` handles, `read_dir` rebuilds directory listings from path prefixes, and
//! `copy_file` writes an embedded file back to the host.
//!
//! ## Locking
//!
//! The store sits behind a single `RwLock`. `open` holds it only long enough to clone the
//! record's `Arc`; each handle then owns a private cursor, so reads and seeks never touch the
//! lock and concurrent opens of the same path cannot disturb each other.
//!
//! ## Debug mode
//!
//! With `crate::debug::set_debug_mode(true)` every call is served from the host filesystem,
//! paths translated to the host separator.

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::debug;
use crate::error::{Error, Result};
use crate::record::{parent_dir, FileInfo, FileRecord, Files};

#[derive(Debug, Default)]
pub struct FileSystem {
    pub(crate) files: RwLock<Files>,
    /// Set while record contents hold hex text rather than raw bytes.
    pub(crate) encoded: bool,
}

#[derive(Serialize)]
struct BundleRef<'a> {
    encoded: bool,
    files: &'a Files,
}

#[derive(Deserialize)]
struct BundleData {
    #[serde(default)]
    encoded: bool,
    files: Files,
}

impl FileSystem {
    pub fn new() -> Self {
        FileSystem::default()
    }

    /// Wraps a store of raw (not hex-encoded) records.
    pub fn from_files(files: Files) -> Self {
        FileSystem {
            files: RwLock::new(files),
            encoded: false,
        }
    }

    /// Adds a record while the bundle is being built.
    pub fn insert<P: Into<String>>(
        &mut self,
        path: P,
        record: FileRecord,
    ) -> Option<Arc<FileRecord>> {
        self.files.get_mut().insert(path.into(), Arc::new(record))
    }

    pub fn get(&self, path: &str) -> Option<Arc<FileRecord>> {
        self.files.read().get(strip_dot_slash(path)).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    /// True when `decompress` still has to run before contents can be read.
    pub fn is_encoded(&self) -> bool {
        self.encoded
    }

    pub fn to_json(&self) -> Result<String> {
        let files = self.files.read();
        Ok(serde_json::to_string(&BundleRef {
            encoded: self.encoded,
            files: &files,
        })?)
    }

    /// Loads a serialized bundle as is; an encoded bundle stays encoded.
    pub fn from_json(data: &str) -> Result<Self> {
        let bundle: BundleData = serde_json::from_str(data)?;
        Ok(FileSystem {
            files: RwLock::new(bundle.files),
            encoded: bundle.encoded,
        })
    }

    /// Loads a serialized bundle and decodes it, ready for reading.
    pub fn load(data: &str) -> Result<Self> {
        let mut fs = FileSystem::from_json(data)?;
        fs.decompress()?;
        Ok(fs)
    }

    /// Opens `name` for reading. One leading `./` is ignored; nothing else is normalized.
    pub fn open(&self, name: &str) -> Result<OpenFile<'_>> {
        if debug::is_debug_enabled() {
            return OpenFile::host(self, name);
        }

        let name = strip_dot_slash(name);
        let files = self.files.read();
        match files.get(name) {
            Some(record) => Ok(OpenFile::embedded(self, name, Arc::clone(record))),
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    pub fn stat(&self, name: &str) -> Result<FileInfo> {
        let mut file = self.open(name)?;
        let info = file.stat();
        file.close()?;
        Ok(info)
    }

    pub fn read_file(&self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.open(name)?;
        let mut content = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut content)?;
        file.close()?;
        Ok(content)
    }

    /// Lists the directory `name`, or the directory containing `name` when it is a file, sorted
    /// by entry name.
    ///
    /// Directories without a record of their own (including the root, `.` or the empty path)
    /// list as long as at least one stored entry lives in them.
    pub fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        match self.open(name) {
            Ok(mut file) => {
                let infos = file.read_dir(-1)?;
                file.close()?;
                Ok(infos)
            }
            Err(Error::NotFound(missing)) if !debug::is_debug_enabled() => {
                let dir = if missing.is_empty() { "." } else { missing.as_str() };
                let infos = self.list_children(dir);
                if infos.is_empty() {
                    Err(Error::NotFound(missing))
                } else {
                    Ok(infos)
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Writes the embedded file `bundle_path` to `host_path`, creating or truncating it, then
    /// applies the record's permission bits and modification time.
    pub fn copy_file<P: AsRef<Path>>(&self, bundle_path: &str, host_path: P) -> Result<()> {
        let host_path = host_path.as_ref();
        let mut source = self.open(bundle_path)?;
        let info = source.stat();
        if info.is_dir() {
            return Err(Error::InvalidInput(format!(
                "{} is a directory",
                source.name()
            )));
        }

        let mut destination = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(host_path)?;
        std::io::copy(&mut source, &mut destination)?;
        drop(destination);

        info.mode().apply_to(host_path)?;
        filetime::set_file_mtime(
            host_path,
            filetime::FileTime::from_system_time(info.mod_time().into()),
        )?;
        debug!(
            "copied {} to {} ({} bytes, {})",
            source.name(),
            host_path.display(),
            info.size(),
            info.mode()
        );
        source.close()
    }

    /// Entries whose parent directory is `dir`, sorted by name.
    fn list_children(&self, dir: &str) -> Vec<FileInfo> {
        let files = self.files.read();
        let mut infos: Vec<FileInfo> = files
            .iter()
            .filter(|(path, _)| path.as_str() != dir && parent_dir(path) == dir)
            .map(|(_, record)| record.info())
            .collect();
        infos.sort_by(|a, b| a.name().cmp(b.name()));
        infos
    }
}

fn strip_dot_slash(name: &str) -> &str {
    name.strip_prefix("./").unwrap_or(name)
}

/// Exposes a shared record's content to `Cursor` without copying it.
#[derive(Debug)]
struct RecordContent(Arc<FileRecord>);

impl AsRef<[u8]> for RecordContent {
    fn as_ref(&self) -> &[u8] {
        &self.0.content
    }
}

#[derive(Debug)]
enum Source {
    Embedded {
        record: Arc<FileRecord>,
        reader: Option<Cursor<RecordContent>>,
    },
    /// Debug mode. Host directories are not opened, so `file` is `None` for them.
    Host {
        path: PathBuf,
        info: FileInfo,
        file: Option<std::fs::File>,
    },
}

/// An open file or directory, borrowed from the `FileSystem` that produced it.
///
/// Implements `Read` and `Seek`. After `close` both fail instead of reporting end of file.
#[derive(Debug)]
pub struct OpenFile<'fs> {
    fs: &'fs FileSystem,
    path: String,
    source: Source,
    closed: bool,
    dir_offset: usize,
}

impl<'fs> OpenFile<'fs> {
    fn embedded(fs: &'fs FileSystem, path: &str, record: Arc<FileRecord>) -> Self {
        let reader = Cursor::new(RecordContent(Arc::clone(&record)));
        OpenFile {
            fs,
            path: path.to_string(),
            source: Source::Embedded {
                record,
                reader: Some(reader),
            },
            closed: false,
            dir_offset: 0,
        }
    }

    fn host(fs: &'fs FileSystem, name: &str) -> Result<Self> {
        let path = debug::host_path(name);
        let metadata = std::fs::metadata(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::NotFound(name.to_string()),
            _ => Error::Io(err),
        })?;
        let file = if metadata.is_dir() {
            None
        } else {
            Some(std::fs::File::open(&path)?)
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());
        Ok(OpenFile {
            fs,
            path: name.to_string(),
            source: Source::Host {
                info: FileInfo::from_host(filename, &metadata),
                path,
                file,
            },
            closed: false,
            dir_offset: 0,
        })
    }

    /// Name of the file as presented to `open`.
    pub fn name(&self) -> &str {
        &self.path
    }

    /// Length of the content, independent of the read position.
    pub fn size(&self) -> u64 {
        match &self.source {
            Source::Embedded { record, .. } => record.size(),
            Source::Host { info, .. } => info.size(),
        }
    }

    pub fn stat(&self) -> FileInfo {
        match &self.source {
            Source::Embedded { record, .. } => record.info(),
            Source::Host { info, .. } => info.clone(),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Releases the reader. Closing twice is harmless.
    pub fn close(&mut self) -> Result<()> {
        match &mut self.source {
            Source::Embedded { reader, .. } => *reader = None,
            Source::Host { file, .. } => *file = None,
        }
        self.closed = true;
        Ok(())
    }

    /// Lists the directory this handle names, or the one containing it for a plain file.
    ///
    /// `count <= 0` returns the whole listing. A positive `count` pages through it: at most
    /// `count` entries per call, continuing where the previous call stopped; an exhausted listing
    /// yields an empty vector.
    pub fn read_dir(&mut self, count: i32) -> Result<Vec<FileInfo>> {
        if self.closed {
            return Err(Error::Closed(self.path.clone()));
        }

        let infos = match &self.source {
            Source::Embedded { record, .. } => {
                let dir = if record.is_dir() {
                    self.path.as_str()
                } else {
                    parent_dir(&self.path)
                };
                self.fs.list_children(dir)
            }
            Source::Host { path, info, .. } => {
                let dir = if info.is_dir() {
                    path.as_path()
                } else {
                    path.parent()
                        .filter(|p| !p.as_os_str().is_empty())
                        .unwrap_or_else(|| Path::new("."))
                };
                list_host_dir(dir)?
            }
        };

        if count <= 0 {
            return Ok(infos);
        }

        let start = self.dir_offset.min(infos.len());
        let end = (start + count as usize).min(infos.len());
        self.dir_offset = end;
        Ok(infos[start..end].to_vec())
    }
}

fn closed_io_error(path: &str) -> std::io::Error {
    Error::Closed(path.to_string()).into()
}

impl Read for OpenFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(closed_io_error(&self.path));
        }
        match &mut self.source {
            Source::Embedded {
                reader: Some(reader),
                ..
            } => reader.read(buf),
            Source::Host {
                file: Some(file), ..
            } => file.read(buf),
            // host directory, empty like an embedded one
            _ => Ok(0),
        }
    }
}

impl Seek for OpenFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        if self.closed {
            return Err(closed_io_error(&self.path));
        }
        match &mut self.source {
            Source::Embedded {
                reader: Some(reader),
                ..
            } => reader.seek(pos),
            Source::Host {
                file: Some(file), ..
            } => file.seek(pos),
            _ => Ok(0),
        }
    }
}

fn list_host_dir(dir: &Path) -> Result<Vec<FileInfo>> {
    let mut infos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        infos.push(FileInfo::from_host(
            entry.file_name().to_string_lossy().into_owned(),
            &metadata,
        ));
    }
    infos.sort_by(|a, b| a.name().cmp(b.name()));
    Ok(infos)
}
