//! Compression pipeline
//!
//! Build time: `compress` turns every file record into hex text, gzipped first when the content
//! is worth compressing. Run time: `decompress` reverses it. Directories are never touched.
//!
//! Both passes compute every new content before touching the store, so a failure leaves the
//! bundle exactly as it was.

use std::sync::Arc;

use log::{debug, info};

use crate::compression::{should_compress, Compression};
use crate::error::Result;
use crate::fs::FileSystem;

impl FileSystem {
    /// Encodes every file record with `algorithm`, except content sniffed as an already
    /// compressed format, which is only hex-encoded and keeps `Compression::None`.
    ///
    /// A no-op on a store that is already encoded.
    pub fn compress(&mut self, algorithm: Compression) -> Result<()> {
        if self.encoded {
            debug!("compress: store already encoded, nothing to do");
            return Ok(());
        }

        let files = self.files.get_mut();
        let mut updates = Vec::with_capacity(files.len());
        let mut skipped = 0usize;
        for (path, record) in files.iter() {
            if record.is_dir() {
                continue;
            }
            let chosen = if algorithm != Compression::None && !should_compress(&record.content) {
                debug!("compress: {} does not compress well, storing as is", path);
                skipped += 1;
                Compression::None
            } else {
                algorithm
            };
            updates.push((path.clone(), chosen, chosen.encode(&record.content)?));
        }

        let encoded_count = updates.len();
        apply(files, updates);
        self.encoded = true;
        info!(
            "compress: encoded {} files with {:?} ({} left uncompressed)",
            encoded_count, algorithm, skipped
        );
        Ok(())
    }

    /// Decodes every file record back to raw bytes. A no-op on a store that is not encoded.
    pub fn decompress(&mut self) -> Result<()> {
        if !self.encoded {
            debug!("decompress: store holds raw content, nothing to do");
            return Ok(());
        }

        let files = self.files.get_mut();
        let mut updates = Vec::with_capacity(files.len());
        for (path, record) in files.iter() {
            if record.is_dir() {
                continue;
            }
            let raw = record.compression.decode(&record.content).map_err(|err| {
                debug!("decompress: {} is corrupt: {}", path, err);
                err
            })?;
            updates.push((path.clone(), Compression::None, raw));
        }

        let decoded_count = updates.len();
        apply(files, updates);
        self.encoded = false;
        info!("decompress: decoded {} files", decoded_count);
        Ok(())
    }
}

fn apply(files: &mut crate::record::Files, updates: Vec<(String, Compression, Vec<u8>)>) {
    for (path, compression, content) in updates {
        if let Some(record) = files.get_mut(&path) {
            let record = Arc::make_mut(record);
            record.compression = compression;
            record.content = content;
        }
    }
}
