//! Embedded file trees
//!
//! `embedfs` packs directory trees into bundles at build time and serves them back at run time
//! through a read-only, filesystem-like API.
//!
//! Build side:
//! - `partition::partition` walks include paths into one bundle per OS/arch key
//! - `FileSystem::compress` gzips (where worthwhile) and hex-encodes file contents
//! - `FileSystem::to_json` persists a bundle
//!
//! Run side:
//! - `FileSystem::load` parses and decodes a bundle
//! - `open`, `stat`, `read_file`, `read_dir`, `copy_file`
//!
//! ```rust,no_run
//! use embedfs::FileSystem;
//! use std::error::Error;
//!
//! fn main() -> Result<(), Box<dyn Error>> {
//!     let assets = FileSystem::load(include_str!("../tests/data/bundle.json"))?;
//!     for info in assets.read_dir("asset")? {
//!         println!("{} {} {}", info.mode(), info.size(), info.name());
//!     }
//!     let index = assets.read_file("asset/index.html")?;
//!     println!("{}", String::from_utf8_lossy(&index));
//!     Ok(())
//! }
//! ```

pub mod compression;
pub mod debug;
pub mod error;
pub mod fs;
pub mod mode;
pub mod partition;
pub mod pipeline;
pub mod record;

pub use compression::Compression;
pub use error::{Error, Result};
pub use fs::{FileSystem, OpenFile};
pub use mode::FileMode;
pub use partition::{includes_from_file, partition, BundleKey, Bundles, Include};
pub use record::{FileInfo, FileRecord, Files};
