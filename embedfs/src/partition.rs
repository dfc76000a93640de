//! Bundle partitioner
//!
//! Every include declaration names a path and the source file it was declared in. The
//! declaring file's name decides the bundle, the same way build tooling picks files by suffix:
//!
//! ```text
//! net.rs                -> default
//! net_linux.rs          -> _linux
//! net_arm64.rs          -> _arm64
//! net_windows_amd64.rs  -> _windows_amd64
//! ```
//!
//! The included path is then walked recursively and each entry (directories too) is copied into
//! that bundle. The same path declared from two differently suffixed files lands in both
//! bundles; bundles never share records. Any failure aborts the whole run.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::fs::FileSystem;
use crate::mode::FileMode;
use crate::record::FileRecord;

pub const OPERATING_SYSTEMS: [&str; 11] = [
    "linux",
    "windows",
    "darwin",
    "freebsd",
    "js",
    "plan9",
    "dragonfly",
    "openbsd",
    "solaris",
    "aix",
    "android",
];

pub const ARCHITECTURES: [&str; 12] = [
    "ppc64", "386", "amd64", "wasm", "arm", "ppc64le", "mips", "mips64", "mips64le", "mipsle",
    "s390x", "arm64",
];

pub const DEFAULT_BUNDLE: &str = "default";

/// OS/architecture constraint of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BundleKey {
    pub os: Option<&'static str>,
    pub arch: Option<&'static str>,
}

impl BundleKey {
    /// Derives the key from the declaring file's name, ignoring its directory and extension.
    pub fn from_declaring_file(declared_in: &str) -> BundleKey {
        let stem = Path::new(declared_in)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(declared_in);

        let mut key = BundleKey::default();
        let mut rest = stem;
        for arch in ARCHITECTURES {
            if let Some(prefix) = strip_tag(stem, arch) {
                key.arch = Some(arch);
                rest = prefix;
            }
        }
        for os in OPERATING_SYSTEMS {
            if strip_tag(rest, os).is_some() {
                key.os = Some(os);
            }
        }
        key
    }

    pub fn is_default(&self) -> bool {
        self.os.is_none() && self.arch.is_none()
    }

    /// The Rust `cfg` predicate selecting targets this bundle belongs to.
    pub fn cfg_predicate(&self) -> String {
        let mut parts = Vec::new();
        if let Some(os) = self.os {
            parts.push(format!("target_os = \"{}\"", rust_target_os(os)));
        }
        if let Some(arch) = self.arch {
            let (target_arch, endian) = rust_target_arch(arch);
            parts.push(format!("target_arch = \"{}\"", target_arch));
            if let Some(endian) = endian {
                parts.push(format!("target_endian = \"{}\"", endian));
            }
        }
        match parts.len() {
            0 => "all()".to_string(),
            1 => parts.remove(0),
            _ => format!("all({})", parts.join(", ")),
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_default() {
            return f.write_str(DEFAULT_BUNDLE);
        }
        if let Some(os) = self.os {
            write!(f, "_{}", os)?;
        }
        if let Some(arch) = self.arch {
            write!(f, "_{}", arch)?;
        }
        Ok(())
    }
}

/// `name` without its trailing `_<tag>`, if it has one.
fn strip_tag<'a>(name: &'a str, tag: &str) -> Option<&'a str> {
    name.strip_suffix(tag)?.strip_suffix('_')
}

fn rust_target_os(os: &str) -> &str {
    match os {
        "darwin" => "macos",
        "js" => "unknown",
        other => other,
    }
}

fn rust_target_arch(arch: &str) -> (&str, Option<&'static str>) {
    match arch {
        "386" => ("x86", None),
        "amd64" => ("x86_64", None),
        "arm64" => ("aarch64", None),
        "wasm" => ("wasm32", None),
        "ppc64" => ("powerpc64", Some("big")),
        "ppc64le" => ("powerpc64", Some("little")),
        "mips" => ("mips", Some("big")),
        "mipsle" => ("mips", Some("little")),
        "mips64" => ("mips64", Some("big")),
        "mips64le" => ("mips64", Some("little")),
        other => (other, None),
    }
}

/// One include declaration: a relative path and the file that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Include {
    pub path: String,
    pub declared_in: String,
}

impl Include {
    pub fn new<P: Into<String>, D: Into<String>>(path: P, declared_in: D) -> Self {
        Include {
            path: path.into(),
            declared_in: declared_in.into(),
        }
    }

    pub fn bundle_key(&self) -> BundleKey {
        BundleKey::from_declaring_file(&self.declared_in)
    }
}

/// Reads a newline separated list of include paths, all attributed to `declared_in`.
/// Surrounding whitespace is trimmed and blank lines are skipped.
pub fn includes_from_file<P: AsRef<Path>>(list: P, declared_in: &str) -> Result<Vec<Include>> {
    let content = std::fs::read_to_string(list.as_ref())?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Include::new(line, declared_in))
        .collect())
}

pub type Bundles = BTreeMap<BundleKey, FileSystem>;

/// Builds one `FileSystem` per bundle key. The default bundle is always present.
pub fn partition(includes: &[Include]) -> Result<Bundles> {
    let mut bundles = Bundles::new();
    bundles.insert(BundleKey::default(), FileSystem::new());

    for include in includes {
        let root = validate(&include.path)?;
        let key = include.bundle_key();
        debug!(
            "partition: {} (declared in {}) -> {}",
            root, include.declared_in, key
        );
        let bundle = bundles.entry(key).or_default();
        walk_into(root, bundle)?;
    }

    for (key, bundle) in &bundles {
        info!("partition: bundle {} holds {} entries", key, bundle.len());
    }
    Ok(bundles)
}

fn validate(path: &str) -> Result<&str> {
    if path.is_empty() {
        return Err(Error::InvalidInput("empty include path".to_string()));
    }
    if Path::new(path).is_absolute() || path.starts_with('/') {
        return Err(Error::InvalidInput(format!(
            "only relative include paths are supported: {}",
            path
        )));
    }
    if !Path::new(path).exists() {
        return Err(Error::NotFound(path.to_string()));
    }
    Ok(path.strip_prefix("./").unwrap_or(path))
}

fn walk_into(root: &str, bundle: &mut FileSystem) -> Result<()> {
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        let metadata = entry.metadata()?;
        let path = bundle_path(entry.path());
        let filename = entry.file_name().to_string_lossy().into_owned();
        let mode = FileMode::from_metadata(&metadata);
        let mod_time = metadata
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_default();

        let record = if metadata.is_dir() {
            FileRecord::dir(&filename, mode, mod_time)
        } else {
            FileRecord::file(&filename, mode, mod_time, std::fs::read(entry.path())?)
        };
        debug!("partition: + {} ({}, {} bytes)", path, mode, record.size());
        bundle.insert(path, record);
    }
    Ok(())
}

/// Host path -> store key: forward slashes, no `./` components.
fn bundle_path(path: &Path) -> String {
    let joined = path
        .components()
        .filter(|c| !matches!(c, std::path::Component::CurDir))
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> String {
        BundleKey::from_declaring_file(name).to_string()
    }

    #[test]
    fn test_bundle_keys() {
        assert_eq!(key("main.go"), "default");
        assert_eq!(key("net_linux.go"), "_linux");
        assert_eq!(key("net_arm64.rs"), "_arm64");
        assert_eq!(key("net_windows_amd64.go"), "_windows_amd64");
        assert_eq!(key("src/sys/io_darwin_arm64.rs"), "_darwin_arm64");
        assert_eq!(key("x_ppc64le.go"), "_ppc64le");
        assert_eq!(key("x_mips64le.go"), "_mips64le");
    }

    #[test]
    fn test_bundle_keys_need_separator() {
        assert_eq!(key("penguinlinux.go"), "default");
        assert_eq!(key("linux.go"), "default");
        assert_eq!(key("foo_linuxamd64.go"), "default");
        // an OS tag is only recognised right before the arch tag
        assert_eq!(key("linux_helper_amd64.go"), "_amd64");
    }

    #[test]
    fn test_cfg_predicate() {
        assert_eq!(
            BundleKey::from_declaring_file("a_linux.rs").cfg_predicate(),
            "target_os = \"linux\""
        );
        assert_eq!(
            BundleKey::from_declaring_file("a_windows_amd64.rs").cfg_predicate(),
            "all(target_os = \"windows\", target_arch = \"x86_64\")"
        );
        assert_eq!(
            BundleKey::from_declaring_file("a_mipsle.rs").cfg_predicate(),
            "all(target_arch = \"mips\", target_endian = \"little\")"
        );
        assert_eq!(BundleKey::default().cfg_predicate(), "all()");
    }

    #[test]
    fn test_bundle_path() {
        assert_eq!(bundle_path(Path::new("asset/a.txt")), "asset/a.txt");
        assert_eq!(bundle_path(Path::new("./asset")), "asset");
        assert_eq!(bundle_path(Path::new(".")), ".");
    }

    #[test]
    fn test_rejects_absolute_and_missing() {
        assert!(matches!(
            partition(&[Include::new("/etc", "main.go")]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            partition(&[Include::new("does/not/exist", "main.go")]),
            Err(Error::NotFound(_))
        ));
    }
}
