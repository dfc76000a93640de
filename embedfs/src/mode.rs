//! File mode bits
//!
//! Modes are stored as a POSIX `st_mode` word: the low 12 bits hold permissions (plus
//! setuid/setgid/sticky) and the `S_IFMT` bits hold the file type. Hosts that do not expose
//! `st_mode` get one synthesized from the metadata they do have.

use serde::{Deserialize, Serialize};
use std::fmt;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;
const S_IFLNK: u32 = 0o120000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct FileMode(u32);

impl FileMode {
    pub const fn new(st_mode: u32) -> FileMode {
        FileMode(st_mode)
    }

    pub const fn file(perm: u32) -> FileMode {
        FileMode(S_IFREG | (perm & 0o7777))
    }

    pub const fn dir(perm: u32) -> FileMode {
        FileMode(S_IFDIR | (perm & 0o7777))
    }

    pub fn bits(&self) -> u32 {
        self.0
    }

    pub fn is_dir(&self) -> bool {
        self.0 & S_IFMT == S_IFDIR
    }

    pub fn is_symlink(&self) -> bool {
        self.0 & S_IFMT == S_IFLNK
    }

    /// Permission bits only (`rwxrwxrwx`).
    pub fn perm(&self) -> u32 {
        self.0 & 0o777
    }

    #[cfg(unix)]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> FileMode {
        use std::os::unix::fs::MetadataExt;
        FileMode(metadata.mode())
    }

    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &std::fs::Metadata) -> FileMode {
        let readonly = metadata.permissions().readonly();
        if metadata.is_dir() {
            FileMode::dir(if readonly { 0o555 } else { 0o755 })
        } else {
            FileMode::file(if readonly { 0o444 } else { 0o644 })
        }
    }

    /// Sets the permission bits of `path` on the host.
    #[cfg(unix)]
    pub fn apply_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(self.0 & 0o7777))
    }

    /// Only the read-only flag survives on hosts without unix permissions.
    #[cfg(not(unix))]
    pub fn apply_to(&self, path: &std::path::Path) -> std::io::Result<()> {
        let mut permissions = std::fs::metadata(path)?.permissions();
        permissions.set_readonly(self.0 & 0o222 == 0);
        std::fs::set_permissions(path, permissions)
    }
}

/// `ls -l` style rendering, e.g. `drwxr-xr-x`.
impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.0 & S_IFMT {
            S_IFDIR => 'd',
            S_IFLNK => 'l',
            _ => '-',
        };
        let mut out = String::with_capacity(10);
        out.push(kind);
        for shift in [6u32, 3, 0] {
            let bits = (self.0 >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        f.write_str(&out)
    }
}
