//! Per-entry metadata tiers
//!
//! Criteria and actions declare the cheapest [`Tier`] of metadata they can
//! work with; the traversal only fetches up to that tier.

use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

const S_IFMT: u32 = 0o170_000;
const S_IFSOCK: u32 = 0o140_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFREG: u32 = 0o100_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFIFO: u32 = 0o010_000;

/// Permission bits, including setuid/setgid/sticky
const PERMISSION_MASK: u32 = 0o7777;

/// How much metadata is needed to evaluate a criterion or run an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Directory and file name only
    Path,
    /// `lstat` data
    Status,
    /// Status plus the whole file contents
    Contents,
}

/// Supported file types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Block device
    Block,
    /// Character device
    Char,
    /// Directory
    Directory,
    /// Regular file
    File,
    /// Symbolic link
    SymbolicLink,
    /// Named pipe
    Fifo,
    /// Unix domain socket
    Socket,
}

impl FileType {
    const ALL: [FileType; 7] = [
        FileType::Block,
        FileType::Char,
        FileType::Directory,
        FileType::File,
        FileType::SymbolicLink,
        FileType::Fifo,
        FileType::Socket,
    ];

    /// Look up a single-letter type code (`b`, `c`, `d`, `f`, `l`, `p`, `s`)
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn code(self) -> &'static str {
        match self {
            FileType::Block => "b",
            FileType::Char => "c",
            FileType::Directory => "d",
            FileType::File => "f",
            FileType::SymbolicLink => "l",
            FileType::Fifo => "p",
            FileType::Socket => "s",
        }
    }

    /// The `S_IFMT` bits for this type
    pub fn mode_bits(self) -> u32 {
        match self {
            FileType::Block => S_IFBLK,
            FileType::Char => S_IFCHR,
            FileType::Directory => S_IFDIR,
            FileType::File => S_IFREG,
            FileType::SymbolicLink => S_IFLNK,
            FileType::Fifo => S_IFIFO,
            FileType::Socket => S_IFSOCK,
        }
    }

    pub fn from_mode(mode: u32) -> Option<Self> {
        let bits = mode & S_IFMT;
        Self::ALL.into_iter().find(|t| t.mode_bits() == bits)
    }
}

/// The subset of `lstat` results criteria and actions look at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Status {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Modification time, seconds since the epoch
    pub mtime: i64,
}

impl Status {
    /// Stat `path` without following symlinks.
    pub fn read(path: &Path) -> io::Result<Self> {
        fs::symlink_metadata(path).map(|meta| Self::from(&meta))
    }

    pub fn file_type(&self) -> Option<FileType> {
        FileType::from_mode(self.mode)
    }

    pub fn is_regular(&self) -> bool {
        self.mode & S_IFMT == S_IFREG
    }

    pub fn permissions(&self) -> u32 {
        self.mode & PERMISSION_MASK
    }
}

impl From<&fs::Metadata> for Status {
    fn from(meta: &fs::Metadata) -> Self {
        Self {
            mode: meta.mode(),
            uid: meta.uid(),
            gid: meta.gid(),
            size: meta.size(),
            mtime: meta.mtime(),
        }
    }
}

/// Metadata gathered so far for one entry.
///
/// Starts empty and is filled tier by tier with [`EntryMeta::fetch`].
#[derive(Debug, Clone, Default)]
pub struct EntryMeta {
    pub status: Option<Status>,
    /// Only ever filled for regular files
    pub contents: Option<Vec<u8>>,
}

impl EntryMeta {
    pub fn with_status(status: Status) -> Self {
        Self {
            status: Some(status),
            contents: None,
        }
    }

    /// Fetch everything `path` needs for `tier` in one go.
    pub fn load(path: &Path, tier: Tier) -> io::Result<Self> {
        let mut meta = Self::default();
        meta.fetch(path, tier)?;
        Ok(meta)
    }

    /// Fill in whatever is still missing up to `tier`.
    ///
    /// Contents are only read for regular files; for anything else the
    /// contents stay `None` and the call still succeeds.
    pub fn fetch(&mut self, path: &Path, tier: Tier) -> io::Result<()> {
        if tier < Tier::Status {
            return Ok(());
        }
        if self.status.is_none() {
            self.status = Some(Status::read(path)?);
        }
        let is_regular = self.status.is_some_and(|status| status.is_regular());
        if tier >= Tier::Contents && self.contents.is_none() && is_regular {
            self.contents = Some(fs::read(path)?);
        }
        Ok(())
    }
}
