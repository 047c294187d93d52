//! File filtering functionality
//!
//! This module provides the criteria an entry has to satisfy to be reported.
//! Every criterion is built once from an option value and is immutable after
//! that; a bad value is rejected when the filter is created.

use std::ffi::OsStr;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use glob::{MatchOptions, Pattern};
use regex::bytes::{Regex, RegexBuilder};

use crate::errors::{FindError, FindResult};
use super::accounts::AccountDb;
use super::metadata::{EntryMeta, FileType, Tier};
use super::options::CriterionKind;
use super::parse::{parse_interval, parse_size, Interval, SizeRange};

/// Trait for file filters
pub trait FileFilter: fmt::Debug + Send + Sync {
    /// Which option created this filter
    fn kind(&self) -> CriterionKind;

    /// The metadata this filter needs to be evaluated
    fn required_tier(&self) -> Tier;

    /// Check if the entry matches the filter
    ///
    /// `meta` holds at least [`FileFilter::required_tier`] worth of data,
    /// except that contents are never present for non-regular files.
    fn matches(&self, dir: &Path, name: &OsStr, meta: &EntryMeta) -> bool;

    /// Get the filter description
    fn description(&self) -> String;
}

/// Factory for creating filters from option values
pub struct FilterFactory;

impl FilterFactory {
    /// Create the filter for one option
    pub fn create(
        kind: CriterionKind,
        value: &str,
        accounts: &dyn AccountDb,
    ) -> FindResult<Box<dyn FileFilter>> {
        let filter: Box<dyn FileFilter> = match kind {
            CriterionKind::Name => Box::new(NameFilter::new(value)?),
            CriterionKind::Iname => Box::new(NameFilter::new_ignore_case(value)?),
            CriterionKind::Regex => Box::new(RegexFilter::new(value)?),
            CriterionKind::Iregex => Box::new(RegexFilter::new_ignore_case(value)?),
            CriterionKind::Type => Box::new(TypeFilter::new(value)?),
            CriterionKind::Owner => Box::new(OwnerFilter::new(value, accounts)?),
            CriterionKind::Group => Box::new(GroupFilter::new(value, accounts)?),
            CriterionKind::Size => Box::new(SizeFilter::new(value)?),
            CriterionKind::Mtime => Box::new(MtimeFilter::new(value)?),
            CriterionKind::Grep => Box::new(GrepFilter::new(value)?),
        };
        Ok(filter)
    }
}

/// Filter for matching file names against a shell glob
#[derive(Debug)]
pub struct NameFilter {
    pattern: Pattern,
    ignore_case: bool,
}

impl NameFilter {
    /// Create a new NameFilter with the given pattern
    pub fn new(pattern: &str) -> FindResult<Self> {
        let compiled_pattern = Pattern::new(pattern).map_err(|e| FindError::PatternError {
            message: format!("Invalid pattern '{}': {}", pattern, e),
        })?;

        Ok(Self {
            pattern: compiled_pattern,
            ignore_case: false,
        })
    }

    /// Create a new case-insensitive NameFilter
    pub fn new_ignore_case(pattern: &str) -> FindResult<Self> {
        let mut filter = Self::new(pattern)?;
        filter.ignore_case = true;
        Ok(filter)
    }

    fn match_options(&self) -> MatchOptions {
        MatchOptions {
            case_sensitive: !self.ignore_case,
            require_literal_separator: false,
            require_literal_leading_dot: false,
        }
    }
}

impl FileFilter for NameFilter {
    fn kind(&self) -> CriterionKind {
        if self.ignore_case {
            CriterionKind::Iname
        } else {
            CriterionKind::Name
        }
    }

    fn required_tier(&self) -> Tier {
        Tier::Path
    }

    fn matches(&self, _dir: &Path, name: &OsStr, _meta: &EntryMeta) -> bool {
        match name.to_str() {
            Some(name) => self.pattern.matches_with(name, self.match_options()),
            None => false,
        }
    }

    fn description(&self) -> String {
        if self.ignore_case {
            format!("name (ignore case) matches '{}'", self.pattern)
        } else {
            format!("name matches '{}'", self.pattern)
        }
    }
}

fn compile_regex(pattern: &str, ignore_case: bool) -> FindResult<Regex> {
    RegexBuilder::new(pattern)
        .case_insensitive(ignore_case)
        .build()
        .map_err(|e| FindError::PatternError {
            message: format!("Invalid regex '{}': {}", pattern, e),
        })
}

/// Filter for file names containing a regular expression match
#[derive(Debug)]
pub struct RegexFilter {
    regex: Regex,
    ignore_case: bool,
}

impl RegexFilter {
    pub fn new(pattern: &str) -> FindResult<Self> {
        Ok(Self {
            regex: compile_regex(pattern, false)?,
            ignore_case: false,
        })
    }

    pub fn new_ignore_case(pattern: &str) -> FindResult<Self> {
        Ok(Self {
            regex: compile_regex(pattern, true)?,
            ignore_case: true,
        })
    }
}

impl FileFilter for RegexFilter {
    fn kind(&self) -> CriterionKind {
        if self.ignore_case {
            CriterionKind::Iregex
        } else {
            CriterionKind::Regex
        }
    }

    fn required_tier(&self) -> Tier {
        Tier::Path
    }

    fn matches(&self, _dir: &Path, name: &OsStr, _meta: &EntryMeta) -> bool {
        self.regex.is_match(name.as_bytes())
    }

    fn description(&self) -> String {
        let case = if self.ignore_case { " (ignore case)" } else { "" };
        format!("name{} contains /{}/", case, self.regex.as_str())
    }
}

/// Filter for matching file types
#[derive(Debug)]
pub struct TypeFilter {
    file_type: FileType,
}

impl TypeFilter {
    /// Create a new TypeFilter with the given type code
    pub fn new(type_code: &str) -> FindResult<Self> {
        let file_type = FileType::from_code(type_code)
            .ok_or_else(|| FindError::InvalidFileType(type_code.to_string()))?;
        Ok(Self { file_type })
    }
}

impl FileFilter for TypeFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Type
    }

    fn required_tier(&self) -> Tier {
        Tier::Status
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        meta.status
            .is_some_and(|status| status.file_type() == Some(self.file_type))
    }

    fn description(&self) -> String {
        match self.file_type {
            FileType::Block => "is a block device".to_string(),
            FileType::Char => "is a character device".to_string(),
            FileType::Directory => "is a directory".to_string(),
            FileType::File => "is a regular file".to_string(),
            FileType::SymbolicLink => "is a symbolic link".to_string(),
            FileType::Fifo => "is a named pipe".to_string(),
            FileType::Socket => "is a socket".to_string(),
        }
    }
}

/// Numeric ids are taken as-is; anything else is looked up by name.
fn resolve_id(
    value: &str,
    lookup: impl FnOnce(&str) -> Option<u32>,
    unknown: impl FnOnce(String) -> FindError,
) -> FindResult<u32> {
    match value.parse::<u32>() {
        Ok(id) => Ok(id),
        Err(_) => lookup(value).ok_or_else(|| unknown(value.to_string())),
    }
}

/// Filter on the owning user id
#[derive(Debug)]
pub struct OwnerFilter {
    uid: u32,
}

impl OwnerFilter {
    pub fn new(owner: &str, accounts: &dyn AccountDb) -> FindResult<Self> {
        let uid = resolve_id(owner, |name| accounts.uid_by_name(name), FindError::UnknownUser)?;
        Ok(Self { uid })
    }
}

impl FileFilter for OwnerFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Owner
    }

    fn required_tier(&self) -> Tier {
        Tier::Status
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        meta.status.is_some_and(|status| status.uid == self.uid)
    }

    fn description(&self) -> String {
        format!("owned by uid {}", self.uid)
    }
}

/// Filter on the owning group id
#[derive(Debug)]
pub struct GroupFilter {
    gid: u32,
}

impl GroupFilter {
    pub fn new(group: &str, accounts: &dyn AccountDb) -> FindResult<Self> {
        let gid = resolve_id(group, |name| accounts.gid_by_name(name), FindError::UnknownGroup)?;
        Ok(Self { gid })
    }
}

impl FileFilter for GroupFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Group
    }

    fn required_tier(&self) -> Tier {
        Tier::Status
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        meta.status.is_some_and(|status| status.gid == self.gid)
    }

    fn description(&self) -> String {
        format!("owned by gid {}", self.gid)
    }
}

/// Filter on the byte size
#[derive(Debug)]
pub struct SizeFilter {
    range: SizeRange,
}

impl SizeFilter {
    pub fn new(size: &str) -> FindResult<Self> {
        Ok(Self {
            range: parse_size(size)?,
        })
    }
}

impl FileFilter for SizeFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Size
    }

    fn required_tier(&self) -> Tier {
        Tier::Status
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        meta.status
            .is_some_and(|status| self.range.contains(status.size))
    }

    fn description(&self) -> String {
        format!("size in [{}, {}] bytes", self.range.min, self.range.max)
    }
}

/// Filter on the modification time
///
/// An entry matches when its age falls in the bucket
/// `[interval, interval + resolution)`, so `1d` means "modified between one
/// and two whole days ago". Entries dated in the future always match.
#[derive(Debug)]
pub struct MtimeFilter {
    interval: Interval,
}

impl MtimeFilter {
    pub fn new(interval: &str) -> FindResult<Self> {
        Ok(Self {
            interval: parse_interval(interval)?,
        })
    }

    /// Decide using an explicit clock, `now` in seconds since the epoch.
    pub fn matches_at(&self, mtime: i64, now: f64) -> bool {
        if self.interval.is_unbounded() {
            return true;
        }
        let lower = self.interval.seconds;
        let upper = lower + self.interval.resolution.unwrap_or(1) as f64;
        let age = now - mtime as f64;
        age < 0.0 || (lower <= age && age < upper)
    }
}

impl FileFilter for MtimeFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Mtime
    }

    fn required_tier(&self) -> Tier {
        Tier::Status
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        let Some(status) = meta.status else {
            return false;
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        self.matches_at(status.mtime, now)
    }

    fn description(&self) -> String {
        match self.interval.resolution {
            None => "any modification time".to_string(),
            Some(resolution) => format!(
                "modified less than {}s ago",
                self.interval.seconds + resolution as f64
            ),
        }
    }
}

/// Filter on regular files whose contents contain a regex match
#[derive(Debug)]
pub struct GrepFilter {
    regex: Regex,
}

impl GrepFilter {
    pub fn new(pattern: &str) -> FindResult<Self> {
        Ok(Self {
            regex: compile_regex(pattern, false)?,
        })
    }
}

impl FileFilter for GrepFilter {
    fn kind(&self) -> CriterionKind {
        CriterionKind::Grep
    }

    fn required_tier(&self) -> Tier {
        Tier::Contents
    }

    fn matches(&self, _dir: &Path, _name: &OsStr, meta: &EntryMeta) -> bool {
        // devices, pipes, sockets and directories never match
        if !meta.status.is_some_and(|status| status.is_regular()) {
            return false;
        }
        meta.contents
            .as_deref()
            .is_some_and(|contents| self.regex.is_match(contents))
    }

    fn description(&self) -> String {
        format!("contents contain /{}/", self.regex.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    use crate::finder::metadata::Status;

    struct StaticAccounts {
        users: HashMap<&'static str, u32>,
        groups: HashMap<&'static str, u32>,
    }

    impl StaticAccounts {
        fn new() -> Self {
            Self {
                users: HashMap::from([("root", 0), ("alice", 1000)]),
                groups: HashMap::from([("root", 0), ("staff", 50)]),
            }
        }
    }

    impl AccountDb for StaticAccounts {
        fn uid_by_name(&self, name: &str) -> Option<u32> {
            self.users.get(name).copied()
        }

        fn gid_by_name(&self, name: &str) -> Option<u32> {
            self.groups.get(name).copied()
        }

        fn user_name(&self, uid: u32) -> Option<String> {
            self.users.iter().find(|(_, id)| **id == uid).map(|(n, _)| n.to_string())
        }

        fn group_name(&self, gid: u32) -> Option<String> {
            self.groups.iter().find(|(_, id)| **id == gid).map(|(n, _)| n.to_string())
        }
    }

    fn name_matches(filter: &dyn FileFilter, name: &str) -> bool {
        filter.matches(Path::new(""), OsStr::new(name), &EntryMeta::default())
    }

    fn status_matches(filter: &dyn FileFilter, status: Status) -> bool {
        filter.matches(Path::new(""), OsStr::new(""), &EntryMeta::with_status(status))
    }

    fn with_mode(bits: u32) -> Status {
        Status {
            mode: bits,
            ..Status::default()
        }
    }

    #[test]
    fn test_name_filter() -> FindResult<()> {
        let filter = NameFilter::new("*.txt")?;
        assert!(!name_matches(&filter, ""));
        assert!(name_matches(&filter, "hello.txt"));
        assert!(!name_matches(&filter, "HELLO.TXT"));
        assert!(!name_matches(&filter, "hello.txt.bak"));
        assert_eq!(filter.kind(), CriterionKind::Name);
        Ok(())
    }

    #[test]
    fn test_name_filter_case_insensitive() -> FindResult<()> {
        let filter = NameFilter::new_ignore_case("*.txt")?;
        assert!(!name_matches(&filter, ""));
        assert!(name_matches(&filter, "hello.txt"));
        assert!(name_matches(&filter, "HELLO.TXT"));
        assert!(!name_matches(&filter, "hello.rs"));
        assert_eq!(filter.kind(), CriterionKind::Iname);
        Ok(())
    }

    #[test]
    fn test_name_filter_invalid_pattern() {
        assert!(matches!(
            NameFilter::new("["),
            Err(FindError::PatternError { .. })
        ));
    }

    #[test]
    fn test_regex_filter() -> FindResult<()> {
        assert!(RegexFilter::new("(.*}").is_err());

        let filter = RegexFilter::new(r".*\.txt")?;
        assert!(!name_matches(&filter, ""));
        assert!(name_matches(&filter, "hello.txt"));
        assert!(!name_matches(&filter, "HELLO.TXT"));

        // partial match anywhere in the name
        let filter = RegexFilter::new("ell")?;
        assert!(name_matches(&filter, "hello.txt"));
        Ok(())
    }

    #[test]
    fn test_iregex_filter() -> FindResult<()> {
        assert!(RegexFilter::new_ignore_case("(.*}").is_err());

        let filter = RegexFilter::new_ignore_case(r".*\.txt")?;
        assert!(!name_matches(&filter, ""));
        assert!(name_matches(&filter, "hello.txt"));
        assert!(name_matches(&filter, "HELLO.TXT"));
        assert_eq!(filter.required_tier(), Tier::Path);
        Ok(())
    }

    #[test]
    fn test_type_filter() -> FindResult<()> {
        assert!(matches!(
            TypeFilter::new("w"),
            Err(FindError::InvalidFileType(_))
        ));
        assert_eq!(TypeFilter::new("d")?.required_tier(), Tier::Status);

        let regular = with_mode(FileType::File.mode_bits());
        for code in ["b", "c", "d", "l", "p", "s"] {
            assert!(!status_matches(&TypeFilter::new(code)?, regular), "{code}");
        }
        assert!(status_matches(&TypeFilter::new("f")?, regular));

        for file_type in [
            FileType::Block,
            FileType::Char,
            FileType::Directory,
            FileType::SymbolicLink,
            FileType::Fifo,
            FileType::Socket,
        ] {
            let filter = TypeFilter::new(file_type.code())?;
            assert!(status_matches(&filter, with_mode(file_type.mode_bits() | 0o755)));
        }
        Ok(())
    }

    #[test]
    fn test_owner_filter() -> FindResult<()> {
        let accounts = StaticAccounts::new();
        assert!(matches!(
            OwnerFilter::new("notexist", &accounts),
            Err(FindError::UnknownUser(_))
        ));

        let filter = OwnerFilter::new("root", &accounts)?;
        assert_eq!(filter.required_tier(), Tier::Status);
        assert!(status_matches(&filter, Status::default()));

        let filter = OwnerFilter::new("500", &accounts)?;
        assert!(status_matches(&filter, Status { uid: 500, ..Status::default() }));
        assert!(!status_matches(&filter, Status { uid: 501, ..Status::default() }));
        Ok(())
    }

    #[test]
    fn test_group_filter() -> FindResult<()> {
        let accounts = StaticAccounts::new();
        assert!(matches!(
            GroupFilter::new("notexist", &accounts),
            Err(FindError::UnknownGroup(_))
        ));

        let filter = GroupFilter::new("staff", &accounts)?;
        assert!(status_matches(&filter, Status { gid: 50, ..Status::default() }));
        assert!(!status_matches(&filter, Status::default()));

        let filter = GroupFilter::new("500", &accounts)?;
        assert!(status_matches(&filter, Status { gid: 500, ..Status::default() }));
        Ok(())
    }

    #[test]
    fn test_size_filter() -> FindResult<()> {
        assert!(SizeFilter::new("1s1s").is_err());
        assert_eq!(SizeFilter::new("+1G")?.required_tier(), Tier::Status);

        let sized = |size| Status { size, ..Status::default() };
        assert!(status_matches(&SizeFilter::new("+1k")?, sized(10000)));
        assert!(!status_matches(&SizeFilter::new("+1G")?, sized(10000)));

        let filter = SizeFilter::new("1k")?;
        assert!(status_matches(&filter, sized(1500)));
        assert!(!status_matches(&filter, sized(1023)));
        assert!(!status_matches(&filter, sized(2048)));
        Ok(())
    }

    #[test]
    fn test_mtime_filter() -> FindResult<()> {
        assert!(MtimeFilter::new("4g").is_err());
        assert_eq!(MtimeFilter::new("1d")?.required_tier(), Tier::Status);

        let dated = |mtime| Status { mtime, ..Status::default() };
        assert!(!status_matches(&MtimeFilter::new("1w")?, dated(1)));
        assert!(status_matches(&MtimeFilter::new("1s")?, dated(10_i64.pow(10))));
        assert!(status_matches(&MtimeFilter::new("")?, dated(1)));
        Ok(())
    }

    #[test]
    fn test_mtime_filter_bucket() -> FindResult<()> {
        let now = 1_000_000.0;
        let filter = MtimeFilter::new("1d")?;
        // inside [1d, 2d)
        assert!(filter.matches_at((now - 86400.0 * 1.5) as i64, now));
        assert!(filter.matches_at((now - 86400.0) as i64, now));
        // older than the bucket
        assert!(!filter.matches_at((now - 86400.0 * 2.0) as i64, now));
        assert!(!filter.matches_at((now - 86400.0 * 3.0) as i64, now));
        // younger than the bucket
        assert!(!filter.matches_at(now as i64, now));
        assert!(!filter.matches_at((now - 3600.0) as i64, now));
        assert!(!filter.matches_at((now - 86399.0) as i64, now));
        // dated in the future
        assert!(filter.matches_at((now + 60.0) as i64, now));

        let filter = MtimeFilter::new("0d")?;
        assert!(filter.matches_at(now as i64, now));
        assert!(filter.matches_at((now - 3600.0) as i64, now));
        assert!(!filter.matches_at((now - 86400.0) as i64, now));
        Ok(())
    }

    #[test]
    fn test_grep_filter() -> Result<(), Box<dyn std::error::Error>> {
        assert!(GrepFilter::new("(foo)|(bar}").is_err());
        assert_eq!(GrepFilter::new("(foo)|(bar)")?.required_tier(), Tier::Contents);

        let temp_dir = TempDir::new()?;
        let hello_file: PathBuf = temp_dir.path().join("hello.txt");
        fs::write(&hello_file, "foo")?;
        let meta = EntryMeta::load(&hello_file, Tier::Contents)?;

        let filter = GrepFilter::new("foo")?;
        assert!(filter.matches(temp_dir.path(), OsStr::new("hello.txt"), &meta));

        let filter = GrepFilter::new("bar")?;
        assert!(!filter.matches(temp_dir.path(), OsStr::new("hello.txt"), &meta));
        Ok(())
    }

    #[test]
    fn test_grep_filter_dev_null() -> Result<(), Box<dyn std::error::Error>> {
        let meta = EntryMeta::load(Path::new("/dev/null"), Tier::Contents)?;
        assert!(meta.contents.is_none());

        for pattern in ["foo", "", ".*"] {
            let filter = GrepFilter::new(pattern)?;
            assert!(!filter.matches(Path::new("/dev"), OsStr::new("null"), &meta));
        }
        Ok(())
    }

    #[test]
    fn test_factory_kinds() -> FindResult<()> {
        let accounts = StaticAccounts::new();
        let cases = [
            (CriterionKind::Name, "test_name"),
            (CriterionKind::Iname, "test_name"),
            (CriterionKind::Regex, r".*\.txt"),
            (CriterionKind::Iregex, r".*\.txt"),
            (CriterionKind::Type, "d"),
            (CriterionKind::Owner, "root"),
            (CriterionKind::Group, "root"),
            (CriterionKind::Size, "+1G"),
            (CriterionKind::Mtime, "1d"),
            (CriterionKind::Grep, "foo"),
        ];
        for (kind, value) in cases {
            assert_eq!(FilterFactory::create(kind, value, &accounts)?.kind(), kind);
        }
        Ok(())
    }
}
