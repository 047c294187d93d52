//! Options for file finding
//!
//! This module provides the search specification: an ordered mapping from
//! option names to raw string values, and the registry of option names the
//! finder understands.

use std::fmt;

use crate::errors::{FindError, FindResult};

/// Every criterion option the finder understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CriterionKind {
    Name,
    Iname,
    Regex,
    Iregex,
    Type,
    Owner,
    Group,
    Size,
    Mtime,
    Grep,
}

impl CriterionKind {
    pub const ALL: [CriterionKind; 10] = [
        CriterionKind::Name,
        CriterionKind::Iname,
        CriterionKind::Regex,
        CriterionKind::Iregex,
        CriterionKind::Type,
        CriterionKind::Owner,
        CriterionKind::Group,
        CriterionKind::Size,
        CriterionKind::Mtime,
        CriterionKind::Grep,
    ];

    /// The option name used in a [`SearchSpec`]
    pub fn as_str(self) -> &'static str {
        match self {
            CriterionKind::Name => "name",
            CriterionKind::Iname => "iname",
            CriterionKind::Regex => "regex",
            CriterionKind::Iregex => "iregex",
            CriterionKind::Type => "type",
            CriterionKind::Owner => "owner",
            CriterionKind::Group => "group",
            CriterionKind::Size => "size",
            CriterionKind::Mtime => "mtime",
            CriterionKind::Grep => "grep",
        }
    }
}

impl fmt::Display for CriterionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a single key of a [`SearchSpec`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKey {
    /// Keys starting with `_` are reserved and skipped
    Reserved,
    Criterion(CriterionKind),
    /// The output action (`print`)
    Print,
}

impl OptionKey {
    /// Classify an option name, rejecting empty and unknown names.
    pub fn parse(key: &str) -> FindResult<Self> {
        if key.is_empty() {
            return Err(FindError::EmptyOption);
        }
        if key.starts_with('_') {
            return Ok(OptionKey::Reserved);
        }
        if key == "print" {
            return Ok(OptionKey::Print);
        }
        CriterionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == key)
            .map(OptionKey::Criterion)
            .ok_or_else(|| FindError::UnknownOption(key.to_string()))
    }
}

/// Ordered option mapping a [`Finder`](super::Finder) is built from
///
/// A value of `None` means the option was given without a value. Inserting
/// an existing key replaces its value but keeps its position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSpec {
    entries: Vec<(String, Option<String>)>,
}

impl SearchSpec {
    /// Create an empty specification
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an option with a value
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, Some(value.into()));
        self
    }

    /// Add an option without a value
    pub fn with_default(mut self, key: impl Into<String>) -> Self {
        self.insert(key, None);
        self
    }

    /// Set `key`, replacing any earlier value in place
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Parse a `key=value` expression; a bare `key` has no value
    pub fn push_expression(&mut self, expression: &str) {
        match expression.split_once('=') {
            Some((key, value)) => self.insert(key, Some(value.to_string())),
            None => self.insert(expression, None),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for SearchSpec
where
    K: Into<String>,
    V: Into<Option<String>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut spec = Self::new();
        for (key, value) in iter {
            spec.insert(key, value.into());
        }
        spec
    }
}
