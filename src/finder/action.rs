//! Output formatting for matched entries

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{FindError, FindResult};
use super::accounts::AccountDb;
use super::metadata::{EntryMeta, Tier};

/// A field `print` can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Path,
    /// Final path component; the whole path when it has none
    Name,
    Size,
    Type,
    Mode,
    Mtime,
    User,
    Group,
    Md5,
}

impl Field {
    pub fn from_name(name: &str) -> FindResult<Self> {
        let field = match name {
            "path" => Field::Path,
            "name" => Field::Name,
            "size" => Field::Size,
            "type" => Field::Type,
            "mode" => Field::Mode,
            "mtime" => Field::Mtime,
            "user" => Field::User,
            "group" => Field::Group,
            "md5" => Field::Md5,
            _ => return Err(FindError::InvalidPrintField(name.to_string())),
        };
        Ok(field)
    }

    pub fn required_tier(self) -> Tier {
        match self {
            Field::Path | Field::Name => Tier::Path,
            Field::Md5 => Tier::Contents,
            _ => Tier::Status,
        }
    }
}

/// A single reported value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Path(PathBuf),
    Text(String),
    Number(u64),
    /// Seconds since the epoch
    Time(i64),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Path(path) => write!(f, "{}", path.display()),
            Value::Text(text) => f.write_str(text),
            Value::Number(n) => write!(f, "{}", n),
            Value::Time(t) => write!(f, "{}", t),
        }
    }
}

/// What the action produces for one entry: a bare value when a single field
/// was requested, otherwise one value per field in request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Scalar(Value),
    Record(Vec<Value>),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Scalar(value) => value.fmt(f),
            Output::Record(values) => {
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\t")?;
                    }
                    value.fmt(f)?;
                }
                Ok(())
            }
        }
    }
}

/// The `print` action
#[derive(Clone)]
pub struct PrintAction {
    fields: Vec<Field>,
    accounts: Arc<dyn AccountDb>,
}

impl fmt::Debug for PrintAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintAction")
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl PrintAction {
    /// Build from a comma or whitespace separated field list.
    ///
    /// An absent or blank list prints the path.
    pub fn new(fields: Option<&str>, accounts: Arc<dyn AccountDb>) -> FindResult<Self> {
        let mut parsed = fields
            .unwrap_or_default()
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|name| !name.is_empty())
            .map(Field::from_name)
            .collect::<FindResult<Vec<_>>>()?;
        if parsed.is_empty() {
            parsed.push(Field::Path);
        }
        Ok(Self {
            fields: parsed,
            accounts,
        })
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn required_tier(&self) -> Tier {
        self.fields
            .iter()
            .map(|field| field.required_tier())
            .max()
            .unwrap_or(Tier::Path)
    }

    /// Format one entry. Status-backed fields of an entry without status
    /// report zero.
    pub fn execute(&self, path: &Path, meta: &EntryMeta) -> Output {
        let mut values: Vec<Value> = self
            .fields
            .iter()
            .map(|field| self.field_value(*field, path, meta))
            .collect();
        if values.len() == 1 {
            Output::Scalar(values.remove(0))
        } else {
            Output::Record(values)
        }
    }

    fn field_value(&self, field: Field, path: &Path, meta: &EntryMeta) -> Value {
        let status = meta.status.unwrap_or_default();
        match field {
            Field::Path => Value::Path(path.to_path_buf()),
            Field::Name => Value::Text(
                path.file_name()
                    .unwrap_or(path.as_os_str())
                    .to_string_lossy()
                    .into_owned(),
            ),
            Field::Size => Value::Number(status.size),
            Field::Type => Value::Text(
                status
                    .file_type()
                    .map(|t| t.code().to_string())
                    .unwrap_or_default(),
            ),
            Field::Mode => Value::Number(u64::from(status.permissions())),
            Field::Mtime => Value::Time(status.mtime),
            Field::User => match self.accounts.user_name(status.uid) {
                Some(name) => Value::Text(name),
                None => Value::Number(u64::from(status.uid)),
            },
            Field::Group => match self.accounts.group_name(status.gid) {
                Some(name) => Value::Text(name),
                None => Value::Number(u64::from(status.gid)),
            },
            Field::Md5 => Value::Text(
                meta.contents
                    .as_deref()
                    .map(|contents| format!("{:x}", md5::compute(contents)))
                    .unwrap_or_default(),
            ),
        }
    }
}
