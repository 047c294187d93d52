//! 文件查找模块
//!
//! `Finder` 由一个有序的选项映射构建：每个条件选项变成一个过滤器，
//! `print` 选项决定输出字段。查找是惰性的，并且只获取当前条件真正
//! 需要的元数据层级（路径 → 状态 → 内容）。

pub mod accounts;
pub mod action;
pub mod filter;
pub mod metadata;
pub mod options;
pub mod parse;
mod walker;

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use log::{debug, warn};
use walkdir::DirEntry;

use crate::errors::{FindError, FindResult};

pub use self::accounts::{AccountDb, SystemAccounts};
pub use self::action::{Field, Output, PrintAction, Value};
pub use self::filter::{FileFilter, FilterFactory};
pub use self::metadata::{EntryMeta, FileType, Status, Tier};
pub use self::options::{CriterionKind, OptionKey, SearchSpec};
pub use self::walker::FileWalkerIterator;

/// 文件查找器
///
/// 构建后不可变，可以在多个线程间共享并重复调用 [`Finder::find`]。
#[derive(Debug)]
pub struct Finder {
    criteria: Vec<Box<dyn FileFilter>>,
    action: PrintAction,
    required_tier: Tier,
}

impl Finder {
    /// 使用系统用户/组数据库创建查找器
    pub fn new(spec: &SearchSpec) -> FindResult<Self> {
        Self::with_accounts(spec, Arc::new(SystemAccounts))
    }

    /// 使用给定的用户/组数据库创建查找器
    ///
    /// 先校验所有选项名，全部合法后才构建过滤器，因此未知选项不会
    /// 触发任何账户查询或文件系统访问。
    pub fn with_accounts(spec: &SearchSpec, accounts: Arc<dyn AccountDb>) -> FindResult<Self> {
        let mut keyed = Vec::with_capacity(spec.len());
        for (key, value) in spec.iter() {
            match OptionKey::parse(key)? {
                OptionKey::Reserved => {}
                OptionKey::Criterion(kind) => {
                    let value = value.ok_or_else(|| FindError::MissingValue(key.to_string()))?;
                    keyed.push((OptionKey::Criterion(kind), Some(value)));
                }
                OptionKey::Print => keyed.push((OptionKey::Print, value)),
            }
        }

        let mut criteria = Vec::new();
        let mut print_fields = None;
        for (key, value) in keyed {
            match key {
                OptionKey::Criterion(kind) => {
                    let filter = FilterFactory::create(kind, value.unwrap_or_default(), accounts.as_ref())?;
                    debug!("条件 {}: {}", kind, filter.description());
                    criteria.push(filter);
                }
                // 多次出现时以最后一次为准
                OptionKey::Print => print_fields = Some(value),
                OptionKey::Reserved => {}
            }
        }

        let action = PrintAction::new(print_fields.flatten(), accounts)?;
        let required_tier = criteria
            .iter()
            .map(|c| c.required_tier())
            .chain(std::iter::once(action.required_tier()))
            .max()
            .unwrap_or(Tier::Path);
        debug!("输出字段 {:?}, 元数据层级 {:?}", action.fields(), required_tier);

        Ok(Self {
            criteria,
            action,
            required_tier,
        })
    }

    /// 已配置条件的种类，按配置顺序
    pub fn criteria(&self) -> Vec<CriterionKind> {
        self.criteria.iter().map(|c| c.kind()).collect()
    }

    /// 输出动作
    pub fn action(&self) -> &PrintAction {
        &self.action
    }

    /// 所有条件与动作所需的最高元数据层级
    pub fn required_tier(&self) -> Tier {
        self.required_tier
    }

    /// 在指定路径下惰性查找
    ///
    /// 每次调用都是一次独立的遍历；丢弃迭代器即可停止查找。
    pub fn find<P: AsRef<Path>>(&self, root: P) -> Matches<'_> {
        debug!("在路径中搜索: {}", root.as_ref().display());
        Matches {
            finder: self,
            walker: FileWalkerIterator::new(root),
        }
    }

    fn evaluate(&self, entry: &DirEntry) -> Option<Output> {
        let mut meta = EntryMeta::default();
        self.evaluate_entry(entry.path(), entry.file_name(), &mut meta)
    }

    /// 对单个条目求值，不匹配或读取失败时返回 None
    ///
    /// 元数据按条件顺序逐层获取，某个条件失败后不再获取更高层级。
    fn evaluate_entry(&self, path: &Path, name: &OsStr, meta: &mut EntryMeta) -> Option<Output> {
        let dir = path.parent().unwrap_or_else(|| Path::new(""));

        for criterion in &self.criteria {
            if let Err(err) = self.fetch(meta, path, criterion.required_tier()) {
                warn!("跳过: {}", FindError::io(path, err));
                return None;
            }
            if !criterion.matches(dir, name, meta) {
                return None;
            }
        }

        let tier = self.action.required_tier();
        if tier >= Tier::Status && meta.status.is_none() {
            if let Err(err) = self.fetch(meta, path, Tier::Status) {
                warn!("跳过: {}", FindError::io(path, err));
                return None;
            }
        }
        if tier >= Tier::Contents {
            // md5 等字段在内容不可读时输出空值，而不是跳过条目
            if let Err(err) = self.fetch(meta, path, Tier::Contents) {
                debug!("无法读取内容: {}", FindError::io(path, err));
            }
        }

        Some(self.action.execute(path, meta))
    }

    fn fetch(&self, meta: &mut EntryMeta, path: &Path, tier: Tier) -> std::io::Result<()> {
        if self.required_tier == Tier::Path {
            return Ok(());
        }
        meta.fetch(path, tier.min(self.required_tier))
    }
}

/// [`Finder::find`] 返回的惰性结果序列
pub struct Matches<'a> {
    finder: &'a Finder,
    walker: FileWalkerIterator,
}

impl Iterator for Matches<'_> {
    type Item = Output;

    fn next(&mut self) -> Option<Self::Item> {
        for entry in self.walker.by_ref() {
            if let Some(output) = self.finder.evaluate(&entry) {
                return Some(output);
            }
        }
        None
    }
}
