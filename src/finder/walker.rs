//! 文件系统遍历功能
//!
//! 本模块提供惰性的深度优先遍历：根目录本身不会产出（根路径是普通文件时
//! 除外），遍历过程中的错误只记录日志并跳过，不会中断兄弟条目或其他子树。

use std::path::Path;
use log::warn;
use walkdir::{DirEntry, WalkDir};

use crate::errors::FindError;

/// 基于迭代器的文件系统遍历器
pub struct FileWalkerIterator {
    inner: walkdir::IntoIter,
    skip_root: bool,
}

impl FileWalkerIterator {
    /// 使用给定路径创建新的 FileWalkerIterator
    ///
    /// 不跟随符号链接，目录项顺序与底层 readdir 一致。
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let walker = WalkDir::new(path).follow_links(false);

        Self {
            inner: walker.into_iter(),
            skip_root: false,
        }
    }
}

impl Iterator for FileWalkerIterator {
    type Item = DirEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next()? {
                Ok(entry) => {
                    if let Some(entry) = self.process_entry(entry) {
                        return Some(entry);
                    }
                }
                Err(err) => self.handle_error(err),
            }
        }
    }
}

impl FileWalkerIterator {
    /// 处理目录条目，跳过作为根的目录
    fn process_entry(&mut self, entry: DirEntry) -> Option<DirEntry> {
        if !self.skip_root {
            self.skip_root = true;
            if entry.depth() == 0 && entry.file_type().is_dir() {
                return None;
            }
        }
        Some(entry)
    }

    /// 记录遍历错误；出错的条目或子树被跳过，遍历继续
    fn handle_error(&mut self, err: walkdir::Error) {
        if err.depth() == 0 {
            // 根路径本身不可用，之后不会再有条目
            self.skip_root = true;
        }
        warn!("跳过: {}", FindError::from(err));
    }
}
