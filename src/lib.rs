//! 声明式的文件查找库
//!
//! 本库根据一个有序的选项映射在目录树中查找条目，功能类似 `find`：
//! - 名称、正则、类型、属主、属组、大小、修改时间、内容等过滤条件
//! - 按需获取元数据（路径 → 状态 → 内容），不做多余的 IO
//! - 惰性、可重复的结果迭代器
//! - 可定制的输出字段（path、size、mode、md5 等）
//!
//! ## 使用场景
//!
//! - 在项目中查找特定类型的文件
//! - 清理过时或大文件
//! - 作为远程任务的文件查询后端
//!
//! # 示例
//!
//! 基本用法：
//! ```no_run
//! use lazy_find::{Finder, SearchSpec};
//!
//! let spec = SearchSpec::new()
//!     .with("name", "*.rs")      // 文件名通配符
//!     .with("type", "f")         // 只要普通文件
//!     .with("print", "path size");
//!
//! let finder = Finder::new(&spec).unwrap();
//!
//! for record in finder.find(".") {
//!     println!("{}", record);
//! }
//! ```
//!
//! 更多用法请参考各模块文档。

pub mod cli;
pub mod errors;
pub mod finder;

// Re-export main types for convenience
pub use errors::{FindError, FindResult};
pub use finder::{Finder, Output, SearchSpec, Value};
