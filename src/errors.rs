use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for operations that can produce FindError
pub type FindResult<T> = Result<T, FindError>;

/// lazy-find 的自定义错误类型
///
/// 构建期错误会阻止 `Finder` 的创建；遍历期错误只会被记录到日志，
/// 对应的条目被跳过。
#[derive(Debug, Error)]
pub enum FindError {
    /// 选项名为空
    #[error("选项名不能为空")]
    EmptyOption,

    /// 未知选项
    #[error("未知选项: {0}")]
    UnknownOption(String),

    /// 选项缺少取值
    #[error("选项缺少取值: {0}")]
    MissingValue(String),

    /// 时间间隔格式错误
    #[error("无效的时间间隔: {0:?}")]
    InvalidInterval(String),

    /// 文件大小格式错误
    #[error("无效的文件大小: {0:?}")]
    InvalidSize(String),

    /// 模式匹配错误
    #[error("模式匹配错误: {message}")]
    PatternError { message: String },

    /// 无效的文件类型
    #[error("无效的文件类型: {0}")]
    InvalidFileType(String),

    /// 无法解析的用户名
    #[error("未知用户: {0}")]
    UnknownUser(String),

    /// 无法解析的组名
    #[error("未知用户组: {0}")]
    UnknownGroup(String),

    /// 无效的输出字段
    #[error("无效的输出字段: {0}")]
    InvalidPrintField(String),

    /// 文件未找到
    #[error("文件未找到: {}", .0.display())]
    FileNotFound(PathBuf),

    /// 权限不足
    #[error("权限不足: {}", .0.display())]
    PermissionDenied(PathBuf),

    /// 文件系统错误（其他IO错误）
    #[error("文件系统错误 {}: {source}", .path.display())]
    FilesystemError {
        #[source]
        source: io::Error,
        path: PathBuf,
    },

    /// 遍历目录时的错误
    #[error("目录遍历错误: {0}")]
    WalkDirError(String),
}

impl FindError {
    /// 将带路径的 IO 错误按错误种类归类
    pub fn io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FindError::FileNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FindError::PermissionDenied(path.to_path_buf()),
            _ => FindError::FilesystemError {
                source: err,
                path: path.to_path_buf(),
            },
        }
    }
}

impl From<walkdir::Error> for FindError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
        match err.io_error() {
            Some(io_err) => {
                let kind = io_err.kind();
                FindError::io(&path, io::Error::new(kind, io_err.to_string()))
            }
            None => FindError::WalkDirError(err.to_string()),
        }
    }
}
