//! lazy-find 的命令行接口
//!
//! 本模块提供了命令行参数解析和验证功能，
//! 并把 `-e KEY=VALUE` 表达式转换为查找选项。

use clap::Parser;
use crate::errors::FindError;
use crate::finder::options::SearchSpec;

/// 声明式文件查找工具
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 搜索路径（默认：当前目录）
    #[arg(default_value = ".")]
    pub paths: Vec<String>,

    /// 查找选项，形如 KEY=VALUE（如 name=*.txt、size=+1k、print="path size"），按给出顺序求值
    #[arg(short = 'e', long = "expr", value_name = "KEY[=VALUE]")]
    pub expressions: Vec<String>,

    /// 启用调试日志
    #[arg(short, long)]
    pub debug: bool,

    /// 并行搜索多个路径
    #[arg(short = 'p', long)]
    pub parallel: bool,
}

impl Cli {
    /// 构建查找选项
    pub fn build_spec(&self) -> SearchSpec {
        let mut spec = SearchSpec::new();
        for expression in &self.expressions {
            spec.push_expression(expression);
        }
        spec
    }

    /// 验证命令行参数
    pub fn validate(&self) -> Result<(), FindError> {
        for path in &self.paths {
            if !std::path::Path::new(path).exists() {
                return Err(FindError::FileNotFound(std::path::PathBuf::from(path)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(paths: &[&str], expressions: &[&str]) -> Cli {
        Cli {
            paths: paths.iter().map(|p| p.to_string()).collect(),
            expressions: expressions.iter().map(|e| e.to_string()).collect(),
            debug: false,
            parallel: false,
        }
    }

    #[test]
    fn test_cli_validation() {
        assert!(cli(&["."], &["name=*.rs"]).validate().is_ok());
    }

    #[test]
    fn test_cli_invalid_path() {
        assert!(cli(&["non_existent_path"], &[]).validate().is_err());
    }

    #[test]
    fn test_cli_build_spec() {
        let spec = cli(&["."], &["type=f", "name=*.txt", "print=path size"]).build_spec();
        let entries: Vec<_> = spec.iter().collect();
        assert_eq!(
            entries,
            [
                ("type", Some("f")),
                ("name", Some("*.txt")),
                ("print", Some("path size")),
            ]
        );
    }

    #[test]
    fn test_cli_parse_args() {
        let parsed = Cli::parse_from(["lazy-find", "/tmp", "-e", "name=*.txt", "--expr", "print", "-p"]);
        assert_eq!(parsed.paths, ["/tmp"]);
        assert_eq!(parsed.expressions, ["name=*.txt", "print"]);
        assert!(parsed.parallel);
        assert!(!parsed.debug);
    }
}
