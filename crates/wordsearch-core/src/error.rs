//! 错误类型
//!
//! 只有配置类错误（ConfigError）与根目录不可用会终止一次扫描；
//! 单文件级别的问题一律在扫描流程内降级为 `warn!` 日志。
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// 单条非法正则（行号为其在正则文件中的 1-based 行号）
#[derive(Debug, Clone)]
pub struct InvalidPattern {
    pub line: usize,
    pub pattern: String,
    pub reason: String,
}

impl fmt::Display for InvalidPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: `{}`: {}", self.line, self.pattern, self.reason)
    }
}

/// 配置错误：在任何扫描开始之前发现，进程应以非零状态退出
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("terms file `{path}` is missing or unreadable: {source}")]
    TermsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no search terms or regex patterns loaded")]
    EmptyPatternSet,
    #[error("invalid regex pattern(s): {}", join_invalid(.0))]
    InvalidPatterns(Vec<InvalidPattern>),
    #[error("run configuration `{path}`: {reason}")]
    ConfigFile { path: PathBuf, reason: String },
}

fn join_invalid(items: &[InvalidPattern]) -> String {
    items.iter().map(|p| p.to_string()).collect::<Vec<_>>().join("; ")
}

/// 扫描整体错误
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("search root `{0}` does not exist or is not a readable directory")]
    RootUnavailable(PathBuf),
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
    #[error("csv write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl ScanError {
    /// 是否属于配置错误（缺少词表、空模式集、非法正则、配置文件无效）
    pub fn is_config_error(&self) -> bool {
        matches!(self, ScanError::Config(_))
    }
}
