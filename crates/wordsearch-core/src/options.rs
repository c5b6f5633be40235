//! 扫描选项（模块）
use serde::Deserialize;
use std::path::PathBuf;

/// 默认词表文件
pub const DEFAULT_TERMS_FILE: &str = ".terms_list";
/// 默认正则文件（可选）
pub const DEFAULT_REGEX_FILE: &str = ".regex_list";
/// 默认输出文件
pub const DEFAULT_OUTPUT_FILE: &str = "search_results.csv";
/// 内容搜索的默认大小上限（字节）
pub const DEFAULT_MAX_CONTENT_SIZE: u64 = 10 * 1024 * 1024; // 10 MiB
/// 可打印字符串的默认最小长度
pub const DEFAULT_MIN_STRING_LEN: usize = 4;

/// 内容提取策略
/// - Text：按行直接解码，疑似二进制的文件不做内容搜索。
/// - Strings：调用外部 `strings` 抽取可打印字符串（不可用时回退为 Text）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    #[default]
    Text,
    Strings,
}

/// 扫描选项
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// 扫描根目录
    pub root: PathBuf,
    /// 词表文件（必需）
    pub terms_path: PathBuf,
    /// 正则文件（可选，缺失仅记日志）
    pub regex_path: Option<PathBuf>,
    /// 输出 CSV 路径；同名条目不参与扫描
    pub output_path: PathBuf,
    /// 大小写敏感（默认不敏感）
    pub case_sensitive: bool,
    /// 扩展名过滤（作用于文件名与内容两个阶段），已归一化
    pub extensions: Option<Vec<String>>,
    /// 仅作用于内容阶段的扩展名白名单，已归一化
    pub content_extensions: Option<Vec<String>>,
    /// 内容搜索的文件大小上限；None 表示不限
    pub max_content_size: Option<u64>,
    pub extract: ExtractMode,
    /// 外部 strings 程序
    pub strings_program: PathBuf,
    pub min_string_len: usize,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            terms_path: PathBuf::from(DEFAULT_TERMS_FILE),
            regex_path: Some(PathBuf::from(DEFAULT_REGEX_FILE)),
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            case_sensitive: false,
            extensions: None,
            content_extensions: None,
            max_content_size: Some(DEFAULT_MAX_CONTENT_SIZE),
            extract: ExtractMode::Text,
            strings_program: PathBuf::from("strings"),
            min_string_len: DEFAULT_MIN_STRING_LEN,
            threads: None,
        }
    }
}

impl ScanOptions {
    /// 输出文件的文件名（用于遍历时排除）
    pub fn output_name(&self) -> Option<&str> {
        self.output_path.file_name().and_then(|s| s.to_str())
    }

    pub(crate) fn thread_count(&self) -> usize {
        self.threads.filter(|n| *n >= 1).unwrap_or_else(num_cpus::get)
    }
}
