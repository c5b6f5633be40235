//! 运行配置文件加载（TOML）
//!
//! 优先级：命令行 > 配置文件 > 内置默认值。所有字段均可省略。
//!
//! ```toml
//! root = "src"
//! terms_file = ".terms_list"
//! regex_file = ".regex_list"
//! output = "search_results.csv"
//! case_sensitive = false
//! extensions = ["txt", "md"]
//! max_content_size = 1048576
//! extract = "strings"
//! threads = 4
//! ```
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::options::{ExtractMode, ScanOptions};
use crate::walk::normalize_extensions;

/// 当前目录下自动识别的配置文件名
pub const LOCAL_CONFIG_FILE: &str = "wordsearch.toml";

/// 运行配置（字段全部可选）
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(default)]
    pub root: Option<PathBuf>,
    #[serde(default)]
    pub terms_file: Option<PathBuf>,
    #[serde(default)]
    pub regex_file: Option<PathBuf>,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub case_sensitive: Option<bool>,
    #[serde(default)]
    pub verbose: Option<bool>,
    #[serde(default)]
    pub extensions: Option<Vec<String>>,
    #[serde(default)]
    pub content_extensions: Option<Vec<String>>,
    /// 0 表示不限
    #[serde(default)]
    pub max_content_size: Option<u64>,
    #[serde(default)]
    pub extract: Option<ExtractMode>,
    #[serde(default)]
    pub strings_program: Option<PathBuf>,
    #[serde(default)]
    pub min_string_len: Option<usize>,
    /// 0 表示自动
    #[serde(default)]
    pub threads: Option<usize>,
}

impl RunConfig {
    /// 从指定 TOML 文件加载
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let txt = std::fs::read_to_string(path).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&txt).map_err(|e| ConfigError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// 显式路径优先；否则当前目录存在 `wordsearch.toml` 时加载；都没有则为空配置
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }
        let local = Path::new(LOCAL_CONFIG_FILE);
        if local.is_file() { Self::load_from(local) } else { Ok(Self::default()) }
    }

    /// 用 `over` 中已设置的字段覆盖自身（命令行合并）
    pub fn merge(mut self, over: RunConfig) -> Self {
        macro_rules! take {
            ($($f:ident),*) => { $( if over.$f.is_some() { self.$f = over.$f; } )* };
        }
        take!(
            root, terms_file, regex_file, output, case_sensitive, verbose, extensions,
            content_extensions, max_content_size, extract, strings_program, min_string_len, threads
        );
        self
    }

    /// 补齐默认值，得到扫描选项
    pub fn into_options(self) -> ScanOptions {
        let d = ScanOptions::default();
        ScanOptions {
            root: self.root.unwrap_or(d.root),
            terms_path: self.terms_file.unwrap_or(d.terms_path),
            regex_path: self.regex_file.or(d.regex_path),
            output_path: self.output.unwrap_or(d.output_path),
            case_sensitive: self.case_sensitive.unwrap_or(d.case_sensitive),
            extensions: self.extensions.map(normalize_extensions).filter(|v| !v.is_empty()),
            content_extensions: self.content_extensions.map(normalize_extensions).filter(|v| !v.is_empty()),
            max_content_size: match self.max_content_size {
                Some(0) => None,
                Some(n) => Some(n),
                None => d.max_content_size,
            },
            extract: self.extract.unwrap_or(d.extract),
            strings_program: self.strings_program.unwrap_or(d.strings_program),
            min_string_len: self.min_string_len.unwrap_or(d.min_string_len),
            threads: self.threads.filter(|n| *n > 0),
        }
    }
}
