//! 词表与正则列表加载（每行一条，空行与 `#` 注释行忽略）
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ConfigError, InvalidPattern};

/// 列表中的一条有效条目（保留源文件行号，便于报错）
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ListEntry {
    pub(crate) line: usize,
    pub(crate) text: String,
}

/// 字面量词与正则模式两组并列集合；顺序即源文件顺序，重复条目各自独立计数
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    pub terms: Vec<String>,
    pub patterns: Vec<String>,
}

impl PatternSet {
    pub fn new(terms: Vec<String>, patterns: Vec<String>) -> Self {
        Self { terms, patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.patterns.is_empty()
    }
}

/// 解析列表文本：去除首尾空白，跳过空行与 `#` 开头的注释行
pub(crate) fn parse_list(text: &str) -> Vec<ListEntry> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    text.lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let t = raw.trim();
            if t.is_empty() || t.starts_with('#') { return None; }
            Some(ListEntry { line: i + 1, text: t.to_string() })
        })
        .collect()
}

fn read_lossy(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 加载模式集
/// - 词表文件必需：缺失或不可读即配置错误
/// - 正则文件可选：缺失只记日志
/// - 任何非法正则使整次运行失败，并一次性列出全部非法条目
pub fn load_pattern_set(terms_path: &Path, regex_path: Option<&Path>) -> Result<PatternSet, ConfigError> {
    let terms_txt = read_lossy(terms_path).map_err(|source| ConfigError::TermsUnreadable {
        path: terms_path.to_path_buf(),
        source,
    })?;
    let terms: Vec<String> = parse_list(&terms_txt).into_iter().map(|e| e.text).collect();

    let mut regex_entries = Vec::new();
    match regex_path {
        Some(p) => match read_lossy(p) {
            Ok(txt) => regex_entries = parse_list(&txt),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %p.display(), "regex file not found, continuing with literal terms only");
            }
            Err(e) => {
                info!(path = %p.display(), error = %e, "regex file unreadable, continuing with literal terms only");
            }
        },
        None => debug!("no regex file configured"),
    }

    validate_patterns(&regex_entries)?;
    let set = PatternSet::new(terms, regex_entries.into_iter().map(|e| e.text).collect());
    if set.is_empty() {
        return Err(ConfigError::EmptyPatternSet);
    }
    info!(terms = set.terms.len(), patterns = set.patterns.len(), "patterns loaded");
    Ok(set)
}

/// 逐条编译以定位非法正则（编译结果丢弃，真正的匹配器在 Matcher 中统一构建）
pub(crate) fn validate_patterns(entries: &[ListEntry]) -> Result<(), ConfigError> {
    let invalid: Vec<InvalidPattern> = entries
        .iter()
        .filter_map(|e| match regex::Regex::new(&e.text) {
            Ok(_) => None,
            Err(err) => Some(InvalidPattern { line: e.line, pattern: e.text.clone(), reason: err.to_string() }),
        })
        .collect();
    if invalid.is_empty() { Ok(()) } else { Err(ConfigError::InvalidPatterns(invalid)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parse_list_skips_blank_and_comment_lines() {
        let entries = parse_list("\u{feff}alpha\n\n   \n  # note\n#x\n  beta  \r\nalpha\n");
        let texts: Vec<&str> = entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta", "alpha"]);
        assert_eq!(entries[1].line, 6);
    }

    #[test]
    fn missing_terms_file_is_config_error() {
        let dir = tempdir().unwrap();
        let err = load_pattern_set(&dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, ConfigError::TermsUnreadable { .. }));
    }

    #[test]
    fn missing_regex_file_is_not_fatal() {
        let dir = tempdir().unwrap();
        let terms = dir.path().join("terms");
        fs::write(&terms, "password\n").unwrap();
        let set = load_pattern_set(&terms, Some(&dir.path().join("absent"))).unwrap();
        assert_eq!(set.terms, vec!["password"]);
        assert!(set.patterns.is_empty());
    }

    #[test]
    fn comment_only_files_are_an_empty_set() {
        let dir = tempdir().unwrap();
        let terms = dir.path().join("terms");
        let regex = dir.path().join("regex");
        fs::write(&terms, "# nothing\n\n").unwrap();
        fs::write(&regex, "   # still nothing\n").unwrap();
        let err = load_pattern_set(&terms, Some(&regex)).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyPatternSet));
    }

    #[test]
    fn regex_only_run_is_allowed() {
        let dir = tempdir().unwrap();
        let terms = dir.path().join("terms");
        let regex = dir.path().join("regex");
        fs::write(&terms, "").unwrap();
        fs::write(&regex, r"\bsecret_\w+").unwrap();
        let set = load_pattern_set(&terms, Some(&regex)).unwrap();
        assert!(set.terms.is_empty());
        assert_eq!(set.patterns, vec![r"\bsecret_\w+"]);
    }

    #[test]
    fn all_invalid_patterns_are_reported() {
        let dir = tempdir().unwrap();
        let terms = dir.path().join("terms");
        let regex = dir.path().join("regex");
        fs::write(&terms, "x\n").unwrap();
        fs::write(&regex, "ok\\d+\n(unclosed\n# c\n[bad\n").unwrap();
        match load_pattern_set(&terms, Some(&regex)).unwrap_err() {
            ConfigError::InvalidPatterns(items) => {
                let lines: Vec<usize> = items.iter().map(|i| i.line).collect();
                assert_eq!(lines, vec![2, 4]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
