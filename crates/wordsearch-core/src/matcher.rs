//! 匹配器：字面量词（子串包含）与正则（非锚定部分匹配）
//!
//! 内容正则匹配跳过首个非空白字符为 `#` 的行；该规则不作用于
//! 内容字面量匹配，也不作用于任何文件名匹配。
use regex::{RegexSet, RegexSetBuilder};

use crate::error::{ConfigError, InvalidPattern};
use crate::patterns::PatternSet;
use crate::prefilter::TermPlan;

/// 编译后的匹配器（只读，可跨线程共享）
#[derive(Debug)]
pub struct Matcher {
    terms: TermPlan,
    regexes: RegexSet,
}

/// 首个非空白字符为 `#` 的行视为注释行
pub fn is_comment_line(line: &str) -> bool {
    line.trim_start().starts_with('#')
}

impl Matcher {
    /// 依据模式集构建匹配器；正则统一编译一次
    pub fn new(set: &PatternSet, case_insensitive: bool) -> Result<Self, ConfigError> {
        let terms = TermPlan::build(&set.terms, case_insensitive).map_err(|e| {
            ConfigError::InvalidPatterns(vec![InvalidPattern {
                line: 0,
                pattern: "<literal terms>".to_string(),
                reason: e.to_string(),
            }])
        })?;
        let regexes = RegexSetBuilder::new(&set.patterns)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| {
                ConfigError::InvalidPatterns(vec![InvalidPattern {
                    line: 0,
                    pattern: "<regex set>".to_string(),
                    reason: e.to_string(),
                }])
            })?;
        Ok(Self { terms, regexes })
    }

    /// 命中的字面量词索引（升序）
    pub fn match_terms(&self, text: &str) -> Vec<usize> {
        self.terms.matching_terms(text)
    }

    /// 命中的正则索引（升序）
    pub fn match_regex(&self, text: &str) -> Vec<usize> {
        if self.regexes.len() == 0 { return Vec::new(); }
        self.regexes.matches(text).into_iter().collect()
    }

    /// 内容行的正则匹配：注释行直接跳过
    pub fn match_content_regex(&self, line: &str) -> Vec<usize> {
        if is_comment_line(line) { return Vec::new(); }
        self.match_regex(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(terms: &[&str], patterns: &[&str], ci: bool) -> Matcher {
        let set = PatternSet::new(
            terms.iter().map(|s| s.to_string()).collect(),
            patterns.iter().map(|s| s.to_string()).collect(),
        );
        Matcher::new(&set, ci).unwrap()
    }

    #[test]
    fn case_insensitive_term_matches_file_name() {
        let m = matcher(&["ABC"], &[], true);
        assert_eq!(m.match_terms("file_abc_report.txt"), vec![0]);
    }

    #[test]
    fn case_sensitive_term_does_not_match() {
        let m = matcher(&["ABC"], &[], false);
        assert!(m.match_terms("file_abc_report.txt").is_empty());
    }

    #[test]
    fn regex_case_mode_uses_engine_flag() {
        let ci = matcher(&[], &[r"secret_\w+"], true);
        assert_eq!(ci.match_regex("SECRET_xyz"), vec![0]);
        let cs = matcher(&[], &[r"secret_\w+"], false);
        assert!(cs.match_regex("SECRET_xyz").is_empty());
    }

    #[test]
    fn regex_is_unanchored() {
        let m = matcher(&[], &[r"\d{3}", "^start"], false);
        assert_eq!(m.match_regex("abc 12345 def"), vec![0]);
        assert_eq!(m.match_regex("start 999"), vec![0, 1]);
    }

    #[test]
    fn comment_lines_skip_content_regex_only() {
        let m = matcher(&["password"], &[r"password"], true);
        let line = "   # password = hunter2";
        assert!(m.match_content_regex(line).is_empty());
        assert_eq!(m.match_terms(line), vec![0]);
        // 文件名匹配不受注释规则影响
        assert_eq!(m.match_regex("#password.txt"), vec![0]);
    }

    #[test]
    fn hash_later_in_line_is_not_a_comment() {
        assert!(!is_comment_line("value # trailing"));
        assert!(is_comment_line("\t#"));
        assert!(!is_comment_line(""));
    }

    #[test]
    fn duplicate_patterns_fire_independently() {
        let m = matcher(&[], &["a+", "a+"], false);
        assert_eq!(m.match_regex("caat"), vec![0, 1]);
    }
}
