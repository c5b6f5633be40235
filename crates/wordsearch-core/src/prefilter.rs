//! 字面量词预筛（Aho-Corasick）
//!
//! - 以去重后的词文本构建全局 AC 自动机，一次遍历即可得到命中的全部词。
//! - 去重文本 -> 词索引列表的反向映射保证重复词仍各自计数。
//! - 大小写不敏感模式下，词与待匹配文本都先做小写化（与区域设置无关）。

use std::borrow::Cow;
use std::collections::HashMap;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// 字面量词匹配计划（只读，可跨线程共享）
#[derive(Debug)]
pub(crate) struct TermPlan {
    /// None 表示没有任何词
    ac: Option<AhoCorasick>,
    /// 去重文本索引 -> 词索引列表（升序）
    text_to_terms: Vec<Vec<usize>>,
    case_insensitive: bool,
}

pub(crate) fn normalize(text: &str, case_insensitive: bool) -> Cow<'_, str> {
    if case_insensitive { Cow::Owned(text.to_lowercase()) } else { Cow::Borrowed(text) }
}

impl TermPlan {
    pub(crate) fn build(terms: &[String], case_insensitive: bool) -> Result<Self, aho_corasick::BuildError> {
        let mut distinct: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut text_to_terms: Vec<Vec<usize>> = Vec::new();

        for (term_idx, term) in terms.iter().enumerate() {
            let key = normalize(term, case_insensitive).into_owned();
            let id = match index.get(&key) {
                Some(id) => *id,
                None => {
                    let id = distinct.len();
                    distinct.push(key.clone());
                    index.insert(key, id);
                    text_to_terms.push(Vec::new());
                    id
                }
            };
            text_to_terms[id].push(term_idx);
        }

        let ac = if distinct.is_empty() {
            None
        } else {
            // 重叠查找要求 Standard 语义
            Some(AhoCorasickBuilder::new().match_kind(MatchKind::Standard).build(&distinct)?)
        };
        Ok(Self { ac, text_to_terms, case_insensitive })
    }

    /// 返回在 `text` 中作为子串出现的全部词索引（升序，每个词至多一次）
    pub(crate) fn matching_terms(&self, text: &str) -> Vec<usize> {
        let ac = match &self.ac { Some(ac) => ac, None => return Vec::new() };
        let hay = normalize(text, self.case_insensitive);

        let mut hit = vec![false; self.text_to_terms.len()];
        let mut remaining = hit.len();
        for m in ac.find_overlapping_iter(hay.as_ref()) {
            let id = m.pattern().as_usize();
            if !hit[id] {
                hit[id] = true;
                remaining -= 1;
                if remaining == 0 { break; }
            }
        }

        let mut out: Vec<usize> = hit
            .iter()
            .enumerate()
            .filter(|(_, h)| **h)
            .flat_map(|(id, _)| self.text_to_terms[id].iter().copied())
            .collect();
        out.sort_unstable();
        out
    }
}
