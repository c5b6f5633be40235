//! 公共类型（对外暴露）

/// 命中类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchType {
    FileName,
    FileNameRegex,
    FileContent,
    FileContentRegex,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::FileName => "FileName",
            SearchType::FileNameRegex => "FileNameRegex",
            SearchType::FileContent => "FileContent",
            SearchType::FileContentRegex => "FileContentRegex",
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, SearchType::FileNameRegex | SearchType::FileContentRegex)
    }

    pub fn is_content(&self) -> bool {
        matches!(self, SearchType::FileContent | SearchType::FileContentRegex)
    }
}

/// 单次命中（对应输出 CSV 的一行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub search_type: SearchType,
    /// 相对根目录、`/` 分隔
    pub file_path: String,
    pub file_name: String,
    /// 文件名命中为 None；内容命中为 1-based 行号
    pub line_number: Option<usize>,
    /// 词或正则在各自列表中的下标（计数用）
    pub pattern_index: usize,
    pub matched_term: String,
    /// 文件名，或去除首尾空白后的命中行
    pub matched_text: String,
}
