//! 结果输出（CSV）与计数
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ScanError;
use crate::patterns::PatternSet;
use crate::types::{MatchRecord, SearchType};

/// 表头（不加引号，原样写出）
pub const CSV_HEADER: &str = "SearchType,FilePath,FileName,LineNumber,MatchedTerm,MatchedText";

/// 聚合计数与按下标的明细计数
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub total: u64,
    pub file_name_matches: u64,
    pub content_matches: u64,
    /// 下标与 PatternSet::terms 一一对应
    pub per_term: Vec<u64>,
    /// 下标与 PatternSet::patterns 一一对应
    pub per_pattern: Vec<u64>,
}

impl Counters {
    pub fn new(terms: usize, patterns: usize) -> Self {
        Self { per_term: vec![0; terms], per_pattern: vec![0; patterns], ..Self::default() }
    }

    pub(crate) fn record(&mut self, r: &MatchRecord) {
        self.total += 1;
        if r.search_type.is_content() { self.content_matches += 1; } else { self.file_name_matches += 1; }
        let slot = if r.search_type.is_regex() {
            self.per_pattern.get_mut(r.pattern_index)
        } else {
            self.per_term.get_mut(r.pattern_index)
        };
        if let Some(c) = slot { *c += 1; }
    }
}

/// 追加式 CSV 输出：先写表头，之后每条命中一行，全部字段加引号
pub struct ResultSink<W: Write> {
    writer: csv::Writer<W>,
    counters: Counters,
}

impl ResultSink<BufWriter<File>> {
    /// 创建（截断）输出文件并写入表头
    pub fn create(path: &Path, set: &PatternSet) -> Result<Self, ScanError> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file), set)?)
    }
}

impl<W: Write> ResultSink<W> {
    pub fn new(mut inner: W, set: &PatternSet) -> std::io::Result<Self> {
        writeln!(inner, "{}", CSV_HEADER)?;
        let writer = csv::WriterBuilder::new()
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Ok(Self { writer, counters: Counters::new(set.terms.len(), set.patterns.len()) })
    }

    /// 写出一条命中；内嵌双引号由 CSV 写入器加倍转义
    pub fn write_record(&mut self, r: &MatchRecord) -> Result<(), csv::Error> {
        let line = r.line_number.map(|n| n.to_string()).unwrap_or_default();
        self.writer.write_record([
            r.search_type.as_str(),
            r.file_path.as_str(),
            r.file_name.as_str(),
            line.as_str(),
            r.matched_term.as_str(),
            r.matched_text.as_str(),
        ])?;
        self.counters.record(r);
        Ok(())
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    /// 冲刷并交还底层写入器与最终计数
    pub fn finish(mut self) -> Result<(W, Counters), ScanError> {
        self.writer.flush()?;
        let inner = self.writer.into_inner().map_err(|e| ScanError::Output(e.into_error()))?;
        Ok((inner, self.counters))
    }
}

/// 便于构造文件名命中
pub(crate) fn name_record(search_type: SearchType, file_path: &str, file_name: &str, idx: usize, term: &str) -> MatchRecord {
    MatchRecord {
        search_type,
        file_path: file_path.to_string(),
        file_name: file_name.to_string(),
        line_number: None,
        pattern_index: idx,
        matched_term: term.to_string(),
        matched_text: file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> PatternSet {
        PatternSet::new(vec!["TODO".into(), "password".into()], vec![r"\bsecret_\w+".into()])
    }

    fn render(records: &[MatchRecord]) -> (String, Counters) {
        let mut sink = ResultSink::new(Vec::new(), &set()).unwrap();
        for r in records {
            sink.write_record(r).unwrap();
        }
        let (buf, counters) = sink.finish().unwrap();
        (String::from_utf8(buf).unwrap(), counters)
    }

    #[test]
    fn header_is_written_before_any_record() {
        let (out, counters) = render(&[]);
        assert_eq!(out, format!("{CSV_HEADER}\n"));
        assert_eq!(counters, Counters::new(2, 1));
    }

    #[test]
    fn name_rows_have_empty_line_number() {
        let r = name_record(SearchType::FileName, "docs/TODO_list.md", "TODO_list.md", 0, "TODO");
        let (out, _) = render(&[r]);
        let row = out.lines().nth(1).unwrap();
        assert_eq!(row, r#""FileName","docs/TODO_list.md","TODO_list.md","","TODO","TODO_list.md""#);
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let r = MatchRecord {
            search_type: SearchType::FileContent,
            file_path: "a.txt".into(),
            file_name: "a.txt".into(),
            line_number: Some(3),
            pattern_index: 1,
            matched_term: "password".into(),
            matched_text: r#"password = "abc""#.into(),
        };
        let (out, _) = render(&[r]);
        assert_eq!(
            out.lines().nth(1).unwrap(),
            r#""FileContent","a.txt","a.txt","3","password","password = ""abc""""#
        );
    }

    #[test]
    fn counters_split_by_kind_and_index() {
        let mut content = name_record(SearchType::FileContentRegex, "c.txt", "c.txt", 0, r"\bsecret_\w+");
        content.line_number = Some(1);
        let records = vec![
            name_record(SearchType::FileName, "TODO.md", "TODO.md", 0, "TODO"),
            name_record(SearchType::FileNameRegex, "secret_x", "secret_x", 0, r"\bsecret_\w+"),
            content,
        ];
        let (_, c) = render(&records);
        assert_eq!(c.total, 3);
        assert_eq!(c.file_name_matches, 2);
        assert_eq!(c.content_matches, 1);
        assert_eq!(c.per_term, vec![1, 0]);
        assert_eq!(c.per_pattern, vec![2]);
        assert_eq!(c.file_name_matches + c.content_matches, c.total);
    }
}
