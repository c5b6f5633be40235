//! 扫描主流程与并行调度
//!
//! 流程：加载模式 → 遍历 → 逐文件（文件名匹配 → 内容提取 → 逐行匹配）→ 汇总。
//! 并行时由单一 writer 按遍历下标重排后写出，输出与串行完全一致。
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cancel::CancellationToken;
use crate::error::ScanError;
use crate::extract::{select_source, sniff_binary, ContentSource};
use crate::matcher::Matcher;
use crate::options::ScanOptions;
use crate::patterns::{load_pattern_set, PatternSet};
use crate::sink::{name_record, Counters, ResultSink};
use crate::types::{MatchRecord, SearchType};
use crate::walk::{enumerate_files, extension_allowed, relative_path, CandidateFile};

/// 扫描过程统计
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    /// 完成文件名匹配的文件数
    pub files_scanned: usize,
    /// 做过内容搜索的文件数
    pub content_searched: usize,
    /// 因大小/扩展名/二进制被排除内容搜索的文件数
    pub content_skipped: usize,
    /// 内容读取失败（按零行处理）的文件数
    pub read_errors: usize,
    pub cancelled: bool,
}

/// 单个词或正则的命中数
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternCount {
    pub index: usize,
    pub text: String,
    pub count: u64,
}

/// 最终汇总
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub stats: ScanStats,
    pub counters: Counters,
    pub term_counts: Vec<PatternCount>,
    pub pattern_counts: Vec<PatternCount>,
    pub output_path: PathBuf,
}

impl ScanSummary {
    pub fn new(stats: ScanStats, counters: Counters, set: &PatternSet, output_path: PathBuf) -> Self {
        let pair = |texts: &[String], counts: &[u64]| -> Vec<PatternCount> {
            texts
                .iter()
                .zip(counts.iter())
                .enumerate()
                .map(|(index, (text, count))| PatternCount { index, text: text.clone(), count: *count })
                .collect()
        };
        Self {
            term_counts: pair(&set.terms, &counters.per_term),
            pattern_counts: pair(&set.patterns, &counters.per_pattern),
            stats,
            counters,
            output_path,
        }
    }
}

/// 执行一次完整扫描：加载模式、校验根目录、创建输出并写入全部命中
pub fn run_scan(opts: &ScanOptions, cancel: &CancellationToken) -> Result<ScanSummary, ScanError> {
    info!(root = %opts.root.display(), output = %opts.output_path.display(), "starting scan");

    let set = load_pattern_set(&opts.terms_path, opts.regex_path.as_deref())?;
    let matcher = Matcher::new(&set, !opts.case_sensitive)?;

    if !opts.root.is_dir() || std::fs::read_dir(&opts.root).is_err() {
        return Err(ScanError::RootUnavailable(opts.root.clone()));
    }

    let source = select_source(opts.extract, &opts.strings_program, opts.min_string_len);
    debug!(source = source.name(), "content source selected");

    let mut sink = ResultSink::create(&opts.output_path, &set)?;
    let stats = scan_into(opts, &set, Arc::new(matcher), source, &mut sink, cancel)?;
    let (_, counters) = sink.finish()?;

    info!(
        files_scanned = stats.files_scanned,
        total = counters.total,
        file_name_matches = counters.file_name_matches,
        content_matches = counters.content_matches,
        cancelled = stats.cancelled,
        "scan finished"
    );
    Ok(ScanSummary::new(stats, counters, &set, opts.output_path.clone()))
}

/// 遍历 `opts.root` 并把命中写入 `sink`
/// 稳定性保证：遍历按文件名排序；并行结果按下标重排后写出
pub fn scan_into<W: Write>(
    opts: &ScanOptions,
    set: &PatternSet,
    matcher: Arc<Matcher>,
    source: Arc<dyn ContentSource>,
    sink: &mut ResultSink<W>,
    cancel: &CancellationToken,
) -> Result<ScanStats, ScanError> {
    let files = enumerate_files(&opts.root, opts.output_name(), opts.extensions.as_deref());
    info!(count = files.len(), "candidate files collected");

    let mut stats = ScanStats::default();
    let threads = opts.thread_count();

    if threads > 1 && files.len() > 1 {
        scan_parallel(files, opts, set, matcher, source, sink, &mut stats, cancel, threads)?;
    } else {
        let ctx = FileContext { opts, set, matcher: &matcher, source: source.as_ref(), cancel };
        for file in &files {
            if cancel.is_cancelled() { break; }
            let outcome = scan_file(&ctx, file);
            write_outcome(sink, &mut stats, outcome)?;
        }
    }

    stats.cancelled = cancel.is_cancelled();
    if stats.cancelled { warn!(files_scanned = stats.files_scanned, "scan cancelled"); }
    Ok(stats)
}

/// 单文件处理所需的只读上下文
struct FileContext<'a> {
    opts: &'a ScanOptions,
    set: &'a PatternSet,
    matcher: &'a Matcher,
    source: &'a dyn ContentSource,
    cancel: &'a CancellationToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentStatus {
    Searched,
    Skipped,
    Failed,
}

struct FileOutcome {
    records: Vec<MatchRecord>,
    content: ContentStatus,
}

/// 单文件：文件名匹配无条件执行；内容匹配受大小/扩展名/二进制策略约束
/// 任何读取错误都只影响本文件内容，按“零行”处理
fn scan_file(ctx: &FileContext<'_>, file: &CandidateFile) -> FileOutcome {
    let rel = relative_path(&ctx.opts.root, &file.full_path);
    let mut records = Vec::new();

    for idx in ctx.matcher.match_terms(&file.base_name) {
        records.push(name_record(SearchType::FileName, &rel, &file.base_name, idx, &ctx.set.terms[idx]));
    }
    for idx in ctx.matcher.match_regex(&file.base_name) {
        records.push(name_record(SearchType::FileNameRegex, &rel, &file.base_name, idx, &ctx.set.patterns[idx]));
    }

    let content = match content_eligible(ctx, file) {
        Ok(true) => search_content(ctx, file, &rel, &mut records),
        Ok(false) => ContentStatus::Skipped,
        Err(e) => {
            warn!(path = %file.full_path.display(), error = %e, "cannot inspect file content");
            ContentStatus::Failed
        }
    };
    FileOutcome { records, content }
}

fn content_eligible(ctx: &FileContext<'_>, file: &CandidateFile) -> std::io::Result<bool> {
    if let Some(max) = ctx.opts.max_content_size {
        if file.size > max {
            debug!(path = %file.full_path.display(), size = file.size, max, "over size ceiling, name search only");
            return Ok(false);
        }
    }
    if let Some(allow) = &ctx.opts.content_extensions {
        if !extension_allowed(&file.full_path, allow) { return Ok(false); }
    }
    if ctx.source.skips_binary() && sniff_binary(&file.full_path)? {
        debug!(path = %file.full_path.display(), "binary file, name search only");
        return Ok(false);
    }
    Ok(true)
}

fn search_content(ctx: &FileContext<'_>, file: &CandidateFile, rel: &str, records: &mut Vec<MatchRecord>) -> ContentStatus {
    let lines = match ctx.source.lines(&file.full_path) {
        Ok(it) => it,
        Err(e) => {
            warn!(path = %file.full_path.display(), error = %e, "cannot read file content");
            return ContentStatus::Failed;
        }
    };

    for (i, line) in lines.enumerate() {
        if ctx.cancel.is_cancelled() { break; }
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %file.full_path.display(), line = i + 1, error = %e, "read error, stopping this file");
                return ContentStatus::Failed;
            }
        };
        let terms = ctx.matcher.match_terms(&line);
        let regexes = ctx.matcher.match_content_regex(&line);
        if terms.is_empty() && regexes.is_empty() { continue; }

        let text = line.trim();
        let hits = terms
            .into_iter()
            .map(|idx| (SearchType::FileContent, idx, &ctx.set.terms[idx]))
            .chain(regexes.into_iter().map(|idx| (SearchType::FileContentRegex, idx, &ctx.set.patterns[idx])));
        for (search_type, idx, term) in hits {
            records.push(MatchRecord {
                search_type,
                file_path: rel.to_string(),
                file_name: file.base_name.clone(),
                line_number: Some(i + 1),
                pattern_index: idx,
                matched_term: term.clone(),
                matched_text: text.to_string(),
            });
        }
    }
    ContentStatus::Searched
}

fn write_outcome<W: Write>(sink: &mut ResultSink<W>, stats: &mut ScanStats, outcome: FileOutcome) -> Result<(), ScanError> {
    stats.files_scanned += 1;
    match outcome.content {
        ContentStatus::Searched => stats.content_searched += 1,
        ContentStatus::Skipped => stats.content_skipped += 1,
        ContentStatus::Failed => stats.read_errors += 1,
    }
    for r in &outcome.records {
        sink.write_record(r)?;
    }
    Ok(())
}

/// 并行调度：
/// - Rayon 线程池在后台线程内并行处理文件
/// - 当前线程作为唯一 writer，按 idx 重排并流式写出，保证顺序稳定
#[allow(clippy::too_many_arguments)]
fn scan_parallel<W: Write>(
    files: Vec<CandidateFile>,
    opts: &ScanOptions,
    set: &PatternSet,
    matcher: Arc<Matcher>,
    source: Arc<dyn ContentSource>,
    sink: &mut ResultSink<W>,
    stats: &mut ScanStats,
    cancel: &CancellationToken,
    threads: usize,
) -> Result<(), ScanError> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    // None 表示因取消而未处理
    type Msg = (usize, Option<FileOutcome>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
    let opts = opts.clone();
    let set = set.clone();
    let cancel = cancel.clone();
    let files_vec: Vec<(usize, CandidateFile)> = files.into_iter().enumerate().collect();
    debug!(threads, files = files_vec.len(), "parallel scan");

    let scan_thread = std::thread::spawn(move || {
        let ctx = FileContext { opts: &opts, set: &set, matcher: &matcher, source: source.as_ref(), cancel: &cancel };
        // writer 退出（Receiver 被丢弃）后发送失败，工作线程随之停止
        let _ = pool.install(|| {
            files_vec.par_iter().try_for_each(|(idx, file)| {
                let outcome = if ctx.cancel.is_cancelled() { None } else { Some(scan_file(&ctx, file)) };
                tx.send((*idx, outcome)).map_err(|_| ())
            })
        });
        // 结束后 Sender 被丢弃，Receiver 收到关闭信号
    });

    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, Option<FileOutcome>> = BTreeMap::new();
    let mut result = Ok(());

    'recv: while let Ok((idx, outcome)) = rx.recv() {
        buffer.insert(idx, outcome);
        while let Some(outcome) = buffer.remove(&next_idx) {
            next_idx += 1;
            if let Some(outcome) = outcome {
                if let Err(e) = write_outcome(sink, stats, outcome) {
                    result = Err(e);
                    break 'recv;
                }
            }
        }
    }

    drop(rx);
    if scan_thread.join().is_err() {
        warn!("scan worker thread panicked");
    }
    result
}

/// 便于测试：以给定根目录与模式集在内存中扫描，返回 CSV 文本与统计
#[cfg(test)]
pub(crate) fn scan_to_string(opts: &ScanOptions, set: &PatternSet) -> (String, ScanStats, Counters) {
    let matcher = Arc::new(Matcher::new(set, !opts.case_sensitive).unwrap());
    let source = select_source(opts.extract, &opts.strings_program, opts.min_string_len);
    let mut sink = ResultSink::new(Vec::new(), set).unwrap();
    let stats = scan_into(opts, set, matcher, source, &mut sink, &CancellationToken::never()).unwrap();
    let (buf, counters) = sink.finish().unwrap();
    (String::from_utf8(buf).unwrap(), stats, counters)
}
