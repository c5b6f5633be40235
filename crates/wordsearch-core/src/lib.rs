//! 文件名与文件内容检索核心库
//!
//! 设计要点：
//! - 字面量词（子串包含）与正则（非锚定部分匹配）两套模型，分别作用于文件名与内容行。
//! - 内容正则匹配跳过注释行（首个非空白字符为 `#`），字面量匹配与文件名匹配不受影响。
//! - 单文件错误只降级为日志；只有配置错误或根目录不可用会终止扫描。
//! - 输出为流式 CSV；遍历按文件名排序，并行时按下标重排，保证输出可复现。

mod cancel;
mod config;
mod error;
mod extract;
mod matcher;
mod options;
mod patterns;
mod prefilter;
mod scan;
mod sink;
mod types;
mod walk;

pub use cancel::{cancellation_pair, CancellationHandle, CancellationToken};
pub use config::{RunConfig, LOCAL_CONFIG_FILE};
pub use error::{ConfigError, InvalidPattern, ScanError};
pub use extract::{select_source, ContentSource, LineIter, StringsHelper, TextDecoder};
pub use matcher::{is_comment_line, Matcher};
pub use options::{ExtractMode, ScanOptions, DEFAULT_MAX_CONTENT_SIZE, DEFAULT_OUTPUT_FILE};
pub use patterns::{load_pattern_set, PatternSet};
pub use scan::{run_scan, scan_into, PatternCount, ScanStats, ScanSummary};
pub use sink::{Counters, ResultSink, CSV_HEADER};
pub use types::{MatchRecord, SearchType};
pub use walk::{enumerate_files, normalize_extensions, relative_path, CandidateFile};
