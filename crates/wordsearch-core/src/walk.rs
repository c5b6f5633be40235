//! 目录遍历：递归枚举候选文件
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// 候选文件
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub full_path: PathBuf,
    pub base_name: String,
    pub size: u64,
}

/// 归一化扩展名过滤项：去掉前导 `.`、小写化、丢弃空项
pub fn normalize_extensions<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// 扩展名（大小写不敏感）是否在集合中；`filter` 须已归一化
pub fn extension_allowed(path: &Path, filter: &[String]) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => {
            let ext = ext.to_lowercase();
            filter.iter().any(|f| *f == ext)
        }
        None => false,
    }
}

/// 枚举 `root` 下全部文件
/// - 条目名等于 `output_name` 的一律排除（目录同样不进入）
/// - 按文件名排序遍历，保证输出顺序可复现
/// - 单个条目不可访问时记录警告并跳过
pub fn enumerate_files(root: &Path, output_name: Option<&str>, extensions: Option<&[String]>) -> Vec<CandidateFile> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| match output_name {
            Some(name) => e.file_name().to_str() != Some(name),
            None => true,
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(path = ?err.path(), error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() { continue; }
        if let Some(filter) = extensions {
            if !extension_allowed(entry.path(), filter) { continue; }
        }
        let size = match entry.metadata() {
            Ok(md) => md.len(),
            Err(err) => {
                warn!(path = %entry.path().display(), error = %err, "cannot stat file, skipping");
                continue;
            }
        };
        let base_name = entry.file_name().to_string_lossy().into_owned();
        files.push(CandidateFile { full_path: entry.into_path(), base_name, size });
    }

    debug!(root = %root.display(), count = files.len(), "enumeration finished");
    files
}

/// 相对根目录的路径，分隔符统一为 `/`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
