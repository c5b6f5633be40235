//! 内容提取：把单个文件变成惰性的文本行序列
//!
//! 两种策略：
//! - `TextDecoder`：按换行切分并做有损 UTF-8 解码；
//! - `StringsHelper`：调用外部 `strings` 程序抽取可打印字符串，每段视为一行。
//! 运行时通过 `ExtractMode` 选择；外部程序不可用时回退到直接解码。
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::Arc;
use tracing::debug;

use crate::options::ExtractMode;

/// 单个文件的行迭代器（只能前向遍历一次）
pub type LineIter = Box<dyn Iterator<Item = io::Result<String>> + Send>;

/// 二进制判定的采样长度
pub(crate) const SNIFF_LEN: usize = 8192;

/// 内容来源策略
pub trait ContentSource: Send + Sync {
    /// 打开文件并返回行序列；打开失败返回 Err（由调用方降级为“零行”）
    fn lines(&self, path: &Path) -> io::Result<LineIter>;

    /// 是否需要在内容搜索前排除疑似二进制文件
    fn skips_binary(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// 直接文本解码
#[derive(Debug, Default, Clone, Copy)]
pub struct TextDecoder;

struct TextLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R: BufRead> Iterator for TextLines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(0) => None,
            Ok(_) => {
                if self.buf.last() == Some(&b'\n') { self.buf.pop(); }
                if self.buf.last() == Some(&b'\r') { self.buf.pop(); }
                Some(Ok(String::from_utf8_lossy(&self.buf).into_owned()))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

impl ContentSource for TextDecoder {
    fn lines(&self, path: &Path) -> io::Result<LineIter> {
        let file = File::open(path)?;
        Ok(Box::new(TextLines { reader: BufReader::new(file), buf: Vec::with_capacity(256) }))
    }

    fn skips_binary(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "text"
    }
}

/// 外部可打印字符串抽取（`strings -a -n <min>`）
#[derive(Debug, Clone)]
pub struct StringsHelper {
    program: PathBuf,
    min_len: usize,
}

impl StringsHelper {
    /// 探测外部程序是否可用；不可用返回 None
    pub fn probe(program: &Path, min_len: usize) -> Option<Self> {
        let status = Command::new(program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => Some(Self { program: program.to_path_buf(), min_len: min_len.max(1) }),
            Ok(s) => {
                debug!(program = %program.display(), status = %s, "strings helper probe failed");
                None
            }
            Err(e) => {
                debug!(program = %program.display(), error = %e, "strings helper unavailable");
                None
            }
        }
    }
}

/// 子进程输出的行序列；输出读完后检查退出码，迭代器被提前丢弃时回收子进程
struct HelperLines {
    child: Child,
    inner: TextLines<BufReader<ChildStdout>>,
    path: PathBuf,
    finished: bool,
}

impl HelperLines {
    /// 输出结束后等待子进程；非零退出视为本文件读取失败
    fn finish(&mut self) -> io::Result<()> {
        let mut stderr = String::new();
        if let Some(mut err) = self.child.stderr.take() {
            let _ = err.read_to_string(&mut stderr);
        }
        let status = self.child.wait()?;
        if status.success() {
            return Ok(());
        }
        Err(io::Error::other(format!(
            "strings helper exited with {} on {}: {}",
            status,
            self.path.display(),
            stderr.trim()
        )))
    }
}

impl Iterator for HelperLines {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.inner.next() {
            Some(item) => Some(item),
            None => {
                self.finished = true;
                self.finish().err().map(Err)
            }
        }
    }
}

impl Drop for HelperLines {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // 提前结束（取消/出错）时子进程可能仍在写管道
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl ContentSource for StringsHelper {
    fn lines(&self, path: &Path) -> io::Result<LineIter> {
        let mut child = Command::new(&self.program)
            .arg("-a")
            .arg("-n")
            .arg(self.min_len.to_string())
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "strings helper stdout not captured"))?;
        Ok(Box::new(HelperLines {
            child,
            inner: TextLines { reader: BufReader::new(stdout), buf: Vec::with_capacity(256) },
            path: path.to_path_buf(),
            finished: false,
        }))
    }

    fn skips_binary(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "strings"
    }
}

/// 按运行配置选择内容来源；外部程序不可用时回退为直接解码
pub fn select_source(mode: ExtractMode, program: &Path, min_len: usize) -> Arc<dyn ContentSource> {
    match mode {
        ExtractMode::Text => Arc::new(TextDecoder),
        ExtractMode::Strings => match StringsHelper::probe(program, min_len) {
            Some(helper) => Arc::new(helper),
            None => {
                debug!(program = %program.display(), "falling back to direct text decode");
                Arc::new(TextDecoder)
            }
        },
    }
}

/// 判定缓冲区是否为二进制：包含 NUL 字节即视为二进制
pub(crate) fn is_probably_binary(buf: &[u8]) -> bool {
    buf.contains(&0)
}

/// 读取文件开头的采样并判定是否为二进制
pub(crate) fn sniff_binary(path: &Path) -> io::Result<bool> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(SNIFF_LEN);
    file.take(SNIFF_LEN as u64).read_to_end(&mut sample)?;
    Ok(is_probably_binary(&sample))
}
