use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use wordsearch_core::{run_scan, CancellationToken, ExtractMode, RunConfig, ScanSummary};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "wordsearch", version, about = "Search file names and file contents for terms and regex patterns")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 递归扫描目录并生成 CSV 结果
    Scan(ScanArgs),
}

#[derive(Parser, Debug)]
struct ScanArgs {
    /// 扫描根目录（默认当前目录）
    #[arg(short = 'p', long = "path")]
    root: Option<PathBuf>,

    /// 词表文件，每行一个字面量词（默认 .terms_list）
    #[arg(short = 't', long)]
    terms: Option<PathBuf>,

    /// 正则文件，每行一个模式（默认 .regex_list，可缺失）
    #[arg(short = 'r', long)]
    regex: Option<PathBuf>,

    /// 输出 CSV 文件（默认 search_results.csv）
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// 大小写敏感匹配（默认不敏感）
    #[arg(short = 'c', long)]
    case_sensitive: bool,

    /// 大小写不敏感匹配（覆盖配置文件中的 case_sensitive = true）
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// 输出调试日志
    #[arg(short = 'v', long)]
    verbose: bool,

    /// 扩展名过滤，逗号分隔（例如 txt,md）；同时作用于文件名与内容
    #[arg(short = 'e', long = "ext")]
    extensions: Option<String>,

    /// 仅作用于内容搜索的扩展名白名单，逗号分隔
    #[arg(long = "content-ext")]
    content_extensions: Option<String>,

    /// 内容搜索的文件大小上限（字节，0 表示不限；默认 10 MiB）
    #[arg(long)]
    max_size: Option<u64>,

    /// 使用外部 strings 程序抽取可打印字符串（可扫描二进制文件）
    #[arg(short = 'b', long)]
    binary_strings: bool,

    /// strings 程序路径
    #[arg(long)]
    strings_program: Option<PathBuf>,

    /// 可打印字符串最小长度
    #[arg(long)]
    min_string_len: Option<usize>,

    /// 线程数（"auto"=CPU 核心数；1 为串行）
    #[arg(short = 'j', long)]
    threads: Option<String>,

    /// 运行配置文件（TOML）；缺省时读取当前目录的 wordsearch.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// 额外写出 JSON 格式的汇总
    #[arg(long)]
    summary_json: Option<PathBuf>,

    /// 汇总后预览的结果行数
    #[arg(long, default_value_t = 5)]
    preview: usize,
}

impl ScanArgs {
    /// 命令行中显式给出的值（未给出的保持 None，交给配置文件或默认值）
    fn to_run_config(&self) -> RunConfig {
        RunConfig {
            root: self.root.clone(),
            terms_file: self.terms.clone(),
            regex_file: self.regex.clone(),
            output: self.output.clone(),
            case_sensitive: match (self.case_sensitive, self.ignore_case) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            },
            verbose: self.verbose.then_some(true),
            extensions: self.extensions.as_deref().map(split_list),
            content_extensions: self.content_extensions.as_deref().map(split_list),
            max_content_size: self.max_size,
            extract: self.binary_strings.then_some(ExtractMode::Strings),
            strings_program: self.strings_program.clone(),
            min_string_len: self.min_string_len,
            threads: self.threads.as_deref().map(|s| parse_threads(s).unwrap_or(0)),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(args) => {
            let file_cfg = RunConfig::discover(args.config.as_deref()).context("load run configuration")?;
            // 初始化日志（RUST_LOG 优先；否则 --verbose 为 debug，默认 info）
            // 需先于参数转换，线程数等解析告警才能输出
            init_tracing(args.verbose || file_cfg.verbose.unwrap_or(false));
            let merged = file_cfg.merge(args.to_run_config());

            let opts = merged.into_options();
            info!(?opts, "resolved scan options");

            let summary = run_scan(&opts, &CancellationToken::never()).context("scan failed")?;

            if let Some(path) = &args.summary_json {
                write_summary_json(path, &summary)?;
            }
            print_summary(&summary);
            print_preview(&summary.output_path, args.preview);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => {
            warn!(value = s, "invalid thread count, using auto");
            None
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

fn write_summary_json(path: &Path, summary: &ScanSummary) -> Result<()> {
    let out = BufWriter::new(File::create(path).with_context(|| format!("create {}", path.display()))?);
    serde_json::to_writer_pretty(out, summary).context("write summary json")?;
    Ok(())
}

fn print_summary(summary: &ScanSummary) {
    let s = &summary.stats;
    let c = &summary.counters;
    println!("Search complete{}", if s.cancelled { " (cancelled)" } else { "" });
    println!("  Files scanned:      {}", s.files_scanned);
    println!("  File name matches:  {}", c.file_name_matches);
    println!("  Content matches:    {}", c.content_matches);
    println!("  Total matches:      {}", c.total);
    println!("  Results written to: {}", summary.output_path.display());

    if !summary.term_counts.is_empty() {
        println!("\nMatches per term:");
        for t in &summary.term_counts {
            println!("  {:>6}  {}", t.count, t.text);
        }
    }
    if !summary.pattern_counts.is_empty() {
        println!("\nMatches per regex pattern:");
        for p in &summary.pattern_counts {
            println!("  {:>6}  {}", p.count, p.text);
        }
    }
}

/// 预览输出文件的前几行（表头 + n 行）
fn print_preview(path: &Path, rows: usize) {
    if rows == 0 { return; }
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open results for preview");
            return;
        }
    };
    println!("\nPreview:");
    for line in BufReader::new(file).lines().take(rows + 1).map_while(|l| l.ok()) {
        println!("  {}", line);
    }
}
