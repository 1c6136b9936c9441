use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use hexspec_core::{
    identify, load_signature_specs, scan_and_write, IdentificationResult, IdentifyError,
    ScanOptions, SignatureTable,
};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// 命令行入口（基于 clap）
#[derive(Parser, Debug)]
#[command(name = "hexspec", version, about = "HexSpec 魔数取证工具（Linux 终端版）")]
struct Cli {
    /// 待分析的文件路径（--batch 模式下为目录）
    file: Option<PathBuf>,

    /// 批量模式：递归扫描目录并输出 JSON 结果
    #[arg(long)]
    batch: bool,

    /// 批量模式输出文件（JSON 数组）
    #[arg(long, default_value = "./result.json")]
    output: PathBuf,

    /// 线程数（批量模式启用并行；"auto"=CPU 核心数）
    #[arg(long, default_value = "auto")]
    threads: String,

    /// 签名文件路径（TOML）；为空则使用内置签名表
    #[arg(long)]
    signatures: Option<PathBuf>,

    /// 关闭 ANSI 颜色输出
    #[arg(long)]
    no_color: bool,
}

/// 终端配色方案（ANSI）。作为配置传入各渲染函数，而非全局状态。
struct ColorScheme {
    green: &'static str,
    blue: &'static str,
    yellow: &'static str,
    red: &'static str,
    cyan: &'static str,
    bold: &'static str,
    reset: &'static str,
}

impl ColorScheme {
    fn ansi() -> Self {
        Self {
            green: "\x1b[92m",
            blue: "\x1b[94m",
            yellow: "\x1b[93m",
            red: "\x1b[91m",
            cyan: "\x1b[96m",
            bold: "\x1b[1m",
            reset: "\x1b[0m",
        }
    }

    fn plain() -> Self {
        Self { green: "", blue: "", yellow: "", red: "", cyan: "", bold: "", reset: "" }
    }
}

fn main() -> Result<()> {
    // 初始化日志（支持通过 RUST_LOG 控制等级，例如 info、debug）
    init_tracing();
    let cli = Cli::parse();
    let colors = if cli.no_color { ColorScheme::plain() } else { ColorScheme::ansi() };

    // 平台门禁：本工具面向 Linux 终端；核心库本身保持可移植
    if !cfg!(target_os = "linux") {
        eprintln!(
            "{}[!] FATAL: hexspec CLI is designed for Linux terminals only.{}",
            colors.red, colors.reset
        );
        std::process::exit(1);
    }

    print_banner(&colors);

    // 无参数时打印帮助并以非零码退出
    let Some(target) = cli.file.clone() else {
        Cli::command().print_help().ok();
        println!();
        std::process::exit(1);
    };

    if cli.batch {
        run_batch(&target, &cli)?;
        println!("\n{}Scan complete.{}\n", colors.green, colors.reset);
        return Ok(());
    }

    // 单文件模式：默认内置签名表，或从 TOML 文件加载
    let table = match &cli.signatures {
        Some(p) => {
            let specs = load_signature_specs(p).context("load signature file")?;
            SignatureTable::from_specs(&specs)
        }
        None => SignatureTable::builtin(),
    };
    debug!(path = %target.display(), table_len = table.len(), "identifying file");

    match identify(&target, &table) {
        Ok(result) => render_result(&result, &colors),
        Err(IdentifyError::NotFound { path }) => {
            eprintln!(
                "{}[-] Error: File not found: {}{}",
                colors.red,
                path.display(),
                colors.reset
            );
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("{}[-] Error reading file: {err}{}", colors.red, colors.reset);
            std::process::exit(1);
        }
    }

    Ok(())
}

/// 批量模式：递归扫描目录，结果以 JSON 数组写入输出文件
fn run_batch(input: &PathBuf, cli: &Cli) -> Result<()> {
    info!(input = %input.display(), output = %cli.output.display(), "starting batch scan");

    // 以缓冲方式打开输出文件，按 JSON 数组流式写入
    let mut out = BufWriter::new(File::create(&cli.output).context("create output file")?);

    // 解析线程参数："auto" 表示自动（等于 CPU 核数）；其他为具体数值
    let threads = parse_threads(&cli.threads);

    let opts = ScanOptions { signatures_path: cli.signatures.clone(), threads };
    let stats = scan_and_write(input, &mut out, &opts).context("scan and write failed")?;
    out.flush().ok();

    info!(
        files_scanned = stats.files_scanned,
        matched = stats.matched,
        spoofed = stats.spoofed,
        errors = stats.errors,
        "batch scan finished"
    );
    Ok(())
}

/// 渲染单文件识别结果（分节输出，与核心结构解耦）
fn render_result(r: &IdentificationResult, c: &ColorScheme) {
    println!("\n{}--- [ FILE METADATA ] ---{}", c.bold, c.reset);
    println!("Path      : {}", r.path.display());
    println!("Size      : {} bytes", r.size_bytes);
    println!("Signature : {}", r.header_hex);

    println!("\n{}--- [ IDENTIFICATION ] ---{}", c.bold, c.reset);
    match &r.matched {
        Some(m) => {
            println!("{}[+] Type Detected : {}{}", c.green, m.description, c.reset);
            println!("{}[+] True Extension: .{}{}", c.green, m.extension, c.reset);
            if r.spoof_detected {
                println!("{}[!] ALERT: Extension spoofing detected!{}", c.red, c.reset);
                println!(
                    "{}    Declared: .{} | Reality: .{}{}",
                    c.red, r.declared_ext, m.extension, c.reset
                );
            }
        }
        None => {
            println!("{}[?] No signature match in local database.{}", c.yellow, c.reset);
            println!(
                "{}    This could be a custom binary or unknown format.{}",
                c.yellow, c.reset
            );
        }
    }

    println!("\n{}--- [ EXTERNAL RESOURCES ] ---{}", c.blue, c.reset);
    println!(" {}*{} OWASP WebGoat:  https://owasp.org/www-project-webgoat/", c.cyan, c.reset);
    println!(" {}*{} HackTheBox:     https://www.hackthebox.com/", c.cyan, c.reset);
    println!(" {}*{} TryHackMe:      https://tryhackme.com/", c.cyan, c.reset);
    println!(" {}*{} MITRE ATT&CK:   https://attack.mitre.org/", c.cyan, c.reset);
    println!("\n{}Scan complete.{}\n", c.green, c.reset);
}

fn print_banner(c: &ColorScheme) {
    println!(
        "{}{}
  _    _             _____
 | |  | |           / ____|
 | |__| | _____  __| (___  _ __   ___  ___
 |  __  |/ _ \\ \\/ / \\___ \\| '_ \\ / _ \\/ __|
 | |  | |  __/>  <  ____) | |_) |  __/ (__
 |_|  |_|\\___/_/\\_\\|_____/| .__/ \\___|\\___|
                          | |
                          |_|
{}{}Forensic Identification Matrix [Linux Edition]{}",
        c.green, c.bold, c.reset, c.cyan, c.reset
    );
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    // 支持通过环境变量 RUST_LOG 控制日志等级，如：RUST_LOG=debug
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(env_filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// 解析线程参数
fn parse_threads(s: &str) -> Option<usize> {
    if s.eq_ignore_ascii_case("auto") { return None; }
    match s.parse::<usize>() {
        Ok(n) if n >= 1 => Some(n),
        _ => None,
    }
}
