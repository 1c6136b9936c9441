//! 批量扫描主流程与并行调度
use anyhow::Result;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use crate::engine::identify;
use crate::error::IdentifyError;
use crate::options::{ScanOptions, ScanStats};
use crate::report::IdentificationResult;
use crate::signatures::{load_signature_specs, SignatureTable};

/// 扫描目录并将识别结果以 JSON 数组流式写入 `out`
/// 稳定性保证：
/// - 先收集文件并按路径排序，确保输出顺序可复现；
/// - 单个文件识别失败（NotFound/Io）计入 stats.errors 并继续下一个文件，
///   不中断整体扫描。
pub fn scan_and_write(input_dir: &Path, out: &mut dyn Write, opts: &ScanOptions) -> Result<ScanStats> {
    // 签名表：默认内置，或由 TOML 签名文件替换
    let table = match &opts.signatures_path {
        Some(p) => SignatureTable::from_specs(&load_signature_specs(p)?),
        None => SignatureTable::builtin(),
    };
    let table = Arc::new(table);

    let mut stats = ScanStats::default();

    let mut files: Vec<PathBuf> = vec![];
    // 递归遍历输入目录，仅收集普通文件；
    // 结果需写入 JSON，非 UTF-8 路径直接跳过
    for entry in WalkDir::new(input_dir).min_depth(1) {
        let entry = match entry { Ok(e) => e, Err(_) => continue };
        if !entry.file_type().is_file() { continue; }
        if entry.path().to_str().is_none() { continue; }
        files.push(entry.into_path());
    }
    // 按路径排序，确保输出顺序稳定
    files.sort();

    // 决策：线程数 > 1 且文件多于一个时走并行调度；否则串行
    let threads = opts.threads.unwrap_or_else(num_cpus::get);
    if threads > 1 && files.len() > 1 {
        scan_and_write_parallel(&files, out, &table, &mut stats, threads)?;
        return Ok(stats);
    }

    // 串行路径
    write!(out, "[")?;
    let mut first = true;
    for path in files {
        write_one(out, identify(&path, &table), &mut stats, &mut first)?;
    }
    write!(out, "]")?;
    Ok(stats)
}

/// 并行调度：
/// - 后台线程内创建 Rayon 线程池并行识别；
/// - Writer 保持在当前线程，按 idx 重排并流式写 JSON，
///   保证输出与串行路径逐字节一致。
fn scan_and_write_parallel(
    files: &[PathBuf],
    out: &mut dyn Write,
    table: &Arc<SignatureTable>,
    stats: &mut ScanStats,
    threads: usize,
) -> Result<()> {
    use crossbeam_channel as channel;
    use rayon::prelude::*;

    write!(out, "[")?;
    let mut first = true;

    // 通道用于 worker → writer 传递结果
    type Msg = (usize /*idx*/, std::result::Result<IdentificationResult, IdentifyError>);
    let (tx, rx) = channel::bounded::<Msg>(256);

    let table = Arc::clone(table);
    let files_vec: Vec<(usize, PathBuf)> = files
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.clone()))
        .collect();

    let scan_thread = std::thread::spawn(move || {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .expect("build rayon pool");
        pool.install(|| {
            files_vec.par_iter().for_each(|(idx, path)| {
                let _ = tx.send((*idx, identify(path, &table)));
            });
        });
        // 结束后 Sender 被丢弃，Receiver 将收到关闭信号
    });

    // Writer：维护 next_idx 与缓存，按序输出
    let mut next_idx: usize = 0;
    let mut buffer: BTreeMap<usize, std::result::Result<IdentificationResult, IdentifyError>> =
        BTreeMap::new();

    while let Ok((idx, res)) = rx.recv() {
        buffer.insert(idx, res);
        // 尝试从 next_idx 开始顺序冲刷
        while let Some(res) = buffer.remove(&next_idx) {
            write_one(out, res, stats, &mut first)?;
            next_idx += 1;
        }
    }

    // 等待识别线程结束
    let _ = scan_thread.join();

    // 最终冲刷残余（理论上缓冲应已清空）
    while let Some(res) = buffer.remove(&next_idx) {
        write_one(out, res, stats, &mut first)?;
        next_idx += 1;
    }

    write!(out, "]")?;
    Ok(())
}

/// 将单个识别结果写入输出并并入统计；失败项仅计数
fn write_one(
    out: &mut dyn Write,
    res: std::result::Result<IdentificationResult, IdentifyError>,
    stats: &mut ScanStats,
    first: &mut bool,
) -> Result<()> {
    match res {
        Ok(result) => {
            stats.files_scanned += 1;
            if result.matched.is_some() { stats.matched += 1; }
            if result.spoof_detected { stats.spoofed += 1; }
            if !*first { write!(out, ",")?; } else { *first = false; }
            serde_json::to_writer(&mut *out, &result)?;
        }
        Err(_) => stats.errors += 1,
    }
    Ok(())
}
