//! 批量扫描选项与统计信息（模块）
use std::path::PathBuf;

/// 批量扫描选项
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// 签名文件路径（TOML）；为空则使用内置签名表
    pub signatures_path: Option<PathBuf>,
    /// 线程数：None 表示自动（等于 CPU 核数）；Some(1) 走串行
    pub threads: Option<usize>,
}

/// 扫描统计信息（便于 CLI 打印）
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    /// 成功识别的文件数（不含失败项）
    pub files_scanned: usize,
    /// 命中签名表的文件数
    pub matched: usize,
    /// 判定为扩展名伪装的文件数
    pub spoofed: usize,
    /// 识别失败（NotFound/Io）而被跳过的文件数
    pub errors: usize,
}
