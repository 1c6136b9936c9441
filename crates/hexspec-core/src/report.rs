//! 识别结果（对外暴露）
use serde::Serialize;
use std::path::PathBuf;

use crate::signatures::SignatureEntry;

/// 单次识别的结构化结果（对应批量输出 JSON 数组的单个元素）。
/// 每次调用新建，由调用方持有；核心不保留任何跨调用状态。
#[derive(Debug, Clone, Serialize)]
pub struct IdentificationResult {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// 头部（至多 16 字节）的大写 hex 渲染，至多 32 个字符
    pub header_hex: String,
    /// 命中的签名条目；无命中为 None
    pub matched: Option<SignatureEntry>,
    /// 路径声明的扩展名（小写）；无扩展名为空串
    pub declared_ext: String,
    /// 仅当命中存在、声明扩展名非空且两者不一致时为 true
    pub spoof_detected: bool,
}
