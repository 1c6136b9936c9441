//! 识别错误类型（对外暴露）
use std::path::PathBuf;
use thiserror::Error;

/// 核心错误分类（对单次识别完备）：
/// - `NotFound`：路径在调用时不存在，未发生任何读取；
/// - `Io`：路径存在但 stat 或读取失败（权限、设备错误、检查后被删除等），
///   携带底层原因供调用方诊断展示。
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("I/O error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl IdentifyError {
    /// 出错路径（两类错误均携带）
    pub fn path(&self) -> &PathBuf {
        match self {
            IdentifyError::NotFound { path } => path,
            IdentifyError::Io { path, .. } => path,
        }
    }
}
