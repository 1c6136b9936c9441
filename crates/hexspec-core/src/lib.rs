//! 魔数识别核心库
//!
//! 设计要点：
//! - 签名表为只读数据，按作者顺序存放；匹配采用“首个命中即停”策略，
//!   表序即优先级，实现层永不重排。
//! - 匹配在头部字节的大写十六进制渲染上进行，便于以 hex 字面量维护签名。
//! - 每次识别为单遍、无状态调用；文件句柄在读取结束后即释放。
//! - 本库不打印、不上色；结构化结果与错误的呈现交由调用方（CLI）完成。

mod engine;
mod error;
mod options;
mod report;
mod scan;
mod signatures;

// 对外暴露的公共 API
pub use engine::{identify, HEADER_READ_LIMIT};
pub use error::IdentifyError;
pub use options::{ScanOptions, ScanStats};
pub use report::IdentificationResult;
pub use scan::scan_and_write;
pub use signatures::{load_signature_specs, SignatureEntry, SignatureSpec, SignatureTable};
