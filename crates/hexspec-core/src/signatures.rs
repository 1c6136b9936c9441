//! 签名表（内置数据 + TOML 文件加载）
//!
//! 表内条目顺序即匹配优先级：前缀存在歧义时以靠前者为准。
//! 实现层不得对表排序或按模式长度重排，否则会静默改变识别结果。
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 内置签名数据（hex 模式, 描述, 规范扩展名），按优先级排列。
const BUILTIN_SIGNATURES: &[(&str, &str, &str)] = &[
    ("7F454C46", "ELF Executable (Linux)", "elf"),
    ("4D5A", "DOS MZ / Windows EXE", "exe"),
    ("89504E470D0A1A0A", "PNG Image", "png"),
    ("FFD8FF", "JPEG Image", "jpg"),
    ("25504446", "PDF Document", "pdf"),
    ("504B0304", "ZIP / Office OpenXML", "zip"),
    ("526172211A07", "RAR Archive", "rar"),
    ("377ABCAF271C", "7-Zip Archive", "7z"),
    ("CAFEBABE", "Java Class / Mach-O", "class"),
    ("2321", "Shebang / Script", "sh"),
];

/// 单条签名的配置（TOML 条目；hex 允许内嵌空白与小写）
#[derive(Debug, Clone, Deserialize)]
struct SignatureFileEntry {
    pub hex: String,
    pub desc: String,
    pub ext: String,
}

/// 顶层签名文件结构
#[derive(Debug, Clone, Deserialize)]
struct SignatureFile {
    #[serde(default)]
    pub signatures: Vec<SignatureFileEntry>,
}

/// 归一化前的签名规格（hex 为作者原文）
#[derive(Debug, Clone)]
pub struct SignatureSpec {
    pub hex: String,
    pub desc: String,
    pub ext: String,
}

/// 归一化后的签名条目：pattern 为非空的纯大写 hex 序列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureEntry {
    pub pattern: String,
    pub description: String,
    pub extension: String,
}

/// 有序只读签名表；构建后不可变，可在线程间共享
#[derive(Debug, Clone)]
pub struct SignatureTable {
    entries: Vec<SignatureEntry>,
}

impl SignatureTable {
    /// 内置签名表（进程内常量数据）
    pub fn builtin() -> Self {
        let entries = BUILTIN_SIGNATURES
            .iter()
            .map(|&(pattern, description, extension)| SignatureEntry {
                pattern: pattern.to_string(),
                description: description.to_string(),
                extension: extension.to_string(),
            })
            .collect();
        Self { entries }
    }

    /// 从签名规格构建表，保持输入顺序。
    /// 归一化失败（空模式、非 hex 字符、奇数长度）的条目跳过。
    pub fn from_specs(specs: &[SignatureSpec]) -> Self {
        let mut entries = Vec::new();
        for s in specs {
            if let Some(pattern) = normalize_hex(&s.hex) {
                entries.push(SignatureEntry {
                    pattern,
                    description: s.desc.clone(),
                    extension: s.ext.clone(),
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按表序做前缀扫描，返回首个命中的条目。
    /// 首个命中即停：不是最长匹配，也不是最特异匹配。
    pub fn match_hex(&self, header_hex: &str) -> Option<&SignatureEntry> {
        self.entries
            .iter()
            .find(|e| header_hex.starts_with(e.pattern.as_str()))
    }
}

/// 归一化 hex 字面量：剔除全部空白并统一大写；
/// 空串、含非 hex 字符或长度为奇数（不成整字节）时返回 None
fn normalize_hex(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();
    if cleaned.is_empty() || cleaned.len() % 2 != 0 {
        return None;
    }
    if !cleaned.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    Some(cleaned)
}

/// 从 TOML 签名文件加载为 SignatureSpec 列表（未归一化）
pub fn load_signature_specs(path: &Path) -> Result<Vec<SignatureSpec>> {
    let txt = std::fs::read_to_string(path)?;
    let parsed: SignatureFile = toml::from_str(&txt)?;
    let mut out = Vec::new();

    for e in parsed.signatures {
        out.push(SignatureSpec { hex: e.hex, desc: e.desc, ext: e.ext });
    }

    Ok(out)
}
