//! 识别引擎（单文件、单遍）
//!
//! 流程：stat → 有界读取头部 → hex 渲染 → 表序前缀扫描 → 扩展名比对。
//! 空文件、短于 16 字节的文件、无扩展名的路径均为合法输入，不视为错误。
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::IdentifyError;
use crate::report::IdentificationResult;
use crate::signatures::SignatureTable;

/// 头部读取上限（字节）。所有签名均位于偏移 0，16 字节足以覆盖最长模式。
pub const HEADER_READ_LIMIT: usize = 16;

/// 识别单个文件：
/// - 路径不存在返回 `NotFound`，不做任何读取；
/// - stat 或读取失败返回 `Io`，携带底层原因；
/// - 成功时返回完整填充的结果，绝不返回部分结果。
pub fn identify(path: &Path, table: &SignatureTable) -> Result<IdentificationResult, IdentifyError> {
    // 存在性检查与大小查询由一次 stat 完成
    let meta = std::fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => IdentifyError::NotFound { path: path.to_path_buf() },
        _ => IdentifyError::Io { path: path.to_path_buf(), source: e },
    })?;
    let size_bytes = meta.len();

    // 读取头部并渲染为大写 hex；匹配在 hex 形式上进行
    let header = read_header(path)
        .map_err(|e| IdentifyError::Io { path: path.to_path_buf(), source: e })?;
    let header_hex = hex::encode_upper(&header);

    // 表序前缀扫描，首个命中即停
    let matched = table.match_hex(&header_hex).cloned();

    let declared_ext = declared_extension(path);

    // 伪装判定：命中存在、声明扩展名非空、且两者不一致（忽略大小写）
    let spoof_detected = match (&matched, declared_ext.is_empty()) {
        (Some(m), false) => !declared_ext.eq_ignore_ascii_case(&m.extension),
        _ => false,
    };

    Ok(IdentificationResult {
        path: path.to_path_buf(),
        size_bytes,
        header_hex,
        matched,
        declared_ext,
        spoof_detected,
    })
}

/// 读取文件头部，至多 `HEADER_READ_LIMIT` 字节。
/// 不经过 BufReader：预读会超出 16 字节的读取上界。
/// 句柄在函数返回时释放，读取失败亦然。
fn read_header(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut buf = Vec::with_capacity(HEADER_READ_LIMIT);
    file.take(HEADER_READ_LIMIT as u64).read_to_end(&mut buf)?;
    Ok(buf)
}

/// 路径声明的扩展名：末段最后一个 `.` 之后的部分，折叠为小写；
/// 无 `.`、无文件名或点开头的隐藏文件（如 `.bashrc`）为空串
fn declared_extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn write_file(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[test]
    fn partial_png_header_does_not_match() {
        // 4 字节的 PNG 前缀不足以命中 8 字节模式
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "partial.bin", &[0x89, 0x50, 0x4E, 0x47]);

        let r = identify(&path, &SignatureTable::builtin()).unwrap();
        assert_eq!(r.header_hex, "89504E47");
        assert!(r.matched.is_none());
        assert!(!r.spoof_detected);
    }

    #[test]
    fn jpeg_bytes_with_txt_name_is_spoof() {
        // photo.txt 实为 JPEG
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "photo.txt", &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]);

        let r = identify(&path, &SignatureTable::builtin()).unwrap();
        let m = r.matched.as_ref().unwrap();
        assert_eq!(m.extension, "jpg");
        assert_eq!(r.declared_ext, "txt");
        assert!(r.spoof_detected);
    }

    #[test]
    fn elf_bytes_with_elf_name_is_clean() {
        // 声明扩展名与真实类型一致，不应告警
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "app.elf",
            &[0x7F, 0x45, 0x4C, 0x46, 0x02, 0x01, 0x01, 0x00],
        );

        let r = identify(&path, &SignatureTable::builtin()).unwrap();
        assert_eq!(r.matched.as_ref().unwrap().extension, "elf");
        assert_eq!(r.declared_ext, "elf");
        assert!(!r.spoof_detected);
    }

    #[test]
    fn empty_file_yields_empty_header() {
        // 空文件合法：无命中亦无伪装
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty", &[]);

        let r = identify(&path, &SignatureTable::builtin()).unwrap();
        assert_eq!(r.size_bytes, 0);
        assert_eq!(r.header_hex, "");
        assert!(r.matched.is_none());
        assert!(!r.spoof_detected);
    }

    #[test]
    fn missing_path_fails_with_not_found() {
        let err = identify(Path::new("/tmp/doesnotexist123"), &SignatureTable::builtin())
            .unwrap_err();
        assert!(matches!(err, IdentifyError::NotFound { .. }));
        assert_eq!(err.path(), &PathBuf::from("/tmp/doesnotexist123"));
    }

    #[test]
    fn identify_is_deterministic() {
        // 同一文件、同一表，两次识别结果一致
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "doc.pdf", b"%PDF-1.7 blah blah");
        let table = SignatureTable::builtin();

        let a = identify(&path, &table).unwrap();
        let b = identify(&path, &table).unwrap();
        assert_eq!(a.matched, b.matched);
        assert_eq!(a.spoof_detected, b.spoof_detected);
        assert_eq!(a.header_hex, b.header_hex);
    }

    #[test]
    fn header_read_is_bounded_to_16_bytes() {
        // 大小为 S 的文件读取 min(S, 16) 字节，hex 长度为其两倍
        let dir = tempfile::tempdir().unwrap();

        let long = write_file(&dir, "long.bin", &[0xAA; 40]);
        let r = identify(&long, &SignatureTable::builtin()).unwrap();
        assert_eq!(r.size_bytes, 40);
        assert_eq!(r.header_hex.len(), 2 * HEADER_READ_LIMIT);
        assert_eq!(r.header_hex, "AA".repeat(16));

        let short = write_file(&dir, "short.bin", &[0xAB, 0xCD]);
        let r = identify(&short, &SignatureTable::builtin()).unwrap();
        assert_eq!(r.header_hex, "ABCD");
    }

    #[test]
    fn spoof_requires_match_and_declared_ext_and_difference() {
        // 伪装判定的三个条件缺一不可
        let dir = tempfile::tempdir().unwrap();
        let table = SignatureTable::builtin();

        // 无命中 → 不伪装（即使声明了扩展名）
        let p = write_file(&dir, "data.txt", &[0x00, 0x01, 0x02, 0x03]);
        assert!(!identify(&p, &table).unwrap().spoof_detected);

        // 命中但无声明扩展名 → 不伪装
        let p = write_file(&dir, "noext", &[0x4D, 0x5A, 0x90, 0x00]);
        let r = identify(&p, &table).unwrap();
        assert!(r.matched.is_some());
        assert_eq!(r.declared_ext, "");
        assert!(!r.spoof_detected);

        // 扩展名大小写不同视为一致
        let p = write_file(&dir, "tool.EXE", &[0x4D, 0x5A, 0x90, 0x00]);
        let r = identify(&p, &table).unwrap();
        assert_eq!(r.declared_ext, "exe");
        assert!(!r.spoof_detected);

        // 命中且声明不一致 → 伪装
        let p = write_file(&dir, "tool.png", &[0x4D, 0x5A, 0x90, 0x00]);
        assert!(identify(&p, &table).unwrap().spoof_detected);
    }

    #[test]
    fn declared_extension_edge_cases() {
        assert_eq!(declared_extension(Path::new("a/b/archive.tar.gz")), "gz");
        assert_eq!(declared_extension(Path::new("a/b/README")), "");
        assert_eq!(declared_extension(Path::new(".bashrc")), "");
        assert_eq!(declared_extension(Path::new("UPPER.JPG")), "jpg");
    }
}
