//! PDF 扫描服务 - 业务能力层
//!
//! 只负责"找到并校验评分表 PDF"能力，不关心后续流程

use crate::error::{AppError, FileError};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// 扫描目录中的所有 PDF 文件
///
/// # 参数
/// - `input_dir`: 评分表所在目录
/// - `recursive`: 是否递归扫描子目录
///
/// # 返回
/// 返回按文件名排序的 PDF 路径列表
pub async fn scan_pdf_files(input_dir: &str, recursive: bool) -> Result<Vec<PathBuf>> {
    let root = PathBuf::from(input_dir);

    if !root.exists() {
        anyhow::bail!(AppError::File(FileError::DirectoryNotFound {
            path: input_dir.to_string(),
        }));
    }

    let mut pdf_files = Vec::new();
    let mut pending_dirs = vec![root];

    while let Some(dir) = pending_dirs.pop() {
        let mut entries = fs::read_dir(&dir)
            .await
            .with_context(|| format!("无法读取文件夹: {}", dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_dir() {
                if recursive {
                    pending_dirs.push(path);
                }
                continue;
            }

            let is_pdf = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);

            if is_pdf {
                pdf_files.push(path);
            }
        }
    }

    // 按文件名排序，保证后续合并顺序确定
    pdf_files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));

    info!("在 {} 找到 {} 个 PDF 文件", input_dir, pdf_files.len());

    Ok(pdf_files)
}

/// 校验 PDF 文件是否可读取
///
/// 检查文件大小非零且以 `%PDF` 魔数开头，不合格的文件被过滤并记录警告
pub async fn validate_pdf_files(files: Vec<PathBuf>) -> Vec<PathBuf> {
    let total = files.len();
    let mut valid_files = Vec::new();

    for path in files {
        match validate_single(&path).await {
            Ok(size) => {
                debug!("校验通过: {} ({} bytes)", display_name(&path), size);
                valid_files.push(path);
            }
            Err(e) => {
                warn!("跳过 {}: {}", display_name(&path), e);
            }
        }
    }

    info!("校验完成: {}/{} 个文件有效", valid_files.len(), total);
    valid_files
}

/// 便利函数：扫描并校验 PDF 文件列表
pub async fn collect_pdf_files(
    input_dir: &str,
    recursive: bool,
    validate: bool,
) -> Result<Vec<PathBuf>> {
    let files = scan_pdf_files(input_dir, recursive).await?;

    if validate {
        Ok(validate_pdf_files(files).await)
    } else {
        Ok(files)
    }
}

async fn validate_single(path: &Path) -> Result<u64> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    if metadata.len() == 0 {
        anyhow::bail!("文件大小为 0");
    }

    let mut file = fs::File::open(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    let mut header = [0u8; 4];
    file.read_exact(&mut header)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))?;

    if &header != b"%PDF" {
        anyhow::bail!(AppError::File(FileError::InvalidPdf {
            path: path.display().to_string(),
        }));
    }

    Ok(metadata.len())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scan_sorts_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.pdf"), b"%PDF-1.7 data").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.7 data").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignore me").unwrap();

        let files = scan_pdf_files(dir.path().to_str().unwrap(), false)
            .await
            .unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[tokio::test]
    async fn test_validate_filters_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("good.pdf"), b"%PDF-1.7 data").unwrap();
        std::fs::write(dir.path().join("empty.pdf"), b"").unwrap();
        std::fs::write(dir.path().join("fake.pdf"), b"hello world").unwrap();

        let files = collect_pdf_files(dir.path().to_str().unwrap(), false, true)
            .await
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].file_name().unwrap(), "good.pdf");
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let result = scan_pdf_files("目录不存在的路径", false).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_recursive_scan_descends() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("第二组");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.7 data").unwrap();
        std::fs::write(sub.join("b.pdf"), b"%PDF-1.7 data").unwrap();

        let flat = scan_pdf_files(dir.path().to_str().unwrap(), false)
            .await
            .unwrap();
        assert_eq!(flat.len(), 1);

        let deep = scan_pdf_files(dir.path().to_str().unwrap(), true)
            .await
            .unwrap();
        assert_eq!(deep.len(), 2);
    }
}
