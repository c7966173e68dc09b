//! multipart 表单读取与上传文件落盘

use axum::extract::Multipart;
use bytes::Bytes;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::warn;
use uuid::Uuid;

use super::models::HttpServerError;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug)]
pub struct UploadedPart {
    pub file_name: String,
    pub bytes: Bytes,
}

/// 一次 multipart 请求中的文本字段与文件字段
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedPart>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, HttpServerError> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HttpServerError::InvalidRequest(format!("malformed form: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(|e| {
                        HttpServerError::InvalidRequest(format!("failed to read {name}: {e}"))
                    })?;
                    form.files.insert(name, UploadedPart { file_name, bytes });
                }
                None => {
                    let text = field.text().await.map_err(|e| {
                        HttpServerError::InvalidRequest(format!("failed to read {name}: {e}"))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }
        Ok(form)
    }

    /// Trimmed text field; empty counts as absent.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

pub fn ensure_xlsx(file_name: &str) -> Result<(), HttpServerError> {
    let ok = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("xlsx"))
        .unwrap_or(false);
    if ok {
        Ok(())
    } else {
        Err(HttpServerError::InvalidRequest(format!(
            "只支持 .xlsx 文件: {file_name}"
        )))
    }
}

/// Write the part to `{dir}/{field}-{uuid}.xlsx`.
pub async fn save_upload(
    dir: &Path,
    field: &str,
    part: &UploadedPart,
) -> Result<PathBuf, HttpServerError> {
    ensure_xlsx(&part.file_name)?;
    let path = dir.join(format!("{field}-{}.xlsx", Uuid::new_v4()));
    tokio::fs::write(&path, &part.bytes)
        .await
        .map_err(|e| HttpServerError::Internal(format!("failed to store upload: {e}")))?;
    Ok(path)
}

pub async fn discard_uploads(paths: &[PathBuf]) {
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!(path = %path.display(), error = %e, "failed to remove rejected upload");
        }
    }
}

/// `attachment` header with an ASCII fallback and an RFC 5987 UTF-8 name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let mut encoded = String::with_capacity(file_name.len() * 3);
    for b in file_name.bytes() {
        if b.is_ascii_alphanumeric() || b"-._~".contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{b:02X}"));
        }
    }
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
