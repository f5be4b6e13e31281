//! Multipart upload receiving.
//!
//! Files are streamed chunk by chunk into the upload directory so large
//! videos never sit in memory. Text fields are collected verbatim; parsing
//! and validation happen in [`super::upload`].

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use axum::extract::Multipart;
use tokio::io::AsyncWriteExt;
use wallhub_core::uploads;

use crate::error::{AppError, AppResult};

/// One file part, already written to disk.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File name as sent by the client.
    pub original_name: String,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Where the bytes were stored.
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Raw fields of an upload request.
#[derive(Debug, Default)]
pub struct UploadForm {
    /// Stored files, in the order they appeared in the body.
    pub files: Vec<UploadedFile>,
    /// Every `titles` value, unparsed.
    pub titles: Vec<String>,
    /// `type` field.
    pub kind: Option<String>,
    /// `mainCategory` field.
    pub main_category: Option<String>,
    /// `subCategory` field.
    pub sub_category: Option<String>,
}

impl UploadForm {
    /// Delete every stored file. Failures are logged and ignored.
    pub async fn discard_files(&self) {
        self.discard_files_from(0).await;
    }

    /// Delete the stored files at `index` and after.
    pub async fn discard_files_from(&self, index: usize) {
        for file in self.files.iter().skip(index) {
            if let Err(e) = tokio::fs::remove_file(&file.path).await {
                tracing::warn!(path = %file.path.display(), error = %e, "Failed to remove upload");
            }
        }
    }
}

/// Read the whole multipart body, storing file parts under `upload_dir`.
///
/// Accepts `files`/`files[]` and `titles`/`titles[]`; unknown fields are
/// ignored. On error, files stored so far are removed.
pub async fn receive_upload(multipart: &mut Multipart, upload_dir: &Path) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();
    match read_fields(multipart, upload_dir, &mut form).await {
        Ok(()) => Ok(form),
        Err(e) => {
            form.discard_files().await;
            Err(e)
        }
    }
}

async fn read_fields(
    multipart: &mut Multipart,
    upload_dir: &Path,
    form: &mut UploadForm,
) -> AppResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "files" | "files[]" => {
                let file = store_field(field, upload_dir).await?;
                tracing::debug!(
                    file = %file.original_name,
                    path = %file.path.display(),
                    size_bytes = file.size_bytes,
                    "Stored upload"
                );
                form.files.push(file);
            }
            "titles" | "titles[]" => form.titles.push(read_text(field).await?),
            "type" => form.kind = Some(read_text(field).await?),
            "mainCategory" => form.main_category = Some(read_text(field).await?),
            "subCategory" => form.sub_category = Some(read_text(field).await?),
            _ => {} // ignore unknown fields
        }
    }
    Ok(())
}

async fn read_text(field: Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn store_field(mut field: Field<'_>, upload_dir: &Path) -> AppResult<UploadedFile> {
    let original_name = field.file_name().unwrap_or("").to_string();
    let content_type = field.content_type().map(str::to_string);

    let (path, mut out) = create_unique(upload_dir, &original_name).await?;

    let mut size_bytes = 0u64;
    let result = async {
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            size_bytes += chunk.len() as u64;
            out.write_all(&chunk)
                .await
                .map_err(|e| AppError::InternalError(format!("write {}: {e}", path.display())))?;
        }
        out.flush()
            .await
            .map_err(|e| AppError::InternalError(format!("flush {}: {e}", path.display())))
    }
    .await;

    if let Err(e) = result {
        drop(out);
        let _ = tokio::fs::remove_file(&path).await;
        return Err(e);
    }

    Ok(UploadedFile {
        original_name,
        content_type,
        path,
        size_bytes,
    })
}

/// Create `<millis>_<name>` under `dir`, bumping the prefix while the name
/// is taken. The file is created exclusively, so concurrent uploads of the
/// same name never share a path.
async fn create_unique(dir: &Path, original_name: &str) -> AppResult<(PathBuf, tokio::fs::File)> {
    let mut millis = chrono::Utc::now().timestamp_millis();
    loop {
        let path = dir.join(uploads::stored_file_name(original_name, millis));
        match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => millis += 1,
            Err(e) => {
                return Err(AppError::InternalError(format!(
                    "create {}: {e}",
                    path.display()
                )))
            }
        }
    }
}
