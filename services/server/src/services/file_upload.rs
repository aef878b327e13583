use std::path::{Path, PathBuf};

use log::info;
use thiserror::Error;
use uuid::Uuid;

use crate::errors::ApiError;

pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided")]
    Missing,

    #[error("File extension is not allowed, expected one of: {}", ALLOWED_EXTENSIONS.join(", "))]
    ExtNotAllowed,

    #[error("File size {size} exceeds max size {max}")]
    TooLarge { size: usize, max: usize },

    #[error("failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match e {
            UploadError::Io(_) => ApiError::internal(e.to_string()),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

/// Writes uploaded banners under `upload_dir` and hands back their public URL.
#[derive(Debug, Clone)]
pub struct FileUpload {
    upload_dir: PathBuf,
    max_bytes: usize,
    url_prefix: String,
}

impl FileUpload {
    pub fn new(upload_dir: impl Into<PathBuf>, max_bytes: usize, app_url: &str) -> Self {
        Self {
            upload_dir: upload_dir.into(),
            max_bytes,
            url_prefix: format!("{}/uploads", app_url.trim_end_matches('/')),
        }
    }

    /// Lower-cased extension of `filename` if it is on the allow list.
    pub fn allowed_extension(filename: &str) -> Result<String, UploadError> {
        Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|e| ALLOWED_EXTENSIONS.contains(&e.as_str()))
            .ok_or(UploadError::ExtNotAllowed)
    }

    pub fn check_size(&self, size: usize) -> Result<(), UploadError> {
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    pub fn public_url(&self, stored_name: &str) -> String {
        format!("{}/{}", self.url_prefix, stored_name)
    }

    /// Stores `content` as `{uuid}.{ext}` and returns the URL it is served under.
    pub async fn save(&self, original_name: &str, content: &[u8]) -> Result<String, UploadError> {
        let ext = Self::allowed_extension(original_name)?;
        self.check_size(content.len())?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), ext);
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        tokio::fs::write(self.upload_dir.join(&stored_name), content).await?;

        info!("Stored upload {} ({} bytes)", stored_name, content.len());
        Ok(self.public_url(&stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_allow_list() {
        assert_eq!(FileUpload::allowed_extension("banner.PNG").unwrap(), "png");
        assert_eq!(FileUpload::allowed_extension("a.b.webp").unwrap(), "webp");
        assert!(FileUpload::allowed_extension("script.exe").is_err());
        assert!(FileUpload::allowed_extension("noext").is_err());
    }

    #[test]
    fn size_limit() {
        let upload = FileUpload::new("unused", 4, "http://localhost:8000/");
        assert!(upload.check_size(4).is_ok());
        assert!(matches!(
            upload.check_size(5),
            Err(UploadError::TooLarge { size: 5, max: 4 })
        ));
        assert_eq!(upload.public_url("x.png"), "http://localhost:8000/uploads/x.png");
    }

    #[tokio::test]
    async fn save_writes_file_under_uuid_name() {
        let dir = std::env::temp_dir().join(format!("lottery-upload-{}", Uuid::new_v4()));
        let upload = FileUpload::new(&dir, 1024, "http://localhost:8000");

        let url = upload.save("banner.jpg", b"image-bytes").await.unwrap();
        let stored = url.rsplit('/').next().unwrap();

        assert!(url.starts_with("http://localhost:8000/uploads/"));
        assert!(stored.ends_with(".jpg"));
        assert_eq!(tokio::fs::read(dir.join(stored)).await.unwrap(), b"image-bytes");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn rejected_upload_writes_nothing() {
        let dir = std::env::temp_dir().join(format!("lottery-upload-{}", Uuid::new_v4()));
        let upload = FileUpload::new(&dir, 1024, "http://localhost:8000");

        assert!(matches!(
            upload.save("notes.txt", b"text").await,
            Err(UploadError::ExtNotAllowed)
        ));
        assert!(!dir.exists());
    }
}
