//! src/services/upload_service.rs
//!
//! UploadService — image files submitted through the model views. Payloads are
//! streamed to `base_path/<md5>.<ext>` and referenced from the database as
//! `/uploads/<md5>.<ext>`.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use std::{
    io::{self, ErrorKind},
    path::PathBuf,
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::debug;
use uuid::Uuid;

/// URL prefix under which stored uploads are served.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

const MAX_EXTENSION_LEN: usize = 8;
const MAX_NAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload `{0}` not found")]
    NotFound(String),
    #[error("invalid upload name")]
    InvalidName,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Clone)]
pub struct UploadService {
    /// Directory holding uploaded files.
    pub base_path: PathBuf,
}

impl UploadService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn ensure_name_safe(name: &str) -> UploadResult<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(UploadError::InvalidName);
        }
        if name.contains('/') || name.contains('\\') || name.contains("..") {
            return Err(UploadError::InvalidName);
        }
        if name.bytes().any(|b| b.is_ascii_control()) {
            return Err(UploadError::InvalidName);
        }
        Ok(())
    }

    /// Stream an upload to disk and return its public URL path.
    ///
    /// Returns `None` when the stream is empty (no file was chosen).
    /// The file name is the MD5 of its content, so identical uploads share one file.
    pub async fn store_stream<S>(
        &self,
        client_filename: Option<&str>,
        stream: S,
    ) -> UploadResult<Option<String>>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        fs::create_dir_all(&self.base_path).await?;
        let tmp_path = self.base_path.join(format!(".tmp-{}", Uuid::new_v4()));
        let mut file = File::create(&tmp_path).await?;

        let mut size_bytes: u64 = 0;
        let mut digest = Context::new();
        pin_mut!(stream);
        while let Some(chunk_res) = stream.next().await {
            let chunk = match chunk_res {
                Ok(chunk) => chunk,
                Err(err) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(UploadError::Io(err));
                }
            };
            size_bytes += chunk.len() as u64;
            digest.consume(&chunk);
            if let Err(err) = file.write_all(&chunk).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(UploadError::Io(err));
            }
        }

        if size_bytes == 0 {
            drop(file);
            let _ = fs::remove_file(&tmp_path).await;
            return Ok(None);
        }

        if let Err(err) = file.flush().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(UploadError::Io(err));
        }
        if let Err(err) = file.sync_all().await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(UploadError::Io(err));
        }
        drop(file);

        let name = match client_filename.and_then(sanitized_extension) {
            Some(ext) => format!("{:x}.{}", digest.compute(), ext),
            None => format!("{:x}", digest.compute()),
        };
        let final_path = self.base_path.join(&name);

        if let Err(err) = fs::rename(&tmp_path, &final_path).await {
            if err.kind() == ErrorKind::AlreadyExists {
                fs::remove_file(&final_path).await?;
                fs::rename(&tmp_path, &final_path).await?;
            } else {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(UploadError::Io(err));
            }
        }

        debug!("stored upload {} ({} bytes)", name, size_bytes);
        Ok(Some(format!("{}{}", UPLOAD_URL_PREFIX, name)))
    }

    /// Open a stored upload for streaming out, with its guessed content type.
    pub async fn open(&self, name: &str) -> UploadResult<(File, &'static str)> {
        Self::ensure_name_safe(name)?;
        let path = self.base_path.join(name);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                UploadError::NotFound(name.to_string())
            } else {
                UploadError::Io(err)
            }
        })?;
        Ok((file, content_type_for(name)))
    }
}

/// Lowercased extension of a client filename, if it is short ASCII alphanumerics.
fn sanitized_extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > MAX_EXTENSION_LEN {
        return None;
    }
    if !ext.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

fn content_type_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "webm" => "video/webm",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use tokio::io::AsyncReadExt;

    fn chunks(parts: &[&'static str]) -> impl Stream<Item = io::Result<Bytes>> + use<> {
        stream::iter(
            parts
                .iter()
                .copied()
                .map(|p| Ok(Bytes::from_static(p.as_bytes())))
                .collect::<Vec<_>>(),
        )
    }

    #[tokio::test]
    async fn store_names_file_by_content_digest() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path());

        let url = uploads
            .store_stream(Some("Cat.PNG"), chunks(&["hello ", "world"]))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(url, format!("/uploads/{:x}.png", md5::compute(b"hello world")));

        let name = url.trim_start_matches(UPLOAD_URL_PREFIX);
        let (mut file, content_type) = uploads.open(name).await.unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).await.unwrap();
        assert_eq!(body, "hello world");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn empty_stream_stores_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path());

        let stored = uploads.store_stream(Some("a.png"), chunks(&[])).await.unwrap();
        assert!(stored.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn open_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path());

        assert!(matches!(
            uploads.open("../secret").await,
            Err(UploadError::InvalidName)
        ));
        assert!(matches!(
            uploads.open("missing.png").await,
            Err(UploadError::NotFound(_))
        ));
    }

    #[test]
    fn extension_sanitizing() {
        assert_eq!(sanitized_extension("x.JPG").as_deref(), Some("jpg"));
        assert_eq!(sanitized_extension("noext"), None);
        assert_eq!(sanitized_extension(".bashrc"), None);
        assert_eq!(sanitized_extension("a.p/ng"), None);
        assert_eq!(sanitized_extension("a.verylongext"), None);
    }
}
