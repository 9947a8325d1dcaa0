//! src/services/upload_service.rs
//!
//! UploadService: stores uploaded images flat beneath `base_path` under a
//! random `<uuid>.<ext>` name and hands back the public URL they are served
//! from. Resource stores call back into it to release files they own.

use bytes::Bytes;
use futures::{Stream, StreamExt, pin_mut};
use md5::Context;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, warn};
use uuid::Uuid;

/// Extension used when the original name has none (or an unusable one).
const DEFAULT_EXTENSION: &str = "jpg";
const MAX_EXTENSION_LEN: usize = 10;
const MAX_STORED_NAME_LEN: usize = 255;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("uploaded file is empty")]
    EmptyFile,
    #[error("invalid file name `{0}`")]
    InvalidName(String),
    #[error("file `{0}` not found")]
    NotFound(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type UploadResult<T> = Result<T, UploadError>;

/// Result of a successful upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Public URL the file is served from, e.g. `/uploads/<name>`.
    pub url: String,
    /// Name of the file inside the upload directory.
    pub stored_name: String,
    pub size_bytes: u64,
    /// Hex MD5 of the stored bytes.
    pub etag: String,
}

#[derive(Clone, Debug)]
pub struct UploadService {
    /// Directory on disk where uploads are written.
    base_path: PathBuf,

    /// URL path prefix uploads are served under (no trailing slash).
    public_path: String,
}

impl UploadService {
    pub fn new(base_path: impl Into<PathBuf>, public_path: impl Into<String>) -> Self {
        let public_path = public_path.into();
        let public_path = format!("/{}", public_path.trim_matches('/'));
        Self {
            base_path: base_path.into(),
            public_path,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Public URL for a stored file name.
    pub fn url_for(&self, stored_name: &str) -> String {
        format!("{}/{}", self.public_path, stored_name)
    }

    /// If `url` points at a file this service stored, return its stored name.
    pub fn stored_name_from_url(&self, url: &str) -> Option<String> {
        let name = url
            .strip_prefix(&self.public_path)?
            .strip_prefix('/')?;
        ensure_name_safe(name).ok()?;
        Some(name.to_string())
    }

    /// Stream an upload to disk under a fresh unique name.
    ///
    /// - Creates the upload directory on first use.
    /// - Writes to a temporary file, computing size and MD5 as bytes arrive.
    /// - fsyncs and renames into place.
    ///
    /// The temporary file is removed on any failure, including an empty body.
    pub async fn store_stream<S>(&self, original_name: &str, stream: S) -> UploadResult<StoredUpload>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        fs::create_dir_all(&self.base_path).await?;

        let stored_name = format!("{}.{}", Uuid::new_v4(), extension_for(original_name));
        let file_path = self.base_path.join(&stored_name);
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
            return Err(UploadError::EmptyFile);
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

        if let Err(err) = fs::rename(&tmp_path, &file_path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(UploadError::Io(err));
        }

        debug!(
            stored_name = %stored_name,
            original_name,
            size_bytes,
            "stored upload"
        );

        Ok(StoredUpload {
            url: self.url_for(&stored_name),
            stored_name,
            size_bytes,
            etag: format!("{:x}", digest.compute()),
        })
    }

    /// Store an in-memory buffer.
    pub async fn store(&self, bytes: Bytes, original_name: &str) -> UploadResult<StoredUpload> {
        self.store_stream(original_name, futures::stream::once(async move { Ok(bytes) }))
            .await
    }

    /// Open a stored file for streaming out, along with its length.
    pub async fn open(&self, stored_name: &str) -> UploadResult<(File, u64)> {
        ensure_name_safe(stored_name)?;
        let path = self.base_path.join(stored_name);
        let file = File::open(&path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                UploadError::NotFound(stored_name.to_string())
            } else {
                UploadError::Io(err)
            }
        })?;
        let len = file.metadata().await?.len();
        Ok((file, len))
    }

    /// Delete a stored file. A file that is already gone counts as deleted.
    pub async fn remove(&self, stored_name: &str) -> UploadResult<()> {
        ensure_name_safe(stored_name)?;
        let path = self.base_path.join(stored_name);
        match fs::remove_file(&path).await {
            Ok(_) => {
                debug!("removed upload {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("upload {} already missing", path.display());
                Ok(())
            }
            Err(err) => Err(UploadError::Io(err)),
        }
    }

    /// Best-effort removal used by cascading deletes and file replacement.
    /// Failures are logged and swallowed.
    pub async fn release(&self, stored_name: &str) {
        if let Err(err) = self.remove(stored_name).await {
            warn!(stored_name, error = %err, "could not delete uploaded file");
        }
    }

    /// Release the file behind `url` if it is one of ours.
    pub async fn release_url(&self, url: &str) {
        if let Some(name) = self.stored_name_from_url(url) {
            self.release(&name).await;
        }
    }
}

/// Lowercased extension of `original_name`, or [`DEFAULT_EXTENSION`] when
/// there is no usable one.
fn extension_for(original_name: &str) -> String {
    original_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}

/// Stored names are flat: no separators, no traversal, no control bytes.
fn ensure_name_safe(name: &str) -> UploadResult<()> {
    let invalid = name.is_empty()
        || name.len() > MAX_STORED_NAME_LEN
        || name.starts_with('.')
        || name.contains("..")
        || name
            .bytes()
            .any(|b| b == b'/' || b == b'\\' || b == b'\0' || b.is_ascii_control());
    if invalid {
        Err(UploadError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(dir: &Path) -> UploadService {
        UploadService::new(dir.join("uploads"), "/uploads")
    }

    #[test]
    fn extension_is_kept_or_defaulted() {
        assert_eq!(extension_for("photo.PNG"), "png");
        assert_eq!(extension_for("archive.tar.gz"), "gz");
        assert_eq!(extension_for("no_extension"), "jpg");
        assert_eq!(extension_for("trailing."), "jpg");
        assert_eq!(extension_for("weird.p/ng"), "jpg");
    }

    #[test]
    fn unsafe_names_are_rejected() {
        for name in ["", "../etc/passwd", "a/b.png", "a\\b.png", ".hidden", "x\0.png"] {
            assert!(ensure_name_safe(name).is_err(), "{name:?} accepted");
        }
        assert!(ensure_name_safe("0b5c.png").is_ok());
    }

    #[test]
    fn public_path_is_normalized() {
        let svc = UploadService::new("/tmp/x", "uploads/");
        assert_eq!(svc.public_path(), "/uploads");
        assert_eq!(svc.url_for("a.png"), "/uploads/a.png");
    }

    #[test]
    fn stored_name_only_recognized_under_public_path() {
        let svc = UploadService::new("/tmp/x", "/uploads");
        assert_eq!(svc.stored_name_from_url("/uploads/a.png").as_deref(), Some("a.png"));
        assert_eq!(svc.stored_name_from_url("https://cdn.example.com/a.png"), None);
        assert_eq!(svc.stored_name_from_url("/uploads/../secret"), None);
        assert_eq!(svc.stored_name_from_url("/uploadsx/a.png"), None);
    }

    #[tokio::test]
    async fn store_creates_directory_and_names_uniquely() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        assert!(!svc.base_path().exists());

        let first = svc.store(Bytes::from_static(b"hello"), "a.png").await.unwrap();
        let second = svc.store(Bytes::from_static(b"hello"), "a.png").await.unwrap();

        assert_ne!(first.stored_name, second.stored_name);
        assert!(first.stored_name.ends_with(".png"));
        assert_eq!(first.url, format!("/uploads/{}", first.stored_name));
        assert_eq!(first.size_bytes, 5);
        assert_eq!(first.etag, format!("{:x}", md5::compute(b"hello")));

        let on_disk = fs::read(svc.base_path().join(&first.stored_name)).await.unwrap();
        assert_eq!(on_disk, b"hello");
    }

    #[tokio::test]
    async fn store_concatenates_stream_chunks() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Ok(Bytes::from_static(b"cd")),
        ]);
        let stored = svc.store_stream("pic", chunks).await.unwrap();
        assert!(stored.stored_name.ends_with(".jpg"));
        let on_disk = fs::read(svc.base_path().join(&stored.stored_name)).await.unwrap();
        assert_eq!(on_disk, b"abcd");
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_and_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let err = svc.store(Bytes::new(), "a.png").await.unwrap_err();
        assert!(matches!(err, UploadError::EmptyFile));

        let mut entries = fs::read_dir(svc.base_path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn failed_stream_cleans_up_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let chunks = futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ab")),
            Err(io::Error::other("client went away")),
        ]);
        assert!(matches!(
            svc.store_stream("a.png", chunks).await,
            Err(UploadError::Io(_))
        ));
        let mut entries = fs::read_dir(svc.base_path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let stored = svc.store(Bytes::from_static(b"x"), "a.gif").await.unwrap();

        svc.remove(&stored.stored_name).await.unwrap();
        assert!(!svc.base_path().join(&stored.stored_name).exists());
        svc.remove(&stored.stored_name).await.unwrap();
    }

    #[tokio::test]
    async fn open_reports_missing_files() {
        let tmp = tempfile::tempdir().unwrap();
        let svc = service(tmp.path());
        let stored = svc.store(Bytes::from_static(b"xyz"), "a.gif").await.unwrap();

        let (_, len) = svc.open(&stored.stored_name).await.unwrap();
        assert_eq!(len, 3);
        assert!(matches!(
            svc.open("missing.png").await,
            Err(UploadError::NotFound(_))
        ));
    }
}
