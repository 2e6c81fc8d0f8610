//! Site photo handling.
//!
//! Converts photo files on disk into the base64 form the AI gateway accepts
//! and keeps the session's uploads in an append-only library.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Errors produced while importing site photos.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Reading the file from disk failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One uploaded site survey photo.
///
/// Immutable once created. The base64 payload is kept for the whole session
/// so repeated gateway calls never re-read the file.
#[derive(Debug, Clone)]
pub struct SitePhoto {
    /// Original location on disk.
    pub path: PathBuf,

    /// File name shown in the photo list.
    pub name: String,

    /// MIME type derived from the file extension.
    pub mime_type: String,

    /// Full file content, base64-encoded.
    pub base64: String,
}

impl SitePhoto {
    /// Approximate decoded size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.base64.len() / 4 * 3
    }
}

/// Read and encode a single photo file.
///
/// A failed read propagates immediately; there is no retry.
pub async fn encode_photo(path: &Path) -> Result<SitePhoto, PhotoError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PhotoError::Read { path: path.to_path_buf(), source })?;

    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    Ok(SitePhoto {
        path: path.to_path_buf(),
        name,
        mime_type: mime_for_path(path).to_string(),
        base64: STANDARD.encode(&bytes),
    })
}

/// Guess a MIME type from the file extension.
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("heic") => "image/heic",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Encode a batch of photo files concurrently.
///
/// All-or-nothing: if any read fails, the first failure is returned and no
/// photos are produced. Results come back in argument order.
pub async fn encode_batch<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SitePhoto>, PhotoError> {
    futures::future::try_join_all(paths.iter().map(|p| encode_photo(p.as_ref()))).await
}

/// Append-only collection of the session's site photos.
///
/// Photos are never individually removed or reordered; the library lives for
/// one editing session.
#[derive(Debug, Default)]
pub struct PhotoLibrary {
    photos: Vec<SitePhoto>,
}

impl PhotoLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode `paths` and append the results, all-or-nothing.
    pub async fn import<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<usize, PhotoError> {
        let encoded = encode_batch(paths).await?;
        let count = encoded.len();
        self.photos.extend(encoded);
        Ok(count)
    }

    /// Append an already-encoded photo to the end of the collection.
    pub fn push(&mut self, photo: SitePhoto) {
        self.photos.push(photo);
    }

    /// Append a batch of already-encoded photos.
    pub fn extend(&mut self, photos: Vec<SitePhoto>) {
        self.photos.extend(photos);
    }

    pub fn photos(&self) -> &[SitePhoto] {
        &self.photos
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_for_path(Path::new("roof.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("site/north.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("scan.webp")), "image/webp");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_encode_photo_reads_and_encodes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roof.jpg");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not really a jpeg").unwrap();

        let photo = encode_photo(&path).await.unwrap();
        assert_eq!(photo.name, "roof.jpg");
        assert_eq!(photo.mime_type, "image/jpeg");
        assert_eq!(photo.base64, STANDARD.encode(b"not really a jpeg"));
    }

    #[tokio::test]
    async fn test_encode_photo_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.png");

        let err = encode_photo(&missing).await.unwrap_err();
        let PhotoError::Read { path, .. } = err;
        assert_eq!(path, missing);
    }

    #[tokio::test]
    async fn test_batch_import_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.png");
        std::fs::write(&good, b"png bytes").unwrap();

        let mut library = PhotoLibrary::new();
        library.import(&[good.clone()]).await.unwrap();
        assert_eq!(library.len(), 1);

        // Second batch contains a missing file: nothing may be appended.
        let missing = dir.path().join("missing.png");
        let result = library.import(&[good, missing]).await;
        assert!(result.is_err());
        assert_eq!(library.len(), 1);
    }

    #[tokio::test]
    async fn test_batch_import_appends_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let second = dir.path().join("second.png");
        std::fs::write(&first, b"one").unwrap();
        std::fs::write(&second, b"two").unwrap();

        let mut library = PhotoLibrary::new();
        library.import(&[first]).await.unwrap();
        library.import(&[second]).await.unwrap();

        let names: Vec<_> = library.photos().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["first.png", "second.png"]);
    }
}
