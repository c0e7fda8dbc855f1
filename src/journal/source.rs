use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Bytes, BytesMut};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("Image source not allowed: {0}")]
    Forbidden(String),
    #[error("Image exceeds maximum size of {limit} bytes")]
    TooLarge { limit: u64 },
    #[error("Empty image source")]
    Empty,
}

/// Transient handle to freshly captured image bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Bytes already in memory (direct upload)
    Bytes(Bytes),
    /// `data:<mime>;base64,<payload>`
    DataUrl(String),
    /// Local path, from a plain path or a `file://` URI
    File(PathBuf),
    /// `http://` or `https://` URI
    Remote(String),
}

impl ImageSource {
    /// Classify a capture handle string.
    pub fn parse(handle: &str) -> Self {
        let handle = handle.trim();
        if handle.starts_with("data:") {
            ImageSource::DataUrl(handle.to_string())
        } else if handle.starts_with("http://") || handle.starts_with("https://") {
            ImageSource::Remote(handle.to_string())
        } else if let Some(path) = handle.strip_prefix("file://") {
            ImageSource::File(PathBuf::from(path))
        } else {
            ImageSource::File(PathBuf::from(handle))
        }
    }

    /// The handle usable for instant preview, if this source has one.
    pub fn web_path(&self) -> Option<String> {
        match self {
            ImageSource::Bytes(_) | ImageSource::DataUrl(_) => None,
            ImageSource::File(path) => Some(format!("file://{}", path.display())),
            ImageSource::Remote(url) => Some(url.clone()),
        }
    }

    /// Resolve the handle into raw image bytes, refusing anything over `max_bytes`.
    pub async fn read(
        &self,
        client: &reqwest::Client,
        max_bytes: u64,
    ) -> Result<Bytes, SourceError> {
        let data = match self {
            ImageSource::Bytes(data) => data.clone(),
            ImageSource::DataUrl(url) => decode_data_url(url)?,
            ImageSource::File(path) => read_file(path, max_bytes).await?,
            ImageSource::Remote(url) => fetch(client, url, max_bytes).await?,
        };

        if data.is_empty() {
            return Err(SourceError::Empty);
        }
        if data.len() as u64 > max_bytes {
            return Err(SourceError::TooLarge { limit: max_bytes });
        }
        Ok(data)
    }
}

/// Which capture handles an untrusted caller may hand in.
///
/// In-memory bytes and data URLs are always admitted. File handles must resolve
/// inside `capture_dir`; remote handles need `allow_remote`.
#[derive(Debug, Clone, Default)]
pub struct SourcePolicy {
    pub capture_dir: Option<PathBuf>,
    pub allow_remote: bool,
}

impl SourcePolicy {
    /// Check a source and return it in the form that should be read.
    /// File handles come back canonicalized, so the checked path is the one read.
    pub async fn admit(&self, source: ImageSource) -> Result<ImageSource, SourceError> {
        match source {
            ImageSource::Bytes(_) | ImageSource::DataUrl(_) => Ok(source),
            ImageSource::Remote(url) => {
                if self.allow_remote {
                    Ok(ImageSource::Remote(url))
                } else {
                    Err(SourceError::Forbidden(
                        "remote image sources are disabled".to_string(),
                    ))
                }
            }
            ImageSource::File(path) => {
                let outside = || {
                    SourceError::Forbidden("file is outside the capture directory".to_string())
                };
                let capture_dir = self.capture_dir.as_ref().ok_or_else(|| {
                    SourceError::Forbidden("file image sources are disabled".to_string())
                })?;
                let capture_dir = tokio::fs::canonicalize(capture_dir)
                    .await
                    .map_err(|_| outside())?;
                let resolved = tokio::fs::canonicalize(&path)
                    .await
                    .map_err(|_| outside())?;
                if resolved.starts_with(&capture_dir) {
                    Ok(ImageSource::File(resolved))
                } else {
                    Err(outside())
                }
            }
        }
    }
}

async fn read_file(path: &Path, max_bytes: u64) -> Result<Bytes, SourceError> {
    let io_error = |e: std::io::Error| SourceError::Io {
        path: path.display().to_string(),
        source: e,
    };

    let metadata = tokio::fs::metadata(path).await.map_err(io_error)?;
    if metadata.len() > max_bytes {
        return Err(SourceError::TooLarge { limit: max_bytes });
    }
    let data = tokio::fs::read(path).await.map_err(io_error)?;
    Ok(Bytes::from(data))
}

fn decode_data_url(url: &str) -> Result<Bytes, SourceError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| SourceError::InvalidDataUrl("missing data: scheme".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| SourceError::InvalidDataUrl("missing ',' separator".to_string()))?;
    if !header.ends_with(";base64") {
        return Err(SourceError::InvalidDataUrl(
            "only base64 payloads are supported".to_string(),
        ));
    }
    let data = STANDARD
        .decode(payload.trim())
        .map_err(|e| SourceError::InvalidDataUrl(e.to_string()))?;
    Ok(Bytes::from(data))
}

async fn fetch(
    client: &reqwest::Client,
    url: &str,
    max_bytes: u64,
) -> Result<Bytes, SourceError> {
    let fetch_error = |message: String| SourceError::Fetch {
        url: url.to_string(),
        message,
    };

    let mut resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| fetch_error(e.to_string()))?;
    if !resp.status().is_success() {
        return Err(fetch_error(format!("status {}", resp.status())));
    }
    if resp.content_length().is_some_and(|len| len > max_bytes) {
        return Err(SourceError::TooLarge { limit: max_bytes });
    }

    let mut buf = BytesMut::new();
    while let Some(chunk) = resp.chunk().await.map_err(|e| fetch_error(e.to_string()))? {
        if (buf.len() + chunk.len()) as u64 > max_bytes {
            return Err(SourceError::TooLarge { limit: max_bytes });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_handles() {
        assert_eq!(
            ImageSource::parse("data:image/jpeg;base64,AAAA"),
            ImageSource::DataUrl("data:image/jpeg;base64,AAAA".to_string())
        );
        assert_eq!(
            ImageSource::parse("https://localhost/_capacitor_file_/photo.jpg"),
            ImageSource::Remote("https://localhost/_capacitor_file_/photo.jpg".to_string())
        );
        assert_eq!(
            ImageSource::parse("file:///tmp/capture.jpg"),
            ImageSource::File(PathBuf::from("/tmp/capture.jpg"))
        );
        assert_eq!(
            ImageSource::parse("/tmp/capture.jpg"),
            ImageSource::File(PathBuf::from("/tmp/capture.jpg"))
        );
    }

    #[test]
    fn test_web_path() {
        assert_eq!(ImageSource::Bytes(Bytes::from("x")).web_path(), None);
        assert_eq!(
            ImageSource::parse("file:///tmp/a.jpg").web_path().as_deref(),
            Some("file:///tmp/a.jpg")
        );
    }

    #[test]
    fn test_decode_data_url() {
        let data = decode_data_url("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(data, Bytes::from("hello"));
    }

    #[test]
    fn test_decode_data_url_rejects_non_base64() {
        assert!(matches!(
            decode_data_url("data:text/plain,hello"),
            Err(SourceError::InvalidDataUrl(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/jpeg;base64"),
            Err(SourceError::InvalidDataUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_read_file_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.jpg");
        std::fs::write(&path, b"jpeg bytes").unwrap();

        let client = reqwest::Client::new();
        let data = ImageSource::File(path).read(&client, u64::MAX).await.unwrap();
        assert_eq!(data, Bytes::from("jpeg bytes"));
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let client = reqwest::Client::new();
        let result = ImageSource::parse("/definitely/not/here.jpg")
            .read(&client, u64::MAX)
            .await;
        assert!(matches!(result, Err(SourceError::Io { .. })));
    }

    #[tokio::test]
    async fn test_read_empty_bytes_fails() {
        let client = reqwest::Client::new();
        let result = ImageSource::Bytes(Bytes::new()).read(&client, u64::MAX).await;
        assert!(matches!(result, Err(SourceError::Empty)));
    }

    #[tokio::test]
    async fn test_read_enforces_size_limit() {
        let client = reqwest::Client::new();
        let result = ImageSource::parse("data:image/jpeg;base64,aGVsbG8=")
            .read(&client, 4)
            .await;
        assert!(matches!(result, Err(SourceError::TooLarge { limit: 4 })));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.jpg");
        std::fs::write(&path, vec![0u8; 64]).unwrap();
        let result = ImageSource::File(path).read(&client, 63).await;
        assert!(matches!(result, Err(SourceError::TooLarge { limit: 63 })));
    }

    #[tokio::test]
    async fn test_policy_rejects_files_without_capture_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.jpg");
        std::fs::write(&path, b"jpeg").unwrap();

        let result = SourcePolicy::default().admit(ImageSource::File(path)).await;
        assert!(matches!(result, Err(SourceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_policy_confines_files_to_capture_dir() {
        let dir = tempfile::tempdir().unwrap();
        let capture_dir = dir.path().join("capture");
        std::fs::create_dir_all(&capture_dir).unwrap();
        std::fs::write(capture_dir.join("shot.jpg"), b"jpeg").unwrap();
        std::fs::write(dir.path().join("secret.txt"), b"secret").unwrap();

        let policy = SourcePolicy {
            capture_dir: Some(capture_dir.clone()),
            allow_remote: false,
        };

        let admitted = policy
            .admit(ImageSource::File(capture_dir.join("shot.jpg")))
            .await
            .unwrap();
        assert_eq!(
            admitted,
            ImageSource::File(std::fs::canonicalize(capture_dir.join("shot.jpg")).unwrap())
        );

        let escaped = policy
            .admit(ImageSource::File(capture_dir.join("../secret.txt")))
            .await;
        assert!(matches!(escaped, Err(SourceError::Forbidden(_))));

        let absolute = policy
            .admit(ImageSource::File(dir.path().join("secret.txt")))
            .await;
        assert!(matches!(absolute, Err(SourceError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_policy_remote_is_opt_in() {
        let source = ImageSource::parse("http://169.254.169.254/latest/meta-data");

        let denied = SourcePolicy::default().admit(source.clone()).await;
        assert!(matches!(denied, Err(SourceError::Forbidden(_))));

        let policy = SourcePolicy {
            capture_dir: None,
            allow_remote: true,
        };
        assert_eq!(policy.admit(source.clone()).await.unwrap(), source);
    }

    #[tokio::test]
    async fn test_policy_admits_inline_sources() {
        let policy = SourcePolicy::default();
        let inline = ImageSource::parse("data:image/jpeg;base64,aGVsbG8=");
        assert_eq!(policy.admit(inline.clone()).await.unwrap(), inline);
    }
}
