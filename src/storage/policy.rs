use super::mime::extension_for_mime;
use crate::{Error, Result};
use std::path::Path;

/// Audio formats accepted for upload, by file extension.
pub const ALLOWED_AUDIO_EXTENSIONS: &[&str] = &["m4a", "mp3", "wav", "ogg", "webm"];

/// Size and type rules applied before anything touches storage.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    max_bytes: u64,
}

impl UploadPolicy {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate an upload and return the extension to store it under.
    ///
    /// Either the file extension or the declared MIME type may qualify the
    /// upload; clients are inconsistent about which one they get right.
    pub fn check(&self, size: u64, declared_mime: &str, file_name: Option<&str>) -> Result<String> {
        if size > self.max_bytes {
            return Err(Error::PayloadTooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        let by_extension = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .filter(|ext| ALLOWED_AUDIO_EXTENSIONS.contains(&ext.as_str()));

        if let Some(ext) = by_extension {
            return Ok(ext);
        }

        extension_for_mime(declared_mime)
            .map(str::to_string)
            .ok_or_else(|| {
                Error::UnsupportedMediaType(format!(
                    "Only audio files are accepted ({}); got '{}' ({})",
                    ALLOWED_AUDIO_EXTENSIONS.join(", "),
                    file_name.unwrap_or("unnamed"),
                    if declared_mime.is_empty() {
                        "no content type"
                    } else {
                        declared_mime
                    }
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_by_extension_with_bogus_mime() {
        let policy = UploadPolicy::new(1024);
        let ext = policy
            .check(10, "application/octet-stream", Some("dream.M4A"))
            .unwrap();
        assert_eq!(ext, "m4a");
    }

    #[test]
    fn test_accepts_by_mime_without_extension() {
        let policy = UploadPolicy::new(1024);
        let ext = policy.check(10, "audio/mpeg", Some("recording")).unwrap();
        assert_eq!(ext, "mp3");
    }

    #[test]
    fn test_rejects_when_neither_matches() {
        let policy = UploadPolicy::new(1024);
        let err = policy
            .check(10, "image/png", Some("photo.png"))
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedMediaType(_)));
    }

    #[test]
    fn test_rejects_oversized_before_type_check() {
        let policy = UploadPolicy::new(100);
        let err = policy.check(101, "image/png", None).unwrap_err();
        assert!(matches!(
            err,
            Error::PayloadTooLarge {
                size: 101,
                limit: 100
            }
        ));
    }

    #[test]
    fn test_exact_limit_is_allowed() {
        let policy = UploadPolicy::new(100);
        assert!(policy.check(100, "audio/wav", None).is_ok());
    }
}
