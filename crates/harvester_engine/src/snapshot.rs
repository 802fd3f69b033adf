use std::io;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use harvester_core::Resource;

use crate::ExtractionError;

/// Rendered page markup captured from the host, before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSnapshot {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// Source of rendered page snapshots (whatever the host uses to read a live page).
#[async_trait::async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn snapshot(&self, resource: &Resource) -> Result<RawSnapshot, ExtractionError>;
}

/// Reads `<dir>/<resource id>.html`, as dumped by a host bridge.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSource {
    dir: PathBuf,
}

impl DirectorySnapshotSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn snapshot_path(&self, resource: &Resource) -> PathBuf {
        self.dir.join(format!("{}.html", resource.id))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl SnapshotSource for DirectorySnapshotSource {
    async fn snapshot(&self, resource: &Resource) -> Result<RawSnapshot, ExtractionError> {
        let path = self.snapshot_path(resource);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(RawSnapshot {
                bytes,
                content_type: None,
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(
                ExtractionError::Unavailable(format!("no snapshot for resource {}", resource.id)),
            ),
            Err(err) => Err(ExtractionError::Unavailable(format!(
                "cannot read {}: {}",
                path.display(),
                err
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSnapshot {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("snapshot is not valid {encoding}")]
    Malformed { encoding: String },
}

/// Decode snapshot bytes to UTF-8: BOM, then Content-Type charset, then chardetng.
pub fn decode_snapshot(
    bytes: &[u8],
    content_type: Option<&str>,
) -> Result<DecodedSnapshot, DecodeError> {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| {
            content_type
                .and_then(charset_param)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
        })
        .unwrap_or_else(|| {
            let mut detector = EncodingDetector::new();
            detector.feed(bytes, true);
            detector.guess(None, true)
        });

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: used.name().to_string(),
        });
    }
    Ok(DecodedSnapshot {
        html: text.into_owned(),
        encoding_label: used.name().to_string(),
    })
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::charset_param;

    #[test]
    fn charset_is_found_case_insensitively() {
        assert_eq!(
            charset_param("text/html; Charset=\"ISO-8859-1\"").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(charset_param("text/html"), None);
    }
}
