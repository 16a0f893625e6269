//! Local storage for uploaded images.

use std::path::{Path, PathBuf};

use image::ImageFormat;
use tracing::debug;
use uuid::Uuid;

const FALLBACK_EXTENSION: &str = "png";
const FALLBACK_MIME_TYPE: &str = "image/png";

/// File extension and MIME type detected from an image's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageKind {
    pub extension: &'static str,
    pub mime_type: &'static str,
}

impl ImageKind {
    /// Sniff the format; anything unrecognised is treated as PNG.
    pub fn sniff(bytes: &[u8]) -> Self {
        match image::guess_format(bytes) {
            Ok(format) => Self::from_format(format),
            Err(_) => Self::fallback(),
        }
    }

    fn from_format(format: ImageFormat) -> Self {
        match format.extensions_str().first().copied() {
            Some(extension) => Self {
                extension,
                mime_type: format.to_mime_type(),
            },
            None => Self::fallback(),
        }
    }

    fn fallback() -> Self {
        Self {
            extension: FALLBACK_EXTENSION,
            mime_type: FALLBACK_MIME_TYPE,
        }
    }
}

/// An upload written to disk.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    /// Stored file name without its extension.
    pub image_id: String,
    pub path: PathBuf,
    pub kind: ImageKind,
}

/// Writes uploads into one directory under generated names.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create the store, making `dir` if it does not exist yet.
    pub async fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist `bytes` unmodified as `<uuid>.<ext>`.
    ///
    /// Names come from UUIDv7, so they are time-ordered and never collide in
    /// practice.
    pub async fn save(&self, bytes: &[u8]) -> std::io::Result<StoredUpload> {
        let kind = ImageKind::sniff(bytes);
        let image_id = Uuid::now_v7().simple().to_string();
        let path = self.dir.join(format!("{image_id}.{}", kind.extension));

        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "upload stored");

        Ok(StoredUpload {
            image_id: image_id_from_path(&path).unwrap_or(image_id),
            path,
            kind,
        })
    }
}

/// The session identifier for a stored file: its name minus the extension.
pub fn image_id_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
}
