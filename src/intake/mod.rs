//! # File Intake
//!
//! Reads a set of candidate paths and produces image blobs for tracking.
//! Intake is best-effort by contract: an unreadable file or a file whose
//! bytes are not a recognizable image is skipped with a log line and never
//! turns into a blocking failure.

use std::path::{Path, PathBuf};

use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::core::ImageBlob;

/// One accepted input file: its display name plus the raw bytes.
#[derive(Debug, Clone)]
pub struct IntakeFile {
    pub name: String,
    pub blob: ImageBlob,
}

/// Read all `paths` concurrently, keeping only the ones that hold image
/// data. Skipped files are logged and dropped.
pub async fn collect_files(paths: &[PathBuf]) -> Vec<IntakeFile> {
    let reads = paths.iter().map(|path| read_one(path));
    join_all(reads).await.into_iter().flatten().collect()
}

async fn read_one(path: &Path) -> Option<IntakeFile> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("skipping unreadable file {}: {}", path.display(), e);
            return None;
        }
    };

    let Some(mime) = sniff_image_mime(&bytes) else {
        debug!("skipping non-image file {}", path.display());
        return None;
    };

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Some(IntakeFile {
        name,
        blob: ImageBlob::new(bytes, mime),
    })
}

/// Detect an image MIME type from content, not file extension.
pub fn sniff_image_mime(bytes: &[u8]) -> Option<&'static str> {
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sniff_recognizes_png() {
        let png_signature = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        assert_eq!(sniff_image_mime(&png_signature), Some("image/png"));
    }

    #[test]
    fn test_sniff_rejects_text() {
        assert_eq!(sniff_image_mime(b"just some text, not pixels"), None);
    }

    #[tokio::test]
    async fn test_collect_skips_non_images_and_missing_files() {
        let dir = tempfile::tempdir().unwrap();

        let image_path = dir.path().join("pixel.png");
        let mut file = std::fs::File::create(&image_path).unwrap();
        file.write_all(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0])
            .unwrap();

        let text_path = dir.path().join("notes.txt");
        std::fs::write(&text_path, "hello").unwrap();

        let missing_path = dir.path().join("gone.png");

        let files = collect_files(&[image_path, text_path, missing_path]).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "pixel.png");
        assert_eq!(files[0].blob.mime, "image/png");
    }
}
