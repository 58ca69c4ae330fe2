//! # Archive Builder
//!
//! Bundles every completed item's output blob into one zip archive for a
//! single download. Entry names derive from the original filename: strip
//! the extension, append `_opti`, and take the new extension from the MIME
//! type the converter actually produced — not the requested format, so an
//! encoder that silently fell back to another codec still yields a correct
//! extension. Name collisions get a `_(n)` suffix.
//!
//! Items without an output (anything not COMPLETED) are silently excluded;
//! that is expected, not an error.

use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::Arc;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::controller::TrackedImage;
use crate::convert::extension_for_mime;
use crate::error::{OptimizeError, OptimizeResult};

/// Fixed filename of the "download all" bundle.
pub const ARCHIVE_FILE_NAME: &str = "optimized_images.zip";

/// Suffix appended to every converted file's stem.
const NAME_SUFFIX: &str = "_opti";

/// Derive a collision-free output filename from an original name and the
/// produced MIME type, recording the choice in `used`.
pub fn unique_output_name(used: &mut HashSet<String>, original: &str, mime: &str) -> String {
    let stem = name_stem(original);
    let ext = extension_for_mime(mime);

    let mut candidate = format!("{}{}.{}", stem, NAME_SUFFIX, ext);
    let mut n = 1;
    while used.contains(&candidate) {
        candidate = format!("{}{}_({}).{}", stem, NAME_SUFFIX, n, ext);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Original name with its final extension stripped.
fn name_stem(original: &str) -> &str {
    match original.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => original,
    }
}

/// Serialize every completed item's output into one in-memory zip archive.
pub async fn build_archive(items: &[TrackedImage]) -> OptimizeResult<Vec<u8>> {
    // Collect (entry name, bytes) up front so serialization can move to
    // the blocking pool without borrowing the item list.
    let mut used = HashSet::new();
    let entries: Vec<(String, Arc<Vec<u8>>)> = items
        .iter()
        .filter_map(|item| {
            let output = item.output()?;
            let name = unique_output_name(&mut used, item.name(), &output.blob.mime);
            Some((name, Arc::clone(&output.blob.data)))
        })
        .collect();

    tokio::task::spawn_blocking(move || serialize_zip(entries))
        .await
        .map_err(|e| OptimizeError::archive(format!("archive task failed: {}", e)))?
}

fn serialize_zip(entries: Vec<(String, Arc<Vec<u8>>)>) -> OptimizeResult<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, data) in entries {
        writer.start_file(name.as_str(), options)?;
        writer
            .write_all(&data)
            .map_err(|e| OptimizeError::io("archive entry write", e))?;
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_derivation() {
        let mut used = HashSet::new();
        assert_eq!(
            unique_output_name(&mut used, "photo.png", "image/webp"),
            "photo_opti.webp"
        );
    }

    #[test]
    fn test_jpeg_mime_maps_to_jpg() {
        let mut used = HashSet::new();
        assert_eq!(
            unique_output_name(&mut used, "scan.avif", "image/jpeg"),
            "scan_opti.jpg"
        );
    }

    #[test]
    fn test_collisions_get_numbered() {
        let mut used = HashSet::new();
        let first = unique_output_name(&mut used, "shot.png", "image/webp");
        let second = unique_output_name(&mut used, "shot.jpg", "image/webp");
        let third = unique_output_name(&mut used, "shot.bmp", "image/webp");

        assert_eq!(first, "shot_opti.webp");
        assert_eq!(second, "shot_opti_(1).webp");
        assert_eq!(third, "shot_opti_(2).webp");
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        assert_eq!(name_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(name_stem("noext"), "noext");
        assert_eq!(name_stem(".hidden"), ".hidden");
    }
}
