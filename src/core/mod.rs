//! # Core Types Module
//!
//! Fundamental types shared across the optimizer: reference-counted image
//! blobs, session-unique item identifiers, preview-resource accounting, and
//! data-URL helpers.

pub mod data_url;
pub mod preview;

use std::sync::Arc;

/// Session-unique identifier for a tracked image. Ids are never reused
/// within a running session.
pub type ImageId = u64;

/// An in-memory image payload tagged with its MIME type.
///
/// Blobs flow through the pipeline behind an `Arc` so scheduling a
/// conversion, registering a preview, and archiving never copy the bytes.
#[derive(Debug, Clone)]
pub struct ImageBlob {
    /// Raw encoded bytes (shared, never mutated after creation).
    pub data: Arc<Vec<u8>>,
    /// MIME type of the encoded bytes, e.g. `image/webp`.
    pub mime: String,
}

impl ImageBlob {
    /// Create a blob from raw bytes and a MIME type.
    pub fn new(data: Vec<u8>, mime: impl Into<String>) -> Self {
        Self {
            data: Arc::new(data),
            mime: mime.into(),
        }
    }

    /// Byte length of the encoded payload.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_is_cheap_to_clone() {
        let blob = ImageBlob::new(vec![1, 2, 3], "image/png");
        let copy = blob.clone();
        assert!(Arc::ptr_eq(&blob.data, &copy.data));
        assert_eq!(copy.len(), 3);
        assert!(!copy.is_empty());
    }
}
