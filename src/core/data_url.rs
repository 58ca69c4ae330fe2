//! Data-URL helpers: turn a blob into a `data:<mime>;base64,<payload>`
//! string for display or transport, and strip that prefix back off before
//! handing the payload to a remote endpoint.

use base64::{Engine as _, engine::general_purpose};

use crate::core::ImageBlob;

/// Encode a blob as a base64 data URL.
pub fn encode_data_url(blob: &ImageBlob) -> String {
    let payload = general_purpose::STANDARD.encode(blob.data.as_slice());
    format!("data:{};base64,{}", blob.mime, payload)
}

/// Strip any `data:...;base64,` prefix, returning the bare payload.
/// Strings without a prefix pass through unchanged.
pub fn strip_data_url_prefix(value: &str) -> &str {
    match value.split_once(";base64,") {
        Some((scheme, payload)) if scheme.starts_with("data:") => payload,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_prefix() {
        let blob = ImageBlob::new(vec![0x89, 0x50, 0x4E, 0x47], "image/png");
        let url = encode_data_url(&blob);
        assert!(url.starts_with("data:image/png;base64,"));

        let payload = strip_data_url_prefix(&url);
        let decoded = general_purpose::STANDARD.decode(payload).unwrap();
        assert_eq!(decoded, vec![0x89, 0x50, 0x4E, 0x47]);
    }

    #[test]
    fn test_bare_payload_passes_through() {
        assert_eq!(strip_data_url_prefix("aGVsbG8="), "aGVsbG8=");
    }
}
