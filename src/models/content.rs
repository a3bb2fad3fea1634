//! Content classification models

use serde::{Deserialize, Serialize};

/// Result of classifying a byte buffer as text or binary
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileContentInfo {
    /// Whether the buffer appears to be binary
    pub is_binary: bool,
    /// Detected encoding name (e.g., "UTF-8", "UTF-16LE"), `None` when binary
    pub encoding: Option<String>,
    /// Detection confidence from 0.0 to 1.0
    pub detection_confidence: f64,
    /// Decoded text, `None` when binary
    pub text: Option<String>,
    /// Length of the inspected input in bytes
    pub byte_count: usize,
}

impl FileContentInfo {
    pub(crate) fn text(
        encoding: impl Into<String>,
        confidence: f64,
        text: impl Into<String>,
        byte_count: usize,
    ) -> Self {
        Self {
            is_binary: false,
            encoding: Some(encoding.into()),
            detection_confidence: confidence,
            text: Some(text.into()),
            byte_count,
        }
    }

    pub(crate) fn binary(confidence: f64, byte_count: usize) -> Self {
        Self {
            is_binary: true,
            encoding: None,
            detection_confidence: confidence,
            text: None,
            byte_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_info_has_no_text_fields() {
        let info = FileContentInfo::binary(1.0, 42);
        assert!(info.is_binary);
        assert!(info.encoding.is_none());
        assert!(info.text.is_none());
        assert_eq!(info.byte_count, 42);
    }

    #[test]
    fn test_text_info_serializes_camel_case() {
        let info = FileContentInfo::text("UTF-8", 1.0, "hallo", 5);
        let json = serde_json::to_string(&info).unwrap();
        assert!(json.contains("\"isBinary\":false"));
        assert!(json.contains("\"detectionConfidence\":1.0"));
        assert!(json.contains("\"byteCount\":5"));
    }
}
