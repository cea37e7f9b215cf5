//! Document text extraction.
//!
//! PDF page extraction and OCR are external collaborators behind
//! [`DocumentConverter`]. Empty output is a valid (blank) document; only a
//! converter-signalled failure is an error.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Could not extract text from {format_hint} document: {reason}")]
    Failed { format_hint: String, reason: String },
}

/// Bytes -> text converter.
pub trait DocumentConverter: Send + Sync {
    /// Format this converter handles, reported in errors (`application/pdf`,
    /// `image/png`, ...).
    fn format_hint(&self) -> &str;

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ConversionError>;
}

/// UTF-8 text uploads. A leading byte-order mark is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextConverter;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

impl DocumentConverter for PlainTextConverter {
    fn format_hint(&self) -> &str {
        "text/plain"
    }

    fn extract_text(&self, bytes: &[u8]) -> Result<String, ConversionError> {
        let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        String::from_utf8(body.to_vec()).map_err(|e| ConversionError::Failed {
            format_hint: self.format_hint().to_string(),
            reason: format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_extraction() {
        let text = PlainTextConverter.extract_text(b"Call 555-123-4567").unwrap();
        assert_eq!(text, "Call 555-123-4567");
    }

    #[test]
    fn test_bom_is_stripped() {
        let text = PlainTextConverter.extract_text(b"\xEF\xBB\xBFhello").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn test_empty_document_is_valid() {
        assert_eq!(PlainTextConverter.extract_text(b"").unwrap(), "");
    }

    #[test]
    fn test_invalid_utf8_reports_format() {
        let err = PlainTextConverter.extract_text(&[b'o', b'k', 0xFF, 0xFE]).unwrap_err();
        assert_eq!(
            err,
            ConversionError::Failed {
                format_hint: "text/plain".into(),
                reason: "invalid UTF-8 at byte 2".into(),
            }
        );
    }
}
