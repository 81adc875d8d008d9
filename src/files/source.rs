//! Source reader: turns a file or stdin into validated UTF-8 text.
//!
//! Catches the problems that would otherwise surface as confusing parse
//! errors further down:
//! - UTF-8 encoding errors
//! - Leading BOM (stripped, reported as a warning)
//! - Empty input
//! - Line ending style (mixed endings are reported)

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::io::AsyncReadExt;
use tracing::info;

use crate::error::AppError;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// UTF-8 BOM bytes.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Path argument that means "read from stdin".
pub const STDIN_MARKER: &str = "-";

// ─────────────────────────────────────────────────────────────────────────────
// Public Types
// ─────────────────────────────────────────────────────────────────────────────

/// Detected line ending style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineEndings {
    /// Unix-style line endings (\n).
    LF,
    /// Windows-style line endings (\r\n).
    CRLF,
    /// Mixed line endings (both \n and \r\n found).
    Mixed,
    /// No line endings detected (single line or empty).
    Unknown,
}

/// Raw source text with the facts learned while decoding it.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// Decoded text, BOM removed.
    pub text: String,
    /// Whether the input started with a UTF-8 BOM.
    pub had_bom: bool,
    pub line_endings: LineEndings,
}

// ─────────────────────────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────────────────────────

/// Decodes raw bytes into source text.
///
/// # Errors
///
/// - `AppError::EmptyInput` if there is nothing but whitespace
/// - `AppError::NotUtf8` if the bytes are not valid UTF-8
pub fn decode(bytes: &[u8]) -> Result<SourceText, AppError> {
    let had_bom = bytes.starts_with(UTF8_BOM);
    let data = if had_bom { &bytes[UTF8_BOM.len()..] } else { bytes };

    let text = std::str::from_utf8(data).map_err(|_| AppError::NotUtf8)?;
    if text.trim().is_empty() {
        return Err(AppError::EmptyInput);
    }

    Ok(SourceText {
        text: text.to_string(),
        had_bom,
        line_endings: detect_line_endings(data),
    })
}

/// Reads a CSV file selected by the user.
///
/// Only files with a `.csv` extension (any case) are accepted.
pub async fn read_csv_file(path: &Path) -> Result<SourceText, AppError> {
    if !has_csv_extension(path) {
        return Err(AppError::NotCsvFile);
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Io(format!("Failed to read file: {}", e)))?;

    info!("[SOURCE] Read CSV file ({} bytes)", bytes.len());
    decode(&bytes)
}

/// Reads JSON text from a file, or from stdin when `path` is `-`.
pub async fn read_text_source(path: &Path) -> Result<SourceText, AppError> {
    let bytes = if path.as_os_str() == STDIN_MARKER {
        let mut buf = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut buf)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read stdin: {}", e)))?;
        info!("[SOURCE] Read {} bytes from stdin", buf.len());
        buf
    } else {
        let buf = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read file: {}", e)))?;
        info!("[SOURCE] Read text file ({} bytes)", buf.len());
        buf
    };

    decode(&bytes)
}

// ─────────────────────────────────────────────────────────────────────────────
// Internal Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Detects line ending style in the given bytes.
fn detect_line_endings(data: &[u8]) -> LineEndings {
    let mut has_lf = false;
    let mut has_crlf = false;

    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && i + 1 < data.len() && data[i + 1] == b'\n' {
            has_crlf = true;
            i += 2;
        } else if data[i] == b'\n' {
            has_lf = true;
            i += 1;
        } else {
            i += 1;
        }
    }

    match (has_lf, has_crlf) {
        (true, true) => LineEndings::Mixed,
        (true, false) => LineEndings::LF,
        (false, true) => LineEndings::CRLF,
        (false, false) => LineEndings::Unknown,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn create_temp_file(suffix: &str, content: &[u8]) -> NamedTempFile {
        let mut file = Builder::new()
            .suffix(suffix)
            .tempfile()
            .expect("Failed to create temp file");
        file.write_all(content).expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn decode_strips_bom() {
        let mut content = Vec::new();
        content.extend_from_slice(UTF8_BOM);
        content.extend_from_slice(b"Question Text\nQ1\n");

        let source = decode(&content).unwrap();

        assert!(source.had_bom);
        assert!(source.text.starts_with("Question Text"));
    }

    #[test]
    fn decode_rejects_non_utf8() {
        let err = decode(b"Name,Value\n\xff\xfe,123\n").unwrap_err();
        assert!(matches!(err, AppError::NotUtf8));
    }

    #[test]
    fn decode_rejects_blank_input() {
        assert!(matches!(decode(b"").unwrap_err(), AppError::EmptyInput));
        assert!(matches!(decode(b"  \n\r\n").unwrap_err(), AppError::EmptyInput));
    }

    #[test]
    fn test_detect_line_endings_lf() {
        assert_eq!(detect_line_endings(b"line1\nline2\n"), LineEndings::LF);
    }

    #[test]
    fn test_detect_line_endings_crlf() {
        assert_eq!(detect_line_endings(b"line1\r\nline2\r\n"), LineEndings::CRLF);
    }

    #[test]
    fn test_detect_line_endings_mixed() {
        assert_eq!(detect_line_endings(b"line1\r\nline2\nline3\r\n"), LineEndings::Mixed);
    }

    #[test]
    fn test_detect_line_endings_unknown() {
        assert_eq!(detect_line_endings(b"single line"), LineEndings::Unknown);
    }

    #[tokio::test]
    async fn read_csv_file_rejects_other_extensions() {
        let file = create_temp_file(".txt", b"a,b\n1,2\n");
        let err = read_csv_file(file.path()).await.unwrap_err();
        assert!(matches!(err, AppError::NotCsvFile));
    }

    #[tokio::test]
    async fn read_csv_file_accepts_uppercase_extension() {
        let file = create_temp_file(".CSV", b"a,b\n1,2\n");
        let source = read_csv_file(file.path()).await.unwrap();
        assert_eq!(source.line_endings, LineEndings::LF);
    }

    #[tokio::test]
    async fn read_text_source_reads_file() {
        let file = create_temp_file(".json", b"[{\"questionText\":\"Q\"}]");
        let source = read_text_source(file.path()).await.unwrap();
        assert!(source.text.contains("questionText"));
    }

    #[tokio::test]
    async fn read_text_source_reports_missing_file() {
        let err = read_text_source(Path::new("/definitely/not/here.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
