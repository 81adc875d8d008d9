//! Atomic CSV file writer used for sample downloads and exports.
//!
//! Writes to a temporary file in the same directory as the destination,
//! then atomically replaces the destination on `finish()`. If dropped
//! before finishing, the temporary file is automatically cleaned up, so a
//! failed export never leaves a half-written file behind.

use std::io::BufWriter;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Writer, WriterBuilder};
use tempfile::NamedTempFile;

use crate::error::AppError;

/// An atomic CSV writer.
pub struct AtomicCsvWriter {
    writer: Writer<BufWriter<NamedTempFile>>,
    final_path: PathBuf,
    rows_written: u64,
}

impl AtomicCsvWriter {
    /// Creates a writer targeting `final_path`.
    ///
    /// `QuoteStyle::Always` reproduces the "every cell quoted" files the admin
    /// screens have always produced; `Necessary` gives minimal quoting.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if the parent directory cannot be determined or
    /// the temporary file cannot be created.
    pub fn new(final_path: impl AsRef<Path>, quote_style: QuoteStyle) -> Result<Self, AppError> {
        let final_path = final_path.as_ref().to_path_buf();
        let temp_file = temp_file_beside(&final_path)?;

        let writer = WriterBuilder::new()
            .quote_style(quote_style)
            .from_writer(BufWriter::new(temp_file));

        Ok(Self {
            writer,
            final_path,
            rows_written: 0,
        })
    }

    /// Writes one row (header or data).
    pub fn write_row<I, T>(&mut self, row: I) -> Result<(), AppError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        self.writer
            .write_record(row)
            .map_err(|e| AppError::Io(format!("Failed to write CSV row: {}", e)))?;
        self.rows_written += 1;
        Ok(())
    }

    /// Number of rows written so far, header included.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Flushes all buffers and atomically persists the file to the final path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if flushing or persisting fails. On error, the
    /// temporary file is cleaned up automatically.
    pub fn finish(self) -> Result<PathBuf, AppError> {
        let buf_writer = self.writer.into_inner().map_err(|e| {
            AppError::Io(format!("Failed to flush CSV writer: {}", e.error()))
        })?;

        let named_temp = buf_writer
            .into_inner()
            .map_err(|e| AppError::Io(format!("Failed to flush buffer: {}", e.error())))?;

        named_temp.persist(&self.final_path).map_err(|e| {
            AppError::Io(format!(
                "Failed to persist file to {}: {}",
                self.final_path.display(),
                e.error
            ))
        })?;

        Ok(self.final_path)
    }
}

/// Creates a temporary file in the directory of `final_path`, so a later
/// `persist` is a same-filesystem rename.
pub(crate) fn temp_file_beside(final_path: &Path) -> Result<NamedTempFile, AppError> {
    let parent_dir = match final_path.parent() {
        Some(p) if p.as_os_str().is_empty() => Path::new("."),
        Some(p) => p,
        None => {
            return Err(AppError::Io(format!(
                "Cannot determine parent directory for: {}",
                final_path.display()
            )))
        }
    };

    NamedTempFile::new_in(parent_dir)
        .map_err(|e| AppError::Io(format!("Failed to create temporary file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_successful_write_quotes_every_cell() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("sample.csv");

        let mut writer =
            AtomicCsvWriter::new(&final_path, QuoteStyle::Always).expect("Failed to create writer");
        writer.write_row(["Question Text", "Option A"]).unwrap();
        writer.write_row(["What is 2+2?", "4"]).unwrap();
        assert_eq!(writer.rows_written(), 2);

        let result_path = writer.finish().expect("Failed to finish");

        assert_eq!(result_path, final_path);
        let content = fs::read_to_string(&final_path).expect("Failed to read file");
        assert!(content.contains("\"Question Text\",\"Option A\""));
        assert!(content.contains("\"What is 2+2?\",\"4\""));
    }

    #[test]
    fn test_drop_cleanup() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("export.csv");

        {
            let mut writer = AtomicCsvWriter::new(&final_path, QuoteStyle::Necessary)
                .expect("Failed to create writer");
            writer.write_row(["Header"]).unwrap();
            // Dropped without finish()
        }

        let entries_after: Vec<_> = fs::read_dir(temp_dir.path())
            .expect("Failed to read dir")
            .collect();
        assert!(entries_after.is_empty(), "temp file should be cleaned up");
        assert!(!final_path.exists());
    }

    #[test]
    fn test_overwrite_behavior() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let final_path = temp_dir.path().join("export.csv");
        fs::write(&final_path, "OLD_CONTENT").unwrap();

        let mut writer = AtomicCsvWriter::new(&final_path, QuoteStyle::Necessary).unwrap();
        writer.write_row(["NEW"]).unwrap();
        writer.finish().unwrap();

        let content = fs::read_to_string(&final_path).unwrap();
        assert!(!content.contains("OLD_CONTENT"));
        assert!(content.contains("NEW"));
    }

    #[test]
    fn test_necessary_quoting_round_trips_through_csv_reader() {
        let temp_dir = TempDir::new().unwrap();
        let final_path = temp_dir.path().join("complex.csv");

        let mut writer = AtomicCsvWriter::new(&final_path, QuoteStyle::Necessary).unwrap();
        writer.write_row(["Question Text", "Correct Answer"]).unwrap();
        writer.write_row(["Select all primes", "A,C"]).unwrap();
        writer.finish().unwrap();

        let mut reader = csv::Reader::from_path(&final_path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "A,C");
    }
}
