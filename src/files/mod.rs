//! Local file I/O: reading import sources and writing CSV/JSON downloads.

mod atomic_writer;
pub mod source;

pub use atomic_writer::AtomicCsvWriter;
pub(crate) use atomic_writer::temp_file_beside;
pub use source::{decode, read_csv_file, read_text_source, LineEndings, SourceText};
