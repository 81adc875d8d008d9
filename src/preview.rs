//! Read-only preview of a scanned batch.

use serde::Serialize;

/// Maximum characters shown per cell before truncation.
pub const PREVIEW_CELL_CHARS: usize = 20;

/// Header plus a handful of rows, already truncated for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Rows in the batch, not just the ones shown.
    pub total_rows: usize,
}

impl PreviewTable {
    pub fn new(headers: Vec<String>, total_rows: usize) -> Self {
        Self {
            headers,
            rows: Vec::new(),
            total_rows,
        }
    }

    /// Adds a row, truncating each cell.
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.rows
            .push(cells.into_iter().map(|c| truncate_cell(c.as_ref())).collect());
    }

    /// Renders a plain-text table with columns padded to their widest cell.
    pub fn render(&self) -> String {
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let pad = width.saturating_sub(cell.chars().count());
                    format!("{}{}", cell, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = String::new();
        out.push_str(&format_line(&self.headers));
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        out.push('\n');
        for row in &self.rows {
            out.push_str(&format_line(row));
            out.push('\n');
        }
        if self.total_rows > self.rows.len() {
            out.push_str(&format!(
                "... {} more row(s) not shown\n",
                self.total_rows - self.rows.len()
            ));
        }
        out
    }
}

/// Cuts a cell to `PREVIEW_CELL_CHARS` characters, adding `...` when cut.
pub fn truncate_cell(cell: &str) -> String {
    if cell.chars().count() > PREVIEW_CELL_CHARS {
        let head: String = cell.chars().take(PREVIEW_CELL_CHARS).collect();
        format!("{}...", head)
    } else {
        cell.to_string()
    }
}
