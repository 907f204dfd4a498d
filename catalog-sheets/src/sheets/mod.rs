//! Spreadsheet sinks
//!
//! The uploader talks to a spreadsheet through [`SheetSink`]: load it, make sure a
//! named sheet exists, write a block of rows at an A1 range. The per-sheet row
//! capacity is reported by the sink but never enforced by it; staying inside the
//! limit is the caller's job.

mod client;
mod memory;
mod models;

pub use client::SheetsClient;
pub use memory::{MemorySheet, MemorySink, SinkCall};

use async_trait::async_trait;

use crate::error::Result;

/// Default row capacity of one sheet, header row included
pub const DEFAULT_ROWS_LIMIT: usize = 1000;

/// Destination spreadsheet for uploaded rows
#[async_trait]
pub trait SheetSink: Send {
    /// Fetch spreadsheet metadata and the titles of its existing sheets.
    ///
    /// Must be called before any other operation. Calling it again replaces the cached state.
    async fn load_spreadsheet(&mut self, spreadsheet_id: &str) -> Result<()>;

    /// Make sure a sheet titled `name` exists.
    ///
    /// Returns `true` without touching the remote spreadsheet when the title is already
    /// known. A failed creation is logged and reported as `false`.
    async fn add_sheet(&mut self, name: &str) -> bool;

    /// Write a block of rows starting at `range` (e.g. `Sheet1!A2`) in user-entered mode.
    ///
    /// Returns the number of rows the spreadsheet reports as updated.
    async fn write_rows(&mut self, range: &str, values: Vec<Vec<String>>) -> Result<usize>;

    /// Row capacity of a single sheet, header row included
    fn rows_limit(&self) -> usize;
}

/// Build an A1 reference to column A of `row` (1-based) in `sheet`
pub fn a1_range(sheet: &str, row: usize) -> String {
    format!("{}!A{}", quote_sheet_title(sheet), row)
}

/// Only `[A-Za-z_][A-Za-z0-9_]*` titles that cannot be read as a cell reference go unquoted
fn quote_sheet_title(title: &str) -> String {
    if is_plain_title(title) {
        title.to_string()
    } else {
        format!("'{}'", title.replace('\'', "''"))
    }
}

fn is_plain_title(title: &str) -> bool {
    let mut chars = title.chars();
    let leading = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    leading && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !looks_like_reference(title)
}

/// `AB12` (up to three column letters) or `R1C1`-style references, in any case.
/// Expects an ASCII title.
fn looks_like_reference(title: &str) -> bool {
    let letters = title.chars().take_while(char::is_ascii_alphabetic).count();
    let digits = &title[letters..];
    let a1 = (1..=3).contains(&letters)
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit());

    let upper = title.to_ascii_uppercase();
    let column_part = |rest: &str| {
        rest.strip_prefix('C')
            .is_some_and(|n| n.chars().all(|c| c.is_ascii_digit()))
    };
    let r1c1 = match upper.strip_prefix('R') {
        Some(rest) => {
            let rest = rest.trim_start_matches(|c: char| c.is_ascii_digit());
            rest.is_empty() || column_part(rest)
        }
        None => column_part(upper.as_str()),
    };

    a1 || r1c1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_a1_range_plain_title() {
        assert_eq!(a1_range("Sheet1", 1), "Sheet1!A1");
        assert_eq!(a1_range("Sheet12", 2), "Sheet12!A2");
    }

    #[test]
    fn test_a1_range_quotes_titles() {
        assert_eq!(a1_range("Coffee 1", 2), "'Coffee 1'!A2");
        assert_eq!(a1_range("Joe's", 1), "'Joe''s'!A1");
        assert_eq!(a1_range("Café", 1), "'Café'!A1");
        assert_eq!(a1_range("2024", 1), "'2024'!A1");
    }

    #[test]
    fn test_a1_range_quotes_reference_like_titles() {
        // `--prefix A` yields a first sheet named like a cell
        assert_eq!(a1_range("A1", 2), "'A1'!A2");
        assert_eq!(a1_range("xfd9", 2), "'xfd9'!A2");
        assert_eq!(a1_range("R1C1", 1), "'R1C1'!A1");
        assert_eq!(a1_range("rc", 1), "'rc'!A1");
        assert_eq!(a1_range("R12", 1), "'R12'!A1");
        assert_eq!(a1_range("C3", 1), "'C3'!A1");
    }

    #[test]
    fn test_a1_range_keeps_plain_titles_bare() {
        assert_eq!(a1_range("Feed_1", 2), "Feed_1!A2");
        assert_eq!(a1_range("Rows1", 2), "Rows1!A2");
        assert_eq!(a1_range("Archive", 2), "Archive!A2");
        assert_eq!(a1_range("Col", 2), "Col!A2");
    }
}
