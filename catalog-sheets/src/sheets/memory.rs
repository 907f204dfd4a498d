//! In-memory spreadsheet
//!
//! Behaves like a freshly loaded remote spreadsheet without any network access.
//! Used for `--dry-run` and as the sink in uploader tests.

use std::collections::HashSet;

use async_trait::async_trait;

use super::{DEFAULT_ROWS_LIMIT, SheetSink};
use crate::error::{Result, UploadError};

/// Calls that would have reached the remote spreadsheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Load(String),
    AddSheet(String),
    Write { range: String, rows: usize },
}

/// One sheet held in memory: rows of cell values, row 1 first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySheet {
    pub title: String,
    pub rows: Vec<Vec<String>>,
}

impl MemorySheet {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            rows: Vec::new(),
        }
    }

    /// Place `values` with their top-left cell at (`row`, `col`), both 0-based
    fn write(&mut self, row: usize, col: usize, values: &[Vec<String>]) {
        for (offset, line) in values.iter().enumerate() {
            let target = row + offset;
            if self.rows.len() <= target {
                self.rows.resize(target + 1, Vec::new());
            }
            let cells = &mut self.rows[target];
            if cells.len() < col + line.len() {
                cells.resize(col + line.len(), String::new());
            }
            cells[col..col + line.len()].clone_from_slice(line);
        }
    }
}

/// [`SheetSink`] that keeps every sheet in memory
#[derive(Debug, Clone)]
pub struct MemorySink {
    rows_limit: usize,
    spreadsheet_id: Option<String>,
    sheets: Vec<MemorySheet>,
    calls: Vec<SinkCall>,
    failing_sheets: HashSet<String>,
    max_reported_rows: Option<usize>,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS_LIMIT)
    }
}

impl MemorySink {
    pub fn new(rows_limit: usize) -> Self {
        Self {
            rows_limit,
            spreadsheet_id: None,
            sheets: Vec::new(),
            calls: Vec::new(),
            failing_sheets: HashSet::new(),
            max_reported_rows: None,
        }
    }

    /// Start with sheets that already exist in the spreadsheet
    pub fn with_sheets<I, S>(mut self, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.sheets
            .extend(titles.into_iter().map(|t| MemorySheet::new(t.as_ref())));
        self
    }

    /// Make creation of the sheet titled `name` fail
    #[cfg(test)]
    pub fn fail_creating(mut self, name: &str) -> Self {
        self.failing_sheets.insert(name.to_string());
        self
    }

    /// Report at most `rows` updated rows per write, as a lossy remote might
    #[cfg(test)]
    pub fn report_at_most(mut self, rows: usize) -> Self {
        self.max_reported_rows = Some(rows);
        self
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    pub fn sheet(&self, title: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.title == title)
    }

    pub fn calls(&self) -> &[SinkCall] {
        &self.calls
    }

    pub fn spreadsheet_id(&self) -> Option<&str> {
        self.spreadsheet_id.as_deref()
    }
}

#[async_trait]
impl SheetSink for MemorySink {
    async fn load_spreadsheet(&mut self, spreadsheet_id: &str) -> Result<()> {
        self.calls.push(SinkCall::Load(spreadsheet_id.to_string()));
        self.spreadsheet_id = Some(spreadsheet_id.to_string());
        Ok(())
    }

    async fn add_sheet(&mut self, name: &str) -> bool {
        if self.spreadsheet_id.is_none() {
            log::error!("Cannot create a new sheet titled {}: no spreadsheet loaded", name);
            return false;
        }
        if self.sheet(name).is_some() {
            return true;
        }

        self.calls.push(SinkCall::AddSheet(name.to_string()));
        if self.failing_sheets.contains(name) {
            log::error!("Cannot create a new sheet titled {}", name);
            return false;
        }

        self.sheets.push(MemorySheet::new(name));
        true
    }

    async fn write_rows(&mut self, range: &str, values: Vec<Vec<String>>) -> Result<usize> {
        self.calls.push(SinkCall::Write {
            range: range.to_string(),
            rows: values.len(),
        });

        let context = format!("Failed to write rows to {}", range);
        if self.spreadsheet_id.is_none() {
            return Err(UploadError::remote(context, "no spreadsheet loaded"));
        }

        let (title, row, col) = parse_a1(range)
            .ok_or_else(|| UploadError::remote_status(&context, 400, "Unable to parse range"))?;
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.title == title)
            .ok_or_else(|| UploadError::remote_status(&context, 400, "Unable to parse range"))?;

        let reported = match self.max_reported_rows {
            Some(max) => values.len().min(max),
            None => values.len(),
        };
        sheet.write(row, col, &values[..reported]);

        Ok(reported)
    }

    fn rows_limit(&self) -> usize {
        self.rows_limit
    }
}

/// Split `Title!B3` (or `'Odd title'!B3`) into the title and 0-based row/column
fn parse_a1(range: &str) -> Option<(String, usize, usize)> {
    let (title, cell) = range.rsplit_once('!')?;
    let title = match title.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
        Some(quoted) => quoted.replace("''", "'"),
        None => title.to_string(),
    };

    let split = cell.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cell.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = letters
        .chars()
        .fold(0usize, |acc, c| acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1));
    let row: usize = digits.parse().ok()?;
    if row == 0 {
        return None;
    }

    Some((title, row - 1, col - 1))
}
