//! Catalog upload orchestration
//!
//! Pages records out of a [`RowSource`] into sheets of a [`SheetSink`], starting a
//! new sheet (with its own copy of the header row) whenever the current one reaches
//! the sink's row limit.

mod uploader;

pub use uploader::Uploader;

use std::path::Path;

use crate::error::Result;
use crate::feed::{DEFAULT_RECORD_PATH, RowSource, XmlRowSource};
use crate::sheets::SheetSink;

/// Knobs of a single upload run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Sheets are named `prefix1`, `prefix2`, ...
    pub sheet_prefix: String,
    /// Element path to the repeated record element in the feed
    pub record_path: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            sheet_prefix: "Sheet".to_string(),
            record_path: DEFAULT_RECORD_PATH.to_string(),
        }
    }
}

/// Progress after one batch write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress<'a> {
    pub sheet: &'a str,
    /// Rows in the current sheet, header included
    pub sheet_rows: usize,
    /// Data rows written across all sheets so far
    pub data_rows: usize,
}

/// Final row counts of one sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub name: String,
    pub header_rows: usize,
    pub data_rows: usize,
}

impl SheetSummary {
    /// Running total: header plus data rows
    pub fn rows(&self) -> usize {
        self.header_rows + self.data_rows
    }
}

/// Outcome of a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadSummary {
    pub sheets: Vec<SheetSummary>,
    pub data_rows: usize,
}

/// Load the feed at `input` and upload it into `spreadsheet_id`.
///
/// The feed is read and parsed before the sink is touched, so unreadable or malformed
/// input fails without any remote call.
pub async fn upload_catalog<S, F>(
    input: &Path,
    spreadsheet_id: &str,
    sink: &mut S,
    options: &UploadOptions,
    on_progress: F,
) -> Result<UploadSummary>
where
    S: SheetSink,
    F: FnMut(&UploadProgress<'_>),
{
    let mut source = XmlRowSource::load(input, &options.record_path)?;
    log::info!(
        "Loaded {} records from {}",
        source.len(),
        input.display()
    );

    upload_rows(&mut source, spreadsheet_id, sink, options, on_progress).await
}

/// Upload everything `source` yields into `spreadsheet_id`
pub async fn upload_rows<R, S, F>(
    source: &mut R,
    spreadsheet_id: &str,
    sink: &mut S,
    options: &UploadOptions,
    on_progress: F,
) -> Result<UploadSummary>
where
    R: RowSource,
    S: SheetSink,
    F: FnMut(&UploadProgress<'_>),
{
    Uploader::new(source, sink, &options.sheet_prefix)
        .on_progress(on_progress)
        .run(spreadsheet_id)
        .await
}
