//! Capacity-aware pagination from a row source into sheets

use log::{debug, info};

use super::{SheetSummary, UploadProgress, UploadSummary};
use crate::error::{Result, UploadError};
use crate::feed::{Record, RowSource};
use crate::sheets::{SheetSink, a1_range};

/// Physical row holding the header in every sheet
const HEADER_ROW: usize = 1;

/// Drives one upload run.
///
/// Capacity is recomputed after every batch from the row counts the sink reports, so a
/// sheet never receives more than [`SheetSink::rows_limit`] rows even if the sink stores
/// fewer rows than it was sent.
pub struct Uploader<'a, R: RowSource, S: SheetSink> {
    source: &'a mut R,
    sink: &'a mut S,
    prefix: String,
    sheet_index: usize,
    on_progress: Option<Box<dyn FnMut(&UploadProgress<'_>) + 'a>>,
}

impl<'a, R: RowSource, S: SheetSink> Uploader<'a, R, S> {
    pub fn new(source: &'a mut R, sink: &'a mut S, prefix: &str) -> Self {
        Self {
            source,
            sink,
            prefix: prefix.to_string(),
            sheet_index: 0,
            on_progress: None,
        }
    }

    /// Call `callback` after every batch write
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&UploadProgress<'_>) + 'a,
    {
        self.on_progress = Some(Box::new(callback));
        self
    }

    /// Upload every record of the source into the spreadsheet `spreadsheet_id`.
    ///
    /// A source without header fields completes immediately with no sheets. Any error
    /// aborts the run; rows already written stay where they are.
    pub async fn run(&mut self, spreadsheet_id: &str) -> Result<UploadSummary> {
        self.sink.load_spreadsheet(spreadsheet_id).await?;

        let headers = self.source.headers();
        let mut summary = UploadSummary::default();
        if headers.is_empty() {
            info!("Source has no records, nothing to upload");
            return Ok(summary);
        }

        let limit = self.sink.rows_limit();
        let mut sheet = self.allocate_sheet(&headers, limit).await?;

        loop {
            let remaining = limit.saturating_sub(sheet.rows());
            let batch = self.source.next_batch(remaining);
            if batch.is_empty() {
                break;
            }
            let fetched = self.source.last_batch_len();

            let values: Vec<Vec<String>> = batch.into_iter().map(Record::into_values).collect();
            let range = a1_range(&sheet.name, HEADER_ROW + 1 + sheet.data_rows);
            let written = self.sink.write_rows(&range, values).await?;
            debug!("Wrote {} of {} rows at {}", written, fetched, range);

            sheet.data_rows += written;
            summary.data_rows += written;
            if let Some(callback) = self.on_progress.as_mut() {
                callback(&UploadProgress {
                    sheet: &sheet.name,
                    sheet_rows: sheet.rows(),
                    data_rows: summary.data_rows,
                });
            }

            // A short batch means the source ran dry
            if fetched < remaining {
                break;
            }

            if sheet.rows() >= limit {
                summary.sheets.push(sheet);
                sheet = self.allocate_sheet(&headers, limit).await?;
            }
        }

        summary.sheets.push(sheet);
        Ok(summary)
    }

    /// Create the next sheet in the sequence and write the header row into it
    async fn allocate_sheet(&mut self, headers: &[String], limit: usize) -> Result<SheetSummary> {
        self.sheet_index += 1;
        let name = format!("{}{}", self.prefix, self.sheet_index);

        if !self.sink.add_sheet(&name).await {
            return Err(UploadError::SheetCreation { name });
        }

        let header_rows = self
            .sink
            .write_rows(&a1_range(&name, HEADER_ROW), vec![headers.to_vec()])
            .await?;
        if header_rows >= limit {
            return Err(UploadError::Capacity {
                limit,
                used: header_rows,
            });
        }

        info!("Started sheet {} with {} header row(s)", name, header_rows);
        Ok(SheetSummary {
            name,
            header_rows,
            data_rows: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{DEFAULT_RECORD_PATH, XmlRowSource};
    use crate::sheets::{MemorySink, SinkCall};

    fn feed(count: usize) -> XmlRowSource {
        let items: String = (0..count)
            .map(|i| format!("<item><sku>{}</sku><name>item {}</name></item>", i, i))
            .collect();
        XmlRowSource::from_xml(&format!("<catalog>{}</catalog>", items), DEFAULT_RECORD_PATH)
            .unwrap()
    }

    fn header() -> Vec<String> {
        vec!["sku".to_string(), "name".to_string()]
    }

    async fn upload(source: &mut XmlRowSource, sink: &mut MemorySink) -> Result<UploadSummary> {
        Uploader::new(source, sink, "Sheet").run("spreadsheet-id").await
    }

    fn write_ranges(sink: &MemorySink) -> Vec<String> {
        sink.calls()
            .iter()
            .filter_map(|call| match call {
                SinkCall::Write { range, .. } => Some(range.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_small_feed_fits_one_sheet() {
        let mut source = feed(5);
        let mut sink = MemorySink::new(1000);

        let summary = upload(&mut source, &mut sink).await.unwrap();

        assert_eq!(summary.data_rows, 5);
        assert_eq!(summary.sheets.len(), 1);
        assert_eq!(summary.sheets[0].name, "Sheet1");
        assert_eq!(summary.sheets[0].rows(), 6);

        let sheet = sink.sheet("Sheet1").unwrap();
        assert_eq!(sheet.rows.len(), 6);
        assert_eq!(sheet.rows[0], header());
        assert_eq!(sheet.rows[5], vec!["4".to_string(), "item 4".to_string()]);
        assert_eq!(write_ranges(&sink), vec!["Sheet1!A1", "Sheet1!A2"]);
    }

    #[tokio::test]
    async fn test_overflow_spills_into_second_sheet() {
        let mut source = feed(1001);
        let mut sink = MemorySink::new(1000);

        let summary = upload(&mut source, &mut sink).await.unwrap();

        let totals: Vec<(&str, usize)> = summary
            .sheets
            .iter()
            .map(|s| (s.name.as_str(), s.rows()))
            .collect();
        assert_eq!(totals, vec![("Sheet1", 1000), ("Sheet2", 3)]);
        assert_eq!(summary.data_rows, 1001);

        let first = sink.sheet("Sheet1").unwrap();
        assert_eq!(first.rows.len(), 1000);
        assert_eq!(first.rows[999][0], "998");

        let second = sink.sheet("Sheet2").unwrap();
        assert_eq!(second.rows[0], header());
        assert_eq!(second.rows[1][0], "999");
        assert_eq!(second.rows[2][0], "1000");
    }

    #[tokio::test]
    async fn test_empty_feed_creates_no_sheets() {
        let mut source = feed(0);
        let mut sink = MemorySink::new(1000);

        let summary = upload(&mut source, &mut sink).await.unwrap();

        assert_eq!(summary, UploadSummary::default());
        assert_eq!(sink.calls(), [SinkCall::Load("spreadsheet-id".to_string())]);
        assert!(sink.sheets().is_empty());
    }

    #[tokio::test]
    async fn test_failed_second_sheet_aborts_after_first_is_written() {
        let mut source = feed(1001);
        let mut sink = MemorySink::new(1000).fail_creating("Sheet2");

        let err = upload(&mut source, &mut sink).await.unwrap_err();

        assert!(matches!(err, UploadError::SheetCreation { ref name } if name == "Sheet2"));
        assert_eq!(sink.sheet("Sheet1").unwrap().rows.len(), 1000);
        assert!(sink.sheet("Sheet2").is_none());
        assert!(write_ranges(&sink).iter().all(|r| r.starts_with("Sheet1!")));
        assert_eq!(sink.calls().last(), Some(&SinkCall::AddSheet("Sheet2".to_string())));
    }

    #[tokio::test]
    async fn test_rows_and_sheets_across_feed_sizes() {
        let limit = 4;
        for count in 0..=13 {
            let mut source = feed(count);
            let mut sink = MemorySink::new(limit);

            let summary = upload(&mut source, &mut sink).await.unwrap();
            assert_eq!(summary.data_rows, count, "data rows for {} records", count);

            for (index, sheet) in sink.sheets().iter().enumerate() {
                assert_eq!(sheet.title, format!("Sheet{}", index + 1));
                assert!(sheet.rows.len() <= limit, "{} overflowed", sheet.title);
                assert_eq!(sheet.rows[0], header());
            }

            let stored: usize = sink.sheets().iter().map(|s| s.rows.len() - 1).sum();
            assert_eq!(stored, count);
        }
    }

    #[tokio::test]
    async fn test_exactly_full_sheet_allocates_next_before_finishing() {
        let mut source = feed(3);
        let mut sink = MemorySink::new(4);

        let summary = upload(&mut source, &mut sink).await.unwrap();

        let names: Vec<&str> = summary.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Sheet1", "Sheet2"]);
        assert_eq!(summary.sheets[1].rows(), 1);
    }

    #[tokio::test]
    async fn test_under_reported_writes_never_overflow() {
        let mut source = feed(6);
        let mut sink = MemorySink::new(5).report_at_most(2);

        let summary = upload(&mut source, &mut sink).await.unwrap();

        assert_eq!(summary.sheets[0].rows(), 5);
        assert_eq!(summary.data_rows, 4);
        assert_eq!(
            write_ranges(&sink),
            vec!["Sheet1!A1", "Sheet1!A2", "Sheet1!A4", "Sheet2!A1"]
        );
        assert!(sink.sheets().iter().all(|s| s.rows.len() <= 5));
    }

    #[tokio::test]
    async fn test_existing_sheet_is_reused() {
        let mut source = feed(2);
        let mut sink = MemorySink::new(1000).with_sheets(["Sheet1"]);

        upload(&mut source, &mut sink).await.unwrap();

        assert!(!sink
            .calls()
            .iter()
            .any(|c| matches!(c, SinkCall::AddSheet(_))));
        assert_eq!(sink.sheet("Sheet1").unwrap().rows.len(), 3);
    }

    #[tokio::test]
    async fn test_progress_reported_per_batch() {
        let mut source = feed(7);
        let mut sink = MemorySink::new(4);
        let mut events = Vec::new();

        Uploader::new(&mut source, &mut sink, "Coffee")
            .on_progress(|p| events.push((p.sheet.to_string(), p.sheet_rows, p.data_rows)))
            .run("spreadsheet-id")
            .await
            .unwrap();

        assert_eq!(
            events,
            vec![
                ("Coffee1".to_string(), 4, 3),
                ("Coffee2".to_string(), 4, 6),
                ("Coffee3".to_string(), 2, 7),
            ]
        );
    }

    #[tokio::test]
    async fn test_limit_without_room_for_data_is_capacity_error() {
        let mut source = feed(2);
        let mut sink = MemorySink::new(1);

        let err = upload(&mut source, &mut sink).await.unwrap_err();
        assert!(matches!(err, UploadError::Capacity { limit: 1, used: 1 }));
    }

    #[tokio::test]
    async fn test_first_sheet_creation_failure_writes_nothing() {
        let mut source = feed(2);
        let mut sink = MemorySink::new(1000).fail_creating("Sheet1");

        let err = upload(&mut source, &mut sink).await.unwrap_err();

        assert!(matches!(err, UploadError::SheetCreation { .. }));
        assert!(write_ranges(&sink).is_empty());
    }
}
