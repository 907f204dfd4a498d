//! Row sources for catalog uploads
//!
//! A row source exposes the header row of a feed (the field names of its first
//! record) and hands out records in bounded batches. The upload orchestrator only
//! depends on the [`RowSource`] trait; [`XmlRowSource`] is the XML feed reader.

mod record;
mod xml;

pub use record::Record;
pub use xml::{DEFAULT_RECORD_PATH, XmlRowSource};

/// Paged access to a sequence of flat records
pub trait RowSource {
    /// Field names of the first record, in document order. Empty if there are no records.
    fn headers(&self) -> Vec<String>;

    /// Return up to `max_size` records following the previous batch.
    ///
    /// An empty batch means the source is exhausted; it is never an error.
    fn next_batch(&mut self, max_size: usize) -> Vec<Record>;

    /// Number of records returned by the most recent [`RowSource::next_batch`] call
    fn last_batch_len(&self) -> usize;
}
