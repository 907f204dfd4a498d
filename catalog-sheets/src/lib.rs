//! Upload XML catalog feeds into Google Sheets
//!
//! Records are read from an XML feed ([`feed`]), paged into sheets that respect the
//! spreadsheet's per-sheet row limit ([`upload`]) and written through a spreadsheet
//! sink ([`sheets`]).

pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod sheets;
pub mod upload;

pub use error::{Result, UploadError};
