//! Error kinds surfaced by a catalog upload run

use std::path::PathBuf;

use thiserror::Error;

/// Every failure that aborts an upload run.
///
/// Input problems (`Io`, `Parse`) are raised before the spreadsheet is touched.
/// `SheetCreation` is what the orchestrator raises when the sink reports it could
/// not create a destination sheet; the sink itself only logs that case.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("cannot read input file {}: {reason}", path.display())]
    Io { path: PathBuf, reason: String },

    #[error("malformed XML in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{context}: {message}")]
    Remote {
        context: String,
        message: String,
        status: Option<u16>,
    },

    #[error("cannot create new sheet '{name}'")]
    SheetCreation { name: String },

    #[error("sheet row limit {limit} leaves no room for data after {used} header row(s)")]
    Capacity { limit: usize, used: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

impl UploadError {
    pub fn remote(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.into(),
            status: None,
        }
    }

    pub fn remote_status(
        context: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.into(),
            status: Some(status),
        }
    }
}

pub type Result<T> = std::result::Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message_includes_context() {
        let err = UploadError::remote_status("Failed to write rows to Sheet1!A2", 403, "denied");
        assert_eq!(err.to_string(), "Failed to write rows to Sheet1!A2: denied");
        assert!(matches!(err, UploadError::Remote { status: Some(403), .. }));
    }

    #[test]
    fn test_input_error_messages_name_the_file() {
        let io = UploadError::Io {
            path: PathBuf::from("feed.xml"),
            reason: "file is empty".to_string(),
        };
        assert_eq!(io.to_string(), "cannot read input file feed.xml: file is empty");

        let parse = UploadError::Parse {
            path: PathBuf::from("feed.xml"),
            message: "unexpected end of stream".to_string(),
        };
        assert_eq!(
            parse.to_string(),
            "malformed XML in feed.xml: unexpected end of stream"
        );
    }
}
