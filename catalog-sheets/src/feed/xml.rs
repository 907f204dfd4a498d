//! XML catalog feed reader
//!
//! Parses the whole feed up front so malformed input is rejected before anything is
//! uploaded, then hands records out in batches, releasing each batch as it goes.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node};

use super::{Record, RowSource};
use crate::error::{Result, UploadError};

/// Default location of records: every `item` directly under a `catalog` element
pub const DEFAULT_RECORD_PATH: &str = "catalog/item";

/// Row source over the repeated record elements of an XML document
#[derive(Debug)]
pub struct XmlRowSource {
    headers: Vec<String>,
    pending: VecDeque<Record>,
    total: usize,
    last_batch_len: usize,
}

impl XmlRowSource {
    /// Read and parse an XML feed from disk.
    ///
    /// The bytes are decoded using the byte order mark or the `encoding` named in the
    /// XML declaration, UTF-8 when neither is present.
    pub fn load(path: impl AsRef<Path>, record_path: &str) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| {
            log::error!("Cannot read content from {}: {}", path.display(), e);
            UploadError::Io {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        if bytes.is_empty() {
            log::error!("Cannot read content from {}: file is empty", path.display());
            return Err(UploadError::Io {
                path: path.to_path_buf(),
                reason: "file is empty".to_string(),
            });
        }

        let content = decode_feed(&bytes).map_err(|message| UploadError::Parse {
            path: path.to_path_buf(),
            message,
        })?;

        Self::from_xml(&content, record_path).map_err(|e| match e {
            UploadError::Parse { message, .. } => UploadError::Parse {
                path: path.to_path_buf(),
                message,
            },
            other => other,
        })
    }

    /// Parse an in-memory XML feed
    pub fn from_xml(xml: &str, record_path: &str) -> Result<Self> {
        let segments: Vec<&str> = record_path.split('/').filter(|s| !s.is_empty()).collect();
        if segments.is_empty() {
            return Err(UploadError::Config(format!(
                "record path '{}' names no elements",
                record_path
            )));
        }

        let doc = Document::parse(xml).map_err(|e| UploadError::Parse {
            path: "<memory>".into(),
            message: e.to_string(),
        })?;

        let pending: VecDeque<Record> = select_records(&doc, &segments)
            .into_iter()
            .map(flatten_record)
            .collect();
        let headers = pending
            .front()
            .map(Record::field_names)
            .unwrap_or_default();

        log::debug!(
            "Parsed {} records at '{}' with {} header fields",
            pending.len(),
            record_path,
            headers.len()
        );

        Ok(Self {
            headers,
            total: pending.len(),
            pending,
            last_batch_len: 0,
        })
    }

    /// Total number of records in the feed
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl RowSource for XmlRowSource {
    fn headers(&self) -> Vec<String> {
        self.headers.clone()
    }

    fn next_batch(&mut self, max_size: usize) -> Vec<Record> {
        let take = max_size.min(self.pending.len());
        let batch: Vec<Record> = self.pending.drain(..take).collect();
        self.last_batch_len = batch.len();
        batch
    }

    fn last_batch_len(&self) -> usize {
        self.last_batch_len
    }
}

/// Decode raw feed bytes into text. A BOM wins over the declared encoding.
fn decode_feed(bytes: &[u8]) -> std::result::Result<String, String> {
    let encoding = match declared_encoding(bytes) {
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| format!("unsupported encoding '{}'", label))?,
        None => UTF_8,
    };

    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(format!("content is not valid {}", used.name()));
    }
    Ok(text.into_owned())
}

/// `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = std::str::from_utf8(&head[..end]).ok()?;

    let rest = decl.split_once("encoding")?.1.trim_start();
    let rest = rest.strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|close| value[..close].to_string())
}

/// Resolve a record path the way `//first/second/...` would: the first segment
/// anywhere in the document, every following segment as a direct child.
fn select_records<'a, 'input>(doc: &'a Document<'input>, segments: &[&str]) -> Vec<Node<'a, 'input>> {
    let (first, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Vec::new(),
    };

    let mut current: Vec<Node> = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == *first)
        .collect();

    for segment in rest {
        current = current
            .iter()
            .flat_map(|parent| {
                parent
                    .children()
                    .filter(move |c| c.is_element() && c.tag_name().name() == *segment)
            })
            .collect();
    }

    current
}

fn flatten_record(node: Node) -> Record {
    node.children()
        .filter(Node::is_element)
        .map(|field| (field.tag_name().name().to_string(), text_content(field)))
        .collect()
}

/// Concatenated text of all descendant text and CDATA nodes
fn text_content(node: Node) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
