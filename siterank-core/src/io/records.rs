use std::borrow::Cow;
use std::io::BufRead;
use std::marker::PhantomData;

use tracing::debug;

use siterank_graph::DocId;

use crate::error::InputError;

/// `<doc_id>,<site_id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    pub doc_id: DocId,
    pub site_id: String,
}

/// `<src_doc_id>\t<dst_doc_id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRecord {
    pub source: DocId,
    pub destination: DocId,
}

/// `<doc_id>\t<display_url>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayUrlRecord {
    pub doc_id: DocId,
    pub url: String,
}

/// A line-oriented record format.
pub trait RecordFormat {
    type Record;

    /// Parses one non-blank line. `Ok(None)` skips the line.
    fn parse(line: &str) -> Result<Option<Self::Record>, String>;
}

#[derive(Debug)]
pub struct AssignmentFormat;

#[derive(Debug)]
pub struct EdgeFormat;

#[derive(Debug)]
pub struct DisplayUrlFormat;

fn parse_doc_id(text: &str) -> Result<DocId, String> {
    let text = text.trim();
    text.parse::<i64>()
        .map(DocId)
        .map_err(|e| format!("invalid document id {text:?}: {e}"))
}

impl RecordFormat for AssignmentFormat {
    type Record = AssignmentRecord;

    fn parse(line: &str) -> Result<Option<AssignmentRecord>, String> {
        let (doc, site) = line
            .split_once(',')
            .ok_or_else(|| "expected <doc_id>,<site_id>".to_string())?;
        if site.is_empty() {
            return Err("empty site id".into());
        }
        Ok(Some(AssignmentRecord {
            doc_id: parse_doc_id(doc)?,
            site_id: site.to_string(),
        }))
    }
}

impl RecordFormat for EdgeFormat {
    type Record = EdgeRecord;

    fn parse(line: &str) -> Result<Option<EdgeRecord>, String> {
        let (src, dst) = line
            .split_once('\t')
            .ok_or_else(|| "expected <src_doc_id>\\t<dst_doc_id>".to_string())?;
        Ok(Some(EdgeRecord {
            source: parse_doc_id(src)?,
            destination: parse_doc_id(dst)?,
        }))
    }
}

impl RecordFormat for DisplayUrlFormat {
    type Record = DisplayUrlRecord;

    fn parse(line: &str) -> Result<Option<DisplayUrlRecord>, String> {
        match line.find('\t') {
            None | Some(0) => Ok(None),
            Some(tab) => Ok(Some(DisplayUrlRecord {
                doc_id: parse_doc_id(&line[..tab])?,
                url: line[tab + 1..].to_string(),
            })),
        }
    }
}

/// Streaming iterator of parsed records with 1-based line tracking.
///
/// Blank lines are skipped and line endings (`\n`, `\r\n`) stripped before
/// parsing. Bytes that are not valid UTF-8 are decoded as U+FFFD. A read
/// error ends the stream after it is yielded.
#[derive(Debug)]
pub struct Records<R, F> {
    reader: R,
    source_name: String,
    line: usize,
    buf: Vec<u8>,
    done: bool,
    format: PhantomData<F>,
}

impl<R: BufRead, F: RecordFormat> Records<R, F> {
    pub fn new(reader: R, source_name: impl Into<String>) -> Self {
        Self {
            reader,
            source_name: source_name.into(),
            line: 0,
            buf: Vec::new(),
            done: false,
            format: PhantomData,
        }
    }

    /// Line number of the most recently read line.
    pub fn line(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Records<R, AssignmentFormat> {
    pub fn assignments(reader: R, source_name: impl Into<String>) -> Self {
        Self::new(reader, source_name)
    }
}

impl<R: BufRead> Records<R, EdgeFormat> {
    pub fn edges(reader: R, source_name: impl Into<String>) -> Self {
        Self::new(reader, source_name)
    }
}

impl<R: BufRead> Records<R, DisplayUrlFormat> {
    pub fn display_urls(reader: R, source_name: impl Into<String>) -> Self {
        Self::new(reader, source_name)
    }
}

impl<R: BufRead, F: RecordFormat> Iterator for Records<R, F> {
    type Item = Result<F::Record, InputError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line += 1;
                    let decoded = String::from_utf8_lossy(&self.buf);
                    if let Cow::Owned(_) = decoded {
                        debug!(
                            source = %self.source_name,
                            line = self.line,
                            "Replaced invalid UTF-8 in record"
                        );
                    }
                    let text = decoded.trim_end_matches(['\n', '\r']);
                    if text.trim().is_empty() {
                        continue;
                    }
                    match F::parse(text) {
                        Ok(Some(record)) => return Some(Ok(record)),
                        Ok(None) => {}
                        Err(message) => {
                            return Some(Err(InputError::Malformed {
                                source_name: self.source_name.clone(),
                                line: self.line,
                                message,
                            }));
                        }
                    }
                }
                Err(source) => {
                    self.done = true;
                    return Some(Err(InputError::Io {
                        path: self.source_name.clone(),
                        source,
                    }));
                }
            }
        }
        None
    }
}
