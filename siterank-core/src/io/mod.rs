//! Record adapters between text files and the site graph.
//!
//! Readers stream line-oriented records from any [`BufRead`](std::io::BufRead);
//! writers render the solved graph back out in the same line formats.

mod output;
mod records;
mod site_key;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

pub use output::{write_document_ranks, write_root_records, RootWriteStats};
pub use records::{
    AssignmentFormat, AssignmentRecord, DisplayUrlFormat, DisplayUrlRecord, EdgeFormat,
    EdgeRecord, RecordFormat, Records,
};
pub use site_key::site_key;

use crate::error::{InputError, OutputError};

/// Opens `path` for buffered reading.
pub fn open_input(path: &Path) -> Result<BufReader<File>, InputError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })
}

/// Creates `path` (and its parent directories) for buffered writing.
pub fn create_output(path: &Path) -> Result<BufWriter<File>, OutputError> {
    let io_err = |source| OutputError::Io {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    File::create(path).map(BufWriter::new).map_err(io_err)
}

/// Label used in error messages for a record stream read from `path`.
pub fn source_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
