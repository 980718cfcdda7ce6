use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

use siterank_graph::SiteGraph;

use super::DisplayUrlRecord;
use crate::error::{InputError, OutputError, Result};

/// Counts from writing root-document records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RootWriteStats {
    pub written: usize,
    /// Records whose document has no site.
    pub skipped_unknown: usize,
}

fn write_error(path: &Path) -> impl Fn(std::io::Error) -> OutputError + '_ {
    move |source| OutputError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Writes `<doc_id>, <rank>` for every document. Returns the line count.
///
/// `path` only labels write errors.
pub fn write_document_ranks<W: Write>(
    graph: &SiteGraph,
    mut writer: W,
    path: &Path,
) -> Result<usize> {
    let err = write_error(path);
    let mut written = 0;
    for record in graph.document_ranks() {
        writeln!(writer, "{}, {}", record.doc_id, record.site_rank).map_err(&err)?;
        written += 1;
    }
    writer.flush().map_err(&err)?;
    Ok(written)
}

/// Writes one extended record per display-URL entry whose document is known.
pub fn write_root_records<W, I>(
    graph: &SiteGraph,
    records: I,
    mut writer: W,
    path: &Path,
) -> Result<RootWriteStats>
where
    W: Write,
    I: IntoIterator<Item = std::result::Result<DisplayUrlRecord, InputError>>,
{
    let err = write_error(path);
    let mut stats = RootWriteStats::default();
    for record in records {
        let record = record?;
        let Some(root) = graph.root_record(record.doc_id, &record.url) else {
            warn!(doc_id = %record.doc_id, "Display url for document without a site, skipping");
            stats.skipped_unknown += 1;
            continue;
        };
        writeln!(
            writer,
            "{}, {}, {}, {}, {}, {}, {}, {}",
            root.doc_id,
            root.site_id,
            root.display_url,
            root.site_rank,
            root.in_edge_site_count,
            root.out_edge_site_count,
            root.total_in_doc_count,
            root.total_out_doc_count
        )
        .map_err(&err)?;
        stats.written += 1;
    }
    writer.flush().map_err(&err)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SiteRankError;
    use siterank_graph::{DocId, GraphBuilder};

    fn ranked() -> SiteGraph {
        let mut builder = GraphBuilder::new();
        builder.assign_document(DocId(10), "a");
        builder.assign_document(DocId(11), "b");
        builder.assign_document(DocId(12), "a");
        builder.add_edge(DocId(10), DocId(11));
        builder.add_edge(DocId(12), DocId(11));
        let (mut graph, _) = builder.finalize();
        graph.ranks_mut().next_mut().copy_from_slice(&[0.5, 0.5]);
        graph
    }

    #[test]
    fn document_ranks_grouped_by_site() {
        let mut out = Vec::new();
        let written = write_document_ranks(&ranked(), &mut out, Path::new("ranks.txt")).unwrap();

        assert_eq!(written, 3);
        assert_eq!(String::from_utf8(out).unwrap(), "10, 0.5\n12, 0.5\n11, 0.5\n");
    }

    #[test]
    fn root_records_skip_unknown_documents() {
        let records = vec![
            Ok(DisplayUrlRecord {
                doc_id: DocId(11),
                url: "http://b/".into(),
            }),
            Ok(DisplayUrlRecord {
                doc_id: DocId(99),
                url: "http://gone/".into(),
            }),
        ];
        let mut out = Vec::new();
        let stats =
            write_root_records(&ranked(), records, &mut out, Path::new("root.txt")).unwrap();

        assert_eq!(
            stats,
            RootWriteStats {
                written: 1,
                skipped_unknown: 1
            }
        );
        assert_eq!(String::from_utf8(out).unwrap(), "11, b, http://b/, 0.5, 1, 0, 2, 0\n");
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("disk full"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_names_the_output() {
        let err = write_document_ranks(&ranked(), FailingWriter, Path::new("out/ranks.txt"))
            .unwrap_err();
        assert!(matches!(
            err,
            SiteRankError::Output(OutputError::Io { path, .. }) if path == "out/ranks.txt"
        ));
    }

    #[test]
    fn root_records_stop_at_input_error() {
        let records: Vec<std::result::Result<DisplayUrlRecord, InputError>> =
            vec![Err(InputError::SiteKey("x".into()))];
        let result =
            write_root_records(&ranked(), records, Vec::<u8>::new(), Path::new("root.txt"));
        assert!(matches!(result, Err(SiteRankError::Input(_))));
    }
}
