//! Attach source lines to report rows
//!
//! Each content document referenced by the report is read from the EPUB and
//! parsed once. Documents that are missing or not well-formed only cost their
//! rows a line number.

use std::collections::BTreeSet;

use crate::dom::{numeric_entities, AnnotatedDocument};
use crate::epub::EpubArchive;
use crate::report::ReportRow;

/// Fill in `line` for every row whose CFI resolves. Returns how many rows
/// were located.
pub fn attach_lines(archive: &mut EpubArchive, rows: &mut [ReportRow]) -> usize {
    let files: BTreeSet<String> = rows
        .iter()
        .filter(|row| row.cfi.is_some())
        .map(|row| row.file.clone())
        .collect();

    let mut located = 0;
    for file in files {
        let text = match archive.read_document(&file) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "Cannot read content document");
                continue;
            }
        };

        let text = numeric_entities(&text);
        let doc = match AnnotatedDocument::parse(&text) {
            Ok(doc) => doc,
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "Cannot parse content document");
                continue;
            }
        };

        for row in rows.iter_mut().filter(|row| row.file == file) {
            row.line = row.cfi.as_deref().and_then(|cfi| doc.line_for_cfi(cfi));
            if row.line.is_some() {
                located += 1;
            }
        }
    }

    tracing::debug!(located, total = rows.len(), "Attached source lines");
    located
}
