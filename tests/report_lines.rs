//! End-to-end: Ace report + EPUB -> rows with source lines

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use ace_check::dom::{numeric_entities, AnnotatedDocument};
use ace_check::epub::EpubArchive;
use ace_check::locate::attach_lines;
use ace_check::navigate::{jump_to_location, Navigator};
use ace_check::report::{flatten, AceReport, Impact};
use zip::write::SimpleFileOptions;

const CHAPTER: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" xmlns:epub="http://www.idpf.org/2007/ops">
<head>
  <title>Chapter 1</title>
</head>
<body>
  <section epub:type="chapter" id="c1">
    <h1>Call me&nbsp;Ishmael</h1>
    <img src="../Images/whale.jpg"/>
    <p>Some years ago.</p>
  </section>
</body>
</html>
"#;

const REPORT: &str = r#"{
  "earl:result": { "earl:outcome": "fail" },
  "earl:testSubject": { "url": "book.epub", "metadata": { "dc:title": "Moby Dick" } },
  "assertions": [
    {
      "earl:testSubject": { "url": "Text/chapter%201.xhtml" },
      "assertions": [
        {
          "earl:test": { "earl:impact": "moderate", "dct:title": "epub-type-has-matching-role" },
          "earl:result": {
            "earl:outcome": "fail",
            "dct:description": "Element has no ARIA role matching its epub:type",
            "earl:pointer": { "cfi": ["/6/4[c1]"] },
            "html": "<section epub:type=\"chapter\" id=\"c1\">"
          }
        },
        {
          "earl:test": { "earl:impact": "critical", "dct:title": "image-alt" },
          "earl:result": {
            "earl:outcome": "fail",
            "dct:description": "Images must have alternate text",
            "earl:pointer": { "cfi": ["/6/4[c1]/6"] }
          }
        },
        {
          "earl:test": { "earl:impact": "minor", "dct:title": "region" },
          "earl:result": {
            "earl:outcome": "fail",
            "earl:pointer": { "cfi": ["/6/40"] }
          }
        }
      ]
    },
    {
      "earl:testSubject": { "url": "Text/missing.xhtml" },
      "assertions": [
        {
          "earl:test": { "earl:impact": "serious", "dct:title": "document-title" },
          "earl:result": { "earl:outcome": "fail", "earl:pointer": { "cfi": ["/4"] } }
        }
      ]
    },
    {
      "earl:testSubject": { "url": "Text/broken.xhtml" },
      "assertions": [
        {
          "earl:test": { "earl:impact": "serious", "dct:title": "html-has-lang" },
          "earl:result": { "earl:outcome": "fail", "earl:pointer": { "cfi": ["/4"] } }
        }
      ]
    }
  ]
}"#;

fn write_epub(dir: &Path) -> PathBuf {
    let path = dir.join("book.epub");
    let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
    let stored = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("mimetype", stored).unwrap();
    zip.write_all(b"application/epub+zip").unwrap();
    zip.start_file("OEBPS/Text/chapter 1.xhtml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(CHAPTER.as_bytes()).unwrap();
    zip.start_file("OEBPS/Text/broken.xhtml", SimpleFileOptions::default())
        .unwrap();
    zip.write_all(b"<html><body></html>").unwrap();
    zip.finish().unwrap();

    path
}

#[test]
fn rows_get_lines_from_the_epub() {
    let dir = tempfile::tempdir().unwrap();
    let epub = write_epub(dir.path());

    let report = AceReport::parse(REPORT).unwrap();
    assert_eq!(report.title(), Some("Moby Dick"));

    let mut rows = flatten(&report);
    let mut archive = EpubArchive::open(&epub).unwrap();
    let located = attach_lines(&mut archive, &mut rows);

    assert_eq!(located, 2);

    let by_rule = |rule: &str| rows.iter().find(|r| r.rule == rule).unwrap();

    let role = by_rule("epub-type-has-matching-role");
    assert_eq!(role.file, "Text/chapter 1.xhtml");
    assert_eq!(role.line, Some(8));
    assert_eq!(role.suggested_role.as_deref(), Some("doc-chapter"));

    let img = by_rule("image-alt");
    assert_eq!(img.impact, Impact::Critical);
    assert_eq!(img.line, Some(10));

    // Ordinal past the last child
    assert_eq!(by_rule("region").line, None);
    // Document absent from the archive
    assert_eq!(by_rule("document-title").line, None);
    // Document that is not well-formed
    assert_eq!(by_rule("html-has-lang").line, None);
}

struct Recorder(Vec<(String, u32)>);

impl Navigator for Recorder {
    fn goto(&mut self, file: &str, line: u32) -> ace_check::Result<()> {
        self.0.push((file.to_string(), line));
        Ok(())
    }
}

#[test]
fn jump_uses_the_report_cfi() {
    let dir = tempfile::tempdir().unwrap();
    let epub = write_epub(dir.path());

    let mut archive = EpubArchive::open(&epub).unwrap();
    let text = archive.read_document("Text/chapter 1.xhtml").unwrap();
    let text = numeric_entities(&text);
    let doc = AnnotatedDocument::parse(&text).unwrap();

    let mut nav = Recorder(Vec::new());
    assert!(jump_to_location(&mut nav, &doc, "Text/chapter 1.xhtml", "/6/4[c1]/6").unwrap());
    assert!(!jump_to_location(&mut nav, &doc, "Text/chapter 1.xhtml", "/6/4[nope]").unwrap());

    assert_eq!(nav.0, vec![("Text/chapter 1.xhtml".to_string(), 10)]);
}
