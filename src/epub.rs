//! EPUB archive access
//!
//! Ace reports document paths relative to the package, while the zip may
//! nest them under `OEBPS/` or `EPUB/`. Lookups therefore match leniently:
//! exact path, then suffix on a path separator, then bare filename.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::error::{AppError, Result};

/// Fail with `UnsupportedFormat` unless `path` has an `.epub` extension.
pub fn ensure_epub(path: &Path) -> Result<()> {
    let is_epub = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("epub"));

    if is_epub {
        Ok(())
    } else {
        let kind = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("extensionless")
            .to_string();
        Err(AppError::UnsupportedFormat(format!(
            "{} files can't be checked with Ace ({})",
            kind,
            path.display()
        )))
    }
}

/// An open EPUB file
pub struct EpubArchive {
    path: PathBuf,
    archive: ZipArchive<File>,
    names: Vec<String>,
}

impl EpubArchive {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_epub(path)?;

        let archive = ZipArchive::new(File::open(path)?)?;
        let names = archive.file_names().map(str::to_string).collect();

        tracing::debug!(path = %path.display(), entries = archive.len(), "Opened EPUB");

        Ok(Self {
            path: path.to_path_buf(),
            archive,
            names,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Archive entry that `href` refers to, if any
    pub fn find_entry(&self, href: &str) -> Option<&str> {
        let href_clean = href.split('#').next().unwrap_or(href);
        let href_normalized = normalize_epub_path(href_clean);
        find_matching_file(&self.names, &href_normalized)
    }

    /// Read a content document as text
    pub fn read_document(&mut self, href: &str) -> Result<String> {
        let name = self
            .find_entry(href)
            .map(str::to_string)
            .ok_or_else(|| {
                AppError::ResourceNotFound(format!(
                    "'{}' not found in {} (searched: exact, suffix, filename)",
                    href,
                    self.path.display()
                ))
            })?;

        let mut file = self.archive.by_name(&name)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }
}

/// Normalize EPUB path for matching
///
/// - URL-decode percent-encoded characters
/// - Replace backslashes with forward slashes
/// - Remove leading "./" or "/"
fn normalize_epub_path(path: &str) -> String {
    let decoded = urlencoding::decode(path).unwrap_or_else(|_| path.into());

    decoded
        .replace('\\', "/")
        .trim_start_matches("./")
        .trim_start_matches('/')
        .to_string()
}

fn find_matching_file<'a>(file_names: &'a [String], href: &str) -> Option<&'a str> {
    let href_lower = href.to_lowercase();
    let href_filename = href.rsplit('/').next().unwrap_or(href).to_lowercase();
    let suffix = format!("/{}", href_lower);

    let normalized: Vec<(&'a str, String)> = file_names
        .iter()
        .map(|name| (name.as_str(), normalize_epub_path(name).to_lowercase()))
        .collect();

    normalized
        .iter()
        .find(|(_, n)| *n == href_lower)
        .or_else(|| normalized.iter().find(|(_, n)| n.ends_with(&suffix)))
        .or_else(|| {
            normalized
                .iter()
                .find(|(_, n)| n.rsplit('/').next() == Some(href_filename.as_str()))
        })
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_epub_path() {
        assert_eq!(normalize_epub_path("./OEBPS/style.css"), "OEBPS/style.css");
        assert_eq!(normalize_epub_path("/OEBPS/style.css"), "OEBPS/style.css");
        assert_eq!(normalize_epub_path("OEBPS\\style.css"), "OEBPS/style.css");
        assert_eq!(
            normalize_epub_path("OEBPS/chapter%201.xhtml"),
            "OEBPS/chapter 1.xhtml"
        );
    }

    #[test]
    fn test_match_priority() {
        let files = names(&[
            "OEBPS/Text/ch1.xhtml",
            "OEBPS/Other/ch1.xhtml",
            "OEBPS/Text/chapter 2.xhtml",
        ]);

        assert_eq!(
            find_matching_file(&files, "OEBPS/Other/ch1.xhtml"),
            Some("OEBPS/Other/ch1.xhtml")
        );
        assert_eq!(
            find_matching_file(&files, "text/ch1.xhtml"),
            Some("OEBPS/Text/ch1.xhtml")
        );
        assert_eq!(
            find_matching_file(&files, "chapter 2.xhtml"),
            Some("OEBPS/Text/chapter 2.xhtml")
        );
        assert_eq!(find_matching_file(&files, "ch3.xhtml"), None);
    }

    #[test]
    fn test_suffix_requires_separator() {
        let files = names(&["OEBPSch1.xhtml"]);
        assert_eq!(find_matching_file(&files, "OEBPS/ch1.xhtml"), None);
    }

    #[test]
    fn test_ensure_epub() {
        assert!(ensure_epub(Path::new("book.EPUB")).is_ok());
        assert!(matches!(
            ensure_epub(Path::new("book.azw3")),
            Err(AppError::UnsupportedFormat(_))
        ));
        assert!(ensure_epub(Path::new("book")).is_err());
    }

    #[test]
    fn test_read_document_from_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");

        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer
            .start_file("mimetype", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"application/epub+zip").unwrap();
        writer
            .start_file("OEBPS/Text/chapter 1.xhtml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"<html><body/></html>").unwrap();
        writer.finish().unwrap();

        let mut epub = EpubArchive::open(&path).unwrap();
        assert_eq!(
            epub.read_document("Text/chapter%201.xhtml#top").unwrap(),
            "<html><body/></html>"
        );
        assert!(matches!(
            epub.read_document("missing.xhtml"),
            Err(AppError::ResourceNotFound(_))
        ));
    }
}
