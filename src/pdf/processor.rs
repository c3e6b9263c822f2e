// src/pdf/processor.rs
// PDF text extraction and reference-document loading

use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunker::{chunk_document, PageSource, Snippet};
use crate::errors::{GraderError, GraderResult};
use crate::monitoring::metrics;

/// A PDF whose text has been extracted page by page.
#[derive(Debug, Clone)]
pub struct PdfDocument {
    name: String,
    pages: Vec<String>,
}

impl PdfDocument {
    /// Reads and extracts every page of the PDF at `path`.
    pub fn open(path: &Path) -> GraderResult<Self> {
        let name = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|e| GraderError::unreadable(&name, e))?;
        let pages = extract_pages(&name, &bytes)?;
        Ok(Self { name, pages })
    }

    /// Wraps text that was extracted elsewhere.
    pub fn from_pages(name: impl Into<String>, pages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            pages,
        }
    }
}

impl PageSource for PdfDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_text(&self, index: usize) -> GraderResult<String> {
        self.pages.get(index).cloned().ok_or_else(|| {
            GraderError::unreadable(&self.name, format!("page {} out of range", index + 1))
        })
    }
}

/// pdf-extract panics on some malformed fonts and streams, so a panic is
/// reported the same way as an extraction error.
fn extract_pages(name: &str, bytes: &[u8]) -> GraderResult<Vec<String>> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));

    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(e)) => Err(GraderError::unreadable(name, e)),
        Err(_) => {
            warn!(source = %name, "PDF extraction panicked");
            Err(GraderError::unreadable(name, "text extraction aborted"))
        }
    }
}

/// Extracts and chunks a single PDF.
pub fn pdf_to_snippets(path: &Path, chunk_size: usize) -> GraderResult<Vec<Snippet>> {
    let document = PdfDocument::open(path)?;
    chunk_document(&document, chunk_size)
}

/// One reference document and the snippets cut from it.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceDocument {
    pub source: String,
    pub pages: usize,
    pub snippets: Vec<Snippet>,
}

/// All reference documents, in configuration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceLibrary {
    pub chunk_size: usize,
    pub documents: Vec<ReferenceDocument>,
}

impl ReferenceLibrary {
    /// Loads every PDF in `paths`. Any unreadable document fails the load.
    pub fn load(paths: &[PathBuf], chunk_size: usize) -> GraderResult<Self> {
        let mut documents = Vec::with_capacity(paths.len());
        for path in paths {
            let start = Instant::now();
            let document = PdfDocument::open(path)?;
            documents.push(Self::chunk_one(&document, chunk_size)?);
            info!(
                source = %path.display(),
                pages = document.page_count(),
                snippets = documents.last().map(|d| d.snippets.len()).unwrap_or(0),
                duration_ms = start.elapsed().as_millis() as u64,
                "Loaded reference document"
            );
        }

        let library = Self { chunk_size, documents };
        metrics::REFERENCE_SNIPPETS_TOTAL.set(library.snippet_count() as i64);
        debug!(snippets = ?library.snippets(), "Reference snippets");
        Ok(library)
    }

    /// Builds a library from documents that are already in memory.
    pub fn from_sources(sources: &[&dyn PageSource], chunk_size: usize) -> GraderResult<Self> {
        let documents = sources
            .iter()
            .map(|source| Self::chunk_one(*source, chunk_size))
            .collect::<GraderResult<Vec<_>>>()?;
        Ok(Self { chunk_size, documents })
    }

    fn chunk_one(source: &dyn PageSource, chunk_size: usize) -> GraderResult<ReferenceDocument> {
        Ok(ReferenceDocument {
            source: source.name().to_string(),
            pages: source.page_count(),
            snippets: chunk_document(source, chunk_size)?,
        })
    }

    /// Snippets of all documents, concatenated in order.
    pub fn snippets(&self) -> Vec<Snippet> {
        self.documents
            .iter()
            .flat_map(|d| d.snippets.iter().cloned())
            .collect()
    }

    pub fn snippet_count(&self) -> usize {
        self.documents.iter().map(|d| d.snippets.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.pdf");

        match PdfDocument::open(&path) {
            Err(GraderError::SourceUnreadable { source_name, .. }) => {
                assert!(source_name.ends_with("nope.pdf"));
            }
            other => panic!("expected SourceUnreadable, got {:?}", other),
        }
    }

    #[test]
    fn test_garbage_file_is_unreadable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"this is not a pdf at all").unwrap();

        let err = pdf_to_snippets(file.path(), 1000).unwrap_err();
        assert!(matches!(err, GraderError::SourceUnreadable { .. }));
    }

    #[test]
    fn test_library_concatenates_documents_in_order() {
        let prompt = PdfDocument::from_pages("lang.pdf", vec!["a".repeat(1500)]);
        let rubric = PdfDocument::from_pages("RUBRIC.pdf", vec!["r".repeat(10), String::new()]);

        let sources: [&dyn PageSource; 2] = [&prompt, &rubric];
        let library = ReferenceLibrary::from_sources(&sources, 1000).unwrap();
        let titles: Vec<String> = library.snippets().into_iter().map(|s| s.title).collect();

        assert_eq!(titles, vec!["Page 1 Part 1", "Page 1 Part 2", "Page 1 Part 1"]);
        assert_eq!(library.snippet_count(), 3);
        assert_eq!(library.documents[1].source, "RUBRIC.pdf");
        assert_eq!(library.documents[1].pages, 2);
    }

    #[test]
    fn test_load_fails_on_first_unreadable_document() {
        let dir = tempfile::tempdir().unwrap();
        let paths = vec![dir.path().join("missing.pdf")];

        let err = ReferenceLibrary::load(&paths, 1000).unwrap_err();
        assert_eq!(err.kind(), "source_unreadable");
    }

    /// Writes a PDF with one line of Courier text per page.
    fn write_pdf(path: &Path, page_texts: &[&str]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for text in page_texts {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => page_texts.len() as i64,
            "Kids" => kids,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[test]
    fn test_open_extracts_each_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lang.pdf");
        write_pdf(&path, &["Synthesis prompt", "Scoring rubric"]);

        let doc = PdfDocument::open(&path).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.page_text(0).unwrap().contains("Synthesis"));
        assert!(doc.page_text(1).unwrap().contains("rubric"));
    }

    #[test]
    fn test_load_titles_restart_per_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("RUBRIC.pdf");
        write_pdf(&path, &["Row A evidence", "Row B sophistication"]);

        let library = ReferenceLibrary::load(&[path], 1000).unwrap();
        let titles: Vec<String> = library.snippets().into_iter().map(|s| s.title).collect();

        assert_eq!(titles, vec!["Page 1 Part 1", "Page 2 Part 1"]);
        assert_eq!(library.documents[0].pages, 2);
    }

    #[test]
    fn test_out_of_range_page() {
        let doc = PdfDocument::from_pages("one.pdf", vec!["x".into()]);
        assert!(doc.page_text(1).is_err());
    }
}
