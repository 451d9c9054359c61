//! Document loading: PDFs page by page, plain text as a single page.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::{Error, Result};

/// Loaded document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// File name, used as the chunk id prefix
    pub name: String,
    /// Path as given, stored as chunk `source`
    pub path: String,
    pub pages: Vec<String>,
}

impl Document {
    pub fn from_text(name: impl Into<String>, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            pages: vec![text.into()],
        }
    }
}

/// Load a `.pdf`, `.txt` or `.md` file.
pub fn load_document(path: &Path) -> Result<Document> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| Error::Document(format!("Not a file: {}", path.display())))?;

    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let pages = match extension.as_str() {
        "pdf" => load_pdf_pages(path)?,
        "txt" | "md" => vec![std::fs::read_to_string(path)?],
        other => {
            return Err(Error::Document(format!(
                "Unsupported document type '{}': {}",
                other,
                path.display()
            )))
        }
    };

    Ok(Document {
        name,
        path: path.to_string_lossy().to_string(),
        pages,
    })
}

fn load_pdf_pages(path: &Path) -> Result<Vec<String>> {
    let doc = lopdf::Document::load(path)
        .map_err(|e| Error::Document(format!("Failed to open {}: {}", path.display(), e)))?;

    let mut pages = Vec::new();
    for page_number in doc.get_pages().keys() {
        match doc.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(e) => {
                // Scanned or image-only pages carry no text layer
                warn!("{}: page {} has no extractable text: {}", path.display(), page_number, e);
                pages.push(String::new());
            }
        }
    }

    debug!("Loaded {} pages from {}", pages.len(), path.display());
    Ok(pages)
}

/// PDF files directly inside `folder`, sorted by path.
pub fn discover_pdfs(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(Error::Document(format!(
            "Folder not found: {}",
            folder.display()
        )));
    }

    let mut files: Vec<PathBuf> = WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| {
            path.extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn text_files_load_as_one_page() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# GPU\nRTX 2080 Ti").unwrap();

        let doc = load_document(&path).unwrap();

        assert_eq!(doc.name, "notes.md");
        assert_eq!(doc.pages, vec!["# GPU\nRTX 2080 Ti".to_string()]);
        assert!(doc.path.ends_with("notes.md"));
    }

    #[test]
    fn unsupported_extension_is_a_document_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sheet.xlsx");
        std::fs::write(&path, "x").unwrap();

        assert!(matches!(load_document(&path), Err(Error::Document(_))));
    }

    #[test]
    fn invalid_pdf_is_a_document_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, "not a pdf").unwrap();

        assert!(matches!(load_document(&path), Err(Error::Document(_))));
    }

    #[test]
    fn discover_pdfs_is_sorted_and_not_recursive() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.pdf"), "").unwrap();
        std::fs::write(dir.path().join("a.PDF"), "").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested").join("c.pdf"), "").unwrap();

        let names: Vec<String> = discover_pdfs(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();

        assert_eq!(names, vec!["a.PDF", "b.pdf"]);
    }

    #[test]
    fn discover_pdfs_missing_folder_fails() {
        let dir = TempDir::new().unwrap();
        assert!(discover_pdfs(&dir.path().join("missing")).is_err());
    }
}
