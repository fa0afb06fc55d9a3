//! Text extraction from PDF and DOCX files.
//!
//! PDF pages and DOCX paragraphs are trimmed, blank ones skipped, and the
//! rest joined with blank lines. Directories expand to the supported files
//! they contain; per-file failures are logged and skipped in batch mode.
use std::fs;
use std::path::{Path, PathBuf};

use docx_rs::DocumentChild;
use tracing::{info, warn};

use super::IngestError;

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
}

/// A loaded document: extracted text plus provenance.
#[derive(Debug, Clone)]
pub struct Document {
    pub content: String,
    /// File name (not the full path), used as the chunk source label.
    pub source: String,
    pub kind: DocumentKind,
    /// Non-empty page count; PDF only.
    pub num_pages: Option<usize>,
}

fn kind_for_path(path: &Path) -> Option<DocumentKind> {
    match path.extension().and_then(|e| e.to_str())?.to_lowercase().as_str() {
        "pdf" => Some(DocumentKind::Pdf),
        "docx" => Some(DocumentKind::Docx),
        _ => None,
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Load a single document and extract its text.
pub fn load_document(path: &Path) -> Result<Document, IngestError> {
    if !path.exists() {
        return Err(IngestError::NotFound(path.display().to_string()));
    }

    match kind_for_path(path) {
        Some(DocumentKind::Pdf) => load_pdf(path),
        Some(DocumentKind::Docx) => load_docx(path),
        None => Err(IngestError::UnsupportedFormat(path.display().to_string())),
    }
}

fn load_pdf(path: &Path) -> Result<Document, IngestError> {
    let doc = lopdf::Document::load(path).map_err(|e| IngestError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    // get_pages is ordered by page number
    let mut pages = Vec::new();
    for page_no in doc.get_pages().keys() {
        match doc.extract_text(&[*page_no]) {
            Ok(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    pages.push(text.to_string());
                }
            }
            Err(e) => warn!("{}: page {page_no} extraction failed: {e}", path.display()),
        }
    }

    Ok(Document {
        content: pages.join("\n\n"),
        source: source_name(path),
        kind: DocumentKind::Pdf,
        num_pages: Some(pages.len()),
    })
}

fn load_docx(path: &Path) -> Result<Document, IngestError> {
    let buf = fs::read(path)?;
    let docx = docx_rs::read_docx(&buf).map_err(|e| IngestError::Parse {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut paragraphs = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(p) = child {
            let text = p.raw_text();
            let text = text.trim();
            if !text.is_empty() {
                paragraphs.push(text.to_string());
            }
        }
    }

    Ok(Document {
        content: paragraphs.join("\n\n"),
        source: source_name(path),
        kind: DocumentKind::Docx,
        num_pages: None,
    })
}

/// Load documents from a mix of file and directory paths.
///
/// Directories expand (non-recursively) to the supported files they
/// contain, sorted by name for deterministic ordering. Files that fail to
/// load are logged and skipped.
pub fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>, IngestError> {
    let mut files = Vec::new();

    for path in paths {
        if !path.exists() {
            warn!("Path not found, skipping: {}", path.display());
            continue;
        }

        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| p.is_file() && kind_for_path(p).is_some())
                .collect();
            entries.sort();
            files.extend(entries);
        } else if kind_for_path(path).is_some() {
            files.push(path.clone());
        } else {
            warn!("Unsupported format, skipping: {}", path.display());
        }
    }

    let mut documents = Vec::new();
    for file in &files {
        match load_document(file) {
            Ok(doc) => {
                info!("Loaded {} ({} chars)", doc.source, doc.content.len());
                documents.push(doc);
            }
            Err(e) => warn!("Failed to load {}: {e}", file.display()),
        }
    }

    Ok(documents)
}
